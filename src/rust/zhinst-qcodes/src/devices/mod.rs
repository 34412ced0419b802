// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Device specific drivers.
mod pqsc;
mod shfqa;

pub use pqsc::Pqsc;
pub use shfqa::{Generator, MultiState, QaChannel, Qudit, Readout, ShfScope, Shfqa, Spectroscopy};
