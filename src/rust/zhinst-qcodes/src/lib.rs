// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! QCoDeS style drivers for Zurich Instruments devices and LabOne modules.
//!
//! Every driver is a tree of nodes mirroring the device nodetree. All
//! operations are forwarded to the backing toolkit object, which owns the
//! actual instrument communication.

pub mod backing;
pub mod devices;
pub mod instrument;
pub mod modules;
pub mod session;
pub mod settings;
pub mod types;

#[cfg(feature = "pyo3")]
pub mod py;

pub use instrument::{Instrument, ZiBaseInstrument};
pub use session::Session;
pub use settings::{DriverSettings, PollSettings};
pub use zhinst_nodetree::{Error, Result};

#[cfg(test)]
pub(crate) mod testing;
