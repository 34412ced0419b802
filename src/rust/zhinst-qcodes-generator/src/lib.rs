// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Generation of QCoDeS node drivers from `zhinst.toolkit` class
//! descriptions.

pub mod description;
pub mod naming;
pub mod render;
