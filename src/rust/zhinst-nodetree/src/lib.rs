// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Hierarchical node tree shared by all zhinst QCoDeS drivers.
//!
//! A driver is a tree of [`Node`]s. Every node may own submodules (other
//! nodes, or [`ChannelList`]s of homogeneous nodes) and parameters that map
//! to leaves of the hardware nodetree. The tree is built once, when the
//! driver is created, by probing the backing toolkit object for the
//! sub-resources it exposes.

pub mod backing;
pub mod channel_list;
pub mod error;
pub mod node;
pub mod parameter;
pub mod path;
pub mod snapshot;

pub use backing::BackingList;
pub use channel_list::ChannelList;
pub use error::{Error, Result};
pub use node::{InstrumentModule, Node, TreeContext};
pub use parameter::Parameter;
pub use path::NodePath;
pub use snapshot::{NodeTreeBacking, SnapshotCache};

#[cfg(test)]
pub(crate) mod testing;
