// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::rc::Rc;

use zhinst_log::diagnostic;
use zhinst_nodetree::{
    InstrumentModule, Node, NodePath, NodeTreeBacking, SnapshotCache, TreeContext,
};

use crate::backing::DeviceBacking;
use crate::{DriverSettings, Result};

/// A driver for a physical device, as registered in a [`crate::Session`].
pub trait Instrument: InstrumentModule {
    fn serial(&self) -> &str;

    fn device_type(&self) -> &str;

    fn device_backing(&self) -> &dyn DeviceBacking;

    /// Check that the device firmware and the LabOne software are compatible.
    fn check_compatibility(&self) -> Result<()> {
        self.device_backing().check_compatibility()
    }
}

/// Root node shared by device and module drivers.
pub(crate) fn root_node(
    name: String,
    zi_node: NodePath,
    node_tree: Option<Rc<dyn NodeTreeBacking>>,
    settings: &DriverSettings,
) -> Node {
    let snapshot_cache = node_tree
        .filter(|_| settings.init_parameters)
        .map(|tree| Rc::new(SnapshotCache::new(tree, zi_node.clone())));
    let context = Rc::new(TreeContext::new(snapshot_cache, settings.lock_channel_lists));
    Node::root(name, context, Some(zi_node))
}

/// Common part of all device drivers.
///
/// Device specific drivers build their submodules on top of the root node
/// and call [`ZiBaseInstrument::finalize`] once the tree is complete.
pub struct ZiBaseInstrument {
    node: Node,
    serial: String,
    device_type: String,
}

impl ZiBaseInstrument {
    /// Create the root node of a device. Without an explicit `name` the
    /// instrument is called `{prefix}_{device_type}_{serial}`.
    ///
    /// Fails if the backing cannot report the serial or the device type.
    pub fn new(
        backing: &dyn DeviceBacking,
        settings: &DriverSettings,
        name: Option<&str>,
    ) -> Result<Self> {
        let serial = backing.serial()?.to_lowercase();
        let device_type = backing.device_type()?.to_uppercase();
        let name = name.map_or_else(
            || format!("{}_{}_{}", settings.name_prefix, device_type, serial).to_lowercase(),
            str::to_string,
        );
        Ok(ZiBaseInstrument {
            node: root_node(name, backing.node_path(), backing.node_tree(), settings),
            serial,
            device_type,
        })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// Attach the nodetree parameters of the device itself.
    pub fn finalize(&mut self) -> Result<()> {
        self.node.init_parameters(&[])?;
        diagnostic!(
            "Created {} with submodules [{}] and {} parameters",
            self.node.full_name(),
            self.node.submodules().map(|(name, _)| name).collect::<Vec<_>>().join(", "),
            self.node.parameters().count()
        );
        Ok(())
    }
}
