// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Drivers for LabOne software modules.
mod impedance_module;
mod shfqa_sweeper;

pub use impedance_module::ImpedanceModule;
pub use shfqa_sweeper::{ShfqaSweeper, SweeperDevice};

use std::rc::Rc;

use zhinst_log::diagnostic;
use zhinst_nodetree::{Node, NodePath, NodeTreeBacking};

use crate::instrument::root_node;
use crate::{DriverSettings, Result};

/// Build the root node of a module driver and attach its nodetree
/// parameters, skipping the `blacklist` paths.
fn module_node(
    name: String,
    zi_node: NodePath,
    node_tree: Option<Rc<dyn NodeTreeBacking>>,
    settings: &DriverSettings,
    blacklist: &[&str],
) -> Result<Node> {
    let mut node = root_node(name, zi_node, node_tree, settings);
    node.init_parameters(blacklist)?;
    diagnostic!(
        "Created module {} with {} parameters",
        node.full_name(),
        node.parameters().count()
    );
    Ok(node)
}
