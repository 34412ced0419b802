// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::rc::Rc;

use zhinst_nodetree::{InstrumentModule, Node};

use super::module_node;
use crate::backing::ImpedanceModuleBacking;
use crate::{DriverSettings, PollSettings, Result};

/// Impedance module of lock-in instruments.
///
/// Corresponds to the compensation ("Cal") tab of the impedance analyzer in
/// the LabOne user interface.
pub struct ImpedanceModule {
    node: Node,
    backing: Rc<dyn ImpedanceModuleBacking>,
}

impl ImpedanceModule {
    pub const DEFAULT_NAME: &'static str = "impedance_module";

    pub fn new(
        backing: Rc<dyn ImpedanceModuleBacking>,
        settings: &DriverSettings,
        name: Option<&str>,
    ) -> Result<Self> {
        let name = name.unwrap_or(Self::DEFAULT_NAME).to_string();
        let node = module_node(name, backing.node_path(), backing.node_tree(), settings, &[])?;
        Ok(ImpedanceModule { node, backing })
    }

    /// Wait until the compensation `step` is complete, or all steps when
    /// `step` is `None`. Default [`PollSettings::COMPENSATION`].
    pub fn wait_done(&self, step: Option<u32>, poll: Option<PollSettings>) -> Result<()> {
        self.backing
            .wait_done(step, poll.unwrap_or(PollSettings::COMPENSATION))
    }

    pub fn finish(&self) -> Result<()> {
        self.backing.finish()
    }

    pub fn finished(&self, step: Option<u32>) -> Result<bool> {
        self.backing.finished(step)
    }
}

impl InstrumentModule for ImpedanceModule {
    fn node(&self) -> &Node {
        &self.node
    }
}
