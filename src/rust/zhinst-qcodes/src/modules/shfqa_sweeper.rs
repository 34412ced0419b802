// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::rc::{Rc, Weak};

use serde_json::Value;
use zhinst_log::debug;
use zhinst_nodetree::{InstrumentModule, Node};

use super::module_node;
use crate::backing::ShfqaSweeperBacking;
use crate::{DriverSettings, Instrument, Result, Session};

/// Device configured on a sweeper.
pub enum SweeperDevice {
    /// The device is registered in the session.
    Connected(Rc<dyn Instrument>),
    /// Raw serial of a device the session does not know, empty if unset.
    Serial(String),
}

/// Frequency sweeps on the SHFQA.
///
/// Wraps the python based `SHFSweeper` of `zhinst.utils`, its settings are
/// exposed as a nodetree like the ones of the LabOne modules.
pub struct ShfqaSweeper {
    node: Node,
    backing: Rc<dyn ShfqaSweeperBacking>,
    session: Weak<Session>,
}

impl ShfqaSweeper {
    /// The device is handled through [`ShfqaSweeper::device`], not as a
    /// parameter.
    const BLACKLIST: &'static [&'static str] = &["/device"];

    pub(crate) fn new(
        backing: Rc<dyn ShfqaSweeperBacking>,
        session: Weak<Session>,
        settings: &DriverSettings,
        name: String,
    ) -> Result<Self> {
        let node = module_node(
            name,
            backing.node_path(),
            backing.node_tree(),
            settings,
            Self::BLACKLIST,
        )?;
        Ok(ShfqaSweeper { node, backing, session })
    }

    /// Device the sweeper runs with.
    ///
    /// Resolved to the session's driver when the session knows the serial,
    /// otherwise the raw serial is returned.
    pub fn device(&self) -> Result<SweeperDevice> {
        let serial = self.backing.device()?;
        let Some(session) = self.session.upgrade() else {
            return Ok(SweeperDevice::Serial(serial));
        };
        match session.device(&serial) {
            Ok(device) => Ok(SweeperDevice::Connected(device)),
            Err(err) => {
                debug!("{}: device `{}` not resolved: {}", self.node.full_name(), serial, err);
                Ok(SweeperDevice::Serial(serial))
            }
        }
    }

    pub fn set_device(&self, serial: &str) -> Result<()> {
        self.backing.set_device(serial)
    }

    /// Perform a sweep, returns the measurement data of the sweep.
    pub fn run(&self) -> Result<Value> {
        self.backing.run()
    }

    /// Measurement data of the last sweep.
    pub fn get_result(&self) -> Result<Value> {
        self.backing.get_result()
    }

    pub fn plot(&self) -> Result<()> {
        self.backing.plot()
    }

    pub fn get_offset_freq_vector(&self) -> Result<Vec<f64>> {
        self.backing.get_offset_freq_vector()
    }
}

impl InstrumentModule for ShfqaSweeper {
    fn node(&self) -> &Node {
        &self.node
    }
}
