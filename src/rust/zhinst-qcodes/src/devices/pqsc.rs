// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::rc::Rc;
use std::time::Duration;

use zhinst_nodetree::{InstrumentModule, Node};

use crate::backing::{DeviceBacking, PqscBacking};
use crate::types::{ZsyncPorts, ZsyncStatus};
use crate::{DriverSettings, Instrument, PollSettings, Result, ZiBaseInstrument};

/// QCoDeS driver for the Zurich Instruments PQSC.
///
/// The PQSC has no submodules, everything besides the execution control is
/// exposed through the nodetree parameters.
pub struct Pqsc {
    base: ZiBaseInstrument,
    backing: Rc<dyn PqscBacking>,
}

impl Pqsc {
    pub fn new(backing: Rc<dyn PqscBacking>, settings: &DriverSettings) -> Result<Self> {
        Self::with_name(backing, settings, None)
    }

    pub fn with_name(
        backing: Rc<dyn PqscBacking>,
        settings: &DriverSettings,
        name: Option<&str>,
    ) -> Result<Self> {
        let mut base = ZiBaseInstrument::new(backing.as_device(), settings, name)?;
        base.finalize()?;
        Ok(Pqsc { base, backing })
    }

    /// Prepare the PQSC for triggering the instruments.
    ///
    /// Stops a running execution, optionally sets the number of repetitions
    /// and the holdoff time, and resets the trigger counter. With `deep` the
    /// call synchronizes with the data server.
    pub fn arm(
        &self,
        deep: bool,
        repetitions: Option<u32>,
        holdoff: Option<Duration>,
    ) -> Result<()> {
        self.backing.arm(deep, repetitions, holdoff)
    }

    /// Start sending out triggers.
    pub fn run(&self, deep: bool) -> Result<()> {
        self.backing.run(deep)
    }

    pub fn arm_and_run(&self, repetitions: Option<u32>, holdoff: Option<Duration>) -> Result<()> {
        self.backing.arm_and_run(repetitions, holdoff)
    }

    pub fn stop(&self, deep: bool) -> Result<()> {
        self.backing.stop(deep)
    }

    pub fn wait_done(&self, poll: Option<PollSettings>) -> Result<()> {
        self.backing.wait_done(poll.unwrap_or(PollSettings::SEQUENCER))
    }

    /// Whether the external reference clock is locked, default
    /// [`PollSettings::LINK`].
    pub fn check_ref_clock(&self, poll: Option<PollSettings>) -> Result<bool> {
        self.backing.check_ref_clock(poll.unwrap_or(PollSettings::LINK))
    }

    pub fn check_zsync_connection(
        &self,
        ports: &ZsyncPorts,
        poll: Option<PollSettings>,
    ) -> Result<ZsyncStatus> {
        self.backing
            .check_zsync_connection(ports, poll.unwrap_or(PollSettings::LINK))
    }

    /// ZSync port of the PQSC that `device` is connected to.
    pub fn find_zsync_worker_port(&self, device: &dyn Instrument) -> Result<u32> {
        self.backing.find_zsync_worker_port(device.device_backing())
    }
}

impl InstrumentModule for Pqsc {
    fn node(&self) -> &Node {
        self.base.node()
    }
}

impl Instrument for Pqsc {
    fn serial(&self) -> &str {
        self.base.serial()
    }

    fn device_type(&self) -> &str {
        self.base.device_type()
    }

    fn device_backing(&self) -> &dyn DeviceBacking {
        self.backing.as_device()
    }
}
