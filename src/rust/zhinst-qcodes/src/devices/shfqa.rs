// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Driver for the SHFQA quantum analyzer.
use std::rc::Rc;
use std::time::Duration;

use indexmap::IndexMap;
use num_complex::Complex64;
use serde_json::Value;
use zhinst_nodetree::{ChannelList, InstrumentModule, Node};

use crate::backing::{
    DeviceBacking, GeneratorBacking, MultiStateBacking, QaChannelBacking, QuditBacking,
    ReadoutBacking, ScopeBacking, ShfqaBacking, SpectroscopyBacking,
};
use crate::types::{
    ChannelConfig, CompileOptions, CompiledProgram, QuditSettings, ReadoutData,
    ResultLoggerSettings, ScopeConfig, ScopeRecording, Waveforms,
};
use crate::{DriverSettings, Instrument, PollSettings, Result, ZiBaseInstrument};

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Sequencer of a QA channel.
///
/// Unlike the AWG cores of HDAWG or SHFSG the generator has no predefined
/// waveforms, all waveforms are uploaded with
/// [`Generator::write_to_waveform_memory`].
pub struct Generator {
    node: Node,
    backing: Rc<dyn GeneratorBacking>,
}

impl Generator {
    pub fn new(parent: &Node, backing: Rc<dyn GeneratorBacking>) -> Result<Self> {
        let mut node = Node::new(parent, "generator", Some(backing.node_path()));
        node.init_parameters(&[])?;
        Ok(Generator { node, backing })
    }

    /// Start the sequencer and block until it reports to be enabled.
    ///
    /// With `single` the sequencer disables itself after finishing.
    pub fn enable_sequencer(&self, single: bool) -> Result<()> {
        self.backing.enable_sequencer(single)
    }

    /// Wait until the sequencer program finished, default
    /// [`PollSettings::SEQUENCER`]. Fails with [`crate::Error::Timeout`].
    pub fn wait_done(&self, poll: Option<PollSettings>) -> Result<()> {
        self.backing.wait_done(poll.unwrap_or(PollSettings::SEQUENCER))
    }

    pub fn compile_sequencer_program(
        &self,
        program: &str,
        options: &CompileOptions,
    ) -> Result<CompiledProgram> {
        self.backing.compile_sequencer_program(program, options)
    }

    /// Compile and upload a sequencer program, returns the compiler output.
    pub fn load_sequencer_program(&self, program: &str, options: &CompileOptions) -> Result<Value> {
        self.backing.load_sequencer_program(program, options)
    }

    pub fn write_to_waveform_memory(&self, pulses: &Waveforms, clear_existing: bool) -> Result<()> {
        self.backing.write_to_waveform_memory(pulses, clear_existing)
    }

    /// Read back waveforms; all assigned slots when `slots` is `None`.
    pub fn read_from_waveform_memory(&self, slots: Option<&[u32]>) -> Result<Waveforms> {
        self.backing.read_from_waveform_memory(slots)
    }

    pub fn configure_sequencer_triggering(
        &self,
        aux_trigger: &str,
        play_pulse_delay: f64,
    ) -> Result<()> {
        self.backing.configure_sequencer_triggering(aux_trigger, play_pulse_delay)
    }

    pub fn available_aux_trigger_inputs(&self) -> Result<Vec<String>> {
        self.backing.available_aux_trigger_inputs()
    }
}

impl InstrumentModule for Generator {
    fn node(&self) -> &Node {
        &self.node
    }
}

pub struct Qudit {
    node: Node,
    backing: Rc<dyn QuditBacking>,
}

impl Qudit {
    pub fn new(parent: &Node, backing: Rc<dyn QuditBacking>, index: usize) -> Result<Self> {
        let mut node = Node::new(parent, format!("qudit_{index}"), Some(backing.node_path()));
        node.init_parameters(&[])?;
        Ok(Qudit { node, backing })
    }

    pub fn configure(&self, settings: &QuditSettings, enable: bool) -> Result<()> {
        self.backing.configure(settings, enable)
    }
}

impl InstrumentModule for Qudit {
    fn node(&self) -> &Node {
        &self.node
    }
}

/// Multi-state discrimination of a readout channel.
pub struct MultiState {
    node: Node,
    backing: Rc<dyn MultiStateBacking>,
}

impl MultiState {
    pub fn new(parent: &Node, backing: Rc<dyn MultiStateBacking>) -> Result<Self> {
        let mut node = Node::new(parent, "multistate", Some(backing.node_path()));
        node.attach_channels("qudits", backing.qudits(), |parent, index, qudit| {
            Qudit::new(parent, qudit, index)
        })?;
        node.init_parameters(&[])?;
        Ok(MultiState { node, backing })
    }

    pub fn qudits(&self) -> Option<&ChannelList<Qudit>> {
        self.node.submodule_as("qudits")
    }

    /// Qudit results grouped by qudit index.
    pub fn get_qudits_results(&self) -> Result<IndexMap<u32, Vec<i64>>> {
        self.backing.get_qudits_results()
    }
}

impl InstrumentModule for MultiState {
    fn node(&self) -> &Node {
        &self.node
    }
}

pub struct Readout {
    node: Node,
    backing: Rc<dyn ReadoutBacking>,
}

impl Readout {
    pub fn new(parent: &Node, backing: Rc<dyn ReadoutBacking>) -> Result<Self> {
        let mut node = Node::new(parent, "readout", Some(backing.node_path()));
        node.attach_optional("multistate", backing.multistate(), MultiState::new)?;
        node.init_parameters(&[])?;
        Ok(Readout { node, backing })
    }

    pub fn multistate(&self) -> Option<&MultiState> {
        self.node.submodule_as("multistate")
    }

    /// Configure the result logger for readout mode.
    ///
    /// `result_source` selects the result, e.g. `result_of_integration` or
    /// `result_of_discrimination`.
    pub fn configure_result_logger(
        &self,
        result_source: &str,
        settings: &ResultLoggerSettings,
    ) -> Result<()> {
        self.backing.configure_result_logger(result_source, settings)
    }

    /// Reset and enable the result logger.
    pub fn run(&self) -> Result<()> {
        self.backing.run()
    }

    pub fn stop(&self, poll: Option<PollSettings>) -> Result<()> {
        self.backing.stop(poll.unwrap_or(PollSettings::RESULT_LOGGER))
    }

    pub fn wait_done(&self, poll: Option<PollSettings>) -> Result<()> {
        self.backing.wait_done(poll.unwrap_or(PollSettings::RESULT_LOGGER))
    }

    /// Wait for the logger to finish and return the measured data.
    pub fn read(&self, timeout: Option<Duration>) -> Result<ReadoutData> {
        self.backing.read(timeout.unwrap_or(DEFAULT_READ_TIMEOUT))
    }

    /// Upload complex integration weights keyed by integration unit.
    pub fn write_integration_weights(
        &self,
        weights: &Waveforms,
        integration_delay: f64,
        clear_existing: bool,
    ) -> Result<()> {
        self.backing
            .write_integration_weights(weights, integration_delay, clear_existing)
    }

    pub fn read_integration_weights(&self, slots: Option<&[u32]>) -> Result<Waveforms> {
        self.backing.read_integration_weights(slots)
    }
}

impl InstrumentModule for Readout {
    fn node(&self) -> &Node {
        &self.node
    }
}

pub struct Spectroscopy {
    node: Node,
    backing: Rc<dyn SpectroscopyBacking>,
}

impl Spectroscopy {
    pub fn new(parent: &Node, backing: Rc<dyn SpectroscopyBacking>) -> Result<Self> {
        let mut node = Node::new(parent, "spectroscopy", Some(backing.node_path()));
        node.init_parameters(&[])?;
        Ok(Spectroscopy { node, backing })
    }

    pub fn configure_result_logger(&self, settings: &ResultLoggerSettings) -> Result<()> {
        self.backing.configure_result_logger(settings)
    }

    pub fn run(&self) -> Result<()> {
        self.backing.run()
    }

    pub fn stop(&self, poll: Option<PollSettings>) -> Result<()> {
        self.backing.stop(poll.unwrap_or(PollSettings::RESULT_LOGGER))
    }

    pub fn wait_done(&self, poll: Option<PollSettings>) -> Result<()> {
        self.backing.wait_done(poll.unwrap_or(PollSettings::RESULT_LOGGER))
    }

    pub fn read(&self, timeout: Option<Duration>) -> Result<Vec<Complex64>> {
        self.backing.read(timeout.unwrap_or(DEFAULT_READ_TIMEOUT))
    }
}

impl InstrumentModule for Spectroscopy {
    fn node(&self) -> &Node {
        &self.node
    }
}

/// Quantum analyzer channel with its generator, readout and spectroscopy.
pub struct QaChannel {
    node: Node,
    backing: Rc<dyn QaChannelBacking>,
}

impl QaChannel {
    pub fn new(parent: &Node, backing: Rc<dyn QaChannelBacking>, index: usize) -> Result<Self> {
        let mut node = Node::new(parent, format!("qachannel_{index}"), Some(backing.node_path()));
        node.attach_optional("generator", backing.generator(), Generator::new)?;
        node.attach_optional("readout", backing.readout(), Readout::new)?;
        node.attach_optional("spectroscopy", backing.spectroscopy(), Spectroscopy::new)?;
        node.init_parameters(&[])?;
        Ok(QaChannel { node, backing })
    }

    pub fn generator(&self) -> Option<&Generator> {
        self.node.submodule_as("generator")
    }

    pub fn readout(&self) -> Option<&Readout> {
        self.node.submodule_as("readout")
    }

    pub fn spectroscopy(&self) -> Option<&Spectroscopy> {
        self.node.submodule_as("spectroscopy")
    }

    pub fn configure_channel(&self, config: &ChannelConfig) -> Result<()> {
        self.backing.configure_channel(config)
    }
}

impl InstrumentModule for QaChannel {
    fn node(&self) -> &Node {
        &self.node
    }
}

pub struct ShfScope {
    node: Node,
    backing: Rc<dyn ScopeBacking>,
}

impl ShfScope {
    pub fn new(parent: &Node, backing: Rc<dyn ScopeBacking>, index: usize) -> Result<Self> {
        let mut node = Node::new(parent, format!("shfscope_{index}"), Some(backing.node_path()));
        node.init_parameters(&[])?;
        Ok(ShfScope { node, backing })
    }

    /// Start the recording and wait until the scope is enabled.
    pub fn run(&self, single: bool, poll: Option<PollSettings>) -> Result<()> {
        self.backing.run(single, poll.unwrap_or(PollSettings::SEQUENCER))
    }

    pub fn stop(&self, poll: Option<PollSettings>) -> Result<()> {
        self.backing.stop(poll.unwrap_or(PollSettings::SEQUENCER))
    }

    pub fn wait_done(&self, poll: Option<PollSettings>) -> Result<()> {
        self.backing.wait_done(poll.unwrap_or(PollSettings::SEQUENCER))
    }

    /// To finish an acquisition the number of issued triggers must equal
    /// `num_segments * num_averages`.
    pub fn configure(&self, config: &ScopeConfig) -> Result<()> {
        self.backing.configure(config)
    }

    pub fn read(&self, timeout: Option<Duration>) -> Result<ScopeRecording> {
        self.backing.read(timeout.unwrap_or(DEFAULT_READ_TIMEOUT))
    }

    pub fn available_trigger_inputs(&self) -> Result<Vec<String>> {
        self.backing.available_trigger_inputs()
    }

    pub fn available_inputs(&self) -> Result<Vec<String>> {
        self.backing.available_inputs()
    }
}

impl InstrumentModule for ShfScope {
    fn node(&self) -> &Node {
        &self.node
    }
}

/// QCoDeS driver for the Zurich Instruments SHFQA.
pub struct Shfqa {
    base: ZiBaseInstrument,
    backing: Rc<dyn ShfqaBacking>,
}

impl Shfqa {
    pub fn new(backing: Rc<dyn ShfqaBacking>, settings: &DriverSettings) -> Result<Self> {
        Self::with_name(backing, settings, None)
    }

    pub fn with_name(
        backing: Rc<dyn ShfqaBacking>,
        settings: &DriverSettings,
        name: Option<&str>,
    ) -> Result<Self> {
        let mut base = ZiBaseInstrument::new(backing.as_device(), settings, name)?;
        let node = base.node_mut();
        node.attach_channels("qachannels", backing.qachannels(), |parent, index, channel| {
            QaChannel::new(parent, channel, index)
        })?;
        node.attach_channels("scopes", backing.scopes(), |parent, index, scope| {
            ShfScope::new(parent, scope, index)
        })?;
        base.finalize()?;
        Ok(Shfqa { base, backing })
    }

    pub fn qachannels(&self) -> Option<&ChannelList<QaChannel>> {
        self.base.node().submodule_as("qachannels")
    }

    pub fn scopes(&self) -> Option<&ChannelList<ShfScope>> {
        self.base.node().submodule_as("scopes")
    }

    /// Load the factory default settings, with `deep` synchronizing with the
    /// data server afterwards.
    pub fn factory_reset(&self, deep: bool) -> Result<()> {
        self.backing.factory_reset(deep)
    }

    /// Issue `num_triggers` software triggers `wait_time` apart. The spacing
    /// is not deterministic, only meant for prototyping.
    pub fn start_continuous_sw_trigger(
        &self,
        num_triggers: u32,
        wait_time: Duration,
    ) -> Result<()> {
        self.backing.start_continuous_sw_trigger(num_triggers, wait_time)
    }

    pub fn max_qubits_per_channel(&self) -> Result<u32> {
        self.backing.max_qubits_per_channel()
    }
}

impl InstrumentModule for Shfqa {
    fn node(&self) -> &Node {
        self.base.node()
    }
}

impl Instrument for Shfqa {
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
