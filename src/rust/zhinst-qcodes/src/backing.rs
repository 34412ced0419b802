// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Interfaces of the toolkit objects the drivers forward to.
//!
//! Sub-resource accessors return `None` when the instrument model or
//! firmware does not provide the resource; the driver then omits the
//! corresponding node. Operations return the toolkit result or error
//! unchanged.
use std::rc::Rc;
use std::time::Duration;

use indexmap::IndexMap;
use num_complex::Complex64;
use serde_json::Value;
use zhinst_nodetree::node::AsAny;
use zhinst_nodetree::{BackingList, NodePath, NodeTreeBacking, Result};

use crate::PollSettings;
use crate::types::{
    ChannelConfig, CompileOptions, CompiledProgram, QuditSettings, ReadoutData,
    ResultLoggerSettings, ScopeConfig, ScopeRecording, Waveforms, ZsyncPorts, ZsyncStatus,
};

pub trait Backing {
    /// Path of the node the toolkit object represents.
    fn node_path(&self) -> NodePath;
}

/// A toolkit object at the root of a driver, i.e. a device or a module.
pub trait RootBacking: Backing {
    /// Nodetree used for parameters and snapshots, if the object exposes one.
    fn node_tree(&self) -> Option<Rc<dyn NodeTreeBacking>>;
}

pub trait DeviceBacking: RootBacking + AsAny {
    fn serial(&self) -> Result<String>;

    fn device_type(&self) -> Result<String>;

    fn check_compatibility(&self) -> Result<()>;

    fn as_device(&self) -> &dyn DeviceBacking;
}

pub trait GeneratorBacking: Backing {
    fn enable_sequencer(&self, single: bool) -> Result<()>;

    fn wait_done(&self, poll: PollSettings) -> Result<()>;

    fn compile_sequencer_program(
        &self,
        program: &str,
        options: &CompileOptions,
    ) -> Result<CompiledProgram>;

    fn load_sequencer_program(&self, program: &str, options: &CompileOptions) -> Result<Value>;

    fn write_to_waveform_memory(&self, pulses: &Waveforms, clear_existing: bool) -> Result<()>;

    fn read_from_waveform_memory(&self, slots: Option<&[u32]>) -> Result<Waveforms>;

    fn configure_sequencer_triggering(
        &self,
        aux_trigger: &str,
        play_pulse_delay: f64,
    ) -> Result<()>;

    fn available_aux_trigger_inputs(&self) -> Result<Vec<String>>;
}

pub trait QuditBacking: Backing {
    fn configure(&self, settings: &QuditSettings, enable: bool) -> Result<()>;
}

pub trait MultiStateBacking: Backing {
    fn qudits(&self) -> Option<BackingList<Rc<dyn QuditBacking>>>;

    fn get_qudits_results(&self) -> Result<IndexMap<u32, Vec<i64>>>;
}

pub trait ReadoutBacking: Backing {
    fn multistate(&self) -> Option<Rc<dyn MultiStateBacking>>;

    fn configure_result_logger(
        &self,
        result_source: &str,
        settings: &ResultLoggerSettings,
    ) -> Result<()>;

    fn run(&self) -> Result<()>;

    fn stop(&self, poll: PollSettings) -> Result<()>;

    fn wait_done(&self, poll: PollSettings) -> Result<()>;

    fn read(&self, timeout: Duration) -> Result<ReadoutData>;

    fn write_integration_weights(
        &self,
        weights: &Waveforms,
        integration_delay: f64,
        clear_existing: bool,
    ) -> Result<()>;

    fn read_integration_weights(&self, slots: Option<&[u32]>) -> Result<Waveforms>;
}

pub trait SpectroscopyBacking: Backing {
    fn configure_result_logger(&self, settings: &ResultLoggerSettings) -> Result<()>;

    fn run(&self) -> Result<()>;

    fn stop(&self, poll: PollSettings) -> Result<()>;

    fn wait_done(&self, poll: PollSettings) -> Result<()>;

    fn read(&self, timeout: Duration) -> Result<Vec<Complex64>>;
}

pub trait QaChannelBacking: Backing {
    fn generator(&self) -> Option<Rc<dyn GeneratorBacking>>;

    fn readout(&self) -> Option<Rc<dyn ReadoutBacking>>;

    fn spectroscopy(&self) -> Option<Rc<dyn SpectroscopyBacking>>;

    fn configure_channel(&self, config: &ChannelConfig) -> Result<()>;
}

pub trait ScopeBacking: Backing {
    fn run(&self, single: bool, poll: PollSettings) -> Result<()>;

    fn stop(&self, poll: PollSettings) -> Result<()>;

    fn wait_done(&self, poll: PollSettings) -> Result<()>;

    fn configure(&self, config: &ScopeConfig) -> Result<()>;

    fn read(&self, timeout: Duration) -> Result<ScopeRecording>;

    fn available_trigger_inputs(&self) -> Result<Vec<String>>;

    fn available_inputs(&self) -> Result<Vec<String>>;
}

pub trait ShfqaBacking: DeviceBacking {
    fn qachannels(&self) -> Option<BackingList<Rc<dyn QaChannelBacking>>>;

    fn scopes(&self) -> Option<BackingList<Rc<dyn ScopeBacking>>>;

    fn factory_reset(&self, deep: bool) -> Result<()>;

    fn start_continuous_sw_trigger(&self, num_triggers: u32, wait_time: Duration) -> Result<()>;

    fn max_qubits_per_channel(&self) -> Result<u32>;
}

pub trait PqscBacking: DeviceBacking {
    fn arm(&self, deep: bool, repetitions: Option<u32>, holdoff: Option<Duration>) -> Result<()>;

    fn run(&self, deep: bool) -> Result<()>;

    fn arm_and_run(&self, repetitions: Option<u32>, holdoff: Option<Duration>) -> Result<()>;

    fn stop(&self, deep: bool) -> Result<()>;

    fn wait_done(&self, poll: PollSettings) -> Result<()>;

    fn check_ref_clock(&self, poll: PollSettings) -> Result<bool>;

    fn check_zsync_connection(&self, ports: &ZsyncPorts, poll: PollSettings) -> Result<ZsyncStatus>;

    fn find_zsync_worker_port(&self, device: &dyn DeviceBacking) -> Result<u32>;
}

pub trait ImpedanceModuleBacking: RootBacking {
    fn wait_done(&self, step: Option<u32>, poll: PollSettings) -> Result<()>;

    fn finish(&self) -> Result<()>;

    fn finished(&self, step: Option<u32>) -> Result<bool>;
}

pub trait ShfqaSweeperBacking: RootBacking {
    /// Serial of the device the sweeper runs with, empty if none is set.
    fn device(&self) -> Result<String>;

    fn set_device(&self, serial: &str) -> Result<()>;

    fn run(&self) -> Result<Value>;

    fn get_result(&self) -> Result<Value>;

    fn plot(&self) -> Result<()>;

    fn get_offset_freq_vector(&self) -> Result<Vec<f64>>;
}
