// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! In-memory toolkit objects for tests.
//!
//! Every fake records the forwarded calls as `"{node path} {operation} {args}"`.
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use indexmap::IndexMap;
use num_complex::Complex64;
use serde_json::{Value, json};
use zhinst_nodetree::{BackingList, NodePath, NodeTreeBacking};

use crate::backing::*;
use crate::types::*;
use crate::{Error, PollSettings, Result};

#[derive(Clone, Default)]
pub(crate) struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    fn record(&self, path: &NodePath, call: String) {
        self.0.borrow_mut().push(format!("{path} {call}"));
    }
}

fn poll_args(poll: PollSettings) -> String {
    format!("timeout={:?} sleep_time={:?}", poll.timeout, poll.sleep_time)
}

fn timeout(path: &NodePath) -> Error {
    Error::Timeout(format!("{path} did not finish in time"))
}

#[derive(Default)]
pub(crate) struct FakeNodeTree {
    values: RefCell<IndexMap<NodePath, Value>>,
}

impl FakeNodeTree {
    fn insert(&self, path: &str, value: Value) {
        self.values.borrow_mut().insert(NodePath::new(path), value);
    }
}

impl NodeTreeBacking for FakeNodeTree {
    fn list_leaves(&self, prefix: &NodePath) -> Result<Vec<NodePath>> {
        Ok(self
            .values
            .borrow()
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn get_value(&self, path: &NodePath) -> Result<Value> {
        self.values
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Toolkit(format!("Node {path} does not exist")))
    }

    fn set_value(&self, path: &NodePath, value: Value) -> Result<()> {
        self.values.borrow_mut().insert(path.clone(), value);
        Ok(())
    }

    fn get_values(&self, prefix: &NodePath) -> Result<IndexMap<NodePath, Value>> {
        Ok(self
            .values
            .borrow()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, value)| (path.clone(), value.clone()))
            .collect())
    }
}

struct FakeLeaf {
    path: NodePath,
    recorder: Recorder,
    never_done: bool,
}

impl FakeLeaf {
    fn new(path: NodePath, recorder: &Recorder, never_done: bool) -> Rc<Self> {
        Rc::new(FakeLeaf {
            path,
            recorder: recorder.clone(),
            never_done,
        })
    }

    fn record(&self, call: String) {
        self.recorder.record(&self.path, call);
    }

    fn wait(&self, call: &str, poll: PollSettings) -> Result<()> {
        self.record(format!("{call} {}", poll_args(poll)));
        if self.never_done {
            return Err(timeout(&self.path));
        }
        Ok(())
    }
}

impl Backing for FakeLeaf {
    fn node_path(&self) -> NodePath {
        self.path.clone()
    }
}

impl GeneratorBacking for FakeLeaf {
    fn enable_sequencer(&self, single: bool) -> Result<()> {
        self.record(format!("enable_sequencer single={single}"));
        Ok(())
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.wait("wait_done", poll)
    }

    fn compile_sequencer_program(
        &self,
        program: &str,
        options: &CompileOptions,
    ) -> Result<CompiledProgram> {
        self.record(format!("compile_sequencer_program program={program} options={options:?}"));
        Ok(CompiledProgram {
            elf: vec![0x7f, b'E', b'L', b'F'],
            info: json!({"messages": ""}),
        })
    }

    fn load_sequencer_program(&self, program: &str, options: &CompileOptions) -> Result<Value> {
        self.record(format!("load_sequencer_program program={program} options={options:?}"));
        Ok(json!({"messages": ""}))
    }

    fn write_to_waveform_memory(&self, pulses: &Waveforms, clear_existing: bool) -> Result<()> {
        self.record(format!(
            "write_to_waveform_memory pulses={pulses:?} clear_existing={clear_existing}"
        ));
        Ok(())
    }

    fn read_from_waveform_memory(&self, slots: Option<&[u32]>) -> Result<Waveforms> {
        self.record(format!("read_from_waveform_memory slots={slots:?}"));
        Ok(slots
            .unwrap_or(&[0])
            .iter()
            .map(|slot| (*slot, vec![Complex64::new(1.0, 0.0)]))
            .collect())
    }

    fn configure_sequencer_triggering(
        &self,
        aux_trigger: &str,
        play_pulse_delay: f64,
    ) -> Result<()> {
        self.record(format!(
            "configure_sequencer_triggering aux_trigger={aux_trigger} \
             play_pulse_delay={play_pulse_delay}"
        ));
        Ok(())
    }

    fn available_aux_trigger_inputs(&self) -> Result<Vec<String>> {
        self.record("available_aux_trigger_inputs".to_string());
        Ok(vec!["chan0trigin0".to_string(), "software_trigger0".to_string()])
    }
}

impl QuditBacking for FakeLeaf {
    fn configure(&self, settings: &QuditSettings, enable: bool) -> Result<()> {
        self.record(format!("configure settings={settings:?} enable={enable}"));
        Ok(())
    }
}

impl SpectroscopyBacking for FakeLeaf {
    fn configure_result_logger(&self, settings: &ResultLoggerSettings) -> Result<()> {
        self.record(format!("configure_result_logger settings={settings:?}"));
        Ok(())
    }

    fn run(&self) -> Result<()> {
        self.record("run".to_string());
        Ok(())
    }

    fn stop(&self, poll: PollSettings) -> Result<()> {
        self.wait("stop", poll)
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.wait("wait_done", poll)
    }

    fn read(&self, timeout: Duration) -> Result<Vec<Complex64>> {
        self.wait("read", PollSettings::new(timeout, Duration::ZERO))?;
        Ok(vec![Complex64::new(0.5, -0.5)])
    }
}

impl ScopeBacking for FakeLeaf {
    fn run(&self, single: bool, poll: PollSettings) -> Result<()> {
        self.record(format!("run single={single} {}", poll_args(poll)));
        Ok(())
    }

    fn stop(&self, poll: PollSettings) -> Result<()> {
        self.wait("stop", poll)
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.wait("wait_done", poll)
    }

    fn configure(&self, config: &ScopeConfig) -> Result<()> {
        self.record(format!("configure config={config:?}"));
        Ok(())
    }

    fn read(&self, timeout: Duration) -> Result<ScopeRecording> {
        self.wait("read", PollSettings::new(timeout, Duration::ZERO))?;
        Ok(ScopeRecording::default())
    }

    fn available_trigger_inputs(&self) -> Result<Vec<String>> {
        self.record("available_trigger_inputs".to_string());
        Ok(vec!["channel0_trigger_input0".to_string()])
    }

    fn available_inputs(&self) -> Result<Vec<String>> {
        self.record("available_inputs".to_string());
        Ok(vec!["channel0_signal_input".to_string()])
    }
}

struct FakeMultiState {
    leaf: Rc<FakeLeaf>,
    qudits: usize,
}

impl Backing for FakeMultiState {
    fn node_path(&self) -> NodePath {
        self.leaf.path.clone()
    }
}

impl MultiStateBacking for FakeMultiState {
    fn qudits(&self) -> Option<BackingList<Rc<dyn QuditBacking>>> {
        let zi_node = self.leaf.path.join("qudits");
        let qudits = (0..self.qudits)
            .map(|index| {
                let qudit: Rc<dyn QuditBacking> =
                    FakeLeaf::new(zi_node.join(index.to_string()), &self.leaf.recorder, false);
                qudit
            })
            .collect();
        Some(BackingList::new(zi_node, qudits))
    }

    fn get_qudits_results(&self) -> Result<IndexMap<u32, Vec<i64>>> {
        self.leaf.record("get_qudits_results".to_string());
        Ok((0..self.qudits as u32).map(|index| (index, vec![0, 1, 2])).collect())
    }
}

struct FakeReadout {
    leaf: Rc<FakeLeaf>,
    qudits: usize,
}

impl Backing for FakeReadout {
    fn node_path(&self) -> NodePath {
        self.leaf.path.clone()
    }
}

impl ReadoutBacking for FakeReadout {
    fn multistate(&self) -> Option<Rc<dyn MultiStateBacking>> {
        Some(Rc::new(FakeMultiState {
            leaf: FakeLeaf::new(self.leaf.path.join("multistate"), &self.leaf.recorder, false),
            qudits: self.qudits,
        }))
    }

    fn configure_result_logger(
        &self,
        result_source: &str,
        settings: &ResultLoggerSettings,
    ) -> Result<()> {
        self.leaf.record(format!(
            "configure_result_logger result_source={result_source} settings={settings:?}"
        ));
        Ok(())
    }

    fn run(&self) -> Result<()> {
        self.leaf.record("run".to_string());
        Ok(())
    }

    fn stop(&self, poll: PollSettings) -> Result<()> {
        self.leaf.wait("stop", poll)
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.leaf.wait("wait_done", poll)
    }

    fn read(&self, timeout: Duration) -> Result<ReadoutData> {
        self.leaf.wait("read", PollSettings::new(timeout, Duration::ZERO))?;
        Ok(vec![vec![Complex64::new(1.0, 1.0)]])
    }

    fn write_integration_weights(
        &self,
        weights: &Waveforms,
        integration_delay: f64,
        clear_existing: bool,
    ) -> Result<()> {
        self.leaf.record(format!(
            "write_integration_weights weights={weights:?} \
             integration_delay={integration_delay} clear_existing={clear_existing}"
        ));
        Ok(())
    }

    fn read_integration_weights(&self, slots: Option<&[u32]>) -> Result<Waveforms> {
        self.leaf.record(format!("read_integration_weights slots={slots:?}"));
        Ok(Waveforms::new())
    }
}

/// QA channel whose sub-resources are configured per test.
#[derive(Clone)]
pub(crate) struct FakeQaChannel {
    path: NodePath,
    index: usize,
    recorder: Recorder,
    generator: bool,
    readout_qudits: Option<usize>,
    spectroscopy: bool,
    never_done: bool,
}

impl FakeQaChannel {
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn with_generator(mut self) -> Self {
        self.generator = true;
        self
    }

    /// Readout with a multistate of `qudits` qudits.
    pub(crate) fn with_readout(mut self, qudits: usize) -> Self {
        self.readout_qudits = Some(qudits);
        self
    }

    pub(crate) fn with_spectroscopy(mut self) -> Self {
        self.spectroscopy = true;
        self
    }

    /// Waiting operations of the channel children time out.
    pub(crate) fn never_done(mut self) -> Self {
        self.never_done = true;
        self
    }

    fn leaf(&self, name: &str) -> Rc<FakeLeaf> {
        FakeLeaf::new(self.path.join(name), &self.recorder, self.never_done)
    }
}

impl Backing for FakeQaChannel {
    fn node_path(&self) -> NodePath {
        self.path.clone()
    }
}

impl QaChannelBacking for FakeQaChannel {
    fn generator(&self) -> Option<Rc<dyn GeneratorBacking>> {
        if !self.generator {
            return None;
        }
        let generator: Rc<dyn GeneratorBacking> = self.leaf("generator");
        Some(generator)
    }

    fn readout(&self) -> Option<Rc<dyn ReadoutBacking>> {
        let qudits = self.readout_qudits?;
        Some(Rc::new(FakeReadout {
            leaf: self.leaf("readout"),
            qudits,
        }))
    }

    fn spectroscopy(&self) -> Option<Rc<dyn SpectroscopyBacking>> {
        if !self.spectroscopy {
            return None;
        }
        let spectroscopy: Rc<dyn SpectroscopyBacking> = self.leaf("spectroscopy");
        Some(spectroscopy)
    }

    fn configure_channel(&self, config: &ChannelConfig) -> Result<()> {
        self.recorder
            .record(&self.path, format!("configure_channel config={config:?}"));
        Ok(())
    }
}

struct FakeDevice {
    path: NodePath,
    serial: String,
    device_type: String,
    recorder: Recorder,
    tree: Rc<FakeNodeTree>,
    never_done: bool,
    disconnected: bool,
}

impl FakeDevice {
    fn new(serial: &str, device_type: &str, recorder: &Recorder) -> Self {
        FakeDevice {
            path: NodePath::new(serial),
            serial: serial.to_string(),
            device_type: device_type.to_string(),
            recorder: recorder.clone(),
            tree: Rc::new(FakeNodeTree::default()),
            never_done: false,
            disconnected: false,
        }
    }

    fn property(&self, value: &str) -> Result<String> {
        if self.disconnected {
            return Err(Error::Runtime("disconnected".to_string()));
        }
        Ok(value.to_string())
    }

    fn record(&self, call: String) {
        self.recorder.record(&self.path, call);
    }
}

macro_rules! impl_fake_device {
    ($fake:ty) => {
        impl Backing for $fake {
            fn node_path(&self) -> NodePath {
                self.device.path.clone()
            }
        }

        impl RootBacking for $fake {
            fn node_tree(&self) -> Option<Rc<dyn NodeTreeBacking>> {
                let tree: Rc<dyn NodeTreeBacking> = self.device.tree.clone();
                Some(tree)
            }
        }

        impl DeviceBacking for $fake {
            fn serial(&self) -> Result<String> {
                self.device.property(&self.device.serial)
            }

            fn device_type(&self) -> Result<String> {
                self.device.property(&self.device.device_type)
            }

            fn check_compatibility(&self) -> Result<()> {
                self.device.record("check_compatibility".to_string());
                Ok(())
            }

            fn as_device(&self) -> &dyn DeviceBacking {
                self
            }
        }

        impl $fake {
            pub(crate) fn with_node(self, path: &str, value: Value) -> Self {
                self.device.tree.insert(path, value);
                self
            }

            /// Device properties fail like on a lost connection.
            pub(crate) fn disconnected(mut self) -> Self {
                self.device.disconnected = true;
                self
            }
        }
    };
}

pub(crate) struct FakeShfqa {
    device: FakeDevice,
    qachannels: Vec<FakeQaChannel>,
    scopes: usize,
}

impl FakeShfqa {
    pub(crate) fn new(serial: &str, recorder: &Recorder) -> Self {
        FakeShfqa {
            device: FakeDevice::new(serial, "SHFQA", recorder),
            qachannels: vec![],
            scopes: 0,
        }
    }

    /// Add `count` QA channels, each configured by `configure`.
    pub(crate) fn with_qachannels<F>(mut self, count: usize, mut configure: F) -> Self
    where
        F: FnMut(FakeQaChannel) -> FakeQaChannel,
    {
        let zi_node = self.device.path.join("qachannels");
        self.qachannels = (0..count)
            .map(|index| {
                configure(FakeQaChannel {
                    path: zi_node.join(index.to_string()),
                    index,
                    recorder: self.device.recorder.clone(),
                    generator: false,
                    readout_qudits: None,
                    spectroscopy: false,
                    never_done: false,
                })
            })
            .collect();
        self
    }

    pub(crate) fn with_scopes(mut self, count: usize) -> Self {
        self.scopes = count;
        self
    }
}

impl_fake_device!(FakeShfqa);

impl ShfqaBacking for FakeShfqa {
    fn qachannels(&self) -> Option<BackingList<Rc<dyn QaChannelBacking>>> {
        let channels = self
            .qachannels
            .iter()
            .map(|channel| {
                let channel: Rc<dyn QaChannelBacking> = Rc::new(channel.clone());
                channel
            })
            .collect();
        Some(BackingList::new(self.device.path.join("qachannels"), channels))
    }

    fn scopes(&self) -> Option<BackingList<Rc<dyn ScopeBacking>>> {
        if self.scopes == 0 {
            return None;
        }
        let zi_node = self.device.path.join("scopes");
        let scopes = (0..self.scopes)
            .map(|index| {
                let scope: Rc<dyn ScopeBacking> =
                    FakeLeaf::new(zi_node.join(index.to_string()), &self.device.recorder, false);
                scope
            })
            .collect();
        Some(BackingList::new(zi_node, scopes))
    }

    fn factory_reset(&self, deep: bool) -> Result<()> {
        self.device.record(format!("factory_reset deep={deep}"));
        Ok(())
    }

    fn start_continuous_sw_trigger(&self, num_triggers: u32, wait_time: Duration) -> Result<()> {
        self.device.record(format!(
            "start_continuous_sw_trigger num_triggers={num_triggers} wait_time={wait_time:?}"
        ));
        Ok(())
    }

    fn max_qubits_per_channel(&self) -> Result<u32> {
        self.device.record("max_qubits_per_channel".to_string());
        Ok(16)
    }
}

pub(crate) struct FakePqsc {
    device: FakeDevice,
}

impl FakePqsc {
    pub(crate) fn new(serial: &str, recorder: &Recorder) -> Self {
        FakePqsc {
            device: FakeDevice::new(serial, "PQSC", recorder),
        }
    }

    pub(crate) fn never_done(mut self) -> Self {
        self.device.never_done = true;
        self
    }
}

impl_fake_device!(FakePqsc);

impl PqscBacking for FakePqsc {
    fn arm(&self, deep: bool, repetitions: Option<u32>, holdoff: Option<Duration>) -> Result<()> {
        self.device.record(format!(
            "arm deep={deep} repetitions={repetitions:?} holdoff={holdoff:?}"
        ));
        Ok(())
    }

    fn run(&self, deep: bool) -> Result<()> {
        self.device.record(format!("run deep={deep}"));
        Ok(())
    }

    fn arm_and_run(&self, repetitions: Option<u32>, holdoff: Option<Duration>) -> Result<()> {
        self.device.record(format!(
            "arm_and_run repetitions={repetitions:?} holdoff={holdoff:?}"
        ));
        Ok(())
    }

    fn stop(&self, deep: bool) -> Result<()> {
        self.device.record(format!("stop deep={deep}"));
        Ok(())
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.device.record(format!("wait_done {}", poll_args(poll)));
        if self.device.never_done {
            return Err(timeout(&self.device.path));
        }
        Ok(())
    }

    fn check_ref_clock(&self, poll: PollSettings) -> Result<bool> {
        self.device.record(format!("check_ref_clock {}", poll_args(poll)));
        Ok(true)
    }

    fn check_zsync_connection(
        &self,
        ports: &ZsyncPorts,
        poll: PollSettings,
    ) -> Result<ZsyncStatus> {
        self.device.record(format!(
            "check_zsync_connection ports={ports:?} {}",
            poll_args(poll)
        ));
        Ok(match ports {
            ZsyncPorts::Single(_) => ZsyncStatus::Single(true),
            ZsyncPorts::Multiple(ports) => ZsyncStatus::Multiple(vec![true; ports.len()]),
        })
    }

    fn find_zsync_worker_port(&self, device: &dyn DeviceBacking) -> Result<u32> {
        self.device
            .record(format!("find_zsync_worker_port device={}", device.serial()?));
        Ok(3)
    }
}

struct FakeModule {
    path: NodePath,
    recorder: Recorder,
    tree: Rc<FakeNodeTree>,
}

impl FakeModule {
    fn new(path: &str, recorder: &Recorder) -> Self {
        FakeModule {
            path: NodePath::new(path),
            recorder: recorder.clone(),
            tree: Rc::new(FakeNodeTree::default()),
        }
    }

    fn record(&self, call: String) {
        self.recorder.record(&self.path, call);
    }
}

macro_rules! impl_fake_module {
    ($fake:ty) => {
        impl Backing for $fake {
            fn node_path(&self) -> NodePath {
                self.module.path.clone()
            }
        }

        impl RootBacking for $fake {
            fn node_tree(&self) -> Option<Rc<dyn NodeTreeBacking>> {
                let tree: Rc<dyn NodeTreeBacking> = self.module.tree.clone();
                Some(tree)
            }
        }

        impl $fake {
            pub(crate) fn with_node(self, path: &str, value: Value) -> Self {
                self.module.tree.insert(path, value);
                self
            }
        }
    };
}

pub(crate) struct FakeImpedanceModule {
    module: FakeModule,
}

impl FakeImpedanceModule {
    pub(crate) fn new(recorder: &Recorder) -> Self {
        FakeImpedanceModule {
            module: FakeModule::new("/impedance", recorder),
        }
    }
}

impl_fake_module!(FakeImpedanceModule);

impl ImpedanceModuleBacking for FakeImpedanceModule {
    fn wait_done(&self, step: Option<u32>, poll: PollSettings) -> Result<()> {
        self.module
            .record(format!("wait_done step={step:?} {}", poll_args(poll)));
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        self.module.record("finish".to_string());
        Ok(())
    }

    fn finished(&self, step: Option<u32>) -> Result<bool> {
        self.module.record(format!("finished step={step:?}"));
        Ok(false)
    }
}

/// Sweeper whose device is stored in the `/device` node.
pub(crate) struct FakeShfqaSweeper {
    module: FakeModule,
}

impl FakeShfqaSweeper {
    pub(crate) fn new(recorder: &Recorder) -> Self {
        FakeShfqaSweeper {
            module: FakeModule::new("/", recorder),
        }
    }
}

impl_fake_module!(FakeShfqaSweeper);

impl ShfqaSweeperBacking for FakeShfqaSweeper {
    fn device(&self) -> Result<String> {
        let value = self.module.tree.get_value(&NodePath::new("/device")).ok();
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    fn set_device(&self, serial: &str) -> Result<()> {
        self.module.tree.set_value(&NodePath::new("/device"), json!(serial))
    }

    fn run(&self) -> Result<Value> {
        self.module.record("run".to_string());
        Ok(json!({"vector": [1.0, 2.0]}))
    }

    fn get_result(&self) -> Result<Value> {
        self.module.record("get_result".to_string());
        Ok(json!({"vector": [1.0, 2.0]}))
    }

    fn plot(&self) -> Result<()> {
        self.module.record("plot".to_string());
        Ok(())
    }

    fn get_offset_freq_vector(&self) -> Result<Vec<f64>> {
        self.module.record("get_offset_freq_vector".to_string());
        Ok(vec![-1e6, 0.0, 1e6])
    }
}
