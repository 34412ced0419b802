// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::rc::Rc;
use std::time::Duration;

use indexmap::IndexMap;
use num_complex::Complex64;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};
use serde_json::Value;
use zhinst_nodetree::{BackingList, Error, NodePath, NodeTreeBacking, Result};

use super::PyToolkitObject;
use super::conversions::{
    complex_matrix, complex_vec, qudit_settings_to_py, scope_recording, to_json, toolkit_enum,
    waveforms_from_py, waveforms_to_py,
};
use crate::PollSettings;
use crate::backing::*;
use crate::types::*;

fn set_poll(kwargs: &Bound<'_, PyDict>, poll: PollSettings) -> PyResult<()> {
    kwargs.set_item("timeout", poll.timeout.as_secs_f64())?;
    kwargs.set_item("sleep_time", poll.sleep_time.as_secs_f64())
}

fn set_result_logger(kwargs: &Bound<'_, PyDict>, settings: &ResultLoggerSettings) -> PyResult<()> {
    let py = kwargs.py();
    kwargs.set_item("result_length", settings.result_length)?;
    kwargs.set_item("num_averages", settings.num_averages)?;
    kwargs.set_item(
        "averaging_mode",
        toolkit_enum(py, "AveragingMode", settings.averaging_mode.as_str())?,
    )
}

fn set_compile_options(
    kwargs: &Bound<'_, PyDict>,
    program: &str,
    options: &CompileOptions,
) -> PyResult<()> {
    kwargs.set_item("sequencer_program", program)?;
    if let Some(samplerate) = options.samplerate {
        kwargs.set_item("samplerate", samplerate)?;
    }
    for (key, value) in [
        ("wavepath", &options.wavepath),
        ("waveforms", &options.waveforms),
        ("output", &options.output),
    ] {
        if let Some(value) = value {
            kwargs.set_item(key, value)?;
        }
    }
    Ok(())
}

impl Backing for PyToolkitObject {
    fn node_path(&self) -> NodePath {
        self.path()
    }
}

impl RootBacking for PyToolkitObject {
    fn node_tree(&self) -> Option<Rc<dyn NodeTreeBacking>> {
        self.tree().map(|tree| tree as Rc<dyn NodeTreeBacking>)
    }
}

impl DeviceBacking for PyToolkitObject {
    fn serial(&self) -> Result<String> {
        self.attribute("serial")
    }

    fn device_type(&self) -> Result<String> {
        self.attribute("device_type")
    }

    fn check_compatibility(&self) -> Result<()> {
        self.call0("check_compatibility")
    }

    fn as_device(&self) -> &dyn DeviceBacking {
        self
    }
}

impl GeneratorBacking for PyToolkitObject {
    fn enable_sequencer(&self, single: bool) -> Result<()> {
        self.call_with("enable_sequencer", |kwargs| kwargs.set_item("single", single), |_| Ok(()))
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.call_with("wait_done", |kwargs| set_poll(kwargs, poll), |_| Ok(()))
    }

    fn compile_sequencer_program(
        &self,
        program: &str,
        options: &CompileOptions,
    ) -> Result<CompiledProgram> {
        self.call_with(
            "compile_sequencer_program",
            |kwargs| set_compile_options(kwargs, program, options),
            |result| {
                let (elf, info) = result.extract::<(Bound<'_, PyBytes>, Bound<'_, PyAny>)>()?;
                Ok(CompiledProgram {
                    elf: elf.as_bytes().to_vec(),
                    info: to_json(&info)?,
                })
            },
        )
    }

    fn load_sequencer_program(&self, program: &str, options: &CompileOptions) -> Result<Value> {
        self.call_with(
            "load_sequencer_program",
            |kwargs| set_compile_options(kwargs, program, options),
            to_json,
        )
    }

    fn write_to_waveform_memory(&self, pulses: &Waveforms, clear_existing: bool) -> Result<()> {
        self.call_with(
            "write_to_waveform_memory",
            |kwargs| {
                kwargs.set_item("pulses", waveforms_to_py(kwargs.py(), pulses)?)?;
                kwargs.set_item("clear_existing", clear_existing)
            },
            |_| Ok(()),
        )
    }

    fn read_from_waveform_memory(&self, slots: Option<&[u32]>) -> Result<Waveforms> {
        self.call_with(
            "read_from_waveform_memory",
            |kwargs| kwargs.set_item("slots", slots.map(<[u32]>::to_vec)),
            waveforms_from_py,
        )
    }

    fn configure_sequencer_triggering(
        &self,
        aux_trigger: &str,
        play_pulse_delay: f64,
    ) -> Result<()> {
        self.call_with(
            "configure_sequencer_triggering",
            |kwargs| {
                kwargs.set_item("aux_trigger", aux_trigger)?;
                kwargs.set_item("play_pulse_delay", play_pulse_delay)
            },
            |_| Ok(()),
        )
    }

    fn available_aux_trigger_inputs(&self) -> Result<Vec<String>> {
        self.attribute("available_aux_trigger_inputs")
    }
}

impl QuditBacking for PyToolkitObject {
    fn configure(&self, settings: &QuditSettings, enable: bool) -> Result<()> {
        self.call_with(
            "configure",
            |kwargs| {
                kwargs.set_item("qudit_settings", qudit_settings_to_py(kwargs.py(), settings)?)?;
                kwargs.set_item("enable", enable)
            },
            |_| Ok(()),
        )
    }
}

impl MultiStateBacking for PyToolkitObject {
    fn qudits(&self) -> Option<BackingList<Rc<dyn QuditBacking>>> {
        self.children("qudits", |object| Rc::new(object) as Rc<dyn QuditBacking>)
    }

    fn get_qudits_results(&self) -> Result<IndexMap<u32, Vec<i64>>> {
        self.call_with(
            "get_qudits_results",
            |_| Ok(()),
            |result| {
                result
                    .downcast::<PyDict>()?
                    .iter()
                    .map(|(qudit, values)| {
                        let values = values.call_method0("tolist").unwrap_or(values);
                        Ok((qudit.extract::<u32>()?, values.extract::<Vec<i64>>()?))
                    })
                    .collect()
            },
        )
    }
}

impl ReadoutBacking for PyToolkitObject {
    fn multistate(&self) -> Option<Rc<dyn MultiStateBacking>> {
        self.child("multistate")
            .map(|object| Rc::new(object) as Rc<dyn MultiStateBacking>)
    }

    fn configure_result_logger(
        &self,
        result_source: &str,
        settings: &ResultLoggerSettings,
    ) -> Result<()> {
        self.call_with(
            "configure_result_logger",
            |kwargs| {
                kwargs.set_item("result_source", result_source)?;
                set_result_logger(kwargs, settings)
            },
            |_| Ok(()),
        )
    }

    fn run(&self) -> Result<()> {
        self.call0("run")
    }

    fn stop(&self, poll: PollSettings) -> Result<()> {
        self.call_with("stop", |kwargs| set_poll(kwargs, poll), |_| Ok(()))
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.call_with("wait_done", |kwargs| set_poll(kwargs, poll), |_| Ok(()))
    }

    fn read(&self, timeout: Duration) -> Result<ReadoutData> {
        self.call_with(
            "read",
            |kwargs| kwargs.set_item("timeout", timeout.as_secs_f64()),
            complex_matrix,
        )
    }

    fn write_integration_weights(
        &self,
        weights: &Waveforms,
        integration_delay: f64,
        clear_existing: bool,
    ) -> Result<()> {
        self.call_with(
            "write_integration_weights",
            |kwargs| {
                kwargs.set_item("weights", waveforms_to_py(kwargs.py(), weights)?)?;
                kwargs.set_item("integration_delay", integration_delay)?;
                kwargs.set_item("clear_existing", clear_existing)
            },
            |_| Ok(()),
        )
    }

    fn read_integration_weights(&self, slots: Option<&[u32]>) -> Result<Waveforms> {
        self.call_with(
            "read_integration_weights",
            |kwargs| kwargs.set_item("slots", slots.map(<[u32]>::to_vec)),
            waveforms_from_py,
        )
    }
}

impl SpectroscopyBacking for PyToolkitObject {
    fn configure_result_logger(&self, settings: &ResultLoggerSettings) -> Result<()> {
        self.call_with(
            "configure_result_logger",
            |kwargs| set_result_logger(kwargs, settings),
            |_| Ok(()),
        )
    }

    fn run(&self) -> Result<()> {
        self.call0("run")
    }

    fn stop(&self, poll: PollSettings) -> Result<()> {
        self.call_with("stop", |kwargs| set_poll(kwargs, poll), |_| Ok(()))
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.call_with("wait_done", |kwargs| set_poll(kwargs, poll), |_| Ok(()))
    }

    fn read(&self, timeout: Duration) -> Result<Vec<Complex64>> {
        self.call_with(
            "read",
            |kwargs| kwargs.set_item("timeout", timeout.as_secs_f64()),
            complex_vec,
        )
    }
}

impl QaChannelBacking for PyToolkitObject {
    fn generator(&self) -> Option<Rc<dyn GeneratorBacking>> {
        self.child("generator")
            .map(|object| Rc::new(object) as Rc<dyn GeneratorBacking>)
    }

    fn readout(&self) -> Option<Rc<dyn ReadoutBacking>> {
        self.child("readout")
            .map(|object| Rc::new(object) as Rc<dyn ReadoutBacking>)
    }

    fn spectroscopy(&self) -> Option<Rc<dyn SpectroscopyBacking>> {
        self.child("spectroscopy")
            .map(|object| Rc::new(object) as Rc<dyn SpectroscopyBacking>)
    }

    fn configure_channel(&self, config: &ChannelConfig) -> Result<()> {
        self.call_with(
            "configure_channel",
            |kwargs| {
                kwargs.set_item("input_range", config.input_range)?;
                kwargs.set_item("output_range", config.output_range)?;
                kwargs.set_item("center_frequency", config.center_frequency)?;
                kwargs.set_item(
                    "mode",
                    toolkit_enum(kwargs.py(), "SHFQAChannelMode", config.mode.as_str())?,
                )
            },
            |_| Ok(()),
        )
    }
}

impl ScopeBacking for PyToolkitObject {
    fn run(&self, single: bool, poll: PollSettings) -> Result<()> {
        self.call_with(
            "run",
            |kwargs| {
                kwargs.set_item("single", single)?;
                set_poll(kwargs, poll)
            },
            |_| Ok(()),
        )
    }

    fn stop(&self, poll: PollSettings) -> Result<()> {
        self.call_with("stop", |kwargs| set_poll(kwargs, poll), |_| Ok(()))
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.call_with("wait_done", |kwargs| set_poll(kwargs, poll), |_| Ok(()))
    }

    fn configure(&self, config: &ScopeConfig) -> Result<()> {
        self.call_with(
            "configure",
            |kwargs| {
                let input_select = PyDict::new(kwargs.py());
                for (channel, input) in &config.input_select {
                    input_select.set_item(channel, input)?;
                }
                kwargs.set_item("input_select", input_select)?;
                kwargs.set_item("num_samples", config.num_samples)?;
                kwargs.set_item("trigger_input", config.trigger_input.as_deref())?;
                kwargs.set_item("num_segments", config.num_segments)?;
                kwargs.set_item("num_averages", config.num_averages)?;
                kwargs.set_item("trigger_delay", config.trigger_delay)
            },
            |_| Ok(()),
        )
    }

    fn read(&self, timeout: Duration) -> Result<ScopeRecording> {
        self.call_with(
            "read",
            |kwargs| kwargs.set_item("timeout", timeout.as_secs_f64()),
            scope_recording,
        )
    }

    fn available_trigger_inputs(&self) -> Result<Vec<String>> {
        self.attribute("available_trigger_inputs")
    }

    fn available_inputs(&self) -> Result<Vec<String>> {
        self.attribute("available_inputs")
    }
}

impl ShfqaBacking for PyToolkitObject {
    fn qachannels(&self) -> Option<BackingList<Rc<dyn QaChannelBacking>>> {
        self.children("qachannels", |object| Rc::new(object) as Rc<dyn QaChannelBacking>)
    }

    fn scopes(&self) -> Option<BackingList<Rc<dyn ScopeBacking>>> {
        self.children("scopes", |object| Rc::new(object) as Rc<dyn ScopeBacking>)
    }

    fn factory_reset(&self, deep: bool) -> Result<()> {
        self.call_with("factory_reset", |kwargs| kwargs.set_item("deep", deep), |_| Ok(()))
    }

    fn start_continuous_sw_trigger(&self, num_triggers: u32, wait_time: Duration) -> Result<()> {
        self.call_with(
            "start_continuous_sw_trigger",
            |kwargs| {
                kwargs.set_item("num_triggers", num_triggers)?;
                kwargs.set_item("wait_time", wait_time.as_secs_f64())
            },
            |_| Ok(()),
        )
    }

    fn max_qubits_per_channel(&self) -> Result<u32> {
        self.attribute("max_qubits_per_channel")
    }
}

fn set_execution(
    kwargs: &Bound<'_, PyDict>,
    repetitions: Option<u32>,
    holdoff: Option<Duration>,
) -> PyResult<()> {
    kwargs.set_item("repetitions", repetitions)?;
    kwargs.set_item("holdoff", holdoff.map(|holdoff| holdoff.as_secs_f64()))
}

impl PqscBacking for PyToolkitObject {
    fn arm(&self, deep: bool, repetitions: Option<u32>, holdoff: Option<Duration>) -> Result<()> {
        self.call_with(
            "arm",
            |kwargs| {
                kwargs.set_item("deep", deep)?;
                set_execution(kwargs, repetitions, holdoff)
            },
            |_| Ok(()),
        )
    }

    fn run(&self, deep: bool) -> Result<()> {
        self.call_with("run", |kwargs| kwargs.set_item("deep", deep), |_| Ok(()))
    }

    fn arm_and_run(&self, repetitions: Option<u32>, holdoff: Option<Duration>) -> Result<()> {
        self.call_with(
            "arm_and_run",
            |kwargs| set_execution(kwargs, repetitions, holdoff),
            |_| Ok(()),
        )
    }

    fn stop(&self, deep: bool) -> Result<()> {
        self.call_with("stop", |kwargs| kwargs.set_item("deep", deep), |_| Ok(()))
    }

    fn wait_done(&self, poll: PollSettings) -> Result<()> {
        self.call_with("wait_done", |kwargs| set_poll(kwargs, poll), |_| Ok(()))
    }

    fn check_ref_clock(&self, poll: PollSettings) -> Result<bool> {
        self.call("check_ref_clock", |kwargs| set_poll(kwargs, poll))
    }

    fn check_zsync_connection(
        &self,
        ports: &ZsyncPorts,
        poll: PollSettings,
    ) -> Result<ZsyncStatus> {
        self.call_with(
            "check_zsync_connection",
            |kwargs| {
                match ports {
                    ZsyncPorts::Single(port) => kwargs.set_item("ports", port)?,
                    ZsyncPorts::Multiple(ports) => kwargs.set_item("ports", ports)?,
                }
                set_poll(kwargs, poll)
            },
            |result| match ports {
                ZsyncPorts::Single(_) => Ok(ZsyncStatus::Single(result.extract()?)),
                ZsyncPorts::Multiple(_) => Ok(ZsyncStatus::Multiple(result.extract()?)),
            },
        )
    }

    fn find_zsync_worker_port(&self, device: &dyn DeviceBacking) -> Result<u32> {
        let Some(device) = device.as_any().downcast_ref::<PyToolkitObject>() else {
            return Err(Error::new("The device is not backed by a zhinst-toolkit object"));
        };
        self.call("find_zsync_worker_port", |kwargs| {
            kwargs.set_item("device", device.object().clone_ref(kwargs.py()))
        })
    }
}

impl ImpedanceModuleBacking for PyToolkitObject {
    fn wait_done(&self, step: Option<u32>, poll: PollSettings) -> Result<()> {
        self.call_with(
            "wait_done",
            |kwargs| {
                kwargs.set_item("step", step)?;
                set_poll(kwargs, poll)
            },
            |_| Ok(()),
        )
    }

    fn finish(&self) -> Result<()> {
        self.call0("finish")
    }

    fn finished(&self, step: Option<u32>) -> Result<bool> {
        self.call("finished", |kwargs| kwargs.set_item("step", step))
    }
}

impl ShfqaSweeperBacking for PyToolkitObject {
    /// The device is stored in the `device` node of the sweeper.
    fn device(&self) -> Result<String> {
        let serial: Option<String> = self.call("device", |kwargs| kwargs.set_item("parse", false))?;
        Ok(serial.unwrap_or_default())
    }

    fn set_device(&self, serial: &str) -> Result<()> {
        self.with_object(|object| {
            object.call_method1("device", (serial,))?;
            Ok(())
        })
    }

    fn run(&self) -> Result<Value> {
        self.call_with("run", |_| Ok(()), to_json)
    }

    fn get_result(&self) -> Result<Value> {
        self.call_with("get_result", |_| Ok(()), to_json)
    }

    fn plot(&self) -> Result<()> {
        self.call0("plot")
    }

    fn get_offset_freq_vector(&self) -> Result<Vec<f64>> {
        self.call_with("get_offset_freq_vector", |_| Ok(()), |result| {
            let values = result.call_method0("tolist").unwrap_or_else(|_| result.clone());
            values.extract()
        })
    }
}
