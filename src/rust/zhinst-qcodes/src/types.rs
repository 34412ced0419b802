// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Argument and result types of the forwarded operations.
use indexmap::IndexMap;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AveragingMode {
    #[default]
    Cyclic,
    Sequential,
}

impl AveragingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AveragingMode::Cyclic => "cyclic",
            AveragingMode::Sequential => "sequential",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShfqaChannelMode {
    Spectroscopy,
    Readout,
}

impl ShfqaChannelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShfqaChannelMode::Spectroscopy => "spectroscopy",
            ShfqaChannelMode::Readout => "readout",
        }
    }
}

/// Complex waveforms or integration weights keyed by memory slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Waveforms(IndexMap<u32, Vec<Complex64>>);

impl Waveforms {
    pub fn new() -> Self {
        Waveforms(IndexMap::new())
    }

    pub fn insert(&mut self, slot: u32, samples: Vec<Complex64>) -> Option<Vec<Complex64>> {
        self.0.insert(slot, samples)
    }

    pub fn get(&self, slot: u32) -> Option<&[Complex64]> {
        self.0.get(&slot).map(Vec::as_slice)
    }

    pub fn slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Complex64])> {
        self.0.iter().map(|(slot, samples)| (*slot, samples.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(u32, Vec<Complex64>)> for Waveforms {
    fn from_iter<I: IntoIterator<Item = (u32, Vec<Complex64>)>>(iter: I) -> Self {
        Waveforms(iter.into_iter().collect())
    }
}

/// Keyword arguments of the sequencer compiler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    /// Only allowed on HDAWG, must match the device sample clock.
    pub samplerate: Option<f64>,
    pub wavepath: Option<String>,
    /// Waveform CSV files separated by `;`.
    pub waveforms: Option<String>,
    /// Name of the embedded ELF file.
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub elf: Vec<u8>,
    /// Compiler output as reported by the toolkit.
    pub info: Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultLoggerSettings {
    pub result_length: u32,
    /// Rounded to a power of two by the device.
    pub num_averages: u32,
    pub averaging_mode: AveragingMode,
}

impl ResultLoggerSettings {
    pub fn new(result_length: u32) -> Self {
        ResultLoggerSettings {
            result_length,
            num_averages: 1,
            averaging_mode: AveragingMode::default(),
        }
    }

    pub fn with_averages(mut self, num_averages: u32, averaging_mode: AveragingMode) -> Self {
        self.num_averages = num_averages;
        self.averaging_mode = averaging_mode;
        self
    }
}

/// RF input and output configuration of a QA channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    /// dBm
    pub input_range: i32,
    /// dBm
    pub output_range: i32,
    /// Hz
    pub center_frequency: f64,
    pub mode: ShfqaChannelMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeConfig {
    /// Scope channel to signal source, e.g. `channel0_signal_input`.
    pub input_select: IndexMap<u32, String>,
    pub num_samples: u32,
    /// `None` selects the self-triggering mode.
    pub trigger_input: Option<String>,
    pub num_segments: u32,
    pub num_averages: u32,
    /// Delay in samples between the start of the acquisition and the trigger.
    pub trigger_delay: f64,
}

impl ScopeConfig {
    pub fn new(
        input_select: IndexMap<u32, String>,
        num_samples: u32,
        trigger_input: Option<String>,
    ) -> Self {
        ScopeConfig {
            input_select,
            num_samples,
            trigger_input,
            num_segments: 1,
            num_averages: 1,
            trigger_delay: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeRecording {
    /// Per scope channel, `None` for disabled channels.
    pub data: Vec<Option<Vec<Complex64>>>,
    pub range: Vec<f64>,
    pub time: Vec<Option<Vec<f64>>>,
}

/// Reference traces of the qudit states, one trace per state.
#[derive(Debug, Clone, PartialEq)]
pub struct QuditSettings {
    pub ref_traces: Vec<Vec<Complex64>>,
}

/// Result logger data, one vector per integration unit.
pub type ReadoutData = Vec<Vec<Complex64>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZsyncPorts {
    Single(u32),
    Multiple(Vec<u32>),
}

impl Default for ZsyncPorts {
    fn default() -> Self {
        ZsyncPorts::Single(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZsyncStatus {
    Single(bool),
    Multiple(Vec<bool>),
}

impl ZsyncStatus {
    pub fn all_connected(&self) -> bool {
        match self {
            ZsyncStatus::Single(connected) => *connected,
            ZsyncStatus::Multiple(connected) => connected.iter().all(|c| *c),
        }
    }
}
