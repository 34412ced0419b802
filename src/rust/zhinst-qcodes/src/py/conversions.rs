// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use num_complex::Complex64;
use pyo3::intern;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyComplex, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};
use serde_json::{Map, Number, Value};
use zhinst_nodetree::{NodePath, NodeTreeBacking};

use super::to_error;
use crate::Result;
use crate::types::{QuditSettings, ScopeRecording, Waveforms};

/// Hardware path of a toolkit node.
///
/// Devices fall back to their serial, modules (which are no nodes) to the
/// root path.
pub(super) fn node_path_of(object: &Bound<'_, PyAny>) -> NodePath {
    let py = object.py();
    let path = object
        .getattr(intern!(py, "node_info"))
        .and_then(|info| info.getattr(intern!(py, "path")))
        .and_then(|path| path.extract::<String>())
        .or_else(|_| object.getattr(intern!(py, "serial"))?.extract::<String>());
    path.map_or_else(|_| NodePath::root(), NodePath::new)
}

/// Convert a nodetree value to JSON.
///
/// Numpy arrays and scalars are converted through `tolist`, complex numbers
/// become `{"real": .., "imag": ..}` and enums their integer value.
pub(super) fn to_json(value: &Bound<'_, PyAny>) -> PyResult<Value> {
    let py = value.py();
    if value.is_none() {
        return Ok(Value::Null);
    }
    if let Ok(flag) = value.downcast::<PyBool>() {
        return Ok(Value::Bool(flag.is_true()));
    }
    if value.is_instance_of::<PyInt>() {
        return Ok(match value.extract::<i64>() {
            Ok(int) => Value::from(int),
            Err(_) => float_to_json(value.extract::<f64>()?),
        });
    }
    if value.is_instance_of::<PyFloat>() {
        return Ok(float_to_json(value.extract::<f64>()?));
    }
    if let Ok(complex) = value.downcast::<PyComplex>() {
        let mut object = Map::new();
        object.insert("real".to_string(), float_to_json(complex.real()));
        object.insert("imag".to_string(), float_to_json(complex.imag()));
        return Ok(Value::Object(object));
    }
    if let Ok(string) = value.downcast::<PyString>() {
        return Ok(Value::String(string.to_string()));
    }
    if let Ok(dict) = value.downcast::<PyDict>() {
        let mut object = Map::new();
        for (key, item) in dict.iter() {
            object.insert(key.str()?.to_string(), to_json(&item)?);
        }
        return Ok(Value::Object(object));
    }
    if value.is_instance_of::<PyList>() || value.is_instance_of::<PyTuple>() {
        return value
            .try_iter()?
            .map(|item| to_json(&item?))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Array);
    }
    if value.hasattr(intern!(py, "tolist"))? {
        return to_json(&value.call_method0(intern!(py, "tolist"))?);
    }
    Ok(Value::String(value.str()?.to_string()))
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

pub(super) fn to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    Ok(match value {
        Value::Null => py.None().into_bound(py),
        Value::Bool(flag) => PyBool::new(py, *flag).to_owned().into_any(),
        Value::Number(number) => match (number.as_i64(), number.as_u64()) {
            (Some(int), _) => int.into_pyobject(py)?.into_any(),
            (None, Some(uint)) => uint.into_pyobject(py)?.into_any(),
            _ => number.as_f64().unwrap_or(f64::NAN).into_pyobject(py)?.into_any(),
        },
        Value::String(string) => PyString::new(py, string).into_any(),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(to_py(py, item)?)?;
            }
            list.into_any()
        }
        Value::Object(object) => {
            let dict = PyDict::new(py);
            for (key, item) in object {
                dict.set_item(key, to_py(py, item)?)?;
            }
            dict.into_any()
        }
    })
}

/// Numpy arrays are converted through `tolist` before extraction.
fn as_list<'py>(value: &Bound<'py, PyAny>) -> PyResult<Bound<'py, PyAny>> {
    let py = value.py();
    if value.hasattr(intern!(py, "tolist"))? {
        value.call_method0(intern!(py, "tolist"))
    } else {
        Ok(value.clone())
    }
}

pub(super) fn complex_vec(value: &Bound<'_, PyAny>) -> PyResult<Vec<Complex64>> {
    as_list(value)?.extract()
}

pub(super) fn complex_matrix(value: &Bound<'_, PyAny>) -> PyResult<Vec<Vec<Complex64>>> {
    as_list(value)?.extract()
}

pub(super) fn waveforms_to_py<'py>(
    py: Python<'py>,
    waveforms: &Waveforms,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (slot, samples) in waveforms.iter() {
        dict.set_item(slot, samples.to_vec())?;
    }
    Ok(dict)
}

/// Read a toolkit `Waveforms` mapping. Entries stored as tuples contain the
/// complex waveform first.
pub(super) fn waveforms_from_py(value: &Bound<'_, PyAny>) -> PyResult<Waveforms> {
    value
        .try_iter()?
        .map(|slot| {
            let slot = slot?;
            let entry = value.get_item(&slot)?;
            let samples = if entry.is_instance_of::<PyTuple>() {
                entry.get_item(0)?
            } else {
                entry
            };
            Ok((slot.extract::<u32>()?, complex_vec(&samples)?))
        })
        .collect()
}

pub(super) fn qudit_settings_to_py<'py>(
    py: Python<'py>,
    settings: &QuditSettings,
) -> PyResult<Bound<'py, PyAny>> {
    let asarray = py.import("numpy")?.getattr("asarray")?;
    let traces = PyList::empty(py);
    for trace in &settings.ref_traces {
        traces.append(asarray.call1((trace.clone(),))?)?;
    }
    py.import("zhinst.utils.shfqa.multistate")?
        .getattr("QuditSettings")?
        .call1((traces,))
}

/// Recording returned by the scope as `(data, range, time)`.
pub(super) fn scope_recording(value: &Bound<'_, PyAny>) -> PyResult<ScopeRecording> {
    let (data, range, time): (Bound<'_, PyAny>, Bound<'_, PyAny>, Bound<'_, PyAny>) =
        value.extract()?;
    let data = data
        .try_iter()?
        .map(|channel| {
            let channel = channel?;
            if channel.is_none() {
                return Ok(None);
            }
            complex_vec(&channel).map(Some)
        })
        .collect::<PyResult<Vec<_>>>()?;
    let time = time
        .try_iter()?
        .map(|channel| {
            let channel = channel?;
            if channel.is_none() {
                return Ok(None);
            }
            as_list(&channel)?.extract::<Vec<f64>>().map(Some)
        })
        .collect::<PyResult<Vec<_>>>()?;
    Ok(ScopeRecording {
        data,
        range: as_list(&range)?.extract()?,
        time,
    })
}

/// Enum member of `zhinst.toolkit`, e.g. `AveragingMode.CYCLIC`.
pub(super) fn toolkit_enum<'py>(
    py: Python<'py>,
    class: &str,
    member: &str,
) -> PyResult<Bound<'py, PyAny>> {
    py.import("zhinst.toolkit")?
        .getattr(class)?
        .getattr(member.to_uppercase())
}

/// A toolkit `NodeTree`, used for the parameters and snapshots of a driver.
pub struct PyNodeTree(Py<PyAny>);

impl PyNodeTree {
    pub fn new(tree: Py<PyAny>) -> Self {
        PyNodeTree(tree)
    }

    fn with_node<T, F>(&self, path: &NodePath, f: F) -> Result<T>
    where
        F: for<'py> FnOnce(&Bound<'py, PyAny>) -> PyResult<T>,
    {
        Python::with_gil(|py| {
            self.0
                .bind(py)
                .call_method1(intern!(py, "raw_path_to_node"), (path.as_str(),))
                .and_then(|node| f(&node))
                .map_err(|err| to_error(py, err))
        })
    }
}

impl NodeTreeBacking for PyNodeTree {
    fn list_leaves(&self, prefix: &NodePath) -> Result<Vec<NodePath>> {
        Python::with_gil(|py| {
            let mut leaves = vec![];
            let nodes = self.0.bind(py).try_iter().map_err(|err| to_error(py, err))?;
            for entry in nodes {
                let (node, _info) = entry
                    .and_then(|entry| entry.extract::<(Bound<'_, PyAny>, Bound<'_, PyAny>)>())
                    .map_err(|err| to_error(py, err))?;
                let path = node_path_of(&node);
                if path.starts_with(prefix) {
                    leaves.push(path);
                }
            }
            Ok(leaves)
        })
    }

    fn get_value(&self, path: &NodePath) -> Result<Value> {
        self.with_node(path, |node| to_json(&node.call0()?))
    }

    fn set_value(&self, path: &NodePath, value: Value) -> Result<()> {
        self.with_node(path, |node| {
            node.call1((to_py(node.py(), &value)?,))?;
            Ok(())
        })
    }

    /// A partial node returns all values below it at once, keyed by node.
    fn get_values(&self, prefix: &NodePath) -> Result<IndexMap<NodePath, Value>> {
        self.with_node(prefix, |node| {
            let values = node.call0()?;
            let Ok(values) = values.downcast::<PyDict>() else {
                return Ok(IndexMap::from([(prefix.clone(), to_json(&values)?)]));
            };
            values
                .iter()
                .map(|(node, value)| Ok((node_path_of(&node), to_json(&value)?)))
                .collect()
        })
    }
}
