// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Backing of the drivers by `zhinst.toolkit` Python objects.
//!
//! Every call acquires the GIL, forwards the arguments as keyword arguments
//! and converts the result. Python exceptions are translated into the
//! matching [`Error`] class without further interpretation.
mod backing;
mod conversions;

use std::rc::Rc;

use pyo3::exceptions::{PyRuntimeError, PyTimeoutError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use zhinst_log::debug;
use zhinst_nodetree::{BackingList, NodePath};

use crate::{Error, Result};

pub use conversions::PyNodeTree;

/// Whether `err` is a `zhinst.toolkit` `ToolkitError`. False if the toolkit
/// cannot be imported.
fn is_toolkit_error(py: Python<'_>, err: &PyErr) -> bool {
    match py
        .import("zhinst.toolkit.exceptions")
        .and_then(|module| module.getattr("ToolkitError"))
    {
        Ok(class) => err.value(py).is_instance(&class).unwrap_or(false),
        Err(lookup) => {
            debug!("ToolkitError is not available: {}", lookup);
            false
        }
    }
}

/// Translate a Python exception into the driver error of the same class.
pub(crate) fn to_error(py: Python<'_>, err: PyErr) -> Error {
    let message = err.value(py).to_string();
    // `ToolkitError` derives from `RuntimeError`.
    if is_toolkit_error(py, &err) {
        Error::Toolkit(message)
    } else if err.is_instance_of::<PyTimeoutError>(py) {
        Error::Timeout(message)
    } else if err.is_instance_of::<PyRuntimeError>(py) {
        Error::Runtime(message)
    } else {
        Error::Anyhow(err.into())
    }
}

/// A `zhinst.toolkit` node, device or module.
pub struct PyToolkitObject(Py<PyAny>);

impl PyToolkitObject {
    pub fn new(object: Py<PyAny>) -> Self {
        PyToolkitObject(object)
    }

    pub fn object(&self) -> &Py<PyAny> {
        &self.0
    }

    /// Run `f` with the bound object and translate its error.
    fn with_object<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'py> FnOnce(&Bound<'py, PyAny>) -> PyResult<T>,
    {
        Python::with_gil(|py| f(self.0.bind(py)).map_err(|err| to_error(py, err)))
    }

    /// Call `method` with keyword arguments and convert the result.
    fn call_with<T, A, C>(&self, method: &str, kwargs: A, convert: C) -> Result<T>
    where
        A: for<'py> FnOnce(&Bound<'py, PyDict>) -> PyResult<()>,
        C: for<'py> FnOnce(&Bound<'py, PyAny>) -> PyResult<T>,
    {
        self.with_object(|object| {
            let args = PyDict::new(object.py());
            kwargs(&args)?;
            convert(&object.call_method(method, (), Some(&args))?)
        })
    }

    fn call<T, A>(&self, method: &str, kwargs: A) -> Result<T>
    where
        T: for<'py> FromPyObject<'py>,
        A: for<'py> FnOnce(&Bound<'py, PyDict>) -> PyResult<()>,
    {
        self.call_with(method, kwargs, |result| result.extract())
    }

    fn call0(&self, method: &str) -> Result<()> {
        self.call_with(method, |_| Ok(()), |_| Ok(()))
    }

    fn attribute<T>(&self, name: &str) -> Result<T>
    where
        T: for<'py> FromPyObject<'py>,
    {
        self.with_object(|object| object.getattr(name)?.extract())
    }

    /// Single optional sub-resource. Missing attributes and falsy values,
    /// e.g. `None` or an empty `NodeList`, count as absent.
    fn child(&self, name: &str) -> Option<PyToolkitObject> {
        Python::with_gil(|py| {
            let child = self
                .0
                .bind(py)
                .getattr(name)
                .and_then(|child| Ok((child.is_truthy()?, child)));
            match child {
                Ok((true, child)) => Some(PyToolkitObject(child.unbind())),
                Ok((false, _)) => None,
                Err(err) => {
                    debug!("{} has no `{}`: {}", self.path(), name, err);
                    None
                }
            }
        })
    }

    /// Optional collection of sub-resources, e.g. a toolkit `NodeList`.
    fn children<H>(&self, name: &str, wrap: fn(PyToolkitObject) -> H) -> Option<BackingList<H>> {
        let list = self.child(name)?;
        let items = list.with_object(|object| {
            object
                .try_iter()?
                .map(|item| Ok(wrap(PyToolkitObject(item?.unbind()))))
                .collect::<PyResult<Vec<_>>>()
        });
        match items {
            Ok(items) => Some(BackingList::new(list.path(), items)),
            Err(err) => {
                debug!("{} could not list `{}`: {}", self.path(), name, err);
                None
            }
        }
    }

    fn path(&self) -> NodePath {
        Python::with_gil(|py| conversions::node_path_of(self.0.bind(py)))
    }

    fn tree(&self) -> Option<Rc<PyNodeTree>> {
        Python::with_gil(|py| match self.0.bind(py).getattr("root") {
            Ok(root) if !root.is_none() => Some(Rc::new(PyNodeTree::new(root.unbind()))),
            _ => None,
        })
    }
}

/// Forward the `log` records of the drivers to Python `logging`.
///
/// `log_level` is the level of the Python logger; levels at or below the
/// diagnostics level (15) enable the diagnostic messages.
pub fn init_logging(log_level: i64) -> Result<()> {
    const DIAGNOSTICS_LEVEL: i64 = 15;
    pyo3_log::try_init()
        .map_err(|e| Error::new(format!("Failed to install the Python logger: {e}")))?;
    zhinst_log::init_logging(log_level <= DIAGNOSTICS_LEVEL);
    Ok(())
}
