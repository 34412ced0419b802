// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;
use serde_json::Value;

use crate::{Error, NodePath, NodeTreeBacking, Result};

/// In-memory nodetree for tests.
pub(crate) struct FakeNodeTree {
    values: RefCell<IndexMap<NodePath, Value>>,
    bulk_requests: Cell<usize>,
}

impl FakeNodeTree {
    pub(crate) fn new(values: &[(&str, Value)]) -> Self {
        FakeNodeTree {
            values: RefCell::new(
                values
                    .iter()
                    .map(|(path, value)| (NodePath::new(path), value.clone()))
                    .collect(),
            ),
            bulk_requests: Cell::new(0),
        }
    }

    pub(crate) fn bulk_requests(&self) -> usize {
        self.bulk_requests.get()
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
            .ok_or_else(|| Error::NotFound {
                parent: "nodetree".to_string(),
                name: path.to_string(),
            })
    }

    fn set_value(&self, path: &NodePath, value: Value) -> Result<()> {
        match self.values.borrow_mut().get_mut(path) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::NotFound {
                parent: "nodetree".to_string(),
                name: path.to_string(),
            }),
        }
    }

    fn get_values(&self, prefix: &NodePath) -> Result<IndexMap<NodePath, Value>> {
        self.bulk_requests.set(self.bulk_requests.get() + 1);
        Ok(self
            .values
            .borrow()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, value)| (path.clone(), value.clone()))
            .collect())
    }
}
