// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::{NodePath, Result};

/// Access to the leaves of the hardware nodetree behind a driver.
///
/// Implemented by the toolkit backing of a device or module. Values are
/// exchanged as JSON so that numeric, string and vector nodes share one
/// representation.
pub trait NodeTreeBacking {
    /// All leaf nodes below `prefix`, in nodetree order.
    fn list_leaves(&self, prefix: &NodePath) -> Result<Vec<NodePath>>;

    fn get_value(&self, path: &NodePath) -> Result<Value>;

    fn set_value(&self, path: &NodePath, value: Value) -> Result<()>;

    /// Values of all leaves below `prefix`, fetched in a single request.
    fn get_values(&self, prefix: &NodePath) -> Result<IndexMap<NodePath, Value>>;
}

/// Snapshot values of one driver, shared by every node of its tree.
///
/// The cache is filled with one bulk request the first time a value is
/// requested, and refreshed on [`SnapshotCache::update`].
pub struct SnapshotCache {
    tree: Rc<dyn NodeTreeBacking>,
    root: NodePath,
    values: RefCell<Option<IndexMap<NodePath, Value>>>,
}

impl SnapshotCache {
    pub fn new(tree: Rc<dyn NodeTreeBacking>, root: NodePath) -> Self {
        SnapshotCache {
            tree,
            root,
            values: RefCell::new(None),
        }
    }

    pub fn tree(&self) -> &dyn NodeTreeBacking {
        self.tree.as_ref()
    }

    pub fn root(&self) -> &NodePath {
        &self.root
    }

    pub fn is_populated(&self) -> bool {
        self.values.borrow().is_some()
    }

    pub fn update(&self) -> Result<()> {
        let values = self.tree.get_values(&self.root)?;
        *self.values.borrow_mut() = Some(values);
        Ok(())
    }

    pub fn invalidate(&self) {
        self.values.borrow_mut().take();
    }

    /// Cached value of `path`, populating the cache if it is empty.
    pub fn get(&self, path: &NodePath) -> Result<Option<Value>> {
        if !self.is_populated() {
            self.update()?;
        }
        Ok(self
            .values
            .borrow()
            .as_ref()
            .and_then(|values| values.get(path).cloned()))
    }

    /// Record a value that was just written to the device.
    pub(crate) fn store(&self, path: &NodePath, value: Value) {
        if let Some(values) = self.values.borrow_mut().as_mut() {
            values.insert(path.clone(), value);
        }
    }
}
