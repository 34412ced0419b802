// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::rc::Rc;

use serde_json::{Value, json};

use crate::{NodePath, Result, SnapshotCache};

/// A leaf of the hardware nodetree exposed on a [`crate::Node`].
pub struct Parameter {
    name: String,
    full_name: String,
    zi_node: NodePath,
    cache: Rc<SnapshotCache>,
}

impl Parameter {
    pub fn new(
        owner_full_name: &str,
        name: impl Into<String>,
        zi_node: NodePath,
        cache: Rc<SnapshotCache>,
    ) -> Self {
        let name = name.into();
        Parameter {
            full_name: format!("{owner_full_name}_{name}"),
            name,
            zi_node,
            cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn zi_node(&self) -> &NodePath {
        &self.zi_node
    }

    /// Read the current value from the device.
    pub fn get(&self) -> Result<Value> {
        self.cache.tree().get_value(&self.zi_node)
    }

    pub fn set(&self, value: Value) -> Result<()> {
        self.cache.tree().set_value(&self.zi_node, value.clone())?;
        self.cache.store(&self.zi_node, value);
        Ok(())
    }

    /// Last known value, served from the snapshot cache.
    pub fn get_latest(&self) -> Result<Option<Value>> {
        self.cache.get(&self.zi_node)
    }

    pub fn snapshot(&self) -> Result<Value> {
        Ok(json!({
            "name": self.name,
            "full_name": self.full_name,
            "zi_node": self.zi_node,
            "value": self.get_latest()?,
        }))
    }
}
