// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::NodePath;

/// A collection of sub-resources reported by a backing toolkit object,
/// e.g. all readout channels of a device.
///
/// An empty list is treated the same as an absent one when the tree is built.
#[derive(Debug, Clone)]
pub struct BackingList<H> {
    zi_node: NodePath,
    items: Vec<H>,
}

impl<H> BackingList<H> {
    pub fn new(zi_node: NodePath, items: Vec<H>) -> Self {
        BackingList { zi_node, items }
    }

    pub fn zi_node(&self) -> &NodePath {
        &self.zi_node
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.items.iter()
    }

    pub fn into_parts(self) -> (NodePath, Vec<H>) {
        (self.zi_node, self.items)
    }
}
