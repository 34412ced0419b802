// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::slice;

use serde_json::Value;

use crate::{Error, InstrumentModule, Node, NodePath, Result};

/// Ordered list of sibling nodes of one kind, indexed like the hardware
/// channels they mirror.
pub struct ChannelList<T> {
    node: Node,
    channels: Vec<T>,
    locked: bool,
}

impl<T: InstrumentModule> ChannelList<T> {
    pub fn new(parent: &Node, name: impl Into<String>, zi_node: Option<NodePath>) -> Self {
        ChannelList {
            node: Node::new(parent, name, zi_node),
            channels: Vec::new(),
            locked: false,
        }
    }

    /// Add `channel` at the next index.
    pub fn append(&mut self, channel: T) -> Result<()> {
        if self.locked {
            return Err(Error::InvalidState(format!(
                "Cannot append to locked channel list `{}`",
                self.node.full_name()
            )));
        }
        self.channels.push(channel);
        Ok(())
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        self.channels
            .get(index)
            .ok_or_else(|| Error::IndexOutOfRange {
                name: self.node.full_name(),
                index,
                len: self.channels.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.channels.iter()
    }
}

impl<T: InstrumentModule> InstrumentModule for ChannelList<T> {
    fn node(&self) -> &Node {
        &self.node
    }

    fn channel(&self, index: usize) -> Result<&dyn InstrumentModule> {
        Ok(self.get(index)?)
    }

    fn snapshot(&self, update: bool) -> Result<Value> {
        let mut snapshot = self.node.snapshot(update)?;
        let channels = self
            .channels
            .iter()
            .map(|channel| channel.snapshot(false))
            .collect::<Result<Vec<_>>>()?;
        snapshot["channels"] = Value::Array(channels);
        Ok(snapshot)
    }
}

impl<'a, T> IntoIterator for &'a ChannelList<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::TreeContext;

    fn list_with(count: usize) -> (Node, ChannelList<Node>) {
        let root = Node::root("root", Rc::new(TreeContext::new(None, false)), None);
        let zi_node = NodePath::new("/dev1/qachannels/0/readout/multistate/qudits");
        let mut list = ChannelList::new(&root, "qudits", Some(zi_node));
        for index in 0..count {
            list.append(Node::new(&root, format!("qudit_{index}"), None)).unwrap();
        }
        (root, list)
    }

    #[test]
    fn test_append_grows_by_one_at_next_index() {
        let (root, mut list) = list_with(2);
        assert_eq!(list.len(), 2);
        list.append(Node::new(&root, "qudit_2", None)).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(2).unwrap().name(), "qudit_2");
    }

    #[test]
    fn test_locked_list_rejects_append() {
        let (root, mut list) = list_with(1);
        list.lock();
        list.lock();
        assert!(list.is_locked());
        let err = list.append(Node::new(&root, "qudit_1", None)).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_index_out_of_range() {
        let (_, list) = list_with(2);
        let Err(err) = list.get(2) else {
            panic!("index 2 of 2 channels resolved");
        };
        assert!(matches!(err, Error::IndexOutOfRange { index: 2, len: 2, .. }));
        assert!(matches!(list.channel(5), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_iteration_is_restartable_and_ordered() {
        let (_, list) = list_with(3);
        let first = list.iter().map(Node::name).collect::<Vec<_>>();
        let second = (&list).into_iter().map(Node::name).collect::<Vec<_>>();
        assert_eq!(first, vec!["qudit_0", "qudit_1", "qudit_2"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_snapshot_lists_channels() {
        let (_, list) = list_with(2);
        let snapshot = InstrumentModule::snapshot(&list, false).unwrap();
        assert_eq!(snapshot["full_name"], json!("root_qudits"));
        assert_eq!(snapshot["channels"][1]["full_name"], json!("root_qudit_1"));
    }
}
