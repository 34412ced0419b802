// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::any::Any;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use zhinst_log::debug;

use crate::{BackingList, ChannelList, Error, NodePath, Parameter, Result, SnapshotCache};

/// Context shared by all nodes of one driver tree.
pub struct TreeContext {
    snapshot_cache: Option<Rc<SnapshotCache>>,
    lock_channel_lists: bool,
}

impl TreeContext {
    pub fn new(snapshot_cache: Option<Rc<SnapshotCache>>, lock_channel_lists: bool) -> Self {
        TreeContext {
            snapshot_cache,
            lock_channel_lists,
        }
    }

    pub fn snapshot_cache(&self) -> Option<&Rc<SnapshotCache>> {
        self.snapshot_cache.as_ref()
    }

    /// Whether channel lists are locked once they are fully populated.
    pub fn lock_channel_lists(&self) -> bool {
        self.lock_channel_lists
    }
}

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Anything that can be attached to a [`Node`] as a submodule.
pub trait InstrumentModule: AsAny + 'static {
    fn node(&self) -> &Node;

    /// Element at `index` of an indexable module.
    fn channel(&self, index: usize) -> Result<&dyn InstrumentModule> {
        Err(Error::NotFound {
            parent: self.node().full_name(),
            name: index.to_string(),
        })
    }

    fn snapshot(&self, update: bool) -> Result<Value> {
        self.node().snapshot(update)
    }
}

/// A named, addressable point in a driver tree.
pub struct Node {
    name_parts: Vec<String>,
    zi_node: Option<NodePath>,
    context: Rc<TreeContext>,
    submodules: IndexMap<String, Box<dyn InstrumentModule>>,
    parameters: IndexMap<String, Parameter>,
}

impl Node {
    pub fn root(
        name: impl Into<String>,
        context: Rc<TreeContext>,
        zi_node: Option<NodePath>,
    ) -> Self {
        Node {
            name_parts: vec![name.into()],
            zi_node,
            context,
            submodules: IndexMap::new(),
            parameters: IndexMap::new(),
        }
    }

    /// Create a node below `parent`. The node is not attached to `parent`,
    /// that is done by the caller through [`Node::add_submodule`].
    pub fn new(parent: &Node, name: impl Into<String>, zi_node: Option<NodePath>) -> Self {
        let mut name_parts = parent.name_parts.clone();
        name_parts.push(name.into());
        Node {
            name_parts,
            zi_node,
            context: Rc::clone(&parent.context),
            submodules: IndexMap::new(),
            parameters: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name_parts.last().map_or("", String::as_str)
    }

    pub fn full_name(&self) -> String {
        self.name_parts.join("_")
    }

    pub fn name_parts(&self) -> &[String] {
        &self.name_parts
    }

    pub fn zi_node(&self) -> Option<&NodePath> {
        self.zi_node.as_ref()
    }

    pub fn context(&self) -> &Rc<TreeContext> {
        &self.context
    }

    pub fn snapshot_cache(&self) -> Option<&Rc<SnapshotCache>> {
        self.context.snapshot_cache()
    }

    pub fn add_submodule<M: InstrumentModule>(
        &mut self,
        name: impl Into<String>,
        module: M,
    ) -> Result<()> {
        let name = name.into();
        if self.submodules.contains_key(&name) {
            return Err(Error::DuplicateName {
                parent: self.full_name(),
                name,
            });
        }
        self.submodules.insert(name, Box::new(module));
        Ok(())
    }

    pub fn submodule(&self, name: &str) -> Result<&dyn InstrumentModule> {
        self.submodules
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| Error::NotFound {
                parent: self.full_name(),
                name: name.to_string(),
            })
    }

    /// Typed access to a submodule, `None` if absent or of another kind.
    pub fn submodule_as<T: InstrumentModule>(&self, name: &str) -> Option<&T> {
        self.submodules
            .get(name)
            .and_then(|module| module.as_ref().as_any().downcast_ref::<T>())
    }

    pub fn submodules(&self) -> impl Iterator<Item = (&str, &dyn InstrumentModule)> {
        self.submodules
            .iter()
            .map(|(name, module)| (name.as_str(), module.as_ref()))
    }

    pub fn has_submodule(&self, name: &str) -> bool {
        self.submodules.contains_key(name)
    }

    /// Navigate the tree with a `/` separated path of submodule names and
    /// channel indices, e.g. `qachannels/0/readout`.
    pub fn resolve(&self, path: &str) -> Result<&dyn InstrumentModule> {
        let mut current: &dyn InstrumentModule = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match segment.parse::<usize>() {
                Ok(index) => current.channel(index)?,
                Err(_) => current.node().submodule(segment)?,
            };
        }
        Ok(current)
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<()> {
        if self.parameters.contains_key(parameter.name()) {
            return Err(Error::DuplicateName {
                parent: self.full_name(),
                name: parameter.name().to_string(),
            });
        }
        self.parameters.insert(parameter.name().to_string(), parameter);
        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Result<&Parameter> {
        self.parameters.get(name).ok_or_else(|| Error::NotFound {
            parent: self.full_name(),
            name: name.to_string(),
        })
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    /// Create a parameter for every nodetree leaf below this node.
    ///
    /// Leaves inside the hardware path of a submodule belong to that
    /// submodule and are skipped, as are leaves below one of the
    /// `blacklist` paths (relative to this node). Must run after all
    /// submodules are attached.
    pub fn init_parameters(&mut self, blacklist: &[&str]) -> Result<()> {
        let (Some(cache), Some(zi_node)) = (self.snapshot_cache().cloned(), self.zi_node.clone())
        else {
            return Ok(());
        };
        let blacklist = blacklist.iter().map(|p| zi_node.join(p)).collect::<Vec<_>>();
        let owned = self
            .submodules
            .values()
            .filter_map(|module| module.node().zi_node().cloned())
            .collect::<Vec<_>>();
        let full_name = self.full_name();
        for leaf in cache.tree().list_leaves(&zi_node)? {
            if owned.iter().chain(&blacklist).any(|p| leaf.starts_with(p)) {
                continue;
            }
            let name = match leaf.relative_to(&zi_node) {
                Some(segments) if !segments.is_empty() => segments.join("_"),
                _ => continue,
            };
            self.add_parameter(Parameter::new(&full_name, name, leaf, Rc::clone(&cache)))?;
        }
        Ok(())
    }

    /// JSON snapshot of this node, its parameters and all submodules.
    ///
    /// With `update` the shared snapshot cache is refreshed first, so the
    /// whole tree is read with a single request.
    pub fn snapshot(&self, update: bool) -> Result<Value> {
        if let Some(cache) = self.snapshot_cache().filter(|_| update) {
            cache.update()?;
        }
        let mut parameters = Map::new();
        for parameter in self.parameters.values() {
            parameters.insert(
                parameter.name().to_string(),
                parameter.get_latest()?.unwrap_or(Value::Null),
            );
        }
        let mut submodules = Map::new();
        for (name, module) in &self.submodules {
            submodules.insert(name.clone(), module.snapshot(false)?);
        }
        Ok(json!({
            "name": self.name(),
            "full_name": self.full_name(),
            "zi_node": self.zi_node,
            "parameters": parameters,
            "submodules": submodules,
        }))
    }

    /// Attach a single optional child.
    ///
    /// Nothing is created when the backing object does not provide the
    /// sub-resource.
    pub fn attach_optional<H, T, F>(&mut self, name: &str, handle: Option<H>, make: F) -> Result<()>
    where
        T: InstrumentModule,
        F: FnOnce(&Node, H) -> Result<T>,
    {
        let Some(handle) = handle else {
            debug!("{} provides no `{}`", self.full_name(), name);
            return Ok(());
        };
        let child = make(self, handle)?;
        self.add_submodule(name, child)
    }

    /// Attach a channel list built from a backing collection, one child per
    /// backing element in backing order.
    ///
    /// Nothing is created when the collection is absent or empty.
    pub fn attach_channels<H, T, F>(
        &mut self,
        name: &str,
        backing: Option<BackingList<H>>,
        mut make: F,
    ) -> Result<()>
    where
        T: InstrumentModule,
        F: FnMut(&Node, usize, H) -> Result<T>,
    {
        let Some(backing) = backing.filter(|list| !list.is_empty()) else {
            debug!("{} provides no `{}`", self.full_name(), name);
            return Ok(());
        };
        let (zi_node, handles) = backing.into_parts();
        let mut channels = ChannelList::new(self, name, Some(zi_node));
        for (index, handle) in handles.into_iter().enumerate() {
            channels.append(make(self, index, handle)?)?;
        }
        if self.context.lock_channel_lists() {
            channels.lock();
        }
        self.add_submodule(name, channels)
    }
}

impl InstrumentModule for Node {
    fn node(&self) -> &Node {
        self
    }
}
