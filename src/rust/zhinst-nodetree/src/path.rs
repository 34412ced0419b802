// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::Serialize;

/// Path of a node in the hardware nodetree, e.g. `/dev12000/qachannels/0`.
///
/// Paths are stored lowercase, with a single leading slash and without
/// empty segments, so that paths reported by different toolkit calls compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let segments = path
            .as_ref()
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>();
        NodePath(format!("/{}", segments.join("/")))
    }

    pub fn root() -> Self {
        NodePath("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    pub fn join(&self, relative: impl AsRef<str>) -> Self {
        NodePath::new(format!("{}/{}", self.0, relative.as_ref()))
    }

    /// Segment-wise prefix test, `/dev1/qachannels/1` does not start with
    /// `/dev1/qachannels/10`.
    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        let mut own = self.segments();
        prefix
            .segments()
            .all(|segment| own.next().is_some_and(|s| s == segment))
    }

    /// Segments of `self` below `base`, or `None` if `self` is not inside `base`.
    pub fn relative_to(&self, base: &NodePath) -> Option<Vec<&str>> {
        if !self.starts_with(base) {
            return None;
        }
        Some(self.segments().skip(base.segments().count()).collect())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodePath {
    fn from(value: &str) -> Self {
        NodePath::new(value)
    }
}

impl From<String> for NodePath {
    fn from(value: String) -> Self {
        NodePath::new(value)
    }
}
