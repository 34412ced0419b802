// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! JSON description of a toolkit class, as exported from `zhinst.toolkit`.
use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ClassDescription {
    pub name: String,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub functions: Vec<FunctionDescription>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescription>,
    #[serde(default)]
    pub submodules: Vec<SubmoduleDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDescription {
    pub name: String,
    #[serde(default)]
    pub docstring: Option<String>,
    /// Deprecation message, present for deprecated functions.
    #[serde(default)]
    pub deprecated: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentDescription>,
    #[serde(default)]
    pub return_annotation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArgumentDescription {
    pub name: String,
    #[serde(default)]
    pub annotation: Option<String>,
    /// Python representation of the default value.
    #[serde(default)]
    pub default: Option<String>,
}

/// A property of the toolkit class.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDescription {
    pub name: String,
    /// Node properties are exposed through the nodetree parameters.
    #[serde(default)]
    pub is_node: bool,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub return_annotation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmoduleDescription {
    pub name: String,
    #[serde(default)]
    pub is_list: bool,
    pub class: ClassDescription,
}

impl ClassDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid toolkit class description")
    }
}

/// A class to generate, together with how it is used in the tree.
#[derive(Debug, Clone, Copy)]
pub struct GatheredClass<'a> {
    pub description: &'a ClassDescription,
    pub is_instrument_class: bool,
    /// The class is instantiated as element of a channel list.
    pub is_list: bool,
}

/// All classes needed for `root`, submodule classes before the classes
/// using them. A class used in several places is emitted once.
pub fn gather_classes(root: &ClassDescription) -> Vec<GatheredClass<'_>> {
    fn visit<'a>(
        class: &'a ClassDescription,
        is_instrument_class: bool,
        is_list: bool,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<GatheredClass<'a>>,
    ) {
        for submodule in &class.submodules {
            visit(&submodule.class, false, submodule.is_list, seen, out);
        }
        if seen.insert(class.name.as_str()) {
            out.push(GatheredClass {
                description: class,
                is_instrument_class,
                is_list,
            });
        }
    }
    let mut seen = HashSet::new();
    let mut out = vec![];
    visit(root, true, false, &mut seen, &mut out);
    out
}
