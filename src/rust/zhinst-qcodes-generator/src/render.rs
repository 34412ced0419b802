// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Rendering of node drivers from a toolkit class description.
//!
//! For every gathered class a backing trait and a node struct forwarding to
//! it are emitted. The instrument class is built on `ZiBaseInstrument`.
use anyhow::{Context, Result};
use askama::Template;

use crate::description::{
    ClassDescription, FunctionDescription, GatheredClass, ParameterDescription, gather_classes,
};
use crate::naming::{camel_to_snake, identifier, rust_type, type_name};

/// Docstring sections that are not carried over into the doc comments.
const DOC_SECTIONS: &[&str] = &[
    "Args:",
    "Arguments:",
    "Returns:",
    "Raises:",
    "Warning:",
    ".. versionchanged::",
];

#[derive(Template)]
#[template(path = "instrument_class.rs.askama", escape = "none")]
struct InstrumentFile<'a> {
    source: &'a str,
    imports: String,
    classes: Vec<ClassView>,
}

struct ClassView {
    type_name: String,
    is_instrument: bool,
    docs: Vec<String>,
    submodules: Vec<SubmoduleView>,
    functions: Vec<FunctionView>,
}

struct SubmoduleView {
    /// Toolkit attribute name, also the child name in the tree.
    key: String,
    name: String,
    type_name: String,
    is_list: bool,
    /// Name of the list elements without the index, e.g. `qachannel`.
    element_prefix: String,
}

impl SubmoduleView {
    fn accessor_type(&self) -> String {
        if self.is_list {
            format!("ChannelList<{}>", self.type_name)
        } else {
            self.type_name.clone()
        }
    }

    fn backing_type(&self) -> String {
        if self.is_list {
            format!("BackingList<Rc<dyn {}Backing>>", self.type_name)
        } else {
            format!("Rc<dyn {}Backing>", self.type_name)
        }
    }
}

impl ClassView {
    fn backing_supertrait(&self) -> &'static str {
        if self.is_instrument { "DeviceBacking" } else { "Backing" }
    }

    /// Expression for the node of the generated struct.
    fn node_expr(&self) -> &'static str {
        if self.is_instrument { "self.base.node()" } else { "self.node" }
    }

    /// Methods of the backing trait: sub-resource accessors, then operations.
    fn backing_items(&self) -> Vec<String> {
        let submodules = self.submodules.iter().map(|submodule| {
            format!("fn {}(&self) -> Option<{}>;", submodule.name, submodule.backing_type())
        });
        let functions = self.functions.iter().map(|function| {
            format!(
                "fn {}(&self{}) -> Result<{}>;",
                function.name, function.params, function.return_type
            )
        });
        submodules.chain(functions).collect()
    }
}

struct FunctionView {
    name: String,
    docs: Vec<String>,
    /// Rust string literal with the deprecation note.
    deprecated: Option<String>,
    params: String,
    args: String,
    return_type: String,
}

/// File name of the module generated for `class`.
pub fn module_file_name(class: &ClassDescription) -> String {
    format!("{}.rs", camel_to_snake(&class.name))
}

/// Render the module for `class` and all its submodule classes.
///
/// `source` names the description the module was generated from.
pub fn render_instrument_class(class: &ClassDescription, source: &str) -> Result<String> {
    let gathered = gather_classes(class);
    let classes = gathered.iter().map(class_view).collect::<Vec<_>>();
    let file = InstrumentFile {
        source,
        imports: imports(&classes),
        classes,
    };
    file.render()
        .with_context(|| format!("Failed to render the driver of `{}`", class.name))
}

fn imports(classes: &[ClassView]) -> String {
    let has_instrument = classes.iter().any(|class| class.is_instrument);
    let has_nodes = classes.iter().any(|class| !class.is_instrument);
    let has_lists = classes
        .iter()
        .flat_map(|class| class.submodules.iter())
        .any(|submodule| submodule.is_list);

    let mut nodetree = vec![];
    if has_lists {
        nodetree.extend(["BackingList", "ChannelList"]);
    }
    nodetree.extend(["InstrumentModule", "Node"]);
    let mut backing = vec![];
    if has_nodes {
        backing.push("Backing");
    }
    if has_instrument {
        backing.push("DeviceBacking");
    }
    let mut krate = vec![];
    if has_instrument {
        krate.extend(["DriverSettings", "Instrument"]);
    }
    krate.push("Result");
    if has_instrument {
        krate.push("ZiBaseInstrument");
    }

    let mut imports = vec![
        "std::rc::Rc".to_string(),
        format!("zhinst_nodetree::{{{}}}", nodetree.join(", ")),
    ];
    if !backing.is_empty() {
        imports.push(format!("zhinst_qcodes::backing::{{{}}}", backing.join(", ")));
    }
    imports.push(format!("zhinst_qcodes::{{{}}}", krate.join(", ")));
    imports
        .iter()
        .map(|import| format!("use {import};"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn class_view(gathered: &GatheredClass<'_>) -> ClassView {
    let class = gathered.description;
    let submodules = class
        .submodules
        .iter()
        .map(|submodule| SubmoduleView {
            key: submodule.name.clone(),
            name: identifier(&submodule.name),
            type_name: type_name(&submodule.class.name),
            is_list: submodule.is_list,
            element_prefix: submodule.class.name.to_lowercase(),
        })
        .collect::<Vec<_>>();
    let functions = class
        .parameters
        .iter()
        .filter(|parameter| !parameter.is_node)
        .map(property_view)
        .chain(
            class
                .functions
                .iter()
                .filter(|function| !function.name.starts_with('_'))
                .map(function_view),
        )
        .filter(|function| !submodules.iter().any(|submodule| submodule.name == function.name))
        .collect();
    ClassView {
        type_name: type_name(&class.name),
        is_instrument: gathered.is_instrument_class,
        docs: doc_lines(class.docstring.as_deref()),
        submodules,
        functions,
    }
}

fn property_view(parameter: &ParameterDescription) -> FunctionView {
    FunctionView {
        name: identifier(&parameter.name),
        docs: doc_lines(parameter.docstring.as_deref()),
        deprecated: None,
        params: String::new(),
        args: String::new(),
        return_type: rust_type(parameter.return_annotation.as_deref(), false),
    }
}

fn function_view(function: &FunctionDescription) -> FunctionView {
    let arguments = function
        .arguments
        .iter()
        .filter(|argument| argument.name != "self" && !argument.name.starts_with('*'))
        .collect::<Vec<_>>();
    let params = arguments
        .iter()
        .map(|argument| {
            format!(
                ", {}: {}",
                identifier(&argument.name),
                rust_type(argument.annotation.as_deref(), true)
            )
        })
        .collect::<String>();
    let args = arguments
        .iter()
        .map(|argument| identifier(&argument.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut docs = doc_lines(function.docstring.as_deref());
    let defaults = arguments
        .iter()
        .filter_map(|argument| {
            let default = argument.default.as_deref()?;
            Some(format!("`{} = {}`", argument.name, default))
        })
        .collect::<Vec<_>>();
    if !defaults.is_empty() {
        if !docs.is_empty() {
            docs.push(String::new());
        }
        docs.push(format!("Toolkit defaults: {}.", defaults.join(", ")));
    }

    FunctionView {
        name: identifier(&function.name),
        docs,
        deprecated: function.deprecated.as_ref().map(|note| format!("{note:?}")),
        params,
        args,
        return_type: rust_type(function.return_annotation.as_deref(), false),
    }
}

/// Summary paragraphs of a docstring, without the common indentation and
/// without the argument sections.
fn doc_lines(docstring: Option<&str>) -> Vec<String> {
    let Some(docstring) = docstring else {
        return vec![];
    };
    let mut lines = vec![];
    for line in docstring.lines() {
        let line = line.trim();
        if DOC_SECTIONS.iter().any(|section| line.starts_with(section)) {
            break;
        }
        if line.is_empty() && lines.last().is_none_or(String::is_empty) {
            continue;
        }
        lines.push(line.to_string());
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}
