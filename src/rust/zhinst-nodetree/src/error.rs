// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Display;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the node tree, and errors passed through unchanged from
/// the backing toolkit objects.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("`{name}` is already registered in `{parent}`")]
    DuplicateName { parent: String, name: String },
    #[error("`{parent}` has no element `{name}`")]
    NotFound { parent: String, name: String },
    #[error("Index {index} is out of range for `{name}` with {len} channels")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },
    #[error("{0}")]
    InvalidState(String),
    /// A wait-for-completion operation did not finish in time.
    #[error("{0}")]
    Timeout(String),
    /// The instrument rejected a command.
    #[error("{0}")]
    Runtime(String),
    #[error("{0}")]
    Toolkit(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}
