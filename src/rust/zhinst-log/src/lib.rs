// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::sync::{atomic::AtomicBool, atomic::Ordering};

#[doc(hidden)]
pub use log as _log;

#[macro_export]
macro_rules! info {
    ($msg:literal, $($arg:tt)+) => {
        zhinst_log::_log::info!(
            target: concat!("zhinst.qcodes.rust::", module_path!()),
            $msg,
            $($arg)+
        );
    };
    ($msg:literal) => {
        zhinst_log::_log::info!(target: concat!("zhinst.qcodes.rust::", module_path!()), $msg);
    };
}

#[macro_export]
macro_rules! warn {
    ($msg:literal, $($arg:tt)+) => {
        zhinst_log::_log::warn!(
            target: concat!("zhinst.qcodes.rust::", module_path!()),
            $msg,
            $($arg)+
        );
    };
    ($msg:literal) => {
        zhinst_log::_log::warn!(target: concat!("zhinst.qcodes.rust::", module_path!()), $msg);
    };
}

#[macro_export]
macro_rules! debug {
    ($msg:literal, $($arg:tt)+) => {
        zhinst_log::_log::debug!(
            target: concat!("zhinst.qcodes.rust::", module_path!()),
            $msg,
            $($arg)+
        );
    };
    ($msg:literal) => {
        zhinst_log::_log::debug!(target: concat!("zhinst.qcodes.rust::", module_path!()), $msg);
    };
}

/// Log a diagnostic message at info level if diagnostics logging is enabled.
#[macro_export]
macro_rules! diagnostic {
    ($msg:literal, $($arg:tt)+) => {
        if zhinst_log::is_diagnostics_enabled() {
            zhinst_log::_log::info!(
                target: concat!("zhinst.qcodes.rust::", module_path!()),
                $msg,
                $($arg)+
            );
        }
    };
    ($msg:literal) => {
        if zhinst_log::is_diagnostics_enabled() {
            zhinst_log::_log::info!(target: concat!("zhinst.qcodes.rust::", module_path!()), $msg);
        }
    };
}

static DIAGNOSTICS_ENABLED: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS_ENABLED.load(Ordering::Acquire)
}

/// Initialize the logging.
///
/// Only the diagnostics switch is owned here. The concrete logger is whatever
/// the host installs, e.g. `pyo3-log` when the drivers run inside Python.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS_ENABLED.store(with_diagnostics, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_switch() {
        init_logging(true);
        assert!(is_diagnostics_enabled());
        init_logging(false);
        assert!(!is_diagnostics_enabled());
    }
}
