//! Wrunner: launch Windows applications inside isolated Wine prefixes and
//! manage the optional binary components (DXVK, DXVK-NVAPI, Gallium Nine)
//! installed into them.

/// Core error and path primitives.
pub mod core;

pub use crate::core::{WrunnerError, WrunnerResult};

/// Explicit execution context and sync-method reconciliation.
pub mod env;

/// Application profiles.
pub mod config;

/// Prefix layout and DLL override bookkeeping.
pub mod prefix;

/// Release discovery, download, and extraction.
pub mod package;

/// Component catalog and installer.
pub mod component;

/// Wine/UMU runners and subprocess plumbing.
pub mod runner;
