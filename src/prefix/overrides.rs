//! DLL override bookkeeping through Wine's `reg` command.
//!
//! The override table lives inside the prefix's own registry; nothing is
//! cached locally. Every edit is a single `reg` invocation dispatched
//! through the active runner.

use crate::core::WrunnerResult;
use crate::runner::{PrefixDispatch, RunMode};

/// Registry key holding the prefix's DLL overrides.
pub const DLL_OVERRIDES_KEY: &str = r"HKEY_CURRENT_USER\Software\Wine\DllOverrides";

/// Thin, stateless wrapper over `reg add`/`reg delete`.
pub struct RegistryOverrideManager<'a> {
    dispatch: &'a dyn PrefixDispatch,
}

impl<'a> RegistryOverrideManager<'a> {
    pub fn new(dispatch: &'a dyn PrefixDispatch) -> Self {
        Self { dispatch }
    }

    /// Set an override for a DLL base name, overwriting any existing entry.
    pub fn add(&self, dll_name: &str, value: &str) -> WrunnerResult<()> {
        let args = vec![
            "reg".to_string(),
            "add".to_string(),
            DLL_OVERRIDES_KEY.to_string(),
            "/v".to_string(),
            dll_name.to_string(),
            "/t".to_string(),
            "REG_SZ".to_string(),
            "/d".to_string(),
            value.to_string(),
            "/f".to_string(),
        ];

        self.dispatch.dispatch(RunMode::Run, &args)
    }

    /// Remove an override entry, tolerating its absence.
    pub fn delete(&self, dll_name: &str) -> WrunnerResult<()> {
        let args = vec![
            "reg".to_string(),
            "delete".to_string(),
            DLL_OVERRIDES_KEY.to_string(),
            "/v".to_string(),
            dll_name.to_string(),
            "/f".to_string(),
        ];

        self.dispatch.dispatch(RunMode::Run, &args)
    }
}
