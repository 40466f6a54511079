//! Bitness detection by probing a candidate binary against the prefix.
//!
//! There is no pure way to ask a prefix whether it is 64-bit capable; the
//! only reliable signal is whether a diagnostic command run through the
//! candidate binary succeeds. The probe lives behind a trait so installers
//! can be exercised with a fixed outcome in tests.

use crate::env::EnvContext;
use crate::runner::process::run_status_checked;

/// Decides whether a candidate command pairing can operate against the
/// existing prefix in 64-bit mode.
pub trait BitnessProbe {
    /// Run the diagnostic command, discarding all output.
    ///
    /// Returns true iff it exited with status zero. A binary that cannot be
    /// spawned is a negative result, never an error.
    fn probe(&self, command: &[String], env: &EnvContext) -> bool;
}

/// Production probe: run the candidate's `winepath` diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct WinepathProbe;

impl BitnessProbe for WinepathProbe {
    fn probe(&self, command: &[String], env: &EnvContext) -> bool {
        run_status_checked(command, env) == 0
    }
}

/// Test probe with a predetermined outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub bool);

impl BitnessProbe for FixedProbe {
    fn probe(&self, _command: &[String], _env: &EnvContext) -> bool {
        self.0
    }
}
