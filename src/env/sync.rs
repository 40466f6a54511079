//! Synchronization-method reconciliation.
//!
//! Wine and Proton read four overlapping environment variables to decide
//! between the esync and fsync synchronization primitives. Users routinely
//! set a contradictory subset, so before any subprocess is spawned the
//! context is rewritten into a consistent quadruple. esync and fsync are
//! mutually exclusive; whenever esync ends up enabled, fsync is forced off
//! and vice versa.

use crate::env::EnvContext;

const WINEESYNC: &str = "WINEESYNC";
const PROTON_NO_ESYNC: &str = "PROTON_NO_ESYNC";
const WINEFSYNC: &str = "WINEFSYNC";
const PROTON_NO_FSYNC: &str = "PROTON_NO_FSYNC";

/// Fixed processing order. When several sync variables are present, the last
/// one in this list wins.
const SYNC_VARS: [&str; 4] = [WINEESYNC, PROTON_NO_ESYNC, WINEFSYNC, PROTON_NO_FSYNC];

/// Parse a sync flag string to 0 or 1.
///
/// Any non-zero numeric value counts as set. Non-numeric values fall back to
/// 0, except for the negated-polarity `PROTON_NO_*` variables where an
/// unparsable value means the underlying feature stays off.
fn parse_flag(key: &str, value: &str) -> u8 {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return u8::from(value != "0" && value.trim_start_matches('0') != "");
    }

    u8::from(key == PROTON_NO_ESYNC || key == PROTON_NO_FSYNC)
}

fn negate(value: u8) -> u8 {
    u8::from(value == 0)
}

fn commit(env: &mut EnvContext, key: &str, value: u8) {
    env.set(key, value.to_string());
}

/// Rewrite the context's esync/fsync variables into a consistent quadruple.
///
/// With none of the four variables present, fsync is enabled and esync
/// disabled. Otherwise each present variable is processed in [`SYNC_VARS`]
/// order and the other three are derived from it. The operation is
/// idempotent: re-running it on its own output changes nothing.
pub fn reconcile_sync_method(env: &mut EnvContext) {
    let present: Vec<(&str, String)> = SYNC_VARS
        .iter()
        .filter_map(|key| env.get(key).map(|value| (*key, value.to_string())))
        .collect();

    if present.is_empty() {
        commit(env, WINEFSYNC, 1);
        commit(env, PROTON_NO_FSYNC, 0);
        commit(env, WINEESYNC, 0);
        commit(env, PROTON_NO_ESYNC, 1);

        return;
    }

    for (key, raw) in present {
        let value = parse_flag(key, &raw);

        match key {
            WINEESYNC | PROTON_NO_ESYNC => {
                let esync = if key == WINEESYNC { value } else { negate(value) };
                commit(env, WINEESYNC, esync);
                commit(env, PROTON_NO_ESYNC, negate(esync));

                // esync wins over fsync whenever it is enabled.
                let fsync = if esync == 0 {
                    env.get(WINEFSYNC)
                        .map(|v| parse_flag(WINEFSYNC, v))
                        .unwrap_or(0)
                } else {
                    0
                };
                commit(env, WINEFSYNC, fsync);
                commit(env, PROTON_NO_FSYNC, negate(fsync));
            }
            _ => {
                let fsync = if key == WINEFSYNC { value } else { negate(value) };
                commit(env, WINEFSYNC, fsync);
                commit(env, PROTON_NO_FSYNC, negate(fsync));

                let esync = if fsync == 0 {
                    env.get(WINEESYNC)
                        .map(|v| parse_flag(WINEESYNC, v))
                        .unwrap_or(0)
                } else {
                    0
                };
                commit(env, WINEESYNC, esync);
                commit(env, PROTON_NO_ESYNC, negate(esync));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadruple(env: &EnvContext) -> (u8, u8, u8, u8) {
        let get = |key: &str| env.get(key).unwrap().parse::<u8>().unwrap();
        (
            get(WINEESYNC),
            get(PROTON_NO_ESYNC),
            get(WINEFSYNC),
            get(PROTON_NO_FSYNC),
        )
    }

    fn assert_consistent(env: &EnvContext) {
        let (esync, no_esync, fsync, no_fsync) = quadruple(env);
        assert_eq!(esync, 1 - no_esync);
        assert_eq!(fsync, 1 - no_fsync);
        if esync == 1 {
            assert_eq!(fsync, 0, "esync and fsync are mutually exclusive");
        }
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let mut env = EnvContext::new();
        reconcile_sync_method(&mut env);
        assert_eq!(quadruple(&env), (0, 1, 1, 0));
    }

    #[test]
    fn test_single_variable_all_cases_consistent() {
        for key in SYNC_VARS {
            for value in ["0", "1"] {
                let mut env = EnvContext::new();
                env.set(key, value);
                reconcile_sync_method(&mut env);
                assert_consistent(&env);
            }
        }
    }

    #[test]
    fn test_esync_enabled_forces_fsync_off() {
        let mut env = EnvContext::new();
        env.set(WINEESYNC, "1");
        env.set(WINEFSYNC, "1");
        // WINEFSYNC is processed after WINEESYNC and wins; the pair stays
        // mutually exclusive either way.
        reconcile_sync_method(&mut env);
        assert_consistent(&env);
        assert_eq!(quadruple(&env), (0, 1, 1, 0));
    }

    #[test]
    fn test_wineesync_alone_enabled() {
        let mut env = EnvContext::new();
        env.set(WINEESYNC, "1");
        reconcile_sync_method(&mut env);
        assert_eq!(quadruple(&env), (1, 0, 0, 1));
    }

    #[test]
    fn test_proton_no_esync_zero_enables_esync() {
        let mut env = EnvContext::new();
        env.set(PROTON_NO_ESYNC, "0");
        reconcile_sync_method(&mut env);
        assert_eq!(quadruple(&env), (1, 0, 0, 1));
    }

    #[test]
    fn test_proton_no_fsync_set_disables_fsync() {
        let mut env = EnvContext::new();
        env.set(PROTON_NO_FSYNC, "1");
        reconcile_sync_method(&mut env);
        assert_eq!(quadruple(&env), (0, 1, 0, 1));
    }

    #[test]
    fn test_winefsync_enabled_forces_esync_off() {
        let mut env = EnvContext::new();
        env.set(WINEESYNC, "1");
        env.set(WINEFSYNC, "1");
        reconcile_sync_method(&mut env);
        let (esync, _, fsync, _) = quadruple(&env);
        assert_eq!(fsync, 1);
        assert_eq!(esync, 0);
    }

    #[test]
    fn test_non_numeric_enable_flag_means_disabled() {
        let mut env = EnvContext::new();
        env.set(WINEESYNC, "yes");
        reconcile_sync_method(&mut env);
        let (esync, no_esync, _, _) = quadruple(&env);
        assert_eq!(esync, 0);
        assert_eq!(no_esync, 1);
    }

    #[test]
    fn test_non_numeric_negated_flag_means_feature_off() {
        let mut env = EnvContext::new();
        env.set(PROTON_NO_FSYNC, "true");
        reconcile_sync_method(&mut env);
        let (_, _, fsync, no_fsync) = quadruple(&env);
        assert_eq!(fsync, 0);
        assert_eq!(no_fsync, 1);
    }

    #[test]
    fn test_non_zero_numeric_counts_as_enabled() {
        let mut env = EnvContext::new();
        env.set(WINEFSYNC, "2");
        reconcile_sync_method(&mut env);
        let (_, _, fsync, no_fsync) = quadruple(&env);
        assert_eq!(fsync, 1);
        assert_eq!(no_fsync, 0);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        for key in SYNC_VARS {
            for value in ["0", "1", "garbage"] {
                let mut env = EnvContext::new();
                env.set(key, value);
                reconcile_sync_method(&mut env);
                let first = quadruple(&env);
                reconcile_sync_method(&mut env);
                assert_eq!(first, quadruple(&env), "{}={} not idempotent", key, value);
            }
        }
    }

    #[test]
    fn test_idempotent_on_defaults() {
        let mut env = EnvContext::new();
        reconcile_sync_method(&mut env);
        let first = quadruple(&env);
        reconcile_sync_method(&mut env);
        assert_eq!(first, quadruple(&env));
    }

    #[test]
    fn test_unrelated_variables_untouched() {
        let mut env = EnvContext::new();
        env.set("WINEPREFIX", "/tmp/pfx");
        env.set(WINEESYNC, "1");
        reconcile_sync_method(&mut env);
        assert_eq!(env.get("WINEPREFIX"), Some("/tmp/pfx"));
    }

    #[test]
    fn test_parse_flag_leading_zeros() {
        assert_eq!(parse_flag(WINEESYNC, "00"), 0);
        assert_eq!(parse_flag(WINEESYNC, "01"), 1);
    }
}
