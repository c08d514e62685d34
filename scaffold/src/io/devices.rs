//! Online device discovery through the platform tool chains.

use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, instrument};

use crate::core::types::Platform;
use crate::io::process::run_probe;

const PROBE_OUTPUT_LIMIT: usize = 64 * 1024;

/// List devices that can host a session right now.
#[instrument(skip_all, fields(platform = %platform))]
pub fn online_devices(platform: Platform, timeout: Duration) -> Result<Vec<String>> {
    let (program, args): (&str, &[&str]) = match platform {
        Platform::Android => ("adb", &["devices"]),
        Platform::Ios => ("xcrun", &["simctl", "list", "devices", "booted"]),
    };
    let output = run_probe(program, args, timeout, PROBE_OUTPUT_LIMIT)?;
    if output.timed_out {
        bail!("{program} did not answer within {}s", timeout.as_secs());
    }
    if !output.status.success() {
        bail!("{program} exited with {}: {}", output.status, output.stderr.trim());
    }
    let devices = match platform {
        Platform::Android => parse_adb_devices(&output.stdout),
        Platform::Ios => parse_simctl_booted(&output.stdout),
    };
    debug!(count = devices.len(), "devices listed");
    Ok(devices)
}

/// Serials in state `device` from `adb devices` output.
///
/// `offline` and `unauthorized` entries are not usable and are skipped.
pub fn parse_adb_devices(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.starts_with("List of devices") && !line.starts_with('*'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?;
            (fields.next() == Some("device")).then(|| serial.to_string())
        })
        .collect()
}

/// Booted simulator names from `xcrun simctl list devices booted` output.
pub fn parse_simctl_booted(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.contains("(Booted)"))
        .filter_map(|line| line.split(" (").next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adb_output_keeps_only_ready_devices() {
        let stdout = "* daemon started successfully\nList of devices attached\nemulator-5554\tdevice\nR58M\tunauthorized\n0123\toffline\n\n";
        assert_eq!(parse_adb_devices(stdout), vec!["emulator-5554"]);
    }

    #[test]
    fn adb_output_without_devices_is_empty() {
        assert!(parse_adb_devices("List of devices attached\n\n").is_empty());
    }

    #[test]
    fn simctl_output_lists_booted_names() {
        let stdout = "== Devices ==\n-- iOS 17.4 --\n    iPhone 15 (A1B2C3D4-0000-0000-0000-000000000000) (Booted) \n-- Unavailable --\n";
        assert_eq!(parse_simctl_booted(stdout), vec!["iPhone 15"]);
    }
}
