//! Host platform detection.
//!
//! The kernel machine comes from `uname -m` and the platform name from the
//! `ID` field of `/etc/os-release`. Either can be overridden from the command
//! line when packaging for a different host than the one running the build.

use crate::error::{PackagerError, Result};
use crate::executor::CommandExecutor;
use camino::Utf8Path;
use log::debug;
use omnibus_docker_common::PlatformInfo;
use std::fs;

/// Default location of the os-release file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Platform name used when os-release is missing or has no `ID` field.
pub const UNKNOWN_PLATFORM: &str = "unknown";

/// Explicit values that take precedence over detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformOverrides {
    /// Kernel machine override, e.g. `armv6l`.
    pub machine: Option<String>,
    /// Platform name override, e.g. `raspbian`.
    pub platform: Option<String>,
}

/// Detect the host platform, honouring any overrides.
///
/// `uname` is only invoked when no machine override is given, and the
/// os-release file is only read when no platform override is given.
///
/// # Errors
///
/// Returns [`PackagerError::PlatformDetection`] if `uname -m` fails or
/// prints nothing.
pub fn detect_platform(
    executor: &dyn CommandExecutor,
    os_release: &Utf8Path,
    overrides: &PlatformOverrides,
) -> Result<PlatformInfo> {
    let machine = match &overrides.machine {
        Some(machine) => machine.clone(),
        None => kernel_machine(executor)?,
    };
    let platform = match &overrides.platform {
        Some(platform) => platform.clone(),
        None => platform_name(os_release),
    };

    debug!("detected platform: machine={machine} platform={platform}");
    Ok(PlatformInfo::new(machine, platform))
}

fn kernel_machine(executor: &dyn CommandExecutor) -> Result<String> {
    let output = executor
        .run("uname", &["-m"])
        .map_err(|e| PackagerError::PlatformDetection {
            reason: format!("failed to run uname -m: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PackagerError::PlatformDetection {
            reason: format!("uname -m failed: {}", stderr.trim()),
        });
    }

    let machine = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if machine.is_empty() {
        return Err(PackagerError::PlatformDetection {
            reason: "uname -m printed nothing".to_owned(),
        });
    }
    Ok(machine)
}

fn platform_name(os_release: &Utf8Path) -> String {
    match fs::read_to_string(os_release) {
        Ok(contents) => parse_os_release_id(&contents).unwrap_or_else(|| {
            debug!("no ID field in {os_release}");
            UNKNOWN_PLATFORM.to_owned()
        }),
        Err(e) => {
            debug!("cannot read {os_release}: {e}");
            UNKNOWN_PLATFORM.to_owned()
        }
    }
}

/// Extract the `ID` field from os-release contents.
///
/// Surrounding single or double quotes are removed.
///
/// # Examples
///
/// ```
/// use omnibus_docker_packager::platform::parse_os_release_id;
///
/// let contents = "NAME=\"Raspbian GNU/Linux\"\nID=raspbian\nID_LIKE=debian\n";
/// assert_eq!(parse_os_release_id(contents).as_deref(), Some("raspbian"));
/// ```
#[must_use]
pub fn parse_os_release_id(contents: &str) -> Option<String> {
    contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("ID="))
        .map(|value| value.trim().trim_matches(['"', '\'']))
        .find(|value| !value.is_empty())
        .map(str::to_owned)
}
