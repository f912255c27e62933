//! Host architecture mapping.
//!
//! Debian-flavoured package names use their own architecture vocabulary
//! (`amd64` rather than `x86_64`). The mapping is a categorical remap keyed on
//! the kernel machine and, for ARMv6, the platform; it never reports a
//! modification.

use std::fmt;

/// CPU families recognised by the architecture table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CpuFamily {
    /// 64-bit x86 (`x86_64`).
    X86_64,
    /// 32-bit x86 (`i686`).
    I686,
    /// ARMv6 little-endian (`armv6l`).
    Armv6l,
    /// Any other machine string, preserved verbatim.
    Unknown(String),
}

impl CpuFamily {
    /// Classify a raw kernel machine string such as the output of `uname -m`.
    #[must_use]
    pub fn from_machine(machine: &str) -> Self {
        match machine {
            "x86_64" => Self::X86_64,
            "i686" => Self::I686,
            "armv6l" => Self::Armv6l,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// The kernel machine string this family was parsed from.
    #[must_use]
    pub fn machine(&self) -> &str {
        match self {
            Self::X86_64 => "x86_64",
            Self::I686 => "i686",
            Self::Armv6l => "armv6l",
            Self::Unknown(machine) => machine,
        }
    }
}

/// Operating-system families that influence the architecture name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// Raspbian, whose ARMv6 packages are published as `armhf`.
    Raspbian,
    /// Any other platform.
    Other(String),
}

impl PlatformFamily {
    /// Classify a raw platform name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "raspbian" => Self::Raspbian,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// A target-ecosystem architecture name.
///
/// # Examples
///
/// ```
/// use omnibus_docker_common::architecture::{Architecture, CpuFamily, PlatformFamily};
///
/// let arch = Architecture::for_host(
///     &CpuFamily::from_machine("armv6l"),
///     &PlatformFamily::from_name("raspbian"),
/// );
/// assert_eq!(arch.to_string(), "armhf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 64-bit x86.
    Amd64,
    /// 32-bit x86.
    I386,
    /// ARM hard-float, as used by Raspbian.
    Armhf,
    /// ARMv6 on platforms other than Raspbian.
    Armv6l,
    /// Unrecognised machine, passed through unchanged.
    Passthrough(String),
}

impl Architecture {
    /// Map a CPU and platform family onto the target architecture name.
    #[must_use]
    pub fn for_host(cpu: &CpuFamily, platform: &PlatformFamily) -> Self {
        match (cpu, platform) {
            (CpuFamily::X86_64, _) => Self::Amd64,
            (CpuFamily::I686, _) => Self::I386,
            (CpuFamily::Armv6l, PlatformFamily::Raspbian) => Self::Armhf,
            (CpuFamily::Armv6l, PlatformFamily::Other(_)) => Self::Armv6l,
            (CpuFamily::Unknown(machine), _) => Self::Passthrough(machine.clone()),
        }
    }

    /// The architecture name as used in package filenames.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Amd64 => "amd64",
            Self::I386 => "i386",
            Self::Armhf => "armhf",
            Self::Armv6l => "armv6l",
            Self::Passthrough(machine) => machine,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host CPU and operating-system description supplied by the build host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Kernel machine, e.g. `x86_64`.
    pub kernel_machine: String,
    /// Platform (distribution) name, e.g. `ubuntu` or `raspbian`.
    pub platform_name: String,
}

impl PlatformInfo {
    /// Create a platform description from raw strings.
    #[must_use]
    pub fn new(kernel_machine: impl Into<String>, platform_name: impl Into<String>) -> Self {
        Self {
            kernel_machine: kernel_machine.into(),
            platform_name: platform_name.into(),
        }
    }

    /// Resolve the target architecture for this host.
    #[must_use]
    pub fn architecture(&self) -> Architecture {
        Architecture::for_host(
            &CpuFamily::from_machine(&self.kernel_machine),
            &PlatformFamily::from_name(&self.platform_name),
        )
    }
}
