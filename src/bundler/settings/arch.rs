//! CPU architecture types and utilities.

use std::{fmt, str::FromStr};

/// CPU architecture of the application bundle being packaged.
///
/// Each architecture gets its own pass through the pipeline and its own
/// output directories (`MyApp-darwin-x64`, `MyApp-mas-arm64`, ...).
///
/// # Examples
///
/// ```
/// use kodegen_bundler_mac::bundler::Arch;
///
/// let arch: Arch = "arm64".parse().unwrap();
/// assert_eq!(arch.as_str(), "arm64");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// Intel 64-bit
    #[serde(alias = "x86_64")]
    X64,
    /// Apple Silicon
    #[serde(alias = "aarch64")]
    Arm64,
    /// Universal binary - contains both x64 and arm64 slices
    Universal,
}

impl Arch {
    /// Name used in output directory names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::Universal => "universal",
        }
    }

    /// Architecture of the machine running the bundler.
    pub fn host() -> Self {
        if cfg!(target_arch = "aarch64") {
            Arch::Arm64
        } else {
            Arch::X64
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x64" | "x86_64" => Ok(Arch::X64),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "universal" => Ok(Arch::Universal),
            other => Err(format!(
                "Invalid architecture: {other}. Valid architectures: x64, arm64, universal"
            )),
        }
    }
}
