//! Deployment targets: platform families, Apple SDKs and build
//! configurations.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A platform family the vendored library ships to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// Android, packaged as a CMake project tree
    Android,
    /// iOS and its simulator, packaged as an xcframework
    Apple,
}

impl PlatformFamily {
    /// Prefix the object format puts in front of C symbol names.
    pub fn symbol_prefix(&self) -> &'static str {
        match self {
            PlatformFamily::Android => "",
            PlatformFamily::Apple => "_",
        }
    }
}

/// An Apple SDK, as understood by `xcrun --sdk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AppleSdk {
    #[serde(rename = "iphoneos")]
    IphoneOs,
    #[serde(rename = "iphonesimulator")]
    IphoneSimulator,
}

impl AppleSdk {
    /// The SDK identifier passed to `xcrun --sdk`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppleSdk::IphoneOs => "iphoneos",
            AppleSdk::IphoneSimulator => "iphonesimulator",
        }
    }

    /// The deployment-target flag for this SDK.
    pub fn min_version_flag(&self, version: &str) -> String {
        match self {
            AppleSdk::IphoneOs => format!("-miphoneos-version-min={}", version),
            AppleSdk::IphoneSimulator => format!("-mios-simulator-version-min={}", version),
        }
    }

    fn triple(&self, arch: &str) -> String {
        match self {
            AppleSdk::IphoneOs => format!("{}-apple-ios", arch),
            AppleSdk::IphoneSimulator => format!("{}-apple-ios-simulator", arch),
        }
    }
}

impl fmt::Display for AppleSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppleSdk {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iphoneos" => Ok(AppleSdk::IphoneOs),
            "iphonesimulator" => Ok(AppleSdk::IphoneSimulator),
            other => anyhow::bail!(
                "unknown SDK `{}`, valid values: iphoneos, iphonesimulator",
                other
            ),
        }
    }
}

/// One (SDK, architecture) target the source manifest is compiled for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildConfiguration {
    family: PlatformFamily,
    sdk: AppleSdk,
    arch: String,
    triple: String,
}

impl BuildConfiguration {
    /// Create an Apple configuration.
    pub fn apple(sdk: AppleSdk, arch: impl Into<String>) -> Self {
        let arch = arch.into();
        BuildConfiguration {
            family: PlatformFamily::Apple,
            sdk,
            triple: sdk.triple(&arch),
            arch,
        }
    }

    pub fn family(&self) -> PlatformFamily {
        self.family
    }

    pub fn sdk(&self) -> AppleSdk {
        self.sdk
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn triple(&self) -> &str {
        &self.triple
    }

    /// Stable identifier, e.g. `iphoneos-arm64`.
    pub fn id(&self) -> String {
        format!("{}-{}", self.sdk, self.arch)
    }

    /// Private working directory of this configuration inside the scratch
    /// workspace. No two configurations share one.
    pub fn work_dir(&self, scratch: &Path) -> PathBuf {
        scratch.join(self.id())
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.triple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_identity() {
        let config = BuildConfiguration::apple(AppleSdk::IphoneSimulator, "x86_64");
        assert_eq!(config.id(), "iphonesimulator-x86_64");
        assert_eq!(config.triple(), "x86_64-apple-ios-simulator");
        assert_eq!(config.family(), PlatformFamily::Apple);
        assert_eq!(
            config.work_dir(Path::new("/ws/tmp")),
            PathBuf::from("/ws/tmp/iphonesimulator-x86_64")
        );
    }

    #[test]
    fn test_min_version_flag() {
        assert_eq!(
            AppleSdk::IphoneOs.min_version_flag("9.0"),
            "-miphoneos-version-min=9.0"
        );
        assert_eq!(
            AppleSdk::IphoneSimulator.min_version_flag("9.0"),
            "-mios-simulator-version-min=9.0"
        );
    }

    #[test]
    fn test_sdk_parse() {
        assert_eq!("iphoneos".parse::<AppleSdk>().unwrap(), AppleSdk::IphoneOs);
        assert!("watchos".parse::<AppleSdk>().is_err());
    }
}
