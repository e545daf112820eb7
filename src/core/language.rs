//! Source languages and the C++ dialect flag.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Language of a compilation unit, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cxx,
}

impl Language {
    /// Classify a source by extension. `.cpp`, `.cc` and `.cxx` are C++,
    /// everything else compiles as C.
    pub fn of(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("cpp" | "cc" | "cxx" | "C") => Language::Cxx,
            _ => Language::C,
        }
    }

    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
        }
    }
}

/// C++ standard version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CppStandard {
    #[serde(rename = "c++11", alias = "11")]
    Cpp11,
    #[serde(rename = "c++14", alias = "14")]
    Cpp14,
    #[serde(rename = "c++17", alias = "17")]
    Cpp17,
    #[serde(rename = "c++20", alias = "20")]
    Cpp20,
}

impl Default for CppStandard {
    fn default() -> Self {
        CppStandard::Cpp11
    }
}

impl CppStandard {
    /// The `-std=` flag for this standard.
    pub fn as_flag(&self) -> &'static str {
        match self {
            CppStandard::Cpp11 => "-std=c++11",
            CppStandard::Cpp14 => "-std=c++14",
            CppStandard::Cpp17 => "-std=c++17",
            CppStandard::Cpp20 => "-std=c++20",
        }
    }
}
