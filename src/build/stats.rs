//! Build statistics
//!
//! Summary of one finished build, handed to server-side renderers and logged.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One emitted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Path relative to the output directory, `/`-separated
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

/// Result of a build generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    pub generation: u64,
    pub started_at: DateTime<Local>,
    pub duration_ms: u64,
    pub assets: Vec<AssetInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl BuildStats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.assets.iter().map(|a| a.size).sum()
    }

    /// Asset names with the given extension, in emission order
    pub fn assets_with_extension<'a>(&'a self, ext: &'a str) -> impl Iterator<Item = &'a str> {
        self.assets
            .iter()
            .map(|a| a.name.as_str())
            .filter(move |name| {
                std::path::Path::new(name)
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
            })
    }
}
