//! Global settings shared across profiles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Default log filter when neither flags nor `RUST_LOG` set one
    #[serde(default, alias = "loglevel", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Maximum transforms running at once
    #[serde(default, alias = "paralleljobs", skip_serializing_if = "Option::is_none")]
    pub parallel_jobs: Option<usize>,
}
