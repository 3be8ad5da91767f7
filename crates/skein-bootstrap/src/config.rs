use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::payload::FlagsPayload;

/// Conventional mount element id.
pub const DEFAULT_MOUNT_ELEMENT_ID: &str = "main";

/// What the application is mounted on and started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    #[serde(default = "default_mount_element_id")]
    pub mount_element_id: String,

    #[serde(default)]
    pub flags_payload: FlagsPayload,
}

fn default_mount_element_id() -> String {
    DEFAULT_MOUNT_ELEMENT_ID.to_string()
}

impl BootstrapConfig {
    /// Config for the conventional `main` element.
    pub fn new(flags: impl Into<FlagsPayload>) -> Self {
        Self {
            mount_element_id: default_mount_element_id(),
            flags_payload: flags.into(),
        }
    }

    pub fn mount_element_id(mut self, id: impl Into<String>) -> Self {
        self.mount_element_id = id.into();
        self
    }

    /// Parse from JSON, such as a config object inlined in the host page.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
