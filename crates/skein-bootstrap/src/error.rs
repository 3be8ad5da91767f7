/// A locator fetch that did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The host document has no element with the configured id.
    #[error(
        "Mount element '#{id}' not found in the host document; add <div id=\"{id}\"></div> or set mountElementId"
    )]
    MissingMountElement { id: String },

    /// A locator payload could not be dereferenced.
    #[error("Failed to resolve flags from '{locator}': {source}")]
    FlagsResolution {
        locator: String,
        #[source]
        source: FetchError,
    },

    /// The application's own initialisation failed.
    #[error("Application initialisation failed: {0}")]
    Init(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid bootstrap config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
