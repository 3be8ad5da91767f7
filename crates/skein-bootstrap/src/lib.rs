//! # skein-bootstrap
//!
//! Mounts a client application on its host element and hands it the flags
//! payload, once, at application start.
//!
//! The payload is opaque: literal section text or a single `http(s)://`
//! locator. By default both reach the application byte-for-byte
//! ([`FlagsPolicy::Verbatim`]). A caller that wants locators fetched first
//! opts in with [`FlagsPolicy::Dereference`] and a [`FlagsFetcher`].
//!
//! ```
//! use skein_bootstrap::{Application, BootstrapConfig, MemoryDocument, MemoryElement, bootstrap};
//!
//! struct App;
//!
//! impl Application for App {
//!     type Element = MemoryElement;
//!     type Handle = (String, usize);
//!     type Error = std::convert::Infallible;
//!
//!     fn init(self, node: MemoryElement, flags: skein_bootstrap::FlagsPayload) -> Result<Self::Handle, Self::Error> {
//!         Ok((node.id, flags.sections().len()))
//!     }
//! }
//!
//! let document = MemoryDocument::new().with_element("main", "div");
//! let config = BootstrapConfig::new("---\n\n---\n\n---\n\n");
//! let mounted = bootstrap(&document, config, App).unwrap();
//! assert_eq!(mounted.handle, ("main".to_string(), 3));
//! ```

mod config;
mod document;
mod error;
mod mount;
mod payload;

pub use config::{BootstrapConfig, DEFAULT_MOUNT_ELEMENT_ID};
pub use document::{HostDocument, MemoryDocument, MemoryElement};
pub use error::{BootstrapError, FetchError, Result};
pub use mount::{Application, Mounted, bootstrap, bootstrap_with};
pub use payload::{FlagsFetcher, FlagsPayload, FlagsPolicy, SECTION_DELIMITER};

#[cfg(feature = "web")]
pub use document::web::browser_document;
