//! Mounting: element lookup, flags resolution, then initialisation.

use tracing::debug;

use crate::config::BootstrapConfig;
use crate::document::HostDocument;
use crate::error::{BootstrapError, Result};
use crate::payload::{FlagsPayload, FlagsPolicy};

/// A client application's initialisation entry point.
pub trait Application {
    type Element;
    type Handle;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start the application on `node` with `flags`. Called at most once.
    fn init(self, node: Self::Element, flags: FlagsPayload) -> std::result::Result<Self::Handle, Self::Error>;
}

/// A started application.
#[derive(Debug)]
pub struct Mounted<H> {
    pub handle: H,
    pub mount_element_id: String,
}

/// Mount `app` with its flags exactly as configured.
///
/// Fails with [`BootstrapError::MissingMountElement`] before the application
/// is touched when the element does not exist.
pub fn bootstrap<D, A>(document: &D, config: BootstrapConfig, app: A) -> Result<Mounted<A::Handle>>
where
    D: HostDocument + ?Sized,
    A: Application<Element = D::Element>,
{
    let node = mount_node(document, &config.mount_element_id)?;
    init(app, node, config.mount_element_id, config.flags_payload)
}

/// Mount `app` after preparing its flags under `policy`.
///
/// With [`FlagsPolicy::Dereference`], a locator payload is fetched and the
/// application starts only once the fetch has settled. A failed fetch is
/// [`BootstrapError::FlagsResolution`] and the application never starts.
pub async fn bootstrap_with<D, A>(
    document: &D,
    config: BootstrapConfig,
    app: A,
    policy: FlagsPolicy<'_>,
) -> Result<Mounted<A::Handle>>
where
    D: HostDocument + ?Sized,
    A: Application<Element = D::Element>,
{
    let node = mount_node(document, &config.mount_element_id)?;

    let flags = match (policy, config.flags_payload) {
        (FlagsPolicy::Dereference(fetcher), FlagsPayload::Locator(locator)) => {
            debug!(locator = %locator, "Fetching flags");
            let text = fetcher
                .fetch(&locator)
                .await
                .map_err(|source| BootstrapError::FlagsResolution { locator, source })?;
            FlagsPayload::Literal(text)
        }
        (_, payload) => payload,
    };

    init(app, node, config.mount_element_id, flags)
}

fn mount_node<D>(document: &D, id: &str) -> Result<D::Element>
where
    D: HostDocument + ?Sized,
{
    document
        .element_by_id(id)
        .ok_or_else(|| BootstrapError::MissingMountElement { id: id.to_string() })
}

fn init<A: Application>(
    app: A,
    node: A::Element,
    mount_element_id: String,
    flags: FlagsPayload,
) -> Result<Mounted<A::Handle>> {
    debug!(element = %mount_element_id, locator = flags.is_locator(), "Initialising application");
    let handle = app
        .init(node, flags)
        .map_err(|e| BootstrapError::Init(Box::new(e)))?;
    Ok(Mounted {
        handle,
        mount_element_id,
    })
}
