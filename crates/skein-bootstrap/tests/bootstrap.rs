use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use skein_bootstrap::{
    Application, BootstrapConfig, BootstrapError, FetchError, FlagsFetcher, FlagsPayload,
    FlagsPolicy, MemoryDocument, MemoryElement, bootstrap, bootstrap_with,
};

/// Records what it was started with.
#[derive(Default, Clone)]
struct Recorder {
    calls: Rc<Cell<usize>>,
    flags: Rc<RefCell<Option<FlagsPayload>>>,
}

impl Application for Recorder {
    type Element = MemoryElement;
    type Handle = String;
    type Error = std::convert::Infallible;

    fn init(self, node: MemoryElement, flags: FlagsPayload) -> Result<String, Self::Error> {
        self.calls.set(self.calls.get() + 1);
        *self.flags.borrow_mut() = Some(flags);
        Ok(node.id)
    }
}

struct StaticFetcher {
    response: Result<String, FetchError>,
    calls: Cell<usize>,
}

impl StaticFetcher {
    fn new(response: Result<String, FetchError>) -> Self {
        Self {
            response,
            calls: Cell::new(0),
        }
    }
}

#[async_trait(?Send)]
impl FlagsFetcher for StaticFetcher {
    async fn fetch(&self, _locator: &str) -> Result<String, FetchError> {
        self.calls.set(self.calls.get() + 1);
        self.response.clone()
    }
}

fn document() -> MemoryDocument {
    MemoryDocument::new().with_element("main", "div")
}

#[test]
fn literal_sections_arrive_verbatim() {
    let app = Recorder::default();
    let mounted = bootstrap(&document(), BootstrapConfig::new("---\n\n---\n\n---\n\n"), app.clone()).unwrap();

    assert_eq!(mounted.handle, "main");
    let flags = app.flags.borrow().clone().unwrap();
    assert_eq!(flags.as_str(), "---\n\n---\n\n---\n\n");
    assert_eq!(flags.sections(), vec!["", "", ""]);
}

#[tokio::test]
async fn locator_arrives_verbatim_without_fetching() {
    let fetcher = StaticFetcher::new(Ok("fetched".to_string()));
    let app = Recorder::default();
    let config = BootstrapConfig::new("http://localhost:8000/sample.md");

    bootstrap_with(&document(), config, app.clone(), FlagsPolicy::Verbatim)
        .await
        .unwrap();

    assert_eq!(fetcher.calls.get(), 0);
    assert_eq!(
        app.flags.borrow().clone().unwrap(),
        FlagsPayload::Locator("http://localhost:8000/sample.md".to_string())
    );
}

#[tokio::test]
async fn dereference_fetches_before_init() {
    let fetcher = StaticFetcher::new(Ok("---\n\nremote\n".to_string()));
    let app = Recorder::default();
    let config = BootstrapConfig::new("http://localhost:8000/sample.md");

    bootstrap_with(&document(), config, app.clone(), FlagsPolicy::Dereference(&fetcher))
        .await
        .unwrap();

    assert_eq!(fetcher.calls.get(), 1);
    let flags = app.flags.borrow().clone().unwrap();
    assert_eq!(flags.sections(), vec!["remote"]);
}

#[tokio::test]
async fn dereference_leaves_literals_alone() {
    let fetcher = StaticFetcher::new(Ok("unused".to_string()));
    let app = Recorder::default();

    bootstrap_with(&document(), BootstrapConfig::new("---\n\n"), app.clone(), FlagsPolicy::Dereference(&fetcher))
        .await
        .unwrap();

    assert_eq!(fetcher.calls.get(), 0);
    assert_eq!(app.flags.borrow().clone().unwrap().as_str(), "---\n\n");
}

#[tokio::test]
async fn failed_fetch_is_reported_and_app_never_starts() {
    let fetcher = StaticFetcher::new(Err(FetchError::new("connection refused")));
    let app = Recorder::default();
    let config = BootstrapConfig::new("http://localhost:8000/sample.md");

    let err = bootstrap_with(&document(), config, app.clone(), FlagsPolicy::Dereference(&fetcher))
        .await
        .unwrap_err();

    match err {
        BootstrapError::FlagsResolution { locator, source } => {
            assert_eq!(locator, "http://localhost:8000/sample.md");
            assert_eq!(source.message, "connection refused");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(app.calls.get(), 0);
}

#[tokio::test]
async fn missing_mount_element_fails_before_init_or_fetch() {
    let fetcher = StaticFetcher::new(Ok("unused".to_string()));
    let app = Recorder::default();
    let config = BootstrapConfig::new("http://localhost:8000/sample.md").mount_element_id("root");

    let err = bootstrap_with(&document(), config.clone(), app.clone(), FlagsPolicy::Dereference(&fetcher))
        .await
        .unwrap_err();
    assert!(matches!(err, BootstrapError::MissingMountElement { ref id } if id == "root"));
    assert!(err.to_string().contains("#root"));

    let err = bootstrap(&MemoryDocument::new(), config, app.clone()).unwrap_err();
    assert!(matches!(err, BootstrapError::MissingMountElement { .. }));

    assert_eq!(app.calls.get(), 0);
    assert_eq!(fetcher.calls.get(), 0);
}

#[test]
fn init_failure_is_propagated() {
    #[derive(Debug, thiserror::Error)]
    #[error("bad flags")]
    struct BadFlags;

    struct Failing;

    impl Application for Failing {
        type Element = MemoryElement;
        type Handle = ();
        type Error = BadFlags;

        fn init(self, _node: MemoryElement, _flags: FlagsPayload) -> Result<(), BadFlags> {
            Err(BadFlags)
        }
    }

    let err = bootstrap(&document(), BootstrapConfig::new(""), Failing).unwrap_err();
    assert!(matches!(err, BootstrapError::Init(_)));
    assert!(err.to_string().contains("bad flags"));
}
