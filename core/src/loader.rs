use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("response body is not text: {0}")]
    NotText(String),
}

pub type FetchFuture = LocalBoxFuture<'static, Result<String, FetchError>>;
type SharedFetch = Shared<LocalBoxFuture<'static, Result<Rc<str>, FetchError>>>;

/// Loads one static asset once per process. Concurrent callers await the same
/// request and every later caller gets its outcome, success or failure; there
/// is no second network request.
pub struct AssetLoader {
    asset: &'static str,
    fetch: Box<dyn Fn() -> FetchFuture>,
    slot: RefCell<Option<SharedFetch>>,
}

impl AssetLoader {
    pub fn new(asset: &'static str, fetch: impl Fn() -> FetchFuture + 'static) -> Self {
        Self {
            asset,
            fetch: Box::new(fetch),
            slot: RefCell::new(None),
        }
    }

    pub async fn load(&self) -> Result<Rc<str>, FetchError> {
        let pending = self
            .slot
            .borrow_mut()
            .get_or_insert_with(|| {
                tracing::debug!(asset = self.asset, "starting asset fetch");
                (self.fetch)()
                    .map(|result| result.map(Rc::from))
                    .boxed_local()
                    .shared()
            })
            .clone();

        let first_waiter = pending.peek().is_none();
        let result = pending.await;
        if first_waiter {
            match &result {
                Ok(body) => tracing::info!(asset = self.asset, bytes = body.len(), "asset loaded"),
                Err(err) => tracing::warn!(asset = self.asset, error = %err, "asset fetch failed"),
            }
        }
        result
    }
}
