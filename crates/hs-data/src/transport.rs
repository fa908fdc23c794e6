//! The network seam.

use std::rc::Rc;

use async_trait::async_trait;

use crate::{FetchError, Response};

/// Issues GET requests against the analytics API.
///
/// Futures are not required to be `Send`: the cache runs on a single-threaded
/// event loop, and the browser transport is `!Send`.
#[async_trait(?Send)]
pub trait Transport {
    /// Fetch `url`, returning the raw response whatever its status.
    async fn get(&self, url: &str) -> Result<Response, FetchError>;
}

#[async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for Rc<T> {
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        (**self).get(url).await
    }
}
