use thiserror::Error;

use crate::{resolver::ResolutionRequest, ResourceId};

mod null;
pub use null::NullLookup;
mod spotify;
pub use spotify::SpotifyLookup;

#[derive(Debug, Error)]
#[error("Lookup error: {0}")]
pub struct LookupError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl LookupError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self(err.into())
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(value: reqwest::Error) -> Self {
        Self(Box::new(value))
    }
}

/// Remote search for the canonical uri of an artist, album or track.
#[async_trait::async_trait]
pub trait Lookup: Send + Sync + 'static {
    /// Returns the best ranked match at the request's granularity, `None` if nothing matched.
    async fn search(&self, request: &ResolutionRequest) -> Result<Option<ResourceId>, LookupError>;
}
