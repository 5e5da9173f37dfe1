use crate::error::FetchError;
use crate::results::RawPage;
use async_trait::async_trait;
use url::Url;

/// An open page-acquisition session, used for every page of one run
#[async_trait]
pub trait PageSession: Send {
    /// Fetch the raw content of one URL
    async fn fetch(&mut self, url: &Url) -> Result<RawPage, FetchError>;

    /// Release the session; called exactly once per run
    async fn close(self: Box<Self>);
}

/// Opens one fresh session per run; runs never share a session
#[async_trait]
pub trait SessionOpener: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, FetchError>;
}

/// Owns a run's session and makes sure it is closed on every exit path.
///
/// `close` is the normal path. If the guard is dropped while still holding
/// the session (run timed out, cancelled, or panicked), the close is spawned
/// on the current Tokio runtime.
pub struct SessionGuard {
    session: Option<Box<dyn PageSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn PageSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub async fn fetch(&mut self, url: &Url) -> Result<RawPage, FetchError> {
        match self.session.as_mut() {
            Some(session) => session.fetch(url).await,
            None => Err(FetchError::session(url.as_str(), "session already closed")),
        }
    }

    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
            ::log::debug!("Page session closed");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                ::log::warn!("Run ended early, closing page session in the background");
                handle.spawn(async move {
                    session.close().await;
                });
            }
            Err(_) => {
                ::log::error!("No async runtime available to close the page session");
            }
        }
    }
}
