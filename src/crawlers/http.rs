use crate::config::PipelineConfig;
use crate::crawlers::crawler::{PageSession, SessionOpener};
use crate::error::{ConfigError, FetchError};
use crate::results::RawPage;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

/// Static-mode opener: every session is a thin handle on a shared HTTP client
#[derive(Clone)]
pub struct HttpOpener {
    client: Client,
}

impl HttpOpener {
    pub fn new(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| ConfigError::invalid(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SessionOpener for HttpOpener {
    async fn open(&self) -> Result<Box<dyn PageSession>, FetchError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
        }))
    }
}

/// Plain GET fetches, no retries
pub struct HttpSession {
    client: Client,
}

#[async_trait]
impl PageSession for HttpSession {
    async fn fetch(&mut self, url: &Url) -> Result<RawPage, FetchError> {
        ::log::debug!("GET {}", url);
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::network(url.as_str(), e))?;

        let served_url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http(url.as_str(), status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(url.as_str(), e))?;

        Ok(RawPage {
            url: served_url,
            content_type,
            body,
        })
    }

    async fn close(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn session() -> Box<dyn PageSession> {
        let opener = HttpOpener::new(&PipelineConfig::default()).unwrap();
        opener.open().await.unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p>hi</p>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/index.html", server.uri())).unwrap();
        let page = session().await.fetch(&url).await.unwrap();
        assert_eq!(page.body, "<p>hi</p>");
        assert_eq!(page.url, url.as_str());
        assert_eq!(page.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert!(!page.is_plain_text());
    }

    #[tokio::test]
    async fn test_fetch_records_redirect_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "/docs/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<a href="guide.html">Guide</a>"#,
                "text/html",
            ))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/docs", server.uri())).unwrap();
        let page = session().await.fetch(&url).await.unwrap();
        assert_eq!(page.url, format!("{}/docs/", server.uri()));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.html", server.uri())).unwrap();
        let err = session().await.fetch(&url).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Http(404));
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        // Port 9 (discard) is closed on test machines
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = session().await.fetch(&url).await.unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::Network(_)));
    }
}
