use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::FetchError;

/// Somewhere the raw catalog page can be read from.
///
/// No retries happen here; a failed fetch is returned to the caller as is.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Where the page comes from, for logs and errors.
    fn location(&self) -> String;

    /// Return the raw page markup.
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Fetches the vendor page over HTTP.
///
/// The timeout is whatever the supplied client was built with.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    url: String,
}

impl HttpCatalogSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        tracing::debug!("Fetching catalog from {}", self.url);

        let http_err = |source: reqwest::Error| FetchError::Http {
            url: self.url.clone(),
            source,
        };

        let resp = self.client.get(&self.url).send().await.map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = resp.text().await.map_err(http_err)?;
        tracing::debug!("Catalog page is {} bytes", body.len());
        Ok(body)
    }
}

/// Reads a saved copy of the vendor page from disk.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::File {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn fetches_page_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/downloads/nessus-agents")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>catalog</html>")
            .create_async()
            .await;

        let source = HttpCatalogSource::new(
            Client::new(),
            format!("{}/downloads/nessus-agents", server.url()),
        );
        let body = source.fetch().await.unwrap();
        assert_eq!(body, "<html>catalog</html>");
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/downloads/nessus-agents")
            .with_status(503)
            .create_async()
            .await;

        let url = format!("{}/downloads/nessus-agents", server.url());
        let source = HttpCatalogSource::new(Client::new(), url.clone());
        let err = source.fetch().await.unwrap_err();
        match err {
            FetchError::Status { url: got, status } => {
                assert_eq!(got, url);
                assert_eq!(status.as_u16(), 503);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unresponsive_server_times_out() {
        // Accepts the connection and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();
        let source = HttpCatalogSource::new(client, format!("http://{addr}/catalog"));
        let err = source.fetch().await.unwrap_err();
        match err {
            FetchError::Http { source, .. } => assert!(source.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileCatalogSource::new(dir.path().join("missing.html"));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::File { .. }));
        assert!(err.to_string().contains("missing.html"));
    }
}
