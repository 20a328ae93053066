use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// Where the question table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    File(PathBuf),
    Http(Url),
}

impl SourceLocation {
    /// Interpret `raw` as an `http(s)` URL, a `file://` URL or a plain path.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Unsupported` for blank input, URLs with other
    /// schemes, or `file://` URLs that do not map to a local path.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FetchError::Unsupported(raw.to_string()));
        }

        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Http(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::File)
                    .map_err(|()| FetchError::Unsupported(raw.to_string())),
                // Windows drive letters parse as a one-letter scheme.
                scheme if scheme.len() == 1 => Ok(Self::File(PathBuf::from(raw))),
                _ => Err(FetchError::Unsupported(raw.to_string())),
            },
            Err(_) => Ok(Self::File(PathBuf::from(raw))),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::File(path) => write!(f, "{}", path.display()),
            SourceLocation::Http(url) => write!(f, "{url}"),
        }
    }
}

/// Anything that can hand over the raw question table.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Fetch the full source text. Called once per load, never retried.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the source cannot be read.
    async fn fetch_text(&self) -> Result<String, FetchError>;
}

/// Question table read from disk or over HTTP.
#[derive(Clone)]
pub struct QuizSource {
    client: Client,
    location: SourceLocation,
}

impl QuizSource {
    #[must_use]
    pub fn new(location: SourceLocation) -> Self {
        Self {
            client: Client::new(),
            location,
        }
    }

    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }
}

#[async_trait]
impl TextSource for QuizSource {
    async fn fetch_text(&self) -> Result<String, FetchError> {
        debug!(source = %self.location, "fetching question table");
        match &self.location {
            SourceLocation::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: path.clone(),
                        source,
                    })
            }
            SourceLocation::Http(url) => {
                let response = self.client.get(url.clone()).send().await?;
                if !response.status().is_success() {
                    return Err(FetchError::HttpStatus(response.status()));
                }
                Ok(response.text().await?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_locations() {
        assert_eq!(
            SourceLocation::parse("data/quiz_data.csv").unwrap(),
            SourceLocation::File(PathBuf::from("data/quiz_data.csv"))
        );
        assert!(matches!(
            SourceLocation::parse("https://example.com/quiz_data.csv").unwrap(),
            SourceLocation::Http(_)
        ));
        assert!(matches!(
            SourceLocation::parse("ftp://example.com/quiz.csv"),
            Err(FetchError::Unsupported(_))
        ));
        assert!(SourceLocation::parse("   ").is_err());
    }

    #[tokio::test]
    async fn reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "header\nQ,A,B,C,D,0\n").unwrap();

        let source = QuizSource::new(SourceLocation::File(file.path().to_path_buf()));
        let text = source.fetch_text().await.unwrap();
        assert!(text.starts_with("header"));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = QuizSource::new(SourceLocation::File(dir.path().join("missing.csv")));
        let err = source.fetch_text().await.unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
