use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::JsonNode;
use crate::error::{ResolveError, ResolveResult};

/// Retrieves and parses the documents `$ref` points at.
pub trait DocumentLoader {
    fn fetch(&self, locator: &str) -> ResolveResult<JsonNode>;
}

/// Filesystem paths, `file://` URLs and `http(s)://` URLs.
#[derive(Debug, Clone)]
pub struct StdDocumentLoader {
    base_dir: Option<PathBuf>,
    timeout: Duration,
}

impl Default for StdDocumentLoader {
    fn default() -> Self {
        Self::new(None, Duration::from_millis(crate::engine::DEFAULT_HTTP_TIMEOUT_MS))
    }
}

impl StdDocumentLoader {
    /// Relative paths are joined onto `base_dir`, or left for the process
    /// working directory when it is `None`.
    pub fn new(base_dir: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            base_dir,
            timeout: timeout.max(Duration::from_millis(1)),
        }
    }

    fn fetch_path(&self, locator: &str, path: &Path) -> ResolveResult<JsonNode> {
        let path = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        debug!(path = %path.display(), "reading document");
        let content = fs::read_to_string(&path).map_err(|e| ResolveError::fetch(locator, e))?;
        parse_document(locator, &content)
    }

    fn fetch_http(&self, locator: &str) -> ResolveResult<JsonNode> {
        debug!(url = locator, "fetching document");
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(self.timeout)
            .timeout_read(self.timeout)
            .build();
        let response = match agent.get(locator).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => {
                return Err(ResolveError::fetch(locator, format!("HTTP status {code}")));
            }
            Err(ureq::Error::Transport(err)) => return Err(ResolveError::fetch(locator, err)),
        };
        let body = response
            .into_string()
            .map_err(|e| ResolveError::fetch(locator, e))?;
        parse_document(locator, &body)
    }
}

impl DocumentLoader for StdDocumentLoader {
    fn fetch(&self, locator: &str) -> ResolveResult<JsonNode> {
        if !locator.contains("://") {
            return self.fetch_path(locator, Path::new(locator));
        }
        let url = Url::parse(locator).map_err(|e| ResolveError::fetch(locator, e))?;
        match url.scheme() {
            "http" | "https" => self.fetch_http(locator),
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| ResolveError::fetch(locator, "not a local file URL"))?;
                self.fetch_path(locator, &path)
            }
            other => Err(ResolveError::fetch(
                locator,
                format!("no loader for scheme '{other}'"),
            )),
        }
    }
}

fn parse_document(locator: &str, content: &str) -> ResolveResult<JsonNode> {
    serde_json::from_str::<Value>(content)
        .map_err(|e| ResolveError::fetch(locator, format!("invalid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_relative_paths_under_base_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("doc.json"), r#"{"a": [1, 2]}"#).expect("write doc");

        let loader = StdDocumentLoader::new(Some(dir.path().to_path_buf()), Duration::from_secs(1));
        assert_eq!(loader.fetch("doc.json").expect("fetch"), json!({"a": [1, 2]}));
    }

    #[test]
    fn reads_file_urls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.json");
        fs::write(&path, "[true]").expect("write doc");
        let url = Url::from_file_path(&path).expect("file url");

        let loader = StdDocumentLoader::default();
        assert_eq!(loader.fetch(url.as_str()).expect("fetch"), json!([true]));
    }

    #[test]
    fn missing_file_and_bad_json_are_fetch_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("broken.json"), "{not json").expect("write doc");
        let loader = StdDocumentLoader::new(Some(dir.path().to_path_buf()), Duration::from_secs(1));

        let err = loader.fetch("absent.json").unwrap_err();
        assert!(matches!(err, ResolveError::FetchFailure { ref locator, .. } if locator == "absent.json"));

        let err = loader.fetch("broken.json").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = StdDocumentLoader::default().fetch("s3://bucket/key.json").unwrap_err();
        assert!(err.to_string().contains("no loader for scheme 's3'"));
    }
}
