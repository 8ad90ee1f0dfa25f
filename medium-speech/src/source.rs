//! Article retrieval: the source to speak and the collaborators that fetch it.
//!
//! URLs are exported to Markdown by the `mediumexporter` container, run
//! through `docker`. Local files are read as-is.

use log::{debug, info};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Default exporter image for Medium posts.
pub const DEFAULT_EXPORTER_IMAGE: &str = "mmphego/mediumexporter";

/// Retrieval errors. All of them abort the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No article specified. Pass --url <URL> or --file <PATH>.")]
    Missing,

    #[error("Both a URL and a file were given. Pass only one of --url or --file.")]
    Ambiguous,

    #[error("Invalid article URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{tool} not found on PATH.\nEnsure that {tool} is installed in your system\nRun 'sudo apt install {package}'")]
    ToolNotFound { tool: String, package: String },

    #[error("Docker image {image} is unavailable: {message}")]
    ImageUnavailable { image: String, message: String },

    #[error("Article URL {url} is not reachable: {message}")]
    Unreachable { url: String, message: String },

    #[error("Failed to retrieve article from {url}: {message}")]
    ExportFailed { url: String, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the article comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// Build a source from optional CLI values; exactly one must be given.
    pub fn new(url: Option<String>, file: Option<PathBuf>) -> Result<Self, SourceError> {
        match (url, file) {
            (Some(_), Some(_)) => Err(SourceError::Ambiguous),
            (None, None) => Err(SourceError::Missing),
            (Some(url), None) => {
                validate_url(&url)?;
                Ok(Self::Url(url))
            }
            (None, Some(path)) => Ok(Self::File(path)),
        }
    }
}

fn validate_url(url: &str) -> Result<(), SourceError> {
    let parsed = Url::parse(url).map_err(|e| SourceError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(SourceError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

/// Markup flavour of a retrieved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Markdown,
    Html,
}

impl DocumentFormat {
    /// Guess the format from a file extension; Markdown unless it is HTML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("html") | Some("htm") | Some("xhtml") => Self::Html,
            _ => Self::Markdown,
        }
    }
}

/// The article in its original markup, as retrieved.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    format: DocumentFormat,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Persist the raw bytes, e.g. to keep the exported Markdown around.
    pub async fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        tokio::fs::write(path, &self.bytes).await
    }
}

/// Read an article from a local file.
pub async fn read_file(path: &Path) -> Result<RawDocument, SourceError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(RawDocument::new(bytes, DocumentFormat::from_path(path)))
}

/// Check that a URL answers with a success status before exporting it.
pub async fn check_url(url: &str, timeout: Duration) -> Result<(), SourceError> {
    let unreachable = |message: String| SourceError::Unreachable {
        url: url.to_string(),
        message,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| unreachable(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| unreachable(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(unreachable(format!("HTTP {}", status.as_u16())));
    }
    Ok(())
}

/// The container-based exporter that turns a post URL into Markdown.
#[derive(Debug, Clone)]
pub struct Exporter {
    docker: PathBuf,
    image: String,
    /// Limit for each docker invocation; the process is killed when it expires
    timeout: Duration,
}

impl Exporter {
    /// Locate `docker` on PATH.
    pub fn locate(image: &str, timeout: Duration) -> Result<Self, SourceError> {
        let docker = which::which("docker").map_err(|_| SourceError::ToolNotFound {
            tool: "docker".to_string(),
            package: "docker-ce".to_string(),
        })?;
        debug!("Using docker at {}", docker.display());

        Ok(Self {
            docker,
            image: image.to_string(),
            timeout,
        })
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Make sure the exporter image is present locally, pulling it if needed.
    pub async fn ensure_image(&self) -> Result<(), SourceError> {
        let present = matches!(
            self.docker(&["image", "inspect", self.image.as_str()]).await,
            Ok(output) if output.status.success()
        );

        if present {
            debug!("Found docker image {}", self.image);
            return Ok(());
        }

        info!("Pulling docker image {}", self.image);
        let unavailable = |message: String| SourceError::ImageUnavailable {
            image: self.image.clone(),
            message,
        };

        let output = self
            .docker(&["pull", self.image.as_str()])
            .await
            .map_err(unavailable)?;

        if !output.status.success() {
            return Err(unavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }

    /// Run the exporter for `url` and return its Markdown output.
    pub async fn export(&self, url: &str) -> Result<RawDocument, SourceError> {
        debug!("Running docker container '{}'", self.image);
        let failed = |message: String| SourceError::ExportFailed {
            url: url.to_string(),
            message,
        };

        let output = self
            .docker(&["run", "--rm", self.image.as_str(), url])
            .await
            .map_err(failed)?;

        if !output.status.success() {
            return Err(failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(failed("exporter produced no output".to_string()));
        }

        Ok(RawDocument::new(output.stdout, DocumentFormat::Markdown))
    }

    /// Run docker with `args`, capturing its output, within the time limit.
    async fn docker(&self, args: &[&str]) -> Result<Output, String> {
        let run = Command::new(&self.docker)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!(
                "docker {} timed out after {:?}",
                args.first().copied().unwrap_or_default(),
                self.timeout
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_requires_exactly_one() {
        assert!(matches!(Source::new(None, None), Err(SourceError::Missing)));
        assert!(matches!(
            Source::new(
                Some("https://medium.com/@a/post".to_string()),
                Some(PathBuf::from("post.md"))
            ),
            Err(SourceError::Ambiguous)
        ));
    }

    #[test]
    fn test_source_variants() {
        assert_eq!(
            Source::new(Some("https://medium.com/@a/post".to_string()), None).unwrap(),
            Source::Url("https://medium.com/@a/post".to_string())
        );
        assert_eq!(
            Source::new(None, Some(PathBuf::from("post.md"))).unwrap(),
            Source::File(PathBuf::from("post.md"))
        );
    }

    #[test]
    fn test_source_rejects_bad_url() {
        assert!(matches!(
            Source::new(Some("not a url".to_string()), None),
            Err(SourceError::InvalidUrl { .. })
        ));
        assert!(matches!(
            Source::new(Some("ftp://example.com/post".to_string()), None),
            Err(SourceError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.md")), DocumentFormat::Markdown);
        assert_eq!(DocumentFormat::from_path(Path::new("a.HTML")), DocumentFormat::Html);
        assert_eq!(DocumentFormat::from_path(Path::new("post")), DocumentFormat::Markdown);
    }

    #[tokio::test]
    async fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, b"# Title\n").unwrap();

        let doc = read_file(&path).await.unwrap();
        assert_eq!(doc.bytes(), b"# Title\n");
        assert_eq!(doc.format(), DocumentFormat::Markdown);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_file(&dir.path().join("missing.md")).await;
        assert!(matches!(result, Err(SourceError::Read { .. })));
    }

    #[tokio::test]
    async fn test_check_url_times_out() {
        // Accepts connections into the backlog but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/post", listener.local_addr().unwrap());

        let result = check_url(&url, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(SourceError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn test_check_url_rejects_error_status() {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/post", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();
        });

        let err = check_url(&url, Duration::from_secs(5)).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 404"), "{}", err);
        server.join().unwrap();
    }

    #[cfg(unix)]
    fn fake_docker(dir: &Path, script: &str) -> Exporter {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("docker");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Exporter {
            docker: path,
            image: DEFAULT_EXPORTER_IMAGE.to_string(),
            timeout: Duration::from_millis(300),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_export_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = fake_docker(dir.path(), "sleep 5");

        let started = std::time::Instant::now();
        let err = exporter.export("https://medium.com/@a/post").await.unwrap_err();

        assert!(matches!(err, SourceError::ExportFailed { .. }));
        assert!(err.to_string().contains("timed out"), "{}", err);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_export_reports_stderr_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = fake_docker(dir.path(), "echo 'no such post' >&2; exit 3");

        let err = exporter.export("https://medium.com/@a/post").await.unwrap_err();
        assert!(err.to_string().contains("no such post"), "{}", err);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_export_returns_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = fake_docker(dir.path(), "echo '# Title'");

        let doc = exporter.export("https://medium.com/@a/post").await.unwrap();
        assert_eq!(doc.bytes(), b"# Title\n");
        assert_eq!(doc.format(), DocumentFormat::Markdown);
    }

    #[tokio::test]
    async fn test_save_raw_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medium.md");
        let doc = RawDocument::new(b"**bold**".to_vec(), DocumentFormat::Markdown);
        doc.save(&path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"**bold**");
    }
}
