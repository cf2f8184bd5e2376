//! Where asset files come from: a remote base URL (plain HTTP GET) or a
//! local directory.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::load::{CancelToken, Cancelled};

const CHUNK_SIZE: usize = 64 * 1024;

/// Byte-progress callback: `(loaded, total)`, `total` is `None` when the
/// transfer does not report its length.
pub type ByteProgress<'a> = &'a mut dyn FnMut(u64, Option<u64>);

/// A base location that files are fetched relative to.
pub trait AssetSource: Send + Sync {
    /// Human readable location, for logs.
    fn describe(&self) -> String;

    /// Fetch `name` (relative to the base) fully into memory.
    fn fetch(&self, name: &str, cancel: &CancelToken, progress: ByteProgress<'_>) -> Result<Vec<u8>>;
}

/// Pick a source for `base`: `http(s)://` URLs are fetched over HTTP,
/// `file://` URLs and plain paths are read from disk.
pub fn source_for(base: &str) -> Result<Box<dyn AssetSource>> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(Box::new(HttpSource::new(base)?))
    } else {
        let path = base.strip_prefix("file://").unwrap_or(base);
        Ok(Box::new(DirSource::new(path)))
    }
}

/// Copy `reader` into memory in chunks, reporting progress and honouring
/// cancellation between chunks.
fn read_chunked(
    mut reader: impl Read,
    total: Option<u64>,
    cancel: &CancelToken,
    progress: ByteProgress<'_>,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(total.unwrap_or(0).min(1 << 30) as usize);
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        let n = reader.read(&mut buf).context("Transfer interrupted")?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
        progress(out.len() as u64, total);
    }
    Ok(out)
}

pub struct HttpSource {
    base: reqwest::Url,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(base: &str) -> Result<Self> {
        // Without the trailing slash `join` would replace the last segment.
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = reqwest::Url::parse(&normalized)
            .with_context(|| format!("Invalid base URL '{normalized}'"))?;
        // No overall timeout: large downloads may legitimately take minutes.
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base, client })
    }

    pub fn url_for(&self, name: &str) -> Result<reqwest::Url> {
        self.base
            .join(name)
            .with_context(|| format!("Cannot resolve '{}' against {}", name, self.base))
    }
}

impl AssetSource for HttpSource {
    fn describe(&self) -> String {
        self.base.to_string()
    }

    fn fetch(&self, name: &str, cancel: &CancelToken, progress: ByteProgress<'_>) -> Result<Vec<u8>> {
        let url = self.url_for(name)?;
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Server rejected {url}"))?;
        let total = response.content_length();
        read_chunked(response, total, cancel, progress)
            .with_context(|| format!("Failed to download {url}"))
    }
}

pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl AssetSource for DirSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn fetch(&self, name: &str, cancel: &CancelToken, progress: ByteProgress<'_>) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        let file =
            File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        let total = file.metadata().ok().map(|m| m.len());
        read_chunked(file, total, cancel, progress)
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_urls_resolve_against_base_directory() {
        let src = HttpSource::new("https://example.com/models/tintal").expect("source");
        let url = src.url_for("textures/a b.jpg").expect("join");
        assert_eq!(url.as_str(), "https://example.com/models/tintal/textures/a%20b.jpg");
    }

    #[test]
    fn chunked_read_reports_every_chunk() {
        let data = vec![7u8; CHUNK_SIZE * 2 + 10];
        let mut calls = Vec::new();
        let out = read_chunked(
            data.as_slice(),
            Some(data.len() as u64),
            &CancelToken::new(),
            &mut |loaded, total| calls.push((loaded, total)),
        )
        .expect("read");
        assert_eq!(out, data);
        assert_eq!(calls.len(), 3);
        assert_eq!(calls.last(), Some(&(data.len() as u64, Some(data.len() as u64))));
    }

    #[test]
    fn cancelled_read_stops() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = read_chunked(&b"abc"[..], None, &cancel, &mut |_, _| {}).unwrap_err();
        assert!(err.is::<Cancelled>());
    }

    #[test]
    fn plain_paths_use_the_filesystem() {
        let src = source_for("file:///tmp/models").expect("source");
        assert_eq!(src.describe(), "/tmp/models");
    }
}
