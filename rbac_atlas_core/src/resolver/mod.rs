//! Source resolution: classify a source string into one
//! of three acquisition strategies and produce raw bytes plus resolver
//! metadata.

pub mod directory;
pub mod local;
pub mod remote;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::concurrency::CancellationToken;
use crate::error::{ErrorKind, Result};
use crate::model::result::Warning;

/// Which of the three resolver strategies produced a [`ResolvedSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Remote,
    Directory,
    LocalFile,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Remote => "remote",
            SourceKind::Directory => "directory",
            SourceKind::LocalFile => "localFile",
        }
    }
}

/// Raw bytes plus the small metadata envelope every resolver attaches.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub kind: SourceKind,
    pub path: String,
    pub size: usize,
    pub mod_time: DateTime<Utc>,
    /// Small string-keyed side channel: `contentType`/`finalUrl` for the
    /// remote resolver, `skipped` (pre-validation drop count) for the
    /// directory resolver, empty for the local file resolver.
    pub extras: BTreeMap<String, String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub follow_symlinks: bool,
    pub validate_yaml: bool,
    pub concurrency: usize,
}

impl Default for ResolveOptions {
    fn default() -> ResolveOptions {
        ResolveOptions { follow_symlinks: false, validate_yaml: true, concurrency: 4 }
    }
}

/// Trivial structural pre-check: reject payloads with none of the markers a
/// real YAML document always has.
pub(crate) fn looks_like_yaml(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(bytes);
    text.contains(':') || text.contains('-') || text.contains("---")
}

fn has_yaml_extension(source: &str) -> bool {
    let lower = source.to_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}

/// Classify `source` and dispatch to the matching resolver.
pub fn resolve(
    source: &str,
    opts: &ResolveOptions,
    token: &CancellationToken,
) -> Result<(ResolvedSource, Vec<Warning>)> {
    if source.starts_with("http://") || source.starts_with("https://") {
        url::Url::parse(source)
            .map_err(|e| ErrorKind::InvalidSource(format!("{}: {}", source, e)))?;
        if !has_yaml_extension(source) {
            return Err(ErrorKind::UnsupportedRemoteType(source.to_string()).into());
        }
        let resolved = remote::resolve(source)?;
        return Ok((resolved, Vec::new()));
    }

    let path = Path::new(source);
    if path.is_dir() {
        return directory::resolve(path, opts, token);
    }
    if path.is_file() && has_yaml_extension(source) {
        let resolved = local::resolve(path)?;
        return Ok((resolved, Vec::new()));
    }

    Err(ErrorKind::InvalidSource(source.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_source_without_yaml_extension_is_rejected() {
        let opts = ResolveOptions::default();
        let token = CancellationToken::new();
        let err = resolve("https://example.com/manifests.tar.gz", &opts, &token).unwrap_err();
        assert!(err.to_string().contains("not a supported yaml document"));
    }

    #[test]
    fn unknown_path_is_rejected() {
        let opts = ResolveOptions::default();
        let token = CancellationToken::new();
        let err = resolve("/no/such/path.yaml", &opts, &token).unwrap_err();
        assert!(err.to_string().contains("no resolver applies"));
    }

    #[test]
    fn looks_like_yaml_rejects_binary_garbage() {
        assert!(!looks_like_yaml(b"\x00\x01\x02\x03"));
        assert!(looks_like_yaml(b"kind: Role\n"));
    }
}
