use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{Error, ErrorKind, Result};

use super::{looks_like_yaml, ResolvedSource, SourceKind};

/// Reads a single local YAML file, applying the same pre-validation as the
/// directory and remote resolvers.
pub fn resolve(path: &Path) -> Result<ResolvedSource> {
    let bytes = fs::read(path)
        .map_err(|e| Error::from(ErrorKind::IoError(path.display().to_string(), e.to_string())))?;

    if !looks_like_yaml(&bytes) {
        return Err(ErrorKind::InvalidYaml(
            path.display().to_string(),
            "file does not look like YAML".to_string(),
        )
        .into());
    }

    let metadata = fs::metadata(path)
        .map_err(|e| Error::from(ErrorKind::IoError(path.display().to_string(), e.to_string())))?;
    let mod_time: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(ResolvedSource {
        kind: SourceKind::LocalFile,
        path: path.display().to_string(),
        size: bytes.len(),
        mod_time,
        extras: BTreeMap::new(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_and_validates_a_yaml_file() {
        let mut file = tempfile_with_contents(b"kind: ServiceAccount\nmetadata:\n  name: foo\n");
        let resolved = resolve(file.path()).expect("should resolve");
        assert_eq!(resolved.kind, SourceKind::LocalFile);
        assert!(resolved.size > 0);
        file.close();
    }

    #[test]
    fn rejects_non_yaml_content() {
        let mut file = tempfile_with_contents(b"just some plain text with no structure");
        let err = resolve(file.path()).unwrap_err();
        assert!(err.to_string().contains("does not look like YAML"));
        file.close();
    }

    struct TempFile {
        path: std::path::PathBuf,
    }

    impl TempFile {
        fn path(&self) -> &Path {
            &self.path
        }
        fn close(&mut self) {
            let _ = fs::remove_file(&self.path);
        }
    }

    fn tempfile_with_contents(contents: &[u8]) -> TempFile {
        let mut path = std::env::temp_dir();
        path.push(format!("rbac-atlas-local-test-{:?}.yaml", std::thread::current().id()));
        let mut f = fs::File::create(&path).expect("create temp file");
        f.write_all(contents).expect("write temp file");
        TempFile { path }
    }
}
