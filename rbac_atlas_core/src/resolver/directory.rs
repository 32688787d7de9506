use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use walkdir::WalkDir;

use crate::concurrency::{CancellationToken, WorkerPool};
use crate::error::{Error, ErrorKind, Result};
use crate::model::result::{Stage, Warning};

use super::{looks_like_yaml, ResolveOptions, ResolvedSource, SourceKind};

fn has_yaml_extension(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let lower = ext.to_lowercase();
            lower == "yaml" || lower == "yml"
        }
        None => false,
    }
}

/// Depth-first directory walk. `.yaml`/`.yml` files that pass pre-validation
/// are concatenated (sorted by path) with `\n---\n` separators; everything
/// else is dropped with a [`Warning`].
pub fn resolve(
    root: &Path,
    opts: &ResolveOptions,
    token: &CancellationToken,
) -> Result<(ResolvedSource, Vec<Warning>)> {
    let mut candidate_paths: Vec<PathBuf> = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut walk_warnings: Vec<Warning> = Vec::new();

    let walker = WalkDir::new(root).follow_links(opts.follow_symlinks);
    for entry in walker {
        if token.is_cancelled() {
            return Err(ErrorKind::Cancelled.into());
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.loop_ancestor().is_some() => {
                // A followed symlink cycle. The spec breaks these by
                // tracking visited absolute paths, not by failing the walk.
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                walk_warnings.push(Warning::new(
                    Stage::Resolve,
                    format!("{}: symlink cycle detected, skipped", path),
                ));
                continue;
            }
            Err(e) => return Err(Error::from(e).into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_yaml_extension(path) {
            continue;
        }
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !visited.insert(canonical) {
            continue;
        }
        candidate_paths.push(path.to_path_buf());
    }
    candidate_paths.sort();

    let pool = WorkerPool::new(opts.concurrency.max(1));
    let reads = pool.map(candidate_paths, token, |path| {
        let bytes = fs::read(&path);
        (path, bytes)
    });

    let mut included: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    let mut skipped = 0usize;
    let mut warnings = walk_warnings;
    for (path, bytes) in reads {
        match bytes {
            Ok(bytes) if looks_like_yaml(&bytes) => included.push((path, bytes)),
            Ok(_) => {
                skipped += 1;
                warnings.push(Warning::new(
                    Stage::Resolve,
                    format!("{}: skipped, does not look like YAML", path.display()),
                ));
            }
            Err(e) => {
                skipped += 1;
                warnings.push(Warning::new(
                    Stage::Resolve,
                    format!("{}: skipped, {}", path.display(), e),
                ));
            }
        }
    }
    included.sort_by(|a, b| a.0.cmp(&b.0));

    let mut combined = Vec::new();
    for (i, (_, bytes)) in included.iter().enumerate() {
        if i > 0 {
            combined.extend_from_slice(b"\n---\n");
        }
        combined.extend_from_slice(bytes);
    }

    let mut extras = BTreeMap::new();
    extras.insert("skipped".to_string(), skipped.to_string());

    let resolved = ResolvedSource {
        kind: SourceKind::Directory,
        path: root.display().to_string(),
        size: combined.len(),
        mod_time: Utc::now(),
        extras,
        bytes: combined,
    };
    Ok((resolved, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut f = fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn concatenates_sorted_yaml_files_and_warns_on_skips() {
        let dir = std::env::temp_dir().join(format!(
            "rbac-atlas-dir-test-{:?}",
            std::thread::current().id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        write_file(&dir, "b.yaml", "kind: Role\n");
        write_file(&dir, "a.yaml", "kind: ServiceAccount\n");
        write_file(&dir, "notes.txt", "ignored, wrong extension");
        write_file(&dir, "c.yml", "just garbage with no structure");

        let opts = ResolveOptions { follow_symlinks: false, validate_yaml: true, concurrency: 1 };
        let token = CancellationToken::new();
        let (resolved, warnings) = resolve(&dir, &opts, &token).expect("should resolve");

        let text = String::from_utf8(resolved.bytes).unwrap();
        let a_pos = text.find("ServiceAccount").unwrap();
        let b_pos = text.find("kind: Role").unwrap();
        assert!(a_pos < b_pos, "a.yaml must precede b.yaml in sorted order");
        assert_eq!(resolved.extras.get("skipped").map(String::as_str), Some("1"));
        assert_eq!(warnings.len(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    #[cfg(unix)]
    fn symlink_cycle_is_broken_not_fatal() {
        use std::os::unix::fs::symlink;

        let dir = std::env::temp_dir().join(format!(
            "rbac-atlas-dir-symlink-{:?}",
            std::thread::current().id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("dir")).unwrap();

        write_file(&dir, "a.yaml", "kind: ServiceAccount\napiVersion: v1\nmetadata:\n  name: a\n");
        write_file(&dir.join("dir"), "b.yaml", "kind: Role\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: b\n");
        symlink(dir.join("dir"), dir.join("dir").join("loop")).unwrap();

        let token = CancellationToken::new();

        let follow_opts = ResolveOptions { follow_symlinks: true, validate_yaml: true, concurrency: 1 };
        let (resolved, warnings) =
            resolve(&dir, &follow_opts, &token).expect("cycle must not fail resolution");
        let text = String::from_utf8(resolved.bytes).unwrap();
        assert_eq!(text.matches("ServiceAccount").count(), 1);
        assert_eq!(text.matches("kind: Role").count(), 1);
        assert!(warnings.iter().any(|w| w.message.contains("symlink cycle")));

        let no_follow_opts = ResolveOptions { follow_symlinks: false, validate_yaml: true, concurrency: 1 };
        let (resolved, warnings) =
            resolve(&dir, &no_follow_opts, &token).expect("should resolve without following symlinks");
        let text = String::from_utf8(resolved.bytes).unwrap();
        assert_eq!(text.matches("ServiceAccount").count(), 1);
        assert_eq!(text.matches("kind: Role").count(), 1);
        assert!(warnings.is_empty());

        fs::remove_dir_all(&dir).ok();
    }
}
