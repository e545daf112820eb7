//! Filesystem utilities.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove a file, if it exists.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove file: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a file by way of a sibling temporary file, so readers never observe
/// a half-written result.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    ensure_dir(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    Ok(())
}

/// Copy a list of workspace-relative files from one root to another,
/// creating parent directories as needed.
pub fn copy_files<'a>(
    from: &Path,
    to: &Path,
    files: impl IntoIterator<Item = &'a str>,
) -> Result<usize> {
    let mut copied = 0;
    for file in files {
        let src = from.join(file);
        let dst = to.join(file);
        if let Some(parent) = dst.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(&src, &dst).with_context(|| {
            format!("failed to copy {} to {}", src.display(), dst.display())
        })?;
        copied += 1;
    }
    Ok(copied)
}

/// Lexically normalize a path, resolving `.` and `..` without touching the
/// filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Get `path` relative to `base`, if it lies inside `base`.
pub fn relative_inside(base: &Path, path: &Path) -> Option<PathBuf> {
    if !path.starts_with(base) {
        return None;
    }
    pathdiff::diff_paths(path, base)
}

/// Render a relative path with forward slashes, as written into generated
/// build files and closure listings.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_files_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("from");
        let to = tmp.path().join("to");
        fs::create_dir_all(from.join("inc/deep")).unwrap();
        fs::write(from.join("inc/deep/x.h"), "#pragma once").unwrap();
        fs::write(from.join("a.c"), "int a;").unwrap();

        let n = copy_files(&from, &to, ["inc/deep/x.h", "a.c"]).unwrap();

        assert_eq!(n, 2);
        assert_eq!(
            fs::read_to_string(to.join("inc/deep/x.h")).unwrap(),
            "#pragma once"
        );
        assert!(to.join("a.c").exists());
    }

    #[test]
    fn test_copy_files_missing_source_fails() {
        let tmp = TempDir::new().unwrap();
        let err = copy_files(tmp.path(), &tmp.path().join("out"), ["missing.h"]).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.h"));
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gen/CMakeLists.txt");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/ws/inc/../inc/./x.h")),
            PathBuf::from("/ws/inc/x.h")
        );
    }

    #[test]
    fn test_relative_inside() {
        let base = Path::new("/ws/tmp");
        assert_eq!(
            relative_inside(base, Path::new("/ws/tmp/inc/x.h")),
            Some(PathBuf::from("inc/x.h"))
        );
        assert_eq!(relative_inside(base, Path::new("/usr/include/stdio.h")), None);
        assert_eq!(relative_inside(base, Path::new("/ws/tmpfoo/x.h")), None);
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("boost/config/user.hpp")), "boost/config/user.hpp");
    }
}
