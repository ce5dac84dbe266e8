//! Filesystem side of source declarations.
//!
//! A declared path is either a single file or a directory whose files each
//! become their own namespace.

use crate::error::ConfigError;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// What a declared source path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
}

impl SourceKind {
    /// Classify `path`, failing with [`ConfigError::NotFound`] when it is neither.
    pub fn of(path: &Path) -> Result<Self, ConfigError> {
        if path.is_file() {
            Ok(SourceKind::File)
        } else if path.is_dir() {
            Ok(SourceKind::Directory)
        } else {
            Err(ConfigError::NotFound(path.to_path_buf()))
        }
    }
}

/// Check that a file can be opened or a directory listed.
pub fn ensure_readable(path: &Path) -> Result<(), ConfigError> {
    let probe = if path.is_dir() {
        fs::read_dir(path).map(drop)
    } else {
        fs::File::open(path).map(drop)
    };
    probe.map_err(|source| ConfigError::NotReadable {
        path: path.to_path_buf(),
        source,
    })
}

/// The extension a reader is selected by. Empty when the file has none.
pub fn extension(path: &Path) -> String {
    path.extension()
        .map(OsStr::to_string_lossy)
        .map(|ext| ext.into_owned())
        .unwrap_or_default()
}

/// Namespace for a file found under `root`: its relative path with
/// separators turned into `.` and the extension removed.
pub fn derive_namespace(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);

    let mut segments: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    if let Some(stem) = relative.file_stem() {
        segments.push(stem.to_string_lossy().into_owned());
    }

    segments.join(".")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Every regular file under `root` paired with its derived namespace.
///
/// Entries are visited in file name order at each level. Hidden files and
/// directories are skipped.
pub fn expand_directory(root: &Path) -> Result<Vec<(String, PathBuf)>, ConfigError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            let source = err
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop"));
            ConfigError::NotReadable { path, source }
        })?;

        if entry.file_type().is_file() {
            let path = entry.into_path();
            files.push((derive_namespace(root, &path), path));
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_source_kind() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "app.json");

        assert_eq!(SourceKind::of(temp.path()).unwrap(), SourceKind::Directory);
        assert_eq!(
            SourceKind::of(&temp.path().join("app.json")).unwrap(),
            SourceKind::File
        );
        assert!(matches!(
            SourceKind::of(&temp.path().join("missing.json")),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension(Path::new("a/b.yml")), "yml");
        assert_eq!(extension(Path::new("a/B.JSON")), "JSON");
        assert_eq!(extension(Path::new("a/Makefile")), "");
    }

    #[test]
    fn test_derive_namespace() {
        let root = Path::new("/etc/app");
        assert_eq!(derive_namespace(root, Path::new("/etc/app/a.json")), "a");
        assert_eq!(derive_namespace(root, Path::new("/etc/app/c/d.yml")), "c.d");
        assert_eq!(
            derive_namespace(root, Path::new("/etc/app/x/y/z.tar.ini")),
            "x.y.z.tar"
        );
    }

    #[test]
    fn test_expand_directory_is_sorted_and_skips_hidden() {
        let temp = TempDir::new().unwrap();
        for file in ["b.yml", "a.json", "c/d.yml", ".hidden.json", ".git/config.json"] {
            touch(temp.path(), file);
        }

        let namespaces: Vec<String> = expand_directory(temp.path())
            .unwrap()
            .into_iter()
            .map(|(namespace, _)| namespace)
            .collect();
        assert_eq!(namespaces, vec!["a", "b", "c.d"]);
    }

    #[test]
    fn test_ensure_readable() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "ok.json");

        assert!(ensure_readable(temp.path()).is_ok());
        assert!(ensure_readable(&temp.path().join("ok.json")).is_ok());
        assert!(matches!(
            ensure_readable(&temp.path().join("gone.json")),
            Err(ConfigError::NotReadable { .. })
        ));
    }
}
