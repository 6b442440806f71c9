//! File system path helpers.

use std::path::{Component, Path, PathBuf};

/// Absolute form of `path`: canonicalized when it exists, else joined to cwd.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Expand `~` and anchor relative paths at `root`.
pub fn expand_path(path: &Path, root: &Path) -> PathBuf {
    let expanded = match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    };
    if expanded.is_relative() {
        root.join(expanded)
    } else {
        expanded
    }
}

/// Lexically resolve `.` and `..` without touching the file system.
pub fn clean_path(path: &Path) -> PathBuf {
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

/// Whether replacing `output` wholesale would take `root` with it.
pub fn encloses(output: &Path, root: &Path) -> bool {
    clean_path(root).starts_with(clean_path(output))
}

/// `path` relative to `root` for display; unchanged when outside it.
pub fn relative_to<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_is_absolute() {
        assert!(normalize_path(Path::new("relative/file.txt")).is_absolute());
        assert_eq!(normalize_path(Path::new("/no/such/file")), PathBuf::from("/no/such/file"));
    }

    #[test]
    fn test_expand_path() {
        let root = Path::new("/project");
        assert_eq!(expand_path(Path::new("resources/js"), root), PathBuf::from("/project/resources/js"));
        assert_eq!(expand_path(Path::new("/abs"), root), PathBuf::from("/abs"));
        assert!(expand_path(Path::new("~/lib"), root).is_absolute());
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/p/public/..")), PathBuf::from("/p"));
        assert_eq!(clean_path(Path::new("/p/./a/../b")), PathBuf::from("/p/b"));
        assert_eq!(clean_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_encloses() {
        let root = Path::new("/t/proj");
        assert!(encloses(Path::new("/t/proj"), root));
        assert!(encloses(Path::new("/t"), root));
        assert!(encloses(Path::new("/t/proj/public/.."), root));
        assert!(encloses(Path::new("/"), root));
        assert!(!encloses(Path::new("/t/proj/public"), root));
        assert!(!encloses(Path::new("/t/project"), root));
        assert!(!encloses(Path::new("/t/other"), root));
    }

    #[test]
    fn test_relative_to() {
        let root = Path::new("/project");
        assert_eq!(relative_to(Path::new("/project/src/a.js"), root), Path::new("src/a.js"));
        assert_eq!(relative_to(Path::new("/elsewhere"), root), Path::new("/elsewhere"));
    }
}
