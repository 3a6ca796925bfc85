use std::path::{Path, PathBuf};

/// Maps a script path as written by the caller to one on disk
pub trait PathResolver {
    fn resolve(&self, path: &Path) -> PathBuf;
}

/// Resolves relative paths against a base directory
#[derive(Debug, Clone)]
pub struct BasePathResolver {
    base: PathBuf,
}

impl BasePathResolver {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base: base.into() }
    }

    /// Base is the directory holding `file`
    pub fn sibling_of<P: AsRef<Path>>(file: P) -> Self {
        let base = file
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl PathResolver for BasePathResolver {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}
