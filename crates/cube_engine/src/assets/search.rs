//! Asset file lookup
//!
//! Files are looked up first in the install location `<exe_dir>/../share/<package>/`,
//! then in each configured directory in order.

use std::path::PathBuf;

use crate::core::config::RendererConfig;

/// Longest candidate path that will be tried
pub const MAX_PATH_LEN: usize = 4096;

/// Ordered list of directories to search for a kind of asset
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPaths {
    dirs: Vec<String>,
}

impl SearchPaths {
    /// Search `dirs` in order, without an install directory
    pub fn new(dirs: Vec<String>) -> Self {
        Self { dirs }
    }

    /// Search the install directory for `package` first, then `dirs`
    pub fn with_install_dir(package: &str, dirs: &[String]) -> Self {
        let mut all = Vec::with_capacity(dirs.len() + 1);
        if let Some(share) = install_share_dir(package) {
            all.push(share);
        }
        all.extend(dirs.iter().cloned());
        Self { dirs: all }
    }

    /// Shader search order for a renderer configuration
    pub fn shaders(config: &RendererConfig) -> Self {
        Self::with_install_dir(&config.package_name, &config.shader_dirs)
    }

    /// Texture search order for a renderer configuration
    pub fn textures(config: &RendererConfig) -> Self {
        Self::with_install_dir(&config.package_name, &config.texture_dirs)
    }

    /// Candidate paths for `name`, in search order.
    ///
    /// Candidates longer than [`MAX_PATH_LEN`] are skipped with a warning.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .filter_map(|dir| {
                let candidate = format!("{}{}", dir, name);
                if candidate.len() >= MAX_PATH_LEN {
                    log::warn!("WARNING: Path exceeds maximum length; skipping: {}", candidate);
                    None
                } else {
                    Some(PathBuf::from(candidate))
                }
            })
            .collect()
    }

    /// First existing file named `name`
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let found = self.candidates(name).into_iter().find(|path| path.is_file());
        match &found {
            Some(path) => log::debug!("Resolved {} to {:?}", name, path),
            None => log::error!("Failed to locate file: {}", name),
        }
        found
    }

    /// Directories searched, in order
    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }
}

/// `<exe_dir>/../share/<package>/` with a trailing separator
fn install_share_dir(package: &str) -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    let exe_dir = exe.parent()?;
    let share = exe_dir.join("..").join("share").join(package);
    Some(format!("{}{}", share.display(), std::path::MAIN_SEPARATOR))
}

/// Read a whole file found through `paths`
pub fn read_asset(paths: &SearchPaths, name: &str) -> Option<(PathBuf, Vec<u8>)> {
    let path = paths.find(name)?;
    match std::fs::read(&path) {
        Ok(bytes) => Some((path, bytes)),
        Err(e) => {
            log::error!("Failed to read {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cube_engine_search_{}_{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn as_prefix(dir: &Path) -> String {
        format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR)
    }

    #[test]
    fn test_first_match_wins() {
        let first = temp_dir("first");
        let second = temp_dir("second");
        std::fs::write(second.join("vert.spv"), b"second").unwrap();
        std::fs::write(first.join("frag.spv"), b"first").unwrap();
        std::fs::write(second.join("frag.spv"), b"second").unwrap();

        let paths = SearchPaths::new(vec![as_prefix(&first), as_prefix(&second)]);
        assert_eq!(paths.find("vert.spv"), Some(second.join("vert.spv")));
        assert_eq!(paths.find("frag.spv"), Some(first.join("frag.spv")));
        assert_eq!(paths.find("missing.spv"), None);

        let (_, bytes) = read_asset(&paths, "frag.spv").unwrap();
        assert_eq!(bytes, b"first");

        std::fs::remove_dir_all(first).unwrap();
        std::fs::remove_dir_all(second).unwrap();
    }

    #[test]
    fn test_overlong_candidate_is_skipped() {
        let long_dir = format!("/{}/", "x".repeat(MAX_PATH_LEN));
        let paths = SearchPaths::new(vec![long_dir, "./textures/".to_string()]);
        let candidates = paths.candidates("brick.tex");
        assert_eq!(candidates, vec![PathBuf::from("./textures/brick.tex")]);
    }

    #[test]
    fn test_install_dir_comes_first() {
        let config = RendererConfig::default();
        let paths = SearchPaths::textures(&config);
        let dirs = paths.dirs();
        assert_eq!(dirs.len(), config.texture_dirs.len() + 1);
        assert!(dirs[0].contains("share"));
        assert!(dirs[0].ends_with(&format!("{}{}", config.package_name, std::path::MAIN_SEPARATOR)));
        assert_eq!(&dirs[1..], config.texture_dirs.as_slice());
    }
}
