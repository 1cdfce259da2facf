use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".cartkeep"))
            .unwrap_or_else(|| PathBuf::from(".cartkeep"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    /// Key-value document holding `priceDivsHidden` and `savedCarts`.
    pub fn storage_file(&self) -> PathBuf {
        self.base.join("storage.json")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_under_base() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::with_base(temp_dir.path().join("nested"));
        assert_eq!(paths.config_file(), temp_dir.path().join("nested/config.json"));
        assert_eq!(paths.storage_file(), temp_dir.path().join("nested/storage.json"));

        paths.ensure_dirs().unwrap();
        assert!(paths.base.is_dir());
    }
}
