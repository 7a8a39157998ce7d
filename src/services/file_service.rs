use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::errors::{Result, WikiError};
use crate::types::DirEntry;
use crate::utils::last_modified;

/// Service for handling file system operations below a base directory
#[derive(Debug, Clone)]
pub struct FileService {
    base_dir: PathBuf,
}

impl FileService {
    /// Create a new file service
    pub fn new(base_dir: PathBuf) -> Self {
        debug!("Creating FileService with base directory: {:?}", base_dir);
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute location of a path relative to the base directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// List directory contents, hiding dotfiles
    pub fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let full_path = self.resolve(path);
        debug!("Listing directory: {:?} (full path: {:?})", path, full_path);

        if !full_path.exists() {
            warn!("Directory does not exist: {:?}", full_path);
            return Err(WikiError::NotFound(full_path.display().to_string()));
        }

        if !full_path.is_dir() {
            warn!("Path is not a directory: {:?}", full_path);
            return Err(WikiError::InvalidPath(full_path.display().to_string()));
        }

        let entries = fs::read_dir(&full_path).map_err(|e| {
            error!("Failed to read directory {:?}: {}", full_path, e);
            WikiError::Io(e)
        })?;

        let mut result = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let name = entry.file_name().to_string_lossy().to_string();
                    if name.starts_with('.') {
                        continue;
                    }
                    let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                    debug!("Found entry: {} (is_dir: {})", name, is_dir);
                    result.push(DirEntry {
                        name,
                        is_dir,
                    });
                }
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                }
            }
        }

        result.sort_by(|a, b| a.name.cmp(&b.name));
        info!("Listed directory {:?}, found {} entries", path, result.len());
        Ok(result)
    }

    /// Read file content
    pub fn read_file(&self, path: &Path) -> Result<String> {
        let full_path = self.resolve(path);
        debug!("Reading file: {:?} (full path: {:?})", path, full_path);

        if !full_path.is_file() {
            warn!("File does not exist: {:?}", full_path);
            return Err(WikiError::NotFound(full_path.display().to_string()));
        }

        let content = fs::read_to_string(&full_path).map_err(|e| {
            error!("Failed to read file {:?}: {}", full_path, e);
            WikiError::Io(e)
        })?;

        info!("Read file {:?}, {} bytes", path, content.len());
        Ok(content)
    }

    /// Write file content, replacing whatever was there
    pub fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let full_path = self.resolve(path);
        debug!("Writing file: {:?} (full path: {:?})", path, full_path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content).map_err(|e| {
            error!("Failed to write file {:?}: {}", full_path, e);
            WikiError::Io(e)
        })?;

        info!("Wrote file {:?}, {} bytes", path, content.len());
        Ok(())
    }

    /// Check if file exists
    pub fn file_exists(&self, path: &Path) -> bool {
        let exists = self.resolve(path).is_file();
        debug!("File exists check: {:?} -> {}", path, exists);
        exists
    }

    /// Move a file inside the base directory without replacing an existing
    /// destination. `AlreadyExists` when `to` is taken, `NotFound` when
    /// `from` is missing.
    pub fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let (full_from, full_to) = (self.resolve(from), self.resolve(to));
        // Linking fails on an existing target; rename would replace it
        match fs::hard_link(&full_from, &full_to) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!("Refusing to move {:?} onto existing {:?}", from, to);
                return Err(WikiError::AlreadyExists(full_to.display().to_string()));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WikiError::NotFound(full_from.display().to_string()));
            }
            Err(e) => {
                error!("Failed to link {:?} to {:?}: {}", full_from, full_to, e);
                return Err(WikiError::Io(e));
            }
        }
        fs::remove_file(&full_from).map_err(|e| {
            error!("Failed to unlink {:?} after moving it: {}", full_from, e);
            WikiError::Io(e)
        })?;
        info!("Renamed {:?} to {:?}", from, to);
        Ok(())
    }

    /// Remove a file, returning whether it existed
    pub fn remove_file(&self, path: &Path) -> Result<bool> {
        let full_path = self.resolve(path);
        match fs::remove_file(&full_path) {
            Ok(()) => {
                info!("Removed file {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("File already absent: {:?}", full_path);
                Ok(false)
            }
            Err(e) => {
                error!("Failed to remove file {:?}: {}", full_path, e);
                Err(WikiError::Io(e))
            }
        }
    }

    /// Last modification time formatted as RFC 3339
    pub fn modified(&self, path: &Path) -> Option<String> {
        last_modified(&self.resolve(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_overwrites() {
        let dir = tempdir().unwrap();
        let files = FileService::new(dir.path().to_path_buf());
        files.write_file(Path::new("a.md"), "first version").unwrap();
        files.write_file(Path::new("a.md"), "second").unwrap();
        assert_eq!(files.read_file(Path::new("a.md")).unwrap(), "second");
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let files = FileService::new(dir.path().to_path_buf());
        assert!(matches!(
            files.read_file(Path::new("nope.md")),
            Err(WikiError::NotFound(_))
        ));
    }

    #[test]
    fn list_hides_dotfiles_and_sorts() {
        let dir = tempdir().unwrap();
        let files = FileService::new(dir.path().to_path_buf());
        files.write_file(Path::new("b.md"), "").unwrap();
        files.write_file(Path::new("a.md"), "").unwrap();
        files.write_file(Path::new(".hidden.md"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let entries = files.list_directory(Path::new("")).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md", "sub"]);
        assert!(entries[2].is_dir);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let files = FileService::new(dir.path().to_path_buf());
        files.write_file(Path::new("x.md"), "x").unwrap();
        assert!(files.remove_file(Path::new("x.md")).unwrap());
        assert!(!files.remove_file(Path::new("x.md")).unwrap());
        assert!(!files.file_exists(Path::new("x.md")));
    }

    #[test]
    fn rename_moves_content() {
        let dir = tempdir().unwrap();
        let files = FileService::new(dir.path().to_path_buf());
        files.write_file(Path::new("a.md"), "alpha").unwrap();
        files.rename(Path::new("a.md"), Path::new("b.md")).unwrap();
        assert!(!files.file_exists(Path::new("a.md")));
        assert_eq!(files.read_file(Path::new("b.md")).unwrap(), "alpha");
    }

    #[test]
    fn rename_never_replaces_destination() {
        let dir = tempdir().unwrap();
        let files = FileService::new(dir.path().to_path_buf());
        files.write_file(Path::new("a.md"), "alpha").unwrap();
        files.write_file(Path::new("b.md"), "beta").unwrap();
        assert!(matches!(
            files.rename(Path::new("a.md"), Path::new("b.md")),
            Err(WikiError::AlreadyExists(_))
        ));
        assert_eq!(files.read_file(Path::new("a.md")).unwrap(), "alpha");
        assert_eq!(files.read_file(Path::new("b.md")).unwrap(), "beta");
    }

    #[test]
    fn rename_missing_source_is_not_found() {
        let dir = tempdir().unwrap();
        let files = FileService::new(dir.path().to_path_buf());
        assert!(matches!(
            files.rename(Path::new("ghost.md"), Path::new("b.md")),
            Err(WikiError::NotFound(_))
        ));
    }

    #[test]
    fn modified_reports_timestamp() {
        let dir = tempdir().unwrap();
        let files = FileService::new(dir.path().to_path_buf());
        files.write_file(Path::new("x.md"), "x").unwrap();
        let stamp = files.modified(Path::new("x.md")).unwrap();
        assert!(stamp.contains('T'));
    }
}
