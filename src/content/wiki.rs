use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::content::page::PAGE_EXTENSION;
use crate::content::Page;
use crate::errors::{Result, WikiError};
use crate::services::search_service::compare_titles;
use crate::services::{FileService, SearchOptions, SearchService};
use crate::types::SearchResult;
use crate::utils::ensure_safe_url;

/// The page collection under one root directory.
///
/// Nothing is cached: every index and search rescans the directory and
/// reloads each page.
#[derive(Debug, Clone)]
pub struct Wiki {
    root: PathBuf,
    files: FileService,
}

impl Wiki {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            files: FileService::new(root.clone()),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backing file for `url`; no I/O.
    pub fn path(&self, url: &str) -> PathBuf {
        self.root.join(format!("{}.{}", url, PAGE_EXTENSION))
    }

    pub fn exists(&self, url: &str) -> bool {
        self.path(url).is_file()
    }

    /// Loaded page, or `None` when there is no such file.
    pub fn get(&self, url: &str) -> Result<Option<Page>> {
        ensure_safe_url(url)?;
        if !self.exists(url) {
            debug!("Page '{}' not found", url);
            return Ok(None);
        }
        let mut page = Page::with_files(self.files.clone(), url);
        match page.load() {
            Ok(()) => Ok(Some(page)),
            // Removed between the existence check and the read
            Err(WikiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Unloaded handle for a page that does not exist yet; `None` if it does.
    pub fn get_bare(&self, url: &str) -> Result<Option<Page>> {
        ensure_safe_url(url)?;
        if self.exists(url) {
            debug!("Refusing bare handle for existing page '{}'", url);
            return Ok(None);
        }
        Ok(Some(Page::with_files(self.files.clone(), url)))
    }

    pub fn move_page(&self, old_url: &str, new_url: &str) -> Result<bool> {
        ensure_safe_url(old_url)?;
        ensure_safe_url(new_url)?;
        let mut page = Page::with_files(self.files.clone(), old_url);
        let moved = page.move_to(new_url)?;
        if moved {
            info!("Moved page '{}' to '{}'", old_url, new_url);
        }
        Ok(moved)
    }

    /// Remove a page; false when it did not exist.
    pub fn delete(&self, url: &str) -> Result<bool> {
        ensure_safe_url(url)?;
        if !self.exists(url) {
            return Ok(false);
        }
        Page::with_files(self.files.clone(), url).delete()?;
        Ok(true)
    }

    /// Urls of every `.md` file directly under the root
    fn urls(&self) -> Result<Vec<String>> {
        let entries = match self.files.list_directory(Path::new("")) {
            Ok(entries) => entries,
            Err(WikiError::NotFound(_)) => {
                debug!("Content root {:?} does not exist yet", self.root);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| {
                let path = Path::new(&entry.name);
                if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
                    return None;
                }
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect())
    }

    /// Every page, loaded, sorted by title (case-insensitive).
    pub fn index(&self) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        for url in self.urls()? {
            let mut page = Page::with_files(self.files.clone(), &url);
            if !page.exists() {
                continue;
            }
            match page.load() {
                Ok(()) => pages.push(page),
                Err(WikiError::NotFound(_)) => warn!("Page '{}' vanished during indexing", url),
                Err(WikiError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!("Skipping page '{}': not valid UTF-8", url)
                }
                Err(e) => return Err(e),
            }
        }
        pages.sort_by(compare_titles);
        debug!("Indexed {} pages under {:?}", pages.len(), self.root);
        Ok(pages)
    }

    /// Group pages by the value of one metadata field. Pages without the
    /// field are left out; each group keeps index order.
    pub fn index_by(&self, field: &str) -> Result<BTreeMap<String, Vec<Page>>> {
        let mut groups: BTreeMap<String, Vec<Page>> = BTreeMap::new();
        for page in self.index()? {
            let Some(value) = page.meta(field).map(str::to_string) else {
                continue;
            };
            groups.entry(value).or_default().push(page);
        }
        Ok(groups)
    }

    pub fn get_by_title(&self, title: &str) -> Result<Vec<Page>> {
        Ok(self
            .index()?
            .into_iter()
            .filter(|page| page.title() == title)
            .collect())
    }

    /// Tag token to the pages declaring it
    pub fn get_tags(&self) -> Result<BTreeMap<String, Vec<Page>>> {
        let mut tags: BTreeMap<String, Vec<Page>> = BTreeMap::new();
        for page in self.index()? {
            for tag in page.tags() {
                let group = tags.entry(tag).or_default();
                if !group.iter().any(|p| p.url() == page.url()) {
                    group.push(page.clone());
                }
            }
        }
        Ok(tags)
    }

    pub fn index_by_tag(&self, tag: &str) -> Result<Vec<Page>> {
        Ok(self.get_tags()?.remove(tag).unwrap_or_default())
    }

    pub fn search(&self, term: &str, options: SearchOptions) -> Result<Vec<SearchResult>> {
        let pages = self.index()?;
        Ok(SearchService::new(options).search(pages, term))
    }
}
