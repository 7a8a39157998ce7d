use std::path::PathBuf;

use log::{debug, info};

use crate::content::{Metadata, Processor};
use crate::errors::{Result, WikiError};
use crate::services::FileService;
use crate::utils::ensure_safe_url;

/// File extension of page files
pub const PAGE_EXTENSION: &str = "md";

/// Rendered state of a page
#[derive(Debug, Clone, Default)]
pub enum PageState {
    /// Handle only; nothing read or rendered yet
    #[default]
    Bare,
    Loaded { html: String, toc: String },
}

/// One wiki page backed by `<root>/<url>.md`
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    file_name: PathBuf,
    files: FileService,
    metadata: Metadata,
    body: String,
    state: PageState,
}

fn file_name_for(url: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", url, PAGE_EXTENSION))
}

impl Page {
    /// Unloaded handle for `url` inside `root`; `InvalidPath` unless the url
    /// names a single file directly under the root.
    pub fn new(root: impl Into<PathBuf>, url: &str) -> Result<Self> {
        ensure_safe_url(url)?;
        Ok(Self::with_files(FileService::new(root.into()), url))
    }

    pub(crate) fn with_files(files: FileService, url: &str) -> Self {
        Self {
            url: url.to_string(),
            file_name: file_name_for(url),
            files,
            metadata: Metadata::new(),
            body: String::new(),
            state: PageState::Bare,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> PathBuf {
        self.files.resolve(&self.file_name)
    }

    pub fn exists(&self) -> bool {
        self.files.file_exists(&self.file_name)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, PageState::Loaded { .. })
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Read the backing file and run it through the processor, replacing all
    /// derived state.
    pub fn load(&mut self) -> Result<()> {
        let raw = self.files.read_file(&self.file_name)?;
        self.apply(&raw);
        debug!("Loaded page '{}' ({} metadata keys)", self.url, self.metadata.len());
        Ok(())
    }

    /// Re-render from the current metadata and body without touching disk.
    pub fn render(&mut self) {
        let raw = self.serialize();
        self.apply(&raw);
    }

    fn apply(&mut self, raw: &str) {
        let processed = Processor::new(raw).process();
        self.metadata = processed.meta;
        self.body = processed.body;
        self.state = PageState::Loaded {
            html: processed.html,
            toc: processed.toc,
        };
    }

    /// Header lines, a blank line, then the body.
    pub fn serialize(&self) -> String {
        format!("{}\n{}", self.metadata, self.body)
    }

    /// Overwrite the backing file with the current metadata and body.
    pub fn save(&mut self) -> Result<()> {
        let raw = self.serialize();
        self.files.write_file(&self.file_name, &raw)?;
        self.apply(&raw);
        info!("Saved page '{}'", self.url);
        Ok(())
    }

    /// Rename the backing file. Returns false, changing nothing, when the
    /// source is missing or the destination is taken.
    pub fn move_to(&mut self, new_url: &str) -> Result<bool> {
        ensure_safe_url(new_url)?;
        let new_file = file_name_for(new_url);
        if !self.exists() {
            debug!("Cannot move '{}': source missing", self.url);
            return Ok(false);
        }
        match self.files.rename(&self.file_name, &new_file) {
            Ok(()) => {}
            Err(WikiError::AlreadyExists(_)) => {
                debug!("Cannot move '{}' to '{}': destination exists", self.url, new_url);
                return Ok(false);
            }
            Err(WikiError::NotFound(_)) => {
                debug!("Cannot move '{}': source vanished", self.url);
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
        self.url = new_url.to_string();
        self.file_name = new_file;
        Ok(true)
    }

    /// Remove the backing file; absent files are fine.
    pub fn delete(&self) -> Result<()> {
        self.files.remove_file(&self.file_name).map(|_| ())
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key)
    }

    pub fn set_meta(&mut self, key: &str, value: &str) -> Result<()> {
        self.metadata.insert(key, value)
    }

    pub fn remove_meta(&mut self, key: &str) -> Option<String> {
        self.metadata.remove(key)
    }

    /// The `title` metadata, or the url when there is none
    pub fn title(&self) -> &str {
        self.metadata.get("title").unwrap_or(&self.url)
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.metadata.insert("title", title)
    }

    pub fn tags(&self) -> Vec<String> {
        self.metadata.tags()
    }

    pub fn set_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> Result<()> {
        let joined = tags
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        self.metadata.insert("tags", &joined)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: &str) {
        self.body = body.to_string();
    }

    pub fn html(&self) -> Option<&str> {
        match &self.state {
            PageState::Loaded { html, .. } => Some(html),
            PageState::Bare => None,
        }
    }

    pub fn toc(&self) -> Option<&str> {
        match &self.state {
            PageState::Loaded { toc, .. } => Some(toc),
            PageState::Bare => None,
        }
    }

    pub fn last_modified(&self) -> Option<String> {
        self.files.modified(&self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(root: &Path, url: &str, content: &str) {
        fs::write(root.join(format!("{}.md", url)), content).unwrap();
    }

    #[test]
    fn load_populates_metadata_and_html() {
        let dir = tempdir().unwrap();
        write(dir.path(), "wiki-test-1", "title: Test1\nmod2: 1\n\n# Test File 1");
        let mut page = Page::new(dir.path(), "wiki-test-1").unwrap();
        assert!(!page.is_loaded());
        page.load().unwrap();
        assert!(page.is_loaded());
        assert_eq!(page.title(), "Test1");
        assert_eq!(page.meta("mod2"), Some("1"));
        assert_eq!(page.body(), "# Test File 1");
        assert!(page.html().unwrap().contains("<h1"));
    }

    #[test]
    fn load_missing_page_is_not_found() {
        let dir = tempdir().unwrap();
        let mut page = Page::new(dir.path(), "missing").unwrap();
        assert!(matches!(page.load(), Err(WikiError::NotFound(_))));
    }

    #[test]
    fn title_falls_back_to_url() {
        let dir = tempdir().unwrap();
        let page = Page::new(dir.path(), "some-page").unwrap();
        assert_eq!(page.title(), "some-page");
    }

    #[test]
    fn save_overwrites_instead_of_appending() {
        let dir = tempdir().unwrap();
        write(dir.path(), "wiki-test-5", "title: Test5\ntags: \n\n# Test File 5");
        let mut page = Page::new(dir.path(), "wiki-test-5").unwrap();
        page.load().unwrap();
        page.set_title("TestEdited").unwrap();
        page.save().unwrap();

        let saved = fs::read_to_string(dir.path().join("wiki-test-5.md")).unwrap();
        assert!(saved.contains("TestEdited"));
        assert!(!saved.contains("Test5"));
        assert!(saved.contains("# Test File 5"));
    }

    #[test]
    fn save_creates_new_file() {
        let dir = tempdir().unwrap();
        let mut page = Page::new(dir.path(), "wiki-test-6").unwrap();
        page.set_title("Test6").unwrap();
        page.set_body("# Test File 6");
        page.save().unwrap();

        let saved = fs::read_to_string(dir.path().join("wiki-test-6.md")).unwrap();
        assert_eq!(saved, "title: Test6\n\n# Test File 6");
        assert!(page.is_loaded());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let mut page = Page::new(dir.path(), "round").unwrap();
        page.set_title("Round Trip").unwrap();
        page.set_tags(&["one", "two"]).unwrap();
        page.set_meta("author", "me").unwrap();
        page.set_body("First paragraph.\n\nSecond paragraph.");
        page.save().unwrap();

        let mut reloaded = Page::new(dir.path(), "round").unwrap();
        reloaded.load().unwrap();
        assert_eq!(reloaded.metadata(), page.metadata());
        assert_eq!(reloaded.body(), "First paragraph.\n\nSecond paragraph.");
        assert_eq!(reloaded.tags(), vec!["one", "two"]);
    }

    #[test]
    fn save_without_metadata_round_trips() {
        let dir = tempdir().unwrap();
        let mut page = Page::new(dir.path(), "plain").unwrap();
        page.set_body("just: text\n\nmore");
        page.save().unwrap();

        let mut reloaded = Page::new(dir.path(), "plain").unwrap();
        reloaded.load().unwrap();
        assert!(reloaded.metadata().is_empty());
        assert_eq!(reloaded.body(), "just: text\n\nmore");
    }

    #[test]
    fn move_renames_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "old", "# Test Move");
        let mut page = Page::new(dir.path(), "old").unwrap();
        assert!(page.move_to("new").unwrap());
        assert_eq!(page.url(), "new");
        assert!(!dir.path().join("old.md").exists());
        assert!(dir.path().join("new.md").exists());
    }

    #[test]
    fn move_refuses_collisions_and_missing_sources() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a", "A");
        write(dir.path(), "b", "B");
        let mut page = Page::new(dir.path(), "a").unwrap();
        assert!(!page.move_to("b").unwrap());
        assert_eq!(page.url(), "a");
        assert_eq!(fs::read_to_string(dir.path().join("b.md")).unwrap(), "B");

        let mut ghost = Page::new(dir.path(), "ghost").unwrap();
        assert!(!ghost.move_to("c").unwrap());
        assert_eq!(ghost.url(), "ghost");
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        write(dir.path(), "gone", "x");
        let page = Page::new(dir.path(), "gone").unwrap();
        page.delete().unwrap();
        assert!(!page.exists());
        page.delete().unwrap();
    }

    #[test]
    fn reload_replaces_all_derived_state() {
        let dir = tempdir().unwrap();
        write(dir.path(), "changing", "title: First\nauthor: me\n\n# Old Heading\n\nold text");
        let mut page = Page::new(dir.path(), "changing").unwrap();
        page.load().unwrap();
        assert_eq!(page.meta("author"), Some("me"));
        page.load().unwrap();
        assert_eq!(page.meta("author"), Some("me"));
        assert_eq!(page.metadata().len(), 2);

        write(dir.path(), "changing", "title: Second\n\n# New Heading\n\nnew text");
        page.load().unwrap();
        assert_eq!(page.title(), "Second");
        assert_eq!(page.meta("author"), None);
        assert_eq!(page.metadata().len(), 1);
        assert_eq!(page.body(), "# New Heading\n\nnew text");
        let html = page.html().unwrap();
        assert!(html.contains("<h1 id=\"new-heading\">New Heading</h1>"));
        assert!(!html.contains("Old Heading"));
        assert!(!page.toc().unwrap().contains("old-heading"));
    }

    #[test]
    fn new_rejects_urls_outside_the_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("content");
        assert!(matches!(Page::new(&root, "../x"), Err(WikiError::InvalidPath(_))));
        assert!(matches!(Page::new(&root, "a/b"), Err(WikiError::InvalidPath(_))));
        assert!(matches!(Page::new(&root, ""), Err(WikiError::InvalidPath(_))));
        assert!(!dir.path().join("x.md").exists());
    }

    #[test]
    fn move_refuses_urls_outside_the_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("content");
        fs::create_dir(&root).unwrap();
        write(&root, "a", "A");
        let mut page = Page::new(&root, "a").unwrap();
        assert!(matches!(page.move_to("../escaped"), Err(WikiError::InvalidPath(_))));
        assert!(!dir.path().join("escaped.md").exists());
        assert!(root.join("a.md").exists());
        assert_eq!(page.url(), "a");
    }

    #[test]
    fn render_refreshes_html_from_memory() {
        let dir = tempdir().unwrap();
        let mut page = Page::new(dir.path(), "draft").unwrap();
        page.set_body("see [[other]]");
        page.render();
        assert!(page.html().unwrap().contains("<a href=\"other\">other</a>"));
        assert!(!page.exists());
    }
}
