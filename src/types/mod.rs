use crate::content::Page;

/// Directory entry information
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Search result information
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub page: Page,
    pub excerpt: String,
    pub relevance: u32,
}

/// Markdown rendering result
#[derive(Debug, Clone, Default)]
pub struct MarkdownResult {
    pub html: String,
    pub toc: String,
}
