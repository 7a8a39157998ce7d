//! Wikistore - file-backed wiki pages and a JSON credential store
//!
//! Pages are markdown files with a block of `key: value` metadata lines on
//! top. [`Wiki`] indexes, groups and searches them; [`UserManager`] owns the
//! `users.json` file behind [`User`] accounts.

pub mod config;
pub mod content;
pub mod errors;
pub mod logger;
pub mod services;
pub mod types;
pub mod users;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use content::{Metadata, Page, PageState, Processed, Processor, Wiki, PAGE_EXTENSION};
pub use errors::{Result, WikiError};
pub use logger::{LogOutput, Logger};
pub use services::{FileService, MarkdownService, SearchOptions, SearchService};
pub use types::{DirEntry, MarkdownResult, SearchResult};
pub use users::{AuthMethod, Credential, NewUser, User, UserManager, UserRecord, UserTable};

pub use utils::{ensure_safe_url, escape_html, slugify};
