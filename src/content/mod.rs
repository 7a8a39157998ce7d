//! Pages on disk: parsing, rendering and the indexes derived from them.

pub mod metadata;
pub mod page;
pub mod processor;
pub mod wiki;

pub use metadata::Metadata;
pub use page::{Page, PageState, PAGE_EXTENSION};
pub use processor::{Processed, Processor};
pub use wiki::Wiki;
