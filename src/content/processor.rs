//! Raw page text to metadata and HTML.
//!
//! The pipeline is split → meta → pre → markdown → post. Every stage keeps
//! its output on the [`Processor`] so each can be run and inspected alone.

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::content::Metadata;
use crate::services::MarkdownService;

static META_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:]+):(.*)$").expect("valid metadata line regex"));

static WIKI_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\[\]|]+?)(?:\|([^\[\]|]+?))?\]\]").expect("valid wiki link regex")
});

/// Rendered code spans and blocks; link syntax inside them stays literal
static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<code[^>]*>.*?</code>").expect("valid code span regex"));

/// Final output of a full pipeline run
#[derive(Debug, Clone, Default)]
pub struct Processed {
    pub meta: Metadata,
    pub html: String,
    pub toc: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Processor {
    pub raw: String,
    pub meta_raw: String,
    pub markdown: String,
    pub meta: Metadata,
    pub html: String,
    pub toc: String,
    pub final_html: String,
    markdown_service: MarkdownService,
}

impl Processor {
    pub fn new(raw: &str) -> Self {
        Self::with_markdown_service(raw, MarkdownService::new())
    }

    /// Render through `markdown_service`, e.g. one built `without_toc()`
    pub fn with_markdown_service(raw: &str, markdown_service: MarkdownService) -> Self {
        Self {
            raw: raw.replace("\r\n", "\n"),
            meta_raw: String::new(),
            markdown: String::new(),
            meta: Metadata::new(),
            html: String::new(),
            toc: String::new(),
            final_html: String::new(),
            markdown_service,
        }
    }

    /// Split on the first blank line into the metadata block and the markdown block.
    pub fn split_raw(&mut self) -> &mut Self {
        let mut offset = 0;
        let mut split = None;
        for line in self.raw.split_inclusive('\n') {
            if line.trim().is_empty() {
                split = Some((offset, offset + line.len()));
                break;
            }
            offset += line.len();
        }

        match split {
            Some((meta_end, body_start)) => {
                self.meta_raw = self.raw[..meta_end].trim().to_string();
                self.markdown = self.raw[body_start..].trim().to_string();
            }
            None => {
                self.meta_raw.clear();
                self.markdown = self.raw.trim().to_string();
            }
        }
        self
    }

    /// Parse `key: value` lines; anything else is skipped.
    pub fn process_meta(&mut self) -> &mut Self {
        self.meta = Metadata::new();
        for line in self.meta_raw.lines() {
            let Some(caps) = META_LINE_RE.captures(line) else {
                if !line.trim().is_empty() {
                    debug!("Skipping metadata line without a key: {:?}", line);
                }
                continue;
            };
            let key = caps[1].trim();
            if key.is_empty() {
                continue;
            }
            self.meta
                .set_unchecked(key.to_string(), caps[2].trim().to_string());
        }
        self
    }

    /// Markdown preprocessing hook; no preprocessors are registered.
    pub fn process_pre(&mut self) -> &mut Self {
        self
    }

    pub fn process_markdown(&mut self) -> &mut Self {
        let result = self.markdown_service.render(&self.markdown);
        self.html = result.html;
        self.toc = result.toc;
        self
    }

    /// Rewrite `[[target]]` and `[[display|target]]` into anchors, leaving
    /// code spans and blocks untouched.
    pub fn process_post(&mut self) -> &mut Self {
        let mut out = String::with_capacity(self.html.len());
        let mut last = 0;
        for code in CODE_RE.find_iter(&self.html) {
            out.push_str(&link_wiki_refs(&self.html[last..code.start()]));
            out.push_str(code.as_str());
            last = code.end();
        }
        out.push_str(&link_wiki_refs(&self.html[last..]));
        self.final_html = out;
        self
    }

    /// Run every stage in order.
    pub fn process(mut self) -> Processed {
        self.split_raw()
            .process_meta()
            .process_pre()
            .process_markdown()
            .process_post();
        Processed {
            meta: self.meta,
            html: self.final_html,
            toc: self.toc,
            body: self.markdown,
        }
    }
}

fn link_wiki_refs(html: &str) -> String {
    WIKI_LINK_RE
        .replace_all(html, |caps: &Captures| {
            let first = caps[1].trim();
            let (display, target) = match caps.get(2) {
                Some(target) => (first, target.as_str().trim()),
                None => (first, first),
            };
            format!("<a href=\"{}\">{}</a>", target, display)
        })
        .into_owned()
}
