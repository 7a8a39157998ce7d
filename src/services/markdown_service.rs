use std::collections::HashMap;

use log::debug;
use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::types::MarkdownResult;
use crate::utils::{escape_attr, escape_html, slugify};

/// Heading collected during the first pass: (level, id, text)
type Heading = (u32, String, String);

/// Service for handling markdown rendering
#[derive(Debug, Clone)]
pub struct MarkdownService {
    options: Options,
    with_toc: bool,
}

impl MarkdownService {
    /// Create a new markdown service
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options, with_toc: true }
    }

    /// Skip table of contents generation
    pub fn without_toc(mut self) -> Self {
        self.with_toc = false;
        self
    }

    /// Render markdown with heading anchors and, unless disabled, a table of contents
    pub fn render(&self, content: &str) -> MarkdownResult {
        let headings = self.collect_headings(content);

        // Second pass: inject ids
        let mut out = String::with_capacity(content.len() * 2);
        let mut ids = headings.iter();
        let mut closing_stack: Vec<u32> = Vec::new();
        for ev in Parser::new_ext(content, self.options) {
            match ev {
                Event::Start(Tag::Heading { level, .. }) => {
                    let lvl = heading_level_to_u32(level);
                    let id = ids.next().map(|(_, id, _)| id.as_str()).unwrap_or("");
                    out.push_str(&format!("<h{} id=\"{}\">", lvl, escape_attr(id)));
                    closing_stack.push(lvl);
                }
                Event::End(TagEnd::Heading(_)) => {
                    let lvl = closing_stack.pop().unwrap_or(1);
                    out.push_str(&format!("</h{}>\n", lvl));
                }
                _ => html::push_html(&mut out, std::iter::once(ev)),
            }
        }

        let toc = if self.with_toc { build_toc_html(&headings) } else { String::new() };
        debug!("Rendered {} bytes of markdown, {} headings", content.len(), headings.len());
        MarkdownResult { html: out, toc }
    }

    /// First pass: collect headings with unique ids
    fn collect_headings(&self, content: &str) -> Vec<Heading> {
        let mut headings = Vec::new();
        let mut in_heading: Option<u32> = None;
        let mut buf = String::new();
        let mut id_counts: HashMap<String, usize> = HashMap::new();

        for ev in Parser::new_ext(content, self.options) {
            match ev {
                Event::Start(Tag::Heading { level, .. }) => {
                    in_heading = Some(heading_level_to_u32(level));
                    buf.clear();
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(lvl) = in_heading.take() {
                        let mut id = slugify(&buf);
                        if id.is_empty() {
                            id = format!("h{}", lvl);
                        }
                        let count = id_counts.entry(id.clone()).or_insert(0);
                        if *count > 0 {
                            id = format!("{}-{}", id, *count);
                        }
                        *count += 1;
                        headings.push((lvl, id, buf.clone()));
                    }
                    buf.clear();
                }
                Event::Text(t) | Event::Code(t) => {
                    if in_heading.is_some() {
                        buf.push_str(&t);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if in_heading.is_some() {
                        buf.push(' ');
                    }
                }
                _ => {}
            }
        }
        headings
    }
}

impl Default for MarkdownService {
    fn default() -> Self {
        Self::new()
    }
}

/// Build HTML for the Table of Contents
fn build_toc_html(headings: &[Heading]) -> String {
    if headings.is_empty() {
        return String::new();
    }
    let mut html = String::new();
    html.push_str("<nav class=\"toc\"><div class=\"toc-title\">Contents</div>");
    let mut current = 0u32;
    for (level, id, title) in headings {
        while current < *level {
            html.push_str("<ul>");
            current += 1;
        }
        while current > *level {
            html.push_str("</ul>");
            current -= 1;
        }
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>",
            escape_attr(id),
            escape_html(title)
        ));
    }
    while current > 0 {
        html.push_str("</ul>");
        current -= 1;
    }
    html.push_str("</nav>");
    html
}

/// Convert heading level to u32
fn heading_level_to_u32(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
