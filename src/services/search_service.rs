use std::cmp::Ordering;

use log::{debug, info};

use crate::content::Page;
use crate::types::SearchResult;

/// Characters of context kept on each side of the first body match
const EXCERPT_CONTEXT: usize = 100;

/// Which page attributes a search scans, and how
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Attributes in decreasing weight order; `title` uses the title
    /// fallback, everything else is read from metadata.
    pub attrs: Vec<String>,
    pub ignore_case: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            attrs: vec!["title".to_string(), "tags".to_string()],
            ignore_case: true,
        }
    }
}

impl SearchOptions {
    pub fn with_attrs<S: AsRef<str>>(attrs: &[S]) -> Self {
        Self {
            attrs: attrs.iter().map(|a| a.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.ignore_case = false;
        self
    }
}

/// Service for ranking pages against a search term
pub struct SearchService {
    options: SearchOptions,
}

impl SearchService {
    /// Create a new search service
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    /// Score every page and keep the ones that match, best first
    pub fn search(&self, pages: Vec<Page>, query: &str) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            debug!("Empty search query received");
            return Vec::new();
        }

        info!("Starting search for query: '{}'", query);
        let start_time = std::time::Instant::now();
        let term = self.normalize(query);

        let mut results: Vec<SearchResult> = pages
            .into_iter()
            .filter_map(|page| {
                let relevance = self.calculate_relevance(&page, &term);
                if relevance == 0 {
                    return None;
                }
                debug!("Found match in '{}' with relevance: {}", page.url(), relevance);
                let excerpt = self.generate_excerpt(page.body(), &term);
                Some(SearchResult { page, excerpt, relevance })
            })
            .collect();

        results.sort_by(|a, b| match b.relevance.cmp(&a.relevance) {
            Ordering::Equal => compare_titles(&a.page, &b.page),
            ord => ord,
        });

        info!(
            "Search completed in {}ms, found {} results",
            start_time.elapsed().as_millis(),
            results.len()
        );
        results
    }

    fn normalize(&self, text: &str) -> String {
        if self.options.ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }

    fn count(&self, haystack: &str, term: &str) -> u32 {
        let occurrences = self.normalize(haystack).matches(term).count();
        u32::try_from(occurrences).unwrap_or(u32::MAX)
    }

    /// Attribute `i` of `n` weighs `n - i + 1`; the body weighs 1.
    fn calculate_relevance(&self, page: &Page, term: &str) -> u32 {
        let n = self.options.attrs.len();
        let mut score = self.count(page.body(), term);
        for (i, attr) in self.options.attrs.iter().enumerate() {
            let value = match attr.as_str() {
                "title" => Some(page.title()),
                other => page.meta(other),
            };
            if let Some(value) = value {
                let weight = u32::try_from(n - i + 1).unwrap_or(u32::MAX);
                score = score.saturating_add(self.count(value, term).saturating_mul(weight));
            }
        }
        score
    }

    /// Snippet of the body around the first match, or its opening line
    fn generate_excerpt(&self, content: &str, term: &str) -> String {
        let chars: Vec<char> = content.chars().collect();
        let normalized: Vec<char> = self.normalize(content).chars().collect();
        let needle: Vec<char> = term.chars().collect();

        // Lowercasing can change the char count; only trust positions when it doesn't.
        let position = if normalized.len() == chars.len() && !needle.is_empty() {
            normalized.windows(needle.len()).position(|w| w == needle.as_slice())
        } else {
            None
        };

        match position {
            Some(pos) => {
                let start = pos.saturating_sub(EXCERPT_CONTEXT);
                let end = (pos + needle.len() + EXCERPT_CONTEXT).min(chars.len());
                let excerpt: String = chars[start..end].iter().collect();
                let excerpt = excerpt.trim();
                match (start > 0, end < chars.len()) {
                    (true, true) => format!("...{}...", excerpt),
                    (true, false) => format!("...{}", excerpt),
                    (false, true) => format!("{}...", excerpt),
                    (false, false) => excerpt.to_string(),
                }
            }
            None => content
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty() && !line.starts_with('#'))
                .map(|line| {
                    if line.chars().count() > 50 {
                        format!("{}...", line.chars().take(50).collect::<String>())
                    } else {
                        line.to_string()
                    }
                })
                .unwrap_or_default(),
        }
    }
}

/// Case-insensitive title order, url as tie-breaker
pub(crate) fn compare_titles(a: &Page, b: &Page) -> Ordering {
    a.title()
        .to_lowercase()
        .cmp(&b.title().to_lowercase())
        .then_with(|| a.url().cmp(b.url()))
}
