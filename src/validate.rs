//! Pre-flight checks run on a story before export.
//!
//! The checks are independent and every violation is collected, so a caller
//! can show the full list in one pass.  Structural problems (missing title,
//! no pages, empty page text) are errors; the print-length recommendation is
//! a warning unless the caller opts into treating it as an error.

use crate::model::Story;

/// Minimum page count recommended by the print-on-demand target.
pub const RECOMMENDED_MIN_PAGES: usize = 24;

/// Configuration for [`validate_story_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    require_recommended_length: bool,
}

impl ValidationOptions {
    /// Creates the default options: the page-count recommendation only warns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Escalates the page-count recommendation to a hard error.
    pub fn with_required_recommended_length(mut self, required: bool) -> Self {
        self.require_recommended_length = required;
        self
    }
}

/// Collected outcome of validating a story.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    /// Returns true when no error-level violations were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the error-level violation messages in check order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Returns the advisory messages in check order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Iterates over all messages, errors first, then warnings.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .map(String::as_str)
    }
}

/// Validates a story with the default options.
pub fn validate_story(story: &Story) -> ValidationReport {
    validate_story_with(story, ValidationOptions::default())
}

/// Validates a story, collecting every violation rather than stopping at the
/// first.  Performs no I/O.
pub fn validate_story_with(story: &Story, options: ValidationOptions) -> ValidationReport {
    let mut report = ValidationReport::default();

    if story.title().trim().is_empty() {
        report
            .errors
            .push("Story title must not be empty.".to_string());
    }

    if story.pages().is_empty() {
        report
            .errors
            .push("Story must contain at least one page.".to_string());
    }

    for page in story.pages() {
        if page.text().trim().is_empty() {
            report
                .errors
                .push(format!("Page {} has no text.", page.page_number()));
        }
    }

    let page_count = story.pages().len();
    if page_count > 0 && page_count < RECOMMENDED_MIN_PAGES {
        let message = format!(
            "Story has {} pages; print editions need at least {}.",
            page_count, RECOMMENDED_MIN_PAGES
        );
        if options.require_recommended_length {
            report.errors.push(message);
        } else {
            report.warnings.push(message);
        }
    }

    report
}
