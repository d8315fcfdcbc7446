//! Data structures describing a storybook handed to the export pipeline.
//!
//! The types in this module form a plain, read-only model supplied by the
//! caller.  They intentionally avoid referencing the rendering crate so the
//! values can be produced by frontends or service layers without pulling in
//! heavy dependencies.  The pipeline never mutates a story; every export call
//! reads the same value and builds an independent document.

/// A complete storybook: title, ordered pages and optional cover artwork.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Story {
    title: String,
    pages: Vec<StoryPage>,
    cover_image_url: Option<String>,
    pdf_format: Option<String>,
}

impl Story {
    /// Creates a story with the given title and no pages.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns the story title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the pages in reading order.
    pub fn pages(&self) -> &[StoryPage] {
        &self.pages
    }

    /// Returns the cover illustration URL, if any.
    pub fn cover_image_url(&self) -> Option<&str> {
        self.cover_image_url.as_deref()
    }

    /// Returns the selected trim-size identifier, if any.
    pub fn pdf_format(&self) -> Option<&str> {
        self.pdf_format.as_deref()
    }

    /// Sets the cover illustration URL and returns the updated story.
    pub fn with_cover_image_url(mut self, url: impl Into<Option<String>>) -> Self {
        self.cover_image_url = url.into();
        self
    }

    /// Sets the trim-size identifier and returns the updated story.
    pub fn with_pdf_format(mut self, format: impl Into<Option<String>>) -> Self {
        self.pdf_format = format.into();
        self
    }

    /// Appends a page and returns the updated story.
    pub fn with_page(mut self, page: StoryPage) -> Self {
        self.pages.push(page);
        self
    }

    /// Extends the story with multiple pages and returns the updated instance.
    pub fn with_pages<I>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = StoryPage>,
    {
        self.pages.extend(pages);
        self
    }
}

/// A single storybook page: its number, narration text and optional artwork.
///
/// Page numbers start at 1 and are only used for messages and outline labels;
/// the output order is the order pages appear in [`Story::pages`].
#[derive(Clone, Debug, PartialEq)]
pub struct StoryPage {
    page_number: u32,
    text: String,
    image_url: Option<String>,
}

impl StoryPage {
    /// Creates a page with the given number and narration text.
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            image_url: None,
        }
    }

    /// Returns the 1-based page number.
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Returns the narration text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the illustration URL, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Sets the illustration URL and returns the updated page.
    pub fn with_image_url(mut self, url: impl Into<Option<String>>) -> Self {
        self.image_url = url.into();
        self
    }
}

/// Four-sided page margins in millimetres.
///
/// Margins are part of the export options for callers that post-process the
/// file; trim pages themselves render full-bleed, so these values are carried
/// but not applied during rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageMargins {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

impl PageMargins {
    /// Creates margins from the four sides, in millimetres.
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Returns the top margin in millimetres.
    pub fn top(self) -> f64 {
        self.top
    }

    /// Returns the right margin in millimetres.
    pub fn right(self) -> f64 {
        self.right
    }

    /// Returns the bottom margin in millimetres.
    pub fn bottom(self) -> f64 {
        self.bottom
    }

    /// Returns the left margin in millimetres.
    pub fn left(self) -> f64 {
        self.left
    }
}

/// Per-export configuration passed alongside a story.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    format: Option<String>,
    include_images: bool,
    margins: PageMargins,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: None,
            include_images: true,
            margins: PageMargins::default(),
        }
    }
}

impl ExportOptions {
    /// Creates options with images enabled and no format override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the trim-size override, if any.
    ///
    /// When set, this takes precedence over [`Story::pdf_format`].
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Returns whether page illustrations are embedded.
    pub fn include_images(&self) -> bool {
        self.include_images
    }

    /// Returns the configured page margins.
    pub fn margins(&self) -> PageMargins {
        self.margins
    }

    /// Sets the trim-size override and returns the updated options.
    pub fn with_format(mut self, format: impl Into<Option<String>>) -> Self {
        self.format = format.into();
        self
    }

    /// Enables or disables illustration embedding and returns the options.
    pub fn with_include_images(mut self, include_images: bool) -> Self {
        self.include_images = include_images;
        self
    }

    /// Sets the page margins and returns the updated options.
    pub fn with_margins(mut self, margins: PageMargins) -> Self {
        self.margins = margins;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ExportOptions, PageMargins, Story, StoryPage};

    #[test]
    fn story_builder_preserves_page_order() {
        let story = Story::new("A Walk in the Woods")
            .with_page(StoryPage::new(1, "Once"))
            .with_page(StoryPage::new(2, "Twice"));

        let numbers: Vec<u32> = story.pages().iter().map(StoryPage::page_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn options_default_to_embedding_images() {
        let options = ExportOptions::new();
        assert!(options.include_images());
        assert!(options.format().is_none());
    }

    #[test]
    fn margins_are_carried_verbatim() {
        let margins = PageMargins::new(10.0, 12.0, 10.0, 12.0);
        let options = ExportOptions::new().with_margins(margins);
        assert_eq!(options.margins(), margins);
        assert_eq!(options.margins().right(), 12.0);
    }

    #[test]
    fn page_image_url_is_optional() {
        let page = StoryPage::new(1, "Hello");
        assert!(page.image_url().is_none());

        let page = page.with_image_url(Some("https://example.com/p1.png".to_string()));
        assert_eq!(page.image_url(), Some("https://example.com/p1.png"));
    }
}
