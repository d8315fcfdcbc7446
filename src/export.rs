//! Story export pipeline.
//!
//! Turns a [`Story`] into a print-ready PDF: one full-bleed illustration per
//! page, text fallback when an illustration cannot be loaded, and a file name
//! that encodes the title, trim size and export time.  Image loads happen one
//! at a time in story order, because page construction order determines the
//! page order of the finished document.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use genpdf::elements::{PageBreak, Paragraph};
use genpdf::style::Style;
use genpdf::{Element, Margins, Size};
use log::{debug, info, warn};

use crate::elements::{self, FullBleedImage};
use crate::fetch::{FetchError, HttpImageFetcher, ImageFetcher};
use crate::fonts;
use crate::format::{self, TrimSize, DEFAULT_FORMAT_ID};
use crate::model::{ExportOptions, Story};

#[cfg(feature = "hyphenation")]
use hyphenation::Standard;

/// Font size used for fallback narration text.
const FALLBACK_FONT_SIZE: u8 = 16;

/// Horizontal inset, in points, applied to each side of fallback text.
const TEXT_INSET_PT: f64 = 20.0;

/// Distance, in points, between the page top and the first fallback line.
const TEXT_TOP_PT: f64 = 30.0;

/// Errors surfaced by the export pipeline.
///
/// Per-image failures never appear here; they downgrade the affected page to
/// text and the export continues.
#[derive(Debug)]
pub enum ExportError {
    /// No usable default font family could be loaded.
    FontLoad(genpdf::error::Error),
    /// The document could not be rendered to bytes.
    Render(genpdf::error::Error),
    /// The rendered file could not be written to disk.
    Io(std::io::Error),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad(err) => write!(f, "Failed to load export fonts: {err}"),
            Self::Render(err) => write!(f, "Failed to render story document: {err}"),
            Self::Io(err) => write!(f, "Failed to write exported file: {err}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Render(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

enum ImageLoadError {
    Fetch(FetchError),
    Decode(genpdf::error::Error),
}

impl fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(err) => err.fmt(f),
            Self::Decode(err) => err.fmt(f),
        }
    }
}

/// Outcome of a successful export.
#[derive(Clone, Debug)]
pub struct RenderedExport {
    bytes: Vec<u8>,
    page_count: usize,
    cover_included: bool,
    file_name: String,
}

impl RenderedExport {
    /// Returns the rendered PDF bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the export and returns the rendered PDF bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the number of physical pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Returns whether a cover page made it into the document.
    pub fn cover_included(&self) -> bool {
        self.cover_included
    }

    /// Returns the generated download file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Exporter that renders stories into PDF documents.
///
/// Each export call builds an independent document; the exporter itself holds
/// no per-export state and can be shared.  Concurrent calls are not guarded
/// against each other; callers that must serialize downloads do so themselves.
pub struct StoryExporter {
    fetcher: Box<dyn ImageFetcher>,
    #[cfg(feature = "hyphenation")]
    hyphenator: Option<Standard>,
}

impl Default for StoryExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryExporter {
    /// Creates an exporter that fetches illustrations over HTTP.
    pub fn new() -> Self {
        Self::with_fetcher(Box::new(HttpImageFetcher::new()))
    }

    /// Creates an exporter with a custom illustration source.
    pub fn with_fetcher(fetcher: Box<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            #[cfg(feature = "hyphenation")]
            hyphenator: None,
        }
    }

    /// Enables hyphenation for fallback text using the provided dictionary.
    #[cfg(feature = "hyphenation")]
    pub fn with_hyphenator(mut self, hyphenator: Standard) -> Self {
        self.hyphenator = Some(hyphenator);
        self
    }

    /// Renders the story to PDF bytes.
    ///
    /// Illustration failures degrade the affected page to text; only font and
    /// document-level failures abort the export.
    pub fn export(
        &self,
        story: &Story,
        options: &ExportOptions,
    ) -> Result<RenderedExport, ExportError> {
        let format_id = options
            .format()
            .or_else(|| story.pdf_format())
            .unwrap_or(DEFAULT_FORMAT_ID);
        let trim = format::resolve_trim_size(Some(format_id));
        let descriptor = format::describe(format_id);
        debug!(
            "Exporting '{}' at {} ({}, {}) via {}",
            story.title(),
            format_id,
            descriptor.label(),
            descriptor.aspect_ratio(),
            self.fetcher.name()
        );

        let mut document = self.new_document(story, trim)?;
        let page_size = trim_paper_size(trim);
        let mut drawn = 0usize;
        let mut cover_included = false;

        if let Some(url) = story.cover_image_url() {
            match self.load_full_bleed_image(url, page_size) {
                Ok(cover) => {
                    document.push(cover);
                    drawn += 1;
                    cover_included = true;
                    info!("Cover page added from {}", url);
                }
                Err(err) => {
                    warn!("Cover image {} could not be loaded: {}. Continuing without a cover.", url, err);
                }
            }
        }

        for page in story.pages() {
            if drawn > 0 {
                document.push(PageBreak::new());
            }

            let mut illustrated = false;
            if options.include_images() {
                if let Some(url) = page.image_url() {
                    match self.load_full_bleed_image(url, page_size) {
                        Ok(illustration) => {
                            document.push(illustration);
                            illustrated = true;
                        }
                        Err(err) => {
                            warn!(
                                "Illustration {} for page {} could not be loaded: {}. Falling back to text.",
                                url,
                                page.page_number(),
                                err
                            );
                        }
                    }
                }
            }

            if !illustrated {
                document.push(fallback_text(page.text()));
            }
            drawn += 1;
        }

        if drawn == 0 {
            // A story with no cover and no pages still yields one blank page.
            document.push(Paragraph::new(""));
            drawn = 1;
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ExportError::Render)?;

        let file_name = export_file_name(story.title(), format_id, Utc::now().timestamp_millis());
        info!(
            "Rendered '{}' to {} pages ({} bytes) as {}",
            story.title(),
            drawn,
            bytes.len(),
            file_name
        );

        Ok(RenderedExport {
            bytes,
            page_count: drawn,
            cover_included,
            file_name,
        })
    }

    /// Renders the story and writes it under the generated file name in
    /// `directory`, returning the full path of the written file.
    pub fn export_to_dir(
        &self,
        story: &Story,
        options: &ExportOptions,
        directory: &Path,
    ) -> Result<PathBuf, ExportError> {
        let rendered = self.export(story, options)?;
        fs::create_dir_all(directory)?;
        let path = directory.join(rendered.file_name());
        fs::write(&path, rendered.bytes())?;
        Ok(path)
    }

    fn new_document(&self, story: &Story, trim: TrimSize) -> Result<genpdf::Document, ExportError> {
        let family = fonts::default_font_family().map_err(ExportError::FontLoad)?;
        let mut document = genpdf::Document::new(family);
        document.set_title(story.title());
        document.set_paper_size(trim_paper_size(trim));

        #[cfg(feature = "hyphenation")]
        if let Some(hyphenator) = &self.hyphenator {
            document.set_hyphenator(hyphenator.clone());
        }

        Ok(document)
    }

    fn load_full_bleed_image(
        &self,
        url: &str,
        page_size: Size,
    ) -> Result<FullBleedImage, ImageLoadError> {
        let bytes = self.fetcher.fetch(url).map_err(ImageLoadError::Fetch)?;
        FullBleedImage::from_bytes(bytes, page_size).map_err(ImageLoadError::Decode)
    }
}

fn trim_paper_size(trim: TrimSize) -> Size {
    Size::new(
        elements::mm_from_f64(trim.width_in() * elements::MM_PER_INCH),
        elements::mm_from_f64(trim.height_in() * elements::MM_PER_INCH),
    )
}

fn pt_to_mm(points: f64) -> f64 {
    points * elements::MM_PER_INCH / format::POINTS_PER_INCH
}

fn fallback_text(text: &str) -> impl Element {
    Paragraph::new(text)
        .styled(Style::new().with_font_size(FALLBACK_FONT_SIZE))
        .padded(Margins::trbl(
            elements::mm_from_f64(pt_to_mm(TEXT_TOP_PT)),
            elements::mm_from_f64(pt_to_mm(TEXT_INSET_PT)),
            elements::mm_from_f64(0.0),
            elements::mm_from_f64(pt_to_mm(TEXT_INSET_PT)),
        ))
}

/// Builds the download file name for an export.
///
/// Every non-alphanumeric character in the title and format identifier is
/// replaced with an underscore; the millisecond timestamp keeps repeated
/// exports of the same story distinct.
pub fn export_file_name(title: &str, format_id: &str, timestamp_ms: i64) -> String {
    format!(
        "{}_{}_KDP_{}.pdf",
        sanitize_component(title),
        sanitize_component(format_id),
        timestamp_ms
    )
}

fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect()
}
