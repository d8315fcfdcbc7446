//! Page outline injection built on top of `lopdf`.
//!
//! Long picture books are easier to review with a sidebar outline, so this
//! post-pass opens the rendered bytes, builds an `/Outlines` dictionary with
//! one flat entry per physical page, and points each entry at its page with a
//! `/Dest [page /Fit]` destination.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::model::Story;

/// Errors that can occur while embedding an outline into a rendered PDF.
#[derive(Debug)]
pub enum OutlineError {
    /// The PDF bytes could not be parsed or restructured by `lopdf`.
    Parse(lopdf::Error),
    /// A label referenced a page number the rendered document does not have.
    MissingPage {
        /// The requested (1-indexed) page number that could not be resolved.
        page_number: usize,
    },
}

impl From<lopdf::Error> for OutlineError {
    fn from(err: lopdf::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for OutlineError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

impl std::fmt::Display for OutlineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to restructure PDF bytes: {err}"),
            Self::MissingPage { page_number } => {
                write!(f, "Outline refers to missing page {}", page_number)
            }
        }
    }
}

impl std::error::Error for OutlineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::MissingPage { .. } => None,
        }
    }
}

/// Returns the outline labels for an exported story, in page order.
///
/// The cover (when present) is labelled "Cover"; story pages are labelled by
/// their own page numbers, which survive even when the physical position
/// shifts because a cover was skipped.
pub fn story_page_labels(story: &Story, cover_included: bool) -> Vec<String> {
    let mut labels = Vec::with_capacity(story.pages().len() + usize::from(cover_included));
    if cover_included {
        labels.push("Cover".to_string());
    }
    labels.extend(
        story
            .pages()
            .iter()
            .map(|page| format!("Page {}", page.page_number())),
    );
    labels
}

/// Embeds a flat page outline into rendered PDF bytes.
///
/// `labels` are applied to physical pages in order; an empty slice returns
/// the input unchanged.
pub fn apply_page_outline(pdf_bytes: &[u8], labels: &[String]) -> Result<Vec<u8>, OutlineError> {
    if labels.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();

    let mut entries = Vec::with_capacity(labels.len());
    for (index, label) in labels.iter().enumerate() {
        let page_number = index + 1;
        let page_ref = pages
            .get(&(page_number as u32))
            .copied()
            .ok_or(OutlineError::MissingPage { page_number })?;
        entries.push(OutlineEntry {
            object_id: document.new_object_id(),
            page_ref,
            title: label.clone(),
        });
    }

    let outlines_id = document.new_object_id();
    link_outline_entries(outlines_id, &mut document, &entries);
    insert_outlines_root(outlines_id, &mut document, &entries)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

struct OutlineEntry {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

fn link_outline_entries(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry],
) {
    for (index, entry) in entries.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", Object::string_literal(entry.title.as_str()));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(entry.page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));

        if index > 0 {
            dictionary.set("Prev", Object::Reference(entries[index - 1].object_id));
        }
        if index + 1 < entries.len() {
            dictionary.set("Next", Object::Reference(entries[index + 1].object_id));
        }

        document
            .objects
            .insert(entry.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry],
) -> Result<(), OutlineError> {
    let catalog_id = document.trailer.get(b"Root")?.as_reference()?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(entries.len() as i64));
    if let Some(first) = entries.first() {
        dictionary.set("First", Object::Reference(first.object_id));
    }
    if let Some(last) = entries.last() {
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    let catalog = document.get_object_mut(catalog_id)?.as_dict_mut()?;
    catalog.set("Outlines", Object::Reference(outlines_id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::story_page_labels;
    use crate::model::{Story, StoryPage};

    #[test]
    fn labels_include_cover_when_present() {
        let story = Story::new("My Book")
            .with_page(StoryPage::new(1, "Once"))
            .with_page(StoryPage::new(2, "Twice"));

        let labels = story_page_labels(&story, true);
        assert_eq!(labels, vec!["Cover", "Page 1", "Page 2"]);

        let labels = story_page_labels(&story, false);
        assert_eq!(labels, vec!["Page 1", "Page 2"]);
    }
}
