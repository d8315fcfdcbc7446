use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
use lopdf::{Document, Object, ObjectId};
use sha2::{Digest, Sha256};
use storybook_export::export::{RenderedExport, StoryExporter};
use storybook_export::fetch::InMemoryImageFetcher;
use storybook_export::fonts;
use storybook_export::model::{ExportOptions, Story, StoryPage};

fn placeholder_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let buffer = ImageBuffer::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb(color)
        } else {
            Rgb([255, 255, 255])
        }
    });
    let dynamic = DynamicImage::ImageRgb8(buffer);
    let mut bytes = Vec::new();
    dynamic
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("encode placeholder png");
    bytes
}

fn try_export(story: &Story, options: &ExportOptions, fetcher: InMemoryImageFetcher) -> Option<RenderedExport> {
    if !fonts::default_fonts_available() {
        eprintln!(
            "Skipping rendering assertions: no fonts found. Set STORYBOOK_FONTS_DIR or install DejaVu Sans."
        );
        return None;
    }

    let exporter = StoryExporter::with_fetcher(Box::new(fetcher));
    Some(exporter.export(story, options).expect("export story"))
}

fn loaded_document(rendered: &RenderedExport) -> Document {
    Document::load_mem(rendered.bytes()).expect("parse rendered pdf")
}

fn object_to_f64(object: &Object) -> f64 {
    match object {
        Object::Integer(value) => *value as f64,
        Object::Real(value) => *value as f64,
        other => panic!("unexpected MediaBox entry: {:?}", other),
    }
}

fn page_media_box(document: &Document, page_id: ObjectId) -> Vec<f64> {
    let mut current = page_id;
    loop {
        let dictionary = document
            .get_object(current)
            .expect("page object")
            .as_dict()
            .expect("page dictionary");

        if let Ok(media_box) = dictionary.get(b"MediaBox") {
            let media_box = match media_box {
                Object::Reference(id) => document.get_object(*id).expect("media box target"),
                other => other,
            };
            let array = media_box.as_array().expect("media box array");
            return array.iter().map(object_to_f64).collect();
        }

        let parent = dictionary
            .get(b"Parent")
            .expect("page without MediaBox has a parent")
            .as_reference()
            .expect("parent reference");
        current = parent;
    }
}

fn assert_page_dimensions(rendered: &RenderedExport, width_pt: f64, height_pt: f64) {
    let document = loaded_document(rendered);
    for (_, page_id) in document.get_pages() {
        let media_box = page_media_box(&document, page_id);
        assert_eq!(media_box.len(), 4, "MediaBox should have four entries");
        assert!(
            (media_box[2] - media_box[0] - width_pt).abs() < 0.5,
            "page width {} should be {} pt",
            media_box[2] - media_box[0],
            width_pt
        );
        assert!(
            (media_box[3] - media_box[1] - height_pt).abs() < 0.5,
            "page height {} should be {} pt",
            media_box[3] - media_box[1],
            height_pt
        );
    }
}

const SCRUBBED_SEGMENTS: &[(&[u8], u8)] = &[
    (b"/CreationDate(", b')'),
    (b"/ModDate(", b')'),
    (b"/ID[", b']'),
    (b"/Producer(", b')'),
];

const SCRUBBED_XML_TAGS: &[(&[u8], &[u8])] = &[
    (b"<xmp:CreateDate>", b"</xmp:CreateDate>"),
    (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
    (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
    (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
    (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
    (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
];

fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
    let mut index = 0;
    while index + tag.len() < data.len() {
        if data[index..].starts_with(tag) {
            let mut cursor = index + tag.len();
            while cursor < data.len() {
                let byte = data[cursor];
                if byte == terminator {
                    break;
                }
                if terminator == b')' {
                    data[cursor] = b'0';
                } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                    data[cursor] = b'0';
                }
                cursor += 1;
            }
            index = cursor;
        } else {
            index += 1;
        }
    }
}

fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
    let mut offset = 0;
    while offset + start.len() < data.len() {
        if let Some(start_pos) = data[offset..]
            .windows(start.len())
            .position(|window| window == start)
        {
            let start_index = offset + start_pos + start.len();
            if let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            {
                for byte in &mut data[start_index..start_index + end_pos] {
                    if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                        *byte = b'0';
                    }
                }
                offset = start_index + end_pos + end.len();
            } else {
                break;
            }
        } else {
            break;
        }
    }
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let mut normalized = bytes.to_vec();
    for (tag, terminator) in SCRUBBED_SEGMENTS {
        scrub_segment(&mut normalized, tag, *terminator);
    }
    for (start, end) in SCRUBBED_XML_TAGS {
        scrub_xml(&mut normalized, start, end);
    }
    let digest = Sha256::digest(&normalized);
    digest.into()
}

fn illustrated_story() -> (Story, InMemoryImageFetcher) {
    let fetcher = InMemoryImageFetcher::new();
    fetcher
        .insert("https://img.test/cover.png", placeholder_png(8, 8, [200, 40, 40]))
        .expect("register cover");
    for page in 1..=3u32 {
        fetcher
            .insert(
                format!("https://img.test/page{}.png", page),
                placeholder_png(8, 8, [40, 40, 200]),
            )
            .expect("register page image");
    }

    let story = Story::new("My Book")
        .with_cover_image_url(Some("https://img.test/cover.png".to_string()))
        .with_pdf_format(Some("6x9".to_string()))
        .with_pages((1..=3).map(|number| {
            StoryPage::new(number, format!("Page {} text", number))
                .with_image_url(Some(format!("https://img.test/page{}.png", number)))
        }));

    (story, fetcher)
}

#[test]
fn cover_and_pages_produce_expected_page_count() {
    let (story, fetcher) = illustrated_story();
    let Some(rendered) = try_export(&story, &ExportOptions::new(), fetcher) else {
        return;
    };

    assert!(rendered.cover_included());
    assert_eq!(rendered.page_count(), 4);
    assert_eq!(loaded_document(&rendered).get_pages().len(), 4);
    assert_page_dimensions(&rendered, 432.0, 648.0);
}

#[test]
fn failed_cover_is_skipped_without_a_leading_blank_page() {
    let story = Story::new("My Book")
        .with_cover_image_url(Some("https://img.test/absent.png".to_string()))
        .with_pdf_format(Some("6x9".to_string()))
        .with_page(StoryPage::new(1, "Once upon a time"))
        .with_page(StoryPage::new(2, "The end"));

    let Some(rendered) = try_export(&story, &ExportOptions::new(), InMemoryImageFetcher::new())
    else {
        return;
    };

    assert!(!rendered.cover_included());
    assert_eq!(rendered.page_count(), 2);
    assert_eq!(loaded_document(&rendered).get_pages().len(), 2);
}

#[test]
fn missing_page_image_falls_back_to_text() {
    let story = Story::new("My Book")
        .with_pdf_format(Some("6x9".to_string()))
        .with_page(
            StoryPage::new(1, "Once upon a time")
                .with_image_url(Some("https://img.test/absent.png".to_string())),
        );

    let Some(rendered) = try_export(&story, &ExportOptions::new(), InMemoryImageFetcher::new())
    else {
        return;
    };

    assert_eq!(rendered.page_count(), 1);
    assert_eq!(loaded_document(&rendered).get_pages().len(), 1);
    assert_page_dimensions(&rendered, 432.0, 648.0);
}

#[test]
fn disabled_images_render_the_same_text_only_document() {
    let fetcher = InMemoryImageFetcher::new();
    fetcher
        .insert("https://img.test/page1.png", placeholder_png(8, 8, [40, 40, 200]))
        .expect("register page image");
    let illustrated = Story::new("My Book")
        .with_pdf_format(Some("6x9".to_string()))
        .with_page(
            StoryPage::new(1, "Once upon a time")
                .with_image_url(Some("https://img.test/page1.png".to_string())),
        );
    let options = ExportOptions::new().with_include_images(false);
    let Some(with_images_off) = try_export(&illustrated, &options, fetcher) else {
        return;
    };

    let plain = Story::new("My Book")
        .with_pdf_format(Some("6x9".to_string()))
        .with_page(StoryPage::new(1, "Once upon a time"));
    let Some(text_only) = try_export(&plain, &ExportOptions::new(), InMemoryImageFetcher::new())
    else {
        return;
    };

    assert_eq!(with_images_off.page_count(), 1);
    assert_eq!(
        normalized_hash(with_images_off.bytes()),
        normalized_hash(text_only.bytes()),
        "disabling images must match a story that never had them"
    );
}

#[test]
fn empty_story_renders_a_single_blank_page() {
    let story = Story::new("My Book");
    let Some(rendered) = try_export(&story, &ExportOptions::new(), InMemoryImageFetcher::new())
    else {
        return;
    };

    assert_eq!(rendered.page_count(), 1);
    assert_eq!(loaded_document(&rendered).get_pages().len(), 1);
}

#[test]
fn landscape_format_keeps_its_stated_dimensions() {
    let story = Story::new("Wide Tales")
        .with_pdf_format(Some("8.25x6".to_string()))
        .with_page(StoryPage::new(1, "A very wide meadow"));

    let Some(rendered) = try_export(&story, &ExportOptions::new(), InMemoryImageFetcher::new())
    else {
        return;
    };

    assert_page_dimensions(&rendered, 594.0, 432.0);
}

#[test]
fn options_format_overrides_the_story_format() {
    let story = Story::new("My Book")
        .with_pdf_format(Some("6x9".to_string()))
        .with_page(StoryPage::new(1, "Once upon a time"));
    let options = ExportOptions::new().with_format(Some("8x8".to_string()));

    let Some(rendered) = try_export(&story, &options, InMemoryImageFetcher::new()) else {
        return;
    };

    assert_page_dimensions(&rendered, 576.0, 576.0);
    assert!(rendered.file_name().starts_with("My_Book_8x8_KDP_"));
}

#[test]
fn repeated_exports_differ_only_in_file_name_timestamp() {
    let (story, fetcher) = illustrated_story();
    if !fonts::default_fonts_available() {
        eprintln!(
            "Skipping rendering assertions: no fonts found. Set STORYBOOK_FONTS_DIR or install DejaVu Sans."
        );
        return;
    }

    let exporter = StoryExporter::with_fetcher(Box::new(fetcher));
    let first = exporter
        .export(&story, &ExportOptions::new())
        .expect("first export");
    let second = exporter
        .export(&story, &ExportOptions::new())
        .expect("second export");

    assert_eq!(first.page_count(), second.page_count());
    assert_eq!(
        normalized_hash(first.bytes()),
        normalized_hash(second.bytes()),
        "exports must be deterministic after metadata normalization"
    );
    assert!(first.file_name().starts_with("My_Book_6x9_KDP_"));
    assert!(second.file_name().starts_with("My_Book_6x9_KDP_"));
}

#[test]
fn export_to_dir_writes_the_named_file() {
    let story = Story::new("My Book")
        .with_pdf_format(Some("6x9".to_string()))
        .with_page(StoryPage::new(1, "Once upon a time"));

    if !fonts::default_fonts_available() {
        eprintln!(
            "Skipping rendering assertions: no fonts found. Set STORYBOOK_FONTS_DIR or install DejaVu Sans."
        );
        return;
    }

    let directory = tempfile::tempdir().expect("create temporary directory");
    let exporter = StoryExporter::with_fetcher(Box::new(InMemoryImageFetcher::new()));
    let path = exporter
        .export_to_dir(&story, &ExportOptions::new(), directory.path())
        .expect("export to directory");

    assert!(path.exists());
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .expect("written file name");
    assert!(name.starts_with("My_Book_6x9_KDP_"));
    assert!(name.ends_with(".pdf"));
    let bytes = std::fs::read(&path).expect("read written file");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn file_name_matches_the_download_pattern() {
    let story = Story::new("My Book")
        .with_pdf_format(Some("6x9".to_string()))
        .with_page(StoryPage::new(1, "Once upon a time"));

    let Some(rendered) = try_export(&story, &ExportOptions::new(), InMemoryImageFetcher::new())
    else {
        return;
    };

    let name = rendered.file_name();
    assert!(name.starts_with("My_Book_6x9_KDP_"));
    assert!(name.ends_with(".pdf"));
    let stamp = &name["My_Book_6x9_KDP_".len()..name.len() - ".pdf".len()];
    assert!(!stamp.is_empty());
    assert!(stamp.bytes().all(|byte| byte.is_ascii_digit()));
}

#[cfg(feature = "bookmarks")]
mod outline {
    use super::*;
    use storybook_export::outline::{apply_page_outline, story_page_labels};

    #[test]
    fn outline_entries_cover_every_physical_page() {
        let (story, fetcher) = illustrated_story();
        let Some(rendered) = try_export(&story, &ExportOptions::new(), fetcher) else {
            return;
        };

        let labels = story_page_labels(&story, rendered.cover_included());
        assert_eq!(labels.len(), rendered.page_count());

        let bytes = apply_page_outline(rendered.bytes(), &labels).expect("apply outline");
        let document = Document::load_mem(&bytes).expect("parse outlined pdf");

        let catalog_id = document
            .trailer
            .get(b"Root")
            .expect("trailer root")
            .as_reference()
            .expect("catalog reference");
        let catalog = document
            .get_object(catalog_id)
            .expect("catalog object")
            .as_dict()
            .expect("catalog dictionary");
        let outlines_id = catalog
            .get(b"Outlines")
            .expect("outlines entry")
            .as_reference()
            .expect("outlines reference");
        let outlines = document
            .get_object(outlines_id)
            .expect("outlines object")
            .as_dict()
            .expect("outlines dictionary");

        let count = outlines
            .get(b"Count")
            .expect("outline count")
            .as_i64()
            .expect("count integer");
        assert_eq!(count as usize, rendered.page_count());
    }
}
