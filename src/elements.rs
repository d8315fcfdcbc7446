//! Rendering primitives built on top of `genpdf`.
//!
//! This module adds helpers for decoding illustration bytes and a custom
//! element that stretches an image edge-to-edge over a page of known size,
//! which the upstream crate does not ship with.

use image::GenericImageView;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{render, Element, Mm, RenderResult, Scale, Size};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
pub(crate) const MM_PER_INCH: f64 = 25.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Decodes an illustration from in-memory bytes with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<image::DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode illustration bytes")
}

fn image_from_dynamic(image: image::DynamicImage) -> Result<(Image, Size), Error> {
    let size = estimated_image_size(&image, DEFAULT_IMAGE_DPI);
    let image = Image::from_dynamic_image(image)?;
    Ok((image, size))
}

/// An illustration stretched to exactly cover a page of known dimensions.
///
/// The element rescales the image so it spans the target size edge to edge
/// with no margin.  Width and height scale independently; a mismatched aspect
/// ratio stretches the artwork rather than leaving uncovered paper, matching
/// how print covers and interior art are laid out.
pub struct FullBleedImage {
    image: Image,
    natural_size: Size,
    target_size: Size,
}

impl FullBleedImage {
    fn new(image: Image, natural_size: Size, target_size: Size) -> Self {
        let mut element = Self {
            image,
            natural_size,
            target_size,
        };
        element.apply_scale();
        element
    }

    /// Creates a full-bleed element from an already decoded image.
    pub fn from_dynamic_image(
        image: image::DynamicImage,
        target_size: Size,
    ) -> Result<Self, Error> {
        let (image, natural_size) = image_from_dynamic(image)?;
        Ok(Self::new(image, natural_size, target_size))
    }

    /// Creates a full-bleed element from still-encoded image bytes.
    pub fn from_bytes(bytes: impl AsRef<[u8]>, target_size: Size) -> Result<Self, Error> {
        let dynamic = decode_image_from_bytes(bytes)?;
        Self::from_dynamic_image(dynamic, target_size)
    }

    /// Returns the size the element covers when rendered.
    pub fn target_size(&self) -> Size {
        self.target_size
    }

    fn apply_scale(&mut self) {
        let natural_width = mm_to_f64(self.natural_size.width);
        let natural_height = mm_to_f64(self.natural_size.height);
        if natural_width <= f64::EPSILON || natural_height <= f64::EPSILON {
            return;
        }

        let scale_x = mm_to_f64(self.target_size.width) / natural_width;
        let scale_y = mm_to_f64(self.target_size.height) / natural_height;
        self.image.set_scale(Scale::new(scale_x, scale_y));
    }
}

impl Element for FullBleedImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        self.apply_scale();
        self.image.render(context, area, style)
    }
}
