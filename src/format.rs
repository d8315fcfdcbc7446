//! Trim-size catalogue for print-on-demand output.
//!
//! The catalogue is a fixed table of the trim sizes accepted by the
//! print-on-demand target.  Lookups are pure and never fail: unknown
//! identifiers fall back to the square default for physical sizing, or to a
//! synthesized "Custom" descriptor when only descriptive metadata is wanted.

/// Conversion factor between inches and PDF points.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Identifier of the trim size used when a story does not pick one.
pub const DEFAULT_FORMAT_ID: &str = "8x8";

const DEFAULT_TRIM: TrimSize = TrimSize::new(8.0, 8.0);

/// Orientation classification of a trim size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectRatio {
    /// Taller than wide.
    Portrait,
    /// Wider than tall.
    Landscape,
    /// Equal width and height.
    Square,
    /// Not derivable, e.g. for unrecognized identifiers.
    Unknown,
}

impl AspectRatio {
    /// Returns the lowercase name used in descriptors and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
            Self::Square => "square",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distribution tier of a trim size on the print-on-demand platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatTier {
    /// Widely supported book trim sizes.
    Standard,
    /// Square and landscape sizes with narrower distribution.
    Extended,
}

/// Physical page size of a trim format, stored in inches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimSize {
    width_in: f64,
    height_in: f64,
}

impl TrimSize {
    const fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
        }
    }

    /// Returns the page width in inches.
    pub fn width_in(self) -> f64 {
        self.width_in
    }

    /// Returns the page height in inches.
    pub fn height_in(self) -> f64 {
        self.height_in
    }

    /// Returns the page width in PDF points.
    pub fn width_pt(self) -> f64 {
        self.width_in * POINTS_PER_INCH
    }

    /// Returns the page height in PDF points.
    pub fn height_pt(self) -> f64 {
        self.height_in * POINTS_PER_INCH
    }

    /// Classifies the size as portrait, landscape or square.
    pub fn aspect_ratio(self) -> AspectRatio {
        if (self.width_in - self.height_in).abs() < f64::EPSILON {
            AspectRatio::Square
        } else if self.width_in < self.height_in {
            AspectRatio::Portrait
        } else {
            AspectRatio::Landscape
        }
    }
}

/// Descriptive metadata for a format identifier.
///
/// For recognized identifiers the descriptor mirrors the catalogue entry.  For
/// everything else a "Custom" descriptor is synthesized whose dimensions
/// string is the raw identifier, so callers always have something displayable.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatDescriptor {
    label: String,
    dimensions: String,
    aspect_ratio: AspectRatio,
}

impl FormatDescriptor {
    /// Returns the human-readable label, e.g. "US Trade".
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the printable dimensions string, e.g. `6" x 9"`.
    pub fn dimensions(&self) -> &str {
        &self.dimensions
    }

    /// Returns the aspect-ratio classification.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }
}

struct FormatEntry {
    id: &'static str,
    label: &'static str,
    dimensions: &'static str,
    tier: FormatTier,
    trim: TrimSize,
}

const FORMATS: &[FormatEntry] = &[
    FormatEntry {
        id: "5x8",
        label: "Digest",
        dimensions: "5\" x 8\"",
        tier: FormatTier::Standard,
        trim: TrimSize::new(5.0, 8.0),
    },
    FormatEntry {
        id: "5.5x8.5",
        label: "Trade",
        dimensions: "5.5\" x 8.5\"",
        tier: FormatTier::Standard,
        trim: TrimSize::new(5.5, 8.5),
    },
    FormatEntry {
        id: "6x9",
        label: "US Trade",
        dimensions: "6\" x 9\"",
        tier: FormatTier::Standard,
        trim: TrimSize::new(6.0, 9.0),
    },
    FormatEntry {
        id: "6.14x9.21",
        label: "Royal",
        dimensions: "6.14\" x 9.21\"",
        tier: FormatTier::Standard,
        trim: TrimSize::new(6.14, 9.21),
    },
    FormatEntry {
        id: "7x7",
        label: "Small Square",
        dimensions: "7\" x 7\"",
        tier: FormatTier::Extended,
        trim: TrimSize::new(7.0, 7.0),
    },
    FormatEntry {
        id: "8x8",
        label: "Square",
        dimensions: "8\" x 8\"",
        tier: FormatTier::Extended,
        trim: TrimSize::new(8.0, 8.0),
    },
    FormatEntry {
        id: "8x10",
        label: "Picture Book",
        dimensions: "8\" x 10\"",
        tier: FormatTier::Extended,
        trim: TrimSize::new(8.0, 10.0),
    },
    FormatEntry {
        id: "8.25x6",
        label: "Landscape",
        dimensions: "8.25\" x 6\"",
        tier: FormatTier::Extended,
        trim: TrimSize::new(8.25, 6.0),
    },
    FormatEntry {
        id: "8.5x8.5",
        label: "Large Square",
        dimensions: "8.5\" x 8.5\"",
        tier: FormatTier::Extended,
        trim: TrimSize::new(8.5, 8.5),
    },
    FormatEntry {
        id: "8.5x11",
        label: "Letter",
        dimensions: "8.5\" x 11\"",
        tier: FormatTier::Standard,
        trim: TrimSize::new(8.5, 11.0),
    },
];

fn entry(id: &str) -> Option<&'static FormatEntry> {
    FORMATS.iter().find(|candidate| candidate.id == id)
}

/// Looks up the physical size for a recognized format identifier.
pub fn trim_size(id: &str) -> Option<TrimSize> {
    entry(id).map(|found| found.trim)
}

/// Resolves a format identifier to a physical size, falling back to the
/// default square trim when the identifier is absent or unrecognized.
pub fn resolve_trim_size(id: Option<&str>) -> TrimSize {
    id.and_then(trim_size).unwrap_or(DEFAULT_TRIM)
}

/// Returns descriptive metadata for any format identifier.
pub fn describe(id: &str) -> FormatDescriptor {
    match entry(id) {
        Some(found) => FormatDescriptor {
            label: found.label.to_string(),
            dimensions: found.dimensions.to_string(),
            aspect_ratio: found.trim.aspect_ratio(),
        },
        None => FormatDescriptor {
            label: "Custom".to_string(),
            dimensions: id.to_string(),
            aspect_ratio: AspectRatio::Unknown,
        },
    }
}

/// Returns the distribution tier for a recognized identifier.
pub fn format_tier(id: &str) -> Option<FormatTier> {
    entry(id).map(|found| found.tier)
}

/// Iterates over the recognized format identifiers in catalogue order.
pub fn known_format_ids() -> impl Iterator<Item = &'static str> {
    FORMATS.iter().map(|found| found.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_ten_entries() {
        assert_eq!(known_format_ids().count(), 10);
        let standard = FORMATS
            .iter()
            .filter(|found| found.tier == FormatTier::Standard)
            .count();
        assert_eq!(standard, 5);
    }

    #[test]
    fn recognized_identifiers_resolve_exactly() {
        let descriptor = describe("6x9");
        assert_eq!(descriptor.label(), "US Trade");
        assert_eq!(descriptor.dimensions(), "6\" x 9\"");
        assert_eq!(descriptor.aspect_ratio(), AspectRatio::Portrait);

        let trim = trim_size("6x9").expect("6x9 is in the catalogue");
        assert_eq!(trim.width_pt(), 432.0);
        assert_eq!(trim.height_pt(), 648.0);
    }

    #[test]
    fn landscape_and_square_classification() {
        assert_eq!(
            describe("8.25x6").aspect_ratio(),
            AspectRatio::Landscape
        );
        assert_eq!(describe("8.5x8.5").aspect_ratio(), AspectRatio::Square);
    }

    #[test]
    fn tiers_are_exposed_for_known_identifiers_only() {
        assert_eq!(format_tier("6x9"), Some(FormatTier::Standard));
        assert_eq!(format_tier("8.25x6"), Some(FormatTier::Extended));
        assert_eq!(format_tier("9x12"), None);
    }

    #[test]
    fn unknown_identifier_yields_custom_descriptor() {
        let descriptor = describe("9x12");
        assert_eq!(descriptor.label(), "Custom");
        assert_eq!(descriptor.dimensions(), "9x12");
        assert_eq!(descriptor.aspect_ratio(), AspectRatio::Unknown);
    }

    #[test]
    fn unknown_or_absent_identifier_falls_back_to_square_default() {
        let fallback = resolve_trim_size(Some("9x12"));
        assert_eq!(fallback.width_in(), 8.0);
        assert_eq!(fallback.height_in(), 8.0);

        let absent = resolve_trim_size(None);
        assert_eq!(absent.width_in(), 8.0);
        assert_eq!(absent.height_in(), 8.0);
    }
}
