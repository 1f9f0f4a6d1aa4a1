//! Font selection and the approximate metrics used for layout.

use crate::error::{push_warning, PrintWarning};

/// Monospace family used when the requested one is unavailable.
pub const DEFAULT_FONT_FAMILY: &str = "Courier";
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

const POINTS_PER_INCH: f32 = 72.0;
const LINE_SPACING_EM: f32 = 1.2;
const AVERAGE_ADVANCE_EM: f32 = 0.6;

/// Family name plus point size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size_pt: f32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size_pt: f32) -> Self {
        Self {
            family: family.into(),
            size_pt,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE)
    }
}

/// PDF base font a family is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseFont {
    Courier,
    Helvetica,
    TimesRoman,
}

impl BaseFont {
    pub const fn pdf_name(self) -> &'static str {
        match self {
            BaseFont::Courier => "Courier",
            BaseFont::Helvetica => "Helvetica",
            BaseFont::TimesRoman => "Times-Roman",
        }
    }
}

const FAMILY_TABLE: &[(&str, BaseFont)] = &[
    ("Courier", BaseFont::Courier),
    ("Courier New", BaseFont::Courier),
    ("Lucida Console", BaseFont::Courier),
    ("Consolas", BaseFont::Courier),
    ("Helvetica", BaseFont::Helvetica),
    ("Arial", BaseFont::Helvetica),
    ("Calibri", BaseFont::Helvetica),
    ("Times", BaseFont::TimesRoman),
    ("Times New Roman", BaseFont::TimesRoman),
];

/// Families the renderer can draw.
pub fn installed_families() -> Vec<String> {
    FAMILY_TABLE
        .iter()
        .map(|(family, _)| (*family).to_string())
        .collect()
}

/// Maps a family onto its base font, defaulting to Courier.
pub fn base_font_for(family: &str) -> BaseFont {
    FAMILY_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(family))
        .map(|(_, base)| *base)
        .unwrap_or(BaseFont::Courier)
}

/// Checks the requested family against `catalog` (case-insensitive, exact).
pub fn resolve_font(
    catalog: &[String],
    requested: &str,
    size_pt: f32,
    warnings: &mut Vec<PrintWarning>,
) -> FontSpec {
    let requested = requested.trim();
    let family = match catalog
        .iter()
        .find(|name| name.eq_ignore_ascii_case(requested))
    {
        Some(found) => found.clone(),
        None => {
            push_warning(
                warnings,
                PrintWarning::UnknownFont {
                    requested: requested.to_string(),
                    fallback: DEFAULT_FONT_FAMILY.to_string(),
                },
            );
            DEFAULT_FONT_FAMILY.to_string()
        }
    };

    let size_pt = if size_pt.is_finite() && size_pt > 0.0 {
        size_pt
    } else {
        push_warning(
            warnings,
            PrintWarning::InvalidFontSize {
                requested: size_pt.to_string(),
                fallback: DEFAULT_FONT_SIZE.to_string(),
            },
        );
        DEFAULT_FONT_SIZE
    };

    FontSpec::new(family, size_pt)
}

/// Characters per line at 120 points per inch of page width.
///
/// This is an approximation usable for wrap width only.
pub fn chars_per_line(width_hundredths: f32, size_pt: f32) -> usize {
    if size_pt <= 0.0 || width_hundredths <= 0.0 {
        return 0;
    }
    (f64::from(width_hundredths) * 12.0 / (f64::from(size_pt) * 10.0)).floor() as usize
}

/// Font measurements in hundredths of an inch.
pub trait FontMetrics {
    fn line_height(&self, font: &FontSpec) -> f32;
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;
}

/// Metrics for the PDF base fonts.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFontMetrics;

impl FontMetrics for StandardFontMetrics {
    fn line_height(&self, font: &FontSpec) -> f32 {
        font.size_pt * LINE_SPACING_EM * 100.0 / POINTS_PER_INCH
    }

    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * font.size_pt * AVERAGE_ADVANCE_EM * 100.0 / POINTS_PER_INCH
    }
}
