//! Single-page image layout.

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage, Rgba};
use tracing::debug;

use crate::document::{PageContext, PageSource};
use crate::error::{push_warning, PrintJobError, PrintWarning};
use crate::geometry::Rect;

/// Whether an oversized image is shrunk into the printable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    #[default]
    Fit,
    NoScale,
}

impl ScaleMode {
    pub const fn from_no_scale(no_scale: bool) -> Self {
        if no_scale {
            ScaleMode::NoScale
        } else {
            ScaleMode::Fit
        }
    }
}

/// Where an image lands on the page, plus the ratio it was scaled by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub dest: Rect,
    pub ratio: f32,
}

/// Places an image of `size` pixels (one pixel per hundredth) inside `bounds`.
pub fn plan_image((width, height): (u32, u32), bounds: Rect, mode: ScaleMode) -> ImagePlacement {
    let width = width as f32;
    let height = height as f32;
    let native = ImagePlacement {
        dest: Rect::new(bounds.x, bounds.y, width, height),
        ratio: 1.0,
    };
    if mode == ScaleMode::NoScale || width <= 0.0 || height <= 0.0 {
        return native;
    }
    if width <= bounds.width && height <= bounds.height {
        return native;
    }

    let ratio = (bounds.width / width).min(bounds.height / height);
    ImagePlacement {
        dest: Rect::new(
            bounds.x,
            bounds.y,
            (width * ratio).round(),
            (height * ratio).round(),
        ),
        ratio,
    }
}

/// An image printed as exactly one page.
#[derive(Debug, Clone)]
pub struct ImageJob {
    image: Option<RgbImage>,
    mode: ScaleMode,
}

impl ImageJob {
    pub fn new(image: RgbImage, mode: ScaleMode) -> Self {
        Self {
            image: Some(image),
            mode,
        }
    }

    /// Decodes `path`; an unreadable file becomes a warning and `None`.
    pub fn open(path: &Path, mode: ScaleMode, warnings: &mut Vec<PrintWarning>) -> Option<Self> {
        match image::open(path) {
            Ok(decoded) => Some(Self::new(flatten_onto_white(decoded), mode)),
            Err(err) => {
                push_warning(
                    warnings,
                    PrintWarning::UnreadableInput {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Decodes an in-memory image, guessing its format from the bytes.
    pub fn from_bytes(bytes: &[u8], mode: ScaleMode) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::new(flatten_onto_white(decoded), mode))
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(RgbImage::dimensions)
    }

}

/// Composites `decoded` over white paper so transparent pixels print blank.
fn flatten_onto_white(decoded: DynamicImage) -> RgbImage {
    if !decoded.color().has_alpha() {
        return decoded.into_rgb8();
    }
    let rgba = decoded.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([red, green, blue, alpha]) = *rgba.get_pixel(x, y);
        let alpha = u32::from(alpha);
        let blend = |channel: u8| {
            ((u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(red), blend(green), blend(blue)])
    })
}

/// True when `bytes` start with the signature of a decodable image format.
pub fn looks_like_image(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}

impl PageSource for ImageJob {
    fn print_page(&mut self, page: &mut PageContext<'_>) -> Result<bool, PrintJobError> {
        let Some(image) = self.image.take() else {
            return Ok(false);
        };
        let placement = plan_image(image.dimensions(), page.margin_bounds(), self.mode);
        debug!(
            ratio = placement.ratio,
            width = placement.dest.width,
            height = placement.dest.height,
            "placing image"
        );
        page.draw_image(image, placement.dest);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayCommand;
    use crate::font::StandardFontMetrics;
    use crate::geometry::{Margins, Orientation, PageGeometry, PaperKind, PaperSize};
    use proptest::prelude::*;

    fn letter_with_margins(margin: i32) -> PageGeometry {
        PageGeometry {
            paper: PaperSize::standard(PaperKind::Letter).unwrap(),
            orientation: Orientation::Portrait,
            printable_area: Rect::new(0.0, 0.0, 850.0, 1100.0),
            margins: Margins::uniform(margin),
        }
    }

    #[test]
    fn wide_image_is_fit_to_width() {
        let bounds = Rect::new(0.0, 0.0, 1700.0, 2200.0);
        let placement = plan_image((4000, 2000), bounds, ScaleMode::Fit);
        assert!((placement.ratio - 0.425).abs() < 1e-6);
        assert_eq!(placement.dest, Rect::new(0.0, 0.0, 1700.0, 850.0));
    }

    #[test]
    fn tall_image_is_fit_to_height() {
        let bounds = Rect::new(50.0, 60.0, 600.0, 900.0);
        let placement = plan_image((600, 1800), bounds, ScaleMode::Fit);
        assert!((placement.ratio - 0.5).abs() < 1e-6);
        assert_eq!(placement.dest, Rect::new(50.0, 60.0, 300.0, 900.0));
    }

    #[test]
    fn small_image_keeps_native_size() {
        let bounds = Rect::new(100.0, 100.0, 650.0, 900.0);
        let placement = plan_image((320, 240), bounds, ScaleMode::Fit);
        assert_eq!(placement.ratio, 1.0);
        assert_eq!(placement.dest, Rect::new(100.0, 100.0, 320.0, 240.0));
    }

    #[test]
    fn no_scale_ignores_the_bounds() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let placement = plan_image((4000, 2000), bounds, ScaleMode::NoScale);
        assert_eq!(placement.dest.width, 4000.0);
        assert_eq!(placement.dest.height, 2000.0);
    }

    #[test]
    fn image_job_prints_one_page_at_the_margin_origin() {
        let geometry = letter_with_margins(100);
        let mut job = ImageJob::new(RgbImage::new(1300, 900), ScaleMode::Fit);
        let mut page = PageContext::new(1, &geometry, &StandardFontMetrics);
        assert!(!job.print_page(&mut page).unwrap());
        assert_eq!(job.dimensions(), None);

        let list = page.into_display_list();
        match list.commands.as_slice() {
            [DisplayCommand::Image(placed)] => {
                assert_eq!(placed.dest, Rect::new(100.0, 100.0, 650.0, 450.0));
                assert_eq!(placed.image.dimensions(), (1300, 900));
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn unreadable_file_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        let mut warnings = Vec::new();
        assert!(ImageJob::open(&path, ScaleMode::Fit, &mut warnings).is_none());
        assert!(matches!(
            warnings.as_slice(),
            [PrintWarning::UnreadableInput { .. }]
        ));
    }

    #[test]
    fn png_bytes_are_sniffed_and_decoded() {
        let mut bytes = Vec::new();
        let image = image::DynamicImage::ImageRgb8(RgbImage::new(3, 2));
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        assert!(looks_like_image(&bytes));
        assert!(!looks_like_image(b"plain text"));
        let job = ImageJob::from_bytes(&bytes, ScaleMode::Fit).unwrap();
        assert_eq!(job.dimensions(), Some((3, 2)));
    }

    #[test]
    fn transparent_pixels_print_as_white_paper() {
        let mut source = image::RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        source.put_pixel(1, 1, Rgba([255, 0, 0, 128]));
        source.put_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(source)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();

        let mut job = ImageJob::from_bytes(&bytes, ScaleMode::Fit).unwrap();
        let flattened = job.image.take().unwrap();
        assert_eq!(*flattened.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*flattened.get_pixel(1, 1), Rgb([255, 127, 127]));
        assert_eq!(*flattened.get_pixel(2, 2), Rgb([10, 20, 30]));
    }

    proptest! {
        #[test]
        fn fitted_images_stay_inside_the_bounds(
            width in 1u32..10_000,
            height in 1u32..10_000,
            bounds_w in 1u32..2_000,
            bounds_h in 1u32..2_000,
        ) {
            let bounds = Rect::new(0.0, 0.0, bounds_w as f32, bounds_h as f32);
            let placement = plan_image((width, height), bounds, ScaleMode::Fit);
            prop_assert!(placement.dest.width <= bounds.width + 0.5);
            prop_assert!(placement.dest.height <= bounds.height + 0.5);
            prop_assert!(placement.ratio <= 1.0);
        }
    }
}
