//! Maps spooled display lists onto oxidize-pdf pages.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use oxidize_pdf::{Document, Font, Image, Page};
use thiserror::Error;

use crate::display::{DisplayCommand, GlyphRun, PlacedImage, PrintDisplayList};
use crate::font::{base_font_for, BaseFont};
use crate::geometry::PageGeometry;

const POINTS_PER_HUNDREDTH: f64 = 0.72;
const CREATOR: &str = "outprinter";
const JPEG_QUALITY: u8 = 92;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("document has no pages")]
    NoPages,
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to build pdf: {0}")]
    Document(#[from] oxidize_pdf::PdfError),
}

/// Accumulates pages into one PDF document.
pub struct PdfDocumentWriter {
    document: Document,
    page_width: f64,
    page_height: f64,
    image_count: usize,
}

impl PdfDocumentWriter {
    pub fn new(geometry: &PageGeometry, title: impl Into<String>) -> Self {
        let mut document = Document::new();
        document.set_title(title);
        document.set_creator(CREATOR);
        Self {
            document,
            page_width: f64::from(geometry.page_width()) * POINTS_PER_HUNDREDTH,
            page_height: f64::from(geometry.page_height()) * POINTS_PER_HUNDREDTH,
            image_count: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    /// Draws one page; bitmaps are JPEG-encoded here and the raw pixels dropped.
    pub fn add_page(&mut self, display_list: PrintDisplayList) -> Result<(), PdfError> {
        let mut page = Page::new(self.page_width, self.page_height);
        for command in display_list.commands {
            match command {
                DisplayCommand::Text(run) => self.draw_text(&mut page, &run)?,
                DisplayCommand::Image(placed) => self.draw_image(&mut page, placed)?,
            }
        }
        self.document.add_page(page);
        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<u8>, PdfError> {
        if self.page_count() == 0 {
            return Err(PdfError::NoPages);
        }
        let mut bytes = Vec::new();
        self.document.write(&mut bytes)?;
        Ok(bytes)
    }

    fn draw_text(&self, page: &mut Page, run: &GlyphRun) -> Result<(), PdfError> {
        let size = f64::from(run.font.size_pt);
        let x = f64::from(run.position.x) * POINTS_PER_HUNDREDTH;
        // Glyph runs are positioned by their top edge; PDF text by its baseline.
        let baseline = self.page_height - f64::from(run.position.y) * POINTS_PER_HUNDREDTH - size;
        page.text()
            .set_font(pdf_font(base_font_for(&run.font.family)), size)
            .at(x, baseline)
            .write(&run.text.replace('\t', " "))?;
        Ok(())
    }

    fn draw_image(&mut self, page: &mut Page, placed: PlacedImage) -> Result<(), PdfError> {
        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        let dest = placed.dest;
        page.add_image(name.as_str(), Image::from_jpeg_data(encode_jpeg(placed.image)?)?);
        page.draw_image(
            &name,
            f64::from(dest.x) * POINTS_PER_HUNDREDTH,
            self.page_height - f64::from(dest.bottom()) * POINTS_PER_HUNDREDTH,
            f64::from(dest.width) * POINTS_PER_HUNDREDTH,
            f64::from(dest.height) * POINTS_PER_HUNDREDTH,
        )?;
        Ok(())
    }
}

fn pdf_font(base: BaseFont) -> Font {
    match base {
        BaseFont::Courier => Font::Courier,
        BaseFont::Helvetica => Font::Helvetica,
        BaseFont::TimesRoman => Font::TimesRoman,
    }
}

fn encode_jpeg(image: RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use crate::font::FontSpec;
    use crate::geometry::{Margins, Orientation, PaperKind, PaperSize, Point, Rect};
    use flate2::read::ZlibDecoder;

    fn letter() -> PageGeometry {
        PageGeometry {
            paper: PaperSize::standard(PaperKind::Letter).unwrap(),
            orientation: Orientation::Portrait,
            printable_area: Rect::new(0.0, 0.0, 850.0, 1100.0),
            margins: Margins::uniform(100),
        }
    }

    fn text_page(lines: &[&str], family: &str) -> PrintDisplayList {
        let mut list = PrintDisplayList::default();
        for (index, line) in lines.iter().enumerate() {
            list.push(DisplayCommand::Text(GlyphRun {
                text: (*line).to_string(),
                font: FontSpec::new(family, 10.0),
                position: Point {
                    x: 100.0,
                    y: 100.0 + index as f32 * 16.0,
                },
            }));
        }
        list
    }

    /// Every stream body, inflated where it is Flate-compressed.
    fn stream_text(bytes: &[u8]) -> String {
        let mut text = String::new();
        let mut rest = bytes;
        while let Some(start) = find(rest, b"stream") {
            if start >= 3 && &rest[start - 3..start] == b"end" {
                rest = &rest[start + 6..];
                continue;
            }
            let mut body = &rest[start + 6..];
            while let [b'\r' | b'\n', tail @ ..] = body {
                body = tail;
            }
            let end = find(body, b"endstream").unwrap_or(body.len());
            let raw = &body[..end];
            let mut inflated = Vec::new();
            if ZlibDecoder::new(raw).read_to_end(&mut inflated).is_ok() {
                text.push_str(&String::from_utf8_lossy(&inflated));
            } else {
                text.push_str(&String::from_utf8_lossy(raw));
            }
            rest = &body[end..];
        }
        text
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|window| window == needle)
    }

    /// The two numbers immediately before `operator` in the text preceding `marker`.
    fn operands_before(content: &str, marker: &str, operator: &str) -> (f64, f64) {
        let head = &content[..content.find(marker).unwrap()];
        let head = &head[..head.rfind(operator).unwrap()];
        let numbers: Vec<f64> = head
            .split_whitespace()
            .rev()
            .take(2)
            .map(|token| token.parse().unwrap())
            .collect();
        (numbers[1], numbers[0])
    }

    #[test]
    fn writes_pages_fonts_and_title() {
        let mut writer = PdfDocumentWriter::new(&letter(), "quarterly report");
        writer.add_page(text_page(&["hello", "world"], "Courier New")).unwrap();
        writer.add_page(text_page(&["second"], "Arial")).unwrap();
        assert_eq!(writer.page_count(), 2);
        let bytes = writer.finish().unwrap();
        let raw = String::from_utf8_lossy(&bytes);

        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(raw.matches("/MediaBox").count(), 2);
        assert!(raw.contains("/BaseFont /Courier"));
        assert!(raw.contains("/BaseFont /Helvetica"));
        assert!(raw.contains("quarterly report"));

        let content = stream_text(&bytes);
        assert!(content.contains("(hello) Tj"));
        assert!(content.contains("(second) Tj"));
        let (x, y) = operands_before(&content, "(hello) Tj", "Td");
        assert!((x - 72.0).abs() < 0.01);
        assert!((y - 710.0).abs() < 0.01);
    }

    #[test]
    fn images_are_placed_from_the_top_left() {
        let mut list = PrintDisplayList::default();
        list.push(DisplayCommand::Image(PlacedImage {
            dest: Rect::new(100.0, 100.0, 200.0, 100.0),
            image: RgbImage::new(20, 10),
        }));
        let mut writer = PdfDocumentWriter::new(&letter(), "picture");
        writer.add_page(list).unwrap();
        let bytes = writer.finish().unwrap();
        let raw = String::from_utf8_lossy(&bytes);

        assert!(raw.contains("/Subtype /Image"));
        assert!(raw.contains("/Width 20"));
        assert!(raw.contains("/Height 10"));
        assert!(raw.contains("/DCTDecode"));

        let content = stream_text(&bytes);
        assert!(content.contains("/Im1 Do"));
        let (x, y) = operands_before(&content, "/Im1 Do", "cm");
        assert!((x - 72.0).abs() < 0.01);
        assert!((y - 648.0).abs() < 0.01);
    }

    #[test]
    fn win_ansi_text_is_octal_escaped() {
        let mut writer = PdfDocumentWriter::new(&letter(), "menu");
        writer.add_page(text_page(&["caf\u{e9}\tnoir"], "Courier")).unwrap();
        let content = stream_text(&writer.finish().unwrap());
        assert!(content.contains(r"(caf\351 noir) Tj"));
    }

    #[test]
    fn empty_document_is_rejected() {
        let writer = PdfDocumentWriter::new(&letter(), "empty");
        assert!(matches!(writer.finish(), Err(PdfError::NoPages)));
    }
}
