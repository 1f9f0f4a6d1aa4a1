use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::{Margins, Orientation, PageGeometry, PaperKind, PaperSize, Rect};

/// Name of the built-in printer that only writes files.
/// 僅能輸出檔案的內建印表機名稱。
pub const VIRTUAL_PDF_PRINTER: &str = "Print to PDF";

/// Driver-default margin applied when the user leaves an edge unset.
pub const DEFAULT_DRIVER_MARGIN: i32 = 100;

/// Opaque identifier for a print job.
/// 列印作業的不透明識別碼。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrintJobId(u64);

impl PrintJobId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Sequence number of the job within this process.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl Default for PrintJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrintJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "print-job-{}", self.0)
    }
}

/// Where the rendered job goes.
/// 繪製完成的作業送往何處。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterTarget {
    /// A printer installed on the host.
    Named(String),
    /// A file on disk, optionally laid out with a named printer's capabilities.
    File {
        printer: Option<String>,
        path: PathBuf,
    },
}

impl PrinterTarget {
    /// Printer whose capabilities drive the layout.
    pub fn printer_name(&self) -> &str {
        match self {
            PrinterTarget::Named(name) => name,
            PrinterTarget::File {
                printer: Some(name),
                ..
            } => name,
            PrinterTarget::File { printer: None, .. } => VIRTUAL_PDF_PRINTER,
        }
    }

    pub fn destination(&self) -> Option<&PathBuf> {
        match self {
            PrinterTarget::Named(_) => None,
            PrinterTarget::File { path, .. } => Some(path),
        }
    }
}

impl fmt::Display for PrinterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterTarget::Named(name) => write!(f, "'{name}'"),
            PrinterTarget::File { path, .. } => {
                write!(f, "'{}' ({})", self.printer_name(), path.display())
            }
        }
    }
}

/// Paper and hardware limits reported by a printer.
/// 印表機回報的紙張與硬體限制。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterCapabilities {
    pub name: String,
    pub paper_sizes: Vec<PaperSize>,
    pub default_paper: PaperSize,
    /// Portrait insets the device cannot mark.
    pub hard_margins: Margins,
    pub default_margins: Margins,
}

impl PrinterCapabilities {
    /// Capabilities of a device supporting every standard paper kind.
    pub fn standard(name: impl Into<String>, default_paper: PaperKind, hard_margins: Margins) -> Self {
        let paper_sizes: Vec<PaperSize> = PaperKind::STANDARD
            .into_iter()
            .filter_map(PaperSize::standard)
            .collect();
        let default_paper = PaperSize::standard(default_paper)
            .unwrap_or_else(|| PaperSize::new(PaperKind::Letter, 850, 1100));
        Self {
            name: name.into(),
            paper_sizes,
            default_paper,
            hard_margins,
            default_margins: Margins::uniform(DEFAULT_DRIVER_MARGIN),
        }
    }

    /// The file-only printer: every standard sheet, no unprintable border.
    pub fn virtual_pdf() -> Self {
        Self::standard(VIRTUAL_PDF_PRINTER, PaperKind::Letter, Margins::zero())
    }

    pub fn find_paper(&self, name: &str) -> Option<PaperSize> {
        let name = name.trim();
        self.paper_sizes
            .iter()
            .copied()
            .find(|paper| paper.kind.name().eq_ignore_ascii_case(name))
    }

    /// Printable rectangle of `paper` in the oriented frame.
    pub fn printable_area(&self, paper: PaperSize, orientation: Orientation) -> Rect {
        let (width, height) = paper.oriented(orientation);
        let hard = self.hard_margins.rotated(orientation);
        Rect::new(
            hard.left as f32,
            hard.top as f32,
            (width - hard.left - hard.right).max(1) as f32,
            (height - hard.top - hard.bottom).max(1) as f32,
        )
    }
}

/// Options supplied when requesting a print job.
/// 要求列印作業時提供的選項。
#[derive(Debug, Clone)]
pub struct PrintJobOptions {
    pub job_id: PrintJobId,
    pub target: PrinterTarget,
    pub document_name: String,
    pub geometry: PageGeometry,
}

impl PrintJobOptions {
    pub fn new(target: PrinterTarget, document_name: impl Into<String>, geometry: PageGeometry) -> Self {
        Self {
            job_id: PrintJobId::new(),
            target,
            document_name: document_name.into(),
            geometry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_are_sequential() {
        let first = PrintJobId::new();
        let second = PrintJobId::new();
        assert!(second.value() > first.value());
        assert!(first.to_string().starts_with("print-job-"));
    }

    #[test]
    fn file_target_without_printer_uses_virtual_pdf() {
        let target = PrinterTarget::File {
            printer: None,
            path: PathBuf::from("out.pdf"),
        };
        assert_eq!(target.printer_name(), VIRTUAL_PDF_PRINTER);
        assert_eq!(target.destination(), Some(&PathBuf::from("out.pdf")));
        assert_eq!(PrinterTarget::Named("Office".into()).destination(), None);
    }

    #[test]
    fn printable_area_excludes_hard_margins() {
        let caps = PrinterCapabilities::standard(
            "Office",
            PaperKind::A4,
            Margins {
                top: 10,
                bottom: 20,
                left: 30,
                right: 40,
            },
        );
        assert_eq!(caps.default_paper.kind, PaperKind::A4);
        let portrait = caps.printable_area(caps.default_paper, Orientation::Portrait);
        assert_eq!(portrait, Rect::new(30.0, 10.0, 757.0, 1139.0));
        let landscape = caps.printable_area(caps.default_paper, Orientation::Landscape);
        assert_eq!(landscape, Rect::new(10.0, 40.0, 1139.0, 757.0));
    }

    #[test]
    fn find_paper_ignores_case() {
        let caps = PrinterCapabilities::virtual_pdf();
        assert_eq!(caps.find_paper("legal").map(|p| p.kind), Some(PaperKind::Legal));
        assert!(caps.find_paper("Nonexistent").is_none());
    }
}
