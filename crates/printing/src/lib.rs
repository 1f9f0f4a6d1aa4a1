//! Layout planning, page-settings resolution and spooling for the outprinter CLI.

pub mod completion;
pub mod display;
pub mod document;
pub mod error;
pub mod font;
pub mod format;
pub mod geometry;
pub mod graphic;
pub mod input;
pub mod job;
pub mod page_settings;
pub mod pdf;
pub mod platform;
pub mod session;
pub mod spool;
pub mod template;
pub mod text;
pub mod wrap;

pub use display::{DisplayCommand, GlyphRun, PlacedImage, PrintDisplayList};
pub use document::{print_document, CancelToken, JobSummary, PageContext, PageSource};
pub use error::{MarginAxis, PrintJobError, PrintWarning};
pub use font::{FontMetrics, FontSpec, StandardFontMetrics};
pub use geometry::{Margins, Orientation, PageGeometry, PaperKind, PaperSize, Point, Rect};
pub use graphic::{ImageJob, ImagePlacement, ScaleMode};
pub use input::{InputFormat, PipedInput};
pub use job::{PrintJobId, PrintJobOptions, PrinterCapabilities, PrinterTarget, VIRTUAL_PDF_PRINTER};
pub use page_settings::{MarginRequest, PageSettingsRequest};
pub use platform::{DefaultPrinterGuard, PlatformJobHandle, PrintSystem, SpoolPage};
pub use session::{run_print, PrintInput, PrintOutcome, PrintRequest};
pub use spool::{CommandOutput, CommandRunner, LpPrintSystem, SpoolError, SystemCommandRunner};
pub use template::{HeaderFooterTemplate, JobContext, TemplateSegment, TemplateToken};
pub use text::{PaginationState, TextBuffer, TextDocument};
