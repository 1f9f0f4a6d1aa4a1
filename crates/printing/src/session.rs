//! One complete print invocation: load input, resolve settings, run the job.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::{print_document, CancelToken, JobSummary, PageSource};
use crate::error::{push_warning, PrintJobError, PrintWarning};
use crate::font::{
    chars_per_line, resolve_font, FontSpec, StandardFontMetrics, DEFAULT_FONT_FAMILY,
    DEFAULT_FONT_SIZE,
};
use crate::format::render_values;
use crate::geometry::PageGeometry;
use crate::graphic::{ImageJob, ScaleMode};
use crate::input::load_text_file;
use crate::job::{PrintJobOptions, PrinterTarget};
use crate::page_settings::{resolve_page_settings, PageSettingsRequest};
use crate::platform::{prepare_destination, resolve_target, DefaultPrinterGuard, PrintSystem};
use crate::template::{HeaderFooterTemplate, JobContext};
use crate::text::{TextBuffer, TextDocument};
use crate::wrap::prepare_lines;

/// Footer used when page numbering is requested without an explicit footer.
pub const PAGE_NUMBER_FOOTER: &str = "Page &[Page]";

const FALLBACK_DOCUMENT_NAME: &str = "outprinter";

/// What is being printed.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintInput {
    Text(String),
    TextFile(PathBuf),
    Values(Vec<Value>),
    ImageFile(PathBuf),
    ImageBytes(Vec<u8>),
}

impl PrintInput {
    fn source_path(&self) -> Option<&Path> {
        match self {
            PrintInput::TextFile(path) | PrintInput::ImageFile(path) => Some(path),
            _ => None,
        }
    }
}

/// Everything a caller can ask of a print job.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintRequest {
    pub input: PrintInput,
    pub printer: Option<String>,
    pub destination: Option<PathBuf>,
    pub page: PageSettingsRequest,
    pub font_family: String,
    pub font_size: f32,
    pub wrap: bool,
    pub scale: ScaleMode,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub page_numbers: bool,
    /// Rendered by the `&[Line]` template token.
    pub command_line: Option<String>,
}

impl PrintRequest {
    pub fn new(input: PrintInput) -> Self {
        Self {
            input,
            printer: None,
            destination: None,
            page: PageSettingsRequest::default(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            wrap: true,
            scale: ScaleMode::Fit,
            header: None,
            footer: None,
            page_numbers: false,
            command_line: None,
        }
    }

    fn footer_template(&self) -> Option<HeaderFooterTemplate> {
        match (&self.footer, self.page_numbers) {
            (Some(footer), _) => Some(HeaderFooterTemplate::parse(footer)),
            (None, true) => Some(HeaderFooterTemplate::parse(PAGE_NUMBER_FOOTER)),
            (None, false) => None,
        }
    }

    fn source_display(&self) -> Option<String> {
        self.input
            .source_path()
            .map(|path| path.display().to_string())
    }

    fn document_name(&self) -> String {
        self.input
            .source_path()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_DOCUMENT_NAME.to_string())
    }
}

/// Result of [`run_print`]; `summary` is `None` when there was nothing to print.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintOutcome {
    pub target: PrinterTarget,
    pub summary: Option<JobSummary>,
    pub warnings: Vec<PrintWarning>,
}

/// Runs `request` on `system`, restoring the default printer on every exit path.
pub fn run_print<S>(
    system: &S,
    request: &PrintRequest,
    cancel: &CancelToken,
) -> Result<PrintOutcome, PrintJobError>
where
    S: PrintSystem + ?Sized,
{
    let guard = DefaultPrinterGuard::acquire(system);
    let mut warnings = Vec::new();

    let target = resolve_target(system, request.printer.as_deref(), request.destination.clone())?;
    let capabilities = system
        .capabilities(target.printer_name())
        .map_err(|err| PrintJobError::Platform(err.to_string()))?;
    let geometry = resolve_page_settings(&capabilities, &request.page, &mut warnings);
    let font = resolve_font(
        &system.installed_fonts(),
        &request.font_family,
        request.font_size,
        &mut warnings,
    );

    let Some(mut source) = build_source(request, &geometry, &font, &mut warnings) else {
        info!("nothing to print");
        return Ok(PrintOutcome {
            target,
            summary: None,
            warnings,
        });
    };

    if let Some(path) = target.destination() {
        prepare_destination(path)?;
    }
    let options = PrintJobOptions::new(target.clone(), request.document_name(), geometry);
    if let Some(text) = source.as_text_mut() {
        let context = JobContext::now(
            request.source_display(),
            request.command_line.clone(),
            options.job_id.value(),
        );
        text.set_context(context);
    }

    let summary = print_document(
        system,
        &options,
        &StandardFontMetrics,
        source.as_page_source(),
        cancel,
    )?;

    if let Err(err) = guard.restore() {
        warn!("could not restore the default printer: {err}");
    }
    Ok(PrintOutcome {
        target,
        summary: Some(summary),
        warnings,
    })
}

enum Source {
    Text(TextDocument),
    Image(ImageJob),
}

impl Source {
    fn as_page_source(&mut self) -> &mut dyn PageSource {
        match self {
            Source::Text(document) => document,
            Source::Image(job) => job,
        }
    }

    fn as_text_mut(&mut self) -> Option<&mut TextDocument> {
        match self {
            Source::Text(document) => Some(document),
            Source::Image(_) => None,
        }
    }
}

fn build_source(
    request: &PrintRequest,
    geometry: &PageGeometry,
    font: &FontSpec,
    warnings: &mut Vec<PrintWarning>,
) -> Option<Source> {
    let wrap_width = request
        .wrap
        .then(|| chars_per_line(geometry.printable_width() as f32, font.size_pt))
        .filter(|width| *width >= 2);
    debug!(?wrap_width, "preparing input");

    let lines: Vec<String> = match &request.input {
        PrintInput::ImageFile(path) => {
            return ImageJob::open(path, request.scale, warnings).map(Source::Image);
        }
        PrintInput::ImageBytes(bytes) => {
            return match ImageJob::from_bytes(bytes, request.scale) {
                Ok(job) => Some(Source::Image(job)),
                Err(err) => {
                    push_warning(
                        warnings,
                        PrintWarning::UnreadableInput {
                            path: PathBuf::from("<stdin>"),
                            reason: err.to_string(),
                        },
                    );
                    None
                }
            };
        }
        PrintInput::Text(text) => prepare_lines(text, wrap_width),
        PrintInput::TextFile(path) => prepare_lines(&load_text_file(path, warnings)?, wrap_width),
        PrintInput::Values(values) => render_values(values, wrap_width)
            .into_iter()
            .map(|line| if line.is_empty() { " ".to_string() } else { line })
            .collect(),
    };
    if lines.is_empty() {
        return None;
    }

    let header = request.header.as_deref().map(HeaderFooterTemplate::parse);
    let buffer: TextBuffer = lines.into_iter().collect();
    let document = TextDocument::new(buffer, font.clone(), JobContext::default())
        .with_header(header)
        .with_footer(request.footer_template());
    Some(Source::Text(document))
}
