use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures raised while running a print job.
#[derive(Debug, Error)]
pub enum PrintJobError {
    #[error("'{name}' is not a valid printer on this computer")]
    PrinterNotFound { name: String },
    #[error("no default printer is configured; name a printer or a destination file")]
    NoDefaultPrinter,
    #[error("printer '{0}' can only print to a file; pass a destination")]
    DestinationRequired(String),
    #[error(
        "page leaves no room for text: {margin_height:.0} hundredths tall with {line_height:.1} per line"
    )]
    NoRoomForText { margin_height: f32, line_height: f32 },
    #[error("failed to remove existing destination {path}: {source}")]
    RemoveDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("platform adapter failed: {0}")]
    Platform(String),
    #[error("print job cancelled after {pages} page(s)")]
    Cancelled { pages: u32 },
}

/// Non-fatal issues: the job continues with a substituted default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrintWarning {
    #[error("{requested} doesn't appear to be a valid paper size; will use the default: {fallback}")]
    UnknownPaperSize { requested: String, fallback: String },
    #[error("'{requested}' does not seem to be a valid font. Switching to default '{fallback}'")]
    UnknownFont { requested: String, fallback: String },
    #[error("font size {requested} is not usable; using {fallback}")]
    InvalidFontSize { requested: String, fallback: String },
    #[error("cannot read '{path}': {reason}")]
    UnreadableInput { path: PathBuf, reason: String },
    #[error("{axis} margins leave no printable area; clamped to fit the page")]
    MarginsClamped { axis: MarginAxis },
}

/// Which pair of opposite margins was adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginAxis {
    Vertical,
    Horizontal,
}

impl std::fmt::Display for MarginAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarginAxis::Vertical => f.write_str("top/bottom"),
            MarginAxis::Horizontal => f.write_str("left/right"),
        }
    }
}

/// Records a warning and reports it through the log.
pub(crate) fn push_warning(warnings: &mut Vec<PrintWarning>, warning: PrintWarning) {
    tracing::warn!("{warning}");
    warnings.push(warning);
}
