//! CUPS-backed print system and the PDF spooler used for every job.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::geometry::{Margins, PaperKind, PaperSize};
use crate::job::{PrintJobOptions, PrinterCapabilities, PrinterTarget, VIRTUAL_PDF_PRINTER};
use crate::pdf::{PdfDocumentWriter, PdfError};
use crate::platform::{PlatformJobHandle, PrintSystem, SpoolPage};

/// Unprintable border assumed for CUPS queues, which do not report one.
pub const CUPS_HARD_MARGIN: i32 = 25;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("failed to run {program}: {source}")]
    CommandUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} failed: {message}")]
    CommandFailed { program: String, message: String },
    #[error("'{0}' cannot be the system default printer")]
    VirtualDefault(String),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Captured result of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the host's printing tools.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], stdin: Option<&[u8]>) -> io::Result<CommandOutput>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str], stdin: Option<&[u8]>) -> io::Result<CommandOutput> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        let mut child = command.spawn()?;
        if let (Some(bytes), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(bytes)?;
        }
        let output = child.wait_with_output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Printers reached through `lpstat`, `lpoptions` and `lp`, plus the file printer.
#[derive(Debug, Clone, Default)]
pub struct LpPrintSystem<R = SystemCommandRunner> {
    runner: Arc<R>,
}

impl LpPrintSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CommandRunner> LpPrintSystem<R> {
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }

    /// Runs a query; `None` when CUPS is not installed.
    fn query(&self, program: &str, args: &[&str]) -> Result<Option<CommandOutput>, SpoolError> {
        match self.runner.run(program, args, None) {
            Ok(output) => Ok(Some(output)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(program, "printing tools not installed");
                Ok(None)
            }
            Err(source) => Err(SpoolError::CommandUnavailable {
                program: program.to_string(),
                source,
            }),
        }
    }
}

impl<R: CommandRunner> PrintSystem for LpPrintSystem<R> {
    type Error = SpoolError;
    type JobHandle = PdfSpooler<R>;

    fn installed_printers(&self) -> Result<Vec<String>, SpoolError> {
        let mut printers = match self.query("lpstat", &["-e"])? {
            Some(output) if output.success => parse_printer_list(&output.stdout),
            Some(output) => {
                debug!(stderr = %output.stderr.trim(), "lpstat listed no printers");
                Vec::new()
            }
            None => Vec::new(),
        };
        if !printers.iter().any(|name| name == VIRTUAL_PDF_PRINTER) {
            printers.push(VIRTUAL_PDF_PRINTER.to_string());
        }
        Ok(printers)
    }

    fn default_printer(&self) -> Result<Option<String>, SpoolError> {
        Ok(match self.query("lpstat", &["-d"])? {
            Some(output) if output.success => parse_default_destination(&output.stdout),
            _ => None,
        })
    }

    fn set_default_printer(&self, name: &str) -> Result<(), SpoolError> {
        if name == VIRTUAL_PDF_PRINTER {
            return Err(SpoolError::VirtualDefault(name.to_string()));
        }
        let output = self
            .runner
            .run("lpoptions", &["-d", name], None)
            .map_err(|source| SpoolError::CommandUnavailable {
                program: "lpoptions".into(),
                source,
            })?;
        if !output.success {
            return Err(SpoolError::CommandFailed {
                program: "lpoptions".into(),
                message: output.stderr.trim().to_string(),
            });
        }
        info!(printer = name, "default printer changed");
        Ok(())
    }

    fn capabilities(&self, printer: &str) -> Result<PrinterCapabilities, SpoolError> {
        if printer == VIRTUAL_PDF_PRINTER {
            return Ok(PrinterCapabilities::virtual_pdf());
        }
        let mut capabilities =
            PrinterCapabilities::standard(printer, PaperKind::Letter, Margins::uniform(CUPS_HARD_MARGIN));
        if let Some(output) = self.query("lpoptions", &["-p", printer, "-l"])? {
            if !output.success {
                return Err(SpoolError::CommandFailed {
                    program: "lpoptions".into(),
                    message: output.stderr.trim().to_string(),
                });
            }
            let (sizes, default) = parse_page_sizes(&output.stdout);
            if !sizes.is_empty() {
                capabilities.default_paper = default.unwrap_or(sizes[0]);
                capabilities.paper_sizes = sizes;
            }
        }
        debug!(
            printer,
            papers = capabilities.paper_sizes.len(),
            default = %capabilities.default_paper.kind,
            "printer capabilities"
        );
        Ok(capabilities)
    }

    fn begin_job(&self, options: &PrintJobOptions) -> Result<PdfSpooler<R>, SpoolError> {
        debug!(job = %options.job_id, "spooling to {}", options.target);
        Ok(PdfSpooler {
            writer: PdfDocumentWriter::new(&options.geometry, options.document_name.clone()),
            target: options.target.clone(),
            title: options.document_name.clone(),
            runner: Arc::clone(&self.runner),
        })
    }
}

/// Job handle that renders pages into a PDF, then writes or submits it.
pub struct PdfSpooler<R = SystemCommandRunner> {
    writer: PdfDocumentWriter,
    target: PrinterTarget,
    title: String,
    runner: Arc<R>,
}

impl<R: CommandRunner> PdfSpooler<R> {
    fn deliver(self) -> Result<(), SpoolError> {
        let pages = self.writer.page_count();
        let bytes = self.writer.finish()?;
        match &self.target {
            PrinterTarget::File { path, .. } => {
                fs::write(path, &bytes).map_err(|source| SpoolError::Write {
                    path: path.clone(),
                    source,
                })?;
                info!(path = %path.display(), pages, "wrote print file");
            }
            PrinterTarget::Named(printer) => {
                let output = self
                    .runner
                    .run("lp", &["-d", printer.as_str(), "-t", self.title.as_str()], Some(&bytes))
                    .map_err(|source| SpoolError::CommandUnavailable {
                        program: "lp".into(),
                        source,
                    })?;
                if !output.success {
                    return Err(SpoolError::CommandFailed {
                        program: "lp".into(),
                        message: output.stderr.trim().to_string(),
                    });
                }
                info!(printer = %printer, pages, "submitted job: {}", output.stdout.trim());
            }
        }
        Ok(())
    }
}

impl<R: CommandRunner> PlatformJobHandle for PdfSpooler<R> {
    type Error = SpoolError;

    fn submit_page(&mut self, page: SpoolPage) -> Result<(), SpoolError> {
        self.writer.add_page(page.display_list)?;
        Ok(())
    }

    fn finish(self) -> Result<(), SpoolError> {
        self.deliver()
    }

    fn abort(self, reason: &str) {
        let pages = self.writer.page_count();
        let keep_partial = pages > 0 && matches!(self.target, PrinterTarget::File { .. });
        if keep_partial {
            warn!(pages, "job aborted ({reason}); keeping the pages already printed");
            if let Err(err) = self.deliver() {
                warn!("could not write the partial document: {err}");
            }
        } else {
            info!(pages, "job aborted ({reason}); nothing was printed");
        }
    }
}

/// Queue names from `lpstat -e`, one per line.
pub fn parse_printer_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Default destination from `lpstat -d`.
pub fn parse_default_destination(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (label, name) = line.split_once(':')?;
        let name = name.trim();
        (label.contains("default destination") && !name.is_empty()).then(|| name.to_string())
    })
}

/// Supported sheets and the `*`-marked default from `lpoptions -l`.
pub fn parse_page_sizes(stdout: &str) -> (Vec<PaperSize>, Option<PaperSize>) {
    let Some(choices) = stdout.lines().find_map(|line| {
        let (option, choices) = line.split_once(':')?;
        let keyword = option.split('/').next()?.trim();
        keyword.eq_ignore_ascii_case("PageSize").then_some(choices)
    }) else {
        return (Vec::new(), None);
    };

    let mut sizes: Vec<PaperSize> = Vec::new();
    let mut default = None;
    for choice in choices.split_whitespace() {
        let (is_default, name) = match choice.strip_prefix('*') {
            Some(name) => (true, name),
            None => (false, choice),
        };
        let Some(paper) = PaperKind::from_name(name).and_then(PaperSize::standard) else {
            continue;
        };
        if is_default {
            default = Some(paper);
        }
        if !sizes.contains(&paper) {
            sizes.push(paper);
        }
    }
    (sizes, default)
}
