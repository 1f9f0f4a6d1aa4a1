use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::display::PrintDisplayList;
use crate::error::PrintJobError;
use crate::font;
use crate::job::{PrintJobId, PrintJobOptions, PrinterCapabilities, PrinterTarget, VIRTUAL_PDF_PRINTER};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// A rendered page queued for spooling.
/// 已完成繪製、等待送往列印佇列的頁面。
#[derive(Debug, Clone)]
pub struct SpoolPage {
    pub job_id: PrintJobId,
    pub page_number: u32,
    pub display_list: PrintDisplayList,
}

/// Handle returned when a print system begins a job.
/// 列印系統開始作業時回傳的控制物件。
pub trait PlatformJobHandle {
    type Error: Display;

    fn submit_page(&mut self, page: SpoolPage) -> Result<(), Self::Error>;
    fn finish(self) -> Result<(), Self::Error>;
    fn abort(self, reason: &str);
}

/// Abstraction over the host's printers and spooler.
/// 主機印表機與列印佇列的抽象介面。
pub trait PrintSystem {
    type Error: Display;
    type JobHandle: PlatformJobHandle<Error = Self::Error>;

    fn installed_printers(&self) -> Result<Vec<String>, Self::Error>;
    fn default_printer(&self) -> Result<Option<String>, Self::Error>;
    fn set_default_printer(&self, name: &str) -> Result<(), Self::Error>;
    fn capabilities(&self, printer: &str) -> Result<PrinterCapabilities, Self::Error>;

    /// Font families available to the renderer.
    /// 繪製時可使用的字型家族。
    fn installed_fonts(&self) -> Vec<String> {
        font::installed_families()
    }

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error>;
}

/// Picks the job's target from an optional printer name and destination file.
/// 依選用的印表機名稱與輸出檔案決定列印目標。
pub fn resolve_target<S>(
    system: &S,
    printer: Option<&str>,
    destination: Option<PathBuf>,
) -> Result<PrinterTarget, PrintJobError>
where
    S: PrintSystem + ?Sized,
{
    let printer = match printer {
        Some(requested) => {
            let installed = system
                .installed_printers()
                .map_err(|err| PrintJobError::Platform(err.to_string()))?;
            let found = installed
                .into_iter()
                .find(|name| name.eq_ignore_ascii_case(requested))
                .ok_or_else(|| PrintJobError::PrinterNotFound {
                    name: requested.to_string(),
                })?;
            Some(found)
        }
        None => None,
    };

    match (printer, destination) {
        (printer, Some(path)) => Ok(PrinterTarget::File { printer, path }),
        (Some(name), None) if name == VIRTUAL_PDF_PRINTER => {
            Err(PrintJobError::DestinationRequired(name))
        }
        (Some(name), None) => Ok(PrinterTarget::Named(name)),
        (None, None) => {
            let default = system
                .default_printer()
                .map_err(|err| PrintJobError::Platform(err.to_string()))?;
            match default {
                Some(name) if name == VIRTUAL_PDF_PRINTER => {
                    Err(PrintJobError::DestinationRequired(name))
                }
                Some(name) => Ok(PrinterTarget::Named(name)),
                None => Err(PrintJobError::NoDefaultPrinter),
            }
        }
    }
}

/// Deletes a pre-existing destination file before a print-to-file job.
/// 列印至檔案前先刪除既有的輸出檔案。
pub fn prepare_destination(path: &Path) -> Result<(), PrintJobError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed existing destination");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PrintJobError::RemoveDestination {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Restores the system default printer when dropped.
/// 釋放時還原系統預設印表機。
pub struct DefaultPrinterGuard<'a, S: PrintSystem + ?Sized> {
    system: &'a S,
    original: Option<String>,
    armed: bool,
}

impl<'a, S: PrintSystem + ?Sized> DefaultPrinterGuard<'a, S> {
    pub fn acquire(system: &'a S) -> Self {
        let original = match system.default_printer() {
            Ok(original) => original,
            Err(err) => {
                warn!("could not read the default printer: {err}");
                None
            }
        };
        Self {
            system,
            original,
            armed: true,
        }
    }

    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    /// Restores immediately and reports the outcome.
    pub fn restore(mut self) -> Result<(), S::Error> {
        self.armed = false;
        self.restore_if_changed()
    }

    fn restore_if_changed(&self) -> Result<(), S::Error> {
        let Some(original) = self.original.as_deref() else {
            return Ok(());
        };
        let current = self.system.default_printer()?;
        if current.as_deref() != Some(original) {
            debug!(printer = original, "restoring default printer");
            self.system.set_default_printer(original)?;
        }
        Ok(())
    }
}

impl<S: PrintSystem + ?Sized> Drop for DefaultPrinterGuard<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(err) = self.restore_if_changed() {
                warn!("could not restore the default printer: {err}");
            }
        }
    }
}

/// Recorded job metadata produced by the mock system.
/// 模擬系統所記錄的列印作業中繼資料。
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub options: PrintJobOptions,
    pub pages: Vec<SpoolPage>,
    pub aborted: bool,
    pub abort_reason: Option<String>,
}

/// In-memory implementation of [`PrintSystem`] used for tests.
/// 測試用的記憶體內 [`PrintSystem`] 實作。
#[cfg(test)]
#[derive(Clone)]
pub struct MockPrintSystem {
    pub printers: Vec<PrinterCapabilities>,
    pub default: Arc<Mutex<Option<String>>>,
    pub fail_on_page: Option<u32>,
    jobs: Arc<Mutex<Vec<RecordedJob>>>,
}

#[cfg(test)]
impl MockPrintSystem {
    pub fn new(printers: Vec<PrinterCapabilities>, default: Option<&str>) -> Self {
        Self {
            printers,
            default: Arc::new(Mutex::new(default.map(str::to_string))),
            fail_on_page: None,
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn drain_jobs(&self) -> Vec<RecordedJob> {
        self.jobs.lock().expect("lock poisoned").drain(..).collect()
    }
}

#[cfg(test)]
pub struct MockJobHandle {
    options: PrintJobOptions,
    pages: Vec<SpoolPage>,
    fail_on_page: Option<u32>,
    sink: Arc<Mutex<Vec<RecordedJob>>>,
}

#[cfg(test)]
impl PrintSystem for MockPrintSystem {
    type Error = String;
    type JobHandle = MockJobHandle;

    fn installed_printers(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.printers.iter().map(|caps| caps.name.clone()).collect())
    }

    fn default_printer(&self) -> Result<Option<String>, Self::Error> {
        Ok(self.default.lock().expect("lock poisoned").clone())
    }

    fn set_default_printer(&self, name: &str) -> Result<(), Self::Error> {
        *self.default.lock().expect("lock poisoned") = Some(name.to_string());
        Ok(())
    }

    fn capabilities(&self, printer: &str) -> Result<PrinterCapabilities, Self::Error> {
        self.printers
            .iter()
            .find(|caps| caps.name == printer)
            .cloned()
            .ok_or_else(|| format!("unknown printer {printer}"))
    }

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        Ok(MockJobHandle {
            options: options.clone(),
            pages: Vec::new(),
            fail_on_page: self.fail_on_page,
            sink: self.jobs.clone(),
        })
    }
}

#[cfg(test)]
impl PlatformJobHandle for MockJobHandle {
    type Error = String;

    fn submit_page(&mut self, page: SpoolPage) -> Result<(), Self::Error> {
        if self.fail_on_page == Some(page.page_number) {
            return Err(format!("driver rejected page {}", page.page_number));
        }
        self.pages.push(page);
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        let mut guard = self.sink.lock().expect("lock poisoned");
        guard.push(RecordedJob {
            options: self.options,
            pages: self.pages,
            aborted: false,
            abort_reason: None,
        });
        Ok(())
    }

    fn abort(self, reason: &str) {
        let mut guard = self.sink.lock().expect("lock poisoned");
        guard.push(RecordedJob {
            options: self.options,
            pages: self.pages,
            aborted: true,
            abort_reason: Some(reason.to_string()),
        });
    }
}
