//! Page-at-a-time document driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info};

use crate::display::{DisplayCommand, GlyphRun, PlacedImage, PrintDisplayList};
use crate::error::PrintJobError;
use crate::font::{FontMetrics, FontSpec};
use crate::geometry::{PageGeometry, Point, Rect};
use crate::job::PrintJobOptions;
use crate::platform::{PlatformJobHandle, PrintSystem, SpoolPage};

/// Content that can render itself one page at a time.
/// 可逐頁繪製自身的內容。
pub trait PageSource {
    /// Draws one page and reports whether another page follows.
    fn print_page(&mut self, page: &mut PageContext<'_>) -> Result<bool, PrintJobError>;
}

/// Everything the page-render callback may use for the current page.
/// 頁面繪製回呼在目前頁面可使用的一切資訊。
pub struct PageContext<'a> {
    page_number: u32,
    geometry: &'a PageGeometry,
    metrics: &'a dyn FontMetrics,
    display_list: PrintDisplayList,
}

impl<'a> PageContext<'a> {
    pub fn new(page_number: u32, geometry: &'a PageGeometry, metrics: &'a dyn FontMetrics) -> Self {
        Self {
            page_number,
            geometry,
            metrics,
            display_list: PrintDisplayList::default(),
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn geometry(&self) -> &PageGeometry {
        self.geometry
    }

    pub fn margin_bounds(&self) -> Rect {
        self.geometry.margin_bounds()
    }

    pub fn line_height(&self, font: &FontSpec) -> f32 {
        self.metrics.line_height(font)
    }

    pub fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        self.metrics.text_width(text, font)
    }

    pub fn draw_text(&mut self, text: impl Into<String>, font: &FontSpec, position: Point) {
        self.display_list.push(DisplayCommand::Text(GlyphRun {
            text: text.into(),
            font: font.clone(),
            position,
        }));
    }

    pub fn draw_image(&mut self, image: RgbImage, dest: Rect) {
        self.display_list
            .push(DisplayCommand::Image(PlacedImage { dest, image }));
    }

    pub fn into_display_list(self) -> PrintDisplayList {
        self.display_list
    }
}

/// Cooperative cancellation flag checked between pages.
/// 於頁與頁之間檢查的協作式取消旗標。
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSummary {
    pub pages: u32,
}

/// Runs `source` through a job on `system`, one page per callback.
/// 在 `system` 上以作業執行 `source`，每次回呼產生一頁。
pub fn print_document<S>(
    system: &S,
    options: &PrintJobOptions,
    metrics: &dyn FontMetrics,
    source: &mut dyn PageSource,
    cancel: &CancelToken,
) -> Result<JobSummary, PrintJobError>
where
    S: PrintSystem + ?Sized,
{
    info!(
        job = %options.job_id,
        document = %options.document_name,
        "printing to {}",
        options.target
    );
    let mut handle = system
        .begin_job(options)
        .map_err(|err| PrintJobError::Platform(err.to_string()))?;

    let mut page_number = 1u32;
    loop {
        if cancel.is_cancelled() {
            handle.abort("cancelled");
            return Err(PrintJobError::Cancelled {
                pages: page_number - 1,
            });
        }

        let mut context = PageContext::new(page_number, &options.geometry, metrics);
        let has_more = match source.print_page(&mut context) {
            Ok(has_more) => has_more,
            Err(err) => {
                handle.abort(&err.to_string());
                return Err(err);
            }
        };

        let page = SpoolPage {
            job_id: options.job_id,
            page_number,
            display_list: context.into_display_list(),
        };
        if let Err(err) = handle.submit_page(page) {
            let message = err.to_string();
            handle.abort(&message);
            return Err(PrintJobError::Platform(message));
        }
        debug!(page = page_number, "page spooled");

        if !has_more {
            break;
        }
        page_number += 1;
    }

    handle
        .finish()
        .map_err(|err| PrintJobError::Platform(err.to_string()))?;
    info!(job = %options.job_id, pages = page_number, "print job completed");
    Ok(JobSummary { pages: page_number })
}
