//! Text pagination driven by the page-render callback.

use std::collections::VecDeque;

use tracing::debug;

use crate::document::{PageContext, PageSource};
use crate::error::PrintJobError;
use crate::font::FontSpec;
use crate::geometry::Point;
use crate::template::{HeaderFooterTemplate, JobContext};

/// Lines waiting to be printed, consumed from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    lines: VecDeque<String>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Removes and returns up to `count` lines from the front.
    pub fn take_front(&mut self, count: usize) -> Vec<String> {
        let count = count.min(self.lines.len());
        self.lines.drain(..count).collect()
    }
}

impl<S: Into<String>> Extend<S> for TextBuffer {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.lines.extend(iter.into_iter().map(Into::into));
    }
}

impl<S: Into<String>> FromIterator<S> for TextBuffer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut buffer = Self::new();
        buffer.extend(iter);
        buffer
    }
}

/// Where the paginator is between page callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    Rendering,
    PageComplete,
    Done,
}

/// `floor(height / line_height) - 1`, keeping one line of slack.
pub fn lines_per_page(margin_height: f32, line_height: f32) -> i64 {
    if line_height <= 0.0 {
        return 0;
    }
    (margin_height / line_height).floor() as i64 - 1
}

/// A text document printed a page at a time from a [`TextBuffer`].
#[derive(Debug, Clone)]
pub struct TextDocument {
    buffer: TextBuffer,
    font: FontSpec,
    header: Option<HeaderFooterTemplate>,
    footer: Option<HeaderFooterTemplate>,
    context: JobContext,
    current_page: u32,
    state: PaginationState,
}

impl TextDocument {
    pub fn new(buffer: TextBuffer, font: FontSpec, context: JobContext) -> Self {
        let state = if buffer.is_empty() {
            PaginationState::Done
        } else {
            PaginationState::Rendering
        };
        Self {
            buffer,
            font,
            header: None,
            footer: None,
            context,
            current_page: 1,
            state,
        }
    }

    pub fn with_header(mut self, header: Option<HeaderFooterTemplate>) -> Self {
        self.header = header.filter(|template| !template.is_empty());
        self
    }

    pub fn with_footer(mut self, footer: Option<HeaderFooterTemplate>) -> Self {
        self.footer = footer.filter(|template| !template.is_empty());
        self
    }

    /// Replaces the per-job values rendered into the header and footer.
    pub fn set_context(&mut self, context: JobContext) {
        self.context = context;
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn remaining_lines(&self) -> usize {
        self.buffer.len()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }
}

impl PageSource for TextDocument {
    fn print_page(&mut self, page: &mut PageContext<'_>) -> Result<bool, PrintJobError> {
        self.state = PaginationState::Rendering;
        let font = self.font.clone();
        let line_height = page.line_height(&font);
        let bounds = page.margin_bounds();
        let geometry = *page.geometry();
        let page_width = geometry.page_width() as f32;
        let page_height = geometry.page_height() as f32;
        let printable = geometry.printable_area;

        let mut lines_on_page = lines_per_page(bounds.height, line_height);
        let mut top_edge = bounds.y;
        if self.current_page == 1 {
            debug!(
                "printing with margins: top={:.0} left={:.0}. {} lines per page",
                bounds.y, bounds.x, lines_on_page
            );
        }

        if let Some(header) = &self.header {
            let text = header.render(self.current_page, &self.context);
            let left = (page_width - page.text_width(&text, &font)) / 2.0;
            let top = printable.y.max(line_height);
            page.draw_text(text, &font, Point { x: left, y: top });
            if top + 2.0 * line_height > top_edge {
                top_edge += 2.0 * line_height;
                lines_on_page -= 2;
            }
        }

        if let Some(footer) = &self.footer {
            let text = footer.render(self.current_page, &self.context);
            let left = (page_width - page.text_width(&text, &font)) / 2.0;
            let bottom = printable.bottom().min(page_height - line_height);
            page.draw_text(
                text,
                &font,
                Point {
                    x: left,
                    y: bottom - line_height,
                },
            );
            if bottom - 2.0 * line_height < bounds.bottom() {
                lines_on_page -= 2;
            }
        }

        if lines_on_page < 1 {
            return Err(PrintJobError::NoRoomForText {
                margin_height: bounds.height,
                line_height,
            });
        }

        let lines = self.buffer.take_front(lines_on_page as usize);
        for (index, line) in lines.into_iter().enumerate() {
            let y = top_edge + index as f32 * line_height;
            page.draw_text(line, &font, Point { x: bounds.x, y });
        }

        if self.buffer.is_empty() {
            self.state = PaginationState::Done;
            Ok(false)
        } else {
            self.state = PaginationState::PageComplete;
            self.current_page += 1;
            Ok(true)
        }
    }
}
