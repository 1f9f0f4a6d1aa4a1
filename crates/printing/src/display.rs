use image::RgbImage;

use crate::font::FontSpec;
use crate::geometry::{Point, Rect};

/// Drawing commands for one page, consumed by the spooler.
/// 單一頁面的繪圖指令，由列印佇列取用。
#[derive(Debug, Clone, Default)]
pub struct PrintDisplayList {
    pub commands: Vec<DisplayCommand>,
}

impl PrintDisplayList {
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    /// Text of every glyph run, in drawing order.
    pub fn text_runs(&self) -> impl Iterator<Item = &GlyphRun> {
        self.commands.iter().filter_map(|command| match command {
            DisplayCommand::Text(run) => Some(run),
            DisplayCommand::Image(_) => None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum DisplayCommand {
    Text(GlyphRun),
    Image(PlacedImage),
}

/// A line of text whose top-left corner sits at `position`.
/// 左上角位於 `position` 的一行文字。
#[derive(Debug, Clone)]
pub struct GlyphRun {
    pub text: String,
    pub font: FontSpec,
    pub position: Point,
}

/// A decoded bitmap scaled into `dest`.
/// 已解碼並縮放至 `dest` 範圍的點陣圖。
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub dest: Rect,
    pub image: RgbImage,
}
