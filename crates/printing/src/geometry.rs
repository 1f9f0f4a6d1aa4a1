//! Page geometry expressed in hundredths of an inch.

use std::fmt;

/// Orientation of a print page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub const fn from_landscape(landscape: bool) -> Self {
        if landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Paper identifiers understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperKind {
    Letter,
    Legal,
    Executive,
    Tabloid,
    Ledger,
    A3,
    A4,
    A5,
    B4,
    B5,
    Custom,
}

impl PaperKind {
    pub const STANDARD: [PaperKind; 10] = [
        PaperKind::Letter,
        PaperKind::Legal,
        PaperKind::Executive,
        PaperKind::Tabloid,
        PaperKind::Ledger,
        PaperKind::A3,
        PaperKind::A4,
        PaperKind::A5,
        PaperKind::B4,
        PaperKind::B5,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PaperKind::Letter => "Letter",
            PaperKind::Legal => "Legal",
            PaperKind::Executive => "Executive",
            PaperKind::Tabloid => "Tabloid",
            PaperKind::Ledger => "Ledger",
            PaperKind::A3 => "A3",
            PaperKind::A4 => "A4",
            PaperKind::A5 => "A5",
            PaperKind::B4 => "B4",
            PaperKind::B5 => "B5",
            PaperKind::Custom => "Custom",
        }
    }

    /// Case-insensitive lookup of a standard kind by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::STANDARD
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Portrait dimensions of a standard kind.
    pub const fn dimensions(self) -> Option<(i32, i32)> {
        match self {
            PaperKind::Letter => Some((850, 1100)),
            PaperKind::Legal => Some((850, 1400)),
            PaperKind::Executive => Some((725, 1050)),
            PaperKind::Tabloid => Some((1100, 1700)),
            PaperKind::Ledger => Some((1700, 1100)),
            PaperKind::A3 => Some((1169, 1654)),
            PaperKind::A4 => Some((827, 1169)),
            PaperKind::A5 => Some((583, 827)),
            PaperKind::B4 => Some((1012, 1433)),
            PaperKind::B5 => Some((717, 1012)),
            PaperKind::Custom => None,
        }
    }
}

impl fmt::Display for PaperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A sheet of paper, stored with portrait dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaperSize {
    pub kind: PaperKind,
    pub width: i32,
    pub height: i32,
}

impl PaperSize {
    pub const fn new(kind: PaperKind, width: i32, height: i32) -> Self {
        Self {
            kind,
            width,
            height,
        }
    }

    pub fn standard(kind: PaperKind) -> Option<Self> {
        kind.dimensions()
            .map(|(width, height)| Self::new(kind, width, height))
    }

    pub const fn oriented(&self, orientation: Orientation) -> (i32, i32) {
        match orientation {
            Orientation::Portrait => (self.width, self.height),
            Orientation::Landscape => (self.height, self.width),
        }
    }
}

/// Edge insets in hundredths of an inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl Margins {
    pub const fn zero() -> Self {
        Self::uniform(0)
    }

    pub const fn uniform(value: i32) -> Self {
        Self {
            top: value,
            bottom: value,
            left: value,
            right: value,
        }
    }

    /// Turns portrait insets a quarter turn for a landscape sheet.
    pub const fn rotated(&self, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Portrait => *self,
            Orientation::Landscape => Self {
                top: self.right,
                bottom: self.left,
                left: self.top,
                right: self.bottom,
            },
        }
    }
}

/// 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned rectangle relative to the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Fully resolved page settings for one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub paper: PaperSize,
    pub orientation: Orientation,
    /// Device-reported printable rectangle, in the oriented frame.
    pub printable_area: Rect,
    pub margins: Margins,
}

impl PageGeometry {
    pub const fn page_width(&self) -> i32 {
        self.paper.oriented(self.orientation).0
    }

    pub const fn page_height(&self) -> i32 {
        self.paper.oriented(self.orientation).1
    }

    pub const fn printable_width(&self) -> i32 {
        self.page_width() - self.margins.left - self.margins.right
    }

    pub const fn printable_height(&self) -> i32 {
        self.page_height() - self.margins.top - self.margins.bottom
    }

    /// The rectangle inside the margins where content is laid out.
    pub fn margin_bounds(&self) -> Rect {
        Rect::new(
            self.margins.left as f32,
            self.margins.top as f32,
            self.printable_width() as f32,
            self.printable_height() as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_names_match_case_insensitively() {
        assert_eq!(PaperKind::from_name("a4"), Some(PaperKind::A4));
        assert_eq!(PaperKind::from_name(" LETTER "), Some(PaperKind::Letter));
        assert_eq!(PaperKind::from_name("Custom"), None);
        assert_eq!(PaperKind::from_name("Nonexistent"), None);
    }

    #[test]
    fn landscape_swaps_page_dimensions() {
        let geometry = PageGeometry {
            paper: PaperSize::standard(PaperKind::Letter).unwrap(),
            orientation: Orientation::Landscape,
            printable_area: Rect::new(0.0, 0.0, 1100.0, 850.0),
            margins: Margins {
                top: 50,
                bottom: 50,
                left: 100,
                right: 100,
            },
        };
        assert_eq!(geometry.page_width(), 1100);
        assert_eq!(geometry.page_height(), 850);
        assert_eq!(geometry.printable_width(), 900);
        assert_eq!(geometry.printable_height(), 750);
        assert_eq!(geometry.margin_bounds(), Rect::new(100.0, 50.0, 900.0, 750.0));
    }

    #[test]
    fn rotated_margins_follow_the_sheet() {
        let hard = Margins {
            top: 1,
            bottom: 2,
            left: 3,
            right: 4,
        };
        assert_eq!(hard.rotated(Orientation::Portrait), hard);
        let turned = hard.rotated(Orientation::Landscape);
        assert_eq!((turned.top, turned.bottom, turned.left, turned.right), (4, 3, 1, 2));
    }
}
