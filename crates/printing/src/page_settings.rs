//! Reconciles requested paper, margins and orientation with a printer.

use tracing::debug;

use crate::error::{push_warning, MarginAxis, PrintWarning};
use crate::geometry::{Margins, Orientation, PageGeometry};
use crate::job::PrinterCapabilities;

/// Smallest printable extent the resolver will leave on either axis.
pub const MIN_PRINTABLE_EXTENT: i32 = 1;

/// Requested margins; `None` leaves the driver default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarginRequest {
    pub top: Option<i32>,
    pub bottom: Option<i32>,
    pub left: Option<i32>,
    pub right: Option<i32>,
}

impl MarginRequest {
    /// Builds a request from command-line values where any negative number means unset.
    pub fn from_sentinels(top: i32, bottom: i32, left: i32, right: i32) -> Self {
        let value = |raw: i32| (raw >= 0).then_some(raw);
        Self {
            top: value(top),
            bottom: value(bottom),
            left: value(left),
            right: value(right),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSettingsRequest {
    pub paper_size: Option<String>,
    pub margins: MarginRequest,
    pub landscape: bool,
}

/// Resolves one edge: unset keeps the default, anything in `0..=minimum` becomes the minimum.
pub fn resolve_margin(requested: Option<i32>, minimum: i32, default: i32) -> i32 {
    match requested {
        Some(value) if value > minimum => value,
        Some(value) if value >= 0 => minimum,
        _ => default.max(minimum),
    }
}

/// Produces a complete page geometry for `capabilities`.
pub fn resolve_page_settings(
    capabilities: &PrinterCapabilities,
    request: &PageSettingsRequest,
    warnings: &mut Vec<PrintWarning>,
) -> PageGeometry {
    let mut paper = capabilities.default_paper;
    if let Some(requested) = request.paper_size.as_deref() {
        match capabilities.find_paper(requested) {
            Some(found) => paper = found,
            None => push_warning(
                warnings,
                PrintWarning::UnknownPaperSize {
                    requested: requested.to_string(),
                    fallback: paper.kind.to_string(),
                },
            ),
        }
    }

    let orientation = Orientation::from_landscape(request.landscape);
    let (page_width, page_height) = paper.oriented(orientation);
    let area = capabilities.printable_area(paper, orientation);

    let minimum = Margins {
        top: area.y.ceil() as i32,
        bottom: (page_height as f32 - area.bottom()).ceil().max(0.0) as i32,
        left: area.x.ceil() as i32,
        right: (page_width as f32 - area.right()).ceil().max(0.0) as i32,
    };
    let defaults = capabilities.default_margins;
    let mut margins = Margins {
        top: resolve_margin(request.margins.top, minimum.top, defaults.top),
        bottom: resolve_margin(request.margins.bottom, minimum.bottom, defaults.bottom),
        left: resolve_margin(request.margins.left, minimum.left, defaults.left),
        right: resolve_margin(request.margins.right, minimum.right, defaults.right),
    };

    if fit_axis(
        &mut margins.top,
        &mut margins.bottom,
        minimum.top,
        minimum.bottom,
        page_height,
    ) {
        push_warning(
            warnings,
            PrintWarning::MarginsClamped {
                axis: MarginAxis::Vertical,
            },
        );
    }
    if fit_axis(
        &mut margins.left,
        &mut margins.right,
        minimum.left,
        minimum.right,
        page_width,
    ) {
        push_warning(
            warnings,
            PrintWarning::MarginsClamped {
                axis: MarginAxis::Horizontal,
            },
        );
    }

    let geometry = PageGeometry {
        paper,
        orientation,
        printable_area: area,
        margins,
    };
    debug!(
        printer = %capabilities.name,
        paper = %paper.kind,
        ?orientation,
        "set margins to: top={}, bottom={}, left={}, right={}",
        margins.top,
        margins.bottom,
        margins.left,
        margins.right
    );
    debug!(
        "print area is {:.2} inches tall x {:.2} inches wide",
        geometry.printable_height() as f32 / 100.0,
        geometry.printable_width() as f32 / 100.0
    );
    geometry
}

/// Shrinks the far edge, then the near edge, until the axis keeps a printable extent.
fn fit_axis(near: &mut i32, far: &mut i32, near_min: i32, far_min: i32, extent: i32) -> bool {
    let limit = extent - MIN_PRINTABLE_EXTENT;
    if *near + *far <= limit {
        return false;
    }
    *far = (limit - *near).max(far_min);
    if *near + *far > limit {
        *near = (limit - *far).max(near_min);
    }
    true
}
