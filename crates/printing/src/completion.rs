//! Candidate values for shell completion and error messages.

use crate::job::PrinterCapabilities;
use crate::platform::PrintSystem;

fn matches_word(candidate: &str, word: &str) -> bool {
    word.is_empty() || candidate.to_lowercase().contains(&word.to_lowercase())
}

/// Installed printers whose name contains `word`.
pub fn printer_names<S>(system: &S, word: &str) -> Result<Vec<String>, S::Error>
where
    S: PrintSystem + ?Sized,
{
    Ok(system
        .installed_printers()?
        .into_iter()
        .filter(|name| matches_word(name, word))
        .collect())
}

/// Paper sizes the printer supports whose name contains `word`.
pub fn paper_size_names(capabilities: &PrinterCapabilities, word: &str) -> Vec<String> {
    capabilities
        .paper_sizes
        .iter()
        .map(|paper| paper.kind.name())
        .filter(|name| matches_word(name, word))
        .map(str::to_string)
        .collect()
}

/// Font families in `catalog` whose name contains `word`.
pub fn font_names(catalog: &[String], word: &str) -> Vec<String> {
    catalog
        .iter()
        .filter(|family| matches_word(family, word))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::installed_families;
    use crate::geometry::{Margins, PaperKind};
    use crate::platform::MockPrintSystem;

    #[test]
    fn printers_are_filtered_by_substring() {
        let system = MockPrintSystem::new(
            vec![
                PrinterCapabilities::standard("Office Laser", PaperKind::Letter, Margins::zero()),
                PrinterCapabilities::standard("Lab Inkjet", PaperKind::A4, Margins::zero()),
            ],
            None,
        );
        assert_eq!(printer_names(&system, "laser").unwrap(), vec!["Office Laser"]);
        assert_eq!(printer_names(&system, "").unwrap().len(), 2);
    }

    #[test]
    fn paper_sizes_and_fonts_are_filtered() {
        let caps = PrinterCapabilities::virtual_pdf();
        assert_eq!(paper_size_names(&caps, "a"), vec!["Legal", "Tabloid", "A3", "A4", "A5"]);
        assert_eq!(paper_size_names(&caps, "").len(), 10);
        assert_eq!(
            font_names(&installed_families(), "times"),
            vec!["Times", "Times New Roman"]
        );
    }
}
