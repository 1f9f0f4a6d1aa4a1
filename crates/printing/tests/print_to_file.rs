use std::fs;
use std::io::{self, ErrorKind, Read};

use flate2::read::ZlibDecoder;

use outprinter_printing::{
    run_print, CancelToken, CommandOutput, CommandRunner, LpPrintSystem, MarginRequest,
    PrintInput, PrintJobError, PrintRequest, PrintWarning, PrinterTarget, VIRTUAL_PDF_PRINTER,
};
use serde_json::json;

/// A host without CUPS: only the file printer exists.
struct NoCups;

impl CommandRunner for NoCups {
    fn run(&self, program: &str, _: &[&str], _: Option<&[u8]>) -> io::Result<CommandOutput> {
        Err(io::Error::new(ErrorKind::NotFound, format!("{program} not installed")))
    }
}

fn system() -> LpPrintSystem<NoCups> {
    LpPrintSystem::with_runner(NoCups)
}

fn to_pdf(input: PrintInput, path: &std::path::Path) -> PrintRequest {
    let mut request = PrintRequest::new(input);
    request.printer = Some(VIRTUAL_PDF_PRINTER.to_string());
    request.destination = Some(path.to_path_buf());
    request
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|window| *window == needle).count()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Concatenated page content, inflating Flate-compressed streams.
fn page_content(bytes: &[u8]) -> String {
    let mut content = String::new();
    let mut rest = bytes;
    while let Some(start) = find(rest, b"stream") {
        if start >= 3 && &rest[start - 3..start] == b"end" {
            rest = &rest[start + 6..];
            continue;
        }
        let mut body = &rest[start + 6..];
        while let [b'\r' | b'\n', tail @ ..] = body {
            body = tail;
        }
        let end = find(body, b"endstream").unwrap_or(body.len());
        let raw = &body[..end];
        let mut inflated = Vec::new();
        if ZlibDecoder::new(raw).read_to_end(&mut inflated).is_ok() {
            content.push_str(&String::from_utf8_lossy(&inflated));
        } else {
            content.push_str(&String::from_utf8_lossy(raw));
        }
        rest = &body[end..];
    }
    content
}

/// Width and height of the first page's media box, in points.
fn media_box(bytes: &[u8]) -> (f64, f64) {
    let raw = String::from_utf8_lossy(bytes);
    let start = raw.find("/MediaBox").unwrap();
    let open = start + raw[start..].find('[').unwrap();
    let close = open + raw[open..].find(']').unwrap();
    let numbers: Vec<f64> = raw[open + 1..close]
        .split_whitespace()
        .map(|token| token.parse().unwrap())
        .collect();
    (numbers[2], numbers[3])
}

fn numbered_lines(count: usize) -> String {
    (0..count).map(|n| format!("line {n}\n")).collect()
}

#[test]
fn long_text_is_paginated_into_a_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.pdf");
    let mut request = to_pdf(PrintInput::Text(numbered_lines(1000)), &path);
    // 895 hundredths at 10pt Courier leave 52 lines per page.
    request.page.margins = MarginRequest {
        top: Some(105),
        ..MarginRequest::default()
    };

    let outcome = run_print(&system(), &request, &CancelToken::new()).unwrap();
    assert_eq!(outcome.summary.map(|summary| summary.pages), Some(20));
    assert!(outcome.warnings.is_empty());

    let bytes = fs::read(&path).unwrap();
    assert_eq!(count(&bytes, b"/MediaBox"), 20);
    let content = page_content(&bytes);
    assert_eq!(content.matches("(line 999) Tj").count(), 1);
    assert_eq!(content.matches(") Tj").count(), 1000);
}

#[test]
fn unknown_paper_size_warns_and_still_prints() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("paper.pdf");
    let mut request = to_pdf(PrintInput::Text("hello\n".into()), &path);
    request.page.paper_size = Some("Nonexistent".into());

    let outcome = run_print(&system(), &request, &CancelToken::new()).unwrap();
    assert!(matches!(
        outcome.warnings.as_slice(),
        [PrintWarning::UnknownPaperSize { requested, fallback }]
            if requested == "Nonexistent" && fallback == "Letter"
    ));
    assert_eq!(outcome.summary.map(|summary| summary.pages), Some(1));
    assert!(path.exists());
}

#[test]
fn landscape_a4_uses_the_rotated_media_box() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("landscape.pdf");
    let mut request = to_pdf(PrintInput::Text("wide\n".into()), &path);
    request.page.paper_size = Some("a4".into());
    request.page.landscape = true;

    run_print(&system(), &request, &CancelToken::new()).unwrap();
    let bytes = fs::read(&path).unwrap();
    let (width, height) = media_box(&bytes);
    assert!((width - 841.68).abs() < 0.01);
    assert!((height - 595.44).abs() < 0.01);
}

#[test]
fn empty_input_starts_no_job() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.pdf");
    let request = to_pdf(PrintInput::Text("\n\n".into()), &path);

    let outcome = run_print(&system(), &request, &CancelToken::new()).unwrap();
    assert_eq!(outcome.summary, None);
    assert!(!path.exists());
}

#[test]
fn existing_destination_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replace.pdf");
    fs::write(&path, b"stale contents").unwrap();
    let request = to_pdf(PrintInput::Text("fresh\n".into()), &path);

    run_print(&system(), &request, &CancelToken::new()).unwrap();
    assert!(fs::read(&path).unwrap().starts_with(b"%PDF-"));
}

#[test]
fn piped_values_are_printed_as_property_lists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("values.pdf");
    let values = vec![json!({"Name": "spooler", "Id": 4})];
    let request = to_pdf(PrintInput::Values(values), &path);

    run_print(&system(), &request, &CancelToken::new()).unwrap();
    let content = page_content(&fs::read(&path).unwrap());
    assert_eq!(content.matches("(Name : spooler) Tj").count(), 1);
    assert_eq!(content.matches("(Id   : 4) Tj").count(), 1);
}

#[test]
fn images_print_on_a_single_page() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.pdf");
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(40, 30))
        .write_to(&mut io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .unwrap();
    let request = to_pdf(PrintInput::ImageBytes(png), &path);

    let outcome = run_print(&system(), &request, &CancelToken::new()).unwrap();
    assert_eq!(outcome.summary.map(|summary| summary.pages), Some(1));
    let bytes = fs::read(&path).unwrap();
    assert_eq!(count(&bytes, b"/Subtype /Image"), 1);
    assert_eq!(count(&bytes, b"/Width 40"), 1);
    assert_eq!(count(&bytes, b"/Height 30"), 1);
}

#[test]
fn page_numbers_add_a_footer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("numbered.pdf");
    let mut request = to_pdf(PrintInput::Text(numbered_lines(120)), &path);
    request.page_numbers = true;

    run_print(&system(), &request, &CancelToken::new()).unwrap();
    let content = page_content(&fs::read(&path).unwrap());
    assert_eq!(content.matches("(Page 1) Tj").count(), 1);
    assert_eq!(content.matches("(Page 2) Tj").count(), 1);
}

#[test]
fn file_printer_requires_a_destination() {
    let mut request = PrintRequest::new(PrintInput::Text("x\n".into()));
    request.printer = Some("print to pdf".into());
    assert!(matches!(
        run_print(&system(), &request, &CancelToken::new()),
        Err(PrintJobError::DestinationRequired(_))
    ));
}

#[test]
fn unknown_printer_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut request = to_pdf(PrintInput::Text("x\n".into()), &dir.path().join("x.pdf"));
    request.printer = Some("Basement Laser".into());
    assert!(matches!(
        run_print(&system(), &request, &CancelToken::new()),
        Err(PrintJobError::PrinterNotFound { name }) if name == "Basement Laser"
    ));
}

#[test]
fn cancelled_job_reports_zero_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cancelled.pdf");
    let request = to_pdf(PrintInput::Text(numbered_lines(10)), &path);
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = run_print(&system(), &request, &cancel);
    assert!(matches!(result, Err(PrintJobError::Cancelled { pages: 0 })));
    assert!(!path.exists());
}

#[test]
fn destination_without_printer_uses_the_file_printer_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default.pdf");
    let mut request = PrintRequest::new(PrintInput::Text("x\n".into()));
    request.destination = Some(path.clone());

    let outcome = run_print(&system(), &request, &CancelToken::new()).unwrap();
    assert_eq!(
        outcome.target,
        PrinterTarget::File {
            printer: None,
            path
        }
    );
}
