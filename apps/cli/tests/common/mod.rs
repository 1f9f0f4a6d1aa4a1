use std::io::Read;

use flate2::read::ZlibDecoder;

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Concatenated stream bodies of a PDF, inflated where they are compressed.
pub fn page_content(bytes: &[u8]) -> String {
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

/// Width and height of the first media box, in points.
pub fn media_box(bytes: &[u8]) -> (f64, f64) {
    let raw = String::from_utf8_lossy(bytes);
    let start = raw.find("/MediaBox").expect("media box");
    let open = start + raw[start..].find('[').expect("media box array");
    let close = open + raw[open..].find(']').expect("media box end");
    let numbers: Vec<f64> = raw[open + 1..close]
        .split_whitespace()
        .map(|token| token.parse().expect("media box number"))
        .collect();
    (numbers[2], numbers[3])
}

pub fn assert_points(actual: (f64, f64), expected: (f64, f64)) {
    assert!(
        (actual.0 - expected.0).abs() < 0.01 && (actual.1 - expected.1).abs() < 0.01,
        "media box {actual:?}, expected {expected:?}"
    );
}
