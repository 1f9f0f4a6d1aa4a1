//! Loading print input from files and standard input.

use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use serde_json::Value;

use crate::error::{push_warning, PrintWarning};
use crate::format::parse_json_stream;
use crate::graphic::looks_like_image;

/// How piped text should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Auto,
    Text,
    Json,
}

/// Piped input after sniffing.
#[derive(Debug, Clone, PartialEq)]
pub enum PipedInput {
    Text(String),
    Values(Vec<Value>),
    Image(Vec<u8>),
}

/// Decodes bytes as UTF-8 (BOM aware), falling back to Windows-1252.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom..]);
        return text.into_owned();
    }
    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text.into_owned(),
        None => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    }
}

/// Reads a text file; an unreadable file becomes a warning and `None`.
pub fn load_text_file(path: &Path, warnings: &mut Vec<PrintWarning>) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(decode_text(&bytes)),
        Err(err) => {
            push_warning(
                warnings,
                PrintWarning::UnreadableInput {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                },
            );
            None
        }
    }
}

/// Classifies piped bytes: images first, then JSON when requested or detected.
pub fn classify_piped(bytes: Vec<u8>, format: InputFormat) -> Result<PipedInput, serde_json::Error> {
    if format == InputFormat::Auto && looks_like_image(&bytes) {
        return Ok(PipedInput::Image(bytes));
    }
    let text = decode_text(&bytes);
    match format {
        InputFormat::Text => Ok(PipedInput::Text(text)),
        InputFormat::Json => parse_json_stream(&text).map(PipedInput::Values),
        InputFormat::Auto => {
            let trimmed = text.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                if let Ok(values) = parse_json_stream(&text) {
                    return Ok(PipedInput::Values(values));
                }
            }
            Ok(PipedInput::Text(text))
        }
    }
}
