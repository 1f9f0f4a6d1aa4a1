//! Header/footer templates with `&[Name]` placeholders.

use std::fmt::Write as _;

use chrono::{DateTime, Local};

/// Placeholders recognised in header/footer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateToken {
    Page,
    Date,
    Time,
    Path,
    Line,
    HistoryId,
}

impl TemplateToken {
    fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, TemplateToken); 6] = [
            ("page", TemplateToken::Page),
            ("date", TemplateToken::Date),
            ("time", TemplateToken::Time),
            ("path", TemplateToken::Path),
            ("line", TemplateToken::Line),
            ("historyid", TemplateToken::HistoryId),
        ];
        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, token)| *token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    Literal(String),
    Token(TemplateToken),
}

/// Parsed representation of a header/footer template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderFooterTemplate {
    pub segments: Vec<TemplateSegment>,
}

impl HeaderFooterTemplate {
    /// Parses `input`; unrecognised `&[...]` sequences stay literal.
    pub fn parse(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut buffer = String::new();
        let mut rest = input;

        while let Some(start) = rest.find("&[") {
            let after = &rest[start + 2..];
            let Some(end) = after.find(']') else {
                break;
            };
            match TemplateToken::from_name(&after[..end]) {
                Some(token) => {
                    buffer.push_str(&rest[..start]);
                    flush_buffer(&mut buffer, &mut segments);
                    segments.push(TemplateSegment::Token(token));
                }
                None => buffer.push_str(&rest[..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }
        buffer.push_str(rest);
        flush_buffer(&mut buffer, &mut segments);

        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn render(&self, page_number: u32, context: &JobContext) -> String {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => output.push_str(text),
                TemplateSegment::Token(token) => context.append_to(*token, page_number, &mut output),
            }
        }
        output
    }
}

fn flush_buffer(buffer: &mut String, segments: &mut Vec<TemplateSegment>) {
    if buffer.is_empty() {
        return;
    }
    segments.push(TemplateSegment::Literal(std::mem::take(buffer)));
}

/// Values fixed for the whole job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobContext {
    pub date: String,
    pub time: String,
    pub path: Option<String>,
    pub line: Option<String>,
    pub history_id: u64,
}

impl JobContext {
    /// Captures the current local date and time.
    pub fn now(path: Option<String>, line: Option<String>, history_id: u64) -> Self {
        Self::at(Local::now(), path, line, history_id)
    }

    pub fn at(
        moment: DateTime<Local>,
        path: Option<String>,
        line: Option<String>,
        history_id: u64,
    ) -> Self {
        Self {
            date: moment.format("%Y-%m-%d").to_string(),
            time: moment.format("%H:%M").to_string(),
            path,
            line,
            history_id,
        }
    }

    fn append_to(&self, token: TemplateToken, page_number: u32, buffer: &mut String) {
        match token {
            TemplateToken::Page => {
                let _ = write!(buffer, "{page_number}");
            }
            TemplateToken::Date => buffer.push_str(&self.date),
            TemplateToken::Time => buffer.push_str(&self.time),
            TemplateToken::Path => {
                if let Some(value) = &self.path {
                    buffer.push_str(value);
                }
            }
            TemplateToken::Line => {
                if let Some(value) = &self.line {
                    buffer.push_str(value);
                }
            }
            TemplateToken::HistoryId => {
                let _ = write!(buffer, "{}", self.history_id);
            }
        }
    }
}
