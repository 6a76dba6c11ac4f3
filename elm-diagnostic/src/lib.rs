#![deny(unused_crate_dependencies)]

#[cfg(test)]
mod test;

use fnv::FnvHashMap;
use std::{fmt::Write, path::PathBuf};

#[derive(PartialEq, Eq, Debug, Hash, Clone)]
pub enum Source {
    File { path: PathBuf },
    Interactive { label: String },
}

impl Source {
    pub fn label(&self) -> String {
        match self {
            Source::File { path } => path.display().to_string(),
            Source::Interactive { label } => label.clone(),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Hash, Clone)]
pub struct Location {
    pub source: Source,
    pub offset: Option<usize>,
}

#[derive(PartialEq, Eq, Debug, Hash, Clone)]
pub struct Message {
    pub content: String,
    pub addendum: Option<String>,
}

impl Message {
    /// Split a multi-line message into its first line and the remaining lines.
    pub fn from_lines(text: &str) -> Self {
        match text.split_once('\n') {
            None => Message {
                content: String::from(text),
                addendum: None,
            },
            Some((content, addendum)) => Message {
                content: String::from(content),
                addendum: Some(String::from(addendum)),
            },
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /**
    The one-based line and column of a byte offset.

    Offsets past the end, or inside a multi-byte character, are moved back to the nearest
    character boundary.
    */
    pub fn of_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |ix| ix + 1);
        Position {
            line,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

/// Source text for each [`Source`] referenced by a report.
pub type Sources = FnvHashMap<Source, String>;

/// A report of messages, kept ordered by location.
#[derive(Default, Debug)]
pub struct Diagnostic {
    items: Vec<Message>,
    located_items: Vec<(Location, Message)>,
}

impl Diagnostic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(&mut self, location: Option<Location>, message: Message) {
        match location {
            None => self.items.push(message),
            Some(location) => {
                match self
                    .located_items
                    .binary_search_by_key(&location.offset, |i| i.0.offset)
                {
                    Err(ix) => self.located_items.insert(ix, (location, message)),
                    Ok(ix) => self.located_items.insert(ix + 1, (location, message)),
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len() + self.located_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn report_error_heading(path: &str, position: Option<Position>, message: &str) -> String {
        let mut heading = String::from(path);
        heading.push(':');
        if let Some(position) = position {
            let _ = write!(heading, "{}:{}:", position.line, position.column);
        }
        heading.push_str(" error: ");
        heading.push_str(message);
        heading
    }

    pub fn report_located_message(
        position: Position,
        path: &str,
        line_str: &str,
        message: &Message,
    ) -> String {
        let caret = format!("{}^", " ".repeat(position.column - 1));
        let gutter = " ".repeat(position.line.to_string().len());

        let mut lines = vec![
            Self::report_error_heading(path, Some(position), &message.content),
            format!("{} |", gutter),
            format!("{} | {}", position.line, line_str),
            format!("{} | {}", gutter, caret),
        ];
        if let Some(addendum) = &message.addendum {
            lines.push(addendum.clone());
        }
        lines.join("\n")
    }

    /**
    Render every item, unlocated items first, one report per item.

    Located items whose source text is missing from `sources` are reported with
    their heading only.
    */
    pub fn report_all(&self, sources: &Sources) -> String {
        let mut reports = Vec::with_capacity(self.len());

        for message in &self.items {
            let mut report = format!("error: {}", message.content);
            if let Some(addendum) = &message.addendum {
                report.push('\n');
                report.push_str(addendum);
            }
            reports.push(report);
        }

        for (location, message) in &self.located_items {
            let label = location.source.label();
            let report = match (location.offset, sources.get(&location.source)) {
                (Some(offset), Some(text)) => {
                    let position = Position::of_offset(text, offset);
                    let line_str = text.lines().nth(position.line - 1).unwrap_or("");
                    Self::report_located_message(position, &label, line_str, message)
                }
                // without the text, a byte offset says nothing about lines or columns
                _ => Self::report_error_heading(&label, None, &message.content),
            };
            reports.push(report);
        }

        reports.join("\n")
    }
}
