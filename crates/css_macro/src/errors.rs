use std::fmt;

/// 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
  pub line: usize,
  pub column: usize,
}

impl fmt::Display for SourceLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

fn display_location(location: &Option<SourceLocation>) -> String {
  match location {
    Some(location) => format!(":{location}"),
    None => String::new(),
  }
}

/// Errors that abort the transform of a file. Every message starts with the
/// file being compiled so host tooling can map it back to source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CssMacroError {
  #[error("{}{}: {}", .filename, display_location(.location), .message)]
  Usage {
    filename: String,
    location: Option<SourceLocation>,
    message: String,
  },
  #[error(
    "{}{}: Failed to parse css: {} (line {}, column {} of the style text)",
    .filename,
    display_location(.location),
    .source.message,
    .source.line,
    .source.column
  )]
  Parse {
    filename: String,
    location: Option<SourceLocation>,
    source: StyleParseError,
  },
  #[error("{filename}: Failed to parse module: {message}")]
  JsParse { filename: String, message: String },
  #[error("Invalid configuration: {0}")]
  Config(String),
  #[error("{filename}: Failed to emit code: {message}")]
  Emit { filename: String, message: String },
}

/// Failure of the style-sheet parser, positioned inside the assembled style text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct StyleParseError {
  pub message: String,
  pub line: usize,
  pub column: usize,
}

impl StyleParseError {
  /// Build an error positioned at byte `offset` of `text`.
  pub fn at_offset(text: &str, offset: usize, message: impl Into<String>) -> Self {
    let offset = offset.min(text.len());
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;

    StyleParseError {
      message: message.into(),
      line,
      column,
    }
  }
}
