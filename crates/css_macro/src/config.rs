use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::errors::CssMacroError;
use crate::placeholder::{PlaceholderContext, DEFAULT_PLACEHOLDER_PREFIX};

/// Matches the babel-plugin-macros import convention, eg. `../src/macro` or `css.macro`
static MACRO_SOURCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[./]macro(\.c?js)?$").unwrap());

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssMacroConfig {
  /// Module specifiers whose default import is the macro
  #[serde(default)]
  pub import_sources: Vec<String>,
  #[serde(default = "default_true")]
  pub match_macro_suffix: bool,
  /// Drop the macro import once its usages have been rewritten
  #[serde(default = "default_true")]
  pub remove_import: bool,
  #[serde(default = "default_placeholder_prefix")]
  pub placeholder_prefix: String,
}

fn default_true() -> bool {
  true
}

fn default_placeholder_prefix() -> String {
  DEFAULT_PLACEHOLDER_PREFIX.to_string()
}

impl Default for CssMacroConfig {
  fn default() -> CssMacroConfig {
    CssMacroConfig {
      import_sources: vec![],
      match_macro_suffix: true,
      remove_import: true,
      placeholder_prefix: default_placeholder_prefix(),
    }
  }
}

impl CssMacroConfig {
  pub fn from_json(json: &str) -> Result<Self, CssMacroError> {
    let config: CssMacroConfig =
      serde_json::from_str(json).map_err(|err| CssMacroError::Config(err.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Placeholder prefixes end up inside selectors and property names, so they
  /// have to lex as a single CSS identifier.
  pub fn validate(&self) -> Result<(), CssMacroError> {
    let prefix = &self.placeholder_prefix;
    let valid = prefix
      .chars()
      .next()
      .is_some_and(|c| c.is_ascii_alphabetic())
      && prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
      return Err(CssMacroError::Config(format!(
        "placeholderPrefix must start with a letter and contain only letters, digits and '_', got {prefix:?}"
      )));
    }

    Ok(())
  }

  pub fn is_macro_source(&self, source: &str) -> bool {
    self.import_sources.iter().any(|s| s == source)
      || (self.match_macro_suffix && MACRO_SOURCE_RE.is_match(source))
  }

  pub fn placeholder_context(&self) -> PlaceholderContext {
    PlaceholderContext::with_prefix(&self.placeholder_prefix)
  }
}
