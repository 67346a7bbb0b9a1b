use indexmap::IndexMap;
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;
use swc_core::ecma::ast::Expr;

pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "MACRO_PH";

const SALT_LEN: usize = 6;

/// Session state used to mint placeholder tokens.
///
/// Tokens look like `MACRO_PH_<n>_<SALT>`. The counter is never reset, so every
/// token minted through one context is distinct, and the random salt keeps the
/// format from colliding with text an author could plausibly write. The salt also
/// terminates the token, so `${a}5` can't be confused with a token numbered `...5`.
///
/// Thread one context through every file of a compilation session instead of
/// relying on process-wide state.
#[derive(Debug)]
pub struct PlaceholderContext {
  prefix: String,
  salt: String,
  counter: usize,
  pattern: Regex,
}

impl PlaceholderContext {
  pub fn new() -> Self {
    Self::with_prefix(DEFAULT_PLACEHOLDER_PREFIX)
  }

  pub fn with_prefix(prefix: &str) -> Self {
    let salt: String = rand::rng()
      .sample_iter(&Alphanumeric)
      .take(SALT_LEN)
      .map(|c| char::from(c).to_ascii_uppercase())
      .collect();
    Self::with_salt(prefix, &salt)
  }

  /// Deterministic context, mostly useful for tests.
  pub fn with_salt(prefix: &str, salt: &str) -> Self {
    let prefix = prefix.to_ascii_uppercase();
    let salt = salt.to_ascii_uppercase();
    let pattern = Regex::new(&format!(
      r"(?i){}_(\d+)_{}",
      regex::escape(&prefix),
      regex::escape(&salt)
    ))
    // prefix and salt are both escaped, the remaining pattern is static
    .unwrap();

    PlaceholderContext {
      prefix,
      salt,
      counter: 0,
      pattern,
    }
  }

  pub fn mint(&mut self) -> String {
    let token = format!("{}_{}_{}", self.prefix, self.counter, self.salt);
    self.counter += 1;
    token
  }

  /// Number of tokens minted so far.
  pub fn minted(&self) -> usize {
    self.counter
  }

  /// Split `text` around placeholder tokens, matching them case-insensitively.
  ///
  /// The result always starts and ends with a literal part (possibly empty), so
  /// a text without any token yields exactly one part.
  pub fn split<'t>(&self, text: &'t str) -> Vec<TextPart<'t>> {
    let mut parts = Vec::new();
    let mut last = 0;

    for found in self.pattern.find_iter(text) {
      parts.push(TextPart::Literal(&text[last..found.start()]));
      parts.push(TextPart::Placeholder(found.as_str()));
      last = found.end();
    }

    parts.push(TextPart::Literal(&text[last..]));
    parts
  }
}

impl Default for PlaceholderContext {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPart<'t> {
  Literal(&'t str),
  Placeholder(&'t str),
}

/// Placeholder token to original interpolated expression, in insertion order.
#[derive(Debug, Default)]
pub struct PlaceholderTable {
  entries: IndexMap<String, Box<Expr>>,
}

impl PlaceholderTable {
  pub fn insert(&mut self, token: &str, expr: Box<Expr>) {
    self.entries.insert(token.to_ascii_uppercase(), expr);
  }

  /// Look up a token as it appears in projected text. Keys may have been
  /// lower-cased or camel-cased on the way, so the lookup normalises case.
  pub fn get(&self, token: &str) -> Option<&Expr> {
    self
      .entries
      .get(&token.to_ascii_uppercase())
      .map(|expr| &**expr)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use swc_core::common::DUMMY_SP;
  use swc_core::ecma::ast::Ident;

  use super::*;

  #[test]
  fn test_minted_tokens_are_unique() {
    let mut ctx = PlaceholderContext::with_salt("MACRO_PH", "ABC123");
    let first = ctx.mint();
    let second = ctx.mint();

    assert_eq!(first, "MACRO_PH_0_ABC123");
    assert_eq!(second, "MACRO_PH_1_ABC123");
    assert_eq!(ctx.minted(), 2);
  }

  #[test]
  fn test_random_salts_differ_between_sessions() {
    let mut a = PlaceholderContext::new();
    let mut b = PlaceholderContext::new();
    // 36^6 possible salts
    assert_ne!(a.mint(), b.mint());
  }

  #[test]
  fn test_split_without_token() {
    let ctx = PlaceholderContext::with_salt("MACRO_PH", "ABC123");
    assert_eq!(ctx.split("red"), vec![TextPart::Literal("red")]);
  }

  #[test]
  fn test_split_matches_case_insensitively() {
    let ctx = PlaceholderContext::with_salt("MACRO_PH", "ABC123");
    assert_eq!(
      ctx.split("backgroundmacro_ph_3_abc123"),
      vec![
        TextPart::Literal("background"),
        TextPart::Placeholder("macro_ph_3_abc123"),
        TextPart::Literal(""),
      ]
    );
  }

  #[test]
  fn test_split_adjacent_tokens_and_trailing_digits() {
    let ctx = PlaceholderContext::with_salt("MACRO_PH", "ABC123");
    assert_eq!(
      ctx.split("MACRO_PH_1_ABC123MACRO_PH_2_ABC1235px"),
      vec![
        TextPart::Literal(""),
        TextPart::Placeholder("MACRO_PH_1_ABC123"),
        TextPart::Literal(""),
        TextPart::Placeholder("MACRO_PH_2_ABC123"),
        TextPart::Literal("5px"),
      ]
    );
  }

  #[test]
  fn test_split_ignores_tokens_from_other_sessions() {
    let ctx = PlaceholderContext::with_salt("MACRO_PH", "ABC123");
    assert_eq!(
      ctx.split("MACRO_PH_1_ZZZZZZ"),
      vec![TextPart::Literal("MACRO_PH_1_ZZZZZZ")]
    );
  }

  #[test]
  fn test_table_lookup_normalises_case() {
    let mut table = PlaceholderTable::default();
    table.insert(
      "MACRO_PH_0_ABC123",
      Box::new(Expr::Ident(Ident::new_no_ctxt("theme".into(), DUMMY_SP))),
    );

    assert!(table.get("macro_ph_0_abc123").is_some());
    assert!(table.get("Macro_ph_0_abc123").is_some());
    assert!(table.get("MACRO_PH_1_ABC123").is_none());
    assert_eq!(table.len(), 1);
  }
}
