use indexmap::IndexMap;
use swc_core::common::input::StringInput;
use swc_core::common::sync::Lrc;
use swc_core::common::{BytePos, FileName, SourceMap, Span};
use swc_core::css::ast::{AtRule, AtRuleName, ComponentValue, Declaration, Rule, Stylesheet};
use swc_core::css::parser::error::Error as CssParserError;
use swc_core::css::parser::{parse_string_input, parser::ParserConfig};

use crate::errors::StyleParseError;
use crate::value_tree::ValueTree;

/// Selector of the synthetic rule wrapping the style text, so bare declarations
/// at the top of a template parse the same way as nested ones.
const ROOT_SELECTOR: &str = "__css_macro_root__";

/// Properties whose numeric values are emitted as numbers rather than strings
const UNITLESS: &[&str] = &[
  "boxFlex",
  "boxFlexGroup",
  "columnCount",
  "flex",
  "flexGrow",
  "flexPositive",
  "flexShrink",
  "flexNegative",
  "fontWeight",
  "lineClamp",
  "lineHeight",
  "opacity",
  "order",
  "orphans",
  "tabSize",
  "widows",
  "zIndex",
  "zoom",
  "fillOpacity",
  "strokeDashoffset",
  "strokeOpacity",
  "strokeWidth",
];

/// Parse `text` as a SCSS-flavoured style sheet and project it into a [`ValueTree`]
///
/// * rules become maps keyed by their selector text
/// * declarations become `camelCasedProperty: value` entries
/// * at-rules are keyed by `@name params`; repeated keys turn into lists
pub fn objectify(text: &str) -> Result<ValueTree, StyleParseError> {
  let prefix = format!("{ROOT_SELECTOR} {{");
  // The newline keeps a trailing `//` comment from swallowing the closing brace
  let source = format!("{prefix}{text}\n}}");

  let source_map: Lrc<SourceMap> = Default::default();
  let source_file = source_map.new_source_file(Lrc::new(FileName::Anon), source.clone());

  let projector = Projector {
    source: &source,
    text,
    start_pos: source_file.start_pos,
    prefix_len: prefix.len(),
  };

  let mut errors = vec![];
  let stylesheet = parse_string_input::<Stylesheet>(
    StringInput::from(&*source_file),
    None,
    ParserConfig {
      allow_wrong_line_comments: true,
      // `a { color: red; }` inside a block is a rule, not a declaration
      legacy_nesting: true,
      ..Default::default()
    },
    &mut errors,
  )
  .map_err(|err| projector.parser_error(err))?;

  if let Some(err) = errors.into_iter().next() {
    return Err(projector.parser_error(err));
  }

  let mut rules = stylesheet.rules.iter();
  let root = match (rules.next(), rules.next()) {
    (Some(Rule::QualifiedRule(root)), None) => root,
    (_, Some(extra)) => {
      return Err(projector.error_at(rule_span(extra), "Unexpected '}'"));
    }
    _ => {
      return Err(StyleParseError::at_offset(
        text,
        0,
        "Expected a list of declarations and rules",
      ))
    }
  };

  let mut map = IndexMap::new();
  projector.project_into(&root.block.value, &mut map, false);
  Ok(ValueTree::Map(map))
}

fn rule_span(rule: &Rule) -> Span {
  match rule {
    Rule::QualifiedRule(rule) => rule.span,
    Rule::AtRule(rule) => rule.span,
    Rule::ListOfComponentValues(list) => list.span,
  }
}

struct Projector<'a> {
  /// Wrapped text handed to the parser
  source: &'a str,
  /// Text as assembled from the template
  text: &'a str,
  start_pos: BytePos,
  prefix_len: usize,
}

impl<'a> Projector<'a> {
  fn offset(&self, pos: BytePos) -> usize {
    pos.0.saturating_sub(self.start_pos.0) as usize
  }

  fn slice(&self, lo: BytePos, hi: BytePos) -> &'a str {
    self
      .source
      .get(self.offset(lo)..self.offset(hi))
      .unwrap_or_default()
  }

  fn error_at(&self, span: Span, message: impl Into<String>) -> StyleParseError {
    let offset = self.offset(span.lo).saturating_sub(self.prefix_len);
    StyleParseError::at_offset(self.text, offset, message)
  }

  fn parser_error(&self, err: CssParserError) -> StyleParseError {
    let message = err.message().to_string();
    let (span, _) = *err.into_inner();
    self.error_at(span, message)
  }

  fn project_into(
    &self,
    values: &[ComponentValue],
    map: &mut IndexMap<String, ValueTree>,
    in_export: bool,
  ) {
    for value in values {
      match value {
        ComponentValue::Declaration(decl) => {
          let (key, value) = self.declaration(decl, in_export);
          ValueTree::push_value(map, key, value);
        }
        ComponentValue::QualifiedRule(rule) => {
          let selector = self.slice(rule.span.lo, rule.block.span.lo).trim();
          self.merge_rule(map, selector, &rule.block.value);
        }
        ComponentValue::KeyframeBlock(block) => {
          let selector = self.slice(block.span.lo, block.block.span.lo).trim();
          self.merge_rule(map, selector, &block.block.value);
        }
        ComponentValue::AtRule(at_rule) => {
          let (key, value) = self.at_rule(at_rule);
          ValueTree::push_value(map, key, value);
        }
        ComponentValue::ListOfComponentValues(list) => {
          self.project_into(&list.children, map, in_export);
        }
        other => {
          tracing::trace!("Skipping component value {:?}", other);
        }
      }
    }
  }

  /// A repeated selector merges into the existing entry, later declarations win.
  fn merge_rule(
    &self,
    map: &mut IndexMap<String, ValueTree>,
    selector: &str,
    values: &[ComponentValue],
  ) {
    let mut body = IndexMap::new();
    self.project_into(values, &mut body, selector == ":export");

    match map.get_mut(selector) {
      Some(ValueTree::Map(existing)) => existing.extend(body),
      _ => {
        map.insert(selector.to_string(), ValueTree::Map(body));
      }
    }
  }

  fn declaration(&self, decl: &Declaration, in_export: bool) -> (String, ValueTree) {
    let hi = match &decl.important {
      Some(important) if important.span.hi > decl.span.hi => important.span.hi,
      _ => decl.span.hi,
    };
    let raw = self.slice(decl.span.lo, hi);
    let (prop, value) = raw.split_once(':').unwrap_or((raw, ""));
    let prop = prop.trim();

    let mut value = value.trim().trim_end_matches(';').trim_end();
    if decl.important.is_some() {
      if let Some(idx) = value.rfind('!') {
        value = value[..idx].trim_end();
      }
    }

    let key = if prop.starts_with("--") || in_export {
      prop.to_string()
    } else {
      camel_case(prop)
    };

    let projected = match parse_number(value) {
      Some(number) if UNITLESS.contains(&key.as_str()) => ValueTree::Number(number),
      _ => ValueTree::String(value.to_string()),
    };

    let projected = match (decl.important.is_some(), projected) {
      (true, ValueTree::Number(_)) | (true, ValueTree::String(_)) => {
        ValueTree::String(format!("{value} !important"))
      }
      (_, projected) => projected,
    };

    (key, projected)
  }

  fn at_rule(&self, at_rule: &AtRule) -> (String, ValueTree) {
    let name = match &at_rule.name {
      AtRuleName::Ident(ident) => ident.value.to_string(),
      AtRuleName::DashedIdent(ident) => ident.value.to_string(),
    };

    let prelude_start = at_rule.span.lo + BytePos(1 + name.len() as u32);
    let prelude_end = match &at_rule.block {
      Some(block) => block.span.lo,
      None => at_rule.span.hi,
    };
    let params = if prelude_end > prelude_start {
      self
        .slice(prelude_start, prelude_end)
        .trim()
        .trim_end_matches(';')
        .trim_end()
    } else {
      ""
    };

    let key = if params.is_empty() {
      format!("@{name}")
    } else {
      format!("@{name} {params}")
    };

    let value = match &at_rule.block {
      Some(block) => {
        let mut body = IndexMap::new();
        self.project_into(&block.value, &mut body, false);
        ValueTree::Map(body)
      }
      None => ValueTree::Bool(true),
    };

    (key, value)
  }
}

/// `font-size` -> `fontSize`, `-webkit-box` -> `WebkitBox`, `-ms-grid` -> `msGrid`
pub fn camel_case(property: &str) -> String {
  let property = property.to_lowercase();
  if property == "float" {
    return "cssFloat".to_string();
  }

  let property = match property.strip_prefix("-ms-") {
    Some(rest) => format!("ms-{rest}"),
    None => property,
  };

  let mut result = String::with_capacity(property.len());
  let mut chars = property.chars().peekable();
  while let Some(c) = chars.next() {
    match chars.peek() {
      Some(next) if c == '-' && (next.is_ascii_alphanumeric() || *next == '_') => {
        result.push(next.to_ascii_uppercase());
        chars.next();
      }
      None if c == '-' => {}
      _ => result.push(c),
    }
  }
  result
}

fn parse_number(value: &str) -> Option<f64> {
  if value.is_empty()
    || !value
      .chars()
      .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
  {
    return None;
  }
  value.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
  use indoc::indoc;
  use pretty_assertions::assert_eq;

  use super::*;

  fn map(entries: Vec<(&str, ValueTree)>) -> ValueTree {
    ValueTree::Map(
      entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect(),
    )
  }

  #[test]
  fn test_selector_list_with_custom_property() {
    let tree = objectify(indoc! {r#"
      .btn,
      .other-btn {
        --theme-color: blue;

        color: red MACRO_PH_0_ABC123;
      }
    "#})
    .unwrap();

    assert_eq!(
      tree,
      map(vec![(
        ".btn,\n.other-btn",
        map(vec![
          ("--theme-color", "blue".into()),
          ("color", "red MACRO_PH_0_ABC123".into()),
        ])
      )])
    );
  }

  #[test]
  fn test_repeated_at_rules_become_a_list() {
    let tree = objectify(indoc! {r#"
      @media (max-width: 200px) {
        .btn {
          width: 30px;
        }
      }
      @media (max-width: 200px) {
        .other-btn {
          width: 30px;
        }
      }
    "#})
    .unwrap();

    assert_eq!(
      tree,
      map(vec![(
        "@media (max-width: 200px)",
        ValueTree::List(vec![
          map(vec![(".btn", map(vec![("width", "30px".into())]))]),
          map(vec![(".other-btn", map(vec![("width", "30px".into())]))]),
        ])
      )])
    );
  }

  #[test]
  fn test_root_declarations_and_nesting() {
    let tree = objectify(indoc! {r#"
      font-size: 12px;
      -webkit-box-flex: 1;
      // a line comment
      &:hover {
        z-index: 10;
        opacity: .5 !important;
      }
    "#})
    .unwrap();

    assert_eq!(
      tree,
      map(vec![
        ("fontSize", "12px".into()),
        ("WebkitBoxFlex", "1".into()),
        (
          "&:hover",
          map(vec![
            ("zIndex", ValueTree::Number(10.0)),
            ("opacity", ".5 !important".into()),
          ])
        ),
      ])
    );
  }

  #[test]
  fn test_repeated_declarations_and_selectors() {
    let tree = objectify(indoc! {r#"
      display: -webkit-box;
      display: flex;
      a { color: red; }
      a { color: blue; margin: 0; }
    "#})
    .unwrap();

    assert_eq!(
      tree,
      map(vec![
        (
          "display",
          ValueTree::List(vec!["-webkit-box".into(), "flex".into()])
        ),
        (
          "a",
          map(vec![("color", "blue".into()), ("margin", "0".into())])
        ),
      ])
    );
  }

  #[test]
  fn test_type_selectors_at_root() {
    assert_eq!(
      objectify("a { color: red; }").unwrap(),
      map(vec![("a", map(vec![("color", "red".into())]))])
    );
    assert_eq!(
      objectify("div { color: red; } span { top: 0 }").unwrap(),
      map(vec![
        ("div", map(vec![("color", "red".into())])),
        ("span", map(vec![("top", "0".into())])),
      ])
    );
    assert_eq!(
      objectify("a:hover, b > c { top: 0 }").unwrap(),
      map(vec![("a:hover, b > c", map(vec![("top", "0".into())]))])
    );
    assert_eq!(
      objectify("MACRO_PH_0_ABC123 { color: red; }").unwrap(),
      map(vec![(
        "MACRO_PH_0_ABC123",
        map(vec![("color", "red".into())])
      )])
    );
  }

  #[test]
  fn test_type_selectors_nested_in_rules_and_media() {
    let tree = objectify(indoc! {r#"
      .list {
        margin: 0;
        li { color: blue; }
      }
      @media (min-width: 500px) {
        ul { padding: 0 }
      }
    "#})
    .unwrap();

    assert_eq!(
      tree,
      map(vec![
        (
          ".list",
          map(vec![
            ("margin", "0".into()),
            ("li", map(vec![("color", "blue".into())])),
          ])
        ),
        (
          "@media (min-width: 500px)",
          map(vec![("ul", map(vec![("padding", "0".into())]))])
        ),
      ])
    );
  }

  #[test]
  fn test_empty_text() {
    assert_eq!(objectify("").unwrap(), ValueTree::map());
    assert_eq!(objectify("  // nothing here").unwrap(), ValueTree::map());
  }

  #[test]
  fn test_unbalanced_braces_are_errors() {
    assert!(objectify("a { color: red; }}\nb { color: blue; }").is_err());
    assert!(objectify("a { color: red;").is_err());
  }

  #[test]
  fn test_camel_case() {
    assert_eq!(camel_case("background-color"), "backgroundColor");
    assert_eq!(camel_case("-webkit-transition"), "WebkitTransition");
    assert_eq!(camel_case("-ms-transform"), "msTransform");
    assert_eq!(camel_case("float"), "cssFloat");
    assert_eq!(camel_case("COLOR"), "color");
    assert_eq!(camel_case("grid-area-1"), "gridArea1");
    assert_eq!(camel_case("foo-"), "foo");
    assert_eq!(camel_case("foo-_bar"), "foo_bar");
    assert_eq!(
      camel_case("backgroundMACRO_PH_3_ABC123"),
      "backgroundmacro_ph_3_abc123"
    );
  }

  #[test]
  fn test_parse_number() {
    assert_eq!(parse_number("1"), Some(1.0));
    assert_eq!(parse_number(".5"), Some(0.5));
    assert_eq!(parse_number("-2"), Some(-2.0));
    assert_eq!(parse_number("1px"), None);
    assert_eq!(parse_number("inf"), None);
    assert_eq!(parse_number(""), None);
  }
}
