use swc_core::common::Span;
use swc_core::ecma::ast::{Expr, Id, Tpl};

use crate::evaluate::StaticEvaluator;
use crate::placeholder::{PlaceholderContext, PlaceholderTable};

/// Assembles the style text of one macro usage.
///
/// Literal segments and interpolations are appended in source order so that
/// every placeholder sits exactly where its expression was written. Each
/// interpolation is, in priority order:
///
/// 1. folded into the text when it is a compile-time constant
/// 2. inlined when it is itself a usage of the same macro binding
/// 3. replaced by a fresh placeholder token recorded in the table
pub struct InterpolationCollector<'a> {
  tag: Id,
  evaluator: &'a StaticEvaluator,
  placeholders: &'a mut PlaceholderContext,
  table: PlaceholderTable,
  inlined: Vec<Span>,
}

pub struct CollectedTemplate {
  pub text: String,
  pub table: PlaceholderTable,
  /// Spans of nested usages whose text was spliced into `text`
  pub inlined: Vec<Span>,
}

impl<'a> InterpolationCollector<'a> {
  pub fn new(
    tag: Id,
    evaluator: &'a StaticEvaluator,
    placeholders: &'a mut PlaceholderContext,
  ) -> Self {
    InterpolationCollector {
      tag,
      evaluator,
      placeholders,
      table: PlaceholderTable::default(),
      inlined: vec![],
    }
  }

  pub fn collect(mut self, tpl: &Tpl) -> CollectedTemplate {
    let mut text = String::new();
    self.collect_into(tpl, &mut text);

    CollectedTemplate {
      text,
      table: self.table,
      inlined: self.inlined,
    }
  }

  fn collect_into(&mut self, tpl: &Tpl, text: &mut String) {
    for (idx, quasi) in tpl.quasis.iter().enumerate() {
      text.push_str(&quasi.raw);

      let Some(expr) = tpl.exprs.get(idx) else {
        continue;
      };

      if let Some(value) = self.evaluator.evaluate(expr) {
        tracing::trace!("Folded static interpolation {:?}", value);
        text.push_str(&value.to_js_string());
        continue;
      }

      match &**expr {
        Expr::TaggedTpl(nested) if self.is_same_tag(&nested.tag) => {
          self.inlined.push(nested.span);
          self.collect_into(&nested.tpl, text);
        }
        _ => {
          let token = self.placeholders.mint();
          tracing::trace!("Minted placeholder {}", token);
          text.push_str(&token);
          self.table.insert(&token, expr.clone());
        }
      }
    }
  }

  fn is_same_tag(&self, tag: &Expr) -> bool {
    matches!(tag, Expr::Ident(ident) if ident.to_id() == self.tag)
  }
}

#[cfg(test)]
mod tests {
  use swc_core::ecma::ast::{Decl, ModuleItem, Stmt};

  use super::*;
  use crate::test_utils::parse_test_module;

  /// Collect the tagged template initializing the last `const` of `code`.
  /// Returns the text, the number of placeholders and the number of inlined usages.
  fn collect_last(code: &str) -> (String, usize, usize) {
    parse_test_module(code, |module, unresolved_mark| {
      let evaluator = StaticEvaluator::from_module(module, unresolved_mark);
      let init = module
        .body
        .iter()
        .rev()
        .find_map(|item| match item {
          ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) => var.decls[0].init.clone(),
          _ => None,
        })
        .unwrap();
      let Expr::TaggedTpl(tagged) = *init else {
        panic!("expected a tagged template");
      };
      let Expr::Ident(tag) = &*tagged.tag else {
        panic!("expected an identifier tag");
      };

      let mut placeholders = PlaceholderContext::with_salt("MACRO_PH", "ABC123");
      let collected =
        InterpolationCollector::new(tag.to_id(), &evaluator, &mut placeholders).collect(&tagged.tpl);

      assert_eq!(collected.table.len(), placeholders.minted());
      (collected.text, collected.table.len(), collected.inlined.len())
    })
  }

  #[test]
  fn test_literal_text_only() {
    let (text, placeholders, _) = collect_last("const styles = css`color: red;`;");
    assert_eq!(text, "color: red;");
    assert_eq!(placeholders, 0);
  }

  #[test]
  fn test_dynamic_interpolations_become_placeholders_in_order() {
    let (text, placeholders, _) =
      collect_last("const styles = css`color: ${props.color}; width: ${size()}px;`;");
    assert_eq!(
      text,
      "color: MACRO_PH_0_ABC123; width: MACRO_PH_1_ABC123px;"
    );
    assert_eq!(placeholders, 2);
  }

  #[test]
  fn test_static_interpolations_are_folded() {
    let (text, placeholders, _) = collect_last(
      r#"
        const color = 'color';
        const styles = css`background${color}: red; z-index: ${1 + 1};`;
      "#,
    );
    assert_eq!(text, "backgroundcolor: red; z-index: 2;");
    assert_eq!(placeholders, 0);
  }

  #[test]
  fn test_raw_text_is_kept() {
    let (text, _, _) = collect_last(r#"const styles = css`content: "\201C";`;"#);
    assert_eq!(text, r#"content: "\201C";"#);
  }

  #[test]
  fn test_nested_usages_are_inlined() {
    let (text, placeholders, inlined) = collect_last(
      "const styles = css`a { color: ${c}; } ${css`b { color: ${d}; ${css`i { top: 0; }`} }`}`;",
    );
    assert_eq!(
      text,
      "a { color: MACRO_PH_0_ABC123; } b { color: MACRO_PH_1_ABC123; i { top: 0; } }"
    );
    assert_eq!(placeholders, 2);
    assert_eq!(inlined, 2);
  }

  #[test]
  fn test_other_tags_are_not_inlined() {
    let (text, placeholders, inlined) =
      collect_last("const styles = css`a { ${keyframes`from { top: 0; }`} }`;");
    assert_eq!(text, "a { MACRO_PH_0_ABC123 }");
    assert_eq!(placeholders, 1);
    assert_eq!(inlined, 0);
  }
}
