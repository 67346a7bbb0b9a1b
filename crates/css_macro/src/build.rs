use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{
  ArrayLit, ComputedPropName, Expr, ExprOrSpread, IdentName, KeyValueProp, Lit, Null, Number,
  ObjectLit, Prop, PropName, PropOrSpread, Str, Tpl, TplElement, UnaryExpr, UnaryOp,
};

use crate::placeholder::{PlaceholderContext, PlaceholderTable, TextPart};
use crate::value_tree::ValueTree;

/// Converts a [`ValueTree`] back into expression nodes, re-inserting the
/// original interpolations wherever a placeholder token survived projection.
///
/// Building only reads the tree and the table.
pub struct ExprBuilder<'a> {
  placeholders: &'a PlaceholderContext,
  table: &'a PlaceholderTable,
}

impl<'a> ExprBuilder<'a> {
  pub fn new(placeholders: &'a PlaceholderContext, table: &'a PlaceholderTable) -> Self {
    ExprBuilder {
      placeholders,
      table,
    }
  }

  pub fn build(&self, value: &ValueTree) -> Expr {
    match value {
      ValueTree::Null => Expr::Lit(Lit::Null(Null { span: DUMMY_SP })),
      ValueTree::Number(n) => number_expr(*n),
      ValueTree::String(s) => self.build_string(s),
      ValueTree::List(items) => Expr::Array(ArrayLit {
        span: DUMMY_SP,
        elems: items
          .iter()
          .map(|item| {
            Some(ExprOrSpread {
              spread: None,
              expr: Box::new(self.build(item)),
            })
          })
          .collect(),
      }),
      ValueTree::Map(map) => Expr::Object(ObjectLit {
        span: DUMMY_SP,
        props: map
          .iter()
          .map(|(key, value)| {
            PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
              key: self.build_key(key),
              value: Box::new(self.build(value)),
            })))
          })
          .collect(),
      }),
      ValueTree::Bool(b) => str_expr(&b.to_string()),
    }
  }

  fn build_key(&self, key: &str) -> PropName {
    match self.build_string(key) {
      Expr::Lit(Lit::Str(s)) if is_identifier_name(&s.value) => PropName::Ident(IdentName {
        span: DUMMY_SP,
        sym: s.value,
      }),
      Expr::Lit(Lit::Str(s)) => PropName::Str(s),
      expr => PropName::Computed(ComputedPropName {
        span: DUMMY_SP,
        expr: Box::new(expr),
      }),
    }
  }

  /// Strings without placeholders stay string literals. Otherwise the result is
  /// a template literal, or the interpolated expression itself when it is the
  /// only content apart from whitespace.
  fn build_string(&self, value: &str) -> Expr {
    let parts = self.placeholders.split(value);
    if parts.len() == 1 {
      return str_expr(value);
    }

    let mut quasis = vec![String::new()];
    let mut exprs: Vec<Box<Expr>> = vec![];

    for part in parts {
      match part {
        TextPart::Placeholder(token) => match self.table.get(token) {
          Some(expr) => {
            exprs.push(Box::new(expr.clone()));
            quasis.push(String::new());
          }
          None => push_text(&mut quasis, token),
        },
        TextPart::Literal(text) => push_text(&mut quasis, text),
      }
    }

    if exprs.is_empty() {
      return str_expr(value);
    }

    if exprs.len() == 1 && quasis.iter().all(|q| q.trim().is_empty()) {
      return *exprs.remove(0);
    }

    let last = quasis.len() - 1;
    Expr::Tpl(Tpl {
      span: DUMMY_SP,
      exprs,
      quasis: quasis
        .into_iter()
        .enumerate()
        .map(|(idx, cooked)| TplElement {
          span: DUMMY_SP,
          tail: idx == last,
          raw: escape_template_raw(&cooked).into(),
          cooked: Some(cooked.into()),
        })
        .collect(),
    })
  }
}

fn push_text(quasis: &mut [String], text: &str) {
  if let Some(current) = quasis.last_mut() {
    current.push_str(text);
  }
}

fn str_expr(value: &str) -> Expr {
  Expr::Lit(Lit::Str(Str {
    span: DUMMY_SP,
    value: value.into(),
    raw: None,
  }))
}

fn number_expr(value: f64) -> Expr {
  let literal = |value: f64| {
    Expr::Lit(Lit::Num(Number {
      span: DUMMY_SP,
      value,
      raw: None,
    }))
  };

  if value < 0.0 {
    Expr::Unary(UnaryExpr {
      span: DUMMY_SP,
      op: UnaryOp::Minus,
      arg: Box::new(literal(-value)),
    })
  } else {
    literal(value)
  }
}

fn is_identifier_name(value: &str) -> bool {
  let mut chars = value.chars();
  chars
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn escape_template_raw(cooked: &str) -> String {
  cooked
    .replace('\\', "\\\\")
    .replace('`', "\\`")
    .replace("${", "\\${")
}
