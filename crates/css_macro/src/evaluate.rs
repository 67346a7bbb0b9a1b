use std::collections::HashMap;

use swc_core::common::{BytePos, Mark};
use swc_core::ecma::ast::{
  BinaryOp, Expr, Id, Ident, Lit, MemberProp, Module, ObjectLit, Pat, Prop, PropName,
  PropOrSpread, UnaryOp, VarDecl, VarDeclKind,
};
use swc_core::ecma::visit::{Visit, VisitWith};

/// A primitive known at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticValue {
  Str(String),
  Num(f64),
  Bool(bool),
  Null,
  Undefined,
}

impl StaticValue {
  /// Text the value produces when spliced into a template, as `String(value)` would.
  pub fn to_js_string(&self) -> String {
    match self {
      StaticValue::Str(s) => s.clone(),
      StaticValue::Num(n) => num_to_string(*n),
      StaticValue::Bool(b) => b.to_string(),
      StaticValue::Null => "null".to_string(),
      StaticValue::Undefined => "undefined".to_string(),
    }
  }

  fn to_number(&self) -> f64 {
    match self {
      StaticValue::Num(n) => *n,
      StaticValue::Bool(b) => f64::from(u8::from(*b)),
      StaticValue::Null => 0.0,
      StaticValue::Undefined => f64::NAN,
      StaticValue::Str(s) => {
        let trimmed = s.trim();
        if trimmed.is_empty() {
          0.0
        } else {
          trimmed.parse().unwrap_or(f64::NAN)
        }
      }
    }
  }

  fn is_truthy(&self) -> bool {
    match self {
      StaticValue::Str(s) => !s.is_empty(),
      StaticValue::Num(n) => *n != 0.0 && !n.is_nan(),
      StaticValue::Bool(b) => *b,
      StaticValue::Null | StaticValue::Undefined => false,
    }
  }
}

pub fn num_to_string(n: f64) -> String {
  if n.is_nan() {
    "NaN".to_string()
  } else if n == f64::INFINITY {
    "Infinity".to_string()
  } else if n == f64::NEG_INFINITY {
    "-Infinity".to_string()
  } else if n == 0.0 {
    // Covers -0
    "0".to_string()
  } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
    let exponential = format!("{n:e}");
    match exponential.split_once('e') {
      Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
      _ => exponential,
    }
  } else {
    // Shortest round-trip digits, never in exponent form
    n.to_string()
  }
}

/// A `const` initializer and the position where its declarator ends
struct ConstBinding {
  declared_at: BytePos,
  init: Box<Expr>,
}

/// Collects `const` bindings so their initializers can be folded later.
#[derive(Default)]
pub struct ConstCollector {
  consts: HashMap<Id, ConstBinding>,
}

impl Visit for ConstCollector {
  fn visit_var_decl(&mut self, node: &VarDecl) {
    if node.kind == VarDeclKind::Const && !node.declare {
      for declarator in &node.decls {
        if let (Pat::Ident(binding), Some(init)) = (&declarator.name, &declarator.init) {
          self.consts.insert(
            binding.id.to_id(),
            ConstBinding {
              declared_at: declarator.span.hi,
              init: init.clone(),
            },
          );
        }
      }
    }

    node.visit_children_with(self);
  }
}

/// Decides whether an interpolated expression is a compile-time constant.
///
/// Identifiers are looked up by resolved identity, so the module must have been
/// through the SWC resolver.
pub struct StaticEvaluator {
  consts: HashMap<Id, ConstBinding>,
  unresolved_mark: Mark,
}

impl StaticEvaluator {
  pub fn new(unresolved_mark: Mark) -> Self {
    StaticEvaluator {
      consts: HashMap::new(),
      unresolved_mark,
    }
  }

  pub fn from_module(module: &Module, unresolved_mark: Mark) -> Self {
    let mut collector = ConstCollector::default();
    module.visit_with(&mut collector);

    StaticEvaluator {
      consts: collector.consts,
      unresolved_mark,
    }
  }

  pub fn evaluate(&self, expr: &Expr) -> Option<StaticValue> {
    self.eval(expr, &mut vec![])
  }

  fn eval(&self, expr: &Expr, resolving: &mut Vec<Id>) -> Option<StaticValue> {
    match expr {
      Expr::Lit(Lit::Str(s)) => Some(StaticValue::Str(s.value.to_string())),
      Expr::Lit(Lit::Num(n)) => Some(StaticValue::Num(n.value)),
      Expr::Lit(Lit::Bool(b)) => Some(StaticValue::Bool(b.value)),
      Expr::Lit(Lit::Null(_)) => Some(StaticValue::Null),
      Expr::Paren(paren) => self.eval(&paren.expr, resolving),
      Expr::Tpl(tpl) => {
        let mut text = String::new();
        for (idx, quasi) in tpl.quasis.iter().enumerate() {
          text.push_str(quasi.cooked.as_ref()?);
          if let Some(expr) = tpl.exprs.get(idx) {
            text.push_str(&self.eval(expr, resolving)?.to_js_string());
          }
        }
        Some(StaticValue::Str(text))
      }
      Expr::Unary(unary) => {
        let arg = self.eval(&unary.arg, resolving)?;
        match unary.op {
          UnaryOp::Minus => Some(StaticValue::Num(-arg.to_number())),
          UnaryOp::Plus => Some(StaticValue::Num(arg.to_number())),
          UnaryOp::Bang => Some(StaticValue::Bool(!arg.is_truthy())),
          _ => None,
        }
      }
      Expr::Bin(bin) => {
        let left = self.eval(&bin.left, resolving)?;
        let right = self.eval(&bin.right, resolving)?;
        match bin.op {
          BinaryOp::Add => match (&left, &right) {
            (StaticValue::Str(_), _) | (_, StaticValue::Str(_)) => Some(StaticValue::Str(format!(
              "{}{}",
              left.to_js_string(),
              right.to_js_string()
            ))),
            _ => Some(StaticValue::Num(left.to_number() + right.to_number())),
          },
          BinaryOp::Sub => Some(StaticValue::Num(left.to_number() - right.to_number())),
          BinaryOp::Mul => Some(StaticValue::Num(left.to_number() * right.to_number())),
          BinaryOp::Div => Some(StaticValue::Num(left.to_number() / right.to_number())),
          BinaryOp::Mod => Some(StaticValue::Num(left.to_number() % right.to_number())),
          _ => None,
        }
      }
      Expr::Cond(cond) => {
        if self.eval(&cond.test, resolving)?.is_truthy() {
          self.eval(&cond.cons, resolving)
        } else {
          self.eval(&cond.alt, resolving)
        }
      }
      Expr::Ident(ident) => {
        if ident.ctxt.outer() == self.unresolved_mark && &*ident.sym == "undefined" {
          return Some(StaticValue::Undefined);
        }
        let init = self.resolve(ident, resolving)?;
        let value = self.eval(init, resolving);
        resolving.pop();
        value
      }
      Expr::Member(member) => {
        let Expr::Ident(obj) = &*member.obj else {
          return None;
        };
        let key = match &member.prop {
          MemberProp::Ident(name) => name.sym.to_string(),
          MemberProp::Computed(computed) => self.eval(&computed.expr, resolving)?.to_js_string(),
          MemberProp::PrivateName(_) => return None,
        };
        let Expr::Object(object) = self.resolve(obj, resolving)? else {
          resolving.pop();
          return None;
        };
        let value = object_property(object, &key).and_then(|value| self.eval(value, resolving));
        resolving.pop();
        value
      }
      _ => None,
    }
  }

  /// Look up a const initializer, refusing cycles and references that come
  /// before the declaration. On success the id is pushed onto `resolving` and
  /// the caller pops it once done.
  fn resolve<'a>(&'a self, ident: &Ident, resolving: &mut Vec<Id>) -> Option<&'a Expr> {
    let id = ident.to_id();
    if resolving.contains(&id) {
      return None;
    }
    let binding = self.consts.get(&id)?;
    if ident.span.lo < binding.declared_at {
      return None;
    }
    resolving.push(id);
    Some(&*binding.init)
  }
}

fn object_property<'a>(object: &'a ObjectLit, key: &str) -> Option<&'a Expr> {
  // Later properties win, and a spread could override anything before it
  for prop in object.props.iter().rev() {
    let PropOrSpread::Prop(prop) = prop else {
      return None;
    };
    let Prop::KeyValue(kv) = &**prop else {
      continue;
    };
    let name = match &kv.key {
      PropName::Ident(ident) => ident.sym.to_string(),
      PropName::Str(s) => s.value.to_string(),
      PropName::Num(n) => num_to_string(n.value),
      _ => continue,
    };
    if name == key {
      return Some(&kv.value);
    }
  }
  None
}
