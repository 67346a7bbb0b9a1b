use indexmap::IndexMap;

/// Object-shaped projection of a style sheet, mirroring the object literal that
/// replaces a macro usage. Map entries keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTree {
  Null,
  /// Only produced for body-less at-rules such as `@import url(a.css);`
  Bool(bool),
  Number(f64),
  /// May embed placeholder tokens.
  String(String),
  List(Vec<ValueTree>),
  Map(IndexMap<String, ValueTree>),
}

impl ValueTree {
  pub fn map() -> Self {
    ValueTree::Map(IndexMap::new())
  }

  /// Store `value` under `key` in `map`. A repeated key turns the entry into a
  /// list holding every value in source order.
  pub fn push_value(map: &mut IndexMap<String, ValueTree>, key: String, value: ValueTree) {
    match map.get_mut(&key) {
      None => {
        map.insert(key, value);
      }
      Some(ValueTree::List(items)) => items.push(value),
      Some(existing) => {
        let first = std::mem::replace(existing, ValueTree::Null);
        *existing = ValueTree::List(vec![first, value]);
      }
    }
  }
}

impl From<&str> for ValueTree {
  fn from(value: &str) -> Self {
    ValueTree::String(value.to_string())
  }
}
