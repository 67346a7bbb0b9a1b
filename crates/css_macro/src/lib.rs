//! Compile-time transform of `css` tagged templates into object literals.
//!
//! ```js
//! import css from 'css.macro';
//! const styles = css`.btn { color: ${theme('blue')}; }`;
//! // becomes
//! const styles = { '.btn': { color: theme('blue') } };
//! ```
//!
//! The style text of each usage is assembled with placeholder tokens standing in
//! for dynamic interpolations, parsed as SCSS-flavoured CSS, projected into a
//! [`ValueTree`] and built back into an expression with the interpolations
//! re-inserted.

pub mod build;
pub mod collect;
pub mod config;
pub mod errors;
pub mod evaluate;
pub mod macro_visitor;
pub mod objectify;
pub mod placeholder;
pub mod runner;
pub mod value_tree;

#[cfg(test)]
mod test_utils;

pub use config::CssMacroConfig;
pub use errors::{CssMacroError, SourceLocation, StyleParseError};
pub use macro_visitor::CssMacroVisitor;
pub use placeholder::{PlaceholderContext, PlaceholderTable};
pub use runner::{transform_code, TransformOutput};
pub use value_tree::ValueTree;
