use std::collections::HashSet;

use swc_core::common::sync::Lrc;
use swc_core::common::{Mark, SourceMap, Span};
use swc_core::ecma::ast::{
  ExportSpecifier, Expr, Id, ImportDecl, ImportSpecifier, Module, ModuleDecl, ModuleExportName,
  ModuleItem, NamedExport, Prop, TaggedTpl,
};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::build::ExprBuilder;
use crate::collect::InterpolationCollector;
use crate::config::CssMacroConfig;
use crate::errors::{CssMacroError, SourceLocation};
use crate::evaluate::StaticEvaluator;
use crate::objectify::objectify;
use crate::placeholder::PlaceholderContext;

/// Replaces every `css`...`` usage of the macro's default import with the
/// object literal its style text describes.
///
/// Usages are rewritten outermost first. Nested usages of the same binding
/// are inlined into the outer style text by the collector and recorded as
/// processed, so each site is rewritten at most once even when the visitor
/// runs over the module again.
///
/// The first error stops further rewriting, see [`CssMacroVisitor::into_result`].
pub struct CssMacroVisitor<'a> {
  unresolved_mark: Mark,
  filename: String,
  config: CssMacroConfig,
  placeholders: &'a mut PlaceholderContext,
  source_map: Option<Lrc<SourceMap>>,

  macro_ids: HashSet<Id>,
  evaluator: StaticEvaluator,
  processed: HashSet<Span>,
  rewritten: usize,
  error: Option<(Span, CssMacroError)>,
}

impl<'a> CssMacroVisitor<'a> {
  pub fn new(
    unresolved_mark: Mark,
    filename: &str,
    config: CssMacroConfig,
    placeholders: &'a mut PlaceholderContext,
  ) -> Self {
    CssMacroVisitor {
      unresolved_mark,
      filename: filename.to_string(),
      config,
      placeholders,
      source_map: None,

      macro_ids: HashSet::new(),
      evaluator: StaticEvaluator::new(unresolved_mark),
      processed: HashSet::new(),
      rewritten: 0,
      error: None,
    }
  }

  /// Used to add line and column to diagnostics
  pub fn with_source_map(mut self, source_map: Lrc<SourceMap>) -> Self {
    self.source_map = Some(source_map);
    self
  }

  pub fn rewritten(&self) -> usize {
    self.rewritten
  }

  /// Span of the usage site that failed, if any
  pub fn error_span(&self) -> Option<Span> {
    self.error.as_ref().map(|(span, _)| *span)
  }

  /// Number of rewritten usage sites, or the first error met during traversal
  pub fn into_result(self) -> Result<usize, CssMacroError> {
    match self.error {
      Some((_, error)) => Err(error),
      None => Ok(self.rewritten),
    }
  }

  fn is_macro_import(&self, import: &ImportDecl) -> bool {
    !import.type_only && self.config.is_macro_source(&import.src.value)
  }

  fn collect_macro_bindings(&mut self, module: &Module) {
    for item in &module.body {
      let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
        continue;
      };
      if !self.is_macro_import(import) {
        continue;
      }

      for specifier in &import.specifiers {
        match specifier {
          ImportSpecifier::Default(default) => {
            self.macro_ids.insert(default.local.to_id());
          }
          ImportSpecifier::Named(named) => {
            tracing::warn!(
              "{}: ignoring named import `{}` from {:?}, only the default export is a macro",
              self.filename,
              named.local.sym,
              import.src.value
            );
          }
          ImportSpecifier::Namespace(namespace) => {
            tracing::warn!(
              "{}: ignoring namespace import `{}` from {:?}, only the default export is a macro",
              self.filename,
              namespace.local.sym,
              import.src.value
            );
          }
        }
      }
    }
  }

  fn remove_macro_imports(&self, module: &mut Module) {
    module.body.retain(|item| match item {
      ModuleItem::ModuleDecl(ModuleDecl::Import(import)) if self.is_macro_import(import) => {
        !import.specifiers.iter().any(|specifier| {
          matches!(specifier, ImportSpecifier::Default(default) if self.macro_ids.contains(&default.local.to_id()))
        })
      }
      _ => true,
    });
  }

  fn macro_tag(&self, tag: &Expr) -> Option<Id> {
    match tag {
      Expr::Ident(ident) if self.macro_ids.contains(&ident.to_id()) => Some(ident.to_id()),
      _ => None,
    }
  }

  fn location(&self, span: Span) -> Option<SourceLocation> {
    let source_map = self.source_map.as_ref()?;
    if span.is_dummy() {
      return None;
    }
    let loc = source_map.lookup_char_pos(span.lo);
    Some(SourceLocation {
      line: loc.line,
      column: loc.col.0 + 1,
    })
  }

  fn fail(&mut self, span: Span, error: CssMacroError) {
    if self.error.is_none() {
      self.error = Some((span, error));
    }
  }

  fn usage_error(&mut self, span: Span, name: &str) {
    let error = CssMacroError::Usage {
      filename: self.filename.clone(),
      location: self.location(span),
      message: format!("`{name}` macro must be used as a tagged template"),
    };
    self.fail(span, error);
  }

  fn rewrite(&mut self, tagged: &TaggedTpl, tag: Id) -> Result<Expr, CssMacroError> {
    let collected =
      InterpolationCollector::new(tag, &self.evaluator, &mut *self.placeholders).collect(&tagged.tpl);

    let tree = objectify(&collected.text).map_err(|source| CssMacroError::Parse {
      filename: self.filename.clone(),
      location: self.location(tagged.span),
      source,
    })?;

    let expr = ExprBuilder::new(&*self.placeholders, &collected.table).build(&tree);

    tracing::debug!(
      "{}: rewrote usage with {} placeholders and {} inlined usages",
      self.filename,
      collected.table.len(),
      collected.inlined.len()
    );

    // Synthesized nodes all share the dummy span and cannot be told apart
    self.processed.extend(
      std::iter::once(tagged.span)
        .chain(collected.inlined)
        .filter(|span| !span.is_dummy()),
    );
    self.rewritten += 1;

    Ok(expr)
  }
}

impl VisitMut for CssMacroVisitor<'_> {
  fn visit_mut_module(&mut self, module: &mut Module) {
    self.collect_macro_bindings(module);
    if self.macro_ids.is_empty() {
      return;
    }

    self.evaluator = StaticEvaluator::from_module(module, self.unresolved_mark);
    module.visit_mut_children_with(self);

    if self.error.is_none() && self.config.remove_import {
      self.remove_macro_imports(module);
    }
  }

  fn visit_mut_expr(&mut self, node: &mut Expr) {
    if self.error.is_some() {
      return;
    }

    match node {
      Expr::TaggedTpl(tagged) => {
        if let Some(tag) = self.macro_tag(&tagged.tag) {
          let span = tagged.span;
          if self.processed.contains(&span) {
            return;
          }

          match self.rewrite(tagged, tag) {
            Ok(replacement) => *node = replacement,
            Err(error) => {
              self.fail(span, error);
              return;
            }
          }
        }
      }
      Expr::Ident(ident) if self.macro_ids.contains(&ident.to_id()) => {
        let (span, name) = (ident.span, ident.sym.to_string());
        self.usage_error(span, &name);
        return;
      }
      _ => {}
    }

    // Interpolations re-inserted by the builder may hold further usages
    node.visit_mut_children_with(self);
  }

  fn visit_mut_prop(&mut self, node: &mut Prop) {
    if let Prop::Shorthand(ident) = node {
      if self.macro_ids.contains(&ident.to_id()) {
        let (span, name) = (ident.span, ident.sym.to_string());
        self.usage_error(span, &name);
        return;
      }
    }

    node.visit_mut_children_with(self);
  }

  /// `export { css }` hands the macro itself to other modules
  fn visit_mut_named_export(&mut self, node: &mut NamedExport) {
    if self.error.is_some() || node.src.is_some() {
      return;
    }

    for specifier in &node.specifiers {
      let ExportSpecifier::Named(named) = specifier else {
        continue;
      };
      if let ModuleExportName::Ident(ident) = &named.orig {
        if self.macro_ids.contains(&ident.to_id()) {
          let (span, name) = (ident.span, ident.sym.to_string());
          self.usage_error(span, &name);
          return;
        }
      }
    }
  }
}
