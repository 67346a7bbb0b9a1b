use css_macro::{CssMacroConfig, CssMacroVisitor};
use swc_core::common::errors::HANDLER;
use swc_core::common::{Span, DUMMY_SP};
use swc_core::ecma::ast::Program;
use swc_core::ecma::visit::VisitMutWith;
use swc_core::plugin::metadata::TransformPluginMetadataContextKind;
use swc_core::plugin::{plugin_transform, proxies::TransformPluginProgramMetadata};

fn report(span: Span, message: &str) {
  HANDLER.with(|handler| handler.struct_span_err(span, message).emit());
}

#[plugin_transform]
pub fn process_transform(
  mut program: Program,
  metadata: TransformPluginProgramMetadata,
) -> Program {
  let config = match metadata.get_transform_plugin_config() {
    Some(config_string) => match CssMacroConfig::from_json(&config_string) {
      Ok(config) => config,
      Err(err) => {
        report(DUMMY_SP, &err.to_string());
        return program;
      }
    },
    None => CssMacroConfig::default(),
  };

  let filename = metadata
    .get_context(&TransformPluginMetadataContextKind::Filename)
    .unwrap_or_else(|| "unknown".to_string());

  // Each plugin invocation handles one file, so the session is the file
  let mut placeholders = config.placeholder_context();
  let mut visitor = CssMacroVisitor::new(
    metadata.unresolved_mark,
    &filename,
    config,
    &mut placeholders,
  );
  program.visit_mut_with(&mut visitor);

  let span = visitor.error_span().unwrap_or(DUMMY_SP);
  if let Err(err) = visitor.into_result() {
    report(span, &err.to_string());
  }

  program
}
