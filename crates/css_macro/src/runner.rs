use std::path::{Path, PathBuf};

use swc_core::common::comments::{Comments, SingleThreadedComments};
use swc_core::common::input::StringInput;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceMap, GLOBALS};
use swc_core::ecma::ast::{EsVersion, Module, Pass, Program};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::Emitter;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, Syntax, TsSyntax};
use swc_core::ecma::transforms::base::fixer::fixer;
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::VisitMutWith;

use crate::config::CssMacroConfig;
use crate::errors::CssMacroError;
use crate::macro_visitor::CssMacroVisitor;
use crate::placeholder::PlaceholderContext;

pub struct TransformOutput {
  pub code: String,
  pub source_map: Vec<u8>,
  /// Number of usage sites replaced by object literals
  pub rewritten: usize,
}

fn is_typescript(filename: &str) -> bool {
  matches!(syntax_for_filename(filename), Syntax::Typescript(_))
}

pub fn syntax_for_filename(filename: &str) -> Syntax {
  let path = Path::new(filename);
  let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

  match extension {
    "ts" | "mts" | "cts" | "tsx" => Syntax::Typescript(TsSyntax {
      tsx: extension == "tsx",
      ..Default::default()
    }),
    _ => Syntax::Es(EsSyntax {
      jsx: extension == "jsx" || extension == "js",
      ..Default::default()
    }),
  }
}

/// Parse `code` as a module registered under `filename` in `source_map`.
pub fn parse_module(
  source_map: &Lrc<SourceMap>,
  filename: &str,
  code: &str,
  comments: Option<&SingleThreadedComments>,
) -> Result<Module, CssMacroError> {
  let source_file = source_map.new_source_file(
    Lrc::new(FileName::Real(PathBuf::from(filename))),
    code.into(),
  );

  let lexer = Lexer::new(
    syntax_for_filename(filename),
    EsVersion::latest(),
    StringInput::from(&*source_file),
    comments.map(|c| c as &dyn Comments),
  );

  let js_parse_error = |err: swc_core::ecma::parser::error::Error| CssMacroError::JsParse {
    filename: filename.to_string(),
    message: err.kind().msg().to_string(),
  };

  let mut parser = Parser::new_from(lexer);
  let module = parser.parse_module().map_err(js_parse_error)?;

  if let Some(err) = parser.take_errors().into_iter().next() {
    return Err(js_parse_error(err));
  }

  Ok(module)
}

/// Transform the macro usages of one file
///
/// * Parse `code` with SWC and resolve its identifiers
/// * Rewrite every usage site with [`CssMacroVisitor`]
/// * Emit the code and its source map
///
/// `placeholders` carries the token counter across files of one session.
pub fn transform_code(
  filename: &str,
  code: &str,
  config: &CssMacroConfig,
  placeholders: &mut PlaceholderContext,
) -> Result<TransformOutput, CssMacroError> {
  config.validate()?;

  let source_map: Lrc<SourceMap> = Default::default();
  let comments = SingleThreadedComments::default();
  let module = parse_module(&source_map, filename, code, Some(&comments))?;

  GLOBALS.set(&Globals::new(), || {
    let unresolved_mark = Mark::new();
    let top_level_mark = Mark::new();

    let mut program = Program::Module(module);
    resolver(unresolved_mark, top_level_mark, is_typescript(filename)).process(&mut program);

    let mut visitor = CssMacroVisitor::new(unresolved_mark, filename, config.clone(), placeholders)
      .with_source_map(source_map.clone());
    program.visit_mut_with(&mut visitor);
    let rewritten = visitor.into_result()?;

    // Object literals in statement position need parentheses
    fixer(Some(&comments)).process(&mut program);

    let (code, source_map) = emit_program(&source_map, &program, Some(&comments)).map_err(
      |message| CssMacroError::Emit {
        filename: filename.to_string(),
        message,
      },
    )?;

    Ok(TransformOutput {
      code,
      source_map,
      rewritten,
    })
  })
}

/// Print `program`, returning the code and its JSON source map.
pub(crate) fn emit_program(
  source_map: &Lrc<SourceMap>,
  program: &Program,
  comments: Option<&SingleThreadedComments>,
) -> Result<(String, Vec<u8>), String> {
  let mut line_pos_buffer = vec![];
  let mut output_buffer = vec![];
  {
    let writer = JsWriter::new(
      source_map.clone(),
      "\n",
      &mut output_buffer,
      Some(&mut line_pos_buffer),
    );
    let mut emitter = Emitter {
      cfg: Default::default(),
      cm: source_map.clone(),
      comments: comments.map(|c| c as &dyn Comments),
      wr: writer,
    };
    emitter
      .emit_program(program)
      .map_err(|err| err.to_string())?;
  }

  let code = String::from_utf8(output_buffer).map_err(|err| err.to_string())?;
  let mut source_map_buffer = vec![];
  source_map
    .build_source_map(&line_pos_buffer)
    .to_writer(&mut source_map_buffer)
    .map_err(|err| err.to_string())?;

  Ok((code, source_map_buffer))
}
