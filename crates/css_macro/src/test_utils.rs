use swc_core::common::comments::SingleThreadedComments;
use swc_core::common::sync::Lrc;
use swc_core::common::{Globals, Mark, SourceMap, GLOBALS};
use swc_core::ecma::ast::{Module, Pass, Program};
use swc_core::ecma::transforms::base::fixer::fixer;
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::runner::{emit_program, parse_module};

pub struct RunTestContext {
  /// Source-map in use
  pub source_map: Lrc<SourceMap>,
  /// Unresolved mark from SWC resolver
  pub unresolved_mark: Mark,
}

pub struct RunVisitResult<V> {
  pub output_code: String,
  pub visitor: V,
}

/// Parse `code`, run the resolver over it and hand the module to `inspect`.
pub fn parse_test_module<R>(code: &str, inspect: impl FnOnce(&Module, Mark) -> R) -> R {
  let source_map: Lrc<SourceMap> = Default::default();
  let module = parse_module(&source_map, "test.js", code, None).unwrap();

  GLOBALS.set(&Globals::new(), || {
    let unresolved_mark = Mark::new();
    let mut program = Program::Module(module);
    resolver(unresolved_mark, Mark::new(), false).process(&mut program);

    let Program::Module(module) = program else {
      unreachable!()
    };
    inspect(&module, unresolved_mark)
  })
}

/// Helper to test SWC visitors.
///
/// * Parse `code` with SWC
/// * Run a visitor over it
/// * Return the printed result
pub fn run_test_visit<V: VisitMut>(
  code: &str,
  make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
  let source_map: Lrc<SourceMap> = Default::default();
  let comments = SingleThreadedComments::default();
  let module = parse_module(&source_map, "test.js", code, Some(&comments)).unwrap();

  GLOBALS.set(&Globals::new(), || {
    let unresolved_mark = Mark::new();
    let mut program = Program::Module(module);
    resolver(unresolved_mark, Mark::new(), false).process(&mut program);

    let mut visitor = make_visit(RunTestContext {
      source_map: source_map.clone(),
      unresolved_mark,
    });
    program.visit_mut_with(&mut visitor);
    fixer(Some(&comments)).process(&mut program);

    let (output_code, _) = emit_program(&source_map, &program, Some(&comments)).unwrap();
    RunVisitResult {
      output_code,
      visitor,
    }
  })
}

/// Remove all whitespace, so printed code can be compared regardless of layout
pub fn squash(code: &str) -> String {
  code.chars().filter(|c| !c.is_whitespace()).collect()
}
