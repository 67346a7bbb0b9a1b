use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use css_macro::{transform_code, CssMacroConfig};
use tracing_subscriber::EnvFilter;

/// Rewrite `css` tagged templates into object literals
#[derive(Parser, Debug)]
#[command(name = "css-macro")]
struct Args {
  /// JavaScript or TypeScript files to transform
  #[arg(required = true)]
  files: Vec<PathBuf>,
  /// JSON file with the macro configuration
  #[arg(long)]
  config: Option<PathBuf>,
  /// Write the output to this file instead of stdout. Needs a single input file
  #[arg(long, short)]
  out: Option<PathBuf>,
  /// Write a source map next to the output file as `<out>.map`
  #[arg(long, requires = "out")]
  source_map: bool,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  run(&args, &mut std::io::stdout().lock())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CssMacroConfig> {
  let Some(path) = path else {
    return Ok(CssMacroConfig::default());
  };

  let json = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config {}", path.display()))?;
  Ok(CssMacroConfig::from_json(&json)?)
}

fn run(args: &Args, stdout: &mut impl Write) -> anyhow::Result<()> {
  if args.out.is_some() && args.files.len() > 1 {
    bail!("--out needs exactly one input file");
  }

  let config = load_config(args.config.as_deref())?;
  // One session for every file of this run, so tokens never repeat
  let mut placeholders = config.placeholder_context();

  for file in &args.files {
    let code = std::fs::read_to_string(file)
      .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file.to_string_lossy();

    let output = transform_code(&filename, &code, &config, &mut placeholders)?;
    tracing::info!("{}: rewrote {} usages", filename, output.rewritten);

    match &args.out {
      Some(out) => {
        std::fs::write(out, &output.code)
          .with_context(|| format!("Failed to write {}", out.display()))?;

        if args.source_map {
          let mut map_path = out.clone().into_os_string();
          map_path.push(".map");
          std::fs::write(&map_path, &output.source_map)
            .with_context(|| format!("Failed to write {}", map_path.to_string_lossy()))?;
        }
      }
      None => stdout.write_all(output.code.as_bytes())?,
    }
  }

  Ok(())
}
