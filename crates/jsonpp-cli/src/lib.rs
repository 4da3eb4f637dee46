use anyhow::{Context, Result, bail};
use clap::Parser;
use jsonpp_core::{Preprocessor, ResolveOptions, Scope};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jsonpp", version)]
#[command(about = "Resolve $ref, $join, $merge and $exec directives in a JSON document")]
pub struct Args {
    /// Input document. `-` or omitted reads stdin.
    pub input: Option<PathBuf>,

    /// Bind an argument visible to `arg://KEY` references (repeatable)
    #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE", value_parser = parse_binding)]
    pub bindings: Vec<(String, String)>,

    /// JSON object of initial arguments, inline or as a file path
    #[arg(long = "args", value_name = "JSON_OR_PATH")]
    pub args: Option<String>,

    /// Write the resolved document here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// JSON file with resolve options (max_depth, detect_cycles, base_dir, http_timeout_ms)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory relative document references are read from
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Maximum nesting of referenced documents
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Do not reject references that re-enter a document being resolved
    #[arg(long)]
    pub no_cycle_check: bool,

    /// Log resolution steps to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run_from_env() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(args)
}

pub fn run_from_args<I, T>(argv: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = Args::try_parse_from(argv)?;
    run(args)
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run(args: Args) -> Result<()> {
    let options = load_options(&args)?;
    let scope = load_scope(args.args.as_deref(), &args.bindings)?;
    let (label, document) = read_input(args.input.as_deref())?;
    debug!(input = %label, bindings = scope.len(), ?options, "resolving");

    let engine = Preprocessor::with_options(options);
    let resolved = engine
        .resolve(&document, &scope)
        .with_context(|| format!("failed to resolve {label}"))?;

    let mut rendered = if args.compact {
        serde_json::to_string(&resolved)?
    } else {
        serde_json::to_string_pretty(&resolved)?
    };
    rendered.push('\n');

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(output = %path.display(), "wrote resolved document");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn parse_binding(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn read_input(input: Option<&Path>) -> Result<(String, Value)> {
    let (label, source) = match input {
        Some(path) if path != Path::new("-") => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            (path.display().to_string(), source)
        }
        _ => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read stdin")?;
            ("<stdin>".to_string(), source)
        }
    };
    let document = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse {label} as JSON"))?;
    Ok((label, document))
}

fn load_options(args: &Args) -> Result<ResolveOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let mut options: ResolveOptions = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {} as resolve options", path.display()))?;
            // relative base_dir is anchored at the config file, not the cwd
            let root = path.parent().unwrap_or_else(|| Path::new("."));
            options.base_dir = options
                .base_dir
                .map(|base| if base.is_relative() { root.join(base) } else { base });
            options
        }
        None => ResolveOptions::default(),
    };

    if let Some(dir) = &args.base_dir {
        options.base_dir = Some(dir.clone());
    }
    if let Some(depth) = args.max_depth {
        options.max_depth = depth;
    }
    if args.no_cycle_check {
        options.detect_cycles = false;
    }
    Ok(options)
}

/// Initial scope: the `--args` object, then `--arg` bindings on top.
fn load_scope(payload: Option<&str>, bindings: &[(String, String)]) -> Result<Scope> {
    let mut pairs = Vec::new();
    if let Some(input) = payload {
        let value = load_args_payload(input)?;
        let Value::Object(map) = value else {
            bail!("--args must be a JSON object");
        };
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => bail!("argument '{key}' must be a string, number or boolean, got {other}"),
            };
            pairs.push((key, text));
        }
    }
    pairs.extend(bindings.iter().cloned());
    Ok(Scope::new().extended(pairs))
}

fn load_args_payload(input: &str) -> Result<Value> {
    let as_path = PathBuf::from(input);
    if as_path.is_file() {
        let content = fs::read_to_string(&as_path)
            .with_context(|| format!("failed to read {}", as_path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", as_path.display()));
    }
    serde_json::from_str(input).context("invalid --args JSON")
}
