use clap::{ArgAction, Parser, ValueEnum};
use context_wrapper::errors::{PluginError, Result};
use context_wrapper::plugins::{as_fn, Registry};
use context_wrapper::ContextWrapper;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, Level};

/// How the plugins are driven through the wrapper.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run every plugin against the value; print the value
    Run,
    /// Apply each plugin in turn; print the value and every result
    Apply,
    /// Feed each plugin's result to the next; print the last one
    Transform,
    /// Drain the staged arguments once and hand them to every plugin
    Scope,
}

/// Wrap a JSON document and invoke built-in plugins on it.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON document to wrap
    #[arg(required_unless_present = "list")]
    json: Option<String>,
    /// Plugin to invoke (repeatable, in order)
    #[arg(short, long = "plugin")]
    plugins: Vec<String>,
    /// Argument to stage, as JSON; anything else is staged as a string (repeatable)
    #[arg(short, long)]
    stage: Vec<String>,
    /// Invocation mode
    #[arg(short, long, value_enum, default_value_t = Mode::Run)]
    mode: Mode,
    /// List the available plugins and exit
    #[arg(long)]
    list: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Report {
    value: Value,
    results: Vec<Value>,
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();
    init_tracing(args.verbose);

    let registry = Registry::with_builtins();
    if args.list {
        for name in registry.names() {
            println!("{name}");
        }
        return;
    }

    match execute(&args, &registry) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Staged arguments fall back to plain strings when they are not JSON.
fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn render<S: Serialize>(out: &S) -> Result<String> {
    serde_json::to_string_pretty(out).map_err(|e| PluginError::Runtime(e.to_string()))
}

fn execute(args: &Args, registry: &Registry) -> Result<String> {
    let raw = args.json.as_deref().unwrap_or("null");
    let value: Value = serde_json::from_str(raw).map_err(|e| PluginError::Parse(e.to_string()))?;
    let plugins = args
        .plugins
        .iter()
        .map(|name| registry.resolve(name))
        .collect::<Result<Vec<_>>>()?;

    let mut wrapper: ContextWrapper<Value> = ContextWrapper::new(value);
    wrapper.stage(args.stage.iter().map(|s| parse_arg(s)));
    info!(mode = ?args.mode, plugins = plugins.len(), staged = wrapper.staged().len(), "executing");

    match args.mode {
        Mode::Run => {
            wrapper.run_all(plugins.iter().map(|p| as_fn(&**p)))?;
            render(wrapper.read())
        }
        Mode::Apply => {
            let mut results = Vec::with_capacity(plugins.len());
            for plugin in &plugins {
                results.push(wrapper.apply(as_fn(&**plugin))?);
            }
            render(&Report { value: wrapper.into_inner(), results })
        }
        Mode::Transform => {
            let mut current = wrapper;
            for plugin in &plugins {
                current = current.transform(as_fn(&**plugin))?;
            }
            render(current.read())
        }
        Mode::Scope => {
            let results = wrapper.with_scope(|value, staged| {
                let drained = std::mem::take(staged);
                plugins
                    .iter()
                    .map(|p| p.call(value, &drained))
                    .collect::<Result<Vec<_>>>()
            })?;
            render(&Report { value: wrapper.into_inner(), results })
        }
    }
}
