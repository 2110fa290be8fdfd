use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use regview_core::model::x86_64;
use regview_core::symbols::demangle::display_name;
use regview_core::symbols::load_plugin_symbols;
use regview_core::{CellRef, InMemoryModel, RegisterModel};
use regview_ui::actions;
use regview_ui::group::formatter_for;
use regview_utils::{
    info, init_logging, init_logging_for_tui, init_logging_with_level, HexCase, LogFormat, LogGuard, LogLevel,
    ViewConfig,
};

/// Interactive register view and plugin symbol lister.
#[derive(Parser, Debug)]
#[command(name = "regview")]
#[command(version)]
#[command(about = "Interactive register view and plugin symbol lister", long_about = None)]
struct Cli
{
    #[command(subcommand)]
    command: Option<Commands>,

    /// Color of registers changed since the last step (name or #rrggbb)
    #[arg(long, global = true)]
    changed_color: Option<String>,

    /// Show hexadecimal values in upper case
    #[arg(long, global = true, default_value_t = false)]
    upper: bool,

    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Open the interactive register view (default)
    View,
    /// Print every register field with its value and actions, then exit
    Dump,
    /// List the symbols exported by a plugin module
    Symbols
    {
        /// Path to the plugin object file
        path: PathBuf,
    },
}

fn main()
{
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    let level = cli.log_level.as_deref().map(str::parse::<LogLevel>).transpose()?;
    let command = cli.command.unwrap_or(Commands::View);

    let mut config = ViewConfig::from_env()?;
    if let Some(color) = cli.changed_color {
        config.changed_color = color;
    }
    if cli.upper {
        config.hex_case = HexCase::Upper;
    }

    match command {
        Commands::View => {
            // Stdout belongs to the terminal UI
            let guard = init_logging_for_tui(level)?;
            info!("Logging to {:?}", guard.file());

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(regview_ui::run_tui(x86_64::sample(), config))?;
            if let Some(file) = guard.file() {
                println!("Log written to {}", file.display());
            }
        }
        Commands::Dump => {
            let _guard = init_console_logging(level)?;
            dump(&x86_64::sample(), &config);
        }
        Commands::Symbols { path } => {
            let _guard = init_console_logging(level)?;
            list_symbols(&path)?;
        }
    }

    Ok(())
}

fn init_console_logging(level: Option<LogLevel>) -> Result<LogGuard, Box<dyn std::error::Error>>
{
    let guard = match level {
        Some(level) => init_logging_with_level(level, LogFormat::Pretty)?,
        None => init_logging()?,
    };
    Ok(guard)
}

/// Print the register tree: name, displayed text, kind and visible actions.
fn dump(model: &InMemoryModel, config: &ViewConfig)
{
    for category in model.roots() {
        println!("{}", model.name(category).unwrap_or("?"));
        for register in model.children(category) {
            dump_cell(model, register, config.hex_case, 1);
        }
    }
}

fn dump_cell(model: &InMemoryModel, cell: CellRef, hex_case: HexCase, depth: usize)
{
    let kind = model.kind(cell);
    let text = formatter_for(kind, hex_case)(model.text(cell).as_str());
    let labels: Vec<String> = actions::compute(model, cell)
        .iter()
        .filter(|action| action.visible)
        .map(actions::MenuAction::text)
        .collect();

    println!(
        "{:indent$}{:<12} {:<20} {:?} [{}]",
        "",
        model.name(cell).unwrap_or("?"),
        text,
        kind,
        labels.join(", "),
        indent = depth * 2
    );
    for child in model.children(cell) {
        dump_cell(model, child, hex_case, depth + 1);
    }
}

fn list_symbols(path: &Path) -> Result<(), Box<dyn std::error::Error>>
{
    let symbols = load_plugin_symbols(path)?;
    println!("{} symbols in {}", symbols.len(), path.display());
    for symbol in &symbols {
        println!(
            "0x{:016x} {:>3} {}",
            symbol.address(),
            symbol.size(),
            display_name(symbol.name())
        );
    }
    Ok(())
}
