//! pstore - step-by-step plan viewer
//!
//! Terminal front end over the progress store.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::info;

use progressstore::cli::{Cli, Command};
use progressstore::config::Config;
use progressstore::{Catalog, Example, FileStorage, Persistence, ProgressStore, StepProgress, export_project};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("progressstore")
        .join("logs");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("pstore.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

fn open_store(config: &Config) -> Result<ProgressStore<FileStorage>> {
    let catalog_path = config
        .catalog_path
        .as_ref()
        .ok_or_else(|| eyre!("No catalog configured. Pass --catalog or set catalog-path in the config file."))?;
    let catalog = Catalog::load(catalog_path)?;
    let storage = FileStorage::open(&config.storage_path)
        .context(format!("Failed to open storage at {}", config.storage_path.display()))?;
    Ok(ProgressStore::initialize(catalog, Persistence::new(storage, &config.namespace)))
}

fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (percent as usize * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn print_header(store: &ProgressStore<FileStorage>) {
    let percent = store.overall_progress();
    let title = store.current_step().map(|s| s.title.as_str()).unwrap_or("-");
    println!(
        "{} {} {}%  {}",
        progress_bar(percent, 20).cyan(),
        "Progress".bold(),
        percent,
        title.dimmed()
    );
    if store.catalog_changed() {
        println!(
            "{} catalog changed since progress was saved; checklist marks may point at different items",
            "!".yellow()
        );
    }
}

fn print_step(store: &ProgressStore<FileStorage>) {
    let position = store.position();
    let Some(step) = store.current_step() else {
        println!("Catalog has no steps");
        return;
    };

    println!();
    println!("{}", format!("Step {}: {}", step.id, step.title).bold());
    if !step.description.is_empty() {
        println!("{}", step.description.dimmed());
    }
    if !step.long_description.is_empty() {
        println!();
        println!("{}", step.long_description);
    }

    for example in &step.examples {
        println!();
        match example {
            Example::Code { title, language, content } => {
                match language {
                    Some(language) => println!("{} {}", title.yellow(), format!("({})", language).dimmed()),
                    None => println!("{}", title.yellow()),
                }
                for line in content.trim_matches('\n').lines() {
                    println!("  {}", line);
                }
            }
            Example::Text { title, content } => {
                println!("{}", title.yellow());
                for line in content.lines() {
                    println!("  {}", line);
                }
            }
            Example::Image { title, content } => {
                println!("{} {}", title.yellow(), content.underline());
            }
        }
    }

    if !step.checklist.is_empty() {
        println!();
        println!("{}", "Checklist".bold());
        for (item, def) in step.checklist.iter().enumerate() {
            if store.is_item_completed(position, item) {
                println!("  {} {} {}", "[x]".green(), item, def.text.strikethrough().dimmed());
            } else {
                println!("  [ ] {} {}", item, def.text);
            }
        }
    }

    println!();
    let prev = if store.is_first_step() { "" } else { "prev" };
    let next = if store.is_last_step() { "" } else { "next" };
    println!("{} {}/{} {}", prev.dimmed(), position + 1, store.catalog().len(), next.dimmed());
}

fn print_steps(store: &ProgressStore<FileStorage>) {
    for (position, (step, progress)) in store.catalog().steps().iter().zip(store.step_summaries()).enumerate() {
        let marker = if progress.is_complete { "✓".green() } else { "○".dimmed() };
        let label = format!("Step {}: {}", step.id, step.title);
        let label = if position == store.position() {
            label.cyan().bold()
        } else {
            label.normal()
        };
        println!("{} {:>2} {} {}", marker, position, label, counts(&progress).dimmed());
    }
}

fn counts(progress: &StepProgress) -> String {
    if progress.total == 0 {
        String::new()
    } else {
        format!("{}/{}", progress.completed, progress.total)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(catalog) = cli.catalog {
        config.catalog_path = Some(catalog);
    }
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;
    info!(command = ?cli.command, "pstore starting");

    let mut store = open_store(&config)?;

    match cli.command {
        Command::Show => {
            print_header(&store);
            print_step(&store);
        }
        Command::Steps => print_steps(&store),
        Command::Toggle { item, step } => {
            let step = step.unwrap_or(store.position());
            let completed = store.toggle_item(step, item);
            let text = store
                .catalog()
                .step(step)
                .and_then(|s| s.checklist.get(item))
                .map(|d| d.text.as_str())
                .unwrap_or("(not in catalog)");
            let mark = if completed { "[x]".green() } else { "[ ]".normal() };
            println!("{} {}-{} {}", mark, step, item, text);
            println!("Progress: {}%", store.overall_progress());
        }
        Command::Goto { position } => {
            let before = store.position();
            store.set_current_step(position);
            if store.position() == before && position != before {
                println!(
                    "{} step {} is out of range (0..{})",
                    "!".yellow(),
                    position,
                    store.catalog().len()
                );
            }
            print_header(&store);
            print_step(&store);
        }
        Command::Next => {
            store.next_step();
            print_header(&store);
            print_step(&store);
        }
        Command::Prev => {
            store.previous_step();
            print_header(&store);
            print_step(&store);
        }
        Command::Progress => {
            let percent = store.overall_progress();
            println!("{} {}%", progress_bar(percent, 20).cyan(), percent);
            print_steps(&store);
            let stale = store.stale_entries();
            if !stale.is_empty() {
                println!("{} {} saved mark(s) do not match any catalog item", "!".yellow(), stale.len());
                for entry in &stale {
                    println!("  {}", entry.to_string().dimmed());
                }
            }
        }
        Command::Export { output, stdout } => {
            let doc = export_project(store.catalog(), store.completion(), &config.project_name);
            if stdout {
                println!("{}", doc.to_json_pretty()?);
            } else {
                let dir = output.unwrap_or_else(|| PathBuf::from("."));
                let path = doc.write_to_dir(&dir, &config.product)?;
                println!("{} Exported to {}", "✓".green(), path.display().to_string().cyan());
            }
        }
        Command::Reset => {
            store.reset();
            println!("{} Progress reset", "✓".green());
        }
    }

    if let Some(e) = store.last_persist_error() {
        eprintln!("{} progress could not be saved: {}", "Warning:".yellow(), e);
    }

    Ok(())
}
