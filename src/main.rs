//! View Components CLI
//!
//! Usage:
//!   view-components [OPTIONS] <COMMAND>
//!
//! Commands:
//!   check <DIR>    Report component files with more than one sidecar template
//!   render <FILE>  Render a template file with attributes from a TOML file
//!
//! Options:
//!   -c, --config <FILE>  Renderer configuration (TOML format)
//!   -v, --verbose        More log output (repeat for trace)
//!   -h, --help           Print help

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use view_components::template::audit_sidecars;
use view_components::{Attributes, ComponentConfig, Renderer, SafeHtml, TemplateSource};

#[derive(Parser)]
#[command(name = "view-components")]
#[command(about = "Render and check view component templates")]
struct Cli {
    /// Renderer configuration (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report component files with more than one sidecar template
    Check {
        /// Directory holding component source files
        dir: PathBuf,
    },
    /// Render a template file; its extension selects the handler
    Render {
        /// Template file
        file: PathBuf,

        /// Attributes as a TOML table
        #[arg(short, long)]
        attrs: Option<PathBuf>,

        /// Text passed as the block content (escaped)
        #[arg(long)]
        content: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match ComponentConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ComponentConfig::default(),
    };

    match cli.command {
        Command::Check { dir } => check(&dir),
        Command::Render {
            file,
            attrs,
            content,
        } => render(config, &file, attrs.as_deref(), content.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    // RUST_LOG wins over -v
    let default_filter = match verbose {
        0 => "view_components=warn",
        1 => "view_components=debug",
        _ => "view_components=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn check(dir: &Path) {
    let conflicts = match audit_sidecars(dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading directory '{}': {}", dir.display(), e);
            std::process::exit(1);
        }
    };

    if conflicts.is_empty() {
        println!("No ambiguous templates in {}", dir.display());
        return;
    }

    for conflict in &conflicts {
        println!("{}:", conflict.anchor.display());
        for candidate in &conflict.candidates {
            println!("  {}", candidate.display());
        }
    }
    std::process::exit(1);
}

fn render(config: ComponentConfig, file: &Path, attrs: Option<&Path>, content: Option<&str>) {
    let renderer = match Renderer::new(config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let template = match TemplateSource::read(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let attributes = match attrs {
        Some(path) => match load_attributes(path) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("Error loading attributes '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Attributes::new(),
    };

    let content = content.map(SafeHtml::escape);
    match renderer.render_source(&template, &attributes, content.as_ref()) {
        Ok(html) => println!("{}", html),
        Err(e) => {
            eprintln!("{}", e.report());
            std::process::exit(1);
        }
    }
}

fn load_attributes(path: &Path) -> Result<Attributes, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let table: toml::Table = toml::from_str(&text).map_err(|e| e.to_string())?;
    match serde_json::to_value(table).map_err(|e| e.to_string())? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err("attributes must be a table".to_string()),
    }
}
