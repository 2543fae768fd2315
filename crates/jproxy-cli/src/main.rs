//! jproxy CLI
//!
//! `describe` decodes a method signature, `check` lints a proxy manifest.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jproxy_cli::commands::{check, describe};
use jproxy_cli::output::{resolve_color_choice, StyledOutput};

#[derive(Parser)]
#[command(name = "jproxy")]
#[command(about = "Inspect foreign class proxy declarations", long_about = None)]
#[command(version)]
struct Cli {
    /// Colorize output: auto, always, never
    #[arg(long, global = true, value_parser = ["auto", "always", "never"])]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a method signature, e.g. "(I;Ljava/lang/String;)Z"
    Describe {
        /// Signature text
        signature: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Load a proxy manifest and report declarations that would fail
    Check {
        /// Manifest file
        #[arg(default_value = "jproxy.toml")]
        manifest: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    jproxy_cli::init_logging();

    let cli = Cli::parse();
    let mut out = StyledOutput::stdout(resolve_color_choice(cli.color.as_deref()));

    let code = match cli.command {
        Commands::Describe { signature, json } => describe::execute(&signature, json, &mut out)?,
        Commands::Check { manifest, json } => check::execute(&manifest, json, &mut out)?,
    };
    out.flush();

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
