#![allow(missing_docs)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "telepath", about = "Packed object graph inspection tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Unpack(cmd::unpack::Args),
	Ids {
		path: PathBuf,
		#[arg(long)]
		json: bool,
	},
	Types {
		path: PathBuf,
	},
}

fn main() {
	init_tracing();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_writer(std::io::stderr)
		.init();
}

fn run() -> telepath::pack::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Unpack(args) => cmd::unpack::run(args),
		Commands::Ids { path, json } => cmd::ids::run(path, json),
		Commands::Types { path } => cmd::types::run(path),
	}
}
