use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use archive::{FileJar, Jar};

#[derive(Debug, Parser)]
struct Cli {
	/// Be verbose. Repeat for more (`-v` = debug, `-vv` = trace).
	#[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
	verbose: u8,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Opens a jar and reports its `.class` entries.
	Inspect {
		jar: PathBuf,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	setup_logging(cli.verbose)?;

	match cli.command {
		Command::Inspect { jar } => inspect(jar),
	}
}

fn setup_logging(verbose: u8) -> Result<()> {
	let level = match verbose {
		0 => log::LevelFilter::Info,
		1 => log::LevelFilter::Debug,
		_ => log::LevelFilter::Trace,
	};

	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!("[{} {}] {}", record.target(), record.level(), message))
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()
		.context("installing the logger")
}

fn inspect(path: PathBuf) -> Result<()> {
	let mut jar = FileJar::new(&path);
	let names = jar.class_names().with_context(|| format!("reading {}", path.display()))?;

	println!("{}: {} class entries", path.display(), names.len());
	for name in &names {
		println!("  {name}");
	}

	frontend::lower_jar(&mut jar).context("lowering the jar's classes")?;
	println!("attempted lowering of all {} class entries, see logs (-v) for any that were skipped", names.len());

	Ok(())
}
