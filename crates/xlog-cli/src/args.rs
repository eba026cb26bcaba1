//! Command-line argument definitions for `xlogcat`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Inspect Tarantool `.snap`/`.xlog` files.
#[derive(Debug, Clone, Parser)]
#[command(name = "xlogcat", version, about)]
pub struct Args {
	/// Increase logging verbosity. Can be given multiple times.
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	pub verbose: u8,

	/// Write logs to this file (or, if it's a directory, to a timestamped file within it).
	#[arg(long, value_hint = ValueHint::AnyPath, value_name = "PATH", global = true)]
	pub log_file: Option<PathBuf>,

	#[command(subcommand)]
	pub action: Action,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Action {
	/// Print the detected format version and the total number of records.
	Info(InfoArgs),
	/// Print one line per record with its header/body byte lengths.
	List(ListArgs),
	/// Print the decoded header and body maps as a debug representation.
	Dump(DumpArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct InfoArgs {
	/// Input file.
	#[arg(value_hint = ValueHint::AnyPath, value_name = "PATH")]
	pub input: PathBuf,
}

#[derive(Debug, Clone, Parser)]
pub struct ListArgs {
	/// Input file.
	#[arg(value_hint = ValueHint::AnyPath, value_name = "PATH")]
	pub input: PathBuf,

	/// Stop after this many records.
	#[arg(long, value_name = "N")]
	pub limit: Option<usize>,
}

#[derive(Debug, Clone, Parser)]
pub struct DumpArgs {
	/// Input file.
	#[arg(value_hint = ValueHint::AnyPath, value_name = "PATH")]
	pub input: PathBuf,

	/// Stop after this many records.
	#[arg(long, value_name = "N")]
	pub limit: Option<usize>,
}
