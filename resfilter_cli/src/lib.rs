use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Copy resource files into an output directory, substituting placeholders from property \
	         files.",
	long_about = "resfilter copies resource files into an output directory. Resources with \
	              filtering enabled have placeholders such as ${name} or @name@ replaced with \
	              values from layered property files, system properties and the \
	              environment.\n\nQuick start:\n  resfilter init           Create a resfilter.toml\n  \
	              resfilter filter         Copy and filter every resource\n  resfilter properties     \
	              Report the resolved properties\n  resfilter print-filters  Show the filter files \
	              after interpolation"
)]
pub struct ResfilterCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

/// Options shared by every command that resolves properties.
#[derive(Debug, Clone, Default, Args)]
pub struct PropertyArgs {
	/// Define a system property as `key=value`. May be repeated.
	#[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
	pub define: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `resfilter.toml` in the project root.
	///
	/// If a config file already exists this command is a no-op and exits
	/// successfully.
	Init,
	/// Copy every configured resource into the output directory.
	///
	/// Resources with filtering enabled have their placeholders replaced.
	/// Files that fail are reported and the remaining files are still
	/// processed; the command then exits with status 1.
	Filter {
		#[command(flatten)]
		properties: PropertyArgs,

		/// Rewrite targets even when they are newer than their source.
		#[arg(long, default_value_t = false)]
		overwrite: bool,

		/// Output directory, overriding `output_directory` from the config.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Output format for the run summary. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Watch the project for changes and filter again automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Write a report of every resolved property and where it came from.
	Properties {
		#[command(flatten)]
		properties: PropertyArgs,

		/// Report format.
		#[arg(long, value_enum, default_value_t = ReportOutputFormat::Html)]
		format: ReportOutputFormat,

		/// Directory the report is written to. Defaults to the output
		/// directory.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// Print every filter file after running it through the interpolator.
	///
	/// The result is also written to `filtered.txt`.
	PrintFilters {
		#[command(flatten)]
		properties: PropertyArgs,

		/// Directory `filtered.txt` is written to. Defaults to the output
		/// directory.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportOutputFormat {
	/// An HTML table.
	Html,
	/// One `key = value (origin)` line per property.
	Text,
}
