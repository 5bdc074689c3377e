use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use owo_colors::OwoColorize;
use resfilter_cli::Commands;
use resfilter_cli::OutputFormat;
use resfilter_cli::PropertyArgs;
use resfilter_cli::ReportOutputFormat;
use resfilter_cli::ResfilterCli;
use resfilter_core::BatchResult;
use resfilter_core::FilterStatus;
use resfilter_core::ReportFormat;
use resfilter_core::ResfilterConfig;
use resfilter_core::parse_system_properties;
use resfilter_core::project::FilterContext;
use resfilter_core::project::load_context;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "RESFILTER_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = ResfilterCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Filter {
			properties,
			overwrite,
			output,
			format,
			watch,
		}) => {
			run_filter(
				&args,
				properties,
				*overwrite,
				output.as_deref(),
				*format,
				*watch,
			)
		}
		Some(Commands::Properties {
			properties,
			format,
			output,
		}) => run_properties(&args, properties, *format, output.as_deref()),
		Some(Commands::PrintFilters { properties, output }) => {
			run_print_filters(&args, properties, output.as_deref())
		}
		None => {
			eprintln!("No subcommand specified. Run `resfilter --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<resfilter_core::ResfilterError>() {
			Ok(resfilter_err) => {
				let report: miette::Report = (*resfilter_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RESFILTER_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool, use_color: bool) {
	let default_level = if verbose { "info" } else { "warn" };
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_env(LOG_ENV)
				.or_else(|_| EnvFilter::try_new(default_level))
				.unwrap_or_else(|_| EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.try_init();
}

fn resolve_root(args: &ResfilterCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load(args: &ResfilterCli, properties: &PropertyArgs) -> Result<FilterContext, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let system = parse_system_properties(&properties.define)?;
	let ctx = load_context(&root, system)?;

	if args.verbose {
		let config = ctx
			.config_path
			.as_ref()
			.map_or_else(|| "none (defaults)".to_string(), |path| make_relative(path, &root));
		println!("Resolved config: {config}");
		println!(
			"Loaded {} filter file(s), {} propert{}",
			ctx.filter_files.len(),
			ctx.properties.len(),
			if ctx.properties.len() == 1 { "y" } else { "ies" }
		);
	}

	Ok(ctx)
}

/// Directory reports are written to: `--output` when given, otherwise the
/// configured output directory.
fn report_dir(ctx: &FilterContext, output: Option<&Path>) -> PathBuf {
	output.map_or_else(|| ctx.config.output_directory.clone(), |dir| ctx.root.join(dir))
}

fn run_init(args: &ResfilterCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = ResfilterConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join("resfilter.toml");
	let sample_config = "# resfilter configuration\n\n# Where resources are copied to.\noutput_directory \
	                     = \"target/classes\"\n\n# Encoding of filtered resources. Leaving it unset \
	                     assumes UTF-8 and warns.\nencoding = \"UTF-8\"\n\n# Token that keeps a \
	                     placeholder literal, e.g. \\${name}.\n# escape_string = \"\\\\\"\n\n# \
	                     Placeholder delimiters. `*` separates the begin and end tokens.\n# \
	                     delimiters = [\"${*}\", \"@\"]\n\n# Property files, later files win.\n# \
	                     filters = [\"src/main/filters/dev.properties\"]\n\n# Inline \
	                     properties.\n# [properties]\n# app.name = \"demo\"\n\n[[resources]]\ndirectory \
	                     = \"src/main/resources\"\nfiltering = true\n";

	std::fs::write(&config_path, sample_config)?;
	println!("Created {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. List your property files under `filters`");
	println!("  2. Add placeholders such as ${{name}} to your resources");
	println!("  3. Run `resfilter filter` to copy and filter them");

	Ok(())
}

fn run_filter(
	args: &ResfilterCli,
	properties: &PropertyArgs,
	overwrite: bool,
	output: Option<&Path>,
	format: OutputFormat,
	watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	// Run the initial filter.
	let (has_failures, output_dir) = run_filter_once(args, properties, overwrite, output, format)?;

	if !watch {
		if has_failures {
			process::exit(1);
		}
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let root = resolve_root(args);
	let root = root.canonicalize().unwrap_or(root);
	let output_dir = output_dir.canonicalize().unwrap_or(output_dir);
	let (tx, rx) = mpsc::channel();

	// Writes into the output directory must not retrigger a run.
	let ignored = output_dir.clone();
	let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
		if let Ok(event) = res {
			if matches!(
				event.kind,
				notify::EventKind::Modify(_) | notify::EventKind::Create(_) | notify::EventKind::Remove(_)
			) && event.paths.iter().any(|path| !path.starts_with(&ignored))
			{
				let _ = tx.send(());
			}
		}
	})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;
	tracing::info!(root = %root.display(), output = %output_dir.display(), "watching for changes");

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, filtering...");
		if let Err(e) = run_filter_once(args, properties, overwrite, output, format) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

/// Run a single filter pass. Returns whether any file failed, and the output
/// directory that was written to.
fn run_filter_once(
	args: &ResfilterCli,
	properties: &PropertyArgs,
	overwrite: bool,
	output: Option<&Path>,
	format: OutputFormat,
) -> Result<(bool, PathBuf), Box<dyn std::error::Error>> {
	let mut ctx = load(args, properties)?;
	let root = ctx.root.clone();

	if overwrite {
		ctx.config.overwrite = true;
	}
	if let Some(output) = output {
		ctx.config.output_directory = root.join(output);
	}

	let batch = ctx.filter_all()?;

	match format {
		OutputFormat::Json => {
			let summary = JsonSummary::new(&batch, &root);
			println!("{}", serde_json::to_string(&summary)?);
		}
		OutputFormat::Text => print_batch(&batch, &root, args.verbose),
	}

	Ok((batch.has_failures(), ctx.config.output_directory))
}

fn print_batch(batch: &BatchResult, root: &Path, verbose: bool) {
	for warning in &batch.warnings {
		eprintln!("{} {warning}", colored!("warning:", yellow));
	}

	if verbose {
		for result in &batch.results {
			let rel = make_relative(&result.source, root);
			let target = make_relative(&result.target, root);
			println!("  {:<9} {rel} -> {target}", result.status.to_string());
		}
		for dir in &batch.created_dirs {
			println!("  {:<9} {}", "mkdir", make_relative(dir, root));
		}
	}

	for result in &batch.results {
		if result.unresolved.is_empty() {
			continue;
		}
		let rel = make_relative(&result.source, root);
		eprintln!(
			"{} unresolved placeholder(s) in {rel}: {}",
			colored!("note:", bold),
			result.unresolved.join(", ")
		);
	}

	let filtered = batch.count(|status| matches!(status, FilterStatus::Filtered { .. }));
	let copied = batch.count(|status| *status == FilterStatus::Copied);
	let skipped = batch.count(|status| *status == FilterStatus::Skipped);

	if batch.is_ok() {
		println!(
			"{} {filtered} filtered, {copied} copied, {skipped} up to date.",
			colored!("Done:", green)
		);
		return;
	}

	eprintln!("Filtering failed for {} file(s):", batch.failures.len());
	for failure in &batch.failures {
		let rel = make_relative(&failure.source, root);
		eprintln!("  {} {rel}: {}", colored!("error:", red), failure.error);
	}
	eprintln!();
	eprintln!(
		"{filtered} filtered, {copied} copied, {skipped} up to date, {} failed.",
		batch.failures.len()
	);
}

#[derive(Serialize)]
struct JsonSummary {
	ok: bool,
	results: Vec<JsonResult>,
	failures: Vec<JsonFailure>,
	created_dirs: Vec<String>,
	warnings: Vec<String>,
}

#[derive(Serialize)]
struct JsonResult {
	source: String,
	target: String,
	status: String,
	substitutions: usize,
	unresolved: Vec<String>,
}

#[derive(Serialize)]
struct JsonFailure {
	source: String,
	error: String,
}

impl JsonSummary {
	fn new(batch: &BatchResult, root: &Path) -> Self {
		Self {
			ok: batch.is_ok(),
			results: batch
				.results
				.iter()
				.map(|result| {
					JsonResult {
						source: make_relative(&result.source, root),
						target: make_relative(&result.target, root),
						status: result.status.to_string(),
						substitutions: match result.status {
							FilterStatus::Filtered { substitutions } => substitutions,
							_ => 0,
						},
						unresolved: result.unresolved.clone(),
					}
				})
				.collect(),
			failures: batch
				.failures
				.iter()
				.map(|failure| {
					JsonFailure {
						source: make_relative(&failure.source, root),
						error: failure.error.to_string(),
					}
				})
				.collect(),
			created_dirs: batch
				.created_dirs
				.iter()
				.map(|dir| make_relative(dir, root))
				.collect(),
			warnings: batch.warnings.iter().map(ToString::to_string).collect(),
		}
	}
}

fn run_properties(
	args: &ResfilterCli,
	properties: &PropertyArgs,
	format: ReportOutputFormat,
	output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
	let ctx = load(args, properties)?;
	let format = match format {
		ReportOutputFormat::Html => ReportFormat::Html,
		ReportOutputFormat::Text => ReportFormat::Text,
	};

	let report = ctx.properties_report(format);
	let dir = report_dir(&ctx, output);
	match report.write_to(&dir) {
		Some(path) => println!("Wrote properties report: {}", make_relative(&path, &ctx.root)),
		None => {
			eprintln!(
				"{} could not write {} to {}",
				colored!("warning:", yellow),
				report.file_name,
				dir.display()
			);
		}
	}

	Ok(())
}

fn run_print_filters(
	args: &ResfilterCli,
	properties: &PropertyArgs,
	output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
	let ctx = load(args, properties)?;

	if ctx.filter_files.is_empty() {
		println!("No filter files configured.");
		return Ok(());
	}

	let report = ctx.filtered_filters_report();
	print!("{}", report.content);

	let dir = report_dir(&ctx, output);
	match report.write_to(&dir) {
		Some(path) => eprintln!("Wrote {}", make_relative(&path, &ctx.root)),
		None => {
			eprintln!(
				"{} could not write {} to {}",
				colored!("warning:", yellow),
				report.file_name,
				dir.display()
			);
		}
	}

	Ok(())
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
