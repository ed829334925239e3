use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use yinc_cli::YincCli;
use yinc_core::DirectoryGuard;
use yinc_core::ExpandOptions;
use yinc_core::Expander;
use yinc_core::YincConfig;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "YINC_LOG";

fn main() {
	let args = YincCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();

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

	if let Err(e) = run(&args) {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<yinc_core::YincError>() {
			Ok(yinc_err) => {
				let report: miette::Report = (*yinc_err).into();
				eprintln!("{report:?}");
			}
			Err(e) if use_color => eprintln!("{} {e}", "error:".red()),
			Err(e) => eprintln!("error: {e}"),
		}
		process::exit(2);
	}
}

fn init_logging(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.without_time()
		.init();
}

fn run(args: &YincCli) -> Result<(), Box<dyn std::error::Error>> {
	let guard = args
		.directory
		.as_deref()
		.map(DirectoryGuard::enter)
		.transpose()?;

	let options = resolve_options(args)?;
	tracing::debug!(?options, "resolved options");
	let expander = Expander::new(options)?;

	let stdout = std::io::stdout().lock();
	let mut out = BufWriter::new(stdout);
	let result = expander.expand_all(&args.files, &mut out);
	// Whatever was expanded before a failure is still written out.
	let flushed = out.flush();
	result?;
	flushed?;

	if let Some(guard) = guard {
		guard.restore()?;
	}

	Ok(())
}

fn resolve_options(args: &YincCli) -> Result<ExpandOptions, Box<dyn std::error::Error>> {
	let config = if args.no_config {
		None
	} else if let Some(path) = &args.config {
		Some(YincConfig::load_from(path)?)
	} else {
		YincConfig::load(Path::new("."))?
	};

	let mut options = config.map(YincConfig::into_options).unwrap_or_default();
	args.apply(&mut options);

	Ok(options)
}
