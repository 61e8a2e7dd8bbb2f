//! `duke-cli`: a small frontend over [`duke::analysis::analyzer::MethodAnalyzer`] (§6).
//!
//! Loads every class out of a jar, finds the requested method, runs the analyzer on it, and
//! prints the resulting per-instruction frames. There's no persistent state and no remapping;
//! this binary exists to make the analyzer reachable from a shell.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use duke::analysis::analyzer::MethodAnalyzer;
use duke::pool::ClassPool;
use duke::tree::class::ClassName;
use duke::tree::method::{MethodDescriptor, MethodName, MethodNameAndDesc};
use dukebox::storage::FileJar;

/// Run the method analyzer over a single method of a class taken from a jar.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
	/// Path to the `.jar` file containing the class to analyze.
	#[arg(long)]
	jar: PathBuf,
	/// Binary name of the class, e.g. `java/lang/String`.
	#[arg(long)]
	class: String,
	/// Name of the method to analyze, e.g. `<init>` or `compute`.
	#[arg(long)]
	method: String,
	/// JVM descriptor of the method, e.g. `(I)V`.
	#[arg(long)]
	descriptor: String,
	/// Increase logging verbosity. Repeat for more (`-v` debug, `-vv` trace).
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn setup_logging(verbosity: u8) -> Result<()> {
	let level = match verbosity {
		0 => log::LevelFilter::Info,
		1 => log::LevelFilter::Debug,
		_ => log::LevelFilter::Trace,
	};

	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!(
				"[{} {:<5} {}] {}",
				unix_timestamp_now(),
				record.level(),
				record.target(),
				message,
			))
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()
		.context("failed to install logger")
}

/// Seconds since the epoch, good enough for a CLI's log lines without pulling in a dedicated
/// time crate the workspace doesn't otherwise depend on.
fn unix_timestamp_now() -> u64 {
	use std::time::{SystemTime, UNIX_EPOCH};
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn run(args: Args) -> Result<()> {
	let jar = FileJar { path: args.jar.clone() };

	let mut pool = ClassPool::new();
	dukebox::load_classes_into(&jar, &mut pool)
		.with_context(|| anyhow!("failed to load classes from {:?}", args.jar))?;
	pool.init();

	let class_name = ClassName::new(java_string::JavaString::from(args.class.as_str()))
		.map_err(|e| anyhow!("invalid class name {:?}: {e}", args.class))?;
	let class = pool.get(&class_name)
		.ok_or_else(|| anyhow!("no class named {:?} in {:?}", args.class, args.jar))?;

	let method_name = MethodName::new(java_string::JavaString::from(args.method.as_str()))
		.map_err(|e| anyhow!("invalid method name {:?}: {e}", args.method))?;
	let method_desc = MethodDescriptor::new(java_string::JavaString::from(args.descriptor.as_str()))
		.map_err(|e| anyhow!("invalid method descriptor {:?}: {e}", args.descriptor))?;
	let name_and_desc = MethodNameAndDesc { name: method_name, desc: method_desc };

	let method = class.get_method(&name_and_desc)
		.ok_or_else(|| anyhow!("no method {} {} on class {:?}", args.method, args.descriptor, args.class))?;

	let result = MethodAnalyzer::analyze(&class.name, method)
		.map_err(|e| anyhow!("analysis of {}.{}{} failed: {e}", args.class, args.method, args.descriptor))?;

	print!("{}", result.dump());

	Ok(())
}

fn main() -> ExitCode {
	let args = Args::parse();

	if let Err(e) = setup_logging(args.verbose) {
		eprintln!("failed to set up logging: {e}");
		return ExitCode::FAILURE;
	}

	match run(args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			log::error!("{e:?}");
			ExitCode::FAILURE
		}
	}
}
