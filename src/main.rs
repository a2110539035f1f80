use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use app_registry::cli::{run_build, BuildArgs};
use app_registry::{config, logging, ui};

#[derive(clap::Parser)]
#[command(
    name = "app-registry",
    about = "Discover app releases from git and publish the registry API"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Registry data file (overrides data.apps)")]
    apps: Option<PathBuf>,

    #[arg(short, long, help = "Output directory (overrides build.output)")]
    output: Option<PathBuf>,

    #[arg(short, long, help = "Number of apps built concurrently")]
    jobs: Option<usize>,

    #[arg(long = "app", value_name = "ID", help = "Only build this app (repeatable)")]
    only: Vec<String>,

    #[arg(long, help = "Keep going when individual apps fail")]
    keep_going: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(args.verbose)?;

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let build_args = BuildArgs {
        apps_file: args.apps,
        output: args.output,
        jobs: args.jobs,
        only: args.only,
    };

    ui::display_status("Building app registry...");
    let report = run_build(&build_args, &config).context("Registry build failed")?;
    ui::display_build_summary(&report);

    if report.has_failures() && config.behavior.fail_on_app_error && !args.keep_going {
        ui::display_error("One or more apps failed; see the summary above");
        std::process::exit(1);
    }

    ui::display_success("Registry build complete");
    Ok(())
}
