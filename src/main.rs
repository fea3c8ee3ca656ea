use anyhow::{Context, Result};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use polyblog::build::build_site;
use polyblog::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let matches = App::new("polyblog")
        .version(crate_version!())
        .about("Builds a multi-language blog from dated markdown posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Log every rendered post"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Directory containing polyblog.yaml (or a subdirectory of it)"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Output directory [default: dist inside the project]"),
                ),
        )
        .get_matches();

    init_tracing(matches.is_present("verbose"))?;

    match matches.subcommand() {
        ("build", Some(matches)) => build(matches),
        _ => Ok(()),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build(matches: &ArgMatches) -> Result<()> {
    let project = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let project = project
        .canonicalize()
        .with_context(|| format!("Resolving project directory '{}'", project.display()))?;

    let output = matches.value_of("output").map(PathBuf::from);
    let config = Config::from_directory(&project, output.as_deref())?;
    let report = build_site(&config)?;
    println!("{}", report);

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
