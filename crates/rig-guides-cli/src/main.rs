//! Command-line driver for rig-guides documents.
//!
//! Loads a project document (or assembles the biped template), validates
//! it, builds it against an in-memory scene and prints the resulting
//! hierarchy. Optionally writes the project back out.
//!
//! Logging is controlled through `RUST_LOG` (default `warn`, raised by `-v`).

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rig_guides::limits::DEFAULT_COMPRESSION_LEVEL;
use rig_guides::modules::templates;
use rig_guides::{
    decode_document, encode_document, encode_document_compressed, validate_project, BuildOptions,
    MemoryScene, Project,
};

/// Build a rig guide document against an in-memory scene.
#[derive(Debug, Parser)]
#[command(name = "rig-guides", version, about, long_about = None)]
struct Cli {
    /// Project document to load (plain JSON or compressed). Defaults to the
    /// biped template.
    document: Option<PathBuf>,

    /// JSON file with build options.
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Write the project document to this file after building.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Compress the written document.
    #[arg(long, requires = "out")]
    compress: bool,

    /// zstd level used with --compress.
    #[arg(long, default_value_t = DEFAULT_COMPRESSION_LEVEL, requires = "compress")]
    level: i32,

    /// Rename the project before building.
    #[arg(long)]
    name: Option<String>,

    /// Print the effective build options as JSON.
    #[arg(long)]
    print_options: bool,

    /// More log output (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let options = match &args.options {
        Some(path) => BuildOptions::from_json_str(&fs::read_to_string(path)?)?,
        None => BuildOptions::default(),
    };
    if args.print_options {
        println!("{}", serde_json::to_string_pretty(&options)?);
    }

    let mut project = match &args.document {
        Some(path) => {
            info!(path = %path.display(), "loading document");
            Project::from_record(&decode_document(&fs::read(path)?)?)
        }
        None => {
            info!("no document given, using the biped template");
            templates::biped("biped")
        }
    };
    if let Some(name) = &args.name {
        project.set_name(name);
    }

    let issues = validate_project(&project);
    for issue in &issues {
        eprintln!("warning: {}", issue);
    }

    let mut scene = MemoryScene::new();
    let report = project.build_proxy_with(&mut scene, &options);

    print!("{}", scene.outline());
    println!();
    println!(
        "{}: {} modules, {} proxies built, {} re-parented, {} connectors",
        project.name(),
        report.modules.len(),
        report.results.len(),
        report.reparented,
        report.connectors.len()
    );
    for unit in &report.skipped {
        println!("  skipped {}", unit);
    }

    if let Some(out) = &args.out {
        let record = project.to_record();
        let bytes = if args.compress {
            encode_document_compressed(&record, args.level)?
        } else {
            encode_document(&record)?
        };
        fs::write(out, &bytes)?;
        println!("Wrote {} ({} bytes)", out.display(), bytes.len());
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "rig-guides",
            "hero.json",
            "--options",
            "opts.json",
            "--out",
            "hero.rigz",
            "--compress",
            "--name",
            "hero",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.document, Some(PathBuf::from("hero.json")));
        assert_eq!(cli.options, Some(PathBuf::from("opts.json")));
        assert_eq!(cli.out, Some(PathBuf::from("hero.rigz")));
        assert!(cli.compress);
        assert_eq!(cli.level, DEFAULT_COMPRESSION_LEVEL);
        assert_eq!(cli.name.as_deref(), Some("hero"));
        assert!(!cli.print_options);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_compress_requires_out() {
        assert!(Cli::try_parse_from(["rig-guides", "--compress"]).is_err());
        assert!(Cli::try_parse_from(["rig-guides", "--bogus"]).is_err());
    }
}
