use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Compute recursive checksums for files, symlinks, and directories.
#[derive(Parser, Debug)]
#[command(name = "xsum")]
#[command(about = "Compute recursive checksums for files, symlinks, and directories")]
#[command(version)]
struct Cli {
    /// Hash algorithm: sha256, sha512, blake3, or a path to a plugin executable
    #[arg(short = 'a', long = "algorithm", default_value = "sha256", value_name = "NAME")]
    algorithm: String,

    /// Verify digests recorded in FILE instead of computing new ones
    #[arg(short = 'c', long = "check", value_name = "FILE")]
    check: Option<PathBuf>,

    /// Metadata/permission bits folded into directory digests
    #[arg(short = 'm', long = "mask", default_value = "0000", value_name = "MASK")]
    mask: String,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Paths to hash
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let hasher = match xsum::hash::resolve(&cli.algorithm) {
        Ok(hasher) => hasher,
        Err(e) => {
            eprintln!("xsum: {e}");
            return ExitCode::from(2);
        }
    };

    let mask = match xsum::Mask::parse(&cli.mask) {
        Ok(mask) => mask,
        Err(e) => {
            eprintln!("xsum: {e}");
            return ExitCode::from(2);
        }
    };

    if let Some(check_file) = &cli.check {
        if !cli.paths.is_empty() {
            eprintln!("xsum: --check does not take positional paths");
            return ExitCode::from(2);
        }
        return match xsum::driver::check(check_file, &mask, hasher.as_ref()) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("xsum: {e}");
                ExitCode::from(2)
            }
        };
    }

    if cli.paths.is_empty() {
        eprintln!("xsum: at least one path is required");
        return ExitCode::from(2);
    }

    if xsum::driver::run(&cli.paths, &mask, hasher.as_ref()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
