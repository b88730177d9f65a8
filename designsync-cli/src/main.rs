//! designsync — one-shot CouchDB design-document deployment.
//!
//! # Usage
//!
//! ```text
//! designsync generate [-d ./designDocuments]
//! designsync check -a http://example.com:5984/yourdb [-u admin -p passw0rd]
//! designsync push  -a http://example.com:5984/yourdb [-u admin -p passw0rd]
//! designsync purge -a http://example.com:5984/yourdb [-u admin -p passw0rd]
//! ```
//!
//! Exit codes: 0 success; 1 invalid arguments (malformed or non-HTTP(S)
//! database URL, missing base directory); 2 any other failure.

mod assembler;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use assembler::FsAssembler;
use designsync_engine::{
    generate, Credentials, DatabaseUrl, Engine, EngineError, HttpDatabase,
};

const EXIT_OK: u8 = 0;
const EXIT_INVALID_ARGS: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "designsync",
    version,
    about = "Synchronize CouchDB design documents with a directory tree",
    long_about = None,
)]
struct Cli {
    /// Database URL, e.g. http://example.com:5984/yourdb
    #[arg(short = 'a', long = "address", global = true)]
    address: Option<String>,

    /// Database access user name.
    #[arg(short = 'u', long = "user", global = true)]
    user: Option<String>,

    /// Database access password.
    #[arg(short = 'p', long = "password", global = true)]
    password: Option<String>,

    /// Base directory for document generation (default: current directory).
    #[arg(short = 'd', long = "directory", global = true)]
    directory: Option<PathBuf>,

    /// Log diagnostics to the console.
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print each assembled design document as pretty JSON.
    Generate,
    /// Report whether the database drifts from the directory tree.
    Check,
    /// Push new and changed design documents until the database converges.
    Push,
    /// Delete every document in the database, in batches.
    Purge,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version land here too; only real parse errors are
        // invalid arguments.
        Err(err) => {
            let code = if err.use_stderr() {
                EXIT_INVALID_ARGS
            } else {
                EXIT_OK
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose);
    ExitCode::from(run(cli))
}

fn run(cli: Cli) -> u8 {
    let base = cli
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    if !base.is_dir() {
        log::error!("base directory {} does not exist", base.display());
        return EXIT_INVALID_ARGS;
    }
    let assembler = FsAssembler::new(base);

    if let Commands::Generate = cli.command {
        return match generate(&assembler) {
            Ok(rendered) => {
                for document in rendered {
                    println!("{document}");
                    println!();
                }
                EXIT_OK
            }
            Err(err) => fail(&err),
        };
    }

    let Some(address) = cli.address else {
        log::error!("--address is required for this command");
        return EXIT_INVALID_ARGS;
    };
    let url = match DatabaseUrl::parse(&address) {
        Ok(url) => url,
        Err(err) => {
            log::error!("{err}");
            return EXIT_INVALID_ARGS;
        }
    };
    let credentials = Credentials::from_parts(cli.user, cli.password);
    let engine = Engine::new(HttpDatabase::new(url, credentials), assembler);

    let result = match cli.command {
        Commands::Check => engine.check_if_changed().map(|changed| {
            println!("{}", if changed { "Changed" } else { "Have not changed" });
        }),
        Commands::Push => engine.push_if_changed(),
        Commands::Purge => engine.purge_database(),
        Commands::Generate => unreachable!("handled above"),
    };

    match result {
        Ok(()) => EXIT_OK,
        Err(err) => fail(&err),
    }
}

fn fail(err: &EngineError) -> u8 {
    log::error!("{err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        log::error!("  caused by: {cause}");
        source = cause.source();
    }
    EXIT_FAILURE
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}
