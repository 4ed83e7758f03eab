use std::fmt;
use std::sync::Arc;

use services::{Clock, ConnectivityProbe, FixedProbe, ProgressService, TcpProbe};
use storage::{JsonFileStore, StudentRepository, DEFAULT_DATA_FILE};
use tracing_subscriber::EnvFilter;

mod menu;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPort { raw: String },
    InvalidDataFile { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPort { raw } => write!(f, "invalid --port value: {raw}"),
            ArgsError::InvalidDataFile { raw } => write!(f, "invalid --data value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- menu  [--data <path>] [--offline]");
    eprintln!("  cargo run -p app -- serve [--data <path>] [--port <port>] [--offline]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --data {DEFAULT_DATA_FILE}");
    eprintln!("  --port 5000");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  REVISE_DATA_FILE, REVISE_PORT");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Menu,
    Serve,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "menu" => Some(Self::Menu),
            "serve" => Some(Self::Serve),
            _ => None,
        }
    }
}

struct Args {
    data_file: String,
    port: u16,
    offline: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut data_file =
            std::env::var("REVISE_DATA_FILE").unwrap_or_else(|_| DEFAULT_DATA_FILE.into());
        let mut port = std::env::var("REVISE_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(5000);
        let mut offline = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data" => {
                    let value = require_value(args, "--data")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDataFile { raw: value });
                    }
                    data_file = value;
                }
                "--port" => {
                    let value = require_value(args, "--port")?;
                    port = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPort { raw: value.clone() })?;
                }
                "--offline" => offline = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            data_file,
            port,
            offline,
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: drop into the interactive menu when no subcommand
    // is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Menu,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Menu,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let store: Arc<dyn StudentRepository> = Arc::new(JsonFileStore::new(&parsed.data_file));
    let probe: Arc<dyn ConnectivityProbe> = if parsed.offline {
        Arc::new(FixedProbe::offline())
    } else {
        Arc::new(TcpProbe::new())
    };

    let service = Arc::new(ProgressService::new(Clock::default_clock(), store, probe).await);

    match cmd {
        Command::Serve => web::serve(service, parsed.port).await?,
        Command::Menu => menu::run(service).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
