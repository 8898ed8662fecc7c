use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use linkedin_query::output::{OutputFormat, OutputOptions, render};
use linkedin_query::session::SessionError;
use linkedin_query::{Credentials, RecordPolicy, ScrapeOptions, Scraper, ScraperError};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "linkedin-query", version)]
#[command(about = "Search LinkedIn for people and export the results", long_about = None)]
#[command(after_help = "The password is read from stdin when it is piped, otherwise it is prompted for:\n\
    \n    echo \"$PASSWORD\" | linkedin-query \"rust engineer\" -u me@example.com -o json")]
struct Cli {
    #[arg(help = "Search keywords")]
    query: String,

    #[arg(short = 'u', long, help = "Username to log on")]
    username: String,

    #[arg(short = 'p', long, help = "Include the profile picture URL")]
    pictures: bool,

    #[arg(
        short = 'o',
        long = "output",
        default_value = "csv",
        value_parser = parse_format,
        help = "Output format: csv, json or yaml"
    )]
    format: OutputFormat,

    #[arg(
        short = 's',
        long,
        default_value = ",",
        value_parser = parse_separator,
        help = "Separator for CSV fields"
    )]
    csv_separator: char,

    #[arg(short = 'f', long, value_name = "PATH", help = "Write the output to a file instead of stdout")]
    file: Option<PathBuf>,

    #[arg(
        short = 't',
        long,
        value_name = "SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Maximum time to wait for each HTTP request"
    )]
    timeout: u64,

    #[arg(long, help = "Leave out results with an unparsable location instead of failing")]
    skip_malformed: bool,

    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "warn",
        help = "Set the logging level"
    )]
    log_level: LogLevel,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

fn parse_separator(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("separator must be a single character, got {s:?}")),
    }
}

/// Piped stdin is read as-is so the password can come from a password manager.
fn read_password() -> io::Result<String> {
    let password = if io::stdin().is_terminal() {
        rpassword::prompt_password("Enter your password: ")?
    } else {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line
    };
    Ok(password.trim().to_string())
}

fn password_error(error: &io::Error) -> String {
    format!("Error: could not read password: {error}")
}

fn describe(error: &ScraperError) -> String {
    match error {
        ScraperError::Session(SessionError::LoginFailed) => {
            "Login failed. Please try again.".to_string()
        }
        ScraperError::Session(SessionError::NotFound { .. }) => {
            "Tried to get an inexistent URL".to_string()
        }
        ScraperError::Session(SessionError::InternalServerError { .. }) => {
            "LinkedIn had a problem".to_string()
        }
        ScraperError::Session(SessionError::Timeout { .. }) => {
            "Timeout! Try setting a longer timeout".to_string()
        }
        ScraperError::MalformedPayload(_) | ScraperError::MalformedRecord(_) => error.to_string(),
        ScraperError::Session(other) => {
            format!("There was an unknown error. Details: {other}")
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .target(env_logger::Target::Stderr)
        .init();

    let password = read_password().unwrap_or_else(|e| {
        eprintln!("{}", password_error(&e));
        process::exit(1);
    });

    let options = ScrapeOptions {
        include_pictures: cli.pictures,
        timeout: Duration::from_secs(cli.timeout),
        record_policy: if cli.skip_malformed {
            RecordPolicy::Skip
        } else {
            RecordPolicy::Abort
        },
    };

    let mut scraper = Scraper::new(Credentials::new(cli.username.clone(), password), options);

    let results = scraper.scrape(&cli.query).await.unwrap_or_else(|e| {
        log::debug!("{e:?}");
        eprintln!("Error: {}", describe(&e));
        process::exit(1);
    });

    let output_options = OutputOptions {
        include_pictures: cli.pictures,
        csv_separator: cli.csv_separator,
    };
    log::info!("Rendering {} result(s) as {}", results.len(), cli.format);
    let content = render(&results, cli.format, &output_options).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    match &cli.file {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &content) {
                eprintln!("Error: could not write {}: {}", path.display(), e);
                process::exit(1);
            }
            log::info!("Wrote {} result(s) to {}", results.len(), path.display());
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
}
