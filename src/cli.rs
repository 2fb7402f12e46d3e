//! CLI argument parsing for the wamon script runner.

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The path to the wamon script file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// The mangled id of the function to call after the globals are
    /// evaluated, e.g. `main$Main`.
    #[arg(short, long)]
    pub call: Option<String>,

    /// Dump the scanned token stream (for debugging).
    #[arg(long)]
    pub dump_tokens: bool,

    /// Specify the log level of the interpreter.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings.
    #[value(alias("1"))]
    Warn,

    /// Log information about the pipeline stages.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally.
    #[value(alias("3"))]
    Debug,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}
