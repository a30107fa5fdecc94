use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, value_parser};

/// mcprobe - resolve Minecraft server addresses and query their status
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level, overrides the config file
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// JSON config file (default: $MCPROBE_CONFIG or ./mcprobe.json)
    #[arg(long, value_name = "FILE", value_parser = value_parser!(PathBuf))]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve an address and query the server once
    #[command(visible_alias = "cli")]
    Query {
        /// Print the result as JSON
        #[arg(long, visible_alias = "api", action = ArgAction::SetTrue)]
        json: bool,

        /// host, host:port, [ipv6] or [ipv6]:port
        address: String,
    },
    /// Only resolve an address, applying SRV discovery when no port is given
    Resolve {
        address: String,
    },
    /// Serve GET /api?<address> over HTTP
    Server {
        /// Port to listen on
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum, Eq, PartialEq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
