//! Client configuration
//!
//! Parsed from the command line with clap:
//! `relay_chat [HOST[:PORT]] [--lines] [--json] [--no-color]`

use clap::Parser;

use crate::error::ConfigError;
use crate::framing::Framing;

/// Default relay host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default relay port
pub const DEFAULT_PORT: u16 = 6969;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "relay_chat",
    about = "Line-oriented chat client for a broadcast relay",
    version
)]
pub struct Cli {
    #[arg(
        value_name = "HOST[:PORT]",
        value_parser = parse_address,
        help = "Relay address (defaults to 127.0.0.1:6969)"
    )]
    pub address: Option<RelayAddress>,

    #[arg(long, help = "Delimit messages with newlines in both directions")]
    pub lines: bool,

    #[arg(long, help = "Print every update as one JSON object per line")]
    pub json: bool,

    #[arg(long, help = "Disable colored sender badges")]
    pub no_color: bool,
}

/// Host and/or port given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayAddress {
    /// Empty when only `:PORT` was given
    pub host: String,
    pub port: Option<u16>,
}

/// How the terminal surface prints updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per update
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub framing: Framing,
    pub output: OutputMode,
    /// Truecolor sender badges in text output
    pub color: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            framing: Framing::Chunk,
            output: OutputMode::Text,
            color: true,
        }
    }
}

impl From<Cli> for ClientConfig {
    fn from(cli: Cli) -> Self {
        let mut config = Self::default();

        if let Some(address) = cli.address {
            if !address.host.is_empty() {
                config.host = address.host;
            }
            if let Some(port) = address.port {
                config.port = port;
            }
        }
        if cli.lines {
            config.framing = Framing::Line;
        }
        if cli.json {
            config.output = OutputMode::Json;
        }
        config.color = !cli.no_color;

        config
    }
}

impl ClientConfig {
    /// Honour the `NO_COLOR` convention
    pub fn with_env(mut self) -> Self {
        if std::env::var_os("NO_COLOR").is_some() {
            self.color = false;
        }
        self
    }

    /// `host:port` suitable for `TcpStream::connect`
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Split `HOST[:PORT]`, keeping bracketed or bare IPv6 hosts intact
fn parse_address(arg: &str) -> Result<RelayAddress, ConfigError> {
    match arg.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') || host.ends_with(']') => {
            let port = port
                .parse::<u16>()
                .ok()
                .filter(|&p| p != 0)
                .ok_or_else(|| ConfigError::InvalidPort(port.to_string()))?;
            Ok(RelayAddress {
                host: host.to_string(),
                port: Some(port),
            })
        }
        _ => Ok(RelayAddress {
            host: arg.to_string(),
            port: None,
        }),
    }
}
