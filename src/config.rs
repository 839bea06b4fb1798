//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::graphql::DEFAULT_PATH;
use crate::middleware::cors::CorsConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// trellis HTTP server
#[derive(Debug, Parser)]
#[command(name = "trellis", about = "REST router and GraphQL endpoint with uniform error handling")]
pub struct Config {
    /// Interface to listen on
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 4000, env = "PORT")]
    pub port: u16,

    /// Path to the root SDL file
    #[arg(long, default_value = "schema/schema.graphql", env = "SCHEMA_PATH")]
    pub schema: PathBuf,

    /// URL path the GraphQL endpoint is served on
    #[arg(long, default_value = DEFAULT_PATH, env = "GRAPHQL_PATH")]
    pub graphql_path: String,

    /// Do not serve GraphiQL on a bare GET
    #[arg(long, env = "DISABLE_GRAPHIQL")]
    pub no_graphiql: bool,

    /// Allowed CORS origin; repeat or comma-separate. Any origin when absent.
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Config {
    /// `host:port`, bracketing IPv6 literals.
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn cors(&self) -> CorsConfig {
        CorsConfig { origins: self.cors_origins.clone(), ..CorsConfig::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("trellis").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&["--host", "127.0.0.1"]);
        assert_eq!(config.port, 4000);
        assert_eq!(config.schema, PathBuf::from("schema/schema.graphql"));
        assert_eq!(config.graphql_path, "/graphql");
        assert!(!config.no_graphiql);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.addr(), "127.0.0.1:4000");
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let config = parse(&["--cors-origin", "https://a.test,https://b.test"]);
        assert_eq!(config.cors().origins, ["https://a.test", "https://b.test"]);
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        let config = parse(&["--host", "::1", "--port", "8080"]);
        assert_eq!(config.addr(), "[::1]:8080");
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Config::try_parse_from(["trellis", "--log-format", "xml"]).is_err());
    }
}
