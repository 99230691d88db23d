use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use movies_config::{LogFormat, MoviesConfig};

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "HTTP service over the movie graph")]
pub struct Cli {
    #[arg(
        long,
        default_value = ".movies",
        help = "Directory holding config.toml and the database files"
    )]
    pub data_dir: PathBuf,

    #[arg(
        long,
        global = true,
        help = "Database to use instead of the configured or default one"
    )]
    pub database: Option<String>,

    #[arg(
        long,
        global = true,
        value_parser = parse_log_format,
        help = "Log format: human or json"
    )]
    pub log_format: Option<LogFormat>,

    #[arg(
        long,
        global = true,
        help = "Log filter directives, e.g. info or moviesd=debug"
    )]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (the default when no subcommand is given).
    Serve(ServeArgs),
    /// Load a seed dataset into the selected database and exit.
    Seed(SeedArgs),
}

impl Default for Command {
    fn default() -> Self {
        Self::Serve(ServeArgs::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Listen address, overrides [server] bind")]
    pub bind: Option<String>,

    #[arg(long, help = "Load the bundled dataset before serving")]
    pub seed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Args)]
pub struct SeedArgs {
    #[arg(long, help = "JSON dataset to load instead of the bundled one")]
    pub from: Option<PathBuf>,
}

/// Effective settings after CLI flags are layered over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind: String,
    pub database: Option<String>,
    pub log_format: LogFormat,
    pub log_filter: String,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: &MoviesConfig) -> Self {
        let bind = match &cli.command {
            Some(Command::Serve(args)) => args.bind.clone(),
            _ => None,
        };

        Self {
            bind: non_blank(bind).unwrap_or_else(|| config.server.bind.clone()),
            database: non_blank(cli.database.clone()).or_else(|| config.database.name.clone()),
            log_format: cli.log_format.unwrap_or(config.logging.format),
            log_filter: non_blank(cli.log_filter.clone())
                .unwrap_or_else(|| config.logging.filter.clone()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve_with_config_values() {
        let cli = Cli::try_parse_from(["moviesd"]).expect("parse");
        assert_eq!(cli.command, None);

        let mut config = MoviesConfig::default();
        config.database.name = Some("archive".to_owned());
        let settings = Settings::resolve(&cli, &config);

        assert_eq!(settings.bind, config.server.bind);
        assert_eq!(settings.database.as_deref(), Some("archive"));
        assert_eq!(settings.log_format, LogFormat::Human);
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "moviesd",
            "--data-dir",
            "/tmp/movies",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--seed",
            "--database",
            "staging",
            "--log-format",
            "json",
        ])
        .expect("parse");

        assert_eq!(cli.data_dir, PathBuf::from("/tmp/movies"));
        assert_eq!(
            cli.command,
            Some(Command::Serve(ServeArgs {
                bind: Some("0.0.0.0:9000".to_owned()),
                seed: true,
            }))
        );

        let settings = Settings::resolve(&cli, &MoviesConfig::default());
        assert_eq!(settings.bind, "0.0.0.0:9000");
        assert_eq!(settings.database.as_deref(), Some("staging"));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["moviesd", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn seed_accepts_dataset_path() {
        let cli = Cli::try_parse_from(["moviesd", "seed", "--from", "graph.json"]).expect("parse");
        assert_eq!(
            cli.command,
            Some(Command::Seed(SeedArgs {
                from: Some(PathBuf::from("graph.json")),
            }))
        );
    }
}
