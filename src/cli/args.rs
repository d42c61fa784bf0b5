use crate::readers::SourceFormat;
use crate::utils::constants::DEFAULT_SHOW_LIMIT;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fa0010")]
#[command(about = "Ingest CWB F-A0010-001 temperature data into SQLite")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Configuration file (TOML, JSON or YAML)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse an F-A0010-001 file and upsert its temperatures into the database
    Ingest {
        #[arg(short, long, help = "F-A0010-001 file (JSON or XML)")]
        input: PathBuf,

        #[arg(long, help = "SQLite database path [default: data.db]")]
        db: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,

        #[arg(short, long, help = "Do not draw a progress bar")]
        quiet: bool,
    },

    /// List stored temperatures, newest first
    Show {
        #[arg(long, help = "SQLite database path [default: data.db]")]
        db: Option<PathBuf>,

        #[arg(short, long, help = "Only rows for this exact location name")]
        location: Option<String>,

        #[arg(short = 'n', long, default_value_t = DEFAULT_SHOW_LIMIT, help = "Maximum rows (0 = all)")]
        limit: usize,

        #[arg(long, help = "Print rows as JSON")]
        json: bool,
    },

    /// Display row counts and known locations
    Info {
        #[arg(long, help = "SQLite database path [default: data.db]")]
        db: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Auto,
    Json,
    Xml,
}

impl InputFormat {
    pub fn source_format(self) -> Option<SourceFormat> {
        match self {
            InputFormat::Auto => None,
            InputFormat::Json => Some(SourceFormat::Json),
            InputFormat::Xml => Some(SourceFormat::Xml),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_arguments() {
        let cli = Cli::try_parse_from(["fa0010", "ingest", "--input", "F-A0010-001.json", "--db", "w.db"])
            .unwrap();

        match cli.command {
            Commands::Ingest { input, db, format, quiet } => {
                assert_eq!(input, PathBuf::from("F-A0010-001.json"));
                assert_eq!(db, Some(PathBuf::from("w.db")));
                assert_eq!(format, InputFormat::Auto);
                assert!(!quiet);
            }
            _ => panic!("expected ingest command"),
        }
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["fa0010", "ingest"]).is_err());
    }

    #[test]
    fn test_show_defaults() {
        let cli = Cli::try_parse_from(["fa0010", "-v", "show", "--location", "臺北"]).unwrap();
        assert!(cli.verbose);

        match cli.command {
            Commands::Show { db, location, limit, json } => {
                assert_eq!(db, None);
                assert_eq!(location.as_deref(), Some("臺北"));
                assert_eq!(limit, DEFAULT_SHOW_LIMIT);
                assert!(!json);
            }
            _ => panic!("expected show command"),
        }
    }

    #[test]
    fn test_format_override() {
        assert_eq!(InputFormat::Xml.source_format(), Some(SourceFormat::Xml));
        assert_eq!(InputFormat::Auto.source_format(), None);
    }
}
