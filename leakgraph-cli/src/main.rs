//! Leakgraph CLI - officer neighbourhood lookups over Bolt
//!
//! Connects to a Neo4j-compatible server, runs the officer traversal (or a
//! Cypher file with bound parameters) and prints one line per returned row.
//!
//! Settings come from, in increasing priority:
//! - built-in defaults
//! - `--config <FILE>` (TOML)
//! - `NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`, `NEO4J_DATABASE`
//! - command line flags
//!
//! Results go to stdout; logs and errors go to stderr.

mod output;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use leakgraph_client::{
    run_query, Client, LeakgraphConfig, OfficerLookup, ParamValue, Statement,
};
use output::{write_records, OutputFormat};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Leakgraph CLI - list entities connected to an officer
#[derive(Parser, Debug)]
#[command(name = "leakgraph")]
#[command(about = "Run a parameterized traversal against a Bolt graph database", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bolt URI, e.g. neo4j://localhost:7687
    #[arg(long)]
    uri: Option<String>,

    /// Username for authentication
    #[arg(short, long)]
    username: Option<String>,

    /// Password for authentication
    #[arg(short = 'W', long)]
    password: Option<String>,

    /// Database name
    #[arg(short, long)]
    database: Option<String>,

    /// Officer whose connections are listed
    #[arg(short, long)]
    name: Option<String>,

    /// Maximum relationship hops from the officer
    #[arg(long)]
    hops: Option<u32>,

    /// Maximum number of rows
    #[arg(long)]
    limit: Option<i64>,

    /// Run the Cypher statement in this file instead of the officer traversal
    #[arg(short = 'q', long, value_name = "FILE")]
    query_file: Option<PathBuf>,

    /// Parameter for --query-file, as key=value (repeatable)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, ParamValue)>,

    /// Field printed from each row (repeatable)
    #[arg(long = "field", value_name = "FIELD", default_value = "name")]
    fields: Vec<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "plain")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_param(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    let valid_key = key
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_key {
        return Err(format!("invalid parameter name '{}'", key));
    }
    Ok((key.to_string(), ParamValue::parse_literal(value)))
}

impl Cli {
    /// Merge file, environment and flags into one configuration
    fn resolve_config(&self) -> Result<LeakgraphConfig> {
        let base = match &self.config {
            Some(path) => LeakgraphConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => LeakgraphConfig::default(),
        };
        let mut config = base.apply_env();

        if let Some(uri) = &self.uri {
            config.connection.uri = uri.clone();
        }
        if let Some(username) = &self.username {
            config.connection.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.connection.password = password.clone();
        }
        if let Some(database) = &self.database {
            config.connection.database = database.clone();
        }
        if let Some(name) = &self.name {
            config.lookup.name = name.clone();
        }
        if let Some(hops) = self.hops {
            config.lookup.max_hops = hops;
        }
        if let Some(limit) = self.limit {
            config.lookup.limit = limit;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// The statement to run: a query file with its parameters, or the
    /// officer traversal
    fn build_statement(&self, config: &LeakgraphConfig) -> Result<Statement> {
        let statement = match &self.query_file {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read query file: {}", path.display()))?;
                self.params
                    .iter()
                    .fold(Statement::new(text), |stmt, (key, value)| {
                        stmt.param(key.as_str(), value.clone())
                    })
                    .returns(self.fields.iter().cloned())
            }
            None => {
                if !self.params.is_empty() {
                    return Err(anyhow!("--param is only valid together with --query-file"));
                }
                OfficerLookup::from(&config.lookup)
                    .statement()?
                    .returns(self.fields.iter().cloned())
            }
        };

        statement.validate()?;
        Ok(statement)
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "leakgraph=debug,leakgraph_client=debug"
    } else {
        "leakgraph=warn,leakgraph_client=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let statement = cli.build_statement(&config)?;
    let connection = &config.connection;

    info!(uri = %connection.uri, database = %connection.database, "Connecting");
    let client = Client::connect(connection)
        .await
        .with_context(|| format!("Connection to {} failed", connection.uri))?;

    let records = run_query(client, &connection.database, &statement)
        .await
        .context("Query failed")?;
    debug!(rows = records.len(), "Writing results");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_records(&mut out, &records, statement.columns(), cli.format)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["leakgraph"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.fields, vec!["name".to_string()]);
        assert_eq!(cli.format, OutputFormat::Plain);
        assert!(cli.params.is_empty());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[connection]\nuri = \"bolt://from-file:7687\"\ndatabase = \"filedb\"\n\n[lookup]\nlimit = 3\n"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&[
            "--config",
            &path,
            "--uri",
            "bolt://from-flag:7999",
            "--hops",
            "2",
        ]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.connection.uri, "bolt://from-flag:7999");
        assert_eq!(config.lookup.max_hops, 2);
        assert_eq!(config.lookup.limit, 3);
    }

    #[test]
    fn test_default_statement_is_officer_lookup() {
        let cli = parse(&["--name", "Jane Roe"]);
        let mut config = LeakgraphConfig::default();
        config.lookup.name = cli.name.clone().unwrap();

        let stmt = cli.build_statement(&config).unwrap();
        assert!(stmt.text().contains("MATCH (a:Officer {name: $name})"));
        assert_eq!(
            stmt.get_param("name"),
            Some(&ParamValue::String("Jane Roe".into()))
        );
    }

    #[test]
    fn test_query_file_with_params() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "MATCH (e:Entity) WHERE e.jurisdiction = $j RETURN e.name AS name, e.id AS id LIMIT $n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&[
            "-q", &path, "-P", "j=BVI", "-P", "n=5", "--field", "name", "--field", "id",
        ]);
        let stmt = cli.build_statement(&LeakgraphConfig::default()).unwrap();

        assert_eq!(stmt.get_param("j"), Some(&ParamValue::String("BVI".into())));
        assert_eq!(stmt.get_param("n"), Some(&ParamValue::Integer(5)));
        assert_eq!(stmt.columns(), ["name".to_string(), "id".to_string()]);
    }

    #[test]
    fn test_query_file_missing_param_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "RETURN $x AS name").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&["-q", &path]);
        assert!(cli.build_statement(&LeakgraphConfig::default()).is_err());
    }

    #[test]
    fn test_params_require_query_file() {
        let cli = parse(&["-P", "x=1"]);
        assert!(cli.build_statement(&LeakgraphConfig::default()).is_err());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("limit=10").unwrap(),
            ("limit".to_string(), ParamValue::Integer(10))
        );
        assert_eq!(
            parse_param("name=A=B").unwrap(),
            ("name".to_string(), ParamValue::String("A=B".into()))
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("1bad=x").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(Cli::try_parse_from(["leakgraph", "-o", "xml"]).is_err());
    }
}
