use std::io::{Read, Write};

use analyzer::Severity;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use common::cli::{CommonArgs, CommonCommands, utils};
use common::config::Configuration;
use serde::Serialize;

/// Static analysis for PromQL queries
///
/// With no subcommand, the query is validated.
#[derive(Parser, Debug)]
#[command(name = "promcheck", version)]
pub struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, global = true, help = "Print JSON on a single line")]
    compact: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Query to validate; read from stdin when absent or `-`
    query: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a query for syntax errors; fails unless the query is valid
    Validate {
        /// Read from stdin when absent or `-`
        query: Option<String>,
    },
    /// Check a query for anti-patterns; fails if any error-level issue is found
    Check {
        /// Lowest severity that makes the command fail
        #[arg(long, value_name = "SEVERITY", default_value_t = Severity::Error)]
        fail_on: Severity,

        /// Read from stdin when absent or `-`
        query: Option<String>,
    },
    #[command(flatten)]
    Common(CommonCommands),
}

impl Cli {
    /// Run the selected command; `Ok(false)` means the query did not pass
    pub fn run(self) -> Result<bool> {
        let config = utils::load_config(self.common.config.as_ref())?;
        utils::init_logging(&self.common, &config);
        utils::validate_config(&config)?;
        let config = utils::install_config(config);

        let stdout = std::io::stdout();
        self.execute(config, std::io::stdin(), &mut stdout.lock())
    }

    /// Dispatch the parsed command, reading a missing query from `input`
    fn execute(
        self,
        config: &Configuration,
        input: impl Read,
        output: &mut impl Write,
    ) -> Result<bool> {
        let pretty = config.output.pretty && !self.compact;

        match (self.command, self.query) {
            (Some(_), Some(query)) => {
                bail!("Unexpected query '{query}' before the subcommand")
            }
            (Some(Commands::Common(command)), None) => {
                utils::handle_common_command(&command, config)?;
                Ok(true)
            }
            (Some(Commands::Check { fail_on, query }), None) => {
                let query = read_query(query, input)?;
                let result = analyzer::check(&query);
                writeln!(output, "{}", render(&result, pretty)?)?;
                Ok(result.passes(fail_on))
            }
            (Some(Commands::Validate { query }), None) | (None, query) => {
                let query = read_query(query, input)?;
                let result = analyzer::validate(&query);
                writeln!(output, "{}", render(&result, pretty)?)?;
                Ok(result.valid)
            }
        }
    }
}

fn read_query(arg: Option<String>, mut input: impl Read) -> Result<String> {
    match arg {
        Some(query) if query != "-" => Ok(query),
        _ => {
            log::debug!("Reading query from stdin");
            let mut query = String::new();
            input
                .read_to_string(&mut query)
                .context("Failed to read query from stdin")?;
            tracing::debug!(bytes = query.len(), "query read");
            Ok(query)
        }
    }
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.context("Failed to serialize result to JSON")
}
