use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{resolve_db_path, ImportConfig};
use crate::error::ImportResult;
use crate::source::DEFAULT_BASE_URL;

#[derive(Parser, Debug)]
#[command(name = "pokedex-sync")]
#[command(version, about = "Import PokeAPI reference data into a SQLite database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all seven import stages in order
    Import {
        #[command(flatten)]
        args: ImportArgs,
    },

    /// Run a single stage (type, ability, move, item, species, evolution-chain, pokemon)
    Stage {
        /// Stage to run
        name: String,

        #[command(flatten)]
        args: ImportArgs,
    },

    /// Print the progress record of an import as JSON
    Status {
        /// Import id (defaults to the most recently started import)
        import_id: Option<String>,

        #[command(flatten)]
        db: DbArgs,
    },

    /// List the import stages in run order
    ListStages,
}

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// SQLite database path
    #[arg(long, env = "POKEDEX_DB")]
    pub db: Option<PathBuf>,
}

impl DbArgs {
    pub fn resolve(&self) -> ImportResult<PathBuf> {
        resolve_db_path(self.db.clone())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Records per list page
    #[arg(long, default_value_t = 50)]
    pub limit: u32,

    /// Minimum delay between requests, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay: u64,

    /// Cap on processed species and pokemon records
    #[arg(long)]
    pub max: Option<u64>,

    /// Worker count (fetching is sequential; values above 1 only warn)
    #[arg(long, default_value_t = 1)]
    pub threads: usize,

    /// Attach to (or create) the progress record with this id
    #[arg(long)]
    pub import_id: Option<String>,

    /// Source API base URL
    #[arg(long, env = "POKEAPI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Retries for transient request failures
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Backoff before the first retry, in milliseconds (doubled per retry)
    #[arg(long, default_value_t = 500)]
    pub retry_backoff: u64,

    /// Show the terminal progress view
    #[arg(long)]
    pub tui: bool,
}

impl ImportArgs {
    /// Resolve defaults and validate
    pub fn to_config(&self) -> ImportResult<ImportConfig> {
        let config = ImportConfig {
            db_path: self.db.resolve()?,
            base_url: self.base_url.clone(),
            page_size: self.limit,
            delay: Duration::from_millis(self.delay),
            max_items: self.max,
            threads: self.threads,
            import_id: self.import_id.clone(),
            retries: self.retries,
            retry_backoff: Duration::from_millis(self.retry_backoff),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
