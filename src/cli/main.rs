use anyhow::{bail, Context};
use catalog_search::config::Config;
use catalog_search::models::{Actor, CatalogRecord, ObjectKind};
use catalog_search::query::{parse_query, parse_url_query, pretty_print, to_url, SortCriterion};
use catalog_search::search::{SearchBackends, Window};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

#[derive(Parser)]
#[command(name = "catalog-search-cli")]
#[command(about = "Catalog search CLI", long_about = None)]
struct Cli {
    /// Configuration file layered over the defaults
    #[arg(short, long, env = "CATALOG_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print its canonical forms
    Parse {
        #[arg(value_name = "QUERY")]
        query: String,

        /// Input is URL-encoded
        #[arg(short, long)]
        url: bool,

        /// Print the query tree as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Index a JSON array of records into the embedded index
    Index {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Remove every indexed record first
        #[arg(long)]
        clear: bool,
    },

    /// Search records of one kind
    Search {
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,

        #[command(flatten)]
        target: Target,

        /// Restrict to the descendants of this container
        #[arg(long)]
        scope: Option<String>,

        /// Sort keys as field[:asc|desc], most significant first
        #[arg(short, long)]
        sort: Vec<SortCriterion>,

        /// Include facets and scope counts
        #[arg(short, long)]
        facets: bool,
    },

    /// Run a query in the backend's native language
    Raw {
        #[arg(value_name = "QUERY")]
        query: String,

        #[command(flatten)]
        target: Target,

        #[arg(short, long, default_value_t = SortCriterion::default())]
        sort: SortCriterion,
    },

    /// Show embedded index statistics
    Stats,
}

#[derive(Args)]
struct Target {
    #[arg(short, long, default_value = "item")]
    kind: ObjectKind,

    #[arg(long, default_value_t = 0)]
    offset: i64,

    /// Page size, -1 for every result
    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    size: i64,

    /// Search as this user, anonymous when missing
    #[arg(short, long)]
    actor: Option<String>,

    /// The actor is a system administrator
    #[arg(long, requires = "actor")]
    admin: bool,

    /// Containers the actor may read
    #[arg(long = "grant", requires = "actor")]
    grants: Vec<String>,
}

impl Target {
    fn actor(&self) -> Option<Actor> {
        self.actor.as_ref().map(|id| {
            let actor = if self.admin {
                Actor::admin(id.clone())
            } else {
                Actor::new(id.clone())
            };
            actor.with_readable_containers(self.grants.iter().cloned())
        })
    }

    fn window(&self) -> Window {
        Window::new(self.offset, self.size)
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("catalog_search={}", config.observability.log_level).into());

    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate()?;
    init_tracing(&config);

    match cli.command {
        Commands::Parse { query, url, json } => {
            let parsed = if url {
                parse_url_query(&query)?
            } else {
                parse_query(&query)?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&parsed)?);
            } else {
                println!("{}", pretty_print(&parsed));
                println!("{}", to_url(&parsed));
            }
        }

        Commands::Index { file, clear } => {
            let backends = SearchBackends::from_config(config.search).await?;
            let Some(index) = backends.embedded() else {
                bail!("Indexing requires the embedded index engine");
            };

            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let records: Vec<CatalogRecord> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a JSON array of records", file.display()))?;
            for record in &records {
                record
                    .validate()
                    .with_context(|| format!("Invalid record '{}'", record.id))?;
            }

            if clear {
                index.clear().await?;
            }
            let indexed = index.index_records(&records).await?;
            index.commit().await?;
            println!("Indexed {} records", indexed);
        }

        Commands::Search {
            query,
            target,
            scope,
            sort,
            facets,
        } => {
            let parsed = parse_query(&query)?;
            let backends = SearchBackends::from_config(config.search).await?;
            let port = backends.for_kind(target.kind)?;
            let actor = target.actor();

            let result = if facets {
                port.search_with_facets_and_multi_level_sorting(
                    &parsed,
                    &sort,
                    actor.as_ref(),
                    scope.as_deref(),
                    target.window(),
                )
                .await?
            } else {
                port.search_with_multi_level_sorting(
                    &parsed,
                    &sort,
                    actor.as_ref(),
                    scope.as_deref(),
                    target.window(),
                )
                .await?
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Raw {
            query,
            target,
            sort,
        } => {
            let backends = SearchBackends::from_config(config.search).await?;
            let port = backends.for_kind(target.kind)?;
            let actor = target.actor();

            let result = port
                .search_string(&query, &sort, actor.as_ref(), target.window())
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Stats => {
            let backends = SearchBackends::from_config(config.search).await?;
            let Some(index) = backends.embedded() else {
                bail!("Statistics are only kept by the embedded index engine");
            };
            println!("{}", serde_json::to_string_pretty(&index.stats().await?)?);
        }
    }

    Ok(())
}
