use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use common::cli::{CommonArgs, utils};
use futures::FutureExt;
use tests_integration::fixtures::{Fixture, SCHEMA_PREFIX, TeardownReport};
use tests_integration::scenario::CatalogKind;
use tracing::info;
use trino_client::{ConnectOptions, TrinoClient};

/// Schema fixture for Trino catalog integration tests
#[derive(Parser)]
#[command(name = "trino-fixture", version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a schema, run the catalog scenario against it and reclaim it
    Run {
        /// Catalog to exercise: iceberg or hive
        kind: CatalogKind,
    },
    /// List unittest_ schemas left behind in a catalog
    Orphans { kind: CatalogKind },
    /// Drop a leftover unittest_ schema and reclaim its storage
    Cleanup { kind: CatalogKind, schema: String },
    /// Print the resolved settings with secrets redacted
    Config {
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    async fn run(self) -> Result<()> {
        utils::init_logging(&self.common);
        let resolver = utils::resolver(&self.common);

        match self.command {
            Commands::Run { kind } => {
                let scenario = kind.scenario();
                let (outcome, report) = Fixture::scoped(kind, &resolver, move |session| {
                    async move { scenario.run(session).await }.boxed()
                })
                .await?;
                print_report(&report);
                outcome.with_context(|| format!("{kind} scenario failed"))?;
            }
            Commands::Orphans { kind } => {
                let settings = resolver.resolve()?;
                let options = ConnectOptions::default().with_user(&settings.engine.user);
                let client = TrinoClient::connect(&settings.engine.base_url(), options)?;

                let result = client
                    .execute(&format!("SHOW SCHEMAS FROM {}", kind.catalog()))
                    .await?;
                client.close();

                let orphans: Vec<&str> = result
                    .first_column()
                    .into_iter()
                    .filter(|name| name.starts_with(SCHEMA_PREFIX))
                    .collect();
                info!("{} leftover schemas in {}", orphans.len(), kind.catalog());
                for name in orphans {
                    println!("{name}");
                }
            }
            Commands::Cleanup { kind, schema } => {
                let fixture = Fixture::attach(kind, &resolver, &schema)?;
                let report = fixture.teardown().await;
                print_report(&report);
                if !report.is_clean() {
                    bail!("Cleanup of {} incomplete", report.schema);
                }
            }
            Commands::Config { json } => {
                let settings = resolver.resolve()?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                } else {
                    println!("{settings:#?}");
                }
            }
        }
        Ok(())
    }
}

fn print_report(report: &TeardownReport) {
    println!("schema:  {} ({:?})", report.schema, report.schema_drop);
    println!("storage: {:?}", report.storage);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}
