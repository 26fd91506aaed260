use clap::Parser;

use railyard::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    railyard::logging::init("railyard=debug,tower_http=info,sqlx=warn");

    cli::run(Cli::parse()).await
}
