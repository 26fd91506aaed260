//! Command-line surface of the `railyard` binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use time::OffsetDateTime;

use crate::{app::Application, config::AppConfig, db::Database, generators, seeds};

#[derive(Parser, Debug)]
#[command(name = "railyard", version, about = "A Rails-style web framework for Rust")]
pub struct Cli {
    /// Application root; config, migrations and generated files are resolved against it.
    #[arg(long, global = true, env = "RAILYARD_ROOT", default_value = ".")]
    pub root: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new application in a directory named after it
    New { name: String },
    /// Generate controllers, models and migrations
    #[command(alias = "g")]
    Generate {
        #[command(subcommand)]
        what: GenerateCommand,
    },
    /// Database tasks
    Db {
        #[command(subcommand)]
        task: DbCommand,
    },
    /// Start the HTTP server
    #[command(alias = "s")]
    Server,
}

#[derive(Subcommand, Debug)]
pub enum GenerateCommand {
    Controller {
        name: String,
    },
    Model {
        name: String,
        /// Field specs as `name:type`
        fields: Vec<String>,
    },
    Migration {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Apply pending migrations
    Migrate,
    /// Insert sample users
    Seed,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let root = cli.root;
    match cli.command {
        Command::New { name } => {
            let dir = generators::create_new_app(&root, &name)?;
            println!("Created new Railyard application: {}", dir.display());
            println!();
            println!("Next steps:");
            println!("  cd {name}");
            println!("  railyard db migrate");
            println!("  railyard server");
        }
        Command::Generate { what } => match what {
            GenerateCommand::Controller { name } => {
                let path = generators::generate_controller(&root, &name)?;
                println!("Generated controller: {}", path.display());
            }
            GenerateCommand::Model { name, fields } => {
                let path = generators::generate_model(&root, &name, &fields)?;
                println!("Generated model: {}", path.display());
            }
            GenerateCommand::Migration { name } => {
                let path =
                    generators::generate_migration(&root, &name, OffsetDateTime::now_utc())?;
                println!("Generated migration: {}", path.display());
            }
        },
        Command::Db { task } => {
            let config = AppConfig::load(&root)?;
            let db = Database::connect(&config.database, &config.root).await?;
            db.migrate().await.context("run migrations")?;
            match task {
                DbCommand::Migrate => println!("Migrations applied"),
                DbCommand::Seed => {
                    let inserted = seeds::seed(&db).await?;
                    println!("Seeded {inserted} user(s)");
                }
            }
        }
        Command::Server => {
            let config = AppConfig::load(&root)?;
            Application::init(config).await?.run().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_model_with_fields() {
        let cli = Cli::try_parse_from([
            "railyard",
            "--root",
            "/tmp/app",
            "generate",
            "model",
            "Post",
            "title:string",
            "views:integer",
        ])
        .unwrap();

        assert_eq!(cli.root, PathBuf::from("/tmp/app"));
        match cli.command {
            Command::Generate {
                what: GenerateCommand::Model { name, fields },
            } => {
                assert_eq!(name, "Post");
                assert_eq!(fields, ["title:string", "views:integer"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_db_and_server() {
        let cli = Cli::try_parse_from(["railyard", "db", "seed"]).unwrap();
        assert!(matches!(cli.command, Command::Db { task: DbCommand::Seed }));

        let cli = Cli::try_parse_from(["railyard", "s"]).unwrap();
        assert!(matches!(cli.command, Command::Server));
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["railyard"]).is_err());
    }

    #[tokio::test]
    async fn generate_controller_writes_into_root() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "railyard",
            "--root",
            dir.path().to_str().unwrap(),
            "g",
            "controller",
            "comments",
        ])
        .unwrap();

        run(cli).await.unwrap();
        assert!(dir
            .path()
            .join("src/controllers/comments_controller.rs")
            .is_file());
    }
}
