//! Pseudo Dojo CLI entry point.

use clap::Parser;

use pseudo_dojo::cli::{commands, handle_error, Cli, Commands};
use pseudo_dojo::infrastructure::config::ConfigLoader;
use pseudo_dojo::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Levels => commands::levels::execute(&config, cli.json),
        Commands::Inspect { pseudo } => commands::inspect::execute(pseudo, &config, cli.json).await,
        Commands::Check { pseudo, accuracy } => {
            commands::check::execute(pseudo, &accuracy, &config, cli.json).await
        }
        Commands::Challenge(args) => commands::challenge::execute(args, &config, cli.json).await,
        Commands::Retrain {
            pseudo,
            level,
            accuracy,
            overwrite,
        } => {
            commands::retrain::execute(pseudo, level, &accuracy, overwrite, &config, cli.json)
                .await
        }
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
