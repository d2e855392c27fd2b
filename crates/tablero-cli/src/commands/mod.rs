//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tablero_core::board::{Board, Column};
use tablero_core::card::Card;
use tablero_core::{BoardProjection, Config, TableroError, TableroResult};
use tablero_store::SharedStore;

pub mod board;
pub mod card;
pub mod column;
pub mod csv;
pub mod watch;

/// Tablero - kanban boards in a shared, live-updating store
#[derive(Parser)]
#[command(name = "tablero")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Store URL (`redis://host:port` or `memory://`)
    #[arg(long, global = true, env = "TABLERO_STORE_URL")]
    pub store_url: Option<String>,

    /// Key and channel prefix in the store
    #[arg(long, global = true, env = "TABLERO_NAMESPACE")]
    pub namespace: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Board management
    #[command(subcommand)]
    Board(board::BoardCommands),

    /// Column management
    #[command(subcommand)]
    Column(column::ColumnCommands),

    /// Card management
    #[command(subcommand)]
    Card(card::CardCommands),

    /// CSV export and import
    #[command(subcommand)]
    Csv(csv::CsvCommands),

    /// Follow a board live until Ctrl-C
    Watch(watch::WatchArgs),
}

impl Cli {
    /// Store settings from the environment, overridden by flags.
    pub fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(url) = &self.store_url {
            config = config.with_store_url(url);
        }
        if let Some(namespace) = &self.namespace {
            config = config.with_namespace(namespace);
        }
        config
    }

    pub async fn execute(self) -> Result<()> {
        let store = self.config().open_store().await?;

        match self.command {
            Commands::Board(cmd) => board::execute(cmd, &store).await,
            Commands::Column(cmd) => column::execute(cmd, &store).await,
            Commands::Card(cmd) => card::execute(cmd, &store).await,
            Commands::Csv(cmd) => csv::execute(cmd, &store).await,
            Commands::Watch(args) => watch::execute(args, store).await,
        }
    }
}

/// Find a board by id, then by exact title.
pub async fn resolve_board(store: &SharedStore, reference: &str) -> TableroResult<Board> {
    if let Some(board) = tablero_core::board::find_board(store, reference).await? {
        return Ok(board);
    }
    tablero_core::board::list_boards(store)
        .await?
        .into_iter()
        .find(|b| b.title == reference)
        .ok_or_else(|| TableroError::BoardNotFound(reference.to_string()))
}

/// Find a column by id, then by exact name.
pub fn resolve_column<'a>(board: &'a Board, reference: &str) -> TableroResult<&'a Column> {
    board
        .column(reference)
        .or_else(|| board.column_by_name(reference))
        .ok_or_else(|| TableroError::ColumnNotFound(reference.to_string()))
}

/// Point-in-time projection of a board, read without subscribing.
pub async fn load_projection(store: &SharedStore, board: Board) -> TableroResult<BoardProjection> {
    let cards_by_column = tablero_core::card::cards_by_column(store, &board.id).await?;
    Ok(BoardProjection {
        revision: 0,
        loaded: true,
        board: Some(board),
        cards_by_column,
    })
}

/// Column id and current state of a card.
pub fn find_card(projection: &BoardProjection, card_id: &str) -> TableroResult<(String, Card)> {
    let (column_id, index) = projection
        .locate_card(card_id)
        .ok_or_else(|| TableroError::CardNotFound(card_id.to_string()))?;
    let card = projection.cards(column_id)[index].clone();
    Ok((column_id.to_string(), card))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::parse_from([
            "tablero",
            "--store-url",
            "memory://",
            "--namespace",
            "demo",
            "board",
            "list",
        ]);
        let config = cli.config();
        assert_eq!(config.store_url, "memory://");
        assert_eq!(config.namespace, "demo");
    }
}
