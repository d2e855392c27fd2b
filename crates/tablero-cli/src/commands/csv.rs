//! CSV export and import commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tablero_core::transfer;
use tablero_store::SharedStore;

use super::resolve_board;
use crate::output;

#[derive(Subcommand)]
pub enum CsvCommands {
    /// Export a board's cards
    Export(ExportArgs),

    /// Write an import template with one example row per column
    Template(ExportArgs),

    /// Create cards from a CSV file
    Import(ImportArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Board id or title
    pub board: String,

    /// Output file, `-` for stdout (defaults to `<title>_<date>.csv`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Board id or title
    pub board: String,

    /// CSV file with `Título,Contenido,Columna` columns
    pub file: PathBuf,
}

fn write_export(text: &str, destination: Option<PathBuf>, title: &str) -> Result<()> {
    let path = destination.unwrap_or_else(|| {
        PathBuf::from(transfer::export_filename(
            title,
            chrono::Local::now().date_naive(),
        ))
    });
    if path == Path::new("-") {
        print!("{}", text);
        return Ok(());
    }
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    output::success(format!("Wrote {}", path.display().to_string().cyan()));
    Ok(())
}

pub async fn execute(cmd: CsvCommands, store: &SharedStore) -> Result<()> {
    match cmd {
        CsvCommands::Export(args) => {
            let board = resolve_board(store, &args.board).await?;
            let text = transfer::export_board(store, &board.id).await?;
            write_export(&text, args.output, &board.title)?;
        }

        CsvCommands::Template(args) => {
            let board = resolve_board(store, &args.board).await?;
            let text = transfer::export_board_template(store, &board.id).await?;
            let title = format!("{}_plantilla", board.title);
            write_export(&text, args.output, &title)?;
        }

        CsvCommands::Import(args) => {
            let board = resolve_board(store, &args.board).await?;
            let text = std::fs::read_to_string(&args.file)
                .with_context(|| format!("Failed to read {}", args.file.display()))?;
            let summary = transfer::import_cards(store, &board.id, &text).await?;

            output::success(format!(
                "Imported {} card(s) into {}",
                summary.imported.to_string().bold(),
                board.title.cyan()
            ));
            if summary.failed > 0 {
                println!(
                    "{} {} row(s) skipped: column not found",
                    "⚠".yellow(),
                    summary.failed
                );
            }
        }
    }

    Ok(())
}
