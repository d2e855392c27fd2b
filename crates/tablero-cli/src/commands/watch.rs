//! Live board view.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tablero_core::{BoardProjection, SyncProjector};
use tablero_store::SharedStore;
use tracing::info;

use super::resolve_board;
use crate::output;

#[derive(Args)]
pub struct WatchArgs {
    /// Board id or title
    pub board: String,
}

fn render(projection: &BoardProjection) {
    // Clear screen, cursor home.
    print!("\x1B[2J\x1B[H");
    output::print_board(projection);
    println!(
        "{}",
        format!("revision {} · Ctrl-C to stop", projection.revision).dimmed()
    );
}

pub async fn execute(args: WatchArgs, store: SharedStore) -> Result<()> {
    let board = resolve_board(&store, &args.board).await?;
    let projector = SyncProjector::start(store, &board.id);
    let mut updates = projector.updates();
    info!(board_id = %board.id, "Watching board");

    let current = updates.borrow_and_update().clone();
    if current.loaded {
        render(&current);
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let projection = updates.borrow_and_update().clone();
                if !projection.loaded {
                    continue;
                }
                render(&projection);
                if projection.board.is_none() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    projector.release();
    Ok(())
}
