//! Tablero core library
//!
//! Boards, columns and cards kept in a push-notifying tree store: the
//! repositories, the order-index engine, realtime projections and CSV
//! transfer.

pub mod board;
pub mod card;
pub mod config;
pub mod decode;
pub mod drag;
pub mod error;
pub mod ids;
pub mod ordering;
pub mod paths;
pub mod sync;
pub mod transfer;

pub use config::Config;
pub use drag::{apply_drop, resolve_drop, DragOutcome, DropTarget};
pub use error::{TableroError, TableroResult};
pub use sync::{BoardList, BoardListProjector, BoardProjection, SyncProjector};
pub use transfer::ImportSummary;
