//! Realtime projections of board state.
//!
//! A projector watches snapshot streams and, on every snapshot, throws the
//! previous projection away and derives a new one from the latest raw
//! values. Views read the result from a `watch` channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tablero_store::{subscribe, SharedStore, Subscription};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::board::{Board, Column};
use crate::card::Card;
use crate::decode;
use crate::paths;

/// Render-ready state of one board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardProjection {
    /// Number of snapshots folded in so far.
    pub revision: u64,
    /// Set once both the board and its cards have been received.
    pub loaded: bool,
    pub board: Option<Board>,
    /// Cards per column id, ascending by `order`, ties in key order.
    pub cards_by_column: BTreeMap<String, Vec<Card>>,
}

impl BoardProjection {
    /// Derive a projection from raw snapshot values.
    pub fn build(
        board_id: &str,
        revision: u64,
        loaded: bool,
        board: Option<Value>,
        cards: Option<Value>,
    ) -> Self {
        Self {
            revision,
            loaded,
            board: project_board(board, board_id),
            cards_by_column: project_cards(cards, board_id),
        }
    }

    /// Columns in display order.
    pub fn columns(&self) -> Vec<&Column> {
        self.board
            .as_ref()
            .map(|b| b.sorted_columns())
            .unwrap_or_default()
    }

    /// Cards of a column in display order.
    pub fn cards(&self, column_id: &str) -> &[Card] {
        self.cards_by_column
            .get(column_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cards on the board across all columns.
    pub fn card_count(&self) -> usize {
        self.cards_by_column.values().map(Vec::len).sum()
    }

    /// Column id and position of a card.
    pub fn locate_card(&self, card_id: &str) -> Option<(&str, usize)> {
        self.cards_by_column.iter().find_map(|(column_id, cards)| {
            cards
                .iter()
                .position(|c| c.id == card_id)
                .map(|index| (column_id.as_str(), index))
        })
    }
}

/// Decode a board snapshot. A malformed board projects as absent.
pub fn project_board(value: Option<Value>, board_id: &str) -> Option<Board> {
    let value = value?;
    match serde_json::from_value::<Board>(value) {
        Ok(board) => Some(board),
        Err(e) => {
            warn!(board_id = %board_id, error = %e, "Board snapshot could not be decoded");
            None
        }
    }
}

/// Decode a `cards/<boardId>` snapshot into ordered per-column lists.
pub fn project_cards(value: Option<Value>, board_id: &str) -> BTreeMap<String, Vec<Card>> {
    let Some(Value::Object(columns)) = value else {
        return BTreeMap::new();
    };
    columns
        .into_iter()
        .map(|(column_id, cards)| {
            let path = paths::column_cards(board_id, &column_id);
            let cards = sort_cards(decode::children(Some(cards), &path));
            (column_id, cards)
        })
        .collect()
}

/// Order cards by `order`. Input must be in key order; the sort is stable,
/// so key order breaks ties.
pub fn sort_cards(keyed: Vec<(String, Card)>) -> Vec<Card> {
    let mut cards: Vec<Card> = keyed.into_iter().map(|(_, card)| card).collect();
    cards.sort_by_key(|c| c.order);
    cards
}

/// Keeps a [`BoardProjection`] in step with the store.
pub struct SyncProjector {
    board_id: String,
    rx: watch::Receiver<Arc<BoardProjection>>,
    task: JoinHandle<()>,
}

impl SyncProjector {
    /// Subscribe to a board and its cards and start projecting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(store: SharedStore, board_id: &str) -> Self {
        let board_sub = subscribe(store.clone(), &paths::board(board_id));
        let cards_sub = subscribe(store, &paths::board_cards(board_id));
        let (tx, rx) = watch::channel(Arc::new(BoardProjection::default()));
        let task = tokio::spawn(project_board_streams(
            board_id.to_string(),
            board_sub,
            cards_sub,
            tx,
        ));
        debug!(board_id = %board_id, "Projector started");
        Self {
            board_id: board_id.to_string(),
            rx,
            task,
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// Latest projection.
    pub fn current(&self) -> Arc<BoardProjection> {
        self.rx.borrow().clone()
    }

    /// A receiver notified on every rebuild.
    pub fn updates(&self) -> watch::Receiver<Arc<BoardProjection>> {
        self.rx.clone()
    }

    /// Stop projecting and release both subscriptions.
    pub fn release(self) {
        debug!(board_id = %self.board_id, "Projector released");
    }
}

impl Drop for SyncProjector {
    fn drop(&mut self) {
        // Dropping the task drops the subscriptions it owns.
        self.task.abort();
    }
}

async fn project_board_streams(
    board_id: String,
    mut board_sub: Subscription,
    mut cards_sub: Subscription,
    tx: watch::Sender<Arc<BoardProjection>>,
) {
    let mut board_raw: Option<Value> = None;
    let mut cards_raw: Option<Value> = None;
    let mut board_seen = false;
    let mut cards_seen = false;
    let mut revision = 0u64;

    loop {
        tokio::select! {
            snapshot = board_sub.next() => match snapshot {
                Some(s) => {
                    board_raw = s.value;
                    board_seen = true;
                }
                None => break,
            },
            snapshot = cards_sub.next() => match snapshot {
                Some(s) => {
                    cards_raw = s.value;
                    cards_seen = true;
                }
                None => break,
            },
        }

        revision += 1;
        let projection = BoardProjection::build(
            &board_id,
            revision,
            board_seen && cards_seen,
            board_raw.clone(),
            cards_raw.clone(),
        );
        debug!(
            board_id = %board_id,
            revision,
            cards = projection.card_count(),
            "Projection rebuilt"
        );
        if tx.send(Arc::new(projection)).is_err() {
            break;
        }
    }
    debug!(board_id = %board_id, "Projector stopped");
}

/// Every board in the store, for board pickers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardList {
    pub revision: u64,
    pub boards: Vec<Board>,
}

/// Keeps a [`BoardList`] in step with the store.
pub struct BoardListProjector {
    rx: watch::Receiver<Arc<BoardList>>,
    task: JoinHandle<()>,
}

impl BoardListProjector {
    pub fn start(store: SharedStore) -> Self {
        let mut sub = subscribe(store, paths::BOARDS);
        let (tx, rx) = watch::channel(Arc::new(BoardList::default()));
        let task = tokio::spawn(async move {
            let mut revision = 0u64;
            while let Some(snapshot) = sub.next().await {
                revision += 1;
                let boards = decode::children::<Board>(snapshot.value, paths::BOARDS)
                    .into_iter()
                    .map(|(_, board)| board)
                    .collect();
                if tx.send(Arc::new(BoardList { revision, boards })).is_err() {
                    break;
                }
            }
        });
        Self { rx, task }
    }

    pub fn current(&self) -> Arc<BoardList> {
        self.rx.borrow().clone()
    }

    pub fn updates(&self) -> watch::Receiver<Arc<BoardList>> {
        self.rx.clone()
    }

    pub fn release(self) {}
}

impl Drop for BoardListProjector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{self, NewBoard, NewColumn};
    use crate::card::{self, NewCard};
    use crate::ordering;
    use serde_json::json;
    use std::time::Duration;
    use tablero_store::MemoryStore;

    async fn wait_for<T>(
        rx: &mut watch::Receiver<Arc<T>>,
        pred: impl FnMut(&Arc<T>) -> bool,
    ) -> Arc<T> {
        let value = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("projection did not update in time")
            .expect("projector stopped");
        value.clone()
    }

    #[test]
    fn test_cards_sorted_by_order_then_key() {
        let value = json!({
            "col_0": {
                "k3": {"id": "k3", "title": "c", "order": 1},
                "k1": {"id": "k1", "title": "a", "order": 1},
                "k2": {"id": "k2", "title": "b", "order": 0}
            },
            "col_1": {
                "k9": {"id": "k9", "title": "z"}
            }
        });
        let projected = project_cards(Some(value), "b1");
        let ids: Vec<&str> = projected["col_0"].iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["k2", "k1", "k3"]);
        assert_eq!(projected["col_1"][0].order, 0);
    }

    #[test]
    fn test_projection_queries() {
        let projection = BoardProjection::build(
            "b1",
            1,
            true,
            Some(json!({
                "id": "b1",
                "title": "Plan",
                "columns": [
                    {"id": "col_1", "name": "Done", "order": 1},
                    {"id": "col_0", "name": "Todo", "order": 0}
                ]
            })),
            Some(json!({
                "col_1": {
                    "x": {"id": "x", "title": "X", "order": 0},
                    "y": {"id": "y", "title": "Y", "order": 1}
                }
            })),
        );
        let names: Vec<&str> = projection.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Todo", "Done"]);
        assert_eq!(projection.card_count(), 2);
        assert!(projection.cards("col_0").is_empty());
        assert_eq!(projection.locate_card("y"), Some(("col_1", 1)));
        assert_eq!(projection.locate_card("q"), None);
    }

    #[test]
    fn test_malformed_board_projects_as_absent() {
        assert!(project_board(Some(json!({"title": 3})), "b1").is_none());
        assert!(project_board(None, "b1").is_none());
    }

    #[tokio::test]
    async fn test_projector_follows_writes() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let board = board::create_board(
            &store,
            NewBoard {
                title: "Plan".into(),
                columns: vec![NewColumn::new("A"), NewColumn::new("B")],
                properties: Vec::new(),
            },
        )
        .await
        .unwrap();

        let projector = SyncProjector::start(store.clone(), &board.id);
        let mut rx = projector.updates();
        let first = wait_for(&mut rx, |p| p.loaded).await;
        assert_eq!(first.board.as_ref().unwrap().title, "Plan");
        assert_eq!(first.card_count(), 0);

        let a = card::create_card(&store, &board.id, "col_0", NewCard::new("a", ""))
            .await
            .unwrap();
        card::create_card(&store, &board.id, "col_1", NewCard::new("b0", ""))
            .await
            .unwrap();
        let seen = wait_for(&mut rx, |p| p.card_count() == 2).await;
        assert_eq!(seen.cards("col_0")[0].id, a.id);

        ordering::move_across_columns(&store, &board.id, &a.id, "col_0", "col_1", 0)
            .await
            .unwrap();
        let moved = wait_for(&mut rx, |p| {
            p.cards("col_0").is_empty()
                && p.cards("col_1").len() == 2
                && p.cards("col_1")[1].order == 1
        })
        .await;
        let titles: Vec<&str> = moved.cards("col_1").iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b0"]);

        projector.release();
    }

    #[tokio::test]
    async fn test_projector_sees_board_deletion() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let board = board::create_board(
            &store,
            NewBoard {
                title: "Plan".into(),
                columns: vec![NewColumn::new("A")],
                properties: Vec::new(),
            },
        )
        .await
        .unwrap();
        let projector = SyncProjector::start(store.clone(), &board.id);
        let mut rx = projector.updates();
        wait_for(&mut rx, |p| p.loaded && p.board.is_some()).await;

        board::delete_board(&store, &board.id).await.unwrap();
        let gone = wait_for(&mut rx, |p| p.board.is_none()).await;
        assert!(gone.cards_by_column.is_empty());
    }

    #[tokio::test]
    async fn test_released_projector_stops_updating() {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let projector = SyncProjector::start(store.clone(), "b1");
        let mut rx = projector.updates();
        wait_for(&mut rx, |p| p.loaded).await;
        projector.release();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(memory.subscriber_count(), 0);
        store.put("boards/b1", json!({"id": "b1", "title": "Late"})).await.unwrap();
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_board_list_projector() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let projector = BoardListProjector::start(store.clone());
        let mut rx = projector.updates();
        wait_for(&mut rx, |l| l.revision >= 1).await;

        board::create_board(
            &store,
            NewBoard {
                title: "Plan".into(),
                columns: vec![NewColumn::new("A")],
                properties: Vec::new(),
            },
        )
        .await
        .unwrap();
        let list = wait_for(&mut rx, |l| l.boards.len() == 1).await;
        assert_eq!(list.boards[0].title, "Plan");
    }
}
