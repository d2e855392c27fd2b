//! Store layout.
//!
//! ```text
//! boards/<boardId>
//! cards/<boardId>/<columnId>/<cardId>
//! ```

pub const BOARDS: &str = "boards";

pub fn board(board_id: &str) -> String {
    format!("{}/{}", BOARDS, board_id)
}

pub fn board_cards(board_id: &str) -> String {
    format!("cards/{}", board_id)
}

pub fn column_cards(board_id: &str, column_id: &str) -> String {
    format!("cards/{}/{}", board_id, column_id)
}

pub fn card(board_id: &str, column_id: &str, card_id: &str) -> String {
    format!("cards/{}/{}/{}", board_id, column_id, card_id)
}
