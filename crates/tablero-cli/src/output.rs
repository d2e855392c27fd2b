//! Terminal output formatting.

use colored::{Color, ColoredString, Colorize};
use tablero_core::board::{Board, Column, ColumnColor};
use tablero_core::card::Card;
use tablero_core::{BoardProjection, TableroError};
use unicode_width::UnicodeWidthStr;

/// Message shown for a failed command.
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<TableroError>() {
        Some(e) => e.user_message(),
        None => format!("{:#}", err),
    }
}

/// Print a success line.
pub fn success(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green().bold(), message);
}

fn terminal_color(color: ColumnColor) -> Color {
    match color {
        ColumnColor::Blue => Color::Blue,
        ColumnColor::Green => Color::Green,
        ColumnColor::Red => Color::Red,
        ColumnColor::Yellow => Color::Yellow,
        ColumnColor::Purple | ColumnColor::Violet => Color::Magenta,
        ColumnColor::Pink | ColumnColor::Fuchsia => Color::BrightMagenta,
        ColumnColor::Indigo => Color::BrightBlue,
        ColumnColor::Gray => Color::BrightBlack,
        ColumnColor::Orange | ColumnColor::Amber => Color::BrightYellow,
        ColumnColor::Teal | ColumnColor::Cyan => Color::Cyan,
        ColumnColor::Lime => Color::BrightGreen,
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Print boards as a table.
pub fn print_boards_table(boards: &[Board]) {
    if boards.is_empty() {
        println!(
            "{}",
            "No boards found. Create one with 'tablero board create <title> -c <column>'.".dimmed()
        );
        return;
    }

    println!("{:<36}  {:<30} {:>7}", "ID", "Title", "Columns");
    println!("{}", "─".repeat(76));
    for board in boards {
        println!(
            "{:<36}  {} {:>7}",
            board.id.dimmed(),
            pad_right(&truncate_visual(&board.title, 30), 30),
            board.columns.len()
        );
    }
    println!();
    println!("{} board(s) total", boards.len());
}

/// Print a board's columns with ids, colors and card counts.
pub fn print_columns(projection: &BoardProjection) {
    for column in projection.columns() {
        println!(
            "  {} {:<20} {} {}",
            "●".color(terminal_color(column.color)),
            column.name,
            format!("{} card(s)", projection.cards(&column.id).len()).dimmed(),
            format!("[{} · {}]", column.id, column.color.as_str()).dimmed()
        );
    }
}

/// Print a single card.
pub fn print_card(card: &Card, column: &Column) {
    println!("{} {}", card.title.cyan().bold(), format!("({})", card.id).dimmed());
    println!(
        "{}: {}",
        "Column".bold(),
        column.name.as_str().color(terminal_color(column.color))
    );
    println!("{}: {}", "Order".bold(), card.order);
    if !card.content.is_empty() {
        println!();
        println!("{}", card.content);
    }
}

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

fn column_header_plain(column: &Column, count: usize, max_width: usize) -> String {
    let suffix = format!(" {}", count);
    let suffix_width = UnicodeWidthStr::width(suffix.as_str());
    let name_budget = max_width.saturating_sub(suffix_width).max(1);
    let full = format!("{}{}", truncate_visual(&column.name.to_uppercase(), name_budget), suffix);
    truncate_visual(&full, max_width)
}

fn column_header_colored(column: &Column, count: usize, max_width: usize) -> ColoredString {
    column_header_plain(column, count, max_width)
        .color(terminal_color(column.color))
        .bold()
}

/// Print the board, side by side when the terminal is wide enough.
pub fn print_board(projection: &BoardProjection) {
    let Some(board) = &projection.board else {
        println!("{}", "The board no longer exists.".dimmed());
        return;
    };

    println!("{} {}", board.title.cyan().bold(), format!("({})", board.id).dimmed());
    let columns = projection.columns();
    let width = term_width();
    if width < 60 || columns.len() * 13 + 1 > width {
        print_board_compact(projection, &columns);
    } else {
        print_board_wide(projection, &columns, width);
    }

    println!(
        " {} {} cards {} {} columns",
        "■".cyan(),
        projection.card_count().to_string().bold(),
        "·".dimmed(),
        columns.len()
    );
}

/// Columns side by side.
fn print_board_wide(projection: &BoardProjection, columns: &[&Column], term_w: usize) {
    let num_cols = columns.len().max(1);
    let available = term_w.saturating_sub(num_cols + 1);
    let col_width = (available / num_cols).clamp(12, 35);

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = columns.iter().map(|_| "─".repeat(col_width)).collect();
        println!("{}", format!("{}{}{}", left, segments.join(mid), right).dimmed());
    };

    // ── Header ──
    rule("┌", "┬", "┐");
    print!("{}", "│".dimmed());
    for (i, column) in columns.iter().enumerate() {
        let count = projection.cards(&column.id).len();
        let header_plain = column_header_plain(column, count, col_width);
        let padding = col_width.saturating_sub(UnicodeWidthStr::width(header_plain.as_str()));
        let left_pad = padding / 2;
        print!(
            "{}{}{}",
            " ".repeat(left_pad),
            column_header_colored(column, count, col_width),
            " ".repeat(padding - left_pad)
        );
        if i < columns.len() - 1 {
            print!("{}", "│".dimmed());
        }
    }
    println!("{}", "│".dimmed());
    rule("├", "┼", "┤");

    // ── Card rows ──
    let max_cards = columns
        .iter()
        .map(|c| projection.cards(&c.id).len())
        .max()
        .unwrap_or(0);
    let title_width = col_width.saturating_sub(2).max(1);
    for row in 0..max_cards {
        print!("{}", "│".dimmed());
        for (i, column) in columns.iter().enumerate() {
            match projection.cards(&column.id).get(row) {
                Some(card) => {
                    let title = pad_right(&truncate_visual(&card.title, title_width), title_width);
                    print!("{} {}", "·".color(terminal_color(column.color)), title);
                }
                None => print!("{}", " ".repeat(col_width)),
            }
            if i < columns.len() - 1 {
                print!("{}", "│".dimmed());
            }
        }
        println!("{}", "│".dimmed());
    }

    // ── Footer ──
    rule("└", "┴", "┘");
}

/// Vertical layout for narrow terminals.
fn print_board_compact(projection: &BoardProjection, columns: &[&Column]) {
    println!();
    for column in columns {
        let cards = projection.cards(&column.id);
        println!(" {} {}", "▸".dimmed(), column_header_colored(column, cards.len(), 30));
        for card in cards {
            println!("   {} {}", card.title, short_id(&card.id).dimmed());
        }
        println!();
    }
}
