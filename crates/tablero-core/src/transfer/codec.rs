//! CSV text encoding and decoding.

use crate::board::Board;
use crate::card::Card;
use crate::error::{TableroError, TableroResult};

/// Byte-order mark written ahead of every export.
pub const BOM: char = '\u{feff}';

pub const TITLE_HEADER: &str = "Título";
pub const CONTENT_HEADER: &str = "Contenido";
pub const COLUMN_HEADER: &str = "Columna";

pub const HEADER: &str = "Título,Contenido,Columna";

const TEMPLATE_TITLE: &str = "Ejemplo de tarjeta";
const TEMPLATE_CONTENT: &str = "Descripción de la tarjeta";

/// A data row read from an import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub title: String,
    pub content: String,
    pub column: String,
}

/// Quote a field, doubling embedded quotes.
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row(title: &str, content: &str, column: &str) -> String {
    [quote(title), quote(content), quote(column)].join(",")
}

fn document(rows: Vec<String>) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(HEADER.to_string());
    lines.extend(rows);
    format!("{}{}", BOM, lines.join("\n"))
}

/// Every card of a board, columns by `order` and cards by `order`.
pub fn export_cards<'a>(board: &Board, cards_of: impl Fn(&str) -> &'a [Card]) -> String {
    let mut rows = Vec::new();
    for column in board.sorted_columns() {
        let mut cards: Vec<&Card> = cards_of(&column.id).iter().collect();
        cards.sort_by_key(|c| c.order);
        rows.extend(
            cards
                .into_iter()
                .map(|card| row(&card.title, &card.content, &column.name)),
        );
    }
    document(rows)
}

/// A fill-in template with one example row per column.
pub fn export_template(board: &Board) -> String {
    let rows = board
        .sorted_columns()
        .into_iter()
        .map(|column| row(TEMPLATE_TITLE, TEMPLATE_CONTENT, &column.name))
        .collect();
    document(rows)
}

/// `<title>_<YYYY-MM-DD>.csv`, with anything but ASCII letters and digits
/// in the title replaced by `_`.
pub fn export_filename(title: &str, date: chrono::NaiveDate) -> String {
    let safe: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}.csv", safe, date.format("%Y-%m-%d"))
}

/// Split CSV text into records of fields.
///
/// Quoted fields may contain commas, doubled quotes and line breaks.
/// Records end at `\n`, `\r\n` or a lone `\r`.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

fn is_blank(record: &[String]) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// Parse an import file into data rows.
///
/// The header must name all three fields in any order. Short rows are
/// dropped and extra fields ignored.
pub fn parse_import(text: &str) -> TableroResult<Vec<ImportRow>> {
    let mut records = parse_records(text)
        .into_iter()
        .filter(|r| !is_blank(r));

    let header = records
        .next()
        .ok_or_else(|| TableroError::parse("The CSV file is empty."))?;
    let position = |name: &str| header.iter().position(|h| h.trim() == name);
    let (Some(title), Some(content), Some(column)) = (
        position(TITLE_HEADER),
        position(CONTENT_HEADER),
        position(COLUMN_HEADER),
    ) else {
        return Err(TableroError::parse(format!(
            "The CSV header must contain {}.",
            HEADER
        )));
    };

    Ok(records
        .filter(|r| r.len() >= 3)
        .filter_map(|r| {
            Some(ImportRow {
                title: r.get(title)?.clone(),
                content: r.get(content)?.clone(),
                column: r.get(column)?.clone(),
            })
        })
        .collect())
}
