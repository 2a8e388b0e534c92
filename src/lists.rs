//! Reference lists: abbreviations, non-Mahler German, glossary and
//! translation notes.
//!
//! The `*_data` functions hand back raw rows for clients that render them
//! themselves; the `render_*` functions produce the same page markup on the
//! server, sorted and anchored by initial letter.

use std::collections::HashSet;

use crate::error::DataError;
use crate::html::{escape_html, result_message};
use crate::store::DataStore;
use crate::text::{SORT_ALPHABET, compare_german, sort_letter};

pub const ABBR_SHEET: &str = "略記一覧";
pub const LIST_SHEET: &str = "マーラー以外のドイツ語";
pub const DIC_SHEET: &str = "Notes";
pub const NOTES_SHEET: &str = "訳出についての覚書";

/// Abbreviation rows `[number or blank, short, long]`, unfiltered.
pub fn abbr_list_data(store: &DataStore) -> Result<Vec<Vec<String>>, DataError> {
    store.list_rows(ABBR_SHEET, 3, false)
}

/// `[german, translation, source]` rows of the non-Mahler German list.
pub fn list_data(store: &DataStore) -> Result<Vec<Vec<String>>, DataError> {
    store.list_rows(LIST_SHEET, 3, true)
}

/// `[german, translation, source]` rows of the glossary.
pub fn dic_data(store: &DataStore) -> Result<Vec<Vec<String>>, DataError> {
    store.list_rows(DIC_SHEET, 3, true)
}

/// `[german, note]` rows of the translation notes.
pub fn notes_data(store: &DataStore) -> Result<Vec<Vec<String>>, DataError> {
    store.list_rows(NOTES_SHEET, 2, true)
}

fn cell(row: &[String], i: usize) -> &str {
    row.get(i).map(String::as_str).unwrap_or("")
}

fn sorted(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    rows.sort_by(|a, b| compare_german(cell(a, 0), cell(b, 0)));
    rows
}

/// `id="letter-X"` for the first row of each letter, empty otherwise.
fn anchor(german: &str, seen: &mut HashSet<char>) -> String {
    match sort_letter(german) {
        Some(letter) if SORT_ALPHABET.contains(&letter) && seen.insert(letter) => {
            format!(" id=\"letter-{}\"", letter)
        }
        _ => String::new(),
    }
}

/// German list / glossary markup, sorted by German headword.
pub fn render_list(rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "<div id=\"loadingMessage\">データが存在しません。</div>".to_string();
    }

    let mut seen = HashSet::new();
    let mut html = String::new();
    for row in sorted(rows) {
        let german = cell(&row, 0);
        html.push_str(&format!(
            "<div class=\"row\"{}><div><span class=\"german\">{}</span><span class=\"source\">{}</span></div><div class=\"translation\">{}</div></div>",
            anchor(german, &mut seen),
            escape_html(german),
            escape_html(cell(&row, 2)),
            escape_html(cell(&row, 1)),
        ));
    }
    html
}

/// Translation notes markup, sorted by German headword.
pub fn render_notes(rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "<div class=\"result-message\">データが存在しません。</div>".to_string();
    }

    let mut seen = HashSet::new();
    let mut html = String::new();
    for row in sorted(rows) {
        let german = cell(&row, 0);
        html.push_str(&format!(
            "<div class=\"row\"{}><div class=\"german\">{}</div><div class=\"translation\">{}</div></div>",
            anchor(german, &mut seen),
            escape_html(german),
            escape_html(cell(&row, 1)),
        ));
    }
    html
}

/// Abbreviation list markup, in sheet order
///
/// A row whose first column starts with an integer opens a new section titled
/// by its second column; other rows are short/long pairs.
pub fn render_abbr_list(rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "<p>（略記一覧のデータが存在しませんでした）</p>".to_string();
    }

    let mut html = String::new();
    for row in &rows {
        if starts_with_integer(cell(row, 0)) {
            html.push_str(&format!("<div class=\"abbr-title\">{}</div>", escape_html(cell(row, 1))));
        } else {
            html.push_str(&format!(
                "<div class=\"abbr-row\"><span class=\"abbr-short\">{}</span><span class=\"abbr-long\">{}</span></div>",
                escape_html(cell(row, 1)),
                escape_html(cell(row, 2)),
            ));
        }
    }
    html
}

/// Leading whitespace, optional sign, then at least one ASCII digit.
fn starts_with_integer(text: &str) -> bool {
    let t = text.trim_start();
    let t = t.strip_prefix(['+', '-']).unwrap_or(t);
    t.starts_with(|c: char| c.is_ascii_digit())
}

/// Render a list sheet, turning a load failure into a message fragment.
pub fn render_or_message(result: Result<Vec<Vec<String>>, DataError>, render: fn(Vec<Vec<String>>) -> String) -> String {
    match result {
        Ok(rows) => render(rows),
        Err(e) => {
            log::warn!("List rendering failed: {}", e);
            result_message(&format!("データの取得に失敗しました。{}", e))
        }
    }
}
