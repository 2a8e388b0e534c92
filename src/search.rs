//! Query handlers behind the search pages.
//!
//! The `search_*` functions return a finished HTML fragment in every case:
//! failures inside a handler are logged and rendered as a result message
//! instead of being passed up, so the page always has something to show.

use std::collections::{BTreeMap, HashMap};

use log::{error, info};
use serde::Serialize;

use crate::composer::Composer;
use crate::error::DataError;
use crate::html::{
    escape_html, escape_html_with_breaks, format_generic_results, hit_count, location_line,
    result_message, scene_name, score_info_block,
};
use crate::pages::parse_page_input;
use crate::spreadsheet::LibrettoRow;
use crate::store::{DataStore, SceneOption};
use crate::text::{compare_locale_de, normalize_string};

/// Most suggestions returned for a partial term
pub const MAX_SUGGESTIONS: usize = 20;

/// Shortest (trimmed) input that triggers suggestions
pub const MIN_SUGGESTION_CHARS: usize = 2;

/// Term as sent to the browser for its autocomplete list
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct ClientTerm {
    pub original: String,
    pub normalized: String,
}

fn with_score_info(store: &DataStore, opera_key: &str, results: String) -> Result<String, DataError> {
    let scores = store.score_info_map()?;
    Ok(match scores.get(opera_key) {
        Some(info) => format!("{}{}", score_info_block(info), results),
        None => results,
    })
}

/// Lines of one opera in the selected scenes
///
/// `scenes` holds scene codes (`"1-2"`); the code `all` selects the whole
/// opera. Rows without a page number are never shown.
pub fn search_by_scene(store: &DataStore, composer: Composer, opera: &str, scenes: &[String]) -> String {
    match try_search_by_scene(store, composer, opera, scenes) {
        Ok(html) => html,
        Err(e) => {
            error!("{} scene search for {} failed: {}", composer.label(), opera, e);
            result_message(&format!("エラーが発生しました: {}", e))
        }
    }
}

fn try_search_by_scene(
    store: &DataStore,
    composer: Composer,
    opera: &str,
    scenes: &[String],
) -> Result<String, DataError> {
    let opera_key = normalize_string(opera);
    let rows = store.libretto_rows(composer)?;
    let scene_map = store.scene_map(composer)?;
    let wanted: Vec<String> = scenes.iter().map(|s| s.trim().to_lowercase()).collect();
    let all = wanted.iter().any(|s| s == "all");

    let matches: Vec<&LibrettoRow> = rows
        .iter()
        .filter(|row| row.has_page())
        .filter(|row| normalize_string(&row.oper.display()) == opera_key)
        .filter(|row| all || wanted.contains(&row.scene_code()))
        .collect();

    info!(
        "{} scene search: opera={} scenes={} hits={}",
        composer.label(),
        opera,
        scenes.join(","),
        matches.len()
    );

    let results = format_generic_results(&matches, &scene_map);
    with_score_info(store, &opera_key, results)
}

/// Lines of one opera printed on the requested score pages
///
/// `page_input` uses the syntax of [`parse_page_input`]. Only rows whose page
/// cell is numeric can match.
pub fn search_by_page(store: &DataStore, composer: Composer, opera: &str, page_input: &str) -> String {
    match try_search_by_page(store, composer, opera, page_input) {
        Ok(html) => html,
        Err(e) => {
            error!("{} page search for {} failed: {}", composer.label(), opera, e);
            result_message(&format!("検索中にサーバーエラーが発生しました: {}", e))
        }
    }
}

fn try_search_by_page(
    store: &DataStore,
    composer: Composer,
    opera: &str,
    page_input: &str,
) -> Result<String, DataError> {
    let opera_key = normalize_string(opera);
    let pages = parse_page_input(page_input);
    if pages.is_empty() {
        return Ok(result_message("有効なページ番号が指定されていません。"));
    }

    let rows = store.libretto_rows(composer)?;
    let scene_map = store.scene_map(composer)?;

    let matches: Vec<&LibrettoRow> = rows
        .iter()
        .filter(|row| normalize_string(&row.oper.display()) == opera_key)
        .filter(|row| match row.page.as_number() {
            Some(n) if n.fract() == 0.0 && n >= 0.0 && n <= u32::MAX as f64 => pages.contains(&(n as u32)),
            _ => false,
        })
        .collect();

    info!(
        "{} page search: opera={} pages={} hits={}",
        composer.label(),
        opera,
        page_input,
        matches.len()
    );

    let results = format_generic_results(&matches, &scene_map);
    with_score_info(store, &opera_key, results)
}

/// Every line containing the query, grouped by German text
///
/// Matching is substring on normalized text. Groups are ordered the German
/// way; within a group rows keep sheet order and show the Japanese text with
/// opera, scene, page and speaker.
pub fn search_terms(store: &DataStore, composer: Composer, query: &str) -> String {
    match try_search_terms(store, composer, query) {
        Ok(html) => html,
        Err(e) => {
            error!("{} term search for {:?} failed: {}", composer.label(), query, e);
            result_message(&format!("検索中にエラーが発生しました: {}", e))
        }
    }
}

fn try_search_terms(store: &DataStore, composer: Composer, query: &str) -> Result<String, DataError> {
    if query.trim().is_empty() {
        return Ok(result_message("検索語句を入力してください。"));
    }

    let rows = store.libretto_rows(composer)?;
    let scene_map = store.scene_map(composer)?;
    let needle = normalize_string(query);

    let matches: Vec<&LibrettoRow> = rows
        .iter()
        .filter(|row| row.de.is_truthy() && normalize_string(&row.de.display()).contains(&needle))
        .filter(|row| row.has_page())
        .collect();

    info!("{} term search: query={:?} hits={}", composer.label(), query, matches.len());

    if matches.is_empty() {
        return Ok(result_message("該当するデータが見つかりませんでした。"));
    }

    let mut groups: HashMap<String, Vec<&LibrettoRow>> = HashMap::new();
    for &row in &matches {
        groups.entry(row.de.display()).or_default().push(row);
    }
    let mut keys: Vec<&String> = groups.keys().collect();
    keys.sort_by(|a, b| compare_locale_de(a, b));

    let mut html = hit_count(matches.len());
    for de in keys {
        html.push_str(&format!("<div class=\"result-a\">{}</div>", escape_html_with_breaks(de)));
        for row in &groups[de] {
            html.push_str(&format!(
                "<div class=\"result-c\">{}</div>",
                escape_html_with_breaks(&row.ja.display())
            ));
            let location = term_location(composer, &scene_map, row);
            if !location.is_empty() {
                html.push_str(&format!("<div class=\"result-loc\">【{}】</div>", location));
            }
        }
    }

    Ok(html)
}

fn term_location(composer: Composer, scene_map: &HashMap<String, String>, row: &LibrettoRow) -> String {
    let opera_key = normalize_string(&row.oper.display());
    let opera = match composer.display_name(&opera_key) {
        Some(name) => escape_html(name),
        None => escape_html(&row.oper.display()),
    };
    let scene = escape_html(&scene_name(scene_map, &opera_key, row));
    location_line(&[opera, scene], &row.page.display(), &row.whom.display())
}

/// Full term list for the browser's autocomplete
pub fn terms_for_client(store: &DataStore, composer: Composer) -> Result<Vec<ClientTerm>, DataError> {
    Ok(store
        .de_terms(composer)?
        .into_iter()
        .map(|term| {
            let normalized = if term.normalized.is_empty() {
                normalize_string(&term.original)
            } else {
                term.normalized
            };
            ClientTerm {
                original: term.original,
                normalized,
            }
        })
        .collect())
}

/// Terms whose normalized form starts with the normalized input
///
/// Input shorter than [`MIN_SUGGESTION_CHARS`] after trimming yields nothing.
/// At most [`MAX_SUGGESTIONS`] originals are returned, in term-list order.
pub fn search_terms_partially(store: &DataStore, composer: Composer, input: &str) -> Result<Vec<String>, DataError> {
    if input.trim().chars().count() < MIN_SUGGESTION_CHARS {
        return Ok(Vec::new());
    }

    let prefix = normalize_string(input);
    Ok(store
        .de_terms(composer)?
        .into_iter()
        .filter(|term| term.normalized.starts_with(&prefix))
        .map(|term| term.original)
        .take(MAX_SUGGESTIONS)
        .collect())
}

/// Scene choices per opera for the scene search form
pub fn scene_options_for_opera(
    store: &DataStore,
    composer: Composer,
) -> Result<BTreeMap<String, Vec<SceneOption>>, DataError> {
    store.scene_options(composer)
}
