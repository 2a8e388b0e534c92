//! HTML fragment rendering
//!
//! Every handler answers with a fragment the page drops straight into its
//! results panel, so all sheet text goes through [`escape_html`] here.

use std::collections::HashMap;

use crate::spreadsheet::LibrettoRow;
use crate::text::normalize_string;

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape, then turn CRLF / CR / LF line breaks into `<br>`.
pub fn escape_html_with_breaks(text: &str) -> String {
    escape_html(text)
        .replace("\r\n", "<br>")
        .replace(['\r', '\n'], "<br>")
}

/// `<p class="result-message">…</p>` with the message escaped
pub fn result_message(text: &str) -> String {
    format!("<p class=\"result-message\">{}</p>", escape_html(text))
}

/// Score edition banner shown above scene and page results
pub fn score_info_block(info: &str) -> String {
    format!("<div class=\"score-info\">楽譜情報: {}</div>", escape_html(info))
}

/// Header line with the number of matching rows
pub fn hit_count(count: usize) -> String {
    format!("<div>{}件該当しました。</div>", count)
}

/// Scene name for a row, falling back to `場面(act-scene)`.
pub fn scene_name(scene_map: &HashMap<String, String>, opera_key: &str, row: &LibrettoRow) -> String {
    let key = format!("{}-{}", opera_key, row.scene_code());
    match scene_map.get(&key) {
        Some(name) => name.clone(),
        None => format!("場面({})", row.scene_code()),
    }
}

/// Render rows of one opera in sheet order
///
/// A `result-scene` heading is emitted each time the scene code changes; each
/// row shows the German line, its Japanese translation and a location line
/// with page and speaker.
pub fn format_generic_results(rows: &[&LibrettoRow], scene_map: &HashMap<String, String>) -> String {
    if rows.is_empty() {
        return result_message("該当するデータが見つかりませんでした。");
    }

    let mut html = hit_count(rows.len());
    let mut current_scene: Option<String> = None;

    for row in rows {
        let opera_key = normalize_string(&row.oper.display());
        let scene_key = format!("{}-{}", opera_key, row.scene_code());
        if current_scene.as_deref() != Some(scene_key.as_str()) {
            html.push_str(&format!(
                "<div class=\"result-scene\">{}</div>",
                escape_html(&scene_name(scene_map, &opera_key, row))
            ));
            current_scene = Some(scene_key);
        }

        html.push_str(&format!(
            "<div class=\"result-a\">{}</div>",
            escape_html_with_breaks(&row.de.display())
        ));
        html.push_str(&format!(
            "<div class=\"result-c\">{}</div>",
            escape_html_with_breaks(&row.ja.display())
        ));

        let location = location_line(&[], &row.page.display(), &row.whom.display());
        if !location.is_empty() {
            html.push_str(&format!("<div class=\"result-loc\">【{}】</div>", location));
        }
    }

    html
}

/// Join location parts: `"{parts…} p.{page}：{speaker}"`, escaped.
///
/// `parts` are already-escaped leading labels (opera, scene).
pub fn location_line(parts: &[String], page: &str, speaker: &str) -> String {
    let mut pieces: Vec<String> = parts.iter().filter(|p| !p.is_empty()).cloned().collect();
    let page = page.trim();
    if !page.is_empty() {
        pieces.push(format!("p.{}", escape_html(page)));
    }

    let mut line = pieces.join(" ").trim().to_string();
    let speaker = speaker.trim();
    if !speaker.is_empty() {
        line = format!("{}：{}", line, escape_html(speaker));
    }
    line
}
