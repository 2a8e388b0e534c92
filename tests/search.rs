mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use libretto::search::{
    scene_options_for_opera, search_by_page, search_by_scene, search_terms,
    search_terms_partially, terms_for_client,
};
use libretto::{Composer, DataStore, MemorySource};

fn scenes(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|s| s.to_string()).collect()
}

#[test]
fn scene_search_shows_selected_scene_with_score_info() {
    let store = common::store();
    let html = search_by_scene(&store, Composer::Strauss, "salome", &scenes(&["1-1"]));

    assert!(html.starts_with("<div class=\"score-info\">楽譜情報: Boosey &amp; Hawkes</div>"));
    assert!(html.contains("2件該当しました。"));
    assert!(html.contains("<div class=\"result-scene\">第1場</div>"));
    assert!(html.contains("Sieh die Mond!"));
    assert!(html.contains("【p.5：Narraboth】"));
    assert!(!html.contains("Ich will nicht bleiben."));
}

#[test]
fn all_scenes_skip_rows_without_page() {
    let store = common::store();
    let html = search_by_scene(&store, Composer::Strauss, "Salome", &scenes(&["all"]));

    assert!(html.contains("3件該当しました。"));
    assert_eq!(html.matches("class=\"result-scene\"").count(), 2);
    assert!(!html.contains("Ohne Seite"));
    assert!(!html.contains("Allein!"));
}

#[test]
fn scene_search_without_hits() {
    let store = common::store();
    let html = search_by_scene(&store, Composer::Strauss, "Elektra", &scenes(&["2-1"]));
    assert!(html.contains("該当するデータが見つかりませんでした。"));
    assert!(!html.contains("score-info"));
}

#[test]
fn page_search_accepts_ranges_and_lists() {
    let store = common::store();
    let html = search_by_page(&store, Composer::Strauss, "Salome", "5-6、12");
    assert!(html.contains("3件該当しました。"));

    let html = search_by_page(&store, Composer::Strauss, "Salome", "６");
    assert!(html.contains("1件該当しました。"));
    assert!(html.contains("Sieh die Mond!"));
}

#[test]
fn page_search_rejects_input_without_pages() {
    let store = common::store();
    let html = search_by_page(&store, Composer::Strauss, "Salome", "abc");
    assert_eq!(
        html,
        "<p class=\"result-message\">有効なページ番号が指定されていません。</p>"
    );
}

#[test]
fn term_search_groups_by_german_line_in_german_order() {
    let store = common::store();
    let html = search_terms(&store, Composer::Strauss, "IE");

    assert!(html.contains("2件該当しました。"));
    let sieh = html.find("Sieh die Mond!").unwrap();
    let wie = html.find("Wie schön").unwrap();
    assert!(sieh < wie);
}

#[test]
fn term_search_ignores_diacritics_and_shows_location() {
    let store = common::store();
    let html = search_terms(&store, Composer::Strauss, "schön");
    assert!(html.contains("1件該当しました。"));
    assert!(html.contains("【Salome 第1場 p.5：Narraboth】"));

    let html = search_terms(&store, Composer::Strauss, "allein");
    assert!(html.contains("【Elektra 第1場 p.3：Elektra】"));
}

#[test]
fn term_search_needs_a_query() {
    let store = common::store();
    let html = search_terms(&store, Composer::Strauss, "   ");
    assert!(html.contains("検索語句を入力してください。"));
}

#[test]
fn missing_libretto_sheet_becomes_a_message() {
    let store = common::store();
    let html = search_by_scene(&store, Composer::Wagner, "Parsifal", &scenes(&["1-1"]));
    assert_eq!(
        html,
        "<p class=\"result-message\">エラーが発生しました: シート「RW」が見つかりません。</p>"
    );

    let html = search_terms(&store, Composer::Wagner, "Gral");
    assert!(html.contains("検索中にエラーが発生しました"));
}

#[test]
fn missing_header_is_reported_by_name() {
    let sheet = libretto::Sheet::from_strings(
        "RS",
        &[vec!["oper", "aufzug", "szene"], vec!["Salome", "1", "1"]],
    );
    let store = DataStore::new(
        Box::new(MemorySource::new().with_sheet(sheet)),
        Duration::from_secs(60),
    );
    let html = search_terms(&store, Composer::Strauss, "salome");
    assert!(html.contains("必要なヘッダー「page」がありません。"));
}

#[test]
fn suggestions_need_two_characters_and_match_prefixes() {
    let store = common::store();
    assert!(search_terms_partially(&store, Composer::Strauss, "s").unwrap().is_empty());
    assert_eq!(
        search_terms_partially(&store, Composer::Strauss, "SI").unwrap(),
        vec!["Sieh die Mond!".to_string()]
    );
    assert!(search_terms_partially(&store, Composer::Strauss, "zz").unwrap().is_empty());
}

#[test]
fn client_terms_are_distinct_and_normalized() {
    let store = common::store();
    let terms = terms_for_client(&store, Composer::Strauss).unwrap();
    assert_eq!(terms.len(), 5);
    assert_eq!(terms[0].original, "Wie schön ist die Prinzessin Salome heute Nacht!");
    assert_eq!(terms[0].normalized, "wie schon ist die prinzessin salome heute nacht!");
}

#[test]
fn scene_options_follow_structure_sheet() {
    let store = common::store();
    let options = scene_options_for_opera(&store, Composer::Strauss).unwrap();
    let salome = &options["salome"];
    assert_eq!(salome.len(), 2);
    assert_eq!(salome[0].code, "1-1");
    assert_eq!(salome[1].label, "第2場");

    // No structure sheet for Mahler: nothing to choose, but no error either.
    assert!(scene_options_for_opera(&store, Composer::Mahler).unwrap().is_empty());
}

#[test]
fn repeated_searches_are_served_from_cache() {
    let (source, reads) = common::CountingSource::new(common::workbook());
    let store = DataStore::new(Box::new(source), Duration::from_secs(600));

    search_terms(&store, Composer::Strauss, "mond");
    search_by_page(&store, Composer::Strauss, "Salome", "5");
    search_terms_partially(&store, Composer::Strauss, "wie").unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert!(store.cache().stats().0 > 0);

    store.invalidate(Composer::Strauss);
    search_terms(&store, Composer::Strauss, "mond");
    assert_eq!(reads.load(Ordering::SeqCst), 2);
}

#[test]
fn page_input_selecting_too_many_pages_is_rejected() {
    let store = common::store();
    let input: Vec<String> = (0..20u32)
        .map(|i| format!("{}-{}", i * 2001, i * 2001 + 2000))
        .collect();
    let html = search_by_page(&store, Composer::Strauss, "Salome", &input.join(","));
    assert!(html.contains("有効なページ番号が指定されていません。"));
}
