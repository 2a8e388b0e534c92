use std::fs;
use std::time::Duration;

use libretto::search::{search_by_scene, search_terms};
use libretto::{Composer, DataStore, LoadError, open_source};
use tempfile::tempdir;

const RS_CSV: &str = "\u{feff}oper,aufzug,szene,page,whom,de,ja,de_normalized\n\
Salome,1,1,5,Narraboth,\"Wie schön, wie schön\",\"今宵のサロメ\n王女\",\"wie schon, wie schon\"\n\
Salome,1,1,6,Page,\"Sieh \"\"die\"\" Mond!\",月を見よ！,\"sieh \"\"die\"\" mond!\"\n";

#[test]
fn csv_directory_is_searchable() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("RS.csv"), RS_CSV).unwrap();
    fs::write(
        dir.path().join("RS幕構成.csv"),
        "oper,aufzug,szene,name\nSalome,1,1,第1場\n",
    )
    .unwrap();

    let store = DataStore::new(open_source(dir.path()).unwrap(), Duration::from_secs(60));

    let html = search_by_scene(&store, Composer::Strauss, "Salome", &["1-1".to_string()]);
    assert!(html.contains("2件該当しました。"));
    assert!(html.contains("<div class=\"result-scene\">第1場</div>"));
    assert!(html.contains("今宵のサロメ<br>王女"));
    assert!(html.contains("Sieh &quot;die&quot; Mond!"));

    let html = search_terms(&store, Composer::Strauss, "wie schon,");
    assert!(html.contains("Wie schön, wie schön"));
}

#[test]
fn missing_csv_sheet_is_not_found() {
    let dir = tempdir().unwrap();
    let store = DataStore::new(open_source(dir.path()).unwrap(), Duration::from_secs(60));
    let html = search_terms(&store, Composer::Mahler, "Welt");
    assert!(html.contains("シート「GM」が見つかりません。"));
}

#[test]
fn unsupported_location_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("libretto.ods");
    fs::write(&path, b"").unwrap();
    assert!(matches!(open_source(&path), Err(LoadError::Unsupported(_))));
}
