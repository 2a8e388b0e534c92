#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use libretto::{DataStore, LoadError, MemorySource, Sheet, WorkbookSource};

pub fn libretto_sheet() -> Sheet {
    Sheet::from_strings(
        "RS",
        &[
            vec!["oper", "aufzug", "szene", "page", "whom", "de", "ja", "de_normalized"],
            vec![
                "Salome",
                "1",
                "1",
                "5",
                "Narraboth",
                "Wie schön ist die Prinzessin Salome heute Nacht!",
                "今宵のサロメ王女はなんと美しい！",
                "wie schon ist die prinzessin salome heute nacht!",
            ],
            vec!["Salome", "1", "1", "6", "Page", "Sieh die Mond!", "月を見よ！", "sieh die mond!"],
            vec![
                "Salome",
                "1",
                "2",
                "12",
                "Salome",
                "Ich will nicht bleiben.",
                "ここにはいたくない。",
                "ich will nicht bleiben.",
            ],
            vec!["Salome", "1", "2", "", "Salome", "Ohne Seite", "ページなし", "ohne seite"],
            vec![
                "Elektra",
                "1",
                "1",
                "3",
                "Elektra",
                "Allein! Weh, ganz allein.",
                "ひとり！ああ、まったくひとり。",
                "allein! weh, ganz allein.",
            ],
        ],
    )
}

pub fn structure_sheet() -> Sheet {
    Sheet::from_strings(
        "RS幕構成",
        &[
            vec!["oper", "aufzug", "szene", "name"],
            vec!["Salome", "1", "1", "第1場"],
            vec!["Salome", "1", "2", "第2場"],
            vec!["Elektra", "1", "1", "第1場"],
        ],
    )
}

pub fn score_sheet() -> Sheet {
    Sheet::from_strings(
        "楽譜情報",
        &[vec!["oper", "info"], vec!["Salome", "Boosey & Hawkes"]],
    )
}

pub fn list_sheet() -> Sheet {
    Sheet::from_strings(
        "マーラー以外のドイツ語",
        &[
            vec!["de", "ja", "source"],
            vec!["Zauber", "魔法", "RW"],
            vec!["", "見出しなし", ""],
            vec!["Abend", "夕べ", "RS"],
        ],
    )
}

pub fn workbook() -> MemorySource {
    MemorySource::new()
        .with_sheet(libretto_sheet())
        .with_sheet(structure_sheet())
        .with_sheet(score_sheet())
        .with_sheet(list_sheet())
}

pub fn store() -> DataStore {
    DataStore::new(Box::new(workbook()), Duration::from_secs(600))
}

/// Wraps a source and counts how often each sheet is read.
pub struct CountingSource {
    inner: MemorySource,
    reads: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(inner: MemorySource) -> (Self, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        (
            CountingSource {
                inner,
                reads: reads.clone(),
            },
            reads,
        )
    }
}

impl WorkbookSource for CountingSource {
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>, LoadError> {
        if name == "RS" {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.read_sheet(name)
    }
}
