//! Cached access to the workbook.
//!
//! Reading a libretto sheet means scanning every row of it, so the parsed rows
//! (and the term list derived from them) are kept in a [`ChunkedCache`] until
//! the configured time-to-live runs out. Nothing here writes to the workbook.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::cache::ChunkedCache;
use crate::composer::Composer;
use crate::error::DataError;
use crate::loader::WorkbookSource;
use crate::spreadsheet::{LibrettoRow, Sheet};
use crate::text::normalize_string;

/// Default lifetime of cached sheet data (six hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(21600);

/// Sheet holding the score edition used for each opera
pub const SCORE_INFO_SHEET: &str = "楽譜情報";
const SCORE_INFO_CACHE_KEY: &str = "score_info_map_v1";

/// A German term with its precomputed normalized form
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Term {
    pub original: String,
    pub normalized: String,
}

/// One selectable scene of an opera
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SceneOption {
    /// `"{act}-{scene}"`, the value sent back with a scene search
    pub code: String,
    pub label: String,
}

pub struct DataStore {
    source: Box<dyn WorkbookSource>,
    cache: ChunkedCache,
    ttl: Duration,
}

impl DataStore {
    pub fn new(source: Box<dyn WorkbookSource>, ttl: Duration) -> Self {
        DataStore {
            source,
            cache: ChunkedCache::new(),
            ttl,
        }
    }

    pub fn cache(&self) -> &ChunkedCache {
        &self.cache
    }

    fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.put(key, value, self.ttl) {
            warn!("Could not cache {}: {}", key, e);
        }
    }

    /// Read a sheet straight from the source.
    ///
    /// # Errors
    /// `DataError::SheetNotFound` when the workbook has no such sheet.
    pub fn read_sheet(&self, name: &str) -> Result<Sheet, DataError> {
        self.source
            .read_sheet(name)?
            .ok_or_else(|| DataError::SheetNotFound(name.to_string()))
    }

    fn read_optional_sheet(&self, name: &str) -> Result<Option<Sheet>, DataError> {
        Ok(self.source.read_sheet(name)?)
    }

    /// All rows of a composer's libretto sheet
    ///
    /// Served from the cache while it is fresh; otherwise the sheet is read,
    /// its headers validated and the result cached. A sheet with no data rows
    /// yields an empty list and is not cached.
    pub fn libretto_rows(&self, composer: Composer) -> Result<Vec<LibrettoRow>, DataError> {
        let key = composer.data_cache_key();
        if let Some(rows) = self.cache.get::<Vec<LibrettoRow>>(key) {
            return Ok(rows);
        }

        info!("Loading {} data from sheet {}", composer.label(), composer.data_sheet());
        let sheet = self.read_sheet(composer.data_sheet())?;
        if sheet.last_row() < 2 {
            return Ok(Vec::new());
        }

        let rows = LibrettoRow::from_sheet(&sheet)?;
        self.store(key, &rows);
        Ok(rows)
    }

    /// Distinct German lines of a composer with their normalized form
    ///
    /// Rows lacking either form are skipped. When the same German line occurs
    /// more than once, it keeps the position of its first occurrence and the
    /// normalized form of its last.
    pub fn de_terms(&self, composer: Composer) -> Result<Vec<Term>, DataError> {
        let key = composer.terms_cache_key();
        if let Some(terms) = self.cache.get::<Vec<Term>>(key) {
            return Ok(terms);
        }

        let rows = self.libretto_rows(composer)?;
        let mut terms: Vec<Term> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for row in &rows {
            if !row.de.is_truthy() || !row.de_normalized.is_truthy() {
                continue;
            }
            let term = Term {
                original: row.de.display(),
                normalized: row.de_normalized.display(),
            };
            match positions.get(&term.original) {
                Some(&i) => terms[i] = term,
                None => {
                    positions.insert(term.original.clone(), terms.len());
                    terms.push(term);
                }
            }
        }

        self.store(key, &terms);
        Ok(terms)
    }

    /// `"{opera}-{act}-{scene}"` to scene name, from the structure sheet
    ///
    /// A missing structure sheet yields an empty map; results then show the
    /// `場面(act-scene)` fallback.
    pub fn scene_map(&self, composer: Composer) -> Result<HashMap<String, String>, DataError> {
        let key = composer.scene_map_cache_key();
        if let Some(map) = self.cache.get::<HashMap<String, String>>(&key) {
            return Ok(map);
        }

        let mut map = HashMap::new();
        for (opera, code, name) in self.structure_rows(composer)? {
            map.insert(format!("{}-{}", opera, code), name);
        }

        self.store(&key, &map);
        Ok(map)
    }

    /// Scenes of every opera of a composer, in sheet order
    pub fn scene_options(&self, composer: Composer) -> Result<BTreeMap<String, Vec<SceneOption>>, DataError> {
        let mut options: BTreeMap<String, Vec<SceneOption>> = BTreeMap::new();
        for (opera, code, name) in self.structure_rows(composer)? {
            let label = if name.is_empty() { code.clone() } else { name };
            let scenes = options.entry(opera).or_default();
            if !scenes.iter().any(|s| s.code == code) {
                scenes.push(SceneOption { code, label });
            }
        }
        Ok(options)
    }

    /// `(normalized opera, scene code, scene name)` per structure sheet row
    fn structure_rows(&self, composer: Composer) -> Result<Vec<(String, String, String)>, DataError> {
        let Some(sheet) = self.read_optional_sheet(composer.structure_sheet())? else {
            warn!("Structure sheet {} not found", composer.structure_sheet());
            return Ok(Vec::new());
        };
        if sheet.last_row() < 2 {
            return Ok(Vec::new());
        }

        let headers = sheet.require_headers(&["oper", "aufzug", "szene", "name"])?;
        let width = headers.values().copied().max().map_or(0, |m| m + 1);

        Ok(sheet
            .data_rows(width)
            .iter()
            .filter(|row| !row[headers["oper"]].is_blank())
            .map(|row| {
                let opera = normalize_string(&row[headers["oper"]].display());
                let code = format!(
                    "{}-{}",
                    row[headers["aufzug"]].scene_part(),
                    row[headers["szene"]].scene_part()
                );
                let name = row[headers["name"]].display().trim().to_string();
                (opera, code, name)
            })
            .collect())
    }

    /// Normalized opera name to score edition text
    ///
    /// A missing score sheet yields an empty map.
    pub fn score_info_map(&self) -> Result<HashMap<String, String>, DataError> {
        if let Some(map) = self.cache.get::<HashMap<String, String>>(SCORE_INFO_CACHE_KEY) {
            return Ok(map);
        }

        let mut map = HashMap::new();
        if let Some(sheet) = self.read_optional_sheet(SCORE_INFO_SHEET)? {
            if sheet.last_row() >= 2 {
                let headers = sheet.require_headers(&["oper", "info"])?;
                let width = headers.values().copied().max().map_or(0, |m| m + 1);
                for row in sheet.data_rows(width) {
                    let opera = normalize_string(&row[headers["oper"]].display());
                    let info = row[headers["info"]].display().trim().to_string();
                    if !opera.is_empty() && !info.is_empty() {
                        map.insert(opera, info);
                    }
                }
            }
        }

        self.store(SCORE_INFO_CACHE_KEY, &map);
        Ok(map)
    }

    /// Rows 2.. of a plain list sheet as display strings
    ///
    /// `width` columns are taken from each row. With `skip_blank_first`, rows
    /// whose first column is blank are dropped.
    pub fn list_rows(&self, sheet_name: &str, width: usize, skip_blank_first: bool) -> Result<Vec<Vec<String>>, DataError> {
        let sheet = self.read_sheet(sheet_name)?;
        Ok(sheet
            .data_rows(width)
            .into_iter()
            .filter(|row| !skip_blank_first || row.first().is_some_and(|c| !c.is_blank()))
            .map(|row| row.iter().map(|c| c.display()).collect())
            .collect())
    }

    /// Forget everything cached for a composer.
    pub fn invalidate(&self, composer: Composer) {
        self.cache.remove(composer.data_cache_key());
        self.cache.remove(composer.terms_cache_key());
        self.cache.remove(&composer.scene_map_cache_key());
    }
}
