use crate::cell::CellValue;
use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Headers every libretto sheet (`RS`, `RW`, `GM`) must carry
pub const LIBRETTO_HEADERS: [&str; 8] = [
    "oper",
    "aufzug",
    "szene",
    "page",
    "whom",
    "de",
    "ja",
    "de_normalized",
];

/// A named sheet: a ragged grid of cells, first row usually the header
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Sheet {
            name: name.into(),
            rows,
        }
    }

    /// Build a sheet from string cells, typing each with `CellValue::from_raw`.
    pub fn from_strings(name: impl Into<String>, rows: &[Vec<&str>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|s| CellValue::from_raw(s)).collect())
            .collect();
        Sheet::new(name, rows)
    }

    /// 1-based index of the last row holding any non-blank cell, 0 if none.
    pub fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|c| !c.is_blank()))
            .map_or(0, |i| i + 1)
    }

    /// Header name (trimmed, lowercased) to column index
    ///
    /// Blank header cells are skipped. When a header repeats, the right-most
    /// column wins.
    pub fn header_map(&self) -> HashMap<String, usize> {
        let mut map = HashMap::new();
        if let Some(header) = self.rows.first() {
            for (i, cell) in header.iter().enumerate() {
                if cell.is_truthy() {
                    map.insert(cell.display().trim().to_lowercase(), i);
                }
            }
        }
        map
    }

    /// Header map, failing on the first required header that is absent.
    pub fn require_headers(&self, required: &[&str]) -> Result<HashMap<String, usize>, DataError> {
        let map = self.header_map();
        for header in required {
            if !map.contains_key(*header) {
                return Err(DataError::MissingHeader {
                    sheet: self.name.clone(),
                    header: header.to_string(),
                });
            }
        }
        Ok(map)
    }

    /// Rows 2 through `last_row`, each padded or cut to `width` cells.
    pub fn data_rows(&self, width: usize) -> Vec<Vec<CellValue>> {
        let last = self.last_row();
        if last < 2 {
            return Vec::new();
        }
        self.rows[1..last]
            .iter()
            .map(|row| {
                let mut row: Vec<CellValue> = row.iter().take(width).cloned().collect();
                row.resize(width, CellValue::Empty);
                row
            })
            .collect()
    }
}

/// One line of a libretto: who sings what, where in the score
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct LibrettoRow {
    pub oper: CellValue,
    pub aufzug: CellValue,
    pub szene: CellValue,
    pub page: CellValue,
    pub whom: CellValue,
    pub de: CellValue,
    pub ja: CellValue,
    pub de_normalized: CellValue,
}

impl LibrettoRow {
    /// Map every data row of a libretto sheet to a typed row.
    ///
    /// # Errors
    /// `DataError::MissingHeader` when one of [`LIBRETTO_HEADERS`] is absent.
    pub fn from_sheet(sheet: &Sheet) -> Result<Vec<LibrettoRow>, DataError> {
        let headers = sheet.require_headers(&LIBRETTO_HEADERS)?;
        let width = headers.values().copied().max().map_or(0, |m| m + 1);
        let col = |row: &[CellValue], name: &str| -> CellValue {
            headers
                .get(name)
                .and_then(|&i| row.get(i))
                .cloned()
                .unwrap_or_default()
        };

        Ok(sheet
            .data_rows(width)
            .iter()
            .map(|row| row.as_slice())
            .map(|row| LibrettoRow {
                oper: col(row, "oper"),
                aufzug: col(row, "aufzug"),
                szene: col(row, "szene"),
                page: col(row, "page"),
                whom: col(row, "whom"),
                de: col(row, "de"),
                ja: col(row, "ja"),
                de_normalized: col(row, "de_normalized"),
            })
            .collect())
    }

    /// `"{act}-{scene}"`, each part lowercased with the `"0"` fallback.
    pub fn scene_code(&self) -> String {
        format!("{}-{}", self.aufzug.scene_part(), self.szene.scene_part())
    }

    pub fn has_page(&self) -> bool {
        !self.page.is_blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn libretto_sheet() -> Sheet {
        Sheet::from_strings(
            "RS",
            &[
                vec!["Oper ", "Aufzug", "Szene", "Page", "Whom", "DE", "JA", "de_normalized"],
                vec!["Salome", "1", "1", "3", "Narraboth", "Wie schön", "なんと美しい", "wie schon"],
                vec!["Salome", "", "", "", "", "", "", ""],
                vec![""],
            ],
        )
    }

    #[test]
    fn header_map_is_case_insensitive() {
        let sheet = libretto_sheet();
        let map = sheet.header_map();
        assert_eq!(map.get("oper"), Some(&0));
        assert_eq!(map.get("de_normalized"), Some(&7));
    }

    #[test]
    fn last_row_ignores_trailing_blank_rows() {
        assert_eq!(libretto_sheet().last_row(), 3);
        assert_eq!(Sheet::new("x", vec![]).last_row(), 0);
    }

    #[test]
    fn rows_are_mapped_by_header() {
        let rows = LibrettoRow::from_sheet(&libretto_sheet()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].whom.display(), "Narraboth");
        assert_eq!(rows[0].scene_code(), "1-1");
        assert!(rows[0].has_page());
        assert_eq!(rows[1].scene_code(), "0-0");
        assert!(!rows[1].has_page());
    }

    #[test]
    fn missing_header_is_named() {
        let sheet = Sheet::from_strings("RS", &[vec!["oper", "aufzug"]]);
        let err = LibrettoRow::from_sheet(&sheet).unwrap_err();
        assert_eq!(err.to_string(), "シート「RS」に必要なヘッダー「szene」がありません。");
    }
}
