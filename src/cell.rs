use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell as read from a sheet
///
/// Sheets are authored by hand, so the same column can hold numbers in one
/// row and text in the next (page `12` vs page `"12a"`). The variants keep the
/// original type so filters can decide how strict to be.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Build a cell from raw text the way a CSV export stores it.
    ///
    /// Numeric-looking text becomes `Number`, `TRUE`/`FALSE` become `Bool`,
    /// blank text becomes `Empty`. Anything else is kept verbatim.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(num) = trimmed.parse::<f64>() {
            if num.is_finite() && !trimmed.starts_with('+') {
                return CellValue::Number(num);
            }
        }
        match trimmed {
            "TRUE" => CellValue::Bool(true),
            "FALSE" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Spreadsheet-style string form. Integral numbers drop the fraction.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Falsy cells are empty, empty text, zero and `false`.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Bool(b) => *b,
        }
    }

    /// One half of a scene code: trimmed and lowercased, `"0"` for falsy cells.
    pub fn scene_part(&self) -> String {
        if !self.is_truthy() {
            return "0".to_string();
        }
        self.display().trim().to_lowercase()
    }

    /// Numeric value of the cell, parsing text when it holds a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    t.parse::<f64>().ok().filter(|n| n.is_finite())
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_text_is_typed() {
        assert_eq!(CellValue::from_raw("12"), CellValue::Number(12.0));
        assert_eq!(CellValue::from_raw("  "), CellValue::Empty);
        assert_eq!(CellValue::from_raw("TRUE"), CellValue::Bool(true));
        assert_eq!(
            CellValue::from_raw("Hab' mir's gelobt"),
            CellValue::Text("Hab' mir's gelobt".to_string())
        );
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(CellValue::Number(12.0).display(), "12");
        assert_eq!(CellValue::Number(2.5).display(), "2.5");
    }

    #[test]
    fn scene_part_falls_back_to_zero() {
        assert_eq!(CellValue::Empty.scene_part(), "0");
        assert_eq!(CellValue::Number(0.0).scene_part(), "0");
        assert_eq!(CellValue::Text(" Vorspiel ".into()).scene_part(), "vorspiel");
        assert_eq!(CellValue::Number(3.0).scene_part(), "3");
    }

    #[test]
    fn numeric_text_parses() {
        assert_eq!(CellValue::Text(" 42 ".into()).as_number(), Some(42.0));
        assert_eq!(CellValue::Text("42a".into()).as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }
}
