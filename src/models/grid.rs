//! Spreadsheet grid cells.
//!
//! Attendance exports arrive as a 2-D grid of already-cleaned cells. A cell
//! is either empty, text, or a number (time cells exported as fractions of
//! a day are numbers).

use serde::{Deserialize, Serialize};

/// One cell of an export grid.
///
/// Deserializes from JSON `null`, a number, or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// A numeric cell.
    Number(f64),
    /// A text cell.
    Text(String),
    /// An empty cell.
    Empty,
}

/// A whole export: rows of cells.
pub type Grid = Vec<Vec<Cell>>;

impl Cell {
    /// Returns the trimmed text of a non-blank text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Returns true for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Renders the cell as trimmed text, numbers included.
    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::Text("   ".to_string()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
        assert!(!Cell::from("09:00").is_blank());
    }

    #[test]
    fn test_display_text_of_integer_number() {
        assert_eq!(Cell::Number(1001.0).display_text(), "1001");
        assert_eq!(Cell::Number(0.5).display_text(), "0.5");
    }

    #[test]
    fn test_deserialize_mixed_row() {
        let row: Vec<Cell> = serde_json::from_str(r#"["In Time", 0.386145, null, "17:45"]"#).unwrap();
        assert_eq!(row[0], Cell::Text("In Time".to_string()));
        assert_eq!(row[1], Cell::Number(0.386145));
        assert_eq!(row[2], Cell::Empty);
        assert_eq!(row[3].as_text(), Some("17:45"));
    }
}
