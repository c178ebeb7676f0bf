//! Text test vectors.
//!
//! ```text
//! # comment
//! A B Sum[2] <set> <seq>
//! 0 1 01     0     0
//! 1 1 0x2    1     1
//! ```
//!
//! The header names one column per pin, optionally with a `[width]`
//! suffix (default 1). `<set>` and `<seq>` are bookkeeping columns and may
//! appear anywhere; missing trailing values default to 0. Cells are binary
//! digits (`0 1 x E`, exactly `width` of them), `0x` hex, `0o` octal, `0b`
//! binary or decimal, with `_` separators allowed. `<DC>` or `-` marks a
//! cell as don't-care and `<float>` as undriven.

use crate::core::errors::SimError;
use crate::core::values::{check_width, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub width: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Value(Value),
    /// Input left as it was; output not checked
    DontCare,
    /// Input driven with all `X`; output expected all `X`
    Floating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorRow {
    /// 1-based source line
    pub line: usize,
    pub cells: Vec<Cell>,
    pub set: u32,
    pub seq: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVector {
    columns: Vec<Column>,
    rows: Vec<VectorRow>,
}

enum HeaderEntry {
    Pin,
    Set,
    Seq,
}

impl TestVector {
    pub fn parse(text: &str) -> Result<Self, SimError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, strip_comment(line).trim()))
            .filter(|(_, line)| !line.is_empty());

        let (header_line, header) = lines.next().ok_or(SimError::TestVectorParse {
            line: 0,
            message: "missing header".to_string(),
        })?;

        let mut columns = Vec::new();
        let mut layout = Vec::new();
        for token in header.split_whitespace() {
            match token.to_ascii_lowercase().as_str() {
                "<set>" => layout.push(HeaderEntry::Set),
                "<seq>" => layout.push(HeaderEntry::Seq),
                _ => {
                    columns.push(parse_column(token, header_line)?);
                    layout.push(HeaderEntry::Pin);
                }
            }
        }
        if columns.is_empty() {
            return Err(SimError::TestVectorParse {
                line: header_line,
                message: "header names no pins".to_string(),
            });
        }

        let mut rows = Vec::new();
        for (line, text) in lines {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.len() > layout.len() {
                return Err(SimError::TestVectorParse {
                    line,
                    message: format!("expected {} values, found {}", layout.len(), tokens.len()),
                });
            }
            let mut cells = Vec::with_capacity(columns.len());
            let (mut set, mut seq) = (0, 0);
            for (i, entry) in layout.iter().enumerate() {
                let token = tokens.get(i).copied();
                match entry {
                    HeaderEntry::Pin => {
                        let column = &columns[cells.len()];
                        let token = token.ok_or_else(|| SimError::TestVectorParse {
                            line,
                            message: format!("missing value for column {}", column.name),
                        })?;
                        cells.push(parse_cell(token, column, line)?);
                    }
                    HeaderEntry::Set => set = parse_counter(token, "<set>", line)?,
                    HeaderEntry::Seq => seq = parse_counter(token, "<seq>", line)?,
                }
            }
            rows.push(VectorRow {
                line,
                cells,
                set,
                seq,
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[VectorRow] {
        &self.rows
    }

    /// Independent runs, each starting from reset: every `<seq>` 0 row on
    /// its own, then each `<set>` with its `<seq>` > 0 rows in sequence order
    pub fn units(&self) -> Vec<Vec<&VectorRow>> {
        let mut units: Vec<Vec<&VectorRow>> = Vec::new();
        let mut sets: BTreeMap<u32, Vec<&VectorRow>> = BTreeMap::new();
        for row in &self.rows {
            if row.seq == 0 {
                units.push(vec![row]);
            } else {
                sets.entry(row.set).or_default().push(row);
            }
        }
        for (_, mut rows) in sets {
            rows.sort_by_key(|row| row.seq);
            units.push(rows);
        }
        units
    }
}

impl FromStr for TestVector {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestVector::parse(s)
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_column(token: &str, line: usize) -> Result<Column, SimError> {
    let fail = |message: String| SimError::TestVectorParse { line, message };
    let Some(open) = token.find('[') else {
        return Ok(Column {
            name: token.to_string(),
            width: 1,
        });
    };
    let close = token
        .strip_suffix(']')
        .ok_or_else(|| fail(format!("malformed column '{}'", token)))?;
    let digits = &close[open + 1..];
    let width: u32 = digits
        .parse()
        .map_err(|_| fail(format!("bad width in column '{}'", token)))?;
    let width = check_width(width).map_err(|e| fail(e.to_string()))?;
    if width == 0 {
        return Err(fail(format!("column '{}' has zero width", token)));
    }
    Ok(Column {
        name: token[..open].to_string(),
        width,
    })
}

fn parse_counter(token: Option<&str>, what: &str, line: usize) -> Result<u32, SimError> {
    match token {
        None => Ok(0),
        Some(t) => t.parse().map_err(|_| SimError::TestVectorParse {
            line,
            message: format!("{} value '{}' is not a number", what, t),
        }),
    }
}

fn parse_cell(token: &str, column: &Column, line: usize) -> Result<Cell, SimError> {
    let lower = token.to_ascii_lowercase();
    if lower == "<dc>" || token == "-" {
        return Ok(Cell::DontCare);
    }
    if lower == "<float>" {
        return Ok(Cell::Floating);
    }
    let cleaned: String = token.chars().filter(|c| *c != '_').collect();
    let parsed = match cleaned
        .strip_prefix("0o")
        .or_else(|| cleaned.strip_prefix("0O"))
    {
        Some(octal) => u64::from_str_radix(octal, 8)
            .ok()
            .filter(|v| column.width >= 64 || v >> column.width == 0)
            .map(|v| Value::known(column.width, v))
            .ok_or_else(|| SimError::ValueParse {
                text: token.to_string(),
                reason: format!("not an octal value of {} bits", column.width),
            }),
        None => Value::parse(&cleaned, column.width),
    };
    parsed.map(Cell::Value).map_err(|e| SimError::TestVectorParse {
        line,
        message: format!(
            "column {}: {} (expected {} bit{})",
            column.name,
            e,
            column.width,
            if column.width == 1 { "" } else { "s" }
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_vector() {
        let vector = TestVector::parse("A B C\n0 1 0\n1 0 1\n").unwrap();
        let names: Vec<&str> = vector.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(vector.rows().len(), 2);
        assert_eq!(vector.rows()[1].cells[0], Cell::Value(Value::TRUE));
        assert_eq!(vector.rows()[1].line, 3);
    }

    #[test]
    fn test_set_and_seq_columns() {
        let text = "A B <seq> <set>\n0 1 5 10\n1 1\n";
        let vector = TestVector::parse(text).unwrap();
        assert_eq!(vector.columns().len(), 2);
        assert_eq!((vector.rows()[0].set, vector.rows()[0].seq), (10, 5));
        assert_eq!((vector.rows()[1].set, vector.rows()[1].seq), (0, 0));
    }

    #[test]
    fn test_units_group_sequences() {
        let text = "A <set> <seq>\n0 0 0\n1 1 2\n0 1 1\n1 2 1\n0 0 0\n";
        let vector = TestVector::parse(text).unwrap();
        let units = vector.units();
        let lines: Vec<Vec<usize>> = units
            .iter()
            .map(|u| u.iter().map(|r| r.line).collect())
            .collect();
        assert_eq!(lines, vec![vec![2], vec![6], vec![4, 3], vec![5]]);
    }

    #[test]
    fn test_value_forms() {
        let text = "A[32] B[8] C[16] D[4] E F\n0x_1234_5678 1010_1010 -3_000 0o17 <DC> <float>\n";
        let vector = TestVector::parse(text).unwrap();
        let cells = &vector.rows()[0].cells;
        assert_eq!(cells[0], Cell::Value(Value::known(32, 0x1234_5678)));
        assert_eq!(cells[1], Cell::Value(Value::known(8, 0xAA)));
        assert_eq!(cells[2], Cell::Value(Value::known(16, 62536)));
        assert_eq!(cells[3], Cell::Value(Value::known(4, 0xF)));
        assert_eq!(cells[4], Cell::DontCare);
        assert_eq!(cells[5], Cell::Floating);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let vector = TestVector::parse("# adder\n\nA B # inputs\n1 1\n").unwrap();
        assert_eq!(vector.rows().len(), 1);
        assert_eq!(vector.rows()[0].line, 4);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = TestVector::parse("A <set>\n0 abc\n").unwrap_err();
        assert!(matches!(err, SimError::TestVectorParse { line: 2, .. }));

        let err = TestVector::parse("A[1]\n0x11111\n").unwrap_err();
        match err {
            SimError::TestVectorParse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("column A"));
                assert!(message.contains("expected 1 bit"));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(TestVector::parse("A B\n0 1 1\n").is_err());
        assert!(TestVector::parse("A B\n0\n").is_err());
        assert!(TestVector::parse("").is_err());
    }
}
