//! Tabular query results as returned by the warehouse.

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, DashboardResult};

/// Broad column type reported by the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

/// A named result column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell; text is parsed, null is `None`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    /// Integer view of the cell; fractional values are truncated toward zero
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Value::Float(_) => None,
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
            }
            Value::Null => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::Null => write!(f, "null"),
        }
    }
}

/// Ordered rows with named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> DashboardResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                DashboardError::DataShape(format!(
                    "column {name} not found (have: {})",
                    self.column_names().join(", ")
                ))
            })
    }

    /// Fails unless the table has at least one row
    pub fn require_rows(&self, view: &str) -> DashboardResult<()> {
        if self.is_empty() {
            return Err(DashboardError::DataShape(format!("{view} returned no rows")));
        }
        Ok(())
    }

    pub fn first_row(&self, view: &str) -> DashboardResult<&[Value]> {
        self.rows
            .first()
            .map(Vec::as_slice)
            .ok_or_else(|| DashboardError::DataShape(format!("{view} returned no rows")))
    }

    /// Numeric cell; null or non-numeric cells are shape errors
    pub fn f64_at(&self, row: usize, column: usize) -> DashboardResult<f64> {
        let value = self.cell(row, column)?;
        value.as_f64().ok_or_else(|| self.not_numeric(row, column, value))
    }

    /// Integer cell; null or non-numeric cells are shape errors
    pub fn i64_at(&self, row: usize, column: usize) -> DashboardResult<i64> {
        let value = self.cell(row, column)?;
        value.as_i64().ok_or_else(|| self.not_numeric(row, column, value))
    }

    pub fn cell(&self, row: usize, column: usize) -> DashboardResult<&Value> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .ok_or_else(|| DashboardError::DataShape(format!("no cell at row {row}, column {column}")))
    }

    /// Append a derived column computed from each row
    pub fn push_column<F>(&mut self, column: Column, mut derive: F) -> DashboardResult<()>
    where
        F: FnMut(&[Value]) -> DashboardResult<Value>,
    {
        for row in self.rows.iter_mut() {
            let value = derive(row)?;
            row.push(value);
        }
        self.columns.push(column);
        Ok(())
    }

    fn not_numeric(&self, row: usize, column: usize, value: &Value) -> DashboardError {
        let name = self
            .columns
            .get(column)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        DashboardError::DataShape(format!("expected a number in {name} at row {row}, found {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(vec![
            Column::new("REGION", ColumnKind::Text),
            Column::new("TOTAL_REVENUE", ColumnKind::Float),
        ]);
        table.rows.push(vec![Value::Text("EMEA".into()), Value::Float(10.5)]);
        table.rows.push(vec![Value::Text("APAC".into()), Value::Null]);
        table
    }

    #[test]
    fn test_column_index_is_case_insensitive() {
        let table = sample();
        assert_eq!(table.column_index("total_revenue").unwrap(), 1);
        assert!(matches!(
            table.column_index("MISSING"),
            Err(DashboardError::DataShape(_))
        ));
    }

    #[test]
    fn test_null_cell_is_shape_error() {
        let table = sample();
        assert_eq!(table.f64_at(0, 1).unwrap(), 10.5);
        assert!(matches!(table.f64_at(1, 1), Err(DashboardError::DataShape(_))));
    }

    #[test]
    fn test_first_row_on_empty_table() {
        let table = Table::new(vec![Column::new("A", ColumnKind::Integer)]);
        assert!(matches!(table.first_row("VW_X"), Err(DashboardError::DataShape(_))));
        assert!(table.require_rows("VW_X").is_err());
    }

    #[test]
    fn test_as_i64_truncates() {
        assert_eq!(Value::Float(41.9).as_i64(), Some(41));
        assert_eq!(Value::Text("42".into()).as_i64(), Some(42));
        assert_eq!(Value::Text("42.00".into()).as_i64(), Some(42));
        assert_eq!(Value::Null.as_i64(), None);
    }

    #[test]
    fn test_push_column() {
        let mut table = sample();
        table
            .push_column(Column::new("LOWER", ColumnKind::Text), |row| {
                Ok(Value::Text(row[0].to_string().to_lowercase()))
            })
            .unwrap();
        assert_eq!(table.column_names(), vec!["REGION", "TOTAL_REVENUE", "LOWER"]);
        assert_eq!(table.rows[1][2], Value::Text("apac".into()));
    }
}
