// src/antibiogram.rs

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::debug;

use crate::ingest::{utils::parse_number, RawTable};

/// Which of the two antibiogram exports a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentClass {
    /// Key anti-staphylococcal agents.
    Key,
    /// Every other agent tested.
    Other,
}

impl AgentClass {
    pub fn as_str(&self) -> &str {
        match self {
            AgentClass::Key => "Key agents",
            AgentClass::Other => "Other agents",
        }
    }
}

impl fmt::Display for AgentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntibiogramRow {
    pub antibiotic: String,
    /// Column → value; blank or non-numeric cells are `None`.
    pub values: BTreeMap<String, Option<f64>>,
}

/// An antibiogram table, passed through as read: one row per antibiotic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Antibiogram {
    pub class: AgentClass,
    pub label_column: String,
    /// Value columns in source order.
    pub columns: Vec<String>,
    pub rows: Vec<AntibiogramRow>,
}

impl Antibiogram {
    /// First column labels the antibiotic; every other column is a value column.
    pub fn from_raw(class: AgentClass, raw: &RawTable) -> Result<Self> {
        let (label_column, columns) = raw
            .headers
            .split_first()
            .ok_or_else(|| anyhow!("{}: antibiogram has no columns", raw.name))?;

        let rows: Vec<AntibiogramRow> = raw
            .rows
            .iter()
            .filter(|row| !row[0].is_empty())
            .map(|row| AntibiogramRow {
                antibiotic: row[0].clone(),
                values: columns
                    .iter()
                    .zip(&row[1..])
                    .map(|(col, cell)| (col.clone(), parse_number(cell)))
                    .collect(),
            })
            .collect();

        debug!(%class, table = %raw.name, antibiotics = rows.len(), "loaded antibiogram");
        Ok(Self {
            class,
            label_column: label_column.clone(),
            columns: columns.to_vec(),
            rows,
        })
    }

    pub fn antibiotics(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.antibiotic.as_str())
    }

    /// Value of `column` for `antibiotic`, both matched case-insensitively.
    pub fn value(&self, antibiotic: &str, column: &str) -> Option<f64> {
        let row = self
            .rows
            .iter()
            .find(|r| r.antibiotic.eq_ignore_ascii_case(antibiotic.trim()))?;
        row.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column.trim()))
            .and_then(|(_, v)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_csv_bytes;
    use crate::ingest::tests::{KEY_AGENTS_CSV, OTHER_AGENTS_CSV};

    #[test]
    fn passes_rows_through() -> Result<()> {
        let raw = parse_csv_bytes("key", KEY_AGENTS_CSV.as_bytes())?;
        let abg = Antibiogram::from_raw(AgentClass::Key, &raw)?;

        assert_eq!(abg.label_column, "Antibiotic");
        assert_eq!(abg.columns, vec!["Tested", "Resistant", "% R"]);
        assert_eq!(abg.antibiotics().collect::<Vec<_>>(), vec!["Oxacillin", "Vancomycin"]);
        assert_eq!(abg.value("oxacillin", "% r"), Some(22.9));
        assert_eq!(abg.value("Vancomycin", "Resistant"), Some(1.0));
        Ok(())
    }

    #[test]
    fn blank_cells_are_none() -> Result<()> {
        let raw = parse_csv_bytes("other", OTHER_AGENTS_CSV.as_bytes())?;
        let abg = Antibiogram::from_raw(AgentClass::Other, &raw)?;
        assert_eq!(abg.value("Linezolid", "Tested"), Some(290.0));
        assert_eq!(abg.value("Linezolid", "Resistant"), None);
        assert_eq!(abg.value("Penicillin", "Tested"), None);
        Ok(())
    }

    #[test]
    fn headerless_table_is_rejected() {
        let raw = RawTable {
            name: "empty".into(),
            headers: vec![],
            rows: vec![],
        };
        assert!(Antibiogram::from_raw(AgentClass::Key, &raw).is_err());
    }
}
