//! Accumulating table of per-step statistics.

use nebula_math::stats::summary;
use nebula_types::error::NebulaResult;
use nebula_types::state::{SkyMap, SkyMask};
use serde::Serialize;
use std::collections::BTreeMap;

/// One experiment step: named scalars, keyed in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatsRow(BTreeMap<String, f64>);

impl StatsRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    /// `<stem>_avg` and `<stem>_std` of `map` over `mask`, NaN ignored.
    pub fn summarize(&mut self, stem: &str, map: &SkyMap, mask: &SkyMask) -> NebulaResult<&mut Self> {
        self.insert_summary(format!("{stem}_avg"), format!("{stem}_std"), map, mask)
    }

    /// As [`StatsRow::summarize`], keyed `<stem>_avg_<tag>` / `<stem>_std_<tag>`.
    pub fn summarize_tagged(
        &mut self,
        stem: &str,
        tag: &str,
        map: &SkyMap,
        mask: &SkyMask,
    ) -> NebulaResult<&mut Self> {
        self.insert_summary(format!("{stem}_avg_{tag}"), format!("{stem}_std_{tag}"), map, mask)
    }

    fn insert_summary(
        &mut self,
        avg_key: String,
        std_key: String,
        map: &SkyMap,
        mask: &SkyMask,
    ) -> NebulaResult<&mut Self> {
        let (avg, std) = summary(map, mask)?;
        self.0.insert(avg_key, avg);
        self.0.insert(std_key, std);
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsTable {
    rows: Vec<StatsRow>,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: StatsRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[StatsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of `key` down the table, NaN where a row lacks it.
    pub fn column(&self, key: &str) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.get(key).unwrap_or(f64::NAN))
            .collect()
    }

    /// Pretty JSON array of rows. Non-finite values become `null`.
    pub fn to_json(&self) -> NebulaResult<String> {
        Ok(serde_json::to_string_pretty(&self.rows)?)
    }
}
