//! Day log: which files were marked audited on which day, per root.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayLog {
    days: BTreeMap<NaiveDate, Vec<String>>,
}

impl DayLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Record `path` under `date`. Returns false if it was already there.
    pub fn record(&mut self, date: NaiveDate, path: impl Into<String>) -> bool {
        let path = path.into();
        let paths = self.days.entry(date).or_default();
        if paths.contains(&path) {
            return false;
        }
        paths.push(path);
        true
    }

    /// Drop `path` from every day. Returns whether anything was removed.
    pub fn forget(&mut self, path: &str) -> bool {
        let mut removed = false;
        for paths in self.days.values_mut() {
            let before = paths.len();
            paths.retain(|p| p != path);
            removed |= paths.len() != before;
        }
        self.days.retain(|_, paths| !paths.is_empty());
        removed
    }

    pub fn days(&self) -> impl Iterator<Item = (&NaiveDate, &[String])> {
        self.days.iter().map(|(d, p)| (d, p.as_slice()))
    }

    pub fn files_on(&self, date: NaiveDate) -> &[String] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_files(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
