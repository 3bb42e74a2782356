//! Recorded time series and their tab-separated export.
//!
//! Export format:
//!
//! ```text
//! # time	order	mean_period
//! 0	0.1234	10.0000
//! 1	0.2345	
//! ```
//!
//! One row per observed key in ascending order, columns in first-seen
//! order, values with four decimals. Discrete step keys print as integers;
//! a series built with [`TimeSeries::with_key_digits`] prints its keys with
//! that many decimals.
//!
//! A (key, column) pair that was never recorded is omitted from its row:
//! no value is written and nothing is defaulted. Its tab separator is kept
//! so every field stays under its header.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Totally ordered f64 key.
#[derive(Debug, Clone, Copy)]
struct Key(f64);

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Values keyed by (step-or-time, column).
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    rows: BTreeMap<Key, BTreeMap<usize, f64>>,
    /// Fixed decimals for rendered keys; `None` prints them as-is
    key_digits: Option<usize>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Renders keys with a fixed number of decimals.
    pub fn with_key_digits(mut self, digits: usize) -> Self {
        self.key_digits = Some(digits);
        self
    }
    
    /// Records `value` for `column` at `key`, replacing any earlier value
    /// at the same position.
    pub fn add(&mut self, key: f64, column: &str, value: f64) {
        let index = match self.column_index.get(column) {
            Some(&i) => i,
            None => {
                let i = self.columns.len();
                self.columns.push(column.to_string());
                self.column_index.insert(column.to_string(), i);
                i
            }
        };
        self.rows.entry(Key(key)).or_default().insert(index, value);
    }
    
    /// Column names in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    
    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    
    pub fn get(&self, key: f64, column: &str) -> Option<f64> {
        let index = self.column_index.get(column)?;
        self.rows.get(&Key(key))?.get(index).copied()
    }
    
    /// All (key, value) pairs of a column in key order.
    pub fn column(&self, column: &str) -> Vec<(f64, f64)> {
        let Some(&index) = self.column_index.get(column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|(k, row)| row.get(&index).map(|v| (k.0, *v)))
            .collect()
    }
    
    /// Most recent value of a column.
    pub fn last(&self, column: &str) -> Option<f64> {
        let index = self.column_index.get(column)?;
        self.rows.values().rev().find_map(|row| row.get(index).copied())
    }
    
    pub fn clear(&mut self) {
        self.columns.clear();
        self.column_index.clear();
        self.rows.clear();
    }
    
    /// Renders the tab-separated table.
    pub fn render(&self) -> String {
        let mut out = String::from("# time");
        for column in &self.columns {
            out.push('\t');
            out.push_str(column);
        }
        out.push('\n');
        
        for (key, row) in &self.rows {
            let _ = match self.key_digits {
                Some(digits) => write!(out, "{:.*}", digits, key.0),
                None => write!(out, "{}", key.0),
            };
            for index in 0..self.columns.len() {
                out.push('\t');
                if let Some(value) = row.get(&index) {
                    let _ = write!(out, "{:.4}", value);
                }
            }
            out.push('\n');
        }
        out
    }
    
    /// Writes [`TimeSeries::render`] to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}
