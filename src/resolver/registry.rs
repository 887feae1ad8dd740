//! Ordered multi-map of discovered datasources.
//!
//! Keys are datasource names in first-insertion order; each key holds every
//! occurrence found for it, also in insertion order. The same datasource can
//! legitimately appear more than once in a component (for instance once per
//! strategy), and those occurrences are never merged.
//!
//! Anonymous datasources that carry a kind get a synthesized key,
//! `__unnamed__1`, `__unnamed__2`, ..., skipping any key already in use.
//! Synthesis depends only on insertion order, so resolving the same document
//! twice yields the same names.

use std::collections::HashMap;

use crate::constants::{FIRST_SYNTHESIZED_INDEX, UNNAMED_PREFIX};
use crate::models::{DataSourceRecord, EnrichedDataSourceRecord, ShapeDim};

/// Datasources discovered during one resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceRegistry {
    entries: Vec<(String, Vec<EnrichedDataSourceRecord>)>,
    index: HashMap<String, usize>,
    counter: usize,
}

impl Default for DataSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            counter: FIRST_SYNTHESIZED_INDEX,
        }
    }

    /// Add `records` tagged with the given context.
    ///
    /// Records with neither a name nor a kind are skipped and claim no name.
    /// Returns the key claimed by the first record that produced one.
    pub fn append(
        &mut self,
        records: &[DataSourceRecord],
        strategy: Option<&str>,
        value_type: Option<&str>,
        shape: Option<&[ShapeDim]>,
    ) -> Option<String> {
        let mut first: Option<String> = None;

        for record in records {
            let key = match (record.name(), record.kind()) {
                (Some(name), _) => name.to_string(),
                (None, Some(_)) => self.synthesize_name(),
                (None, None) => continue,
            };

            let enriched = EnrichedDataSourceRecord::new(
                record.clone(),
                strategy.map(str::to_string),
                value_type.map(str::to_string),
                shape.map(<[ShapeDim]>::to_vec),
            );
            self.push(key.clone(), enriched);

            if first.is_none() {
                first = Some(key);
            }
        }

        first
    }

    fn synthesize_name(&mut self) -> String {
        loop {
            let candidate = format!("{UNNAMED_PREFIX}{}", self.counter);
            self.counter += 1;
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn push(&mut self, key: String, record: EnrichedDataSourceRecord) {
        if let Some(&position) = self.index.get(&key) {
            self.entries[position].1.push(record);
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, vec![record]));
        }
    }

    /// Occurrences recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&[EnrichedDataSourceRecord]> {
        self.index.get(name).map(|&position| self.entries[position].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Keys in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// `(key, occurrences)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EnrichedDataSourceRecord])> {
        self.entries.iter().map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of occurrences across all keys.
    pub fn occurrences(&self) -> usize {
        self.entries.iter().map(|(_, records)| records.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, kind: &str) -> DataSourceRecord {
        DataSourceRecord::new(Some(name), Some(kind), None::<String>)
    }

    fn anonymous(kind: &str) -> DataSourceRecord {
        DataSourceRecord::new(None::<String>, Some(kind), None::<String>)
    }

    #[test]
    fn test_same_name_keeps_every_occurrence() {
        let mut registry = DataSourceRegistry::new();
        registry.append(&[named("gap", "TANGO")], Some("STEP"), None, None);
        registry.append(&[named("gap", "TANGO")], Some("INIT"), None, None);

        assert_eq!(registry.len(), 1);
        let occurrences = registry.get("gap").unwrap();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].strategy(), Some("STEP"));
        assert_eq!(occurrences[1].strategy(), Some("INIT"));
    }

    #[test]
    fn test_anonymous_records_get_sequential_names() {
        let mut registry = DataSourceRegistry::new();
        let first = registry.append(&[anonymous("CLIENT")], None, None, None);
        let second = registry.append(&[anonymous("DB")], None, None, None);

        assert_eq!(first.as_deref(), Some("__unnamed__1"));
        assert_eq!(second.as_deref(), Some("__unnamed__2"));
    }

    #[test]
    fn test_synthesis_skips_used_names() {
        let mut registry = DataSourceRegistry::new();
        registry.append(&[named("__unnamed__1", "CLIENT")], None, None, None);

        let name = registry.append(&[anonymous("CLIENT")], None, None, None);
        assert_eq!(name.as_deref(), Some("__unnamed__2"));
        assert_eq!(registry.get("__unnamed__1").unwrap().len(), 1);
    }

    #[test]
    fn test_records_without_name_or_kind_are_skipped() {
        let mut registry = DataSourceRegistry::new();
        let empty = DataSourceRecord::default();

        assert_eq!(registry.append(&[empty.clone()], Some("STEP"), None, None), None);
        assert!(registry.is_empty());

        let claimed = registry.append(&[empty, named("b", "DB"), named("c", "DB")], None, None, None);
        assert_eq!(claimed.as_deref(), Some("b"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_context_is_attached() {
        let mut registry = DataSourceRegistry::new();
        let shape = [ShapeDim::Literal(34)];
        registry.append(&[named("mca", "TANGO")], Some("FINAL"), Some("NX_FLOAT"), Some(&shape[..]));

        let record = &registry.get("mca").unwrap()[0];
        assert_eq!(record.value_type(), Some("NX_FLOAT"));
        assert_eq!(record.shape(), Some(&shape[..]));
        assert_eq!(registry.occurrences(), 1);
    }
}
