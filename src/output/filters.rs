use crate::models::EnrichedDataSourceRecord;

/// Post-resolution record filter.
///
/// Filters only ever apply while rendering; resolution itself is unfiltered,
/// so outputs for different filters are subsets of one computation. Empty
/// strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    strategy: Option<String>,
    kind: Option<String>,
}

impl RecordFilter {
    pub fn new(strategy: Option<&str>, kind: Option<&str>) -> Self {
        Self {
            strategy: normalize(strategy),
            kind: normalize(kind),
        }
    }

    /// Filter on kind alone.
    pub fn by_kind(kind: Option<&str>) -> Self {
        Self::new(None, kind)
    }

    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.strategy.is_none() && self.kind.is_none()
    }

    /// Check if a record matches every active filter.
    ///
    /// Documents spell modes and types in any case, so comparison ignores
    /// ASCII case.
    pub fn matches(&self, record: &EnrichedDataSourceRecord) -> bool {
        field_matches(self.strategy.as_deref(), record.strategy())
            && field_matches(self.kind.as_deref(), record.kind())
    }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
        (Some(_), None) => false,
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
