use std::collections::BTreeMap;

use crate::codec::Document;

/// Field holding a record's type.
pub const TYPE_FIELD: &str = "$type";

/// Type given to records without a usable `$type`.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Returns the record's type, or [`UNKNOWN_TYPE`] when the top level is not
/// an object or `$type` is missing or not text.
pub fn classify(document: &Document) -> &str {
    document
        .get(TYPE_FIELD)
        .and_then(Document::as_str)
        .unwrap_or(UNKNOWN_TYPE)
}

/// Records grouped by type, each group in arrival order.
#[derive(Debug, Default)]
pub struct Aggregator {
    groups: BTreeMap<String, Vec<(String, Document)>>,
    len: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies the record and appends it to its group. Returns the type.
    pub fn push(
        &mut self,
        key: impl Into<String>,
        document: Document,
    ) -> String {
        let record_type = classify(&document).to_string();
        self.groups
            .entry(record_type.clone())
            .or_default()
            .push((key.into(), document));
        self.len += 1;
        record_type
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct types seen.
    pub fn type_count(&self) -> usize {
        self.groups.len()
    }

    /// Groups sorted by type.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[(String, Document)])> {
        self.groups
            .iter()
            .map(|(t, records)| (t.as_str(), records.as_slice()))
    }

    /// Consumes the aggregator, yielding groups sorted by type.
    pub fn into_groups(self) -> impl Iterator<Item = (String, Vec<(String, Document)>)> {
        self.groups.into_iter()
    }
}
