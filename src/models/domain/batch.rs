use serde::{Deserialize, Serialize};

use crate::models::domain::record::Record;

/// Output-size profile that decides how many records a batch aims for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Short,
    Long,
}

impl Variant {
    pub fn target_count(&self) -> usize {
        match self {
            Variant::Short => 8,
            Variant::Long => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Short => "short",
            Variant::Long => "long",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Variant::Short),
            "long" => Ok(Variant::Long),
            other => Err(format!("unknown variant '{}'", other)),
        }
    }
}

/// Ordered, hash-unique collection of validated records for one call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    records: Vec<Record>,
    pub target_count: usize,
    pub variant: Variant,
}

impl Batch {
    pub fn new(variant: Variant) -> Self {
        Self {
            records: Vec::new(),
            target_count: variant.target_count(),
            variant,
        }
    }

    /// Appends `record` unless its content hash is already present.
    pub fn push(&mut self, record: Record) -> bool {
        if self.contains_hash(&record.content_hash) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn contains_hash(&self, hash: &str) -> bool {
        self.records.iter().any(|r| r.content_hash == hash)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn shortfall(&self) -> usize {
        self.target_count.saturating_sub(self.records.len())
    }

    pub fn is_full(&self) -> bool {
        self.shortfall() == 0
    }

    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.question.as_str())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
