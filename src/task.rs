use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const ID_FIELD: &str = "Unique_ID";
pub const TASK_FIELD: &str = "Task";
pub const CLIENT_FIELD: &str = "Client";
pub const DATE_FIELD: &str = "Date";
pub const PRIORITY_FIELD: &str = "Priority";
pub const STATUS_FIELD: &str = "Status";
pub const NOTES_FIELD: &str = "Notes";

pub const COMPLETE: &str = "Complete";
pub const PENDING: &str = "Pending";

/// One data row of the feed, keyed by header name.
///
/// The header set is only known at runtime, so the fields live in a map that
/// keeps header order. Values are never coerced: an id of `007` stays `007`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field. A repeated header overwrites the earlier value but keeps
    /// its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value, or `""` when the column is absent.
    pub fn field(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn id(&self) -> &str {
        self.field(ID_FIELD)
    }

    pub fn task(&self) -> &str {
        self.field(TASK_FIELD)
    }

    pub fn client(&self) -> &str {
        self.field(CLIENT_FIELD)
    }

    pub fn date(&self) -> &str {
        self.field(DATE_FIELD)
    }

    pub fn priority(&self) -> &str {
        self.field(PRIORITY_FIELD)
    }

    pub fn status(&self) -> &str {
        self.field(STATUS_FIELD)
    }

    pub fn notes(&self) -> &str {
        self.field(NOTES_FIELD)
    }

    pub fn is_complete(&self) -> bool {
        self.status() == COMPLETE
    }

    /// Column this record is shown in.
    pub fn column(&self) -> Priority {
        Priority::normalize(self.priority())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// The status a toggle moves a record to.
pub fn toggled_status(current: &str) -> &'static str {
    if current == COMPLETE {
        PENDING
    } else {
        COMPLETE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Board columns, left to right.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Trims, titlecases and matches the label. Anything unrecognised is `Low`.
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Priority::Low)
    }

    fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.trim().chars();
        let titled: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        };
        match titled.as_str() {
            "High" => Some(Priority::High),
            "Medium" => Some(Priority::Medium),
            "Low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Sort rank of a priority label after titlecasing: High 3, Medium 2,
    /// Low 1, anything else 0.
    pub fn rank(raw: &str) -> u8 {
        match Self::parse(raw) {
            Some(Priority::High) => 3,
            Some(Priority::Medium) => 2,
            Some(Priority::Low) => 1,
            None => 0,
        }
    }
}
