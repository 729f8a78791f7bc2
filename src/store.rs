use crate::error::PickerError;
use crate::reader::read_pairs;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub url: String,
}

impl Record {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

pub type Comparator = fn(&Record, &Record) -> Ordering;

/// How the store orders its records before they are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Name,
    NameCaseSensitive,
    Url,
    None,
}

impl SortOrder {
    pub fn comparator(self) -> Option<Comparator> {
        match self {
            SortOrder::Name => Some(by_name_ignore_case),
            SortOrder::NameCaseSensitive => Some(by_name),
            SortOrder::Url => Some(by_url),
            SortOrder::None => None,
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortOrder::Name),
            "name-case-sensitive" => Ok(SortOrder::NameCaseSensitive),
            "url" => Ok(SortOrder::Url),
            "none" => Ok(SortOrder::None),
            other => Err(format!(
                "unknown sort order `{other}` (expected name, name-case-sensitive, url or none)"
            )),
        }
    }
}

pub fn by_name_ignore_case(a: &Record, b: &Record) -> Ordering {
    let a = a.name.chars().flat_map(char::to_lowercase);
    let b = b.name.chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

pub fn by_name(a: &Record, b: &Record) -> Ordering {
    a.name.cmp(&b.name)
}

pub fn by_url(a: &Record, b: &Record) -> Ordering {
    a.url.cmp(&b.url)
}

/// Records in display order. Line `i` of the listing is `records()[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Reads and parses the URL file in one pass.
    pub fn load(path: &Path) -> Result<Self, PickerError> {
        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => PickerError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => PickerError::Unreadable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        })?;
        let pairs = read_pairs(&text).map_err(|err| PickerError::MalformedFile {
            path: path.to_path_buf(),
            line: err.line,
            column: err.column,
            reason: err.reason,
        })?;
        let records = pairs
            .into_iter()
            .map(|(name, url)| Record::new(name, url))
            .collect();
        Ok(Self::new(records))
    }

    /// Stable sort; `None` keeps file order.
    pub fn sorted(mut self, comparator: Option<Comparator>) -> Self {
        if let Some(cmp) = comparator {
            self.records.sort_by(cmp);
        }
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
