//! Search, column filters and ordering for the table view.
//!
//! Query string accepted by `GET /`:
//! - `q=<text>`: keep rows where any cell contains the text, ignoring case
//! - `f.<column>=<value>`: keep rows whose cell equals one of the values
//!   given for that column (repeatable)
//! - `sort=<column>&dir=asc|desc`: order by one column
//!
//! A column sorts numerically when its first non-empty cell reads as a
//! number (`,` `$` `%` ignored); otherwise cells compare as text, ignoring case.
//! Unknown columns in `sort` or `f.` are ignored.

use std::cmp::Ordering;

use url::form_urlencoded;

use crate::storage::DataRecord;
use crate::views::table::cell_text;

const FILTER_PREFIX: &str = "f.";

/// Rows inspected when deciding whether a column is numeric.
const TYPE_SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    pub fn flip(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

/// Parsed view options for the record table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableQuery {
    pub search: String,
    /// Selected values per column, in first-seen order.
    pub filters: Vec<(String, Vec<String>)>,
    pub sort: Option<(String, SortDir)>,
}

impl TableQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        let mut sort_column = None;
        let mut dir = SortDir::Asc;

        for (key, value) in pairs {
            match key.as_str() {
                "q" => query.search = value.trim().to_string(),
                "sort" => sort_column = Some(value).filter(|v| !v.is_empty()),
                "dir" if value.eq_ignore_ascii_case("desc") => dir = SortDir::Desc,
                "dir" => dir = SortDir::Asc,
                _ => {
                    if let Some(column) = key.strip_prefix(FILTER_PREFIX) {
                        if !value.is_empty() {
                            query.add_filter(column, value);
                        }
                    }
                }
            }
        }

        query.sort = sort_column.map(|column| (column, dir));
        query
    }

    fn add_filter(&mut self, column: &str, value: String) {
        match self.filters.iter_mut().find(|(c, _)| c == column) {
            Some((_, values)) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => self.filters.push((column.to_string(), vec![value])),
        }
    }

    /// True when search or filters may hide rows.
    pub fn narrows(&self) -> bool {
        !self.search.is_empty() || !self.filters.is_empty()
    }

    pub fn selected(&self, column: &str) -> &[String] {
        self.filters
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Current sort direction for `column`, if the table is ordered by it.
    pub fn sorted_by(&self, column: &str) -> Option<SortDir> {
        self.sort
            .as_ref()
            .filter(|(c, _)| c == column)
            .map(|(_, dir)| *dir)
    }

    /// Rows passing the search and filters, in the requested order.
    pub fn apply<'a>(&self, records: &'a [DataRecord], columns: &[&str]) -> Vec<&'a DataRecord> {
        let needle = self.search.to_lowercase();
        let mut rows: Vec<&DataRecord> = records
            .iter()
            .filter(|record| self.matches(record, columns, &needle))
            .collect();

        if let Some((column, dir)) = &self.sort {
            if columns.contains(&column.as_str()) {
                sort_rows(&mut rows, column, *dir);
            }
        }
        rows
    }

    fn matches(&self, record: &DataRecord, columns: &[&str], needle: &str) -> bool {
        let found = needle.is_empty()
            || columns
                .iter()
                .any(|c| cell_text(record.get(*c)).to_lowercase().contains(needle));

        found
            && self
                .filters
                .iter()
                .filter(|(column, _)| columns.contains(&column.as_str()))
                .all(|(column, values)| {
                    let text = cell_text(record.get(column));
                    values.iter().any(|v| *v == text)
                })
    }

    /// Encode as a query string, replacing the order with `sort`.
    pub fn to_query_string(&self, sort: Option<(&str, SortDir)>) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            out.append_pair("q", &self.search);
        }
        for (column, values) in &self.filters {
            let key = format!("{}{}", FILTER_PREFIX, column);
            for value in values {
                out.append_pair(&key, value);
            }
        }
        if let Some((column, dir)) = sort {
            out.append_pair("sort", column);
            out.append_pair("dir", dir.as_str());
        }
        out.finish()
    }
}

fn numeric(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| !matches!(c, ',' | '$' | '%')).collect();
    cleaned.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn sort_rows(rows: &mut [&DataRecord], column: &str, dir: SortDir) {
    let is_numeric = rows
        .iter()
        .take(TYPE_SAMPLE_ROWS)
        .map(|r| cell_text(r.get(column)))
        .find(|text| !text.trim().is_empty())
        .is_some_and(|text| numeric(&text).is_some());

    rows.sort_by(|a, b| {
        let (a, b) = (cell_text(a.get(column)), cell_text(b.get(column)));
        let ordering = if is_numeric {
            numeric(&a).unwrap_or(0.0).total_cmp(&numeric(&b).unwrap_or(0.0))
        } else {
            a.to_lowercase().cmp(&b.to_lowercase())
        };
        match dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    });
}

/// Distinct cell texts of `column`, sorted, for the filter choices.
pub fn distinct_values(records: &[DataRecord], column: &str) -> Vec<String> {
    let mut values: Vec<String> = records.iter().map(|r| cell_text(r.get(column))).collect();
    values.sort_by(|a, b| match a.to_lowercase().cmp(&b.to_lowercase()) {
        Ordering::Equal => a.cmp(b),
        other => other,
    });
    values.dedup();
    values
}
