//! Task and Dataset models plus CSV input loading.
//!
//! One input row becomes one [`Task`]. The dataset establishes its canonical
//! order once, at load time: rows are sorted stably ascending by parsed
//! `PubDate` (rows whose date cannot be parsed keep their relative order and
//! sort last). After the sort each task is assigned its `index`, which is the
//! identity key used for positional checkpoint reconciliation — the order is
//! never changed again for the lifetime of the run.
//!
//! # Input Columns
//!
//! | column | required | role |
//! |---|---|---|
//! | `DocumentUrl` | yes | fetch target |
//! | `PubDate` | no | sort key; missing column keeps file order (warned) |
//! | `Title` | no | display label for progress logs |
//! | `Full_Text` | no | seeds the task text when present |
//!
//! All other columns are carried through untouched and reappear in the
//! checkpoint output.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// Name of the required fetch-target column.
pub const URL_COLUMN: &str = "DocumentUrl";
/// Name of the optional publication-date sort column.
pub const DATE_COLUMN: &str = "PubDate";
/// Name of the optional display-title column.
pub const TITLE_COLUMN: &str = "Title";
/// Name of the result column, both as optional input seed and as output.
pub const FULLTEXT_COLUMN: &str = "Full_Text";

/// One unit of work: a single input row.
#[derive(Debug, Clone)]
pub struct Task {
    /// Stable position in the canonical (sorted) dataset; identity key for
    /// checkpoint reconciliation.
    pub index: usize,
    /// Fetch target. Immutable for the run.
    pub url: String,
    /// Display label only; truncated in logs, no semantic role.
    pub title: String,
    /// Parsed publication timestamp; internal sort key, never written out.
    pub(crate) order_key: Option<NaiveDateTime>,
    /// Current extracted value. `None` means never attempted.
    pub text: Option<String>,
    /// Original cell values, aligned to the dataset headers.
    pub(crate) record: Vec<String>,
}

/// The full ordered set of tasks plus the input schema needed to write the
/// checkpoint back out with every original column intact.
#[derive(Debug)]
pub struct Dataset {
    /// Input header row, in original column order.
    pub headers: Vec<String>,
    /// Tasks in canonical order; `tasks[i].index == i` always holds.
    pub tasks: Vec<Task>,
    /// Position of `Full_Text` in the input headers, when the input had one.
    pub(crate) fulltext_col: Option<usize>,
}

impl Dataset {
    /// Load a dataset from a CSV file.
    ///
    /// Establishes the canonical order (PubDate-ascending when the column is
    /// present) and assigns task indices.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, a row cannot be parsed, or the
    /// `DocumentUrl` column is missing entirely. Individual malformed URLs
    /// do not fail the load; they are logged and will simply fail to fetch.
    pub fn load(path: &Path) -> Result<Dataset, Box<dyn Error>> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let url_col = headers
            .iter()
            .position(|h| h == URL_COLUMN)
            .ok_or_else(|| format!("input file has no `{URL_COLUMN}` column"))?;
        let date_col = headers.iter().position(|h| h == DATE_COLUMN);
        let title_col = headers.iter().position(|h| h == TITLE_COLUMN);
        let fulltext_col = headers.iter().position(|h| h == FULLTEXT_COLUMN);

        if date_col.is_none() {
            warn!(column = DATE_COLUMN, "no publication-date column; keeping original row order");
        }

        let mut tasks = Vec::new();
        for row in reader.records() {
            let record = row?;
            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            // flexible() rows may be ragged; pad so positional writes are safe
            while cells.len() < headers.len() {
                cells.push(String::new());
            }

            let url = cells.get(url_col).cloned().unwrap_or_default();
            if Url::parse(&url).is_err() {
                debug!(row = tasks.len(), url = %url, "row has an unparseable DocumentUrl");
            }
            let title = title_col
                .and_then(|c| cells.get(c))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "No Title".to_string());
            let order_key = date_col
                .and_then(|c| cells.get(c))
                .and_then(|s| parse_pub_date(s));
            let text = fulltext_col
                .and_then(|c| cells.get(c))
                .map(|s| s.to_string())
                .filter(|s| !s.trim().is_empty());

            tasks.push(Task {
                index: 0,
                url,
                title,
                order_key,
                text,
                record: cells,
            });
        }

        if date_col.is_some() {
            info!(rows = tasks.len(), "sorting by publication date, oldest first");
            // stable sort: unparseable dates keep relative order and go last
            tasks.sort_by_key(|t| (t.order_key.is_none(), t.order_key));
        }
        for (i, task) in tasks.iter_mut().enumerate() {
            task.index = i;
        }

        info!(rows = tasks.len(), path = %path.display(), "loaded input dataset");
        Ok(Dataset {
            headers,
            tasks,
            fulltext_col,
        })
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d %B %Y"];

/// Parse a publication date from the handful of formats the input files are
/// known to carry. Returns `None` for anything unrecognized; such rows sort
/// after all dated rows but are still processed.
pub(crate) fn parse_pub_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Unique scratch path for file-backed tests.
    pub(crate) fn temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "text_harvest_{}_{}_{name}.csv",
            std::process::id(),
            std::thread::current().name().unwrap_or("t").replace("::", "_"),
        ));
        fs::write(&path, contents).expect("write temp csv");
        path
    }

    #[test]
    fn parses_common_date_formats() {
        assert!(parse_pub_date("2024-03-01 12:30:00").is_some());
        assert!(parse_pub_date("2024-03-01T12:30:00").is_some());
        assert!(parse_pub_date("2024-03-01").is_some());
        assert!(parse_pub_date("2024-03-01T12:30:00+02:00").is_some());
        assert!(parse_pub_date("01/03/2024").is_some());
        assert!(parse_pub_date("not a date").is_none());
        assert!(parse_pub_date("").is_none());
    }

    #[test]
    fn load_sorts_by_pubdate_with_unparseable_last() {
        let path = temp_csv(
            "sort",
            "DocumentUrl,PubDate,Title\n\
             https://ex.com/c,2024-05-01,C\n\
             https://ex.com/x,garbage,X\n\
             https://ex.com/a,2023-01-01,A\n\
             https://ex.com/b,2023-06-15,B\n",
        );
        let ds = Dataset::load(&path).unwrap();
        let titles: Vec<&str> = ds.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C", "X"]);
        for (i, t) in ds.tasks.iter().enumerate() {
            assert_eq!(t.index, i);
        }
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_without_pubdate_keeps_file_order() {
        let path = temp_csv(
            "noorder",
            "DocumentUrl,Title\nhttps://ex.com/z,Z\nhttps://ex.com/a,A\n",
        );
        let ds = Dataset::load(&path).unwrap();
        let titles: Vec<&str> = ds.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Z", "A"]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_requires_url_column() {
        let path = temp_csv("nourl", "Link,Title\nhttps://ex.com/a,A\n");
        assert!(Dataset::load(&path).is_err());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn existing_fulltext_column_seeds_task_text() {
        let path = temp_csv(
            "seed",
            "DocumentUrl,Full_Text\nhttps://ex.com/a,Already fetched body\nhttps://ex.com/b,\n",
        );
        let ds = Dataset::load(&path).unwrap();
        assert_eq!(ds.tasks[0].text.as_deref(), Some("Already fetched body"));
        assert_eq!(ds.tasks[1].text, None);
        assert_eq!(ds.fulltext_col, Some(1));
        let _ = fs::remove_file(path);
    }
}
