//! CSV output
//!
//! Writes a header row followed by one row per record. A stage with no
//! records still produces a file containing only the header.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::rows::TabularRow;

/// Write `rows` as CSV to `writer`
///
/// # Returns
/// Number of data rows written
pub fn write_rows<T: TabularRow, W: Write>(writer: W, rows: &[T]) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(T::HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;

    Ok(rows.len())
}

/// Create (or truncate) `path` and write `rows` to it
///
/// # Errors
/// `Io` if the file cannot be created, `Csv` if a row fails to serialize
pub fn write_csv_file<T: TabularRow>(path: &Path, rows: &[T]) -> Result<usize> {
    let file = File::create(path)?;
    let written = write_rows(file, rows)?;
    info!(path = %path.display(), rows = written, "Wrote CSV");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::{OrganizationRow, UserRow};
    use serde_json::json;

    fn user(login: &str, bio: &str) -> UserRow {
        let record = json!({"login": login, "bio": bio, "followers": 5});
        UserRow::from_record(record.as_object().unwrap())
    }

    #[test]
    fn test_write_rows_header_and_data() {
        let mut buffer = Vec::new();
        let written = write_rows(&mut buffer, &[user("octocat", "hello")]).unwrap();
        assert_eq!(written, 1);

        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("login,name,company,blog,location,email,bio,public_repos,followers,following,created_at")
        );
        assert_eq!(
            lines.next(),
            Some("octocat,N/A,N/A,N/A,N/A,N/A,hello,0,5,0,N/A")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_write_rows_quotes_commas_and_keeps_utf8() {
        let mut buffer = Vec::new();
        write_rows(&mut buffer, &[user("zoe", "Ahoj, světe")]).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("\"Ahoj, světe\""));
    }

    #[test]
    fn test_empty_stage_writes_header_only() {
        let mut buffer = Vec::new();
        let written = write_rows::<OrganizationRow, _>(&mut buffer, &[]).unwrap();
        assert_eq!(written, 0);
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "login,name,description,blog,location,email,public_repos,followers,created_at\n"
        );
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_data.csv");
        let written = write_csv_file(&path, &[user("a", "x"), user("b", "y")]).unwrap();
        assert_eq!(written, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_write_csv_file_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("users_data.csv");
        let result = write_csv_file(&path, &[user("a", "x")]);
        assert!(matches!(result, Err(crate::HarvestError::Io(_))));
    }
}
