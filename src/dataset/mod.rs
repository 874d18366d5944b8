use std::io;
use std::path::Path;
use std::str::FromStr;

use csv::{ByteRecord, ReaderBuilder};
use thiserror::Error;

use crate::models::{Item, Rating};

/// Header naming the item identifier column of the catalog table
pub const CATALOG_ID_COLUMN: &str = "movie_id";

/// Header naming the title column of the catalog table
pub const CATALOG_TITLE_COLUMN: &str = "movie_title";

/// Error types for dataset loading
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {source_name}: {error}")]
    Csv {
        source_name: String,
        #[source]
        error: csv::Error,
    },

    #[error("{source_name} has no '{column}' column")]
    MissingColumn { source_name: String, column: String },

    #[error("{source_name} line {line}: invalid {field} '{value}'")]
    InvalidField {
        source_name: String,
        line: u64,
        field: &'static str,
        value: String,
    },
}

/// Catalog and ratings as read from the two source tables
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub catalog: Vec<Item>,
    pub ratings: Vec<Rating>,
}

impl Dataset {
    /// Reads both tables from disk
    pub fn load(movies_path: &Path, ratings_path: &Path) -> Result<Self, DatasetError> {
        let catalog = load_catalog(movies_path)?;
        let ratings = load_ratings(ratings_path)?;

        tracing::info!(
            movies = %movies_path.display(),
            ratings_file = %ratings_path.display(),
            catalog_items = catalog.len(),
            ratings = ratings.len(),
            "Dataset loaded"
        );

        Ok(Self { catalog, ratings })
    }
}

pub fn load_catalog(path: &Path) -> Result<Vec<Item>, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| csv_error(path, e.into()))?;
    read_catalog(file, &path.display().to_string())
}

pub fn load_ratings(path: &Path) -> Result<Vec<Rating>, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| csv_error(path, e.into()))?;
    read_ratings(file, &path.display().to_string())
}

/// Parses a `|`-separated, Latin-1 encoded catalog with a header row
///
/// Columns are located by header name; any other columns are ignored.
pub fn read_catalog<R: io::Read>(reader: R, source_name: &str) -> Result<Vec<Item>, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'|')
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .byte_headers()
        .map_err(|error| DatasetError::Csv {
            source_name: source_name.to_string(),
            error,
        })?
        .clone();
    let id_column = find_column(&headers, CATALOG_ID_COLUMN, source_name)?;
    let title_column = find_column(&headers, CATALOG_TITLE_COLUMN, source_name)?;

    let mut items = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|error| DatasetError::Csv {
            source_name: source_name.to_string(),
            error,
        })?;
        let line = line_of(&record);
        let id = parse_field(&record, id_column, "item id", source_name, line)?;
        let title = record
            .get(title_column)
            .map(|raw| latin1(raw).trim().to_string())
            .ok_or_else(|| DatasetError::InvalidField {
                source_name: source_name.to_string(),
                line,
                field: "title",
                value: String::new(),
            })?;
        items.push(Item { id, title });
    }

    Ok(items)
}

/// Parses a `,`-separated ratings table with a header row
///
/// Only the first three columns are used: user id, item id and rating.
pub fn read_ratings<R: io::Read>(
    reader: R,
    source_name: &str,
) -> Result<Vec<Rating>, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .from_reader(reader);

    let mut ratings = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|error| DatasetError::Csv {
            source_name: source_name.to_string(),
            error,
        })?;
        let line = line_of(&record);
        let user_id = parse_field(&record, 0, "user id", source_name, line)?;
        let item_id = parse_field(&record, 1, "item id", source_name, line)?;
        let value: f32 = parse_field(&record, 2, "rating", source_name, line)?;
        if !value.is_finite() {
            return Err(DatasetError::InvalidField {
                source_name: source_name.to_string(),
                line,
                field: "rating",
                value: value.to_string(),
            });
        }
        ratings.push(Rating {
            user_id,
            item_id,
            value,
        });
    }

    Ok(ratings)
}

fn csv_error(path: &Path, error: csv::Error) -> DatasetError {
    DatasetError::Csv {
        source_name: path.display().to_string(),
        error,
    }
}

fn find_column(
    headers: &ByteRecord,
    column: &str,
    source_name: &str,
) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|header| latin1(header).trim() == column)
        .ok_or_else(|| DatasetError::MissingColumn {
            source_name: source_name.to_string(),
            column: column.to_string(),
        })
}

fn parse_field<T: FromStr>(
    record: &ByteRecord,
    index: usize,
    field: &'static str,
    source_name: &str,
    line: u64,
) -> Result<T, DatasetError> {
    let raw = latin1(record.get(index).unwrap_or_default());
    raw.trim().parse().map_err(|_| DatasetError::InvalidField {
        source_name: source_name.to_string(),
        line,
        field,
        value: raw.clone(),
    })
}

fn line_of(record: &ByteRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

/// Every Latin-1 byte maps to the Unicode code point of the same value
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_catalog_by_header_name() {
        let data = "movie_id|movie_title|release_date\n1|Toy Story (1995)|01-Jan-1995\n2|GoldenEye (1995)|01-Jan-1995\n";
        let items = read_catalog(data.as_bytes(), "movies").unwrap();
        assert_eq!(items, vec![Item::new(1, "Toy Story (1995)"), Item::new(2, "GoldenEye (1995)")]);
    }

    #[test]
    fn test_read_catalog_decodes_latin1() {
        let mut data = b"movie_id|movie_title\n7|Caf".to_vec();
        data.push(0xE9);
        data.extend_from_slice(b" Society\n");
        let items = read_catalog(data.as_slice(), "movies").unwrap();
        assert_eq!(items[0].title, "Café Society");
    }

    #[test]
    fn test_read_catalog_missing_column() {
        let err = read_catalog("id|name\n1|x\n".as_bytes(), "movies").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { ref column, .. } if column == "movie_id"));
    }

    #[test]
    fn test_read_ratings_uses_first_three_columns() {
        let data = "userId,movieId,rating,timestamp\n196,242,3,881250949\n186, 302 ,3.5,891717742\n";
        let ratings = read_ratings(data.as_bytes(), "ratings").unwrap();
        assert_eq!(ratings, vec![Rating::new(196, 242, 3.0), Rating::new(186, 302, 3.5)]);
    }

    #[test]
    fn test_read_ratings_rejects_bad_rating() {
        let data = "userId,movieId,rating\n1,2,3\n1,3,great\n";
        let err = read_ratings(data.as_bytes(), "ratings").unwrap_err();
        match err {
            DatasetError::InvalidField { line, field, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(field, "rating");
                assert_eq!(value, "great");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_read_catalog_rejects_missing_title() {
        let data = "movie_id|movie_title\n1|Alpha\n2\n";
        let err = read_catalog(data.as_bytes(), "movies").unwrap_err();
        match err {
            DatasetError::InvalidField { line, field, .. } => {
                assert_eq!(line, 3);
                assert_eq!(field, "title");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_read_ratings_rejects_non_finite_rating() {
        for bad in ["NaN", "inf", "-inf"] {
            let data = format!("userId,movieId,rating\n1,5,4\n2,6,{}\n", bad);
            let err = read_ratings(data.as_bytes(), "ratings").unwrap_err();
            match err {
                DatasetError::InvalidField { line, field, .. } => {
                    assert_eq!(line, 3);
                    assert_eq!(field, "rating");
                }
                other => panic!("unexpected error for {}: {}", bad, other),
            }
        }
    }

    #[test]
    fn test_dataset_load_from_files() {
        let mut movies = tempfile::NamedTempFile::new().unwrap();
        write!(movies, "movie_id|movie_title\n1|Alpha\n2|Beta\n").unwrap();
        let mut ratings = tempfile::NamedTempFile::new().unwrap();
        write!(ratings, "userId,movieId,rating\n10,1,4\n11,2,5\n").unwrap();

        let dataset = Dataset::load(movies.path(), ratings.path()).unwrap();
        assert_eq!(dataset.catalog.len(), 2);
        assert_eq!(dataset.ratings.len(), 2);
    }

    #[test]
    fn test_dataset_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let err = Dataset::load(&missing, &missing).unwrap_err();
        assert!(matches!(err, DatasetError::Csv { .. }));
    }
}
