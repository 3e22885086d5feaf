//! Loading an uploaded shapefile bundle into a [`ReachDataset`].
//!
//! The uploaded blobs are written to a private temporary directory so the
//! shapefile reader can find the companion `.dbf`/`.shx`/`.prj` files next
//! to the `.shp` by base name. The directory is removed afterwards, whatever
//! the outcome of the parse.

use crate::reaches::error::LoadReachesError;
use crate::types::reach_dataset::ReachDataset;
use crate::utils::remove_dir_with_retry;
use log::{debug, info};
use polars::prelude::*;
use shapefile::dbase::{self, FieldValue};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::{fs, task};

const GEOMETRY_EXTENSION: &str = "shp";
const TABLE_EXTENSION: &str = "dbf";
const TEMP_DIR_PREFIX: &str = "sword_temp_";
const BUNDLE_EXTENSIONS: &[&str] = &["shp", "shx", "dbf", "prj", "cpg"];

/// A named file handed over by the user, e.g. `na_sword_reaches_hb74_v16.dbf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Name and size of every file in an upload, in upload order.
///
/// Two uploads with equal identities are treated as the same bundle and are
/// not parsed again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadIdentity(Vec<(String, u64)>);

impl UploadIdentity {
    pub fn of(files: &[UploadedFile]) -> Self {
        Self(files.iter().map(|f| (f.name.clone(), f.size())).collect())
    }
}

/// Writes uploads to a scratch directory and parses the reach table.
#[derive(Debug, Clone)]
pub struct ShapefileLoader {
    /// Parent of the `sword_temp_*` directories; the system temp dir if unset.
    temp_root: Option<PathBuf>,
    cleanup_attempts: u32,
    cleanup_backoff: Duration,
}

impl Default for ShapefileLoader {
    fn default() -> Self {
        Self {
            temp_root: None,
            cleanup_attempts: 3,
            cleanup_backoff: Duration::from_millis(500),
        }
    }
}

impl ShapefileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the scratch directories under `root` instead of the system temp dir.
    pub fn with_temp_root(root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Parses `files` as one shapefile bundle.
    ///
    /// # Errors
    ///
    /// [`LoadReachesError::MissingGeometryFile`] if no `.shp` is among the
    /// files, [`LoadReachesError::ShapefileParse`] if the shapefile or its
    /// attribute table cannot be read, [`LoadReachesError::MissingIdColumn`]
    /// if the table has no `reach_id` column.
    pub async fn load(&self, files: &[UploadedFile]) -> Result<ReachDataset, LoadReachesError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let temp_dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(LoadReachesError::TempDir)?;
        debug!("Writing {} uploaded files to {:?}", files.len(), temp_dir.path());

        let result = Self::load_in(temp_dir.path(), files).await;
        self.release(temp_dir).await;
        result
    }

    async fn load_in(dir: &Path, files: &[UploadedFile]) -> Result<ReachDataset, LoadReachesError> {
        for file in files {
            let file_name = Path::new(&file.name)
                .file_name()
                .ok_or_else(|| LoadReachesError::InvalidUploadName(file.name.clone()))?;
            let target = dir.join(file_name);
            fs::write(&target, &file.bytes)
                .await
                .map_err(|e| LoadReachesError::WriteUpload(target.clone(), e))?;
        }

        let shp_path = find_geometry_file(dir)
            .await?
            .ok_or(LoadReachesError::MissingGeometryFile)?;
        info!("Reading reaches from {:?}", shp_path);

        let frame = task::spawn_blocking(move || read_reach_table(&shp_path)).await??;
        let dataset = ReachDataset::new(frame)?;
        info!("Loaded {} river reaches", dataset.len());
        Ok(dataset)
    }

    async fn release(&self, dir: TempDir) {
        let path = dir.path().to_path_buf();
        if dir.close().is_ok() {
            return;
        }
        remove_dir_with_retry(&path, self.cleanup_attempts.saturating_sub(1), self.cleanup_backoff)
            .await;
    }
}

async fn find_geometry_file(dir: &Path) -> Result<Option<PathBuf>, LoadReachesError> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| LoadReachesError::ScanUpload(dir.to_path_buf(), e))?;
    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LoadReachesError::ScanUpload(dir.to_path_buf(), e))?
    {
        let path = entry.path();
        let is_geometry = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(GEOMETRY_EXTENSION));
        if is_geometry {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Whether `path` looks like one part of a shapefile bundle, judged by extension.
pub fn is_bundle_part(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            BUNDLE_EXTENSIONS
                .iter()
                .any(|wanted| ext.eq_ignore_ascii_case(wanted))
        })
}

/// The bundle parts directly inside `dir`, sorted by path.
pub async fn bundle_parts(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut parts = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_bundle_part(&path) && entry.file_type().await?.is_file() {
            parts.push(path);
        }
    }
    parts.sort();
    Ok(parts)
}

/// A single attribute value, before the column type is decided.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&FieldValue> for Cell {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Character(Some(s)) => Cell::Text(s.trim().to_string()),
            FieldValue::Memo(s) => Cell::Text(s.clone()),
            FieldValue::Numeric(Some(n)) => Cell::Number(*n),
            FieldValue::Float(Some(n)) => Cell::Number(f64::from(*n)),
            FieldValue::Integer(n) => Cell::Number(f64::from(*n)),
            FieldValue::Double(n) | FieldValue::Currency(n) => Cell::Number(*n),
            FieldValue::Logical(Some(b)) => Cell::Bool(*b),
            FieldValue::Date(Some(d)) => {
                Cell::Text(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
            }
            FieldValue::Character(None)
            | FieldValue::Numeric(None)
            | FieldValue::Float(None)
            | FieldValue::Logical(None)
            | FieldValue::Date(None) => Cell::Null,
            other => Cell::Text(format!("{:?}", other)),
        }
    }
}

fn parse_error(path: &Path, e: impl std::fmt::Display) -> LoadReachesError {
    LoadReachesError::ShapefileParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Reads the attribute table of every shape into a DataFrame, keeping the
/// dBASE field order.
fn read_reach_table(shp_path: &Path) -> Result<DataFrame, LoadReachesError> {
    let dbf_path = shp_path.with_extension(TABLE_EXTENSION);
    let field_names: Vec<String> = dbase::Reader::from_path(&dbf_path)
        .map_err(|e| parse_error(&dbf_path, e))?
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let mut reader =
        shapefile::Reader::from_path(shp_path).map_err(|e| parse_error(shp_path, e))?;
    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); field_names.len()];
    for item in reader.iter_shapes_and_records() {
        let (_shape, record) = item.map_err(|e| parse_error(shp_path, e))?;
        for (column, name) in cells.iter_mut().zip(&field_names) {
            column.push(record.get(name).map(Cell::from).unwrap_or(Cell::Null));
        }
    }

    let columns: Vec<Column> = field_names
        .iter()
        .zip(cells)
        .map(|(name, column)| build_column(name, column))
        .collect();
    DataFrame::new(columns).map_err(|e| LoadReachesError::Table {
        path: shp_path.to_path_buf(),
        source: e,
    })
}

/// Picks the narrowest type that holds every cell: integers, then floats,
/// then booleans, falling back to text.
fn build_column(name: &str, cells: Vec<Cell>) -> Column {
    let name = PlSmallStr::from(name);
    let has_values = cells.iter().any(|c| *c != Cell::Null);
    let all_numbers = cells.iter().all(|c| matches!(c, Cell::Null | Cell::Number(_)));
    let all_bools = cells.iter().all(|c| matches!(c, Cell::Null | Cell::Bool(_)));

    if has_values && all_numbers {
        let numbers: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Cell::Number(n) => Some(*n),
                _ => None,
            })
            .collect();
        let integral = numbers
            .iter()
            .flatten()
            .all(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64);
        if integral {
            let ints: Vec<Option<i64>> = numbers.iter().map(|n| n.map(|v| v as i64)).collect();
            return Series::new(name, ints).into();
        }
        return Series::new(name, numbers).into();
    }

    if has_values && all_bools {
        let bools: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Cell::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return Series::new(name, bools).into();
    }

    let texts: Vec<Option<String>> = cells
        .into_iter()
        .map(|c| match c {
            Cell::Null => None,
            Cell::Text(s) => Some(s),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        })
        .collect();
    Series::new(name, texts).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sword_bundle, FixtureReach};

    #[tokio::test]
    async fn loads_attribute_table() -> Result<(), Box<dyn std::error::Error>> {
        let bundle = sword_bundle(&[
            FixtureReach::new(11111100011, "Congo", 120.5),
            FixtureReach::new(11111100021, "Congo", 98.0),
            FixtureReach::new(11111100031, "Ubangi", 40.25),
        ])?;

        let dataset = ShapefileLoader::new().load(&bundle).await?;

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.columns(), ["reach_id", "river_name", "width"]);
        let ids = dataset.frame().column("reach_id")?;
        assert_eq!(ids.dtype(), &DataType::Int64);
        assert_eq!(ids.i64()?.get(0), Some(11111100011));
        let widths = dataset.frame().column("width")?;
        assert_eq!(widths.dtype(), &DataType::Float64);
        Ok(())
    }

    #[tokio::test]
    async fn missing_geometry_file_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let bundle: Vec<UploadedFile> = sword_bundle(&[FixtureReach::new(1, "Congo", 1.0)])?
            .into_iter()
            .filter(|f| !f.name.ends_with(".shp"))
            .collect();

        let result = ShapefileLoader::new().load(&bundle).await;

        assert!(matches!(result, Err(LoadReachesError::MissingGeometryFile)));
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_geometry_file_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let mut bundle = sword_bundle(&[FixtureReach::new(1, "Congo", 1.0)])?;
        for file in bundle.iter_mut().filter(|f| f.name.ends_with(".shp")) {
            file.bytes = b"definitely not a shapefile".to_vec();
        }

        let result = ShapefileLoader::new().load(&bundle).await;

        assert!(matches!(result, Err(LoadReachesError::ShapefileParse { .. })));
        Ok(())
    }

    fn scratch_dirs(root: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(TEMP_DIR_PREFIX) {
                found.push(entry.path());
            }
        }
        Ok(found)
    }

    #[tokio::test]
    async fn scratch_directory_is_removed_after_every_load(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        let loader = ShapefileLoader::with_temp_root(root.path());
        let bundle = sword_bundle(&[FixtureReach::new(1, "Congo", 1.0)])?;

        loader.load(&bundle).await?;
        assert!(scratch_dirs(root.path())?.is_empty());

        let without_geometry: Vec<UploadedFile> = bundle
            .into_iter()
            .filter(|f| !f.name.ends_with(".shp"))
            .collect();
        assert!(loader.load(&without_geometry).await.is_err());
        assert!(scratch_dirs(root.path())?.is_empty());

        let mut corrupt = sword_bundle(&[FixtureReach::new(2, "Congo", 1.0)])?;
        for file in corrupt.iter_mut().filter(|f| f.name.ends_with(".shp")) {
            file.bytes = b"not a shapefile".to_vec();
        }
        assert!(loader.load(&corrupt).await.is_err());
        assert!(scratch_dirs(root.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn bundle_parts_are_recognised_by_extension() {
        assert!(is_bundle_part(Path::new("reaches.shp")));
        assert!(is_bundle_part(Path::new("/data/REACHES.DBF")));
        assert!(is_bundle_part(Path::new("reaches.cpg")));
        assert!(!is_bundle_part(Path::new("reaches.shp.xml")));
        assert!(!is_bundle_part(Path::new("README")));
    }

    #[tokio::test]
    async fn bundle_directory_lists_only_parts() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        for file in sword_bundle(&[FixtureReach::new(1, "Congo", 1.0)])? {
            std::fs::write(dir.path().join(&file.name), &file.bytes)?;
        }
        std::fs::write(dir.path().join("notes.txt"), b"ignored")?;
        std::fs::create_dir(dir.path().join("nested.shp"))?;

        let parts = bundle_parts(dir.path()).await?;
        let names: Vec<String> = parts
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "sword_reaches.dbf",
                "sword_reaches.prj",
                "sword_reaches.shp",
                "sword_reaches.shx"
            ]
        );
        Ok(())
    }

    #[test]
    fn identity_tracks_name_and_size() {
        let a = vec![UploadedFile::new("a.shp", vec![0; 4])];
        let b = vec![UploadedFile::new("a.shp", vec![1; 4])];
        let c = vec![UploadedFile::new("a.shp", vec![0; 5])];
        assert_eq!(UploadIdentity::of(&a), UploadIdentity::of(&b));
        assert_ne!(UploadIdentity::of(&a), UploadIdentity::of(&c));
    }

    #[test]
    fn numeric_columns_narrow_to_integers() {
        let column = build_column(
            "reach_id",
            vec![Cell::Number(12.0), Cell::Null, Cell::Number(7.0)],
        );
        assert_eq!(column.dtype(), &DataType::Int64);

        let column = build_column("mixed", vec![Cell::Number(1.5), Cell::Text("x".into())]);
        assert_eq!(column.dtype(), &DataType::String);
    }
}
