//! Contains [`ReachDataset`], the in-memory attribute table of a SWORD reach shapefile.

use crate::reaches::error::LoadReachesError;
use polars::frame::DataFrame;

/// Name of the column holding the SWORD reach identifier.
pub const REACH_ID_COLUMN: &str = "reach_id";

/// A table of river reaches, one row per reach.
///
/// Columns are the dBASE attributes of the shapefile, in file order. The
/// [`REACH_ID_COLUMN`] is guaranteed to be present. The table is never
/// mutated after loading; filtering produces new values.
#[derive(Debug, Clone)]
pub struct ReachDataset {
    frame: DataFrame,
}

impl ReachDataset {
    /// Wraps `frame`, checking that it carries a `reach_id` column.
    pub fn new(frame: DataFrame) -> Result<Self, LoadReachesError> {
        if frame.column(REACH_ID_COLUMN).is_err() {
            return Err(LoadReachesError::MissingIdColumn(REACH_ID_COLUMN.to_string()));
        }
        Ok(Self { frame })
    }

    /// Attribute column names, in file order.
    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }
}
