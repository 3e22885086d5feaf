//! Choosing reaches by the value of one attribute column.
//!
//! Values are compared in their text form: the chosen column is cast to a
//! string column, so `"Congo"`, `"11"` and `"120.5"` are all matched the same
//! way regardless of the dBASE field type they came from.

use crate::reaches::error::FilterError;
use crate::types::reach_dataset::{ReachDataset, REACH_ID_COLUMN};
use polars::prelude::*;
use std::collections::HashSet;

fn text_column(dataset: &ReachDataset, column: &str) -> Result<Column, FilterError> {
    dataset
        .frame()
        .column(column)
        .map_err(|_| FilterError::UnknownColumn(column.to_string()))?
        .cast(&DataType::String)
        .map_err(|source| FilterError::Polars {
            column: column.to_string(),
            source,
        })
}

/// Distinct non-null values of `column`, in order of first appearance.
///
/// An empty result means the column has no values to filter on and the
/// caller should not offer a run.
pub fn distinct_values(dataset: &ReachDataset, column: &str) -> Result<Vec<String>, FilterError> {
    let values = text_column(dataset, column)?;
    let values = values.str().map_err(|source| FilterError::Polars {
        column: column.to_string(),
        source,
    })?;

    let mut seen = HashSet::new();
    Ok(values
        .into_iter()
        .flatten()
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect())
}

/// A chosen `(column, value)` pair and the reaches it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub column: String,
    pub value: String,
    /// Identifiers of matching rows, in dataset order, as text. Rows with a
    /// null or blank identifier are left out. Duplicates are kept.
    pub reach_ids: Vec<String>,
}

impl FilterSelection {
    pub fn apply(dataset: &ReachDataset, column: &str, value: &str) -> Result<Self, FilterError> {
        if !dataset.has_column(column) {
            return Err(FilterError::UnknownColumn(column.to_string()));
        }
        let polars_err = |source: PolarsError| FilterError::Polars {
            column: column.to_string(),
            source,
        };

        let matching = dataset
            .frame()
            .clone()
            .lazy()
            .filter(col(column).cast(DataType::String).eq(lit(value)))
            .select([col(REACH_ID_COLUMN).cast(DataType::String)])
            .collect()
            .map_err(polars_err)?;

        let ids = matching
            .column(REACH_ID_COLUMN)
            .and_then(|c| c.str())
            .map_err(polars_err)?;
        let reach_ids = ids
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            column: column.to_string(),
            value: value.to_string(),
            reach_ids,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.reach_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Result<ReachDataset, Box<dyn std::error::Error>> {
        let frame = df!(
            "reach_id" => [Some(11_i64), Some(12), None, Some(14), Some(12)],
            "river_name" => [Some("Congo"), Some("Congo"), Some("Congo"), None, Some("Congo")],
            "width" => [120.5, 80.0, 30.0, 120.5, 80.0],
            "lakeflag" => [None::<i64>, None, None, None, None],
        )?;
        Ok(ReachDataset::new(frame)?)
    }

    #[test]
    fn distinct_values_skip_nulls_and_keep_first_order() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        assert_eq!(distinct_values(&dataset, "river_name")?, ["Congo"]);
        assert_eq!(distinct_values(&dataset, "reach_id")?, ["11", "12", "14"]);
        assert!(distinct_values(&dataset, "lakeflag")?.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_column_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        assert!(matches!(
            distinct_values(&dataset, "basin"),
            Err(FilterError::UnknownColumn(_))
        ));
        assert!(matches!(
            FilterSelection::apply(&dataset, "basin", "x"),
            Err(FilterError::UnknownColumn(_))
        ));
        Ok(())
    }

    #[test]
    fn selects_matching_ids_without_nulls() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        let selection = FilterSelection::apply(&dataset, "river_name", "Congo")?;
        // The third Congo row has no reach_id; the repeated 12 is kept.
        assert_eq!(selection.reach_ids, ["11", "12", "12"]);
        assert!(selection.reach_ids.len() <= dataset.len());
        Ok(())
    }

    #[test]
    fn numeric_columns_match_on_text_form() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        let values = distinct_values(&dataset, "width")?;
        assert_eq!(values[0], "120.5");

        let selection = FilterSelection::apply(&dataset, "width", &values[0])?;
        assert_eq!(selection.reach_ids, ["11", "14"]);
        Ok(())
    }

    #[test]
    fn every_value_selects_only_its_rows() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        for value in distinct_values(&dataset, "width")? {
            let selection = FilterSelection::apply(&dataset, "width", &value)?;
            for id in &selection.reach_ids {
                let rows = dataset
                    .frame()
                    .clone()
                    .lazy()
                    .filter(
                        col(REACH_ID_COLUMN)
                            .cast(DataType::String)
                            .eq(lit(id.as_str()))
                            .and(col("width").cast(DataType::String).eq(lit(value.as_str()))),
                    )
                    .collect()?;
                assert!(rows.height() > 0, "reach {} does not have width {}", id, value);
            }
        }
        Ok(())
    }

    #[test]
    fn absent_value_gives_empty_selection() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        assert!(FilterSelection::apply(&dataset, "river_name", "Nile")?.is_empty());
        Ok(())
    }
}
