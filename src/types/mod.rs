pub mod fetch_request;
pub mod field_catalog;
pub mod outcome;
pub mod reach_dataset;
