//! Session state owned by the caller and passed into each operation.

use crate::reaches::error::LoadReachesError;
use crate::reaches::loader::{ShapefileLoader, UploadIdentity, UploadedFile};
use crate::types::field_catalog::{FieldError, FieldSelection};
use crate::types::reach_dataset::ReachDataset;
use log::info;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// A new bundle was parsed.
    Loaded { reaches: usize },
    /// Same file names and sizes as the loaded bundle; nothing was parsed.
    Unchanged,
}

/// What one interactive session remembers between actions: the loaded
/// reaches, the identity of the upload they came from, and the chosen fields.
#[derive(Debug, Default)]
pub struct AppState {
    dataset: Option<Arc<ReachDataset>>,
    upload_key: Option<UploadIdentity>,
    selected_fields: FieldSelection,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&Arc<ReachDataset>> {
        self.dataset.as_ref()
    }

    pub fn selected_fields(&self) -> &FieldSelection {
        &self.selected_fields
    }

    /// Loads `files` unless they are the bundle already loaded.
    ///
    /// On error the previously loaded dataset, if any, stays in place.
    pub async fn load_upload(
        &mut self,
        loader: &ShapefileLoader,
        files: &[UploadedFile],
    ) -> Result<LoadStatus, LoadReachesError> {
        let identity = UploadIdentity::of(files);
        if self.dataset.is_some() && self.upload_key.as_ref() == Some(&identity) {
            info!("Upload unchanged, keeping loaded reaches");
            return Ok(LoadStatus::Unchanged);
        }

        let dataset = loader.load(files).await?;
        let reaches = dataset.len();
        self.dataset = Some(Arc::new(dataset));
        self.upload_key = Some(identity);
        Ok(LoadStatus::Loaded { reaches })
    }

    pub fn select_fields<I, S>(&mut self, names: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.selected_fields = FieldSelection::new(names)?;
        Ok(())
    }

    pub fn select_all_fields(&mut self) {
        self.selected_fields = FieldSelection::all();
    }
}
