use std::sync::Arc;

use chrono::{DateTime, Utc};
use receipts_core::Dataset;

use crate::error::IngestionError;
use crate::normalize::normalize;

/// Holds the dataset currently in effect for one interactive session.
///
/// A successful upload replaces the dataset wholesale. A failed upload leaves
/// the previous one, if any, in place.
#[derive(Debug, Default, Clone)]
pub struct Session {
    current: Option<Arc<Dataset>>,
    loaded_at: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes `raw` and, on success, makes it the session's dataset.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError`] when normalization fails; the session is
    /// left exactly as it was.
    pub fn upload(&mut self, raw: &[u8]) -> Result<Arc<Dataset>, IngestionError> {
        match normalize(raw) {
            Ok(dataset) => Ok(self.replace(dataset)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept_previous = self.current.is_some(),
                    "receipts upload rejected"
                );
                Err(e)
            }
        }
    }

    /// Installs an already-normalized dataset, discarding the previous one.
    ///
    /// Lets callers that share the session run [`normalize`] without holding
    /// it and lock only for the swap.
    pub fn replace(&mut self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        tracing::info!(
            records = dataset.len(),
            replaced = self.current.is_some(),
            "receipts dataset loaded"
        );
        self.current = Some(Arc::clone(&dataset));
        self.loaded_at = Some(Utc::now());
        dataset
    }

    /// The dataset in effect, shared so readers can release the session.
    #[must_use]
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.current.clone()
    }

    #[must_use]
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// `true` until the first successful upload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST: &[u8] = br#"[{"brand":"A","item":"X","price":10.0,"quantity":2,"channel":"D2C","location":"NY","date":"2023-07-15T14:30:00","discount":5.0}]"#;
    const SECOND: &[u8] = br#"[
        {"brand":"B","item":"Y","price":4.0,"quantity":1,"channel":"Retail","location":"LA","date":"2023-07-16T09:00:00","discount":0.0},
        {"brand":"C","item":"Z","price":6.0,"quantity":3,"channel":"Retail","location":"LA","date":"2023-07-16T10:00:00","discount":1.0}
    ]"#;

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();
        assert!(session.is_empty());
        assert!(session.dataset().is_none());
        assert!(session.loaded_at().is_none());
    }

    #[test]
    fn upload_sets_current_dataset() {
        let mut session = Session::new();
        let loaded = session.upload(FIRST).expect("valid upload");
        assert_eq!(loaded.len(), 1);
        assert!(!session.is_empty());
        assert!(session.loaded_at().is_some());
        assert!(Arc::ptr_eq(&loaded, &session.dataset().unwrap()));
    }

    #[test]
    fn successful_upload_replaces_rather_than_appends() {
        let mut session = Session::new();
        session.upload(FIRST).unwrap();
        session.upload(SECOND).unwrap();
        let current = session.dataset().unwrap();
        assert_eq!(current.len(), 2);
        assert!(current.iter().all(|r| r.brand != "A"));
    }

    #[test]
    fn malformed_upload_keeps_previous_dataset() {
        let mut session = Session::new();
        let before = session.upload(FIRST).unwrap();
        let err = session.upload(br#"[{"brand":"A""#).unwrap_err();
        assert!(err.message().starts_with("invalid JSON"));
        assert!(Arc::ptr_eq(&before, &session.dataset().unwrap()));
    }

    #[test]
    fn bad_date_upload_keeps_previous_dataset() {
        let mut session = Session::new();
        let before = session.upload(FIRST).unwrap();
        let bad = String::from_utf8_lossy(FIRST).replace("2023-07-15T14:30:00", "not-a-date");
        assert!(session.upload(bad.as_bytes()).is_err());
        assert!(Arc::ptr_eq(&before, &session.dataset().unwrap()));
    }

    #[test]
    fn replace_installs_normalized_dataset() {
        let mut session = Session::new();
        let before = session.upload(FIRST).unwrap();
        let dataset = normalize(SECOND).unwrap();
        let installed = session.replace(dataset);
        assert_eq!(installed.len(), 2);
        assert!(!Arc::ptr_eq(&before, &installed));
        assert!(Arc::ptr_eq(&installed, &session.dataset().unwrap()));
        assert!(session.loaded_at().is_some());
    }

    #[test]
    fn replace_with_empty_dataset_still_replaces() {
        let mut session = Session::new();
        session.upload(FIRST).unwrap();
        session.replace(Dataset::default());
        assert!(!session.is_empty());
        assert_eq!(session.dataset().map(|d| d.len()), Some(0));
    }

    #[test]
    fn failed_first_upload_leaves_session_empty() {
        let mut session = Session::new();
        assert!(session.upload(b"nope").is_err());
        assert!(session.is_empty());
    }
}
