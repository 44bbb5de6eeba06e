use chrono::NaiveDate;
use std::fmt::Debug;

use crate::{components::collection::Collection, errors::Result};

/// Provider of dated image collections, usually a remote service.
///
/// Failures to reach the provider, unknown ids or unusable date ranges are
/// reported as [crate::BandscaleError::SourceUnavailable].
pub trait ImageSource: Debug {
    /// Images of `collection_id` acquired in `[start, end)`.
    fn fetch_collection(
        &self,
        collection_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Collection>;
}

/// In-memory implementation
pub mod memory_source {
    use super::*;
    use crate::errors::BandscaleError;
    use log::info;
    use std::collections::HashMap;

    /// Serves collections registered up front.
    #[derive(Debug, Default)]
    pub struct MemorySource {
        collections: HashMap<String, Collection>,
    }

    impl MemorySource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers `collection` under its own id, replacing any previous one.
        pub fn with_collection(mut self, collection: Collection) -> Self {
            self.collections
                .insert(collection.id().to_string(), collection);
            self
        }
    }

    impl ImageSource for MemorySource {
        fn fetch_collection(
            &self,
            collection_id: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Collection> {
            if start >= end {
                return Err(BandscaleError::SourceUnavailable(format!(
                    "empty date range {start}..{end} for `{collection_id}`"
                )));
            }
            let collection = self
                .collections
                .get(collection_id)
                .ok_or_else(|| {
                    BandscaleError::SourceUnavailable(format!(
                        "unknown collection `{collection_id}`"
                    ))
                })?
                .filter_date(start, end);
            info!("fetched {collection:?}");
            Ok(collection)
        }
    }
}
