use std::sync::Arc;

use futures::future::join_all;

use crate::store::{DocumentStore, StoreResult};

use super::model::Location;

/// Resolves location ids into [`Location`] records with `in` queries no larger than
/// the store's batch ceiling.
#[derive(Clone)]
pub struct BatchLocationFetcher {
    store: Arc<dyn DocumentStore>,
    collection: String,
    likes_field: String,
    max_batch_size: Option<usize>,
}

impl BatchLocationFetcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        likes_field: impl Into<String>,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            likes_field: likes_field.into(),
            max_batch_size: None,
        }
    }

    /// Caps chunks below the store's own ceiling. Larger values are ignored.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    /// Number of ids sent per query.
    pub fn batch_size(&self) -> usize {
        let ceiling = self.store.max_batch_size().max(1);
        self.max_batch_size
            .map_or(ceiling, |size| size.min(ceiling))
            .max(1)
    }

    /// Fetches the locations named by `ids`.
    ///
    /// Chunks are queried concurrently and results are concatenated in chunk order.
    /// Ids without a document are omitted, and a failing chunk is logged and skipped
    /// without affecting the others. An empty `ids` issues no query.
    pub async fn fetch_by_ids(&self, ids: &[String]) -> Vec<Location> {
        let ids: Vec<String> = ids
            .iter()
            .filter(|id| {
                let usable = !id.is_empty() && !id.contains('/');
                if !usable {
                    log::debug!("skipping unusable location id {id:?}");
                }
                usable
            })
            .cloned()
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }

        let batch_size = self.batch_size();
        let chunks: Vec<&[String]> = ids.chunks(batch_size).collect();
        let results = join_all(chunks.iter().map(|chunk| self.fetch_chunk(chunk))).await;

        let mut locations = Vec::with_capacity(ids.len());
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(mut chunk) => locations.append(&mut chunk),
                Err(err) => log::warn!(
                    "location batch {} of {} failed: {err}",
                    index + 1,
                    chunks.len()
                ),
            }
        }
        locations
    }

    async fn fetch_chunk(&self, ids: &[String]) -> StoreResult<Vec<Location>> {
        let snapshots = self.store.query_by_ids_in(&self.collection, ids).await?;
        Ok(snapshots
            .into_iter()
            .filter_map(|snapshot| Location::from_snapshot(snapshot, &self.likes_field))
            .collect())
    }
}
