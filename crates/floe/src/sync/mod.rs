//! Incremental sync.
//!
//! Streams are processed one at a time, files within a stream in ascending
//! `(last_modified, path)` order, and batches within a file in sequence.
//! A table's bookmark is advanced and a STATE message written right after
//! the last record of each file, so a restarted run resumes after the last
//! completed file.
//!
//! - `state`: Per-table bookmarks
//! - `transform`: Row coercion against the declared schema

pub mod state;
pub mod transform;

use std::time::Instant;

use futures::TryStreamExt;
use tracing::{debug, info};

use floe_core::emit;
use floe_core::metrics::events::{FileSynced, StateEmitted};

pub use state::{Bookmark, SyncState};
pub use transform::Transformer;

use crate::catalog::{Catalog, StreamDescriptor};
use crate::config::{Config, TableConfig};
use crate::error::{ConfigError, TapError};
use crate::protocol::{Emitter, Message};
use crate::source::{
    ObjectCatalog, ObjectDescriptor, TableMatcher, batch_to_rows, normalize_batch,
    project_batch,
};

/// Run a sync and return the final state.
pub async fn sync<E: Emitter>(
    config: &Config,
    objects: &dyn ObjectCatalog,
    catalog: &Catalog,
    state: SyncState,
    emitter: &mut E,
) -> Result<SyncState, TapError> {
    SyncEngine::new(config, objects, emitter, state)
        .run(catalog)
        .await
}

/// Owns the state for the duration of one sync run.
pub struct SyncEngine<'a, E: Emitter> {
    config: &'a Config,
    objects: &'a dyn ObjectCatalog,
    emitter: &'a mut E,
    state: SyncState,
}

impl<'a, E: Emitter> SyncEngine<'a, E> {
    pub fn new(
        config: &'a Config,
        objects: &'a dyn ObjectCatalog,
        emitter: &'a mut E,
        state: SyncState,
    ) -> Self {
        Self {
            config,
            objects,
            emitter,
            state,
        }
    }

    /// Sync every selected stream of `catalog`.
    ///
    /// Every stream must name a configured table; this is checked before
    /// anything is emitted.
    pub async fn run(mut self, catalog: &Catalog) -> Result<SyncState, TapError> {
        info!(streams = catalog.streams.len(), "Starting sync");

        let config = self.config;
        let mut selected = Vec::new();
        for stream in &catalog.streams {
            let table = config.table(&stream.tap_stream_id).ok_or_else(|| {
                ConfigError::UnknownStream {
                    stream: stream.tap_stream_id.clone(),
                }
            })?;

            if stream.is_selected() {
                selected.push((stream, table));
            } else {
                info!(target = %stream.tap_stream_id, "Skipping stream, not selected");
            }
        }

        for (stream, table) in selected {
            self.sync_stream(stream, table).await?;
        }

        info!("Finished sync");
        Ok(self.state)
    }

    async fn sync_stream(
        &mut self,
        stream: &StreamDescriptor,
        table: &TableConfig,
    ) -> Result<(), TapError> {
        let stream_id = stream.tap_stream_id.as_str();
        info!(target = %stream_id, "Syncing stream");

        let key_properties = stream
            .key_properties()
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| table.key_properties.clone());
        self.emitter.emit(Message::Schema {
            stream: stream_id.to_string(),
            schema: stream.schema.clone(),
            key_properties,
        })?;

        let matcher = TableMatcher::new(table)?;
        let files = self.pending_files(&matcher).await?;

        let transformer = Transformer::new(stream_id, &stream.schema, &stream.metadata);
        for object in &files {
            self.sync_file(stream_id, &transformer, object).await?;
        }

        info!(target = %stream_id, files = files.len(), "Finished syncing stream");
        Ok(())
    }

    /// Files modified after the table's bookmark, oldest first.
    async fn pending_files(
        &self,
        matcher: &TableMatcher,
    ) -> Result<Vec<ObjectDescriptor>, TapError> {
        let table = matcher.table();
        let modified_since = self
            .state
            .bookmark(table)
            .unwrap_or(self.config.start_date);

        let matched = matcher.resolve(self.objects).await?;
        let total = matched.len();

        let mut pending: Vec<_> = matched
            .into_iter()
            .filter(|o| o.size_bytes > 0 && o.last_modified > modified_since)
            .collect();
        pending.sort_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.path.cmp(&b.path))
        });

        info!(
            target = %table,
            modified_since = %modified_since,
            matched = total,
            pending = pending.len(),
            "Resolved files to sync"
        );
        Ok(pending)
    }

    async fn sync_file(
        &mut self,
        stream_id: &str,
        transformer: &Transformer,
        object: &ObjectDescriptor,
    ) -> Result<(), TapError> {
        let start = Instant::now();
        debug!(target = %stream_id, path = %object.path, "Syncing file");

        let mut batches = self
            .objects
            .read_batches(object, self.config.batch_size)
            .await?;

        let mut records = 0u64;
        while let Some(batch) = batches.try_next().await? {
            let batch = project_batch(&batch, transformer.field_names())?;
            let batch = normalize_batch(&batch)?;
            for row in batch_to_rows(&batch)? {
                let record = transformer.transform(row)?;
                self.emitter.emit(Message::Record {
                    stream: stream_id.to_string(),
                    record,
                })?;
                records += 1;
            }
        }

        self.state.advance(stream_id, object.last_modified);
        self.emitter.emit(Message::State {
            value: self.state.clone(),
        })?;

        emit!(StateEmitted {
            target: stream_id.to_string(),
        });
        emit!(FileSynced {
            records,
            duration: start.elapsed(),
            target: stream_id.to_string(),
        });
        info!(target = %stream_id, path = %object.path, records, "Finished syncing file");
        Ok(())
    }
}
