//! Export service facade

use std::sync::Arc;

use tracing::info;

use contracts::{ChunkStore, DatasetWriter, ExportConfig, JobId, JobStatus, MetadataStore, StreamConfig};

use crate::registry::JobRegistry;
use crate::worker::{run_export_job, JobContext};

/// Submits export jobs and answers status queries
///
/// Cheap to clone; clones share the registry and collaborators. Each
/// submission spawns one detached worker task - the service never blocks on
/// job completion.
pub struct ExportService<C, M, W> {
    ctx: Arc<JobContext<C, M, W>>,
}

impl<C, M, W> Clone for ExportService<C, M, W> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
        }
    }
}

impl<C, M, W> ExportService<C, M, W>
where
    C: ChunkStore + Send + Sync + 'static,
    M: MetadataStore + Send + Sync + 'static,
    W: DatasetWriter + Send + Sync + 'static,
{
    pub fn new(
        chunk_store: Arc<C>,
        metadata_store: Arc<M>,
        writer: Arc<W>,
        registry: JobRegistry,
        stream: StreamConfig,
        export: ExportConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(JobContext {
                chunk_store,
                metadata_store,
                writer,
                registry,
                stream,
                export,
            }),
        }
    }

    /// Submit an export of one dataset; returns immediately with the job id
    pub fn submit(&self, dataset_id: &str) -> JobId {
        let job_id = uuid::Uuid::new_v4().simple().to_string();
        self.ctx.registry.submit(&job_id);
        info!(job_id, dataset_id, "export job submitted");
        tokio::spawn(run_export_job(
            self.ctx.clone(),
            job_id.clone(),
            dataset_id.to_string(),
        ));
        job_id
    }

    /// Status of a submitted job; `None` for unknown or pruned ids
    pub fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.ctx.registry.get(job_id)
    }

    /// The shared registry (for pruning and listing)
    pub fn registry(&self) -> &JobRegistry {
        &self.ctx.registry
    }
}
