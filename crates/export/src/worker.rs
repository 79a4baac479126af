//! Export worker task
//!
//! One invocation owns one job end to end. All intermediate output goes
//! under `{output_dir}/{job_id}`; success replaces that directory with the
//! archive, failure removes it best-effort so a dead job leaves nothing
//! behind but its terminal status.

use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use metrics::counter;
use tracing::{debug, info, warn};

use codec::adc_to_volts;
use contracts::{
    ChunkStore, DatasetWriter, ExportConfig, JobId, JobStatus, MetadataStore, RecordingMeta,
    SessionInfo, SignalMatrix, StreamConfig, CHANNEL_COUNT,
};

use crate::error::ExportError;
use crate::packaging::{cleanup_job_dir, package_job_dir};
use crate::registry::JobRegistry;

/// Everything a worker task needs, shared across jobs
pub(crate) struct JobContext<C, M, W> {
    pub chunk_store: Arc<C>,
    pub metadata_store: Arc<M>,
    pub writer: Arc<W>,
    pub registry: JobRegistry,
    pub stream: StreamConfig,
    pub export: ExportConfig,
}

/// Drive one export job to a terminal status
pub(crate) async fn run_export_job<C, M, W>(
    ctx: Arc<JobContext<C, M, W>>,
    job_id: JobId,
    dataset_id: String,
) where
    C: ChunkStore + Send + Sync,
    M: MetadataStore + Send + Sync,
    W: DatasetWriter + Send + Sync,
{
    let job_dir = ctx.export.output_dir.join(&job_id);

    match execute(&ctx, &job_id, &dataset_id, &job_dir).await {
        Ok(archive_name) => {
            info!(job_id, dataset_id, archive = %archive_name, "export job completed");
            counter!("neurowire_export_jobs_total", "outcome" => "completed").increment(1);
            ctx.registry.update(&job_id, JobStatus::completed(archive_name));
        }
        Err(e) => {
            warn!(job_id, dataset_id, error = %e, "export job failed");
            counter!("neurowire_export_jobs_total", "outcome" => "failed").increment(1);
            ctx.registry.update(&job_id, JobStatus::failed(e.to_string()));
            cleanup_job_dir(&job_dir).await;
        }
    }
}

async fn execute<C, M, W>(
    ctx: &JobContext<C, M, W>,
    job_id: &str,
    dataset_id: &str,
    job_dir: &std::path::Path,
) -> Result<String, ExportError>
where
    C: ChunkStore + Send + Sync,
    M: MetadataStore + Send + Sync,
    W: DatasetWriter + Send + Sync,
{
    ctx.registry
        .update(job_id, JobStatus::running(0, "initializing"));

    let sessions = ctx.metadata_store.list_sessions(dataset_id).await?;
    if sessions.is_empty() {
        return Err(ExportError::NoSessions {
            dataset_id: dataset_id.to_string(),
        });
    }

    tokio::fs::create_dir_all(job_dir).await?;

    let total = sessions.len();
    for (index, session) in sessions.iter().enumerate() {
        let progress = (index * 100 / total) as u8;
        ctx.registry.update(
            job_id,
            JobStatus::running(
                progress,
                format!(
                    "processing session {}/{}: {}",
                    index + 1,
                    total,
                    session.session_id
                ),
            ),
        );
        export_session(ctx, session, job_dir).await?;
    }

    ctx.registry
        .update(job_id, JobStatus::running(95, "compressing dataset"));
    package_job_dir(job_dir, &ctx.export.output_dir, dataset_id, job_id).await
}

/// Rebuild one session's recording and hand it to the writer
///
/// Sessions with no chunks or no decodable samples are skipped, not failed:
/// a partially recorded dataset still exports everything it has.
async fn export_session<C, M, W>(
    ctx: &JobContext<C, M, W>,
    session: &SessionInfo,
    job_dir: &std::path::Path,
) -> Result<(), ExportError>
where
    C: ChunkStore + Send + Sync,
    M: MetadataStore + Send + Sync,
    W: DatasetWriter + Send + Sync,
{
    let chunks = ctx.metadata_store.list_chunks(&session.session_id).await?;
    let Some(last_chunk) = chunks.last() else {
        warn!(session_id = %session.session_id, "session has no chunks, skipping");
        return Ok(());
    };

    // Fetches run ahead up to the configured width but land in recorded
    // chunk order; the stream is the ordering barrier before decompression.
    let fetches: Vec<_> = chunks
        .iter()
        .map(|chunk| {
            let store = ctx.chunk_store.clone();
            let key = chunk.object_key.clone();
            async move { store.fetch(&key).await }
        })
        .collect();
    let fetched: Vec<bytes::Bytes> = stream::iter(fetches)
        .buffered(ctx.export.fetch_concurrency.max(1))
        .try_collect()
        .await?;

    let mut compressed = Vec::with_capacity(fetched.iter().map(|b| b.len()).sum());
    for part in &fetched {
        compressed.extend_from_slice(part);
    }
    let raw = zstd::decode_all(compressed.as_slice())?;

    let frame = codec::decode(&raw);
    if frame.samples.is_empty() {
        warn!(session_id = %session.session_id, "session decoded to zero samples, skipping");
        return Ok(());
    }

    // The recorded end of the final chunk is the wall-clock instant of the
    // last sample, so it anchors the whole stitched stream.
    let timestamps = codec::reconstruct(&frame.samples, last_chunk.end_time)?;

    let mut data: Vec<Vec<f64>> = (0..CHANNEL_COUNT)
        .map(|_| Vec::with_capacity(frame.samples.len()))
        .collect();
    for sample in &frame.samples {
        for (ch, row) in data.iter_mut().enumerate() {
            row.push(adc_to_volts(sample.channels[ch]));
        }
    }
    let start_time = timestamps.first().copied().unwrap_or(session.start_time);
    let matrix = SignalMatrix { data, timestamps };

    let events = ctx.metadata_store.list_events(&session.session_id).await?;
    let meta = RecordingMeta {
        subject: session.user_id.clone(),
        session_id: session.session_id.clone(),
        task: session.session_kind.clone(),
        device_id: frame.device_id,
        start_time,
        sample_rate: ctx.stream.sample_rate,
        channel_names: ctx.stream.channel_names.clone(),
        events,
    };

    ctx.writer.write_recording(&matrix, &meta, job_dir).await?;
    debug!(
        session_id = %session.session_id,
        chunks = chunks.len(),
        samples = matrix.len(),
        "exported session"
    );
    Ok(())
}
