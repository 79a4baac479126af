//! Job directory packaging

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ExportError;

const ARCHIVE_ZSTD_LEVEL: i32 = 3;

/// Package a finished job directory into
/// `{output_dir}/dataset_{dataset_id}_{job_id}.tar.zst` and remove the
/// directory, returning the archive file name
///
/// Entry paths inside the archive are relative to the job directory. The
/// tar+zstd work is blocking and runs off the async executor.
pub async fn package_job_dir(
    job_dir: &Path,
    output_dir: &Path,
    dataset_id: &str,
    job_id: &str,
) -> Result<String, ExportError> {
    let archive_name = format!("dataset_{dataset_id}_{job_id}.tar.zst");
    let archive_path = output_dir.join(&archive_name);
    let source = job_dir.to_path_buf();

    let archive_for_task = archive_path.clone();
    tokio::task::spawn_blocking(move || -> Result<(), ExportError> {
        let file = std::fs::File::create(&archive_for_task)?;
        let encoder = zstd::Encoder::new(file, ARCHIVE_ZSTD_LEVEL)?;
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all(".", &source)?;
        builder.into_inner()?.finish()?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)??;

    tokio::fs::remove_dir_all(job_dir).await?;
    debug!(archive = %archive_path.display(), "packaged job directory");
    Ok(archive_name)
}

/// Best-effort removal of a job directory after failure
///
/// An absent directory is the expected case when the job failed before
/// creating it.
pub async fn cleanup_job_dir(job_dir: &Path) {
    match tokio::fs::remove_dir_all(job_dir).await {
        Ok(()) => debug!(job_dir = %job_dir.display(), "removed job directory"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(job_dir = %job_dir.display(), error = %e, "job directory cleanup failed"),
    }
}
