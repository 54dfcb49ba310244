//! File jobs: batch sanitization and recovery on bounded workers
//!
//! Jobs are independent and share only the read-only pattern registry.
//! Outputs are written to a temporary file in the destination directory and
//! atomically promoted on success, so a failed or timed-out job never leaves
//! a partial file visible.

use crate::pipeline::{self, SanitizeOptions};
use sanitext_core::{Error, IntegrityVerdict, Result};
use sanitext_detect::PatternRegistry;
use sanitext_vault::codec;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{error, info};

/// Per-file size cap, keeps aggregate memory bounded across workers
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Batch execution settings
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Directory sanitized files and artifacts are written into
    pub output_dir: PathBuf,

    /// Worker bound for the batch
    pub max_concurrency: usize,

    /// Reject inputs larger than this
    pub max_file_bytes: u64,
}

impl JobConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_concurrency: 4,
            max_file_bytes: MAX_FILE_BYTES,
        }
    }
}

/// Outcome of one successful sanitize job
#[derive(Debug)]
pub struct SanitizedFile {
    pub input: PathBuf,
    pub sanitized_path: PathBuf,
    pub artifact_path: PathBuf,
    pub matches: usize,
}

/// Sanitize a batch of files. Jobs run on up to `max_concurrency` workers;
/// each file gets its own result so one failure never aborts the batch.
pub async fn sanitize_files(
    files: Vec<PathBuf>,
    password: String,
    options: SanitizeOptions,
    config: JobConfig,
) -> Result<Vec<(PathBuf, Result<SanitizedFile>)>> {
    std::fs::create_dir_all(&config.output_dir)?;

    let registry = Arc::new(pipeline::load_registry(&options)?);
    let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let registry = Arc::clone(&registry);
        let semaphore = Arc::clone(&semaphore);
        let password = password.clone();
        let options = options.clone();
        let config = config.clone();

        handles.push(tokio::spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    sanitize_one(&registry, &path, &password, &options, &config).await
                }
                Err(e) => Err(Error::Internal(format!("worker pool closed: {}", e))),
            };
            (path, result)
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(
            handle
                .await
                .map_err(|e| Error::Internal(format!("job panicked: {}", e)))?,
        );
    }
    Ok(results)
}

async fn sanitize_one(
    registry: &Arc<PatternRegistry>,
    path: &Path,
    password: &str,
    options: &SanitizeOptions,
    config: &JobConfig,
) -> Result<SanitizedFile> {
    let text = read_text(path, config.max_file_bytes)?;

    let registry = Arc::clone(registry);
    let password = password.to_string();
    let opts = options.clone();
    let compute = tokio::task::spawn_blocking(move || {
        pipeline::sanitize_with_registry(&registry, &text, &password, &opts)
    });

    // The deadline covers the CPU-bound pipeline; the atomic promotion below
    // only happens for jobs that finished in time.
    let (result, artifact) = match options.timeout {
        Some(limit) => timeout(limit, compute)
            .await
            .map_err(|_| Error::Timeout(limit.as_secs()))?
            .map_err(|e| Error::Internal(format!("sanitize worker failed: {}", e)))??,
        None => compute
            .await
            .map_err(|e| Error::Internal(format!("sanitize worker failed: {}", e)))??,
    };

    let (sanitized_name, artifact_name) = output_names(path);
    let sanitized_path = atomic_write(
        &config.output_dir,
        &sanitized_name,
        result.sanitized_text.as_bytes(),
    )?;
    let artifact_json = codec::to_json(&artifact)?;
    let artifact_path = atomic_write(&config.output_dir, &artifact_name, artifact_json.as_bytes())?;

    info!(
        input = %path.display(),
        output = %sanitized_path.display(),
        matches = result.entries.len(),
        "file sanitized"
    );

    Ok(SanitizedFile {
        input: path.to_path_buf(),
        sanitized_path,
        artifact_path,
        matches: result.entries.len(),
    })
}

/// Recover one file from its artifact, writing the restored text atomically
/// to `output_path`. Returns the integrity verdict; the output is written
/// even when the verdict fails so the caller can inspect it.
pub async fn recover_file(
    sanitized_path: &Path,
    artifact_path: &Path,
    password: &str,
    output_path: &Path,
    deadline: Option<Duration>,
) -> Result<IntegrityVerdict> {
    let sanitized_text = read_text(sanitized_path, MAX_FILE_BYTES)?;
    let artifact_json = read_text(artifact_path, MAX_FILE_BYTES)?;
    let artifact = codec::from_json(&artifact_json)?;

    let password = password.to_string();
    let compute = tokio::task::spawn_blocking(move || {
        pipeline::recover(&sanitized_text, &artifact, &password)
    });

    let (restored, verdict) = match deadline {
        Some(limit) => timeout(limit, compute)
            .await
            .map_err(|_| Error::Timeout(limit.as_secs()))?
            .map_err(|e| Error::Internal(format!("recover worker failed: {}", e)))??,
        None => compute
            .await
            .map_err(|e| Error::Internal(format!("recover worker failed: {}", e)))??,
    };

    if !verdict.passed {
        error!(
            output = %output_path.display(),
            "restored content fails integrity verification"
        );
    }

    let dir = output_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let name = output_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Input("output path has no file name".to_string()))?;
    atomic_write(dir, name, restored.as_bytes())?;

    Ok(verdict)
}

fn read_text(path: &Path, cap: u64) -> Result<String> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| Error::Input(format!("cannot read {}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(Error::Input(format!("{} is not a file", path.display())));
    }
    if metadata.len() > cap {
        return Err(Error::Input(format!(
            "{} is {} bytes, over the {} byte cap",
            path.display(),
            metadata.len(),
            cap
        )));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| Error::Input(format!("cannot read {}: {}", path.display(), e)))?;
    String::from_utf8(bytes)
        .map_err(|_| Error::Input(format!("{} is not valid UTF-8", path.display())))
}

/// `report.txt` becomes `report_sanitized_<timestamp>_<suffix>.txt` plus a
/// `.recovery.json` artifact with the same stem
fn output_names(input: &Path) -> (String, String) {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let extension = input
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("txt");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let suffix: [u8; 4] = rand::random();
    let suffix: String = suffix.iter().map(|b| format!("{:02x}", b)).collect();

    let base = format!("{}_sanitized_{}_{}", stem, timestamp, suffix);
    (
        format!("{}.{}", base, extension),
        format!("{}.recovery.json", base),
    )
}

fn atomic_write(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;

    let final_path = dir.join(name);
    tmp.persist(&final_path)
        .map_err(|e| Error::Io(e.error))?;
    Ok(final_path)
}
