use std::path::Path;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use context_chunker::{Chunker, ChunkerConfig};
use context_protocol::capability::Embedder;
use context_protocol::config::EmbeddingConfig;
use context_protocol::model::{Chunk, ChunkMetadata, FileHash, Project};
use context_storage::{content_hash_of, Storage};

use crate::error::{PipelineError, Result};
use crate::index_state::Watermark;
use crate::scanner::{FileScanner, ScanConfig, ScannedFile};

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    /// Chunks produced by the chunker and handed to the embedder,
    /// regardless of whether their batch ultimately embedded successfully.
    pub chunks_created: usize,
    /// Chunks that were actually staged and committed. Lower than
    /// `chunks_created` when one or more batches hit a
    /// `TransientBatchError` and were skipped rather than aborting the run.
    pub chunks_indexed: usize,
    pub duration_ms: u64,
    /// Per-stage wall-clock time: `scan`, `chunk_embed`, `store`.
    pub per_stage_ms: std::collections::BTreeMap<String, u64>,
    /// `chunks_indexed` minus the project's previously recorded chunk
    /// count; negative when a re-index shrinks the project.
    pub size_delta: i64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Emitted at each stage boundary so a caller (CLI progress bar, streaming
/// tool result, health snapshot) can observe pipeline progress without the
/// pipeline depending on how that caller renders it.
#[derive(Debug, Clone)]
pub enum StageEvent {
    ScanStarted,
    ScanCompleted { files: usize },
    ChunkingProgress { files_done: usize, files_total: usize },
    EmbeddingProgress { chunks_done: usize, chunks_total: usize },
    Staging,
    Committed { chunks: usize },
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub scan: ScanConfig,
    pub chunker: ChunkerConfig,
    pub embedding: EmbeddingConfig,
    /// Chunks are embedded and staged in batches this large, so a
    /// cancellation check runs at least this often.
    pub stage_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            chunker: ChunkerConfig::default(),
            embedding: EmbeddingConfig::default(),
            stage_batch_size: 64,
        }
    }
}

/// Scans a project, chunks its files, embeds the chunks, and stages them
/// into storage behind an atomic swap. Cancellation is cooperative: the
/// token is checked between batches, and a cancelled run leaves the
/// previously-committed index untouched by aborting the staging area.
pub struct Pipeline {
    storage: Arc<Storage>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(storage: Arc<Storage>, embedder: Arc<dyn Embedder>, config: PipelineConfig) -> Self {
        let chunker = Chunker::new(config.chunker.clone());
        Self {
            storage,
            embedder,
            chunker,
            config,
        }
    }

    pub async fn run(
        &self,
        project: &Project,
        on_event: &mut (dyn FnMut(StageEvent) + Send),
        cancel: CancellationToken,
    ) -> Result<IndexStats> {
        let start = Instant::now();
        let root = project.root_path.clone();
        let project_id = project.id.clone();

        log::info!("indexing project {} at {}", project_id, root.display());

        on_event(StageEvent::ScanStarted);
        let scan_start = Instant::now();
        let scan_config = self.config.scan.clone();
        let root_for_scan = root.clone();
        let files: Vec<ScannedFile> = tokio::task::spawn_blocking(move || {
            FileScanner::with_config(&root_for_scan, scan_config).scan()
        })
        .await?;
        let mut stats = IndexStats::default();
        stats.per_stage_ms.insert("scan".to_string(), scan_start.elapsed().as_millis() as u64);
        on_event(StageEvent::ScanCompleted { files: files.len() });

        if cancel.is_cancelled() {
            on_event(StageEvent::Cancelled);
            return Err(PipelineError::Cancelled);
        }

        let storage = Arc::clone(&self.storage);
        let pid = project_id.clone();
        tokio::task::spawn_blocking(move || storage.begin_staging(&pid)).await??;

        let mut batch: Vec<Chunk> = Vec::new();
        let files_total = files.len();
        let chunk_embed_start = Instant::now();
        let mut store_ms: u64 = 0;

        for (idx, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                self.abort(&project_id).await;
                on_event(StageEvent::Cancelled);
                return Err(PipelineError::Cancelled);
            }

            let relative_path = relative_path_of(&root, &file.path)?;
            let content = match tokio::fs::read_to_string(&file.path).await {
                Ok(content) => content,
                Err(_) => {
                    stats.files_skipped += 1;
                    continue;
                }
            };

            let storage = Arc::clone(&self.storage);
            let file_hash = FileHash {
                project_id: project_id.clone(),
                relative_path: relative_path.clone(),
                content_hash: content_hash_of(&content),
                indexed_at: now_millis(),
            };
            tokio::task::spawn_blocking(move || storage.upsert_file_hash(&file_hash)).await??;

            let chunk_result = self.chunker.chunk_file(&relative_path, &content);
            stats.files_skipped += chunk_result.skipped.len();
            if chunk_result.chunks.is_empty() {
                on_event(StageEvent::ChunkingProgress {
                    files_done: idx + 1,
                    files_total,
                });
                continue;
            }

            stats.chunks_created += chunk_result.chunks.len();
            let texts: Vec<String> = chunk_result.chunks.iter().map(|c| c.content.clone()).collect();

            // A batch that fails after retries/fallback is a
            // `TransientBatchError`: it is recorded and the pipeline moves
            // on to the next file rather than aborting the whole run.
            let embed_outcome = tokio::select! {
                result = self.embedder.embed_batch(&texts) => result,
                _ = cancel.cancelled() => {
                    self.abort(&project_id).await;
                    on_event(StageEvent::Cancelled);
                    return Err(PipelineError::Cancelled);
                }
            };
            let vectors = match embed_outcome {
                Ok(vectors) => vectors,
                Err(err) => {
                    let message = format!("embedding batch failed for {relative_path}: {err}");
                    log::warn!("{message}");
                    stats.errors.push(message);
                    on_event(StageEvent::ChunkingProgress {
                        files_done: idx + 1,
                        files_total,
                    });
                    continue;
                }
            };

            for (piece, vector) in chunk_result.chunks.into_iter().zip(vectors.into_iter()) {
                batch.push(Chunk {
                    id: Uuid::new_v4().to_string(),
                    project_id: project_id.clone(),
                    content: piece.content,
                    content_type: piece.content_type,
                    language: piece.language,
                    relative_path: piece.relative_path,
                    start_line: piece.start_line,
                    end_line: piece.end_line,
                    vector,
                    metadata: ChunkMetadata {
                        symbol_name: piece.symbol_name,
                        ..ChunkMetadata::default()
                    },
                });
            }

            on_event(StageEvent::ChunkingProgress {
                files_done: idx + 1,
                files_total,
            });
            on_event(StageEvent::EmbeddingProgress {
                chunks_done: stats.chunks_indexed + batch.len(),
                chunks_total: stats.chunks_created,
            });

            if batch.len() >= self.config.stage_batch_size {
                let store_start = Instant::now();
                stats.chunks_indexed += self.stage_batch(&mut batch).await?;
                store_ms += store_start.elapsed().as_millis() as u64;
                on_event(StageEvent::Staging);
            }
        }

        if !batch.is_empty() {
            let store_start = Instant::now();
            stats.chunks_indexed += self.stage_batch(&mut batch).await?;
            store_ms += store_start.elapsed().as_millis() as u64;
            on_event(StageEvent::Staging);
        }
        stats
            .per_stage_ms
            .insert("chunk_embed".to_string(), chunk_embed_start.elapsed().as_millis() as u64 - store_ms);

        if cancel.is_cancelled() {
            self.abort(&project_id).await;
            on_event(StageEvent::Cancelled);
            return Err(PipelineError::Cancelled);
        }

        let store_start = Instant::now();
        let storage = Arc::clone(&self.storage);
        let pid = project_id.clone();
        let committed = tokio::task::spawn_blocking(move || storage.commit_staging(&pid)).await??;
        store_ms += store_start.elapsed().as_millis() as u64;
        stats.per_stage_ms.insert("store".to_string(), store_ms);

        stats.chunks_indexed = committed;
        stats.size_delta = committed as i64 - project.chunk_count as i64;
        stats.files_scanned = files.len() - stats.files_skipped;
        stats.duration_ms = start.elapsed().as_millis() as u64;
        if !stats.errors.is_empty() {
            stats.warnings.push(format!(
                "{} file batch(es) failed to embed and were skipped",
                stats.errors.len()
            ));
        }
        log::info!(
            "committed {} chunks for project {} in {}ms",
            committed,
            project_id,
            stats.duration_ms
        );
        on_event(StageEvent::Committed { chunks: committed });

        Ok(stats)
    }

    async fn stage_batch(&self, batch: &mut Vec<Chunk>) -> Result<usize> {
        let storage = Arc::clone(&self.storage);
        let chunks = std::mem::take(batch);
        let staged = tokio::task::spawn_blocking(move || storage.stage_chunk_batch(&chunks)).await??;
        Ok(staged)
    }

    async fn abort(&self, project_id: &str) {
        let storage = Arc::clone(&self.storage);
        let pid = project_id.to_string();
        let _ = tokio::task::spawn_blocking(move || storage.abort_staging(&pid)).await;
    }
}

/// Computes the watermark snapshot used by `assess_staleness` to decide
/// whether a project needs re-indexing.
pub fn compute_watermark(files: &[ScannedFile]) -> Watermark {
    let file_count = files.len() as u64;
    let max_mtime_ms = files.iter().map(|f| f.mtime_ms).max().unwrap_or(0);
    let total_bytes = files.iter().map(|f| f.size_bytes).sum();
    Watermark {
        file_count,
        max_mtime_ms,
        total_bytes,
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn relative_path_of(root: &Path, path: &Path) -> Result<String> {
    path.strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .map_err(|_| PipelineError::InvalidPath(path.display().to_string()))
}
