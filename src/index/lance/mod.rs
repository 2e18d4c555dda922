
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{SearchResult, VectorIndex, validate_batch};
use crate::embeddings::Chunk;
use crate::{AskError, Result};

const TABLE_NAME: &str = "passages";

/// LanceDB-backed index persisted in a directory.
/// Survives restarts; only one writer may use the directory at a time.
pub struct LanceIndex {
    connection: Connection,
    path: PathBuf,
}

impl std::fmt::Debug for LanceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanceIndex")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl LanceIndex {
    /// Open (or create) the vector directory at `path`
    #[inline]
    pub async fn open(path: &Path) -> Result<Self> {
        debug!("Initializing LanceDB at path: {:?}", path);

        std::fs::create_dir_all(path).map_err(|e| {
            AskError::Index(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", path.display());

        let connection = match lancedb::connect(&uri).execute().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to connect to LanceDB: {}", e);

                let error_msg = e.to_string().to_lowercase();
                if error_msg.contains("corrupt") || error_msg.contains("malformed") {
                    warn!("Database corruption detected, attempting recovery");
                    Self::attempt_corruption_recovery(path)?;

                    lancedb::connect(&uri).execute().await.map_err(|e| {
                        AskError::Index(format!(
                            "Failed to connect to LanceDB after recovery: {}",
                            e
                        ))
                    })?
                } else {
                    return Err(AskError::Index(format!(
                        "Failed to connect to LanceDB: {}",
                        e
                    )));
                }
            }
        };

        Ok(Self {
            connection,
            path: path.to_path_buf(),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("content", DataType::Utf8, false),
            Field::new("page_number", DataType::UInt32, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("start_offset", DataType::UInt32, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    fn create_record_batch(
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
        vector_dim: usize,
    ) -> Result<RecordBatch> {
        let created_at = chrono::Utc::now().to_rfc3339();

        let mut flat_values = Vec::with_capacity(chunks.len() * vector_dim);
        for vector in embeddings {
            flat_values.extend_from_slice(vector);
        }
        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| AskError::Index(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
            Arc::new(vector_array),
            Arc::new(StringArray::from_iter_values(
                chunks.iter().map(|c| c.content.as_str()),
            )),
            Arc::new(UInt32Array::from_iter_values(
                chunks.iter().map(|c| c.page_number),
            )),
            Arc::new(UInt32Array::from_iter_values(
                chunks.iter().map(|c| c.chunk_index as u32),
            )),
            Arc::new(UInt32Array::from_iter_values(
                chunks.iter().map(|c| c.start_offset as u32),
            )),
            Arc::new(StringArray::from_iter_values(
                chunks.iter().map(|_| created_at.as_str()),
            )),
        ];

        RecordBatch::try_new(Self::create_schema(vector_dim), arrays)
            .map_err(|e| AskError::Index(format!("Failed to create record batch: {}", e)))
    }

    async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to list tables: {}", e)))?;
        Ok(table_names.iter().any(|name| name == TABLE_NAME))
    }

    async fn drop_table_if_exists(&self) -> Result<()> {
        if self.table_exists().await? {
            info!("Dropping existing passages table");
            self.connection
                .drop_table(TABLE_NAME)
                .await
                .map_err(|e| AskError::Index(format!("Failed to drop table: {}", e)))?;
        }
        Ok(())
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>> {
        let ids = string_column(batch, "id")?;
        let contents = string_column(batch, "content")?;
        let page_numbers = u32_column(batch, "page_number")?;
        let chunk_indices = u32_column(batch, "chunk_index")?;
        let start_offsets = u32_column(batch, "start_offset")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let results = (0..batch.num_rows())
            .map(|row| {
                let distance = distances
                    .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

                SearchResult {
                    chunk: Chunk {
                        id: ids.value(row).to_string(),
                        content: contents.value(row).to_string(),
                        page_number: page_numbers.value(row),
                        chunk_index: chunk_indices.value(row) as usize,
                        start_offset: start_offsets.value(row) as usize,
                    },
                    // cosine distance to similarity, higher is better
                    score: 1.0 - distance,
                }
            })
            .collect();

        Ok(results)
    }

    fn attempt_corruption_recovery(db_path: &Path) -> Result<()> {
        warn!("Attempting database corruption recovery at {:?}", db_path);

        if db_path.exists() {
            let backup_path = db_path.with_extension("corrupted_backup");
            if let Err(e) = std::fs::rename(db_path, &backup_path) {
                error!("Failed to backup corrupted database: {}", e);
            } else {
                info!("Corrupted database backed up to {:?}", backup_path);
            }
        }

        if db_path.exists() {
            std::fs::remove_dir_all(db_path).map_err(|e| {
                AskError::Index(format!("Failed to remove corrupted database: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LanceIndex {
    async fn build(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        let vector_dim = validate_batch(&chunks, &embeddings)?;

        // never updated in place: every document gets a freshly created table
        self.drop_table_if_exists().await?;

        let record_batch = Self::create_record_batch(&chunks, &embeddings, vector_dim)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        self.connection
            .create_table(TABLE_NAME, reader)
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to create passages table: {}", e)))?;

        info!(
            "Stored {} passages ({} dimensions) in LanceDB at {:?}",
            chunks.len(),
            vector_dim,
            self.path
        );
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        debug!("Searching for similar vectors with limit: {}", k);

        if k == 0 || !self.table_exists().await? {
            return Ok(Vec::new());
        }

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to open table: {}", e)))?;

        let mut stream = table
            .vector_search(vector)
            .map_err(|e| AskError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to execute search: {}", e)))?;

        let mut results = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| AskError::Index(format!("Failed to read result stream: {}", e)))?
        {
            results.extend(Self::parse_search_batch(&batch)?);
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(k);

        debug!("Parsed {} search results from stream", results.len());
        Ok(results)
    }

    async fn len(&self) -> Result<usize> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to open table: {}", e)))?;

        table
            .count_rows(None)
            .await
            .map_err(|e| AskError::Index(format!("Failed to count rows: {}", e)))
    }

    fn backend(&self) -> &'static str {
        "lance"
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AskError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AskError::Index(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AskError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| AskError::Index(format!("Invalid {} column type", name)))
}
