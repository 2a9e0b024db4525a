use hnsw_rs::prelude::*;

use context_protocol::{ContentType, SearchFilter};

use crate::error::{DenseIndexError, Result};

/// One entry handed to `DenseIndex::build`: a chunk's id, embedding, and
/// the metadata a `SearchFilter` can match against.
#[derive(Debug, Clone)]
pub struct DenseIndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub content_type: ContentType,
    pub language: Option<String>,
}

/// A single project's dense vector index. Cosine distance over
/// L2-normalized embeddings, built once per (re-)index and held
/// immutable thereafter — a changed project gets a freshly built index,
/// never an in-place mutation.
pub struct DenseIndex {
    hnsw: Hnsw<'static, f32, DistCosine>,
    ids: Vec<String>,
    content_types: Vec<ContentType>,
    languages: Vec<Option<String>>,
    dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct DenseIndexConfig {
    pub max_connections: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
}

impl Default for DenseIndexConfig {
    fn default() -> Self {
        Self {
            max_connections: 16,
            ef_construction: 200,
            ef_search: 100,
        }
    }
}

impl DenseIndex {
    /// Builds an index over `entries`. All vectors must share the same
    /// dimensionality.
    pub fn build(entries: &[DenseIndexEntry], config: &DenseIndexConfig) -> Result<Self> {
        if entries.is_empty() {
            let hnsw = Hnsw::new(config.max_connections, 1, 16, config.ef_construction, DistCosine {});
            return Ok(Self {
                hnsw,
                ids: Vec::new(),
                content_types: Vec::new(),
                languages: Vec::new(),
                dimensions: 0,
            });
        }

        let dimensions = entries[0].vector.len();
        for entry in entries {
            if entry.vector.len() != dimensions {
                return Err(DenseIndexError::DimensionMismatch {
                    expected: dimensions,
                    found: entry.vector.len(),
                });
            }
        }

        let nb_layer = 16usize.min(((entries.len() as f32).ln().trunc() as usize).max(1));
        let hnsw = Hnsw::new(
            config.max_connections,
            entries.len(),
            nb_layer,
            config.ef_construction,
            DistCosine {},
        );

        let mut ids = Vec::with_capacity(entries.len());
        let mut content_types = Vec::with_capacity(entries.len());
        let mut languages = Vec::with_capacity(entries.len());
        let data: Vec<(&Vec<f32>, usize)> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                ids.push(entry.id.clone());
                content_types.push(entry.content_type);
                languages.push(entry.language.clone());
                (&entry.vector, i)
            })
            .collect();
        hnsw.parallel_insert(&data);

        Ok(Self {
            hnsw,
            ids,
            content_types,
            languages,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns up to `k` nearest chunk ids matching `filter` (if any), as
    /// (id, similarity) pairs with similarity = 1 - cosine distance,
    /// highest first. When a filter is set, candidates are over-fetched
    /// from the underlying HNSW graph so that filtering rarely starves
    /// the result set below `k`.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<(String, f32)>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(DenseIndexError::DimensionMismatch {
                expected: self.dimensions,
                found: query.len(),
            });
        }

        let needs_filter = filter.is_some_and(|f| !f.is_empty());
        let fetch_k = if needs_filter {
            (k.saturating_mul(4).max(k + 16)).min(self.len())
        } else {
            k
        };

        let neighbours = self.hnsw.search(query, fetch_k, ef_search);
        let matches = neighbours.into_iter().filter_map(|n| {
            let id = self.ids.get(n.d_id)?;
            if let Some(filter) = filter {
                let content_type = self.content_types[n.d_id];
                let language = self.languages[n.d_id].as_deref();
                if !filter.matches(content_type, language) {
                    return None;
                }
            }
            Some((id.clone(), 1.0 - n.distance))
        });

        Ok(matches.take(k).collect())
    }
}
