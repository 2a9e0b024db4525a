use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tokenizers::Tokenizer;

use context_protocol::capability::{Embedder, EmbedderError};

use crate::cache::EmbeddingCache;
use crate::error::LocalEmbedderError;

/// Local, ONNX-Runtime-backed embedder. Tokenizes with `tokenizers`, runs
/// the model through `ort`, mean-pools the token embeddings and L2
/// normalizes the result.
pub struct LocalOnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_id: String,
    dimensions: usize,
    cache: EmbeddingCache,
}

impl LocalOnnxEmbedder {
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        model_id: impl Into<String>,
        dimensions: usize,
        cache_capacity: usize,
    ) -> Result<Self, LocalEmbedderError> {
        let session = Session::builder()
            .map_err(|e| LocalEmbedderError::SessionLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| LocalEmbedderError::SessionLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| LocalEmbedderError::SessionLoad(e.to_string()))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| LocalEmbedderError::TokenizerLoad(e.to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model_id: model_id.into(),
            dimensions,
            cache: EmbeddingCache::new(cache_capacity),
        })
    }

    fn encode_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LocalEmbedderError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| LocalEmbedderError::Tokenize(e.to_string()))?;

        let batch = encodings.len();
        let seq_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);

        let mut input_ids = vec![0i64; batch * seq_len];
        let mut attention_mask = vec![0i64; batch * seq_len];
        for (row, encoding) in encodings.iter().enumerate() {
            for (col, (&id, &mask)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .enumerate()
            {
                input_ids[row * seq_len + col] = id as i64;
                attention_mask[row * seq_len + col] = mask as i64;
            }
        }

        let input_ids = Tensor::from_array(([batch, seq_len], input_ids))
            .map_err(|e| LocalEmbedderError::Inference(e.to_string()))?;
        let attention_mask_tensor = Tensor::from_array(([batch, seq_len], attention_mask.clone()))
            .map_err(|e| LocalEmbedderError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .expect("onnx session lock poisoned by a prior panic");
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask_tensor,
            ])
            .map_err(|e| LocalEmbedderError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| LocalEmbedderError::Inference(e.to_string()))?;
        let hidden = *shape.last().expect("model output has a hidden dimension") as usize;

        let mut result = Vec::with_capacity(batch);
        for row in 0..batch {
            let mut pooled = vec![0f32; hidden];
            let mut valid = 0usize;
            for col in 0..seq_len {
                if attention_mask[row * seq_len + col] == 0 {
                    continue;
                }
                valid += 1;
                let offset = (row * seq_len + col) * hidden;
                for h in 0..hidden {
                    pooled[h] += data[offset + h];
                }
            }
            let denom = valid.max(1) as f32;
            for v in pooled.iter_mut() {
                *v /= denom;
            }
            let norm = pooled.iter().map(|v| v * v).sum::<f32>().sqrt().max(1e-12);
            for v in pooled.iter_mut() {
                *v /= norm;
            }
            result.push(pooled);
        }
        Ok(result)
    }
}

#[async_trait]
impl Embedder for LocalOnnxEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut out = vec![Vec::new(); texts.len()];
        let mut misses = Vec::new();
        let mut miss_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = content_key(text);
            match self.cache.get(&key) {
                Some(vector) => out[i] = vector,
                None => {
                    misses.push(text.clone());
                    miss_indices.push((i, key));
                }
            }
        }

        if !misses.is_empty() {
            let computed = self
                .encode_blocking(&misses)
                .map_err(|e| EmbedderError::Malformed(e.to_string()))?;
            for ((idx, key), vector) in miss_indices.into_iter().zip(computed.into_iter()) {
                self.cache.put(key, vector.clone());
                out[idx] = vector;
            }
        }

        Ok(out)
    }
}

fn content_key(text: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_key_is_stable() {
        assert_eq!(content_key("hello"), content_key("hello"));
        assert_ne!(content_key("hello"), content_key("world"));
    }
}
