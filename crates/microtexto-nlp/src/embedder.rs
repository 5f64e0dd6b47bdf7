//! Sentence embeddings for similarity and classification.
//!
//! Wraps a multilingual sentence-transformers model exported to ONNX
//! (paraphrase-multilingual-MiniLM-L12-v2 in the bundled setup). Output
//! vectors are masked-mean pooled over the last hidden state and
//! unit-normalized, so [`similarity`] is a plain dot product.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

/// Microtexts are short; one tweet never reaches this many subwords.
const MAX_TOKENS: usize = 128;

/// Sentence embedding generator over ONNX Runtime.
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx`
    /// and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        // The hidden size is the last dimension of the model output.
        let dim = match session.outputs()[0].dtype() {
            ort::value::ValueType::Tensor { shape, .. } => shape
                .last()
                .copied()
                .filter(|&d| d > 0)
                .map(|d| d as usize)
                .unwrap_or(384),
            _ => 384,
        };

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    /// Embedding dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed one text, returning a unit-norm vector.
    pub fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        Ok(vectors.remove(0))
    }

    /// Embed a batch of texts, one unit-norm vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        // Padding is configured on the tokenizer, so every encoding in the
        // batch has the same length.
        let batch = encodings.len();
        let seq_len = encodings[0].get_ids().len();

        let mut input_ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);
        for enc in &encodings {
            input_ids.extend(enc.get_ids().iter().map(|&v| v as i64));
            mask.extend(enc.get_attention_mask().iter().map(|&v| v as i64));
            type_ids.extend(enc.get_type_ids().iter().map(|&v| v as i64));
        }
        let mask_f: Vec<f32> = mask.iter().map(|&v| v as f32).collect();

        let shape = [batch as i64, seq_len as i64];
        let outputs = self.session.run(ort::inputs![
            "input_ids" => Tensor::from_array((shape, input_ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, mask.into_boxed_slice()))?,
            "token_type_ids" => Tensor::from_array((shape, type_ids.into_boxed_slice()))?,
        ])?;

        // Last hidden state: [batch, seq_len, dim].
        let (out_shape, hidden) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = out_shape;
        anyhow::ensure!(
            dims.len() == 3
                && dims[0] as usize == batch
                && dims[1] as usize == seq_len
                && dims[2] as usize == self.dim,
            "unexpected hidden-state shape {dims:?}, expected [{batch}, {seq_len}, {}]",
            self.dim
        );

        let mut vectors = Vec::with_capacity(batch);
        for b in 0..batch {
            let row_mask = &mask_f[b * seq_len..(b + 1) * seq_len];
            let total: f32 = row_mask.iter().sum();

            let mut pooled = vec![0.0f32; self.dim];
            for (t, &m) in row_mask.iter().enumerate() {
                if m == 0.0 {
                    continue;
                }
                let offset = (b * seq_len + t) * self.dim;
                for (p, &h) in pooled.iter_mut().zip(&hidden[offset..offset + self.dim]) {
                    *p += h;
                }
            }
            if total > 0.0 {
                for p in &mut pooled {
                    *p /= total;
                }
            }
            normalize(&mut pooled);
            vectors.push(pooled);
        }

        Ok(vectors)
    }
}

/// Cosine similarity of two unit-norm embeddings.
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize a vector in place; zero vectors are left unchanged.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// The embedding model is not bundled with the repository; tests that
    /// need it are skipped when the directory is absent.
    fn model_dir() -> Option<PathBuf> {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("modelos")
            .join("es-similitud");
        dir.join("model.onnx").exists().then_some(dir)
    }

    #[test]
    fn normalize_produces_unit_norm() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn similarity_of_identical_unit_vectors_is_one() {
        let v = vec![0.6, 0.8];
        assert!((similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn similarity_of_orthogonal_vectors_is_zero() {
        assert_eq!(similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn embed_single_text() {
        let Some(dir) = model_dir() else { return };
        let mut embedder = Embedder::load(&dir).unwrap();
        let v = embedder.embed("El dinosaurio todavía estaba allí.").unwrap();
        assert_eq!(v.len(), embedder.dim());
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn related_texts_are_closer() {
        let Some(dir) = model_dir() else { return };
        let mut embedder = Embedder::load(&dir).unwrap();
        let cuento = embedder.embed("una historia breve de ficción").unwrap();
        let relato = embedder.embed("un relato corto imaginario").unwrap();
        let bolsa = embedder.embed("la bolsa de valores cayó hoy").unwrap();
        assert!(similarity(&cuento, &relato) > similarity(&cuento, &bolsa));
    }

    #[test]
    fn embed_empty_batch() {
        let Some(dir) = model_dir() else { return };
        let mut embedder = Embedder::load(&dir).unwrap();
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }
}
