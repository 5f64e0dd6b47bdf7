//! Multiclass classification of microtexts.
//!
//! One centroid per class in embedding space, computed from the labelled
//! preprocessed corpus at startup. A text is assigned the best-matching
//! class by cosine similarity, or reported as unclassifiable when every
//! score falls below the confidence floor.

use std::collections::HashMap;

use arrow::array::{Array, BooleanArray, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use microtexto_core::{Categoria, corpus};
use tracing::info;

use crate::embedder::{Embedder, normalize, similarity};

/// Confidence floor below which a text is reported as unclassifiable.
pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.35;

const EMBED_CHUNK: usize = 64;

/// Classification outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Best-matching class, at or above the confidence floor.
    Class {
        categoria: Categoria,
        confidence: f32,
    },
    /// No class scored above the floor.
    Unknown,
}

/// Labelled training texts pulled from the preprocessed corpus.
pub struct LabelledTexts {
    pub texts: Vec<String>,
    pub labels: Vec<Categoria>,
}

impl LabelledTexts {
    /// Extract `(clean text, class)` pairs from a preprocessed-corpus batch.
    ///
    /// Rows with a null or blank clean text, no flag set, or several flags
    /// set are skipped as noise.
    pub fn from_batch(batch: &RecordBatch) -> anyhow::Result<Self> {
        let text_col = batch
            .column_by_name(corpus::TEXTO_LIMPIO)
            .ok_or_else(|| anyhow::anyhow!("missing '{}' column", corpus::TEXTO_LIMPIO))?;
        let flag_cols: Vec<_> = Categoria::ALL
            .iter()
            .map(|cat| {
                batch
                    .column_by_name(cat.flag_column())
                    .ok_or_else(|| anyhow::anyhow!("missing '{}' column", cat.flag_column()))
            })
            .collect::<Result<_, _>>()?;

        let mut texts = Vec::new();
        let mut labels = Vec::new();
        for row in 0..batch.num_rows() {
            let Some(text) = get_string(text_col.as_ref(), row) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }

            let mut label = None;
            let mut ambiguous = false;
            for (k, cat) in Categoria::ALL.into_iter().enumerate() {
                if get_bool(flag_cols[k].as_ref(), row) {
                    if label.is_some() {
                        ambiguous = true;
                    } else {
                        label = Some(cat);
                    }
                }
            }
            if let Some(cat) = label
                && !ambiguous
            {
                texts.push(text);
                labels.push(cat);
            }
        }

        Ok(Self { texts, labels })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Number of examples per class, in flag-column order.
    pub fn class_counts(&self) -> [(Categoria, usize); 3] {
        Categoria::ALL.map(|cat| {
            let n = self.labels.iter().filter(|&&l| l == cat).count();
            (cat, n)
        })
    }
}

/// Centroid classifier over the three corpus classes.
pub struct Classifier {
    centroids: Vec<(Categoria, Vec<f32>)>,
    floor: f32,
    dim: usize,
}

impl Classifier {
    /// Build per-class centroids by embedding the labelled corpus.
    ///
    /// Fails when any class has zero usable examples: a missing centroid
    /// would silently make that class unpredictable.
    pub fn build(embedder: &mut Embedder, labelled: &LabelledTexts) -> anyhow::Result<Self> {
        anyhow::ensure!(!labelled.is_empty(), "no labelled texts for centroids");
        let dim = embedder.dim();

        let mut sums: HashMap<Categoria, (Vec<f32>, usize)> = HashMap::new();
        for (chunk, chunk_labels) in labelled
            .texts
            .chunks(EMBED_CHUNK)
            .zip(labelled.labels.chunks(EMBED_CHUNK))
        {
            let refs: Vec<&str> = chunk.iter().map(|s| s.as_str()).collect();
            let embeddings = embedder.embed_batch(&refs)?;
            for (emb, &cat) in embeddings.iter().zip(chunk_labels) {
                let entry = sums.entry(cat).or_insert_with(|| (vec![0.0f32; dim], 0));
                for (acc, &v) in entry.0.iter_mut().zip(emb) {
                    *acc += v;
                }
                entry.1 += 1;
            }
        }

        let mut centroids = Vec::with_capacity(Categoria::ALL.len());
        for cat in Categoria::ALL {
            let Some((mut sum, count)) = sums.remove(&cat) else {
                anyhow::bail!("class '{}' has no labelled examples", cat.label());
            };
            for v in &mut sum {
                *v /= count as f32;
            }
            normalize(&mut sum);
            centroids.push((cat, sum));
        }

        info!(examples = labelled.len(), dim, "built classification centroids");
        Ok(Self::from_centroids(centroids, DEFAULT_CONFIDENCE_FLOOR))
    }

    /// Classifier from precomputed unit-norm centroids.
    pub fn from_centroids(centroids: Vec<(Categoria, Vec<f32>)>, floor: f32) -> Self {
        let dim = centroids.first().map(|(_, v)| v.len()).unwrap_or(0);
        Self {
            centroids,
            floor,
            dim,
        }
    }

    /// Replace the confidence floor.
    pub fn with_floor(mut self, floor: f32) -> Self {
        self.floor = floor;
        self
    }

    /// Scores against every class centroid, best first.
    pub fn scores(&self, embedding: &[f32]) -> Vec<(Categoria, f32)> {
        let mut scores: Vec<(Categoria, f32)> = self
            .centroids
            .iter()
            .map(|(cat, centroid)| (*cat, similarity(embedding, centroid)))
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores
    }

    /// Best class at or above the confidence floor.
    pub fn classify(&self, embedding: &[f32]) -> Verdict {
        match self.scores(embedding).first() {
            Some(&(categoria, confidence)) if confidence >= self.floor => Verdict::Class {
                categoria,
                confidence,
            },
            _ => Verdict::Unknown,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }
}

// ── Arrow extraction helpers ──

fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

fn get_bool(col: &dyn Array, row: usize) -> bool {
    if col.is_null(row) {
        return false;
    }
    if let Some(arr) = col.as_any().downcast_ref::<BooleanArray>() {
        return arr.value(row);
    }
    // Flags exported as "True"/"False" strings by some writers.
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return arr.value(row).eq_ignore_ascii_case("true");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Int64Array, StringArray};
    use std::sync::Arc;

    fn preprocessed_batch(rows: &[(&str, [bool; 3])]) -> RecordBatch {
        let schema = corpus::preprocesado_schema();
        let n = rows.len() as i64;
        let mut columns: Vec<Arc<dyn Array>> = vec![
            Arc::new(Int64Array::from((0..n).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.0).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.0).collect::<Vec<_>>())),
        ];
        for k in 0..3 {
            columns.push(Arc::new(BooleanArray::from(
                rows.iter().map(|r| r.1[k]).collect::<Vec<_>>(),
            )));
        }
        RecordBatch::try_new(Arc::new(schema), columns).unwrap()
    }

    fn three_class_classifier() -> Classifier {
        Classifier::from_centroids(
            vec![
                (Categoria::Microficcion, vec![1.0, 0.0, 0.0]),
                (Categoria::Noticia, vec![0.0, 1.0, 0.0]),
                (Categoria::Frase, vec![0.0, 0.0, 1.0]),
            ],
            0.35,
        )
    }

    #[test]
    fn labelled_texts_from_batch() {
        let batch = preprocessed_batch(&[
            ("un cuento", [true, false, false]),
            ("una noticia", [false, true, false]),
            ("una frase", [false, false, true]),
        ]);
        let labelled = LabelledTexts::from_batch(&batch).unwrap();
        assert_eq!(labelled.len(), 3);
        assert_eq!(labelled.labels[1], Categoria::Noticia);
    }

    #[test]
    fn rows_without_flags_are_skipped() {
        let batch = preprocessed_batch(&[
            ("sin clase", [false, false, false]),
            ("una noticia", [false, true, false]),
        ]);
        let labelled = LabelledTexts::from_batch(&batch).unwrap();
        assert_eq!(labelled.len(), 1);
        assert_eq!(labelled.texts[0], "una noticia");
    }

    #[test]
    fn ambiguous_rows_are_skipped() {
        let batch = preprocessed_batch(&[("dos clases", [true, true, false])]);
        let labelled = LabelledTexts::from_batch(&batch).unwrap();
        assert!(labelled.is_empty());
    }

    #[test]
    fn blank_texts_are_skipped() {
        let batch = preprocessed_batch(&[("   ", [true, false, false])]);
        let labelled = LabelledTexts::from_batch(&batch).unwrap();
        assert!(labelled.is_empty());
    }

    #[test]
    fn class_counts_per_category() {
        let batch = preprocessed_batch(&[
            ("a", [true, false, false]),
            ("b", [true, false, false]),
            ("c", [false, false, true]),
        ]);
        let labelled = LabelledTexts::from_batch(&batch).unwrap();
        let counts = labelled.class_counts();
        assert_eq!(counts[0], (Categoria::Microficcion, 2));
        assert_eq!(counts[1], (Categoria::Noticia, 0));
        assert_eq!(counts[2], (Categoria::Frase, 1));
    }

    #[test]
    fn classify_picks_nearest_centroid() {
        let clf = three_class_classifier();
        let verdict = clf.classify(&[0.9, 0.1, 0.0]);
        assert!(matches!(
            verdict,
            Verdict::Class {
                categoria: Categoria::Microficcion,
                ..
            }
        ));
    }

    #[test]
    fn classify_below_floor_is_unknown() {
        let clf = three_class_classifier().with_floor(0.9);
        let diag = 1.0 / 3.0f32.sqrt();
        assert_eq!(clf.classify(&[diag, diag, diag]), Verdict::Unknown);
    }

    #[test]
    fn scores_are_sorted_descending() {
        let clf = three_class_classifier();
        let scores = clf.scores(&[0.8, 0.6, 0.0]);
        assert_eq!(scores[0].0, Categoria::Microficcion);
        assert_eq!(scores[1].0, Categoria::Noticia);
        assert!(scores[0].1 >= scores[1].1 && scores[1].1 >= scores[2].1);
    }

    #[test]
    fn confidence_is_reported() {
        let clf = three_class_classifier();
        if let Verdict::Class { confidence, .. } = clf.classify(&[1.0, 0.0, 0.0]) {
            assert!((confidence - 1.0).abs() < 1e-6);
        } else {
            panic!("expected a class verdict");
        }
    }
}
