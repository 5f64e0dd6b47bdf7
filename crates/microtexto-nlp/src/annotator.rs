//! Multi-task token annotation: POS tags, named entities, and dependencies.
//!
//! The annotator wraps a Spanish pipeline exported to ONNX. One forward pass
//! over the subword sequence yields POS logits, BIO entity logits, dependency
//! relation logits, and a head-attachment score matrix. The model directory
//! must contain `model.onnx`, `tokenizer.json`, and `labels.json` (the label
//! inventories for the three classification heads).

use std::fs::File;
use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::info;

/// Label inventories bundled with the annotation model.
#[derive(Debug, Deserialize)]
pub struct AnnotatorLabels {
    pub pos: Vec<String>,
    pub ent: Vec<String>,
    pub dep: Vec<String>,
}

/// One word of an annotated text.
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    /// Byte span in the source text.
    pub start: usize,
    pub end: usize,
    /// Universal POS tag.
    pub pos: String,
    /// Dependency relation to the head (`ROOT` for the sentence root).
    pub dep: String,
    /// Index of the syntactic head in [`Doc::tokens`]; self-index for the root.
    pub head: usize,
}

/// A named-entity span.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub text: String,
    pub label: String,
    /// Byte span in the source text.
    pub start: usize,
    pub end: usize,
}

/// An annotated text.
#[derive(Debug, Clone, Default)]
pub struct Doc {
    pub text: String,
    pub tokens: Vec<Token>,
    pub entities: Vec<Entity>,
}

impl Doc {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Spanish multi-task annotator over ONNX Runtime.
pub struct Annotator {
    session: Session,
    tokenizer: Tokenizer,
    labels: AnnotatorLabels,
}

/// First-subword position and byte span of one word.
#[derive(Debug, Clone, Copy)]
struct WordSpan {
    first_sub: usize,
    start: usize,
    end: usize,
}

impl Annotator {
    /// Load the annotation model from a directory containing `model.onnx`,
    /// `tokenizer.json`, and `labels.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let labels_path = model_dir.join("labels.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );
        anyhow::ensure!(
            labels_path.exists(),
            "labels.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        anyhow::ensure!(
            session.outputs().len() == 4,
            "annotation model must expose pos/ent/dep/head outputs, found {}",
            session.outputs().len()
        );

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 512,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        let labels: AnnotatorLabels = serde_json::from_reader(File::open(&labels_path)?)?;
        anyhow::ensure!(
            !labels.pos.is_empty() && !labels.ent.is_empty() && !labels.dep.is_empty(),
            "labels.json has an empty inventory"
        );

        info!(
            pos = labels.pos.len(),
            ent = labels.ent.len(),
            dep = labels.dep.len(),
            model = %model_path.display(),
            "loaded annotation model"
        );
        Ok(Self {
            session,
            tokenizer,
            labels,
        })
    }

    /// Annotate a text: one forward pass, then word-level decoding.
    ///
    /// Empty or whitespace-only input returns an empty [`Doc`] without
    /// touching the model.
    pub fn annotate(&mut self, text: &str) -> anyhow::Result<Doc> {
        if text.trim().is_empty() {
            return Ok(Doc {
                text: text.to_string(),
                ..Doc::default()
            });
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let seq_len = encoding.get_ids().len();

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&v| v as i64).collect();
        let attention: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&v| v as i64)
            .collect();
        let type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&v| v as i64).collect();

        let shape = [1i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention.into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Output order is fixed by the export: pos, ent, dep, heads.
        let (pos_shape, pos_data) = outputs[0].try_extract_tensor::<f32>()?;
        let (ent_shape, ent_data) = outputs[1].try_extract_tensor::<f32>()?;
        let (dep_shape, dep_data) = outputs[2].try_extract_tensor::<f32>()?;
        let (head_shape, head_data) = outputs[3].try_extract_tensor::<f32>()?;

        let n_pos = self.labels.pos.len();
        let n_ent = self.labels.ent.len();
        let n_dep = self.labels.dep.len();
        check_logits_shape(pos_shape, seq_len, n_pos, "pos")?;
        check_logits_shape(ent_shape, seq_len, n_ent, "ent")?;
        check_logits_shape(dep_shape, seq_len, n_dep, "dep")?;
        check_logits_shape(head_shape, seq_len, seq_len, "head")?;

        // Align subwords to words: the first subword carries the word's labels.
        let word_ids = encoding.get_word_ids();
        let offsets = encoding.get_offsets();
        let mut words: Vec<WordSpan> = Vec::new();
        let mut sub_to_word: Vec<Option<usize>> = vec![None; seq_len];
        let mut current: Option<u32> = None;
        for i in 0..seq_len {
            let Some(wid) = word_ids[i] else { continue }; // special tokens
            if current == Some(wid)
                && let Some(w) = words.last_mut()
            {
                w.end = offsets[i].1;
            } else {
                words.push(WordSpan {
                    first_sub: i,
                    start: offsets[i].0,
                    end: offsets[i].1,
                });
                current = Some(wid);
            }
            sub_to_word[i] = Some(words.len() - 1);
        }

        let mut tokens = Vec::with_capacity(words.len());
        let mut ent_tags: Vec<&str> = Vec::with_capacity(words.len());
        for (w_idx, w) in words.iter().enumerate() {
            let i = w.first_sub;
            let pos_i = argmax(&pos_data[i * n_pos..(i + 1) * n_pos]);
            let ent_i = argmax(&ent_data[i * n_ent..(i + 1) * n_ent]);
            let dep_i = argmax(&dep_data[i * n_dep..(i + 1) * n_dep]);
            ent_tags.push(self.labels.ent[ent_i].as_str());

            // Head: best-scoring subword position, mapped back to a word.
            // Attachment to a special token or to itself marks the root.
            let head_sub = argmax(&head_data[i * seq_len..(i + 1) * seq_len]);
            let (head, dep) = match sub_to_word.get(head_sub).copied().flatten() {
                Some(h) if h != w_idx => (h, self.labels.dep[dep_i].clone()),
                _ => (w_idx, "ROOT".to_string()),
            };

            tokens.push(Token {
                text: text[w.start..w.end].to_string(),
                start: w.start,
                end: w.end,
                pos: self.labels.pos[pos_i].clone(),
                dep,
                head,
            });
        }

        let entities = decode_entities(text, &words, &ent_tags);
        Ok(Doc {
            text: text.to_string(),
            tokens,
            entities,
        })
    }
}

fn check_logits_shape(
    dims: &[i64],
    seq_len: usize,
    width: usize,
    name: &str,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        dims.len() == 3
            && dims[0] == 1
            && dims[1] as usize == seq_len
            && dims[2] as usize == width,
        "unexpected {name} output shape {dims:?}, expected [1, {seq_len}, {width}]"
    );
    Ok(())
}

fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

/// BIO decode over word-level entity tags into character spans.
///
/// A stray `I-X` with no open `X` span opens one (lenient decode).
fn decode_entities(text: &str, words: &[WordSpan], tags: &[&str]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut open: Option<(usize, usize, String)> = None;

    let close = |open: &mut Option<(usize, usize, String)>, out: &mut Vec<Entity>| {
        if let Some((start, end, label)) = open.take() {
            out.push(Entity {
                text: text[start..end].to_string(),
                label,
                start,
                end,
            });
        }
    };

    for (w, tag) in words.iter().zip(tags) {
        match tag.split_once('-') {
            Some(("B", label)) => {
                close(&mut open, &mut entities);
                open = Some((w.start, w.end, label.to_string()));
            }
            Some(("I", label)) => match &mut open {
                Some((_, end, l)) if l.as_str() == label => *end = w.end,
                _ => {
                    close(&mut open, &mut entities);
                    open = Some((w.start, w.end, label.to_string()));
                }
            },
            _ => close(&mut open, &mut entities),
        }
    }
    close(&mut open, &mut entities);
    entities
}
