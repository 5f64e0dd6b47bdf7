//! Local NLP inference over pretrained ONNX models.
//!
//! All linguistic computation (tagging, parsing, entity recognition,
//! embeddings) is delegated to opaque model artifacts loaded from disk;
//! this crate does tensor plumbing, subword alignment, and decoding.

mod annotator;
pub use annotator::{Annotator, AnnotatorLabels, Doc, Entity, Token};

mod embedder;
pub use embedder::{Embedder, similarity};

mod classifier;
pub use classifier::{Classifier, DEFAULT_CONFIDENCE_FLOOR, LabelledTexts, Verdict};
