//! Corpus layer: CSV files loaded once into Arrow batches, read many times.

mod error;
pub use error::CorpusError;

mod store;
pub use store::{CorpusStore, Dataset, filter_by_category, string_column};

mod frequency;
pub use frequency::Frequencies;
