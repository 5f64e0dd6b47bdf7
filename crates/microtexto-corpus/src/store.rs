//! CSV corpus store.
//!
//! The corpus is five small CSV files exported from the collection notebooks.
//! Each file is read into a single Arrow `RecordBatch` on first access and
//! cached for the life of the store (load once, read many).

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use arrow::array::{Array, BooleanArray, LargeStringArray, StringArray};
use arrow::compute::{concat_batches, filter_record_batch};
use arrow::csv::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use microtexto_core::{Categoria, corpus};
use tracing::info;

use crate::CorpusError;

/// One of the five CSV files that make up the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Microficciones,
    Noticias,
    Frases,
    Corpus,
    Preprocesado,
}

impl Dataset {
    /// All datasets, in sidebar-menu order.
    pub const ALL: [Dataset; 5] = [
        Dataset::Microficciones,
        Dataset::Noticias,
        Dataset::Frases,
        Dataset::Corpus,
        Dataset::Preprocesado,
    ];

    /// File name inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Microficciones => "microficciones.csv",
            Self::Noticias => "noticias.csv",
            Self::Frases => "frases_pensamientos.csv",
            Self::Corpus => "corpus.csv",
            Self::Preprocesado => "corpus_preprocesado.csv",
        }
    }

    /// Display title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Microficciones => "Microficciones",
            Self::Noticias => "Noticias",
            Self::Frases => "Frases/Reflexiones",
            Self::Corpus => "Corpus general",
            Self::Preprocesado => "Corpus preprocesado",
        }
    }

    /// Value used in dashboard query strings.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Microficciones => "microficciones",
            Self::Noticias => "noticias",
            Self::Frases => "frases",
            Self::Corpus => "corpus",
            Self::Preprocesado => "preprocesado",
        }
    }

    /// Parse a dashboard query value.
    pub fn parse_slug(s: &str) -> Result<Dataset, CorpusError> {
        Self::ALL
            .into_iter()
            .find(|d| d.slug() == s)
            .ok_or_else(|| CorpusError::UnknownDataset(s.to_string()))
    }

    fn schema(&self) -> arrow::datatypes::Schema {
        match self {
            Self::Microficciones | Self::Noticias | Self::Frases => corpus::dataset_schema(),
            Self::Corpus => corpus::corpus_schema(),
            Self::Preprocesado => corpus::preprocesado_schema(),
        }
    }
}

/// Read-only corpus store backed by CSV files in a data directory.
pub struct CorpusStore {
    data_dir: PathBuf,
    cache: RwLock<HashMap<Dataset, Arc<RecordBatch>>>,
}

impl CorpusStore {
    /// Remember the data directory. No I/O happens until a dataset is read.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load a dataset, reading its CSV on first access.
    pub fn dataset(&self, ds: Dataset) -> Result<Arc<RecordBatch>, CorpusError> {
        if let Some(batch) = self.cache.read().expect("corpus cache lock").get(&ds) {
            return Ok(batch.clone());
        }

        let batch = Arc::new(self.read_csv(ds)?);
        self.cache
            .write()
            .expect("corpus cache lock")
            .insert(ds, batch.clone());
        Ok(batch)
    }

    /// The preprocessed corpus (clean text plus class flags).
    pub fn preprocesado(&self) -> Result<Arc<RecordBatch>, CorpusError> {
        self.dataset(Dataset::Preprocesado)
    }

    /// Row count per dataset, in menu order.
    pub fn row_counts(&self) -> Result<Vec<(Dataset, usize)>, CorpusError> {
        Dataset::ALL
            .into_iter()
            .map(|ds| Ok((ds, self.dataset(ds)?.num_rows())))
            .collect()
    }

    fn read_csv(&self, ds: Dataset) -> Result<RecordBatch, CorpusError> {
        let path = self.data_dir.join(ds.file_name());
        if !path.exists() {
            return Err(CorpusError::CsvNotFound(path));
        }

        let schema = Arc::new(ds.schema());
        let reader = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .build(File::open(&path)?)?;
        let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>()?;
        let batch = concat_batches(&schema, &batches)?;

        info!(
            file = ds.file_name(),
            rows = batch.num_rows(),
            "loaded corpus file"
        );
        Ok(batch)
    }
}

// ── Batch helpers ──

/// Rows of a combined-corpus batch flagged with the given class.
///
/// The flag column is Boolean when read through the corpus schemas, but
/// `True`/`False` strings are also accepted for batches from other writers.
pub fn filter_by_category(
    batch: &RecordBatch,
    cat: Categoria,
) -> Result<RecordBatch, CorpusError> {
    let name = cat.flag_column();
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| CorpusError::MissingColumn(name.to_string()))?;

    let mask = if let Some(flags) = col.as_any().downcast_ref::<BooleanArray>() {
        flags.clone()
    } else if let Some(flags) = col.as_any().downcast_ref::<StringArray>() {
        (0..flags.len())
            .map(|i| {
                if flags.is_null(i) {
                    None
                } else {
                    Some(flags.value(i).eq_ignore_ascii_case("true"))
                }
            })
            .collect()
    } else {
        return Err(CorpusError::ColumnType(name.to_string()));
    };

    Ok(filter_record_batch(batch, &mask)?)
}

/// Extract a string column as borrowed values, skipping null rows.
///
/// Handles both `Utf8` and `LargeUtf8` columns.
pub fn string_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<Vec<&'a str>, CorpusError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| CorpusError::MissingColumn(name.to_string()))?;

    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        Ok((0..arr.len())
            .filter(|&i| !arr.is_null(i))
            .map(|i| arr.value(i))
            .collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        Ok((0..arr.len())
            .filter(|&i| !arr.is_null(i))
            .map(|i| arr.value(i))
            .collect())
    } else {
        Err(CorpusError::ColumnType(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::io::Write;

    /// Build a preprocessed-corpus batch in memory.
    fn preprocessed_batch(rows: &[(&str, &str, [bool; 3])]) -> RecordBatch {
        let schema = corpus::preprocesado_schema();
        let indices = Int64Array::from((0..rows.len() as i64).collect::<Vec<_>>());
        let textos = StringArray::from(rows.iter().map(|r| r.0).collect::<Vec<_>>());
        let limpios = StringArray::from(rows.iter().map(|r| r.1).collect::<Vec<_>>());
        let flags: Vec<Arc<dyn Array>> = (0..3)
            .map(|k| {
                Arc::new(BooleanArray::from(
                    rows.iter().map(|r| r.2[k]).collect::<Vec<_>>(),
                )) as Arc<dyn Array>
            })
            .collect();

        let mut columns: Vec<Arc<dyn Array>> =
            vec![Arc::new(indices), Arc::new(textos), Arc::new(limpios)];
        columns.extend(flags);
        RecordBatch::try_new(Arc::new(schema), columns).unwrap()
    }

    #[test]
    fn reads_dataset_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("microficciones.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, ",Texto").unwrap();
        writeln!(f, "0,\"El dinosaurio seguía allí.\"").unwrap();
        writeln!(f, "1,\"Vendo zapatos de bebé, sin usar.\"").unwrap();

        let store = CorpusStore::open(dir.path());
        let batch = store.dataset(Dataset::Microficciones).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let texts = string_column(&batch, corpus::TEXTO).unwrap();
        assert_eq!(texts[0], "El dinosaurio seguía allí.");
    }

    #[test]
    fn dataset_is_cached_after_first_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noticias.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, ",Texto").unwrap();
        writeln!(f, "0,primera").unwrap();

        let store = CorpusStore::open(dir.path());
        let first = store.dataset(Dataset::Noticias).unwrap();

        // Removing the file does not invalidate the cached batch.
        std::fs::remove_file(&path).unwrap();
        let second = store.dataset(Dataset::Noticias).unwrap();
        assert_eq!(first.num_rows(), second.num_rows());
    }

    #[test]
    fn reads_preprocessed_csv_with_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus_preprocesado.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, ",Texto,Texto limpio,Microficción,Noticia,Frase/Pensamiento").unwrap();
        writeln!(f, "0,Hola,hola,True,False,False").unwrap();
        writeln!(f, "1,Adiós,adios,False,True,False").unwrap();

        let store = CorpusStore::open(dir.path());
        let batch = store.preprocesado().unwrap();
        assert_eq!(batch.num_rows(), 2);

        let ficcion = filter_by_category(&batch, Categoria::Microficcion).unwrap();
        assert_eq!(ficcion.num_rows(), 1);
        assert_eq!(
            string_column(&ficcion, corpus::TEXTO_LIMPIO).unwrap(),
            vec!["hola"]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::open(dir.path());
        let err = store.dataset(Dataset::Corpus).unwrap_err();
        assert!(matches!(err, CorpusError::CsvNotFound(_)));
    }

    #[test]
    fn filter_by_category_boolean_flags() {
        let batch = preprocessed_batch(&[
            ("a", "a", [true, false, false]),
            ("b", "b", [false, true, false]),
            ("c", "c", [false, true, false]),
        ]);

        let noticias = filter_by_category(&batch, Categoria::Noticia).unwrap();
        assert_eq!(noticias.num_rows(), 2);
        let frases = filter_by_category(&batch, Categoria::Frase).unwrap();
        assert_eq!(frases.num_rows(), 0);
    }

    #[test]
    fn filter_accepts_string_flags() {
        let schema = Schema::new(vec![
            Field::new("Texto", DataType::Utf8, true),
            Field::new("Noticia", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["a", "b"])),
                Arc::new(StringArray::from(vec!["True", "False"])),
            ],
        )
        .unwrap();

        let filtered = filter_by_category(&batch, Categoria::Noticia).unwrap();
        assert_eq!(filtered.num_rows(), 1);
    }

    #[test]
    fn string_column_missing_is_an_error() {
        let batch = preprocessed_batch(&[("a", "a", [true, false, false])]);
        assert!(matches!(
            string_column(&batch, "Inexistente"),
            Err(CorpusError::MissingColumn(_))
        ));
    }

    #[test]
    fn slug_roundtrip() {
        for ds in Dataset::ALL {
            assert_eq!(Dataset::parse_slug(ds.slug()).unwrap(), ds);
        }
        assert!(Dataset::parse_slug("otro").is_err());
    }
}
