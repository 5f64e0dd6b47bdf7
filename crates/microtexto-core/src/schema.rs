/// Arrow schema definitions for the corpus CSV files.
pub mod corpus {
    use arrow::datatypes::{DataType, Field, Schema};

    use crate::Categoria;

    /// Pandas-style row index column (unnamed in the CSV header).
    pub const INDICE: &str = "indice";
    /// Raw tweet text.
    pub const TEXTO: &str = "Texto";
    /// Preprocessed tweet text (lowercased, de-noised).
    pub const TEXTO_LIMPIO: &str = "Texto limpio";

    /// Schema for the single-class dataset files
    /// (`microficciones.csv`, `noticias.csv`, `frases_pensamientos.csv`).
    pub fn dataset_schema() -> Schema {
        Schema::new(vec![
            Field::new(INDICE, DataType::Int64, true),
            Field::new(TEXTO, DataType::Utf8, true),
        ])
    }

    /// Schema for the combined raw corpus (`corpus.csv`): text plus one
    /// boolean flag per class.
    pub fn corpus_schema() -> Schema {
        let mut fields = vec![
            Field::new(INDICE, DataType::Int64, true),
            Field::new(TEXTO, DataType::Utf8, true),
        ];
        for cat in Categoria::ALL {
            fields.push(Field::new(cat.flag_column(), DataType::Boolean, true));
        }
        Schema::new(fields)
    }

    /// Schema for the preprocessed corpus (`corpus_preprocesado.csv`):
    /// raw and clean text plus the class flags.
    pub fn preprocesado_schema() -> Schema {
        let mut fields = vec![
            Field::new(INDICE, DataType::Int64, true),
            Field::new(TEXTO, DataType::Utf8, true),
            Field::new(TEXTO_LIMPIO, DataType::Utf8, true),
        ];
        for cat in Categoria::ALL {
            fields.push(Field::new(cat.flag_column(), DataType::Boolean, true));
        }
        Schema::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::corpus;
    use crate::Categoria;

    #[test]
    fn dataset_schema_has_expected_fields() {
        let schema = corpus::dataset_schema();
        assert_eq!(schema.fields().len(), 2);
        assert!(schema.field_with_name(corpus::TEXTO).is_ok());
    }

    #[test]
    fn preprocesado_schema_has_flag_per_class() {
        let schema = corpus::preprocesado_schema();
        assert_eq!(schema.fields().len(), 6);
        assert!(schema.field_with_name(corpus::TEXTO_LIMPIO).is_ok());
        for cat in Categoria::ALL {
            assert!(schema.field_with_name(cat.flag_column()).is_ok());
        }
    }

    #[test]
    fn corpus_schema_has_flag_per_class() {
        let schema = corpus::corpus_schema();
        assert_eq!(schema.fields().len(), 5);
        for cat in Categoria::ALL {
            assert!(schema.field_with_name(cat.flag_column()).is_ok());
        }
    }
}
