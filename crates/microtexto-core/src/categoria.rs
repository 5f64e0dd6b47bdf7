//! The three mutually-exclusive classes of the microtext corpus.

use serde::{Deserialize, Serialize};

/// Class of a corpus row.
///
/// Every tweet in the corpus is catalogued as exactly one of these three
/// classes; the preprocessed corpus carries one boolean flag column per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Categoria {
    Microficcion,
    Noticia,
    Frase,
}

impl Categoria {
    /// All categories, in flag-column order.
    pub const ALL: [Categoria; 3] = [
        Categoria::Microficcion,
        Categoria::Noticia,
        Categoria::Frase,
    ];

    /// Classifier label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Microficcion => "microficción",
            Self::Noticia => "noticia",
            Self::Frase => "frase",
        }
    }

    /// Boolean flag column in the combined corpus files.
    pub fn flag_column(&self) -> &'static str {
        match self {
            Self::Microficcion => "Microficción",
            Self::Noticia => "Noticia",
            Self::Frase => "Frase/Pensamiento",
        }
    }

    /// Display title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Microficcion => "Microficción",
            Self::Noticia => "Noticia",
            Self::Frase => "Frase/Reflexión",
        }
    }

    /// Value used in dashboard query strings.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Microficcion => "microficcion",
            Self::Noticia => "noticia",
            Self::Frase => "frase",
        }
    }

    /// Parse a dashboard query value.
    pub fn parse_slug(s: &str) -> Option<Categoria> {
        match s {
            "microficcion" | "microficción" => Some(Self::Microficcion),
            "noticia" => Some(Self::Noticia),
            "frase" => Some(Self::Frase),
            _ => None,
        }
    }
}
