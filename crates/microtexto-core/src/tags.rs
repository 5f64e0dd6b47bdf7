//! Spanish glossaries for the labels emitted by the pretrained models.
//!
//! The dashboard shows every tag with a Spanish description; lookups over
//! labels the models do not emit return `None` (or the default color)
//! rather than panic.

/// Universal POS tag → Spanish description, shown by the tag-key table.
pub const POS_GLOSSARY: &[(&str, &str)] = &[
    ("ADJ", "adjetivo"),
    ("ADP", "adposición"),
    ("ADV", "adverbio"),
    ("AUX", "verbo auxiliar"),
    ("CCONJ", "conjunción coordinante"),
    ("CONJ", "conjunción coordinante"),
    ("DET", "determinador"),
    ("INTJ", "interjección"),
    ("NOUN", "sustantivo"),
    ("NUM", "numero"),
    ("PART", "partícula"),
    ("PRON", "pronombre"),
    ("PROPN", "nombre propio"),
    ("PUNCT", "punctuación"),
    ("SCONJ", "conjunción subordinante"),
    ("SYM", "símbolo"),
    ("VERB", "verbo"),
    ("X", "otro"),
];

/// Entity label → Spanish description.
pub const ENTITY_GLOSSARY: &[(&str, &str)] = &[
    ("PER", "persona"),
    ("LOC", "lugar"),
    ("ORG", "organización"),
    ("MISC", "misceláneo"),
];

/// Spanish description of a universal POS tag.
pub fn pos_description(tag: &str) -> Option<&'static str> {
    POS_GLOSSARY
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, desc)| *desc)
}

/// Spanish description of an entity label.
pub fn entity_description(label: &str) -> Option<&'static str> {
    ENTITY_GLOSSARY
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, desc)| *desc)
}

/// Highlight color for an entity label. Unknown labels share the
/// miscellaneous default.
pub fn entity_color(label: &str) -> &'static str {
    match label {
        "PER" => "#aa9cfc",
        "LOC" => "#ff9561",
        "ORG" => "#7aecec",
        _ => "#e4e7d2",
    }
}
