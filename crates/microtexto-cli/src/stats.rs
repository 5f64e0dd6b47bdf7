//! Terminal corpus summary, printed as grouped cards.

use std::path::Path;

use microtexto_core::{Categoria, corpus};
use microtexto_corpus::{CorpusStore, Frequencies, filter_by_category, string_column};

const TOP_WORDS: usize = 15;

/// Print per-file row counts, per-class counts, and the most frequent words
/// of the clean corpus.
pub fn run(datos: &Path) -> anyhow::Result<()> {
    let store = CorpusStore::open(datos);

    println!("=== Corpus ===");
    println!();

    println!("Archivos");
    for (ds, rows) in store.row_counts()? {
        println!("  {:<26} {rows}", ds.file_name());
    }
    println!();

    let batch = store.preprocesado()?;

    println!("Clases (corpus preprocesado)");
    for cat in Categoria::ALL {
        let rows = filter_by_category(&batch, cat)?.num_rows();
        println!("  {:<26} {rows}", cat.title());
    }
    println!();

    let mut freq = Frequencies::spanish();
    freq.add_all(string_column(&batch, corpus::TEXTO_LIMPIO)?);

    println!("Palabras más frecuentes");
    for (rank, (word, count)) in freq.top(TOP_WORDS).into_iter().enumerate() {
        println!("  {:>2}. {:<22} {count}", rank + 1, word);
    }

    Ok(())
}
