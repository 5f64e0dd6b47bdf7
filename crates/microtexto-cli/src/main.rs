//! `microtexto`: dashboard and terminal tools for the microtext corpus.

mod stats;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use microtexto_corpus::CorpusStore;
use microtexto_nlp::{Annotator, Classifier, Embedder, LabelledTexts, Verdict};
use microtexto_web::{AppState, router};

#[derive(Parser)]
#[command(name = "microtexto", version, about = "Caso de estudio: microficciones en Twitter")]
struct Cli {
    /// Directory with the corpus CSV files.
    #[arg(long, default_value = "Datos", env = "MICROTEXTO_DATOS")]
    datos: PathBuf,

    /// Directory with the pretrained model directories.
    #[arg(long, default_value = "modelos", env = "MICROTEXTO_MODELOS")]
    modelos: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8600")]
        addr: SocketAddr,
    },
    /// Print a corpus summary.
    Stats,
    /// Classify a text from the terminal.
    Clasificar { texto: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "microtexto=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::info!("microtexto v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { addr } => serve(&cli.datos, &cli.modelos, addr).await,
        Command::Stats => stats::run(&cli.datos),
        Command::Clasificar { texto } => clasificar(&cli.datos, &cli.modelos, &texto),
    }
}

/// Load a classifier over the labelled preprocessed corpus.
fn build_classifier(
    store: &CorpusStore,
    embedder: &mut Embedder,
) -> anyhow::Result<Classifier> {
    let batch = store
        .preprocesado()
        .context("loading the preprocessed corpus")?;
    let labelled = LabelledTexts::from_batch(&batch)?;
    for (cat, n) in labelled.class_counts() {
        tracing::info!(class = cat.label(), examples = n, "labelled corpus");
    }
    Classifier::build(embedder, &labelled).context("building classification centroids")
}

async fn serve(datos: &Path, modelos: &Path, addr: SocketAddr) -> anyhow::Result<()> {
    let store = CorpusStore::open(datos);
    let annotator =
        Annotator::load(&modelos.join("es-anotador")).context("loading annotation model")?;
    let mut embedder =
        Embedder::load(&modelos.join("es-similitud")).context("loading embedding model")?;
    let classifier = build_classifier(&store, &mut embedder)?;

    let state = AppState::new(store, annotator, embedder, classifier);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("dashboard en http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn clasificar(datos: &Path, modelos: &Path, texto: &str) -> anyhow::Result<()> {
    let store = CorpusStore::open(datos);
    let mut embedder =
        Embedder::load(&modelos.join("es-similitud")).context("loading embedding model")?;
    let classifier = build_classifier(&store, &mut embedder)?;

    let embedding = embedder.embed(texto)?;
    match classifier.classify(&embedding) {
        Verdict::Class {
            categoria,
            confidence,
        } => println!("{} ({:.0}%)", categoria.title(), confidence * 100.0),
        Verdict::Unknown => println!("El texto no ha podido ser clasificado"),
    }

    println!();
    for (cat, score) in classifier.scores(&embedding) {
        println!("  {:<22} {:.3}", cat.title(), score);
    }
    Ok(())
}
