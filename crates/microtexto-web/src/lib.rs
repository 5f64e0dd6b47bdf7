//! Dashboard server for the microtext corpus.
//!
//! Server-rendered pages, one route group per sidebar option of the
//! original notebook app: welcome, exploratory analysis, NLP tools, and
//! multiclass classification.

mod error;
mod pages;
mod render;

pub use error::AppError;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use microtexto_corpus::CorpusStore;
use microtexto_nlp::{Annotator, Classifier, Embedder};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Shared state for the dashboard handlers.
///
/// ort sessions need `&mut self` to run, so the annotator and the embedder
/// sit behind async mutexes; the store caches internally and the classifier
/// is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CorpusStore>,
    pub annotator: Arc<Mutex<Annotator>>,
    pub embedder: Arc<Mutex<Embedder>>,
    pub classifier: Arc<Classifier>,
}

impl AppState {
    pub fn new(
        store: CorpusStore,
        annotator: Annotator,
        embedder: Embedder,
        classifier: Classifier,
    ) -> Self {
        Self {
            store: Arc::new(store),
            annotator: Arc::new(Mutex::new(annotator)),
            embedder: Arc::new(Mutex::new(embedder)),
            classifier: Arc::new(classifier),
        }
    }
}

/// Build the dashboard router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::bienvenida))
        .route("/eda", get(pages::eda))
        .route("/eda/frecuencias", get(pages::frecuencias))
        .route("/eda/nube", get(pages::nube))
        .route("/pln", get(pages::pln))
        .route("/pln/etiquetado", post(pages::etiquetado))
        .route("/pln/similitud", post(pages::similitud))
        .route("/pln/dependencias", post(pages::dependencias))
        .route("/pln/entidades", post(pages::entidades))
        .route(
            "/clasificacion",
            get(pages::clasificacion).post(pages::clasificar),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
