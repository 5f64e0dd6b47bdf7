//! Dashboard pages: one handler per sidebar option of the original app.

use axum::Form;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;

use microtexto_core::{Categoria, corpus};
use microtexto_corpus::{Dataset, Frequencies, filter_by_category, string_column};
use microtexto_nlp::{Verdict, similarity};

use crate::render;
use crate::{AppError, AppState};

const MAX_TABLE_ROWS: usize = 200;
const TOP_WORDS: usize = 30;

// ── Bienvenida ──

pub async fn bienvenida() -> Html<String> {
    let body = "\
        <h1>Caso de estudio: microficciones en <em>Twitter</em></h1>\
        <p>Esta aplicación forma parte de un proyecto general de investigación \
        que parte del enfoque de la analítica cultural de Lev Manovich, el cual \
        aborda las aplicaciones de las herramientas, métodos y técnicas de la \
        ciencia de datos para el estudio de conjuntos de datos culturales \
        masivos.</p>\
        <p>El usuario puede examinar tres clases de microtextos extraídos del \
        sitio de microblogging <em>Twitter</em> mediante el uso de su API. Los \
        textos recabados se han catalogado como noticias, microficciones, y \
        frases o reflexiones. Aunque el estudio se centra en el análisis de las \
        características de los <em>tweets</em> ficcionales, se recolectaron \
        también microtextos noticiosos y de reflexiones para desarrollar un \
        sistema automatizado de clasificación textual.</p>\
        <p>El modelo en que se basa el sistema de clasificación requiere \
        perfeccionarse para incrementar su precisión; no obstante, en su estado \
        actual puede ofrecer información relevante para el análisis de textos \
        digitales. El corpus aquí presentado fue elaborado durante el año 2020, \
        hasta el mes de septiembre.</p>\
        <p class=\"nota\">Cualquier duda o comentario: jeduardo.oliv@gmail.com</p>"
        .to_string();
    Html(render::layout("Bienvenida", "/", &body))
}

// ── Análisis exploratorio ──

#[derive(Deserialize)]
pub struct EdaQuery {
    pub conjunto: Option<String>,
    pub clase: Option<String>,
}

pub async fn eda(
    State(state): State<AppState>,
    Query(q): Query<EdaQuery>,
) -> Result<Html<String>, AppError> {
    let ds = match q.conjunto.as_deref() {
        Some(slug) => {
            Dataset::parse_slug(slug).map_err(|e| AppError::not_found(e.to_string()))?
        }
        None => Dataset::Microficciones,
    };
    let batch = state.store.dataset(ds)?;

    let mut body = render::expander(
        "Descripción de la sección",
        "<p>En esta sección, el usuario puede examinar y visualizar los \
         conjuntos de datos que conforman al corpus de este estudio.</p>",
        true,
    );

    // Dataset selector.
    body.push_str("<div class=\"pildoras\">");
    for d in Dataset::ALL {
        let class = if d == ds { " class=\"activo\"" } else { "" };
        body.push_str(&format!(
            "<a href=\"/eda?conjunto={}\"{class}>{}</a>",
            d.slug(),
            d.title()
        ));
    }
    body.push_str("</div>");

    if ds == Dataset::Preprocesado {
        let clase = q.clase.as_deref().and_then(Categoria::parse_slug);

        // Class filter.
        body.push_str("<div class=\"pildoras\">");
        let class = if clase.is_none() {
            " class=\"activo\""
        } else {
            ""
        };
        body.push_str(&format!(
            "<a href=\"/eda?conjunto=preprocesado\"{class}>Todas las clases</a>"
        ));
        for cat in Categoria::ALL {
            let class = if clase == Some(cat) {
                " class=\"activo\""
            } else {
                ""
            };
            body.push_str(&format!(
                "<a href=\"/eda?conjunto=preprocesado&clase={}\"{class}>{}</a>",
                cat.slug(),
                cat.title()
            ));
        }
        body.push_str("</div>");

        let suffix = clase.map(|c| format!("?clase={}", c.slug())).unwrap_or_default();
        body.push_str(&format!(
            "<p><a href=\"/eda/nube{suffix}\">Generar nube de palabras</a> · \
             <a href=\"/eda/frecuencias{suffix}\">Frecuencia de palabras</a></p>"
        ));

        let shown = match clase {
            Some(cat) => filter_by_category(&batch, cat)?,
            None => batch.as_ref().clone(),
        };
        body.push_str(&render::table(&shown, MAX_TABLE_ROWS));
    } else {
        body.push_str(&render::table(&batch, MAX_TABLE_ROWS));
    }

    Ok(Html(render::layout(ds.title(), "/eda", &body)))
}

#[derive(Deserialize)]
pub struct ClaseQuery {
    pub clase: Option<String>,
}

/// Stopword-filtered frequencies over the (optionally class-filtered)
/// clean-text column.
fn clean_text_frequencies(
    state: &AppState,
    clase: Option<Categoria>,
) -> Result<Frequencies, AppError> {
    let batch = state.store.preprocesado()?;
    let shown = match clase {
        Some(cat) => filter_by_category(&batch, cat)?,
        None => batch.as_ref().clone(),
    };
    let texts = string_column(&shown, corpus::TEXTO_LIMPIO)?;

    let mut freq = Frequencies::spanish();
    freq.add_all(texts.iter().copied());
    Ok(freq)
}

pub async fn frecuencias(
    State(state): State<AppState>,
    Query(q): Query<ClaseQuery>,
) -> Result<Html<String>, AppError> {
    let clase = q.clase.as_deref().and_then(Categoria::parse_slug);
    let freq = clean_text_frequencies(&state, clase)?;

    let title = match clase {
        Some(cat) => format!("Frecuencia de palabras — {}", cat.title()),
        None => "Frecuencia de palabras".to_string(),
    };
    let body = format!(
        "<h1>{}</h1>{}",
        render::escape(&title),
        render::wrapper(&render::bar_chart(&freq.top(TOP_WORDS)))
    );
    Ok(Html(render::layout(&title, "/eda", &body)))
}

pub async fn nube(
    State(state): State<AppState>,
    Query(q): Query<ClaseQuery>,
) -> Result<Html<String>, AppError> {
    let clase = q.clase.as_deref().and_then(Categoria::parse_slug);
    let freq = clean_text_frequencies(&state, clase)?;

    let title = match clase {
        Some(cat) => format!("Nube de palabras — {}", cat.title()),
        None => "Nube de palabras".to_string(),
    };
    let body = format!(
        "<h1>{}</h1>{}",
        render::escape(&title),
        render::wrapper(&render::word_cloud(&freq.top(TOP_WORDS * 2)))
    );
    Ok(Html(render::layout(&title, "/eda", &body)))
}

// ── Aplicaciones de PLN ──

/// Echoed inputs and rendered results for the four NLP tools.
#[derive(Default)]
struct PlnView {
    texto_pos: String,
    resultado_pos: Option<String>,
    texto_sim: (String, String),
    resultado_sim: Option<String>,
    texto_dep: String,
    resultado_dep: Option<String>,
    texto_ent: String,
    resultado_ent: Option<String>,
}

fn tool_form(action: &str, value: &str, button: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\
         <textarea name=\"texto\" placeholder=\"Introduce un texto aquí\">{}</textarea>\
         <button type=\"submit\">{button}</button></form>",
        render::escape(value)
    )
}

fn pln_html(view: &PlnView) -> String {
    let mut body = render::expander(
        "Descripción de la sección",
        "<p>En esta sección, el usuario puede revisar algunas de las \
         aplicaciones elementales del procesamiento de lenguaje natural.</p>",
        true,
    );

    // POS tagging.
    let mut pos = render::info(
        "El etiquetado de partes del discurso (POS tagging: Part of Speech) \
         consiste en la identificación de las funciones gramaticales que \
         cumple cada palabra en un texto.",
    );
    pos.push_str(&tool_form("/pln/etiquetado", &view.texto_pos, "Etiquetar"));
    if let Some(out) = &view.resultado_pos {
        pos.push_str(out);
    }
    pos.push_str(&render::expander(
        "Mostrar claves de etiquetado",
        &render::pos_key_table(),
        false,
    ));
    body.push_str(&render::expander(
        "Etiquetado de partes del discurso (POS tagging)",
        &pos,
        view.resultado_pos.is_some(),
    ));

    // Similarity.
    let mut sim = render::info(
        "La similitud entre textos se computa mediante la identificación de \
         semejanzas léxicas y semánticas entre frases aisladas o textos \
         extensos.",
    );
    sim.push_str(&format!(
        "<form method=\"post\" action=\"/pln/similitud\">\
         <textarea name=\"texto_01\" placeholder=\"Introduce el primer texto aquí\">{}</textarea>\
         <textarea name=\"texto_02\" placeholder=\"Introduce el segundo texto aquí\">{}</textarea>\
         <button type=\"submit\">Calcula la similitud entre textos</button></form>",
        render::escape(&view.texto_sim.0),
        render::escape(&view.texto_sim.1)
    ));
    if let Some(out) = &view.resultado_sim {
        sim.push_str(out);
    }
    body.push_str(&render::expander(
        "Similitud entre textos",
        &sim,
        view.resultado_sim.is_some(),
    ));

    // Dependency parse.
    let mut dep = render::info(
        "La visualización de dependencias sintácticas permite observar de \
         manera gráfica las relaciones estructurales entre palabras, por \
         ejemplo, la relación de determinación entre un sustantivo y un \
         adjetivo.",
    );
    dep.push_str(&tool_form(
        "/pln/dependencias",
        &view.texto_dep,
        "Generar visualización",
    ));
    if let Some(out) = &view.resultado_dep {
        dep.push_str(out);
    }
    body.push_str(&render::expander(
        "Visualización de dependencias sintácticas",
        &dep,
        view.resultado_dep.is_some(),
    ));

    // Named entities.
    let mut ent = render::info(
        "La visualización de entidades nombradas consiste en el \
         reconocimiento de palabras que se refieren a objetos o sujetos \
         reales, tales como personajes históricos, lugares, organizaciones, \
         etc.",
    );
    ent.push_str(&tool_form(
        "/pln/entidades",
        &view.texto_ent,
        "Generar visualización",
    ));
    if let Some(out) = &view.resultado_ent {
        ent.push_str(out);
    }
    body.push_str(&render::expander(
        "Visualización de entidades nombradas (NER)",
        &ent,
        view.resultado_ent.is_some(),
    ));

    render::layout("Aplicaciones de PLN", "/pln", &body)
}

pub async fn pln() -> Html<String> {
    Html(pln_html(&PlnView::default()))
}

#[derive(Deserialize)]
pub struct TextoForm {
    #[serde(default)]
    pub texto: String,
}

pub async fn etiquetado(
    State(state): State<AppState>,
    Form(form): Form<TextoForm>,
) -> Result<Html<String>, AppError> {
    let doc = state.annotator.lock().await.annotate(&form.texto)?;

    let mut out = String::new();
    for token in &doc.tokens {
        out.push_str(&render::info(&format!("{}: {}", token.text, token.pos)));
    }

    let view = PlnView {
        texto_pos: form.texto,
        resultado_pos: Some(out),
        ..PlnView::default()
    };
    Ok(Html(pln_html(&view)))
}

#[derive(Deserialize)]
pub struct SimilitudForm {
    #[serde(default)]
    pub texto_01: String,
    #[serde(default)]
    pub texto_02: String,
}

pub async fn similitud(
    State(state): State<AppState>,
    Form(form): Form<SimilitudForm>,
) -> Result<Html<String>, AppError> {
    let sim = {
        let mut embedder = state.embedder.lock().await;
        let a = embedder.embed(&form.texto_01)?;
        let b = embedder.embed(&form.texto_02)?;
        similarity(&a, &b)
    };

    let out = render::info(&format!(
        "El porcentaje de similitud entre ambos textos es de {:.0}%",
        sim * 100.0
    ));
    let view = PlnView {
        texto_sim: (form.texto_01, form.texto_02),
        resultado_sim: Some(out),
        ..PlnView::default()
    };
    Ok(Html(pln_html(&view)))
}

pub async fn dependencias(
    State(state): State<AppState>,
    Form(form): Form<TextoForm>,
) -> Result<Html<String>, AppError> {
    let doc = state.annotator.lock().await.annotate(&form.texto)?;

    let view = PlnView {
        texto_dep: form.texto,
        resultado_dep: Some(render::wrapper(&render::dependency_svg(&doc))),
        ..PlnView::default()
    };
    Ok(Html(pln_html(&view)))
}

pub async fn entidades(
    State(state): State<AppState>,
    Form(form): Form<TextoForm>,
) -> Result<Html<String>, AppError> {
    let doc = state.annotator.lock().await.annotate(&form.texto)?;

    let view = PlnView {
        texto_ent: form.texto,
        resultado_ent: Some(render::wrapper(&render::entity_markup(&doc))),
        ..PlnView::default()
    };
    Ok(Html(pln_html(&view)))
}

// ── Clasificación multiclase ──

const EXPLICACION: &str = "\
    <p>La clasificación se realizó entrenando un modelo de clasificación \
    multiclase, esto es, una tipología basada en más de dos etiquetas \
    mutuamente excluyentes: microficción, noticia, o frase/reflexión. La \
    clasificación en el procesamiento de lenguaje natural se basa en el \
    cómputo de atributos comunes en los textos a catalogar, como las \
    similitudes semánticas entre textos o la frecuencia de determinadas \
    partículas gramaticales. Cabe señalar que el modelo no tiene la \
    precisión deseada al momento; no obstante, se puede mejorar mediante \
    sucesivos entrenamientos.</p>";

fn clasificacion_html(texto: &str, resultado: Option<String>) -> String {
    let mut body = String::from(
        "<p>En esta sección, puedes obtener información sobre la posible \
         catalogación de un texto, según sea una microficción, una noticia o \
         una reflexión.</p>",
    );
    body.push_str(&render::info(
        "Escribe o copia y pega un fragmento de texto para obtener la \
         clasificación",
    ));
    body.push_str(&format!(
        "<form method=\"post\" action=\"/clasificacion\">\
         <textarea name=\"texto\" placeholder=\"Introduce un texto aquí\">{}</textarea>\
         <button type=\"submit\">Clasificar</button></form>",
        render::escape(texto)
    ));
    if let Some(out) = resultado {
        body.push_str(&out);
    }
    body.push_str(&render::expander("Explicación", EXPLICACION, false));
    render::layout("Clasificación multiclase", "/clasificacion", &body)
}

pub async fn clasificacion() -> Html<String> {
    Html(clasificacion_html("", None))
}

pub async fn clasificar(
    State(state): State<AppState>,
    Form(form): Form<TextoForm>,
) -> Result<Html<String>, AppError> {
    let embedding = state.embedder.lock().await.embed(&form.texto)?;

    let mut out = match state.classifier.classify(&embedding) {
        Verdict::Class { categoria, .. } => render::info(categoria.title()),
        Verdict::Unknown => render::info("El texto no ha podido ser clasificado"),
    };

    out.push_str("<ul>");
    for (cat, score) in state.classifier.scores(&embedding) {
        out.push_str(&format!(
            "<li>{}: {:.3}</li>",
            render::escape(cat.title()),
            score
        ));
    }
    out.push_str("</ul>");

    Ok(Html(clasificacion_html(&form.texto, Some(out))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pln_page_has_the_four_tool_forms() {
        let html = pln_html(&PlnView::default());
        for action in [
            "/pln/etiquetado",
            "/pln/similitud",
            "/pln/dependencias",
            "/pln/entidades",
        ] {
            assert!(html.contains(&format!("action=\"{action}\"")), "{action}");
        }
    }

    #[test]
    fn pln_page_echoes_input_and_result() {
        let view = PlnView {
            texto_pos: "hola <mundo>".into(),
            resultado_pos: Some(render::info("hola: INTJ")),
            ..PlnView::default()
        };
        let html = pln_html(&view);
        assert!(html.contains("hola &lt;mundo&gt;"));
        assert!(html.contains("hola: INTJ"));
    }

    #[test]
    fn clasificacion_page_has_form_and_explanation() {
        let html = clasificacion_html("", None);
        assert!(html.contains("action=\"/clasificacion\""));
        assert!(html.contains("Explicación"));
    }

    #[test]
    fn clasificacion_page_shows_result() {
        let html = clasificacion_html("un texto", Some(render::info("Noticia")));
        assert!(html.contains("Noticia"));
        assert!(html.contains("un texto"));
    }
}
