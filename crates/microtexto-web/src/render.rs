//! Server-side HTML and SVG rendering.
//!
//! Everything is plain `format!`-built markup: a shared layout with the
//! sidebar menu, type-aware table rendering over Arrow batches, and the
//! generated visualizations (entity highlighting, dependency arcs,
//! top-words chart, word cloud). All user and corpus text goes through
//! [`escape`] before interpolation.

use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, LargeStringArray, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use microtexto_core::tags;
use microtexto_nlp::Doc;

/// Sidebar menu, in the original app's option order.
const MENU: &[(&str, &str)] = &[
    ("/", "Bienvenida"),
    ("/eda", "Análisis Exploratorio (EDA)"),
    ("/pln", "Aplicaciones de PLN"),
    ("/clasificacion", "Clasificación multiclase"),
];

/// Matplotlib default cycle, as the original charts used (`C0`–`C9`).
const CHART_COLORS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const STYLE: &str = "\
body{margin:0;display:flex;min-height:100vh;font-family:sans-serif;color:#262730}\
aside{width:18rem;background:#f0f2f6;padding:1.5rem;flex-shrink:0}\
aside h2{margin-top:0}\
aside ul{list-style:none;padding:0}\
aside li{margin:0.4rem 0}\
aside li.activo a{font-weight:bold}\
aside a{color:#262730;text-decoration:none}\
main{flex:1;padding:2rem;max-width:54rem}\
table{border-collapse:collapse;width:100%;font-size:0.85rem}\
th,td{border:1px solid #e6e9ef;padding:0.35rem 0.5rem;text-align:left;vertical-align:top}\
th{background:#f0f2f6}\
.info{background:#e8f0fe;border-radius:0.25rem;padding:0.75rem 1rem}\
.nota{color:#808495;font-size:0.8rem}\
details{border:1px solid #e6e9ef;border-radius:0.25rem;margin-bottom:1rem}\
details summary{cursor:pointer;padding:0.6rem 1rem;font-weight:bold}\
details .contenido{padding:0 1rem 1rem}\
textarea{width:100%;min-height:5rem;margin:0.5rem 0}\
button{background:#f0f2f6;border:1px solid #d2d6dd;border-radius:0.25rem;padding:0.4rem 1rem;cursor:pointer}\
.pildoras a{display:inline-block;background:#f0f2f6;border-radius:1rem;padding:0.25rem 0.9rem;margin:0 0.4rem 0.4rem 0;color:#262730;text-decoration:none}\
.pildoras a.activo{background:#ff4b4b;color:#fff}\
.nube{line-height:2.2;text-align:center;padding:1rem}\
.error{background:#ffecec;border-radius:0.25rem;padding:1rem}";

/// HTML-escape text before interpolation.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Page layout: sidebar menu plus content column.
pub fn layout(title: &str, active: &str, body: &str) -> String {
    let mut menu = String::new();
    for (href, label) in MENU {
        let class = if *href == active {
            " class=\"activo\""
        } else {
            ""
        };
        menu.push_str(&format!("<li{class}><a href=\"{href}\">{label}</a></li>"));
    }
    format!(
        "<!doctype html><html lang=\"es\"><head><meta charset=\"utf-8\">\
         <title>{} · microtexto</title><style>{STYLE}</style></head>\
         <body><aside><h2>microtexto</h2><ul>{menu}</ul></aside>\
         <main>{body}</main></body></html>",
        escape(title)
    )
}

/// Scrollable bordered wrapper for generated visualizations.
pub fn wrapper(inner: &str) -> String {
    format!(
        "<div style=\"overflow-x: auto; border: 1px solid #e6e9ef; \
         border-radius: 0.25rem; padding: 1rem; margin-bottom: 2.5rem\">{inner}</div>"
    )
}

/// Collapsible section, like the original app's expanders.
pub fn expander(summary: &str, body: &str, open: bool) -> String {
    format!(
        "<details{}><summary>{}</summary><div class=\"contenido\">{body}</div></details>",
        if open { " open" } else { "" },
        escape(summary)
    )
}

/// Highlighted info line used for tool output.
pub fn info(text: &str) -> String {
    format!("<p class=\"info\">{}</p>", escape(text))
}

/// Full error page.
pub fn error_page(msg: &str) -> String {
    layout(
        "Error",
        "",
        &format!("<div class=\"error\">{}</div>", escape(msg)),
    )
}

// ── Tables ──

/// Render a batch as an HTML table, capped at `max_rows`.
pub fn table(batch: &RecordBatch, max_rows: usize) -> String {
    let schema = batch.schema();
    let shown = batch.num_rows().min(max_rows);

    let mut html = String::from("<table><thead><tr>");
    for field in schema.fields() {
        html.push_str(&format!("<th>{}</th>", escape(field.name())));
    }
    html.push_str("</tr></thead><tbody>");

    for row in 0..shown {
        html.push_str("<tr>");
        for (idx, field) in schema.fields().iter().enumerate() {
            html.push_str(&format!(
                "<td>{}</td>",
                cell(batch.column(idx).as_ref(), field.data_type(), row)
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    if batch.num_rows() > shown {
        html.push_str(&format!(
            "<p class=\"nota\">Mostrando {shown} de {} filas</p>",
            batch.num_rows()
        ));
    }
    html
}

fn cell(col: &dyn Array, dtype: &DataType, row: usize) -> String {
    if col.is_null(row) {
        return String::new();
    }
    match dtype {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| escape(a.value(row)))
            .unwrap_or_default(),
        DataType::LargeUtf8 => col
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|a| escape(a.value(row)))
            .unwrap_or_default(),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row).to_string())
            .unwrap_or_default(),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| format!("{:.3}", a.value(row)))
            .unwrap_or_default(),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| if a.value(row) { "sí" } else { "no" }.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

// ── Word statistics ──

/// Horizontal bar chart of the top words, matplotlib-colored.
pub fn bar_chart(words: &[(String, usize)]) -> String {
    if words.is_empty() {
        return info("No hay palabras que mostrar");
    }
    let max = words.iter().map(|w| w.1).max().unwrap_or(1).max(1);

    const BAR_H: usize = 22;
    const GAP: usize = 6;
    const LABEL_W: usize = 170;
    const CHART_W: usize = 420;

    let height = words.len() * (BAR_H + GAP) + 10;
    let width = LABEL_W + CHART_W + 70;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         font-family=\"sans-serif\" font-size=\"13\">"
    );

    for (i, (word, count)) in words.iter().enumerate() {
        let y = 5 + i * (BAR_H + GAP);
        let w = (CHART_W * count) / max;
        let color = CHART_COLORS[i % CHART_COLORS.len()];
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"end\">{}</text>",
            LABEL_W - 8,
            y + BAR_H - 6,
            escape(word)
        ));
        svg.push_str(&format!(
            "<rect x=\"{LABEL_W}\" y=\"{y}\" width=\"{w}\" height=\"{BAR_H}\" fill=\"{color}\"/>"
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\">{count}</text>",
            LABEL_W + w + 6,
            y + BAR_H - 6
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Word cloud: font size scaled by frequency, cycling the chart palette.
pub fn word_cloud(words: &[(String, usize)]) -> String {
    if words.is_empty() {
        return info("No hay palabras que mostrar");
    }
    let max = words.iter().map(|w| w.1).max().unwrap_or(1) as f32;

    let mut html = String::from("<div class=\"nube\">");
    for (i, (word, count)) in words.iter().enumerate() {
        let size = 0.9 + 1.7 * (*count as f32 / max);
        let color = CHART_COLORS[i % CHART_COLORS.len()];
        html.push_str(&format!(
            "<span style=\"font-size:{size:.2}em;color:{color};padding:0.1em 0.35em;\
             display:inline-block\">{}</span>",
            escape(word)
        ));
    }
    html.push_str("</div>");
    html
}

// ── NLP visualizations ──

/// The source text with entity spans wrapped in colored marks.
pub fn entity_markup(doc: &Doc) -> String {
    let mut html = String::new();
    let mut cursor = 0;
    for ent in &doc.entities {
        html.push_str(&escape(&doc.text[cursor..ent.start]));
        html.push_str(&format!(
            "<mark style=\"background: {}; padding: 0.45em 0.6em; margin: 0 0.25em; \
             line-height: 1; border-radius: 0.35em\">{}\
             <span style=\"font-size: 0.8em; font-weight: bold; vertical-align: middle; \
             margin-left: 0.5rem\">{}</span></mark>",
            tags::entity_color(&ent.label),
            escape(&ent.text),
            escape(&ent.label)
        ));
        cursor = ent.end;
    }
    html.push_str(&escape(&doc.text[cursor..]));
    html
}

/// Dependency-arc visualization: tokens on a baseline, labelled arcs from
/// heads to dependents, arrowheads at the dependent.
pub fn dependency_svg(doc: &Doc) -> String {
    let n = doc.tokens.len();
    if n == 0 {
        return String::new();
    }

    const STEP: usize = 140;
    const PAD: usize = 70;
    const ARC_UNIT: usize = 34;

    let max_span = doc
        .tokens
        .iter()
        .enumerate()
        .map(|(i, t)| i.abs_diff(t.head))
        .max()
        .unwrap_or(0);

    let baseline = 30 + max_span * ARC_UNIT;
    let width = PAD * 2 + STEP * (n - 1);
    let height = baseline + 60;
    let x = |i: usize| PAD + i * STEP;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         font-family=\"sans-serif\">"
    );

    for (i, tok) in doc.tokens.iter().enumerate() {
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"15\">{}</text>",
            x(i),
            baseline + 24,
            escape(&tok.text)
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"12\" \
             fill=\"#808495\">{}</text>",
            x(i),
            baseline + 42,
            escape(&tok.pos)
        ));
    }

    for (i, tok) in doc.tokens.iter().enumerate() {
        if tok.head == i {
            continue; // root
        }
        let (a, b) = (i.min(tok.head), i.max(tok.head));
        let span = b - a;
        let top = baseline.saturating_sub(10 + span * ARC_UNIT);
        let (x1, x2) = (x(a), x(b));
        let mid = (x1 + x2) / 2;

        svg.push_str(&format!(
            "<path d=\"M {x1},{y} C {x1},{top} {x2},{top} {x2},{y}\" stroke=\"#5a5f6d\" \
             stroke-width=\"1.5\" fill=\"none\"/>",
            y = baseline - 4
        ));
        svg.push_str(&format!(
            "<text x=\"{mid}\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\" \
             fill=\"#5a5f6d\">{}</text>",
            top.saturating_sub(4).max(10),
            escape(&tok.dep)
        ));
        // Arrowhead at the dependent.
        let xd = x(i) as i64;
        svg.push_str(&format!(
            "<polygon points=\"{},{} {},{} {},{}\" fill=\"#5a5f6d\"/>",
            xd - 4,
            baseline - 10,
            xd + 4,
            baseline - 10,
            xd,
            baseline - 2
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Key table for the POS glossary.
pub fn pos_key_table() -> String {
    let mut html = String::from("<table><thead><tr><th>Etiqueta</th><th>Descripción</th></tr></thead><tbody>");
    for (tag, desc) in tags::POS_GLOSSARY {
        html.push_str(&format!("<tr><td>{tag}</td><td>{desc}</td></tr>"));
    }
    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use microtexto_nlp::{Entity, Token};
    use std::sync::Arc;

    fn doc_with_entity() -> Doc {
        let text = "Vive en Madrid".to_string();
        Doc {
            tokens: vec![
                Token {
                    text: "Vive".into(),
                    start: 0,
                    end: 4,
                    pos: "VERB".into(),
                    dep: "ROOT".into(),
                    head: 0,
                },
                Token {
                    text: "en".into(),
                    start: 5,
                    end: 7,
                    pos: "ADP".into(),
                    dep: "case".into(),
                    head: 2,
                },
                Token {
                    text: "Madrid".into(),
                    start: 8,
                    end: 14,
                    pos: "PROPN".into(),
                    dep: "obl".into(),
                    head: 0,
                },
            ],
            entities: vec![Entity {
                text: "Madrid".into(),
                label: "LOC".into(),
                start: 8,
                end: 14,
            }],
            text,
        }
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(escape("<b> & \"c\""), "&lt;b&gt; &amp; &quot;c&quot;");
    }

    #[test]
    fn layout_marks_active_menu_entry() {
        let html = layout("Prueba", "/eda", "<p>hola</p>");
        assert!(html.contains("class=\"activo\"><a href=\"/eda\""));
        assert!(html.contains("<p>hola</p>"));
    }

    #[test]
    fn table_renders_rows_and_caps() {
        let schema = Schema::new(vec![Field::new("Texto", DataType::Utf8, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["uno", "dos", "tres"]))],
        )
        .unwrap();

        let html = table(&batch, 2);
        assert!(html.contains("<td>uno</td>"));
        assert!(html.contains("<td>dos</td>"));
        assert!(!html.contains("<td>tres</td>"));
        assert!(html.contains("Mostrando 2 de 3 filas"));
    }

    #[test]
    fn table_escapes_cell_text() {
        let schema = Schema::new(vec![Field::new("Texto", DataType::Utf8, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["<script>"]))],
        )
        .unwrap();
        assert!(table(&batch, 10).contains("&lt;script&gt;"));
    }

    #[test]
    fn entity_markup_wraps_span() {
        let html = entity_markup(&doc_with_entity());
        assert!(html.starts_with("Vive en "));
        assert!(html.contains("<mark"));
        assert!(html.contains("Madrid"));
        assert!(html.contains("LOC"));
    }

    #[test]
    fn entity_markup_plain_text_without_entities() {
        let doc = Doc {
            text: "nada que ver".into(),
            ..Doc::default()
        };
        assert_eq!(entity_markup(&doc), "nada que ver");
    }

    #[test]
    fn dependency_svg_draws_tokens_and_arcs() {
        let svg = dependency_svg(&doc_with_entity());
        assert!(svg.starts_with("<svg"));
        // Three tokens, two arcs (the root draws none).
        assert_eq!(svg.matches("font-size=\"15\"").count(), 3);
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains(">case<"));
    }

    #[test]
    fn dependency_svg_empty_doc() {
        assert_eq!(dependency_svg(&Doc::default()), "");
    }

    #[test]
    fn bar_chart_scales_to_max() {
        let words = vec![("hola".to_string(), 10), ("adiós".to_string(), 5)];
        let svg = bar_chart(&words);
        assert!(svg.contains("width=\"420\""));
        assert!(svg.contains("width=\"210\""));
    }

    #[test]
    fn word_cloud_scales_font() {
        let words = vec![("grande".to_string(), 10), ("chico".to_string(), 1)];
        let html = word_cloud(&words);
        assert!(html.contains("font-size:2.60em"));
        assert!(html.contains("grande"));
    }

    #[test]
    fn pos_key_table_lists_glossary() {
        let html = pos_key_table();
        assert!(html.contains("<td>NOUN</td>"));
        assert!(html.contains("sustantivo"));
    }
}
