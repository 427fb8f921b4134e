//! Turns a [`Page`] into a standalone HTML document. Charts are drawn in the
//! browser by Plotly.js from the JSON figure emitted next to each chart div.

use std::fmt::Write as _;

use serde_json::{json, Value};
use shared::protocol::{
    Alert, AlertLevel, BannerRole, Block, ChartKind, ChartSpec, ColumnKind, Page, TablePreview,
};

pub const DEFAULT_PLOTLY_JS_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLESHEET: &str = r#"
body { background-color: #f3f4f6; font-family: "Source Sans Pro", sans-serif; margin: 0 auto; max-width: 960px; padding: 0 16px; }
h1 { color: #2f4f4f; }
.header, .footer { background-color: #4682b4; color: white; padding: 10px 0; text-align: center; font-size: 20px; }
.footer { margin-top: 30px; }
.section-header { color: #4682b4; font-size: 24px; font-weight: bold; margin-top: 20px; }
.data-preview, .feedback-form { background-color: #f0f8ff; padding: 15px; border-radius: 8px; margin-top: 15px; }
.data-preview table { border-collapse: collapse; width: 100%; overflow-x: auto; display: block; }
.data-preview th, .data-preview td { border: 1px solid #d0d7de; padding: 4px 8px; }
.data-preview td.num { text-align: right; }
.data-preview .dtype { color: #6a737d; font-weight: normal; font-size: 12px; }
.caption { color: #6a737d; font-size: 14px; }
.alert { padding: 12px 16px; border-radius: 8px; margin-top: 12px; }
.alert-info { background-color: #e7f1fb; color: #0c4a8a; }
.alert-success { background-color: #e6f4ea; color: #1e6b34; }
.alert-warning { background-color: #fff8e1; color: #8a6100; }
.alert-error { background-color: #fdecea; color: #a11d1d; }
.chart { min-height: 450px; margin-top: 12px; }
.feedback-form textarea { width: 100%; min-height: 100px; box-sizing: border-box; }
"#;

#[derive(Debug, Clone)]
pub struct HtmlOptions {
    pub title: String,
    pub plotly_js_url: String,
    pub upload_action: String,
    pub feedback_action: String,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            title: "Business Dashboard".to_string(),
            plotly_js_url: DEFAULT_PLOTLY_JS_URL.to_string(),
            upload_action: "/upload".to_string(),
            feedback_action: "/feedback".to_string(),
        }
    }
}

pub fn render_html(page: &Page, options: &HtmlOptions) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape(&options.title));
    let _ = writeln!(out, "<style>{STYLESHEET}</style>");
    if page.charts().next().is_some() {
        let _ = writeln!(
            out,
            "<script src=\"{}\" charset=\"utf-8\"></script>",
            escape(&options.plotly_js_url)
        );
    }
    out.push_str("</head>\n<body class=\"main\">\n");

    let mut chart_index = 0;
    for block in &page.blocks {
        match block {
            Block::Banner { role, text } => {
                let class = match role {
                    BannerRole::Header => "header",
                    BannerRole::Footer => "footer",
                };
                let _ = writeln!(out, "<div class=\"{class}\">{}</div>", escape(text));
            }
            Block::Text { text } => {
                let _ = writeln!(out, "<p>{}</p>", escape(text));
            }
            Block::SectionHeader { title } => {
                let _ = writeln!(out, "<div class=\"section-header\">{}</div>", escape(title));
            }
            Block::UploadForm { label, accept } => {
                let _ = writeln!(
                    out,
                    "<form method=\"post\" action=\"{}\" enctype=\"multipart/form-data\">\
                     <label for=\"file\">{}</label> \
                     <input type=\"file\" id=\"file\" name=\"file\" accept=\"{}\"> \
                     <button type=\"submit\">Upload</button></form>",
                    escape(&options.upload_action),
                    escape(label),
                    escape(accept)
                );
            }
            Block::Preview(preview) => write_preview(&mut out, preview),
            Block::Chart { chart, .. } => {
                chart_index += 1;
                write_chart(&mut out, chart_index, chart);
            }
            Block::Alert { alert, .. } => write_alert(&mut out, alert),
            Block::FeedbackForm {
                prompt,
                submit_label,
            } => {
                let _ = writeln!(
                    out,
                    "<form class=\"feedback-form\" method=\"post\" action=\"{}\">\
                     <label for=\"feedback\">{}</label>\
                     <textarea id=\"feedback\" name=\"feedback\"></textarea>\
                     <button type=\"submit\">{}</button></form>",
                    escape(&options.feedback_action),
                    escape(prompt),
                    escape(submit_label)
                );
            }
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn write_preview(out: &mut String, preview: &TablePreview) {
    out.push_str("<div class=\"data-preview\"><b>Preview of the Uploaded Data:</b>\n");
    let _ = writeln!(
        out,
        "<p class=\"caption\">{} rows × {} columns</p>",
        preview.total_rows,
        preview.columns.len()
    );
    out.push_str("<table>\n<thead><tr><th></th>");
    for column in &preview.columns {
        let _ = write!(
            out,
            "<th>{}<br><span class=\"dtype\">{}</span></th>",
            escape(&column.name),
            kind_label(column.kind)
        );
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for (index, row) in preview.rows.iter().enumerate() {
        let _ = write!(out, "<tr><th>{index}</th>");
        for (cell, column) in row.iter().zip(&preview.columns) {
            let numeric = matches!(column.kind, ColumnKind::Integer | ColumnKind::Float);
            let class = if numeric { " class=\"num\"" } else { "" };
            let _ = write!(out, "<td{class}>{}</td>", escape(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</div>\n");
}

fn write_alert(out: &mut String, alert: &Alert) {
    let class = match alert.level {
        AlertLevel::Info => "alert-info",
        AlertLevel::Success => "alert-success",
        AlertLevel::Warning => "alert-warning",
        AlertLevel::Error => "alert-error",
    };
    let _ = writeln!(
        out,
        "<div class=\"alert {class}\" role=\"alert\">{}</div>",
        escape(&alert.message)
    );
}

fn write_chart(out: &mut String, index: usize, chart: &ChartSpec) {
    let id = format!("chart-{index}");
    let figure = plotly_figure(chart);
    let _ = writeln!(
        out,
        "<div class=\"chart\" id=\"{id}\"></div>\n<script>Plotly.newPlot(\"{id}\", {}, {}, {{\"responsive\": true}});</script>",
        script_json(&figure["data"]),
        script_json(&figure["layout"])
    );
}

/// Plotly.js figure (`data` + `layout`) for one chart.
pub fn plotly_figure(chart: &ChartSpec) -> Value {
    let labels: Vec<&str> = chart.labels();
    let values: Vec<Option<f64>> = chart.points.iter().map(|point| point.value).collect();

    let trace = match chart.kind {
        ChartKind::Line => json!({
            "type": "scatter",
            "mode": "lines",
            "x": labels,
            "y": values,
            "name": chart.y_label,
        }),
        ChartKind::Pie => json!({
            "type": "pie",
            "labels": labels,
            "values": values,
        }),
        ChartKind::Bar => json!({
            "type": "bar",
            "x": labels,
            "y": values,
        }),
    };

    let mut layout = template_layout(&chart.template);
    layout["title"] = json!({ "text": chart.title });
    if chart.kind != ChartKind::Pie {
        layout["xaxis"]["title"] = json!({ "text": chart.x_label });
        layout["yaxis"]["title"] = json!({ "text": chart.y_label });
    }

    json!({ "data": [trace], "layout": layout })
}

/// Plotly.js has no named templates, so the dark theme is spelled out.
fn template_layout(template: &str) -> Value {
    match template {
        "plotly_dark" => json!({
            "paper_bgcolor": "rgb(17,17,17)",
            "plot_bgcolor": "rgb(17,17,17)",
            "font": { "color": "#f2f5fa" },
            "colorway": ["#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A",
                         "#19d3f3", "#FF6692", "#B6E880", "#FF97FF", "#FECB52"],
            "xaxis": { "gridcolor": "#283442", "zerolinecolor": "#283442" },
            "yaxis": { "gridcolor": "#283442", "zerolinecolor": "#283442" },
        }),
        _ => json!({ "xaxis": {}, "yaxis": {} }),
    }
}

fn kind_label(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer => "int",
        ColumnKind::Float => "float",
        ColumnKind::Text => "text",
        ColumnKind::Empty => "empty",
    }
}

/// JSON safe to inline inside a `<script>` element. `<` only occurs inside
/// string literals, where the unicode escape is equivalent.
fn script_json(value: &Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/html_tests.rs"]
mod tests;
