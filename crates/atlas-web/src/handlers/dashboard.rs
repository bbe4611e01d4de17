//! Landing page: atlas totals and the per-layer table.

use axum::{extract::State, response::Html};
use tracing::warn;

use atlas_views::overview::{layer_overview, LayerOverview};

use crate::state::SharedState;

/// Navigation links shared by the HTML pages
pub const NAV_HTML: &str = r#"<nav class="nav">
    <a href="/">Overview</a>
    <a href="/api/summary">Summary JSON</a>
    <a href="/api/causal">Causal</a>
    <a href="/api/perturbation">Perturbation</a>
    <a href="/api/svd">SVD baseline</a>
    <a href="/api/status">Status</a>
</nav>"#;

pub async fn dashboard(State(state): State<SharedState>) -> Html<String> {
    match state.loader.global_summary().await {
        Ok(summary) => Html(render_dashboard(&layer_overview(&summary))),
        Err(e) => {
            warn!(error = %e, "Dashboard rendered without summary");
            Html(render_page(&format!(
                r#"<div class="error">Error: {}</div>"#,
                escape(&e.to_string())
            )))
        }
    }
}

fn render_dashboard(overview: &LayerOverview) -> String {
    let t = &overview.totals;
    let rows: String = overview
        .layers
        .iter()
        .map(|l| {
            let variance = l
                .variance_explained
                .map(|v| format!("{:.1}%", v * 100.0))
                .unwrap_or_else(|| "-".to_string());
            format!(
                r#"
            <tr>
                <td><a href="/api/layers/{layer}/features">L{layer:02}</a></td>
                <td>{}</td>
                <td>{}</td>
                <td>{}</td>
                <td>{:.1}%</td>
                <td><a href="/api/layers/{layer}/modules">{}</a></td>
                <td>{}</td>
                <td><a href="/api/novel/{layer}">{}</a></td>
                <td>{}</td>
            </tr>"#,
                l.alive,
                l.dead,
                l.annotated,
                l.annotation_pct,
                l.n_modules,
                l.n_svd_aligned,
                l.n_novel,
                variance,
                layer = l.layer,
            )
        })
        .collect();

    render_page(&format!(
        r#"
    <h1>SAE Atlas</h1>
    <div class="stats">
        <div class="stat"><span>{}</span> features</div>
        <div class="stat"><span>{}</span> alive</div>
        <div class="stat"><span>{}</span> annotated</div>
        <div class="stat"><span>{}</span> modules</div>
        <div class="stat"><span>{}</span> novel</div>
        <div class="stat"><span>{}</span> layers</div>
    </div>
    <table>
        <thead>
            <tr>
                <th>Layer</th><th>Alive</th><th>Dead</th><th>Annotated</th><th>Rate</th>
                <th>Modules</th><th>SVD aligned</th><th>Novel</th><th>Variance</th>
            </tr>
        </thead>
        <tbody>{}
        </tbody>
    </table>"#,
        t.features, t.alive, t.annotated, t.modules, t.novel, t.n_layers, rows
    ))
}

fn render_page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>SAE Atlas</title>
</head>
<body>
{NAV_HTML}
<main>{body}
</main>
</body>
</html>"#
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_common::artifacts::GlobalSummary;
    use atlas_test_utils::fixtures;

    #[test]
    fn test_dashboard_lists_every_layer() {
        let summary: GlobalSummary = serde_json::from_value(fixtures::global_summary()).unwrap();
        let html = render_dashboard(&layer_overview(&summary));
        assert!(html.contains("<span>82525</span> features"));
        assert!(html.contains(r#"<a href="/api/layers/0/features">L00</a>"#));
        assert!(html.contains(r#"<a href="/api/layers/1/features">L01</a>"#));
        assert!(html.contains("81.0%"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>&"), "&lt;b&gt;&amp;");
    }
}
