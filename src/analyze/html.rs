use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use super::stats::summary;
use super::timeline::TimelinePanel;
use super::{Comparison, CHART_TITLE, Y_AXIS_LABEL};
use crate::error::BenchResult;
use crate::store::write_json;

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Vega-Lite box plots faceted by benchmark
pub fn comparison_spec(comparison: &Comparison) -> Value {
    let mut values = Vec::new();
    for panel in &comparison.panels {
        for (input, sample) in comparison.inputs.iter().zip(&panel.samples) {
            for duration in sample {
                values.push(json!({
                    "benchmark": panel.title,
                    "input": input,
                    "duration": duration,
                }));
            }
        }
    }
    let order: Vec<_> = comparison.panels.iter().map(|p| &p.title).collect();

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": CHART_TITLE,
        "data": { "values": values },
        "facet": {
            "column": { "field": "benchmark", "type": "nominal", "sort": order, "title": null }
        },
        "spec": {
            "width": 160,
            "height": 400,
            "mark": { "type": "boxplot", "extent": "min-max" },
            "encoding": {
                "x": { "field": "input", "type": "nominal", "sort": comparison.inputs, "title": null },
                "y": { "field": "duration", "type": "quantitative", "title": Y_AXIS_LABEL },
                "color": { "field": "input", "type": "nominal", "sort": comparison.inputs }
            }
        },
        "resolve": { "scale": { "y": "independent" } }
    })
}

/// Vega-Lite bar chart per image spanning each node's pull
pub fn timeline_spec(panels: &[TimelinePanel]) -> Value {
    let values: Vec<_> = panels
        .iter()
        .flat_map(|panel| {
            panel.bars.iter().map(move |bar| {
                json!({
                    "benchmark": panel.title,
                    "node": bar.rank,
                    "start": bar.start,
                    "stop": bar.stop,
                })
            })
        })
        .collect();
    let order: Vec<_> = panels.iter().map(|p| &p.title).collect();

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": CHART_TITLE,
        "data": { "values": values },
        "facet": {
            "row": { "field": "benchmark", "type": "nominal", "sort": order, "title": null }
        },
        "spec": {
            "width": 600,
            "mark": "bar",
            "encoding": {
                "x": { "field": "start", "type": "quantitative", "title": Y_AXIS_LABEL },
                "x2": { "field": "stop" },
                "y": { "field": "node", "type": "ordinal", "title": "Node" }
            }
        },
        "resolve": { "scale": { "y": "independent" } }
    })
}

fn comparison_table(comparison: &Comparison) -> String {
    let mut rows = String::new();
    for panel in &comparison.panels {
        for (input, sample) in comparison.inputs.iter().zip(&panel.samples) {
            let Some(s) = summary(sample) else {
                continue;
            };
            rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td></tr>\n",
                escape(&panel.title),
                escape(input),
                s.min,
                s.p25,
                s.mean,
                s.p75,
                s.max
            ));
        }
    }
    format!(
        r#"<table>
<thead><tr><th>Benchmark</th><th>Input</th><th>Min</th><th>P25</th><th>Mean</th><th>P75</th><th>Max</th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
    )
}

fn timeline_table(panels: &[TimelinePanel]) -> String {
    let rows: String = panels
        .iter()
        .map(|p| format!("<tr><td>{}</td><td>{}</td></tr>\n", escape(&p.title), escape(&p.caption)))
        .collect();
    format!(
        r#"<table>
<thead><tr><th>Benchmark</th><th>Summary</th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_page(spec: &Value, table: &str) -> String {
    let title = CHART_TITLE;
    // a literal "</" inside the inline script would end the element early
    let spec = spec.to_string().replace("</", "<\\/");
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
    <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
    <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            color: #333;
            background: #f5f5f5;
            padding: 20px;
        }}
        .section {{
            background: white;
            border-radius: 12px;
            padding: 30px;
            margin-bottom: 20px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ padding: 8px 12px; text-align: left; border-bottom: 1px solid #eee; }}
        th {{ background: #f8f9fa; font-weight: 600; }}
    </style>
</head>
<body>
    <div class="section">
        <div id="chart"></div>
    </div>
    <div class="section">
{table}
    </div>
    <script>
        vegaEmbed("#chart", {spec});
    </script>
</body>
</html>
"##
    )
}

fn write_page(html_path: &Path, json_path: &Path, spec: &Value, table: &str) -> BenchResult<()> {
    write_json(json_path, spec)?;
    fs::write(html_path, render_page(spec, table))?;
    Ok(())
}

pub fn write_comparison(html_path: &Path, json_path: &Path, comparison: &Comparison) -> BenchResult<()> {
    let spec = comparison_spec(comparison);
    write_page(html_path, json_path, &spec, &comparison_table(comparison))
}

pub fn write_timeline(html_path: &Path, json_path: &Path, panels: &[TimelinePanel]) -> BenchResult<()> {
    let spec = timeline_spec(panels);
    write_page(html_path, json_path, &spec, &timeline_table(panels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::Panel;

    fn comparison() -> Comparison {
        Comparison {
            inputs: vec!["baseline".to_string(), "spegel".to_string()],
            panels: vec![Panel {
                title: "10MB-1 create".to_string(),
                samples: vec![vec![1.0, 2.0], vec![0.5, 0.25]],
            }],
        }
    }

    #[test]
    fn test_comparison_spec_values() {
        let spec = comparison_spec(&comparison());
        assert_eq!(spec["title"], CHART_TITLE);
        let values = spec["data"]["values"].as_array().unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[2]["input"], "spegel");
        assert_eq!(values[2]["duration"], 0.5);
        assert_eq!(spec["spec"]["encoding"]["y"]["title"], Y_AXIS_LABEL);
    }

    #[test]
    fn test_page_embeds_spec_and_summary() {
        let comparison = comparison();
        let spec = comparison_spec(&comparison);
        let page = render_page(&spec, &comparison_table(&comparison));
        assert!(page.contains("vegaEmbed(\"#chart\", {\"$schema\""));
        assert!(page.contains("<td>10MB-1 create</td><td>spegel</td><td>0.250</td>"));
        assert!(page.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a & b>"), "&lt;a &amp; b&gt;");
    }
}
