use crate::error::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// A Plotly.js figure: traces, layout and optional animation frames
#[derive(Debug, Clone, Serialize)]
pub struct PlotlyFigure {
    pub data: Vec<Value>,
    pub layout: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Value>,
}

impl PlotlyFigure {
    pub fn new(title: &str) -> Self {
        Self {
            data: Vec::new(),
            layout: json!({
                "title": { "text": title },
                "template": "plotly_white",
            }),
            frames: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        self.layout["title"]["text"].as_str().unwrap_or("")
    }

    pub fn push_trace(&mut self, trace: Value) {
        self.data.push(trace);
    }

    /// Merge `extra` into the top level of the layout
    pub fn update_layout(&mut self, extra: Value) {
        if let (Value::Object(layout), Value::Object(extra)) = (&mut self.layout, extra) {
            layout.extend(extra);
        }
    }

    /// Standalone page that loads Plotly.js from its CDN
    pub fn to_html(&self) -> Result<String> {
        // A literal "</script>" inside the JSON would end the script block
        let figure_json = serde_json::to_string(self)?.replace("</", "<\\/");

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body>
<div id="figure" style="width:100%;height:95vh;"></div>
<script>
const figure = {figure};
Plotly.newPlot("figure", figure.data, figure.layout, {{responsive: true}}).then(function () {{
  if (figure.frames) {{
    Plotly.addFrames("figure", figure.frames);
  }}
}});
</script>
</body>
</html>
"#,
            title = escape_html(self.title()),
            cdn = PLOTLY_CDN,
            figure = figure_json,
        ))
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        let html = self.to_html()?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(html.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
