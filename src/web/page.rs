//! HTML rendering for the prediction form

use crate::types::parameters::{
    ParameterRange, FLOW_RATE_RANGE, PRESSURE_DIFF_RANGE, TEMPERATURE_RANGE,
};
use crate::types::{OperatingParameters, PredictionOutcome};

pub const PAGE_TITLE: &str = "Distillation Column Yield Predictor";

/// What the page shows on one render
#[derive(Debug, Clone, Default)]
pub struct PageView {
    /// Current control values
    pub params: OperatingParameters,
    /// Why the model is unavailable, if it is
    pub model_error: Option<String>,
    /// Result of the last prediction request
    pub outcome: Option<PredictionOutcome>,
    /// Submitted values that the controls could not have produced
    pub rejection: Option<String>,
}

struct Control {
    name: &'static str,
    label: &'static str,
    caption: &'static str,
    range: ParameterRange,
    value: i64,
}

/// Render the full page
pub fn render(view: &PageView) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 0; display: flex; }}
aside {{ width: 22rem; padding: 1.5rem; background: #f0f2f6; min-height: 100vh; }}
main {{ flex: 1; padding: 1.5rem 3rem; }}
.control {{ margin-bottom: 1.5rem; }}
.control input {{ width: 100%; }}
.caption {{ color: #666; font-size: 0.85rem; }}
.banner {{ padding: 0.8rem 1rem; border-radius: 0.4rem; margin: 1rem 0; }}
.success {{ background: #dff5e3; }}
.info {{ background: #e1ecfb; }}
.warning {{ background: #fff4d6; }}
.error {{ background: #fde2e1; }}
</style>
</head>
<body>
"#,
        title = PAGE_TITLE
    ));

    render_sidebar(&mut html, view);

    html.push_str(&format!(
        r#"<main>
<h1>🧪 {title}</h1>
<p>Welcome! This application uses a machine learning model to predict the yield of a
chemical product in a distillation column from key operating parameters.</p>
<p><strong>This tool can help process engineers and operators to:</strong></p>
<ul>
<li><strong>Optimize</strong> operating conditions for maximum yield.</li>
<li><strong>Predict</strong> the impact of process changes before implementing them.</li>
<li><strong>Troubleshoot</strong> potential problems by simulating different scenarios.</li>
</ul>
"#,
        title = PAGE_TITLE
    ));

    if let Some(reason) = &view.rejection {
        html.push_str(&format!(
            r#"<div class="banner error">Invalid input: {}</div>
"#,
            escape(reason)
        ));
    }

    match &view.model_error {
        Some(cause) => {
            html.push_str(&format!(
                r#"<div class="banner warning">The model could not be loaded. Please check the model file path.<br><span class="caption">{}</span></div>
"#,
                escape(cause)
            ));
        }
        None => render_outcome(&mut html, view.outcome.as_ref()),
    }

    html.push_str(
        r#"<hr>
<details>
<summary>ℹ️ About this application</summary>
<p><strong>How does it work?</strong></p>
<ol>
<li><strong>Input data:</strong> you set the key operating parameters with the sliders in the sidebar.</li>
<li><strong>Prediction:</strong> the pre-trained machine learning model receives these inputs and evaluates them
against the patterns it learned from historical data.</li>
<li><strong>Result:</strong> the application shows the predicted final yield as a percentage.</li>
</ol>
<p><strong>Model details:</strong></p>
<ul>
<li><strong>Model type:</strong> <code>Regression model</code> (optimized gradient boosted trees)</li>
<li><strong>Purpose:</strong> predict the continuous value of the distillation yield.</li>
<li><strong>Features used:</strong> feed flow rate, reboiler temperature and pressure differential.</li>
</ul>
</details>
</main>
</body>
</html>
"#,
    );

    html
}

fn render_sidebar(html: &mut String, view: &PageView) {
    let controls = [
        Control {
            name: "flow_rate",
            label: "Feed flow rate (m³/s)",
            caption: "Volume of feed mixture entering the column per second.",
            range: FLOW_RATE_RANGE,
            value: i64::from(view.params.flow_rate),
        },
        Control {
            name: "temperature",
            label: "Reboiler temperature (°C)",
            caption: "Temperature at the bottom of the column. Crucial for vaporizing the components.",
            range: TEMPERATURE_RANGE,
            value: i64::from(view.params.temperature),
        },
        Control {
            name: "pressure_diff",
            label: "Pressure differential (psi)",
            caption: "Pressure drop along the column. Influences the boiling points.",
            range: PRESSURE_DIFF_RANGE,
            value: i64::from(view.params.pressure_diff),
        },
    ];

    html.push_str(
        r#"<aside>
<h2>⚙️ Input parameters</h2>
<p>Adjust the sliders to match the operating parameters of the distillation column.</p>
<form method="post" action="/predict">
"#,
    );

    for control in &controls {
        html.push_str(&format!(
            r#"<div class="control">
<label for="{name}">{label}: <output id="{name}_value">{value}</output></label>
<input type="range" id="{name}" name="{name}" min="{min}" max="{max}" step="{step}" value="{value}" oninput="document.getElementById('{name}_value').value = this.value">
<div class="caption">{caption}</div>
</div>
"#,
            name = control.name,
            label = control.label,
            caption = control.caption,
            min = control.range.min,
            max = control.range.max,
            step = control.range.step,
            value = control.value,
        ));
    }

    let disabled = if view.model_error.is_some() {
        " disabled"
    } else {
        ""
    };
    html.push_str(&format!(
        r#"<button type="submit" id="predict"{disabled}>🚀 Predict yield</button>
</form>
</aside>
"#
    ));
}

fn render_outcome(html: &mut String, outcome: Option<&PredictionOutcome>) {
    match outcome {
        None => {}
        Some(PredictionOutcome::Predicted(prediction)) => {
            html.push_str(&format!(
                r#"<h3>📈 Prediction result</h3>
<div class="banner success"><strong>Predicted yield:</strong> <code>{prediction}</code></div>
<div class="banner info">This value is the estimated percentage of the desired product that will be recovered.</div>
"#
            ));
        }
        Some(PredictionOutcome::Failed(e)) => {
            html.push_str(&format!(
                r#"<div class="banner error">An error occurred during prediction: {}</div>
"#,
                escape(&e.to_string())
            ));
        }
        Some(PredictionOutcome::Unavailable(cause)) => {
            html.push_str(&format!(
                r#"<div class="banner warning">The model could not be loaded. Please check the model file path.<br><span class="caption">{}</span></div>
"#,
                escape(cause)
            ));
        }
    }
}

/// Escape text for inclusion in HTML element content or attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
