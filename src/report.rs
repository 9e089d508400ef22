//! Result views: a plain-text summary for the terminal and a self-contained
//! HTML page mirroring the upload/result card of the web front end.

use std::fmt::{self, Write as _};
use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Local;
use image::{DynamicImage, ImageFormat};

use crate::error::{DiagnosisError, Result};
use crate::labels::NUM_CLASSES;
use crate::preprocess::PreprocessConfig;
use crate::service::Diagnosis;

const BAR_WIDTH: usize = 30;

/// Whole percent, truncated, as used for bar widths.
fn percent_floor(confidence: f32) -> u32 {
    (confidence * 100.0).clamp(0.0, 100.0) as u32
}

fn text_bar(confidence: f32) -> String {
    let filled = (percent_floor(confidence) as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn render_text(diagnosis: &Diagnosis) -> String {
    let top = diagnosis.prediction.top();
    let mut out = format!(
        "Top prediction: {}\n  {} {}%\n\n",
        top.label,
        text_bar(top.confidence),
        percent_floor(top.confidence)
    );
    for (i, runner) in diagnosis.prediction.runners_up().iter().enumerate() {
        out.push_str(&format!(
            "  #{} {:<30} {:>5.1}%\n",
            i + 2,
            runner.label.name(),
            runner.confidence * 100.0
        ));
    }
    out.push_str(&format!("\nTreatment advisory:\n  {}\n", diagnosis.advisory()));
    out
}

/// `leaf.jpg` becomes `leaf.jpg.html`, so uploads that differ only by
/// extension get separate reports.
pub fn report_file_name(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    format!("{name}.html")
}

pub fn escape_html(text: &str) -> String {
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

fn image_data_uri(diagnosis: &Diagnosis) -> Result<String> {
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(diagnosis.image.clone())
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| DiagnosisError::Io(std::io::Error::other(e)))?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

const STYLE: &str = "body{background:#0a0a0f;color:#e2e8f0;font-family:sans-serif;margin:0;padding:2rem}\
.card{display:flex;gap:2rem;max-width:1100px;margin:auto;background:rgba(255,255,255,.02);\
border:1px solid rgba(255,255,255,.06);border-radius:24px;padding:2rem}\
.upload img{max-width:480px;border-radius:16px}\
.verdict-name{font-size:1.8rem;font-weight:700;margin:.3rem 0 1rem}\
.bar-wrap{background:rgba(255,255,255,.08);border-radius:8px;height:10px}\
.bar{background:linear-gradient(90deg,#a78bfa,#38bdf8);border-radius:8px;height:10px}\
.pred{display:grid;grid-template-columns:3rem 1fr 4rem;gap:.5rem;margin:.6rem 0}\
.mini{grid-column:1/4;background:rgba(255,255,255,.05);height:4px}\
.mini div{background:#64748b;height:4px}\
.advisory{margin-top:1.5rem;padding:1rem;border-left:3px solid #38bdf8}\
footer{text-align:center;color:#64748b;font-size:.8rem;margin-top:2rem}";

pub fn render_html(diagnosis: &Diagnosis, source_name: &str) -> Result<String> {
    let image_uri = image_data_uri(diagnosis)?;
    let mut html = String::new();
    write_page(&mut html, diagnosis, source_name, &image_uri)
        .map_err(|e| DiagnosisError::Io(std::io::Error::other(e)))?;
    Ok(html)
}

fn write_page(html: &mut String, diagnosis: &Diagnosis, source_name: &str, image_uri: &str) -> fmt::Result {
    let top = diagnosis.prediction.top();
    let config = PreprocessConfig::default();

    writeln!(html, "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">")?;
    writeln!(html, "<title>AgriVision AI | {}</title>", escape_html(top.label.name()))?;
    writeln!(html, "<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"card\">")?;

    writeln!(
        html,
        "<div class=\"upload\">\n<img src=\"{image_uri}\" alt=\"{}\">\n</div>",
        escape_html(source_name)
    )?;

    writeln!(html, "<div class=\"results\">")?;
    writeln!(html, "<div class=\"verdict\">\n<div>Top Prediction</div>")?;
    writeln!(html, "<div class=\"verdict-name\">{}</div>", escape_html(top.label.name()))?;
    writeln!(
        html,
        "<div class=\"bar-wrap\"><div class=\"bar\" style=\"width:{}%\"></div></div>\n</div>",
        percent_floor(top.confidence)
    )?;

    writeln!(html, "<div class=\"list\">")?;
    for (i, runner) in diagnosis.prediction.runners_up().iter().enumerate() {
        writeln!(
            html,
            "<div class=\"pred\"><span>#{}</span><span>{}</span><span>{:.1}%</span>\
             <div class=\"mini\"><div style=\"width:{}%\"></div></div></div>",
            i + 2,
            escape_html(runner.label.name()),
            runner.confidence * 100.0,
            percent_floor(runner.confidence)
        )?;
    }
    writeln!(html, "</div>")?;

    writeln!(
        html,
        "<div class=\"advisory\">\n<div><strong>Treatment Advisory</strong></div>\n<div>{}</div>\n</div>",
        escape_html(diagnosis.advisory())
    )?;
    writeln!(html, "</div>\n</div>")?;

    writeln!(
        html,
        "<footer>Model: ResNet18 &middot; Classes: {} &middot; Input: {}&times;{} &middot; Output: Top-5 &middot; Generated {}</footer>",
        NUM_CLASSES,
        config.width,
        config.height,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(html, "</body>\n</html>")
}

pub fn write_html(diagnosis: &Diagnosis, source_name: &str, output_path: &Path) -> Result<()> {
    let html = render_html(diagnosis, source_name)?;
    std::fs::write(output_path, html)?;
    Ok(())
}
