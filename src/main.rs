use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agrivision::ingest::is_accepted_extension;
use agrivision::report::{render_text, report_file_name, write_html};
use agrivision::{load_class_mapping, Args, Diagnoser, OnnxClassifier, Processor};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    if let Some(labels) = &args.labels {
        load_class_mapping(labels)?;
        info!(path = %labels.display(), "label file matches class order");
    }

    if let Some(dylib) = &args.ort_dylib {
        ort::init_from(dylib.display().to_string())
            .with_name("agrivision")
            .commit()
            .context("initialising ONNX Runtime")?;
    }

    let model_path = args.resolve_model().ok_or_else(|| {
        anyhow!(
            "no checkpoint found; pass --model or place one at {}",
            args.model_candidates()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" or ")
        )
    })?;

    let model = OnnxClassifier::load(&model_path, args.cuda)
        .with_context(|| format!("loading checkpoint {}", model_path.display()))?;
    let diagnoser = Diagnoser::new(model, Processor::default());

    match &args.source {
        Some(source) => run_once(&diagnoser, &args, source),
        None => run_interactive(&diagnoser, &args),
    }
}

fn run_once(diagnoser: &Diagnoser<OnnxClassifier>, args: &Args, source: &Path) -> Result<()> {
    diagnose_file(diagnoser, args, source, args.output.as_deref())
}

/// One request per stdin line, all served by the already loaded model.
fn run_interactive(diagnoser: &Diagnoser<OnnxClassifier>, args: &Args) -> Result<()> {
    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    info!("reading image paths from stdin");

    for line in io::stdin().lock().lines() {
        let line = line?;
        let path = PathBuf::from(line.trim());
        if path.as_os_str().is_empty() {
            continue;
        }

        let report_path = args.output.as_ref().map(|dir| dir.join(report_file_name(&path)));
        if let Err(err) = diagnose_file(diagnoser, args, &path, report_path.as_deref()) {
            warn!("{}: {err:#}", path.display());
        }
    }
    Ok(())
}

fn diagnose_file(
    diagnoser: &Diagnoser<OnnxClassifier>,
    args: &Args,
    source: &Path,
    report_path: Option<&Path>,
) -> Result<()> {
    if !is_accepted_extension(source) {
        warn!(path = %source.display(), "unusual extension, decoding anyway");
    }
    let bytes = std::fs::read(source).with_context(|| format!("reading {}", source.display()))?;
    let name = source.file_name().map(|n| n.to_string_lossy().into_owned());

    let diagnosis = diagnoser.diagnose(&bytes, name.as_deref())?;

    if args.profile {
        let t = diagnosis.timings;
        info!(
            decode = ?t.decode,
            preprocess = ?t.preprocess,
            inference = ?t.inference,
            "stage timings"
        );
    }

    println!("{}", source.display());
    print!("{}", render_text(&diagnosis));

    if let Some(report_path) = report_path {
        if report_path.is_dir() {
            bail!("{} is a directory; pass a file path for --output", report_path.display());
        }
        write_html(&diagnosis, name.as_deref().unwrap_or("upload"), report_path)?;
        info!(path = %report_path.display(), "wrote report");
    }
    Ok(())
}
