use anyhow::{bail, Context, Result};
use authscope_lib::services::load_engine_config;
use authscope_lib::{init_logging, AnalysisEngine, ImageSubject};
use std::path::Path;

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_credential() -> Option<String> {
    ["AUTHSCOPE_API_TOKEN", "HF_API_TOKEN"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Declared mime type from the extension; empty lets the engine sniff the bytes.
fn mime_from_extension(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "",
    }
    .to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  authscope <path> [--text] [--mime <type>] [--out <json_path>]\n\nNotes:\n  - Files that decode as images go through the image pipeline; everything else is read as UTF-8 text.\n  - `--text` forces the text pipeline.\n  - The API token is read from AUTHSCOPE_API_TOKEN (or HF_API_TOKEN). Without one, remote signals fall back to local heuristics."
        );
        return Ok(());
    }

    init_logging();

    let path = args[1].clone();
    let force_text = has_flag(&args, "--text");
    let mime_override = parse_arg_value(&args, "--mime");
    let out_path = parse_arg_value(&args, "--out");

    let bytes = std::fs::read(&path).with_context(|| format!("read file failed: {}", path))?;
    let credential = read_credential().unwrap_or_default();

    let config = load_engine_config();
    let engine = AnalysisEngine::from_config(&config);

    let is_image = !force_text && image::guess_format(&bytes).is_ok();
    let json = if is_image {
        let mime = mime_override.unwrap_or_else(|| mime_from_extension(Path::new(&path)));
        let report = engine.analyze_image(ImageSubject::new(bytes, mime), &credential).await?;
        eprintln!(
            "{}: {} ({}/100)",
            path,
            report.verdict.label(),
            report.overall_score
        );
        serde_json::to_string_pretty(&report)?
    } else {
        let text = match String::from_utf8(bytes) {
            Ok(t) => t,
            Err(_) => bail!("{} is neither a decodable image nor UTF-8 text", path),
        };
        let report = engine.analyze_text(&text, &credential).await?;
        eprintln!(
            "{}: {} ({}/100)",
            path,
            report.verdict.label(),
            report.overall_score
        );
        serde_json::to_string_pretty(&report)?
    };

    match out_path {
        Some(out_path) => {
            std::fs::write(&out_path, json).with_context(|| format!("write out failed: {}", out_path))?;
            eprintln!("Wrote JSON: {}", out_path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
