use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use niqe::{ModelParams, NiqeScorer, PatchSize};

#[derive(Parser, Debug)]
#[command(name = "niqe", about = "Score images with the no-reference NIQE quality metric.")]
struct Cli {
    /// Image file or directory to score
    path: PathBuf,

    /// Search the directory recursively
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Population statistics file (JSON with pop_mu and pop_cov)
    #[arg(long, default_value = "params.json")]
    params: PathBuf,

    /// Patch size: a number or "auto"
    #[arg(long, default_value = "auto")]
    patch_size: PatchSize,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or(false)
}

fn collect_images(path: &Path, recursive: bool) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .max_depth(depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_image(p))
        .collect();
    files.sort();
    files
}

fn score_file(scorer: &NiqeScorer, path: &Path) -> Result<f64> {
    let img = image::open(path).with_context(|| format!("decode {}", path.display()))?;
    let score = scorer
        .score(&img)
        .with_context(|| format!("score {}", path.display()))?;
    Ok(score)
}

fn main() -> Result<()> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;
    let cli = Cli::parse();

    let params = ModelParams::load(&cli.params)?;
    let scorer = NiqeScorer::with_patch_size(params, cli.patch_size)?;

    let files = collect_images(&cli.path, cli.recursive);
    if files.is_empty() {
        println!("no images found");
        return Ok(());
    }
    info!("scoring {} image(s)", files.len());

    // A bad image is skipped, not fatal to the batch.
    let scores: Vec<f64> = files
        .par_iter()
        .filter_map(|path| match score_file(&scorer, path) {
            Ok(score) => Some(score),
            Err(e) => {
                warn!("skipping {}: {:#}", path.display(), e);
                None
            }
        })
        .collect();

    if scores.is_empty() {
        anyhow::bail!("no image could be scored");
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    println!("NIQE : {:.2}", mean);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(is_image(Path::new("a/b/photo.JPG")));
        assert!(is_image(Path::new("photo.jpeg")));
        assert!(is_image(Path::new("photo.png")));
        assert!(!is_image(Path::new("photo.tiff")));
        assert!(!is_image(Path::new("photo")));
    }
}
