//! Command line: `serve` (default) runs the HTTP service, `screen` scores a folder offline.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::models::screening::{JobDescription, MimeKind, ScoreResult};
use crate::ranking::RankedResultSet;
use crate::screening::session::{UploadSession, MAX_FILES};
use crate::screening::Screener;

/// Joins list cells in the CSV export.
const LIST_SEPARATOR: &str = " | ";

#[derive(Parser)]
#[command(name = "screener", version, about = "Scores resumes against a job description")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve,
    /// Screen a folder of resumes and write scores.jsonl and scores.csv.
    Screen(ScreenArgs),
}

#[derive(clap::Args, Debug)]
pub struct ScreenArgs {
    /// Folder with .pdf/.docx resumes; the first five by name are screened.
    #[arg(long)]
    pub resumes: PathBuf,

    /// Plain-text job description.
    #[arg(long)]
    pub jd: PathBuf,

    /// Output folder, created if missing.
    #[arg(long, default_value = "out")]
    pub out: PathBuf,
}

/// Runs one offline screening pass and writes both exports.
pub async fn run_screen(screener: Arc<Screener>, args: &ScreenArgs, max_file_bytes: usize) -> Result<()> {
    let jd_text = fs::read_to_string(&args.jd)
        .with_context(|| format!("could not read job description {}", args.jd.display()))?;
    if jd_text.trim().is_empty() {
        bail!("job description {} is empty", args.jd.display());
    }

    let session = collect_resumes(&args.resumes, max_file_bytes)?;
    if session.is_empty() {
        bail!("no .pdf or .docx files found in {}", args.resumes.display());
    }
    info!("Screening {:?}", session.filenames());

    let ranked = screener
        .screen(session.into_documents(), JobDescription::new(jd_text.trim()))
        .await;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("could not create {}", args.out.display()))?;
    let jsonl = args.out.join("scores.jsonl");
    let csv = args.out.join("scores.csv");
    write_jsonl(&ranked, &jsonl)?;
    write_csv(&ranked, &csv)?;

    info!("Wrote {} and {}", jsonl.display(), csv.display());
    Ok(())
}

/// Loads the first `MAX_FILES` usable files in `dir`, sorted by name. Files that
/// cannot be read or are rejected by the session are logged and skipped.
pub fn collect_resumes(dir: &Path, max_file_bytes: usize) -> Result<UploadSession> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("could not list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(MimeKind::from_filename)
                .is_some()
        })
        .collect();
    paths.sort();

    let mut session = UploadSession::new(max_file_bytes);
    for path in paths {
        if session.len() == MAX_FILES {
            break;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                continue;
            }
        };
        match session.add(&name, bytes) {
            Ok(next) => session = next,
            Err(e) => warn!("Skipping {name}: {e}"),
        }
    }
    Ok(session)
}

pub fn write_jsonl(ranked: &RankedResultSet, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("could not create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for result in ranked.iter() {
        serde_json::to_writer(&mut out, result)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv(ranked: &RankedResultSet, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("could not create {}", path.display()))?;
    writer.write_record([
        "file",
        "candidate_name",
        "final_score",
        "hard_filter_pass",
        "top_reasons",
        "risks",
    ])?;
    for result in ranked.iter() {
        writer.write_record(csv_row(result))?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_row(result: &ScoreResult) -> [String; 6] {
    [
        result.file.clone(),
        result.candidate_name.clone().unwrap_or_default(),
        result.final_score.to_string(),
        result.hard_filter_pass.to_string(),
        result.top_reasons.join(LIST_SEPARATOR),
        result.risks.join(LIST_SEPARATOR),
    ]
}
