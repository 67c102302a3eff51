mod config;
mod error;
mod logging;
mod physics;
mod render;
mod selector;

use clap::{Parser, Subcommand};
use config::{validate_max_order, BeamConfig};
use error::RenderError;
use physics::Basis;
use rayon::prelude::*;
use render::{render_mode_png, write_png};
use selector::{Mode, Selection, GRID_SIZE};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gauss-modes", version, about = "Render and inspect Gaussian beam mode images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render intensity/phase images for every HG and LG mode
    Render {
        #[arg(long, default_value = "img")]
        out: PathBuf,
        /// Restrict to one family
        #[arg(long, value_parser = parse_mode)]
        only: Option<Mode>,
        /// Orders run over 0..max_order on both indices
        #[arg(long, default_value_t = GRID_SIZE)]
        max_order: u32,
        #[command(flatten)]
        beam: BeamConfig,
    },
    /// Decompose each mode back onto its basis and report the worst error
    Check {
        #[arg(long, value_parser = parse_mode)]
        only: Option<Mode>,
        #[arg(long, default_value_t = 4)]
        max_order: u32,
        #[arg(long, default_value_t = 1e-3)]
        tolerance: f64,
        #[command(flatten)]
        beam: BeamConfig,
    },
    /// Show how a page query string resolves
    Url {
        /// e.g. "?LG_3_7"
        query: Option<String>,
        /// Print the full page view as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_mode(tag: &str) -> Result<Mode, String> {
    Mode::from_tag(tag).ok_or_else(|| format!("unknown mode {tag:?}, expected HG or LG"))
}

fn families(only: Option<Mode>) -> Vec<Mode> {
    match only {
        Some(mode) => vec![mode],
        None => Mode::ALL.to_vec(),
    }
}

fn render_all(
    out: &Path,
    modes: &[Mode],
    max_order: u32,
    beam: &BeamConfig,
) -> Result<usize, RenderError> {
    let jobs: Vec<Selection> = (0..max_order)
        .flat_map(|a| (0..max_order).map(move |b| (a, b)))
        .flat_map(|(a, b)| modes.iter().filter_map(move |&mode| Selection::new(mode, a, b)))
        .collect();
    let total = jobs.len();
    let done = AtomicUsize::new(0);

    jobs.par_iter().try_for_each(|sel| {
        let bytes = render_mode_png(beam, sel.mode(), sel.i(), sel.j())?;
        let path = out.join(sel.mode().as_str()).join(sel.file_name());
        write_png(&path, &bytes)?;
        let k = done.fetch_add(1, Ordering::Relaxed) + 1;
        info!(mode = %sel, path = %path.display(), "Rendering mode {k}/{total}");
        Ok::<(), RenderError>(())
    })?;
    Ok(total)
}

/// Fails when any family's worst projection error exceeds `tolerance`.
fn check(
    beam: &BeamConfig,
    modes: &[Mode],
    max_order: u32,
    tolerance: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = Vec::new();
    for &mode in modes {
        let basis = Basis::new(beam, mode, max_order, max_order, false);
        let report = basis.self_check(max_order, max_order);
        info!(
            family = %basis.mode,
            modes = basis.len(),
            projection_error = report.projection_error,
            reconstruction_error = report.reconstruction_error,
            "basis check"
        );
        if report.projection_error > tolerance {
            warn!(family = %mode, tolerance, "projection error above tolerance");
            failed.push(mode);
        }
    }
    if !failed.is_empty() {
        return Err(format!("basis check failed for {failed:?}").into());
    }
    Ok(())
}

fn describe(query: Option<&str>, json: bool) -> Result<String, serde_json::Error> {
    let selection = selector::parse(query);
    if json {
        serde_json::to_string_pretty(&selector::view(selection))
    } else {
        Ok(format!("{selection} -> {}", selection.image_path()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            out,
            only,
            max_order,
            beam,
        } => {
            beam.validate()?;
            let max_order = validate_max_order(max_order)?;
            let modes = families(only);
            info!(out = %out.display(), max_order, points = beam.points, "rendering mode images");
            let count = render_all(&out, &modes, max_order, &beam)?;
            info!(count, "done");
        }
        Command::Check {
            only,
            max_order,
            tolerance,
            beam,
        } => {
            beam.validate()?;
            let max_order = validate_max_order(max_order)?;
            check(&beam, &families(only), max_order, tolerance)?;
        }
        Command::Url { query, json } => {
            println!("{}", describe(query.as_deref(), json)?);
        }
    }
    Ok(())
}
