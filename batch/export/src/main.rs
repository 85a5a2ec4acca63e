//! 冠脉钙化评分批量导出工具.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod result;
mod runner;
mod settings;

use settings::ExportSettings;

#[derive(Parser)]
#[command(name = "cacs-export")]
#[command(about = "Batch CAC scoring and CSV export", long_about = None)]
struct Cli {
    /// Settings JSON file
    #[arg(short, long)]
    settings: PathBuf,

    /// Worker threads (defaults to the settings value, then all cores)
    #[arg(short, long)]
    workers: Option<usize>,

    /// More logging; repeat for trace output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("cannot initialise logger")?;

    let settings = ExportSettings::from_json_file(&cli.settings)
        .with_context(|| format!("loading settings from {}", cli.settings.display()))?;
    let workers = utils::workers(cli.workers.or(settings.workers));

    let summary = runner::run(&settings, workers)?;
    summary.report()?;
    Ok(())
}
