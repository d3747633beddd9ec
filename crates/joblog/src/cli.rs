//! Command-line interface: inspect a saved job trace.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::conf::JobLogConfig;
use crate::job::{JobId, JobLogUri};
use crate::logs::{folding_regions, render, DecorationOptions, FoldingRegion, LineRange, Sections};
use crate::parser::ParserOptions;

/// joblog - render CI job traces
#[derive(Parser, Debug)]
#[command(name = "joblog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the trace with escape sequences removed
    Render {
        /// Render as a job that is still running
        #[arg(long)]
        running: bool,
        file: PathBuf,
    },

    /// Print the decoration groups as JSON
    Decorations {
        /// Include the running indicator
        #[arg(long)]
        running: bool,
        file: PathBuf,
    },

    /// Print the sections and folding regions as JSON
    Sections { file: PathBuf },

    /// Print the locator of a job log document
    Locator {
        repository_root: String,
        job: JobId,
    },
}

#[derive(Serialize)]
struct DecorationGroup<'a> {
    key: &'a str,
    decoration: Option<DecorationOptions>,
    ranges: &'a [LineRange],
}

#[derive(Serialize)]
struct SectionReport<'a> {
    sections: &'a Sections,
    folding_regions: Vec<FoldingRegion>,
}

pub fn render_text(raw: &str, running: bool, options: ParserOptions) -> String {
    render(raw, running, options).filtered_text
}

pub fn decorations_json(
    raw: &str,
    running: bool,
    options: ParserOptions,
) -> Result<String, serde_json::Error> {
    let rendered = render(raw, running, options);
    let groups: Vec<DecorationGroup<'_>> = rendered
        .decorations
        .iter()
        .map(|(key, ranges)| DecorationGroup {
            key,
            decoration: DecorationOptions::from_key(key),
            ranges,
        })
        .collect();
    serde_json::to_string_pretty(&groups)
}

pub fn sections_json(raw: &str, options: ParserOptions) -> Result<String, serde_json::Error> {
    let rendered = render(raw, false, options);
    serde_json::to_string_pretty(&SectionReport {
        sections: &rendered.sections,
        folding_regions: folding_regions(&rendered.sections),
    })
}

/// Run one command and return what it prints.
pub async fn run(cli: Cli, config: &JobLogConfig) -> Result<String, Box<dyn std::error::Error>> {
    let options = config.render.parser_options();
    let output = match cli.command {
        Commands::Render { running, file } => {
            render_text(&tokio::fs::read_to_string(&file).await?, running, options)
        }
        Commands::Decorations { running, file } => {
            decorations_json(&tokio::fs::read_to_string(&file).await?, running, options)?
        }
        Commands::Sections { file } => {
            sections_json(&tokio::fs::read_to_string(&file).await?, options)?
        }
        Commands::Locator { repository_root, job } => JobLogUri::new(repository_root, job).encode(),
    };
    Ok(output)
}
