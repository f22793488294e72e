// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use schnittwerk_core::AppConfig;
use schnittwerk_core::config::CONFIG_FILE;
use schnittwerk_core::geometry::BoundsPolicy;
use schnittwerk_core::paths::PathStyle;
use schnittwerk_core::types::OutputLayout;

#[derive(Debug, Parser)]
#[command(name = "schnittwerk", version)]
#[command(about = "Paginate scan batches and crop exam fields", long_about = None)]
pub struct Cli {
    /// JSON configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// SQLite database with the scan catalogue
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Directory for run logs
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Assign page numbers, exam codes and prefixes to the scan catalogue
    Paginate,
    /// Cut every selected field out of its page and record the crop path
    Crop(CropArgs),
    /// Print how many catalogue rows carry pagination data
    Verify,
}

#[derive(Debug, Default, Args)]
pub struct CropArgs {
    /// Root directory for crop output
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// `hierarchical` or `flat`
    #[arg(long)]
    pub layout: Option<OutputLayout>,

    /// Select every field, not only those without a crop path
    #[arg(long)]
    pub all: bool,

    /// With --all, re-extract fields whose crop already exists
    #[arg(long, requires = "all")]
    pub reprocess: bool,

    /// `clamp` or `reject` for rectangles overhanging the page
    #[arg(long)]
    pub bounds: Option<BoundsPolicy>,

    /// `windows` or `posix` separators in destination paths
    #[arg(long)]
    pub path_style: Option<PathStyle>,
}

impl Commands {
    /// Pipeline name used for the run log file.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Paginate => "paginate",
            Commands::Crop(_) => "crop",
            Commands::Verify => "verify",
        }
    }
}

impl Cli {
    /// Overlay command-line flags on file settings.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = log_dir.clone();
        }
        if let Commands::Crop(args) = &self.command {
            if let Some(output) = &args.output {
                config.output_dir = output.clone();
            }
            if let Some(layout) = args.layout {
                config.output_layout = layout;
            }
            if args.all {
                config.only_pending = false;
            }
            if args.reprocess {
                config.reprocess_existing = true;
            }
            if let Some(bounds) = args.bounds {
                config.bounds_policy = bounds;
            }
            if let Some(style) = args.path_style {
                config.path_style = style;
            }
        }
    }
}
