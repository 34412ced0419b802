// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use zhinst_log::info;
use zhinst_qcodes_generator::description::ClassDescription;
use zhinst_qcodes_generator::render::{module_file_name, render_instrument_class};

#[derive(Debug, Parser)]
#[command(author, version, about = "Generate QCoDeS node drivers from toolkit class descriptions")]
struct Args {
    /// Log the classes that are generated.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the driver of a toolkit instrument class and its submodules.
    InstrumentClass {
        /// JSON description of the class.
        description: PathBuf,
        /// Directory the generated module is written to.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    match args.command {
        Command::InstrumentClass {
            description,
            output_dir,
        } => generate_instrument_class(&description, &output_dir),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    env_logger::Builder::new().filter_level(level).init();
    zhinst_log::init_logging(verbose);
}

fn generate_instrument_class(description: &Path, output_dir: &Path) -> Result<()> {
    let json = fs::read_to_string(description)
        .with_context(|| format!("Failed to read {}", description.display()))?;
    let class = ClassDescription::from_json(&json)?;
    let source = description.file_name().map_or_else(
        || description.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );
    let mut code = render_instrument_class(&class, &source)?;
    if !code.ends_with('\n') {
        code.push('\n');
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let target = output_dir.join(module_file_name(&class));
    fs::write(&target, code).with_context(|| format!("Failed to write {}", target.display()))?;
    info!("Generated {} from {}", target.display(), description.display());
    Ok(())
}
