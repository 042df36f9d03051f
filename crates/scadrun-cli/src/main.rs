//! scadrun - batch export models from OpenSCAD using CSV or JSON parameter
//! sets, and convert parameter files between the two formats.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use scadrun_cli::{batch_export, convert, ExportOptions};
use scadrun_core::{ExportExtension, ExportFormat};

/// Batch export tool for parametric OpenSCAD models
#[derive(Parser)]
#[command(name = "scadrun")]
#[command(about = "Batch export models from OpenSCAD using CSV or JSON parameters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export models using CSV or JSON parameter sets
    Export {
        /// Path to the OpenSCAD (.scad) model file
        model_file: PathBuf,

        /// Path to the CSV or JSON parameter file
        parameter_file: PathBuf,

        /// Directory where exported files are written
        output_dir: PathBuf,

        /// Path to the OpenSCAD executable
        #[arg(long, default_value = "openscad")]
        openscad_path: PathBuf,

        /// Export format passed to the tool
        #[arg(long, default_value = "binstl", value_parser = ExportFormat::parse)]
        export_format: ExportFormat,

        /// File extension of exported models
        #[arg(long, default_value = "stl", value_parser = ExportExtension::parse)]
        export_extension: ExportExtension,

        /// Parameter sets to export, e.g. "1-3,7,every:2 in 0-10" (zero-based)
        #[arg(long)]
        select: Option<String>,

        /// Disable parallel processing and export sequentially
        #[arg(long)]
        sequential: bool,
    },

    /// Convert a CSV parameter file to JSON
    Csv2json {
        /// Path to the CSV file
        csv_file: PathBuf,

        /// Path to the output JSON file
        json_file: PathBuf,
    },

    /// Convert a JSON parameter file to CSV
    Json2csv {
        /// Path to the JSON file
        json_file: PathBuf,

        /// Path to the output CSV file
        csv_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: tracing subscriber already set");
    }

    match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Commands::Export {
            model_file,
            parameter_file,
            output_dir,
            openscad_path,
            export_format,
            export_extension,
            select,
            sequential,
        } => {
            let options = ExportOptions {
                model_path: model_file,
                parameter_file,
                output_dir,
                tool_path: openscad_path,
                format: export_format,
                extension: export_extension,
                selection: select,
                sequential,
            };
            let report = batch_export(&options).await?;
            print!("{}", report.render());

            // Exit status reflects whether any unit failed, even though
            // individual failures never abort the run.
            Ok(if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }

        Commands::Csv2json { csv_file, json_file } => {
            convert::csv_to_json(&csv_file, &json_file)?;
            println!("Converted {} to {}.", csv_file.display(), json_file.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Json2csv { json_file, csv_file } => {
            convert::json_to_csv(&json_file, &csv_file)?;
            println!("Converted {} to {}.", json_file.display(), csv_file.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
