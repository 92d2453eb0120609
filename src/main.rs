use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rust_rdlmigrate::batch::print_summary;
use rust_rdlmigrate::{convert_report, run_batch, BatchOptions, ConvertOptions};

#[derive(Parser)]
#[command(name = "rust-rdlmigrate")]
#[command(
    author,
    version,
    about = "Embed shared data sources and shared datasets into report definitions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single .rdl file
    Convert {
        /// Path to the .rdl file
        #[arg(short, long)]
        report: PathBuf,

        /// Data source list (defaults to <report>.rds next to the report)
        #[arg(short, long)]
        data_sources: Option<PathBuf>,

        /// Folder of .rsd shared datasets (defaults to <report>_DataSets)
        #[arg(long)]
        data_sets: Option<PathBuf>,

        /// Output folder (defaults to ./output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Server path of the report, e.g. /Sales/Orders (defaults to /<report name>)
        #[arg(long)]
        owner: Option<String>,

        /// Do not add authoring metadata to the converted report
        #[arg(long)]
        no_origin_tag: bool,

        /// Validate the converted report against this XSD
        #[cfg(feature = "xsd-validation")]
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Convert a report or folder under a local report root, following subreports
    Batch {
        /// Local folder that stands in for the report server root
        #[arg(long)]
        root: PathBuf,

        /// Server path of the report or folder to convert, e.g. /Sales
        #[arg(short, long)]
        input: String,

        /// Output folder (defaults to ./output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace converted reports already in the output folder
        #[arg(long)]
        overwrite: bool,

        /// Do not add authoring metadata to converted reports
        #[arg(long)]
        no_origin_tag: bool,

        /// Validate converted reports against this XSD
        #[cfg(feature = "xsd-validation")]
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            report,
            data_sources,
            data_sets,
            output,
            owner,
            no_origin_tag,
            #[cfg(feature = "xsd-validation")]
            schema,
            verbose,
        } => {
            init_logging(verbose);

            #[cfg(not(feature = "xsd-validation"))]
            let schema = None;

            let options = ConvertOptions {
                report_path: report,
                data_sources,
                data_sets,
                output_dir: output,
                owner,
                origin_tag: !no_origin_tag,
                schema,
            };

            let summary = convert_report(options)?;
            println!("Converted report written to {}", summary.output_path.display());
        }
        Commands::Batch {
            root,
            input,
            output,
            overwrite,
            no_origin_tag,
            #[cfg(feature = "xsd-validation")]
            schema,
            verbose,
        } => {
            init_logging(verbose);

            #[cfg(not(feature = "xsd-validation"))]
            let schema = None;

            let options = BatchOptions {
                root,
                input,
                output_dir: output,
                overwrite,
                origin_tag: !no_origin_tag,
                schema,
            };

            let summary = run_batch(options)?;
            print_summary(&summary);
            if !summary.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
