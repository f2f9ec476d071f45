use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, Subcommand};

use will_scraper::binary_utils::StreamReader;
use will_scraper::containers::{pack_from_dir, ArcVersion, Archive};
use will_scraper::error::ExtractError;
use will_scraper::extractor::{self, BatchJob, ExtractOptions, MaskSource};
use will_scraper::filesystem::find_files;
use will_scraper::formats::wipf::{self, ContainerHeader, ObjectHeader};
use will_scraper::formats::wsc;
use will_scraper::report::ConsoleObserver;

#[derive(Parser)]
#[command(
    name = "will_scraper",
    about = "Asset extraction toolkit for WillPlus visual novel engine games"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a WIPF image container into PNG files
    Wipf {
        /// Source WIP (or MSK) file
        file: PathBuf,
        /// Output template; use {index} for multi-object files. Without
        /// this, header information is printed instead
        #[arg(short, long)]
        output: Option<String>,
        /// Mask file composited in as the alpha channel
        #[arg(short, long, conflicts_with = "auto_mask")]
        mask: Option<PathBuf>,
        /// Look for a sibling .MSK file and composite it in
        #[arg(long)]
        auto_mask: bool,
        /// Skip the PNG optimisation pass
        #[arg(long)]
        no_optimise: bool,
    },
    /// Unpack or repack engine ARC archives
    Arc {
        #[command(subcommand)]
        command: ArcCommand,
    },
    /// Rotate WSC script bytes out of (or back into) their obfuscated form
    Wsc {
        input: PathBuf,
        output: PathBuf,
        /// Re-obfuscate instead of decoding
        #[arg(short, long)]
        reverse: bool,
    },
    /// Decode every image a reference list names, searching the given paths
    Batch {
        /// JSON reference file mapping listing tags to symbol arrays
        reference: PathBuf,
        /// Directories to search for WIP/MSK files
        #[arg(required = true)]
        search_paths: Vec<PathBuf>,
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Worker count (defaults to the number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Skip the PNG optimisation pass
        #[arg(long)]
        no_optimise: bool,
    },
}

#[derive(Subcommand)]
enum ArcCommand {
    Unpack {
        archive: PathBuf,
        output_dir: PathBuf,
        /// Use the later 13-byte name records
        #[arg(long)]
        wide_names: bool,
    },
    Pack {
        input_dir: PathBuf,
        archive: PathBuf,
        /// Use the later 13-byte name records
        #[arg(long)]
        wide_names: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), ExtractError> {
    match cli.command {
        Command::Wipf {
            file,
            output,
            mask,
            auto_mask,
            no_optimise,
        } => {
            let mask = match (mask, auto_mask) {
                (Some(path), _) => MaskSource::File(path),
                (None, true) => MaskSource::Auto,
                (None, false) => MaskSource::None,
            };
            run_wipf(&file, output.as_deref(), &mask, no_optimise)
        }
        Command::Arc { command } => match command {
            ArcCommand::Unpack {
                archive,
                output_dir,
                wide_names,
            } => {
                let archive = Archive::open(&archive, arc_version(wide_names))?;
                archive.unpack_to(&output_dir)?;
                println!("Unpacked {} entries", archive.entries().len());
                Ok(())
            }
            ArcCommand::Pack {
                input_dir,
                archive,
                wide_names,
            } => {
                let packed = pack_from_dir(&input_dir, arc_version(wide_names))?;
                fs::write(&archive, packed)?;
                println!("Packed {}", archive.display());
                Ok(())
            }
        },
        Command::Wsc {
            input,
            output,
            reverse,
        } => {
            let data = fs::read(&input)?;
            let transformed = if reverse {
                wsc::encode(&data)
            } else {
                wsc::decode(&data)
            };
            fs::write(&output, transformed)?;
            Ok(())
        }
        Command::Batch {
            reference,
            search_paths,
            output_dir,
            jobs,
            no_optimise,
        } => run_batch(
            &reference,
            &search_paths,
            &output_dir,
            jobs,
            no_optimise,
        ),
    }
}

fn arc_version(wide_names: bool) -> ArcVersion {
    if wide_names {
        ArcVersion::V2
    } else {
        ArcVersion::V1
    }
}

fn run_wipf(
    file: &Path,
    output: Option<&str>,
    mask: &MaskSource,
    no_optimise: bool,
) -> Result<(), ExtractError> {
    let template = match output {
        Some(template) => template,
        None => {
            let data = fs::read(file)?;
            let mut reader = StreamReader::new(&data);
            let (header, object_headers) = wipf::read_header(&mut reader)?;
            dump_info(file, &header, &object_headers);
            return Ok(());
        }
    };

    let options = ExtractOptions {
        optimise_png: !no_optimise,
        ..ExtractOptions::default()
    };
    let records = extractor::extract_file(file, mask, template, &options, &ConsoleObserver)?;
    for record in records {
        println!("Wrote {}", record.path.display());
    }
    Ok(())
}

fn dump_info(path: &Path, header: &ContainerHeader, object_headers: &[ObjectHeader]) {
    println!("Filename: {}", path.display());
    println!("Number of Objects: {}", header.objects);
    println!("Bit-depth: {}", header.depth);
    for (i, object) in object_headers.iter().enumerate() {
        println!("Object #{}:", i);
        println!("    Dimension: ({}, {})", object.width, object.height);
        println!("    Position: ({}, {})", object.offset_x, object.offset_y);
        println!("    Layer?: {}", object.unknown);
        println!("    Size: {}", object.compressed_size);
    }
}

fn run_batch(
    reference: &Path,
    search_paths: &[PathBuf],
    output_dir: &Path,
    jobs: Option<usize>,
    no_optimise: bool,
) -> Result<(), ExtractError> {
    let refs: HashMap<String, Vec<String>> = serde_json::from_slice(&fs::read(reference)?)
        .map_err(|e| ExtractError::Format(format!("bad reference file: {}", e)))?;

    let observer = ConsoleObserver;
    let mut batch_jobs = Vec::new();
    let mut tags: Vec<&String> = refs.keys().collect();
    tags.sort();
    for tag in tags {
        println!("=> Collecting references for image tag {}...", tag);
        for (symbol, path) in find_files(search_paths, &refs[tag], &observer)? {
            batch_jobs.push(BatchJob {
                tag: tag.clone(),
                symbol,
                path,
            });
        }
    }

    let options = ExtractOptions {
        optimise_png: !no_optimise,
        jobs: jobs.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }),
    };

    let outcome = extractor::run_batch(batch_jobs, output_dir, &options, &observer)?;
    println!(
        "Decoded {} object(s), {} file(s) failed",
        outcome.listing.records().len(),
        outcome.failures.len()
    );
    for failure in &outcome.failures {
        println!("    {}: {}", failure.path.display(), failure.error);
    }
    Ok(())
}
