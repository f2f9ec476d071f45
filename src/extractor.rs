use std::collections::VecDeque;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;

use oxipng::{InFile, OutFile};

use crate::error::ExtractError;
use crate::formats::wipf::{self, WipFile};
use crate::graphics::wip_image::apply_mask;
use crate::listing::{ListingRecord, SceneListing};
use crate::report::ExtractObserver;

/// Placeholder an output template must contain to tell objects apart.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Where the alpha mask for a base file comes from.
#[derive(Debug, Clone)]
pub enum MaskSource {
    None,
    /// Look for a sibling `.MSK`/`.msk` next to the base file.
    Auto,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Run the written PNGs through oxipng. Failures are reported as
    /// warnings, never as errors.
    pub optimise_png: bool,
    /// Worker count for batch runs.
    pub jobs: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            optimise_png: true,
            jobs: 1,
        }
    }
}

/// Metadata for one written object file.
#[derive(Debug, Clone)]
pub struct OutputRecord {
    pub path: PathBuf,
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Decode a WIPF file and composite its mask in, when one is requested and
/// found.
pub fn decode_with_mask(wip_path: &Path, mask: &MaskSource) -> Result<WipFile, ExtractError> {
    let data = fs::read(wip_path)?;
    let mut wip = wipf::decode(&data)?;

    if let Some(mask_path) = resolve_mask_path(wip_path, mask) {
        let mask_data = fs::read(&mask_path)?;
        let mask_file = wipf::decode(&mask_data)?;
        apply_mask(&mut wip.objects, &mask_file.objects)?;
    }

    Ok(wip)
}

fn resolve_mask_path(wip_path: &Path, mask: &MaskSource) -> Option<PathBuf> {
    match mask {
        MaskSource::None => None,
        MaskSource::File(path) => Some(path.clone()),
        MaskSource::Auto => {
            // A standalone mask decoded as the base image has no sibling.
            let extension = wip_path.extension()?.to_str()?;
            if extension.eq_ignore_ascii_case("msk") {
                return None;
            }
            for sibling in ["MSK", "msk"] {
                let candidate = wip_path.with_extension(sibling);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
            None
        }
    }
}

/// Decode one file and write every object as a PNG named by the template.
///
/// The template is checked for an `{index}` placeholder before anything is
/// written: a multi-object file with a non-discriminating template would
/// silently overwrite earlier objects with later ones.
pub fn extract_file(
    wip_path: &Path,
    mask: &MaskSource,
    template: &str,
    options: &ExtractOptions,
    observer: &dyn ExtractObserver,
) -> Result<Vec<OutputRecord>, ExtractError> {
    let wip = decode_with_mask(wip_path, mask)?;

    if wip.objects.len() > 1 && !template.contains(INDEX_PLACEHOLDER) {
        return Err(ExtractError::Configuration {
            template: template.to_string(),
            objects: wip.objects.len(),
        });
    }

    let mut records = Vec::with_capacity(wip.objects.len());
    for (index, object) in wip.objects.iter().enumerate() {
        let output_path = PathBuf::from(template.replace(INDEX_PLACEHOLDER, &index.to_string()));
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if object.alpha.is_some() {
            object.to_rgba_image().save(&output_path)?;
        } else {
            object.pixels.save(&output_path)?;
        }

        if options.optimise_png {
            if let Err(e) = optimise_png(&output_path) {
                observer.warning(&format!(
                    "PNG optimisation failed for {}: {}",
                    output_path.display(),
                    e
                ));
            }
        }

        records.push(OutputRecord {
            path: output_path,
            index,
            width: object.width(),
            height: object.height(),
            offset_x: object.offset_x,
            offset_y: object.offset_y,
        });
    }

    Ok(records)
}

/// Optimises a written PNG in place for better compression.
fn optimise_png(path: &Path) -> Result<(), String> {
    let mut options = oxipng::Options::from_preset(4);
    options.bit_depth_reduction = true;

    oxipng::optimize(
        &InFile::Path(path.to_path_buf()),
        &OutFile::Path(Some(path.to_path_buf())),
        &options,
    )
    .map_err(|e| e.to_string())
}

/// One file of a batch run.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Listing tag the decoded images are grouped under.
    pub tag: String,
    /// Symbol the reference list used to name this image.
    pub symbol: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: ExtractError,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub listing: SceneListing,
    pub failures: Vec<BatchFailure>,
}

/// Decode a queue of files with a bounded worker pool.
///
/// Each file decode is fully self-contained, so workers share nothing but
/// the job queue and the listing, both behind mutexes. A failed file is
/// recorded and the run carries on; only after the pool drains are the
/// per-tag listing artifacts written under `<output_dir>/lists/`.
pub fn run_batch(
    jobs: Vec<BatchJob>,
    output_dir: &Path,
    options: &ExtractOptions,
    observer: &dyn ExtractObserver,
) -> Result<BatchOutcome, ExtractError> {
    fs::create_dir_all(output_dir)?;

    let queue = Mutex::new(VecDeque::from(jobs));
    let listing = Mutex::new(SceneListing::new());
    let failures = Mutex::new(Vec::new());
    let workers = options.jobs.max(1);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let job = match queue.lock().unwrap().pop_front() {
                    Some(job) => job,
                    None => break,
                };

                observer.file_started(&job.path);
                match run_batch_job(&job, output_dir, options, observer) {
                    Ok(records) => {
                        observer.file_finished(&job.path, records.len());
                        let mut listing = listing.lock().unwrap();
                        for record in records {
                            listing.push(record);
                        }
                    }
                    Err(error) => {
                        observer.file_failed(&job.path, &error);
                        failures.lock().unwrap().push(BatchFailure {
                            path: job.path,
                            error,
                        });
                    }
                }
            });
        }
    });

    let listing = listing.into_inner().unwrap();
    let failures = failures.into_inner().unwrap();
    write_listings(&listing, output_dir)?;

    Ok(BatchOutcome { listing, failures })
}

fn run_batch_job(
    job: &BatchJob,
    output_dir: &Path,
    options: &ExtractOptions,
    observer: &dyn ExtractObserver,
) -> Result<Vec<ListingRecord>, ExtractError> {
    // Group outputs by the directory the source came from, so same-named
    // images from different archives cannot collide.
    let archive_name = job
        .path
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("assets")
        .to_string();

    let file_dir = output_dir.join(&archive_name);
    fs::create_dir_all(&file_dir)?;

    let template = file_dir
        .join(format!("{}_{}.png", job.symbol, INDEX_PLACEHOLDER))
        .to_string_lossy()
        .into_owned();

    let records = extract_file(&job.path, &MaskSource::Auto, &template, options, observer)?;

    Ok(records
        .into_iter()
        .map(|record| ListingRecord {
            tag: job.tag.clone(),
            symbol: job.symbol.clone(),
            index: record.index,
            path: format!("{}/{}_{}.png", archive_name, job.symbol, record.index),
            offset_x: record.offset_x,
            offset_y: record.offset_y,
            width: record.width,
            height: record.height,
        })
        .collect())
}

fn write_listings(listing: &SceneListing, output_dir: &Path) -> Result<(), ExtractError> {
    if listing.is_empty() {
        return Ok(());
    }

    let lists_dir = output_dir.join("lists");
    fs::create_dir_all(&lists_dir)?;

    for tag in listing.tags() {
        let mut script = File::create(lists_dir.join(format!("{}list.rpy", tag)))?;
        listing.write_script(&tag, &mut script)?;

        let mut placements = File::create(lists_dir.join(format!("{}list.json", tag)))?;
        listing.write_placements(&tag, &mut placements)?;
    }

    Ok(())
}
