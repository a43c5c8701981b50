/*
 Copyright (c) 2023 clone206
 Copyright (c) 2026 polyconv contributors

 This file is part of polyconv

 polyconv is free software: you can redistribute it and/or modify it
 under the terms of the GNU General Public License as published by the
 Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 polyconv is distributed in the hope that it will be useful, but
 WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU General Public License for more details.
 You should have received a copy of the GNU General Public License
 along with polyconv. If not, see <https://www.gnu.org/licenses/>.
*/

use clap::Parser;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{debug, info, trace, warn};
use polyconv::postprocess::{edge_magnitude, normalize_max, to_u8, trim_tails};
use polyconv::{
    Buffer2D, CONV_POOL_SIZE, ColorLogger, ConvStrategy, TermResult, convolve, files, filters, pgm,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::thread::available_parallelism;
use std::time::Instant;
use std::{error::Error, io};

#[derive(Parser)]
#[command(name = "polyconv", version)]
struct Cli {
    /// Output directory path for filtered images. Directory
    /// must already exist but any subdirectories will be created as needed.
    /// [default: same as input file]
    #[arg(short = 'p', long = "path", default_value = None)]
    path: Option<PathBuf>,

    /// Kernel: S (5x5 smoothing), E (Sobel edge magnitude),
    /// M (matched filter, needs --filter)
    #[arg(short = 'k', long = "kernel", default_value = "S")]
    kernel: char,

    /// PGM image used as the matched filter
    #[arg(short = 'F', long = "filter")]
    filter: Option<PathBuf>,

    /// Convolution method: N (naive), D (direct), P (parallel)
    #[arg(short = 'm', long = "method", default_value = "P")]
    method: char,

    /// Worker threads for the parallel method
    #[arg(short = 'j', long = "threads", default_value_t = CONV_POOL_SIZE)]
    threads: usize,

    /// Time all three methods on every input and check they agree
    #[arg(short = 'b', long = "bench")]
    bench: bool,

    /// Print diagnostic messages
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Quiet mode: suppress all log output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Recurse into directories when the supplied input paths include folders
    #[arg(short = 'R', long = "recurse")]
    recurse: bool,

    /// Input .pgm files/folders
    #[arg(name = "FILES")]
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kernel {
    Smooth,
    Edge,
    Matched,
}

impl Kernel {
    fn suffix(self) -> &'static str {
        match self {
            Kernel::Smooth => "smooth",
            Kernel::Edge => "edge",
            Kernel::Matched => "matched",
        }
    }
}

/// Everything a worker needs to filter one image.
struct Job {
    kernel: Kernel,
    strategy: ConvStrategy,
    workers: usize,
    bench: bool,
    matched: Option<Buffer2D<u8>>,
    out_dir: Option<PathBuf>,
    base_dir: PathBuf,
}

fn main() -> TermResult {
    match run() {
        Ok(()) => TermResult(Ok(())),
        Err(e) => TermResult(Err(e.into())),
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let logger = ColorLogger::new(cli.quiet, cli.verbose);
    let max_level = logger.max_level();
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger).try_init()?;
    log::set_max_level(max_level);

    let avail_par = available_parallelism().map(|n| n.get()).unwrap_or(1);
    let thread_count = (avail_par / 2).max(1);

    // build_global can only be called once; ignore error if already set.
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build_global()
    {
        warn!(
            "Rayon pool initialization error ({} threads). Details: {:?}",
            thread_count, e
        );
    } else {
        trace!("Configured Rayon pool with {} threads", thread_count);
    }

    if cli.threads == 0 {
        return Err("Thread count must be at least 1".into());
    }

    let kernel = match cli.kernel.to_ascii_uppercase() {
        'S' => Kernel::Smooth,
        'E' => Kernel::Edge,
        'M' => Kernel::Matched,
        _ => return Err("Invalid kernel; must be S, E, or M".into()),
    };

    let strategy = match cli.method.to_ascii_uppercase() {
        'N' => ConvStrategy::Naive,
        'D' => ConvStrategy::Direct,
        'P' => ConvStrategy::Parallel {
            workers: cli.threads,
        },
        _ => return Err("Invalid method; must be N, D, or P".into()),
    };

    let matched = match (kernel, &cli.filter) {
        (Kernel::Matched, Some(filter_path)) => {
            let filter = pgm::read_pgm(filter_path)?;
            debug!(
                "Loaded {}x{} matched filter from {}",
                filter.width(),
                filter.height(),
                filter_path.display()
            );
            Some(filter)
        }
        (Kernel::Matched, None) => {
            return Err("Matched filtering (-k M) needs a filter image (-F)".into());
        }
        (_, Some(_)) => {
            warn!("--filter is only used with the matched kernel (-k M); ignoring it");
            None
        }
        (_, None) => None,
    };

    let mut inputs = cli.files.clone();
    inputs.sort();
    inputs.dedup();
    if inputs.is_empty() {
        return Err("No input files given".into());
    }

    let wall_start = Instant::now();

    // Filter to remove any glob patterns, yielding all inputted paths, canonicalized
    let paths = inputs
        .iter()
        .filter_map(|input| {
            if input.to_string_lossy().contains('*') {
                warn!(
                    "Unexpanded glob pattern detected in input: \"{}\". Skipping.",
                    input.display()
                );
                None
            } else {
                Some(input)
            }
        })
        .map(|p| p.canonicalize())
        .collect::<Result<Vec<_>, io::Error>>()?;

    let expanded_paths = files::find_files(&paths, cli.recurse, &["pgm"])?;
    let total_inputs = expanded_paths.len();
    if total_inputs == 0 {
        warn!("No .pgm files found among the inputs");
    }

    let job = Job {
        kernel,
        strategy,
        workers: cli.threads,
        bench: cli.bench,
        matched,
        out_dir: cli.path.clone(),
        base_dir: files::base_dir(&paths),
    };

    // Parallelize per input using Rayon; short-circuit on first error.
    expanded_paths
        .into_par_iter()
        .try_for_each(|path| filter_file(&path, &job, &multi))
        .map_err(|e| -> Box<dyn Error> { Box::new(io::Error::other(e)) })?;

    let total_secs = wall_start.elapsed().as_secs();
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    info!(
        "Processed {} inputs in {:02}:{:02}:{:02}",
        total_inputs, h, m, s
    );

    Ok(())
}

/// Read, filter and write one image, reporting progress per stage.
fn filter_file(path: &Path, job: &Job, multi: &MultiProgress) -> Result<(), String> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let style = ProgressStyle::with_template("{prefix} {bar:20.cyan/blue} {pos}/{len} {msg}")
        .map_err(|e| e.to_string())?;
    let stages = if job.bench { 4 } else { 3 };
    let pg = multi
        .add(ProgressBar::new(stages))
        .with_style(style)
        .with_prefix(format!("{} {}", "[Filtering]".bold(), file_name.bold()))
        .with_message("reading");

    let image = pgm::read_pgm(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    debug!(
        "{}: {}x{} image",
        file_name,
        image.width(),
        image.height()
    );
    pg.inc(1);

    if job.bench {
        pg.set_message("benchmarking");
        bench(&image, job, &file_name)?;
        pg.inc(1);
    }

    pg.set_message("convolving");
    let result = apply_kernel(&image, job, job.strategy);
    pg.inc(1);

    pg.set_message("writing");
    let out_path = files::output_path(
        path,
        &job.base_dir,
        job.out_dir.as_deref(),
        job.kernel.suffix(),
        "pgm",
    )
    .map_err(|e| format!("{}: {}", path.display(), e))?;
    pgm::write_pgm(&out_path, &result).map_err(|e| format!("{}: {}", out_path.display(), e))?;
    pg.inc(1);
    pg.finish_with_message("done");

    info!("Wrote {}", out_path.display());
    Ok(())
}

/// Filter an image and bring the result back to input size and 8 bits.
fn apply_kernel(image: &Buffer2D<u8>, job: &Job, strategy: ConvStrategy) -> Buffer2D<u8> {
    let (w, h) = (image.width(), image.height());
    match job.kernel {
        Kernel::Smooth => {
            let filter = filters::smooth_5x5();
            let full = convolve(image, &filter, strategy);
            to_u8(&trim_tails(&full, w, h, filter.conv_tail()))
        }
        Kernel::Edge => {
            let (sx, sy) = (filters::sobel_x(), filters::sobel_y());
            let g1 = trim_tails(&convolve(image, &sx, strategy), w, h, sx.conv_tail());
            let g2 = trim_tails(&convolve(image, &sy, strategy), w, h, sy.conv_tail());
            edge_magnitude(&g1, &g2)
        }
        Kernel::Matched => match &job.matched {
            Some(filter) => {
                let mut full = convolve(image, filter, strategy);
                normalize_max(&mut full);
                to_u8(&trim_tails(&full, w, h, filter.conv_tail()))
            }
            None => Buffer2D::new(w, h),
        },
    }
}

/// Time every method on `image` and fail if any result differs.
fn bench(image: &Buffer2D<u8>, job: &Job, name: &str) -> Result<(), String> {
    let methods = [
        ConvStrategy::Naive,
        ConvStrategy::Direct,
        ConvStrategy::Parallel {
            workers: job.workers,
        },
    ];

    let mut reference: Option<Buffer2D<u8>> = None;
    for method in methods {
        let start = Instant::now();
        let result = apply_kernel(image, job, method);
        let elapsed = start.elapsed();
        info!(
            "{}: {} took {:.3} ms",
            name,
            method,
            elapsed.as_secs_f64() * 1000.0
        );

        match &reference {
            Some(expected) if *expected != result => {
                return Err(format!("{}: {} disagrees with naive result", name, method));
            }
            Some(_) => {}
            None => reference = Some(result),
        }
    }
    Ok(())
}
