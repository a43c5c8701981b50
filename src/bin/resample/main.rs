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

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::available_parallelism;
use std::time::Instant;

use clap::Parser;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{debug, info, trace, warn};
use polyconv::resample::max_deviation;
use polyconv::{
    Buffer1D, ColorLogger, DirectResampler, PolyphaseResampler, Resample, TermResult, files,
    signal_file,
};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Samples fed between progress updates.
const CHUNK: usize = 4096;

#[derive(Parser, Debug)]
#[command(
    name = "resample",
    about = "Change the rate of raw float signals by U/D",
    version
)]
struct Cli {
    /// Output directory path for resampled signals. Directory
    /// must already exist but any subdirectories will be created as needed.
    /// [default: same as input file]
    #[arg(short = 'p', long = "path", default_value = None)]
    path: Option<PathBuf>,

    /// Upsampling factor U
    #[arg(short = 'u', long = "up", default_value = "3")]
    up: usize,

    /// Downsampling factor D
    #[arg(short = 'd', long = "down", default_value = "2")]
    down: usize,

    /// Prototype low-pass filter taps, in the same raw format as the inputs
    #[arg(short = 'F', long = "filter", required = true)]
    filter: PathBuf,

    /// Resampler type: D (direct circular buffer), P (polyphase bank)
    #[arg(short = 't', long = "type", default_value = "P")]
    kind: char,

    /// Print diagnostic messages
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Quiet mode: suppress all log output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Recurse into directories when the supplied input paths include folders
    #[arg(short = 'R', long = "recurse")]
    recurse: bool,

    /// Input .bin signal files/folders
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Direct,
    Polyphase,
}

impl Kind {
    fn build(self, up: usize, down: usize, taps: &[f32]) -> Result<Box<dyn Resample>, String> {
        let r: Box<dyn Resample> = match self {
            Kind::Direct => Box::new(DirectResampler::new(up, down, taps).map_err(|e| e.to_string())?),
            Kind::Polyphase => {
                Box::new(PolyphaseResampler::new(up, down, taps).map_err(|e| e.to_string())?)
            }
        };
        Ok(r)
    }
}

struct Job {
    kind: Kind,
    up: usize,
    down: usize,
    taps: Buffer1D<f32>,
    verify: bool,
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

    let kind = match cli.kind.to_ascii_uppercase() {
        'D' => Kind::Direct,
        'P' => Kind::Polyphase,
        _ => return Err("Invalid resampler type; must be D (direct) or P (polyphase)".into()),
    };

    let verify = std::env::var("POLYCONV_VERIFY")
        .map(|v| {
            let v = v.to_ascii_lowercase();
            v == "1" || v == "true" || v == "yes" || v == "on"
        })
        .unwrap_or(false);

    let taps = signal_file::read_signal(&cli.filter)?;
    if taps.is_empty() {
        return Err(format!("Filter file {} holds no taps", cli.filter.display()).into());
    }
    let taps = Buffer1D::from_vec(taps);
    debug!(
        "Loaded {} taps from {} (group delay {} samples at the upsampled rate)",
        taps.len(),
        cli.filter.display(),
        taps.half_length()
    );

    // Reject bad factors before touching any input.
    kind.build(cli.up, cli.down, taps.as_slice())?;
    if verify {
        let bank = PolyphaseResampler::new(cli.up, cli.down, taps.as_slice())?;
        if bank.used_taps() < taps.len() {
            warn!(
                "Polyphase bank uses {} of {} taps; the cross-check compares against a direct resampler on the same {}",
                bank.used_taps(),
                taps.len(),
                bank.used_taps()
            );
        }
        info!("POLYCONV_VERIFY set; cross-checking direct and polyphase resamplers");
    }

    let mut inputs = cli.files.clone();
    inputs.sort();
    inputs.dedup();

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

    let expanded_paths = files::find_files(&paths, cli.recurse, &["bin"])?;
    let total_inputs = expanded_paths.len();
    if total_inputs == 0 {
        warn!("No .bin files found among the inputs");
    }

    let job = Job {
        kind,
        up: cli.up,
        down: cli.down,
        taps,
        verify,
        out_dir: cli.path.clone(),
        base_dir: files::base_dir(&paths),
    };

    // Parallelize per input using Rayon; short-circuit on first error.
    expanded_paths
        .into_par_iter()
        .try_for_each(|path| resample_file(&path, &job, &multi))
        .map_err(|e| -> Box<dyn Error> { Box::new(io::Error::other(e)) })?;

    let total_secs = wall_start.elapsed().as_secs();
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    info!(
        "Resampled {} inputs in {:02}:{:02}:{:02}",
        total_inputs, h, m, s
    );

    Ok(())
}

fn resample_file(path: &Path, job: &Job, multi: &MultiProgress) -> Result<(), String> {
    let file_name = if let Some(name) = path.file_name() {
        name.to_string_lossy().into_owned()
    } else {
        return Err(format!("Invalid file path: {}", path.display()));
    };

    let input =
        signal_file::read_signal(path).map_err(|e| format!("Error reading {}: {}", file_name, e))?;
    let mut resampler = job.kind.build(job.up, job.down, job.taps.as_slice())?;

    let (sender, receiver) = mpsc::channel::<u64>();
    let style = ProgressStyle::with_template("{prefix} {bar:20.cyan/blue} {percent}{msg}")
        .map_err(|e| e.to_string())?;
    let pg = multi
        .add(ProgressBar::new(100))
        .with_style(style)
        .with_prefix(format!("{} {}", "[Resampling]".bold(), file_name.bold()))
        .with_message("%");

    // Feed on this Rayon worker; drive progress on a lightweight OS thread.
    let progress_handle = std::thread::spawn(move || {
        while let Ok(percent) = receiver.recv() {
            pg.set_position(percent);
            if percent == 100 {
                break;
            }
        }
    });

    let mut output = Vec::with_capacity(input.len() * job.up / job.down + 1);
    let total = input.len().max(1);
    let mut fed = 0;
    for chunk in input.chunks(CHUNK) {
        for &x in chunk {
            resampler.feed(x, &mut output);
        }
        fed += chunk.len();
        let _ = sender.send((fed * 100 / total) as u64);
    }
    let _ = sender.send(100);

    if let Err(e) = progress_handle.join() {
        return Err(format!("Progress thread panicked: {:?}", e));
    }

    debug!(
        "{}: {} samples in, {} out (U={} D={})",
        file_name,
        input.len(),
        output.len(),
        resampler.up(),
        resampler.down()
    );

    if job.verify {
        let (deviation, compared) = cross_check(job, &input)?;
        if deviation > 1e-5 {
            warn!(
                "{}: resamplers disagree, max deviation {:e} over {} samples",
                file_name, deviation, compared
            );
        } else {
            info!("{}: resamplers agree (max deviation {:e})", file_name, deviation);
        }
    }

    let suffix = format!("u{}d{}", job.up, job.down);
    let out_path = files::output_path(path, &job.base_dir, job.out_dir.as_deref(), &suffix, "bin")
        .map_err(|e| format!("Error preparing output for {}: {}", file_name, e))?;
    signal_file::write_signal(&out_path, &output)
        .map_err(|e| format!("Error writing {}: {}", out_path.display(), e))?;

    info!("Wrote {}", out_path.display());
    Ok(())
}

/// Run both forms over `input` and return the largest difference and how many
/// samples were compared. The bank only holds `used_taps()` coefficients, so
/// the direct form is given that same prefix.
fn cross_check(job: &Job, input: &[f32]) -> Result<(f32, usize), String> {
    let mut poly =
        PolyphaseResampler::new(job.up, job.down, job.taps.as_slice()).map_err(|e| e.to_string())?;
    let used = poly.used_taps();
    let mut direct = DirectResampler::new(job.up, job.down, &job.taps.as_slice()[..used])
        .map_err(|e| e.to_string())?;
    let a = poly.process(input);
    let b = direct.process(input);
    Ok((max_deviation(&a, &b), a.len().min(b.len())))
}
