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

use std::io::{self, Write};

use colored::Colorize;
use log::{Level, LevelFilter, Metadata, Record};

/// stderr logger shared by both drivers. Usually installed through
/// `indicatif_log_bridge::LogWrapper` so progress bars stay intact.
#[derive(Clone)]
pub struct ColorLogger {
    max_level: LevelFilter,
}

impl ColorLogger {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let max_level = if quiet {
            LevelFilter::Off
        } else if verbose {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        };
        Self { max_level }
    }

    pub fn max_level(&self) -> LevelFilter {
        self.max_level
    }
}

impl log::Log for ColorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            match record.level() {
                Level::Error => eprintln!(
                    "{} {}",
                    "[ERROR]".red().bold(),
                    format!("{}", record.args()).red().bold()
                ),
                Level::Warn => eprintln!(
                    "{} {}",
                    "[WARN]".yellow().bold(),
                    format!("{}", record.args()).yellow().bold()
                ),
                _ => eprintln!(
                    "[{}] {}",
                    record.level().to_string().blue(),
                    record.args()
                ),
            }
        }
        self.flush();
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn level_selection() {
        let quiet = ColorLogger::new(true, true);
        assert_eq!(quiet.max_level(), LevelFilter::Off);

        let verbose = ColorLogger::new(false, true);
        let trace = Metadata::builder().level(Level::Trace).build();
        assert!(verbose.enabled(&trace));

        let normal = ColorLogger::new(false, false);
        assert!(!normal.enabled(&trace));
        let info = Metadata::builder().level(Level::Info).build();
        assert!(normal.enabled(&info));
    }
}
