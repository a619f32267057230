//! Run statistics collection for `--stats` output.

use std::time::{Duration, Instant};

use crate::analysis::PolarizationResult;
use crate::ir::CstData;

/// Collects counters and phase timings.
///
/// Created when `--stats` is passed and kept as `Option<Stats>`, so a normal
/// run never touches it.
pub struct Stats {
    total_start: Instant,
    phases: Vec<(&'static str, Duration)>,
    // Parsing
    pub samples: usize,
    pub blocks: usize,
    pub ignored_blocks: usize,
    pub skipped_rows: usize,
    pub axis_mismatches: usize,
    pub parameters: usize,
    // Polarization
    pub invalid_ar: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            total_start: Instant::now(),
            phases: Vec::new(),
            samples: 0,
            blocks: 0,
            ignored_blocks: 0,
            skipped_rows: 0,
            axis_mismatches: 0,
            parameters: 0,
            invalid_ar: 0,
        }
    }

    /// Record a completed phase with its duration.
    pub fn add_phase(&mut self, name: &'static str, duration: Duration) {
        self.phases.push((name, duration));
    }

    pub fn record_parse(&mut self, data: &CstData) {
        self.samples = data.len();
        self.blocks = data.present_count();
        self.ignored_blocks = data.ignored_blocks;
        self.skipped_rows = data.skipped_rows;
        self.axis_mismatches = data.axis_mismatches.len();
        self.parameters = data.metadata.params.len();
    }

    pub fn record_polarization(&mut self, result: &PolarizationResult) {
        self.invalid_ar = result.invalid_count();
    }

    /// Print the stats table to stderr.
    pub fn display(&self) {
        let total = self.total_start.elapsed();
        eprintln!();
        eprintln!("=== cstpol Run Stats ===");

        for (name, dur) in &self.phases {
            eprintln!("  {:<24} {:>8.3}ms", name, dur.as_secs_f64() * 1e3);
        }

        eprintln!("  Frequency samples:      {}", self.samples);
        eprintln!("  Parameters:             {}", self.parameters);
        eprintln!("  Data blocks:            {}  ignored={}", self.blocks, self.ignored_blocks);
        if self.skipped_rows > 0 {
            eprintln!("  Skipped rows:           {}", self.skipped_rows);
        }
        if self.axis_mismatches > 0 {
            eprintln!("  Axis mismatches:        {}", self.axis_mismatches);
        }
        eprintln!("  Invalid AR samples:     {}", self.invalid_ar);

        eprintln!("  ─────────────────────────────────");
        eprintln!("  Total:                  {:>8.3}ms", total.as_secs_f64() * 1e3);
    }
}
