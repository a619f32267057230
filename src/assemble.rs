//! Turns raw (freq, mag, phase) blocks into complex component series.
//!
//! The first block fixes the frequency axis. Later blocks are mapped onto
//! that axis positionally: their own frequency column is only compared to
//! flag mismatches, and their row count is forced to the axis length
//! (truncated, or padded with NaN).

use num_complex::Complex64;

use crate::error::{CstError, Result};
use crate::ir::{Component, CstData, Metadata, Sample, Series, N_COMPONENTS};
use crate::parser::{ParseOptions, Segmentation};

/// Relative tolerance when comparing frequency columns.
const AXIS_REL_TOL: f64 = 1e-9;

/// Build the frequency axis and the eight component series.
pub fn assemble(
    segmentation: Segmentation,
    metadata: Metadata,
    options: ParseOptions,
) -> Result<CstData> {
    let Segmentation {
        blocks,
        ignored_blocks,
        skipped_rows,
        lines,
    } = segmentation;

    let first = blocks.first().ok_or_else(|| {
        CstError::NoData(format!(
            "no data blocks found in {} lines{}",
            lines,
            if metadata.is_empty() {
                ""
            } else {
                " (parameter declaration was read)"
            }
        ))
    })?;

    let frequency: Vec<f64> = first.rows.iter().map(|s| s.freq).collect();
    let n = frequency.len();

    let mut series: [Series; N_COMPONENTS] = std::array::from_fn(|_| Series::Absent);
    let mut axis_mismatches = Vec::new();

    for (&component, block) in Component::ALL.iter().zip(&blocks) {
        if !axis_matches(&frequency, &block.rows) {
            if options.strict_axis {
                return Err(CstError::Parse(format!(
                    "line {}: frequency column of {} block does not match the first block",
                    block.line, component
                )));
            }
            tracing::warn!(
                component = %component,
                line = block.line,
                rows = block.rows.len(),
                expected = n,
                "frequency axis mismatch, using the first block's axis"
            );
            axis_mismatches.push(component);
        }
        series[component.index()] = Series::Present(to_complex(&block.rows, n));
    }

    tracing::debug!(
        samples = n,
        present = blocks.len(),
        skipped_rows,
        "assembled components"
    );

    Ok(CstData {
        frequency,
        series,
        metadata,
        axis_mismatches,
        ignored_blocks,
        skipped_rows,
    })
}

/// `mag * exp(j * phase)` with the phase in degrees.
pub fn polar_deg(mag: f64, phase_deg: f64) -> Complex64 {
    Complex64::from_polar(mag, phase_deg.to_radians())
}

/// Convert a block to exactly `n` complex samples.
fn to_complex(rows: &[Sample], n: usize) -> Vec<Complex64> {
    let nan = Complex64::new(f64::NAN, f64::NAN);
    rows.iter()
        .take(n)
        .map(|s| polar_deg(s.mag, s.phase))
        .chain(std::iter::repeat(nan))
        .take(n)
        .collect()
}

fn axis_matches(axis: &[f64], rows: &[Sample]) -> bool {
    axis.len() == rows.len()
        && axis.iter().zip(rows).all(|(&a, s)| {
            let scale = a.abs().max(s.freq.abs()).max(1.0);
            (a - s.freq).abs() <= AXIS_REL_TOL * scale
        })
}
