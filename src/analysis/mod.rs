//! Analysis engine: polarization metrics and plot-ready traces.

pub mod polarization;
pub mod traces;

use crate::error::Result;
use crate::ir::{Component, CstData};

/// Axial ratio and phase difference over the frequency axis.
#[derive(Debug, Clone)]
pub struct PolarizationResult {
    /// Linear axial ratio; NaN or +inf where the closed form is invalid.
    pub axial_ratio: Vec<f64>,
    /// Unwrapped phase difference (radians), not limited to [-π, π].
    pub phase_diff: Vec<f64>,
}

impl PolarizationResult {
    pub fn len(&self) -> usize {
        self.axial_ratio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axial_ratio.is_empty()
    }

    /// `20 log10(AR)`.
    pub fn axial_ratio_db(&self) -> Vec<f64> {
        self.axial_ratio.iter().map(|ar| 20.0 * ar.log10()).collect()
    }

    pub fn phase_diff_deg(&self) -> Vec<f64> {
        self.phase_diff.iter().map(|p| p.to_degrees()).collect()
    }

    /// Samples whose axial ratio is NaN or infinite.
    pub fn invalid_count(&self) -> usize {
        self.axial_ratio.iter().filter(|ar| !ar.is_finite()).count()
    }
}

/// Run the polarization analysis on two components of a parsed file.
///
/// Missing components take part as NaN placeholders, which yields an
/// all-NaN result rather than an error.
pub fn run(data: &CstData, co: Component, cross: Component) -> Result<PolarizationResult> {
    let _span = tracing::info_span!("polarization", co = %co, cross = %cross).entered();

    for component in [co, cross] {
        if !data.get(component).is_present() {
            tracing::warn!(component = %component, "component missing from input, result will be NaN");
        }
    }

    let result = polarization::calc_ar(&data.filled(co), &data.filled(cross))?;
    tracing::info!(
        samples = result.len(),
        invalid = result.invalid_count(),
        "axial ratio computed"
    );
    Ok(result)
}
