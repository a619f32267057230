//! Magnitude and phase traces for a rendering layer.
//!
//! Pure data out: nothing here draws. Phases are unwrapped in radians and
//! then converted to degrees.

use num_complex::Complex64;

use super::polarization::unwrap_phase;
use crate::error::{CstError, Result};

/// One labelled curve pair.
#[derive(Debug, Clone)]
pub struct Trace {
    pub label: String,
    pub magnitude: Vec<f64>,
    /// Unwrapped phase in degrees.
    pub phase_deg: Vec<f64>,
}

/// Traces sharing a frequency axis.
#[derive(Debug, Clone)]
pub struct TraceSet {
    pub frequency: Vec<f64>,
    pub traces: Vec<Trace>,
}

impl TraceSet {
    /// (min, max) of the finite frequencies, for the x-axis limits.
    pub fn span(&self) -> Option<(f64, f64)> {
        self.frequency
            .iter()
            .copied()
            .filter(|f| f.is_finite())
            .fold(None, |acc, f| match acc {
                None => Some((f, f)),
                Some((lo, hi)) => Some((lo.min(f), hi.max(f))),
            })
    }
}

/// Build magnitude / unwrapped-phase traces for each labelled series.
pub fn traces(frequency: &[f64], series: &[&[Complex64]], labels: &[&str]) -> Result<TraceSet> {
    if series.len() != labels.len() {
        return Err(CstError::Analysis(format!(
            "{} series but {} labels",
            series.len(),
            labels.len()
        )));
    }

    let mut traces = Vec::with_capacity(series.len());
    for (values, label) in series.iter().zip(labels) {
        if values.len() != frequency.len() {
            return Err(CstError::Analysis(format!(
                "series {} has {} samples, frequency axis has {}",
                label,
                values.len(),
                frequency.len()
            )));
        }
        let phase: Vec<f64> = values.iter().map(|z| z.arg()).collect();
        traces.push(Trace {
            label: label.to_string(),
            magnitude: values.iter().map(|z| z.norm()).collect(),
            phase_deg: unwrap_phase(&phase).iter().map(|p| p.to_degrees()).collect(),
        });
    }

    Ok(TraceSet {
        frequency: frequency.to_vec(),
        traces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_traces_unwrap_phase_in_degrees() {
        let freq = [1.0, 2.0, 3.0];
        let s: Vec<Complex64> = [170.0_f64, -170.0, -150.0]
            .iter()
            .map(|d| Complex64::from_polar(0.5, d.to_radians()))
            .collect();
        let set = traces(&freq, &[s.as_slice()], &["S21_VV"]).unwrap();
        let t = &set.traces[0];
        assert_eq!(t.label, "S21_VV");
        assert_abs_diff_eq!(t.magnitude[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(t.phase_deg[1], 190.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.phase_deg[2], 210.0, epsilon = 1e-9);
    }

    #[test]
    fn test_traces_span() {
        let s = vec![Complex64::new(1.0, 0.0); 3];
        let set = traces(&[2.5, 2.3, 2.4], &[s.as_slice()], &["a"]).unwrap();
        assert_eq!(set.span(), Some((2.3, 2.5)));
    }

    #[test]
    fn test_traces_label_count_mismatch() {
        let s = vec![Complex64::new(1.0, 0.0); 1];
        assert!(traces(&[1.0], &[s.as_slice()], &[]).is_err());
    }

    #[test]
    fn test_traces_length_mismatch() {
        let s = vec![Complex64::new(1.0, 0.0); 2];
        assert!(traces(&[1.0], &[s.as_slice()], &["a"]).is_err());
    }
}
