//! Axial ratio and phase difference of two linear components.
//!
//! For co-polar `Tyy` and cross-polar `Txy` transmission samples:
//!
//! ```text
//! dφ   = unwrap(arg Tyy) - unwrap(arg Txy)
//! a    = |Tyy|^4 + |Txy|^4 + 2 |Tyy|^2 |Txy|^2 cos(2 dφ)
//! AR   = sqrt( (|Tyy|^2 + |Txy|^2 + sqrt(a)) / (|Tyy|^2 + |Txy|^2 - sqrt(a)) )
//! ```
//!
//! Invalid samples are not errors. A negative `a` gives NaN, a zero
//! denominator gives `+inf` (pure linear polarization, e.g. `Txy = 0`) and
//! `0/0` (both components zero) gives NaN.

use std::f64::consts::{FRAC_1_SQRT_2, PI, TAU};

use num_complex::Complex64;

use super::PolarizationResult;
use crate::error::{CstError, Result};

/// Remove artificial 2π jumps from a phase trace in radians.
///
/// Any step larger than π is replaced by its equivalent in [-π, π], with
/// the correction carried over to every later sample. NaN/infinite samples
/// pass through and the next finite sample is compared with the last
/// finite one.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(phase.len());
    let mut offset = 0.0;
    let mut prev: Option<f64> = None;

    for &p in phase {
        if !p.is_finite() {
            unwrapped.push(p);
            continue;
        }
        if let Some(last) = prev {
            let diff = p - last;
            if diff.abs() >= PI {
                let mut wrapped = (diff + PI).rem_euclid(TAU) - PI;
                if wrapped == -PI && diff > 0.0 {
                    wrapped = PI;
                }
                offset += wrapped - diff;
            }
        }
        prev = Some(p);
        unwrapped.push(p + offset);
    }
    unwrapped
}

/// `unwrap(arg tyy) - unwrap(arg txy)`, in radians.
pub fn phase_difference(tyy: &[Complex64], txy: &[Complex64]) -> Result<Vec<f64>> {
    check_lengths(tyy, txy)?;
    let py = unwrap_phase(&tyy.iter().map(|z| z.arg()).collect::<Vec<_>>());
    let px = unwrap_phase(&txy.iter().map(|z| z.arg()).collect::<Vec<_>>());
    Ok(py.iter().zip(&px).map(|(a, b)| a - b).collect())
}

/// Axial ratio of one sample from squared magnitudes and phase difference.
pub fn axial_ratio_sample(pow_yy: f64, pow_xy: f64, phase_diff: f64) -> f64 {
    let a = pow_yy * pow_yy + pow_xy * pow_xy + 2.0 * pow_yy * pow_xy * (2.0 * phase_diff).cos();
    let root = a.sqrt();
    let num = pow_yy + pow_xy + root;
    let den = pow_yy + pow_xy - root;
    (num / den).sqrt()
}

/// Axial ratio and unwrapped phase difference for every sample.
pub fn calc_ar(tyy: &[Complex64], txy: &[Complex64]) -> Result<PolarizationResult> {
    let phase_diff = phase_difference(tyy, txy)?;
    let axial_ratio = tyy
        .iter()
        .zip(txy)
        .zip(&phase_diff)
        .map(|((y, x), &dphi)| axial_ratio_sample(y.norm_sqr(), x.norm_sqr(), dphi))
        .collect();
    Ok(PolarizationResult {
        axial_ratio,
        phase_diff,
    })
}

/// Right/left-hand circular components:
/// `T++ = (Txy + j Tyy)/√2`, `T-- = (Txy - j Tyy)/√2`.
pub fn circular_components(
    tyy: &[Complex64],
    txy: &[Complex64],
) -> Result<(Vec<Complex64>, Vec<Complex64>)> {
    check_lengths(tyy, txy)?;
    let j = Complex64::i();
    let tpp = tyy.iter().zip(txy).map(|(&y, &x)| (x + j * y) * FRAC_1_SQRT_2).collect();
    let tmm = tyy.iter().zip(txy).map(|(&y, &x)| (x - j * y) * FRAC_1_SQRT_2).collect();
    Ok((tpp, tmm))
}

fn check_lengths(tyy: &[Complex64], txy: &[Complex64]) -> Result<()> {
    if tyy.len() != txy.len() {
        return Err(CstError::Analysis(format!(
            "component lengths differ: {} vs {}",
            tyy.len(),
            txy.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    // ---- Unwrapping ----

    #[test]
    fn test_unwrap_removes_jump() {
        let wrapped = [3.0, -3.0, -2.9];
        let out = unwrap_phase(&wrapped);
        assert_abs_diff_eq!(out[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1], -3.0 + TAU, epsilon = 1e-12);
        assert_abs_diff_eq!(out[2], -2.9 + TAU, epsilon = 1e-12);
    }

    #[test]
    fn test_unwrap_multiple_turns() {
        // a linear ramp sampled modulo 2π
        let ramp: Vec<f64> = (0..40).map(|i| i as f64 * 0.7).collect();
        let wrapped: Vec<f64> = ramp.iter().map(|p| (p + PI).rem_euclid(TAU) - PI).collect();
        let out = unwrap_phase(&wrapped);
        for (u, r) in out.iter().zip(&ramp) {
            assert_abs_diff_eq!(*u, *r, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unwrap_jump_larger_than_two_pi() {
        let out = unwrap_phase(&[0.0, 0.1 + 2.0 * TAU]);
        assert_abs_diff_eq!(out[1], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_unwrap_is_idempotent() {
        let wrapped: Vec<f64> = (0..50)
            .map(|i| ((i as f64 * 1.3).sin() * 4.0 + PI).rem_euclid(TAU) - PI)
            .collect();
        let once = unwrap_phase(&wrapped);
        let twice = unwrap_phase(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unwrap_passes_nan_through() {
        let out = unwrap_phase(&[3.0, f64::NAN, -3.0]);
        assert!(out[1].is_nan());
        assert_abs_diff_eq!(out[2], -3.0 + TAU, epsilon = 1e-12);
    }

    #[test]
    fn test_unwrap_empty() {
        assert!(unwrap_phase(&[]).is_empty());
    }

    // ---- Axial ratio ----

    #[test]
    fn test_ar_circular_quadrature() {
        // equal magnitudes, 90° apart
        let tyy = [c(0.0, 1.0), c(0.0, 0.5)];
        let txy = [c(1.0, 0.0), c(0.5, 0.0)];
        let r = calc_ar(&tyy, &txy).unwrap();
        for (ar, dphi) in r.axial_ratio.iter().zip(&r.phase_diff) {
            assert_abs_diff_eq!(*ar, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(*dphi, FRAC_PI_2, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ar_in_phase_equal_magnitudes_is_linear() {
        let r = calc_ar(&[c(1.0, 0.0)], &[c(1.0, 0.0)]).unwrap();
        assert_eq!(r.phase_diff[0], 0.0);
        assert!(r.axial_ratio[0].is_infinite() && r.axial_ratio[0] > 0.0);
    }

    #[test]
    fn test_ar_zero_cross_component_is_infinite() {
        let r = calc_ar(&[c(0.7, 0.2), c(-1.0, 0.0)], &[c(0.0, 0.0), c(0.0, 0.0)]).unwrap();
        assert!(r.axial_ratio.iter().all(|ar| ar.is_infinite() && *ar > 0.0));
    }

    #[test]
    fn test_ar_both_zero_is_nan() {
        let r = calc_ar(&[c(0.0, 0.0)], &[c(0.0, 0.0)]).unwrap();
        assert!(r.axial_ratio[0].is_nan());
    }

    #[test]
    fn test_ar_elliptical_closed_form() {
        // |Tyy| = 2, |Txy| = 1, quadrature: AR = |Tyy|/|Txy|
        let r = calc_ar(&[c(0.0, 2.0)], &[c(1.0, 0.0)]).unwrap();
        assert_abs_diff_eq!(r.axial_ratio[0], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ar_nan_sample_does_not_poison_neighbours() {
        let tyy = [c(0.0, 1.0), c(f64::NAN, f64::NAN), c(0.0, 1.0)];
        let txy = [c(1.0, 0.0), c(1.0, 0.0), c(1.0, 0.0)];
        let r = calc_ar(&tyy, &txy).unwrap();
        assert_abs_diff_eq!(r.axial_ratio[0], 1.0, epsilon = 1e-12);
        assert!(r.axial_ratio[1].is_nan());
        assert_abs_diff_eq!(r.axial_ratio[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ar_phase_diff_unwrapped_across_samples() {
        // Tyy phase crosses ±180°, Txy stays at 0°
        let deg = [170.0_f64, 179.0, -179.0, -170.0];
        let tyy: Vec<Complex64> = deg.iter().map(|d| Complex64::from_polar(1.0, d.to_radians())).collect();
        let txy = vec![c(1.0, 0.0); 4];
        let r = calc_ar(&tyy, &txy).unwrap();
        assert_abs_diff_eq!(r.phase_diff[2].to_degrees(), 181.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.phase_diff[3].to_degrees(), 190.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ar_length_mismatch() {
        let err = calc_ar(&[c(1.0, 0.0)], &[]).unwrap_err();
        assert!(matches!(err, CstError::Analysis(_)));
    }

    // ---- Circular components ----

    #[test]
    fn test_circular_components() {
        // Tyy = j, Txy = 1: all energy in T--
        let (tpp, tmm) = circular_components(&[c(0.0, 1.0)], &[c(1.0, 0.0)]).unwrap();
        assert_abs_diff_eq!(tpp[0].norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tmm[0].norm(), 2.0 * FRAC_1_SQRT_2, epsilon = 1e-12);
    }
}
