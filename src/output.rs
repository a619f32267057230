//! Results output formatting (tab-delimited export, trace CSV).

use std::io::Write;

use crate::analysis::traces::TraceSet;
use crate::analysis::PolarizationResult;
use crate::error::{CstError, Result};
use crate::ir::{Component, CstData};

/// Components written to the export, each as a magnitude/phase column pair.
pub const EXPORT_COMPONENTS: [Component; 4] = [
    Component::S21Vv,
    Component::S21Hv,
    Component::S11Vv,
    Component::S11Hv,
];

/// Significant digits of every numeric field in the export.
pub const EXPORT_DIGITS: usize = 6;

pub const DEFAULT_EXPORT_STEM: &str = "export_cst_result";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RULE_WIDTH: usize = 91;

/// Header lines of an export report.
#[derive(Debug, Clone)]
pub struct ExportHeader {
    pub producer: String,
    pub timestamp: String,
    /// Original name of the input file.
    pub source_name: String,
}

impl ExportHeader {
    /// Header stamped with the current local time.
    pub fn now(producer: &str, source_name: &str) -> Self {
        Self {
            producer: producer.to_string(),
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            source_name: source_name.to_string(),
        }
    }
}

/// Write the polarization report.
///
/// Format:
/// ```text
/// %Producido por cstpol	2025-05-16 11:51:12
/// %Fichero de entrada: dipole.txt
/// %Parameters: name=monopole f0=2.4 N=4
/// %frequency	S21_VV_mag	S21_VV_phase	...	AR	phase_diff
/// %-------------------------------------------------------------------------------------------
/// 2.3	0.707107	45	...	1.00002	90.1
/// ```
///
/// Phases of the components are wrapped to (-180, 180]; `phase_diff` is the
/// unwrapped difference in degrees.
pub fn write_export<W: Write>(
    data: &CstData,
    result: &PolarizationResult,
    header: &ExportHeader,
    writer: &mut W,
) -> Result<()> {
    if result.len() != data.len() {
        return Err(CstError::Analysis(format!(
            "polarization result has {} samples, frequency axis has {}",
            result.len(),
            data.len()
        )));
    }

    writeln!(writer, "%Producido por {}\t{}", header.producer, header.timestamp)?;
    writeln!(writer, "%Fichero de entrada: {}", header.source_name)?;
    writeln!(writer, "%Parameters: {}", data.metadata.params_line())?;
    write!(writer, "%frequency")?;
    for c in EXPORT_COMPONENTS {
        write!(writer, "\t{}_mag\t{}_phase", c, c)?;
    }
    writeln!(writer, "\tAR\tphase_diff")?;
    writeln!(writer, "%{}", "-".repeat(RULE_WIDTH))?;

    let columns: Vec<_> = EXPORT_COMPONENTS.iter().map(|&c| data.filled(c)).collect();
    let phase_diff = result.phase_diff_deg();

    for (fi, freq) in data.frequency.iter().enumerate() {
        let mut fields = Vec::with_capacity(3 + 2 * columns.len());
        fields.push(*freq);
        for values in &columns {
            let z = values[fi];
            fields.push(z.norm());
            fields.push(z.arg().to_degrees());
        }
        fields.push(result.axial_ratio[fi]);
        fields.push(phase_diff[fi]);

        let row: Vec<String> = fields.iter().map(|&v| format_g(v, EXPORT_DIGITS)).collect();
        writeln!(writer, "{}", row.join("\t"))?;
    }
    Ok(())
}

/// Write magnitude / unwrapped phase traces as CSV.
///
/// Format:
/// ```csv
/// Frequency,S21_VV_mag,S21_VV_phase_deg,S21_HV_mag,S21_HV_phase_deg
/// 2.3,0.71,-12.5,0.70,-101.2
/// ```
pub fn write_traces_csv<W: Write>(set: &TraceSet, writer: &mut W) -> Result<()> {
    write!(writer, "Frequency")?;
    for trace in &set.traces {
        write!(writer, ",{}_mag,{}_phase_deg", trace.label, trace.label)?;
    }
    writeln!(writer)?;

    for (fi, freq) in set.frequency.iter().enumerate() {
        write!(writer, "{}", freq)?;
        for trace in &set.traces {
            write!(writer, ",{},{}", trace.magnitude[fi], trace.phase_deg[fi])?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// File name for an export: trimmed user text, or the default stem, plus `.txt`.
pub fn export_file_name(requested: &str) -> String {
    let stem = requested.trim();
    let stem = if stem.is_empty() { DEFAULT_EXPORT_STEM } else { stem };
    if stem.ends_with(".txt") {
        stem.to_string()
    } else {
        format!("{}.txt", stem)
    }
}

/// Render `value` like printf's `%.<precision>g`.
///
/// Fixed notation unless the decimal exponent is below -4 or at least
/// `precision`, trailing zeros removed; `nan`, `inf` and `-inf` for
/// non-finite values.
pub fn format_g(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    // exponent after rounding to `precision` significant digits
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_g_fixed() {
        assert_eq!(format_g(2.4, 6), "2.4");
        assert_eq!(format_g(-0.5, 6), "-0.5");
        assert_eq!(format_g(90.0, 6), "90");
        assert_eq!(format_g(1.23456789, 6), "1.23457");
        assert_eq!(format_g(123456.4, 6), "123456");
        assert_eq!(format_g(0.0001, 6), "0.0001");
    }

    #[test]
    fn test_format_g_exponent() {
        assert_eq!(format_g(123456789.0, 6), "1.23457e+08");
        assert_eq!(format_g(999999.5, 6), "1e+06");
        assert_eq!(format_g(0.00001234, 6), "1.234e-05");
        assert_eq!(format_g(-2.5e-10, 6), "-2.5e-10");
        assert_eq!(format_g(1e100, 6), "1e+100");
    }

    #[test]
    fn test_format_g_special() {
        assert_eq!(format_g(0.0, 6), "0");
        assert_eq!(format_g(-0.0, 6), "-0");
        assert_eq!(format_g(f64::NAN, 6), "nan");
        assert_eq!(format_g(f64::INFINITY, 6), "inf");
        assert_eq!(format_g(f64::NEG_INFINITY, 6), "-inf");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(""), "export_cst_result.txt");
        assert_eq!(export_file_name("   "), "export_cst_result.txt");
        assert_eq!(export_file_name(" patch_v2 "), "patch_v2.txt");
        assert_eq!(export_file_name("done.txt"), "done.txt");
    }
}
