//! Parsed CST export representation.
//!
//! The parser produces a `CstData` holding the shared frequency axis, the
//! eight S-parameter components in canonical order and the parameter
//! metadata. Nothing here is mutated after `parser::parse` returns.

use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;

/// Number of S-parameter blocks a CST export can carry.
pub const N_COMPONENTS: usize = 8;

/// S-parameter component, in the positional order blocks appear in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    S21Vv,
    S21Hv,
    S11Vv,
    S11Hv,
    S21Vh,
    S21Hh,
    S11Vh,
    S11Hh,
}

impl Component {
    /// All components in canonical block order.
    pub const ALL: [Component; N_COMPONENTS] = [
        Component::S21Vv,
        Component::S21Hv,
        Component::S11Vv,
        Component::S11Hv,
        Component::S21Vh,
        Component::S21Hh,
        Component::S11Vh,
        Component::S11Hh,
    ];

    /// Position of this component's block in the file.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Component::S21Vv => "S21_VV",
            Component::S21Hv => "S21_HV",
            Component::S11Vv => "S11_VV",
            Component::S11Hv => "S11_HV",
            Component::S21Vh => "S21_VH",
            Component::S21Hh => "S21_HH",
            Component::S11Vh => "S11_VH",
            Component::S11Hh => "S11_HH",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Component {
    type Err = String;

    /// Accepts labels case-insensitively, e.g. "S21_VV" or "s21_vv".
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Component::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = Component::ALL.iter().map(|c| c.label()).collect();
                format!("unknown component '{}', expected one of {}", s, known.join(", "))
            })
    }
}

/// A coerced parameter value from the `{key=value; ...}` declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(x) => Some(*x),
            ParamValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            // Debug keeps the ".0" on integral floats and switches to
            // exponent notation for very small/large magnitudes.
            ParamValue::Float(x) => write!(f, "{:?}", x),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Which of the two CST header conventions carried the declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// `#Parameters = {...}` comment line, blocks usually split by repeated markers.
    Commented,
    /// `<label> Parameters = {...}`, blocks usually split by blank lines.
    Labeled,
}

/// Parameter declaration of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Parameters in declaration order.
    pub params: Vec<(String, ParamValue)>,
    pub layout: Option<HeaderLayout>,
    /// Free text preceding the marker on a labeled declaration line.
    pub label: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The `name` parameter, if declared.
    pub fn name(&self) -> Option<String> {
        self.get("name").map(|v| v.to_string())
    }

    /// All parameters rendered as `k1=v1 k2=v2 ...`.
    pub fn params_line(&self) -> String {
        join_params(self.params.iter())
    }

    /// Two-line summary: the `name` parameter, then every other parameter.
    pub fn summary(&self) -> String {
        let name = self.name().unwrap_or_default();
        let rest = join_params(self.params.iter().filter(|(k, _)| k != "name"));
        format!("{}\n{}", name, rest)
    }
}

fn join_params<'a>(params: impl Iterator<Item = &'a (String, ParamValue)>) -> String {
    params
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One `frequency magnitude phase` row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub freq: f64,
    pub mag: f64,
    /// Phase in degrees.
    pub phase: f64,
}

/// A contiguous run of data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    /// 1-based line number of the block's first row.
    pub line: usize,
    pub rows: Vec<Sample>,
}

/// A component that was either read from the file or is missing from it.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Present(Vec<Complex64>),
    Absent,
}

impl Series {
    pub fn is_present(&self) -> bool {
        matches!(self, Series::Present(_))
    }

    /// Samples of a present series, or `n` NaN+jNaN placeholders.
    pub fn filled(&self, n: usize) -> Vec<Complex64> {
        match self {
            Series::Present(values) => values.clone(),
            Series::Absent => vec![Complex64::new(f64::NAN, f64::NAN); n],
        }
    }
}

/// Everything recovered from one CST export.
#[derive(Debug, Clone)]
pub struct CstData {
    /// Frequency axis from the first block (GHz).
    pub frequency: Vec<f64>,
    /// Components in canonical order; present ones have length `frequency.len()`.
    pub series: [Series; N_COMPONENTS],
    pub metadata: Metadata,
    /// Components whose block disagreed with the first block's frequency column.
    pub axis_mismatches: Vec<Component>,
    /// Data blocks beyond the eighth.
    pub ignored_blocks: usize,
    /// Non-numeric or short lines skipped inside the data region.
    pub skipped_rows: usize,
}

impl CstData {
    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    pub fn get(&self, component: Component) -> &Series {
        &self.series[component.index()]
    }

    /// Component samples, NaN-filled when the file did not carry it.
    pub fn filled(&self, component: Component) -> Vec<Complex64> {
        self.get(component).filled(self.len())
    }

    /// All eight components, NaN-filled, in canonical order.
    pub fn series(&self) -> Vec<(Component, Vec<Complex64>)> {
        Component::ALL
            .iter()
            .map(|&c| (c, self.filled(c)))
            .collect()
    }

    pub fn present_count(&self) -> usize {
        self.series.iter().filter(|s| s.is_present()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_order_matches_index() {
        for (i, c) in Component::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
        assert_eq!(Component::S11Hh.label(), "S11_HH");
    }

    #[test]
    fn test_component_from_str() {
        assert_eq!("s21_hv".parse::<Component>().unwrap(), Component::S21Hv);
        assert_eq!(" S11_VV ".parse::<Component>().unwrap(), Component::S11Vv);
        assert!("S31_VV".parse::<Component>().is_err());
    }

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::Int(4).to_string(), "4");
        assert_eq!(ParamValue::Float(2.4).to_string(), "2.4");
        assert_eq!(ParamValue::Float(2.0).to_string(), "2.0");
        assert_eq!(ParamValue::Text("monopole".into()).to_string(), "monopole");
    }

    #[test]
    fn test_metadata_summary() {
        let meta = Metadata {
            params: vec![
                ("f0".into(), ParamValue::Float(2.4)),
                ("name".into(), ParamValue::Text("monopole".into())),
                ("N".into(), ParamValue::Int(4)),
            ],
            layout: None,
            label: None,
        };
        assert_eq!(meta.params_line(), "f0=2.4 name=monopole N=4");
        assert_eq!(meta.summary(), "monopole\nf0=2.4 N=4");
    }

    #[test]
    fn test_absent_series_fills_with_nan() {
        let filled = Series::Absent.filled(3);
        assert_eq!(filled.len(), 3);
        assert!(filled.iter().all(|z| z.re.is_nan() && z.im.is_nan()));
    }
}
