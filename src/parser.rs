//! CST ASCII export parser.
//!
//! Reads the text produced by CST Studio's "Export / Plot Data (ASCII)" on
//! S-parameter results and recovers the frequency axis, up to eight complex
//! components and the parameter declaration.
//!
//! # Supported syntax
//!
//! ```text
//! #Parameters = {name=monopole; f0=2.4; N=4}     (commented declaration)
//! #"Frequency / GHz"  "S2,1 [Magnitude]"  ...    (header, skipped)
//! #-------------------------------------------   (header, skipped)
//! 2.3   0.71   -12.5                             (freq mag phase_deg)
//! ...
//! S2,1 (Zmax(1)) Parameters = {...}              (labeled declaration)
//! ```
//!
//! Every line is first classified into a `LineEvent`. Blocks are runs of
//! data rows terminated by a blank line, a marker line or end of input, so
//! both the blank-separated and the marker-separated export layouts go
//! through the same segmentation.

use nom::bytes::complete::take_till1;
use nom::character::complete::{char, space1};
use nom::combinator::{all_consuming, rest};
use nom::number::complete::double;
use nom::sequence::separated_pair;
use nom::IResult;
use nom::Parser;

use crate::assemble;
use crate::error::{CstError, Result};
use crate::ir::{CstData, HeaderLayout, Metadata, ParamValue, RawBlock, Sample, N_COMPONENTS};

/// Token that identifies a parameter declaration / block marker line.
pub const MARKER: &str = "Parameters";

/// Parser configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Reject blocks whose frequency column differs from the first block.
    pub strict_axis: bool,
}

/// Classification of a single input line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent<'a> {
    /// Line containing the `Parameters` marker.
    Marker(&'a str),
    Blank,
    Data(Sample),
    /// Headers, legends and malformed rows.
    Unparseable(&'a str),
}

/// Parse a CST export with default options.
pub fn parse(input: &str) -> Result<CstData> {
    parse_with(input, ParseOptions::default())
}

/// Parse a CST export into a `CstData`.
pub fn parse_with(input: &str, options: ParseOptions) -> Result<CstData> {
    let _span = tracing::info_span!("parse", bytes = input.len()).entered();

    if input.trim().is_empty() {
        return Err(CstError::EmptyInput);
    }

    let mut metadata: Option<Metadata> = None;
    let mut segmenter = Segmenter::new(N_COMPONENTS);

    for (line_num, event) in events(input) {
        if let LineEvent::Marker(text) = &event {
            // Only the first declaration counts.
            if metadata.is_none() {
                metadata = extract_metadata(line_num, text)?;
            }
        }
        segmenter.feed(line_num, &event);
    }

    let segmentation = segmenter.finish();
    assemble::assemble(segmentation, metadata.unwrap_or_default(), options)
}

/// Classify every line of `input`, paired with its 1-based line number.
pub fn events(input: &str) -> impl Iterator<Item = (usize, LineEvent<'_>)> {
    input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, classify(line)))
}

/// Classify one line.
pub fn classify(line: &str) -> LineEvent<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineEvent::Blank
    } else if trimmed.contains(MARKER) {
        LineEvent::Marker(trimmed)
    } else if let Some(sample) = data_row(trimmed) {
        LineEvent::Data(sample)
    } else {
        LineEvent::Unparseable(trimmed)
    }
}

// ---------------------------------------------------------------------------
// Data rows
// ---------------------------------------------------------------------------

fn number(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// Parse `freq mag phase [extra...]`. Fields after the third are ignored.
fn data_row(line: &str) -> Option<Sample> {
    let (rest, (freq, _, mag, _, phase)) = (number, space1, number, space1, number)
        .parse(line)
        .ok()?;

    // "2.3 0.5 10abc" is not a data row
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    Some(Sample { freq, mag, phase })
}

// ---------------------------------------------------------------------------
// Block segmentation
// ---------------------------------------------------------------------------

/// Output of the block segmenter.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Blocks in encounter order, at most `N_COMPONENTS`.
    pub blocks: Vec<RawBlock>,
    /// Complete blocks dropped because the limit was reached.
    pub ignored_blocks: usize,
    /// Unparseable lines met while a block was open.
    pub skipped_rows: usize,
    /// Lines scanned.
    pub lines: usize,
}

/// Groups a stream of line events into blocks.
struct Segmenter {
    max_blocks: usize,
    current: Option<RawBlock>,
    out: Segmentation,
}

impl Segmenter {
    fn new(max_blocks: usize) -> Self {
        Self {
            max_blocks,
            current: None,
            out: Segmentation::default(),
        }
    }

    fn feed(&mut self, line_num: usize, event: &LineEvent<'_>) {
        self.out.lines = line_num;
        match event {
            LineEvent::Data(sample) => {
                self.current
                    .get_or_insert_with(|| RawBlock {
                        line: line_num,
                        rows: Vec::new(),
                    })
                    .rows
                    .push(*sample);
            }
            LineEvent::Blank | LineEvent::Marker(_) => self.close(),
            LineEvent::Unparseable(_) => {
                if self.current.is_some() {
                    self.out.skipped_rows += 1;
                }
            }
        }
    }

    fn close(&mut self) {
        let Some(block) = self.current.take() else {
            return;
        };
        if self.out.blocks.len() < self.max_blocks {
            tracing::debug!(
                index = self.out.blocks.len(),
                line = block.line,
                rows = block.rows.len(),
                "block closed"
            );
            self.out.blocks.push(block);
        } else {
            tracing::warn!(line = block.line, "ignoring data block beyond the {}th", self.max_blocks);
            self.out.ignored_blocks += 1;
        }
    }

    fn finish(mut self) -> Segmentation {
        self.close();
        self.out
    }
}

/// Split `input` into raw data blocks without assembling them.
pub fn segment(input: &str) -> Segmentation {
    let mut segmenter = Segmenter::new(N_COMPONENTS);
    for (line_num, event) in events(input) {
        segmenter.feed(line_num, &event);
    }
    segmenter.finish()
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Extract the `{key=value; ...}` declaration from a marker line.
///
/// Returns `Ok(None)` when the line carries no `{` payload.
pub fn extract_metadata(line_num: usize, line: &str) -> Result<Option<Metadata>> {
    let Some(open) = line.find('{') else {
        return Ok(None);
    };
    let body = &line[open + 1..];
    let payload = match body.rfind('}') {
        Some(close) => &body[..close],
        None => body,
    };

    let mut params = Vec::new();
    for item in payload.split(';') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (_, (key, value)) = key_value(item).map_err(|_| {
            CstError::Parse(format!(
                "line {}: parameter '{}' is not of the form key=value in: {}",
                line_num, item, line
            ))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CstError::Parse(format!(
                "line {}: parameter '{}' has an empty name in: {}",
                line_num, item, line
            )));
        }
        params.push((key.to_string(), coerce_value(value)));
    }

    let (layout, label) = header_layout(line);
    Ok(Some(Metadata {
        params,
        layout: Some(layout),
        label,
    }))
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till1(|c: char| c == '='), char('='), rest).parse(input)
}

/// Float if the text has a `.` or an exponent marker, else integer, else text.
pub fn coerce_value(raw: &str) -> ParamValue {
    let value = raw.trim();
    let looks_float = value.contains('.') || value.contains(['e', 'E']);
    let parsed = if looks_float {
        all_consuming(number)
            .parse(value)
            .ok()
            .map(|(_, x)| ParamValue::Float(x))
    } else {
        value.parse::<i64>().ok().map(ParamValue::Int)
    };
    parsed.unwrap_or_else(|| ParamValue::Text(value.to_string()))
}

/// A declaration behind a `#` is the commented layout; anything else is a
/// labeled line whose leading text becomes the label.
fn header_layout(line: &str) -> (HeaderLayout, Option<String>) {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return (HeaderLayout::Commented, None);
    }
    // the marker closest to the payload; the label itself may contain it
    let head = &trimmed[..trimmed.find('{').unwrap_or(trimmed.len())];
    let prefix = head
        .rfind(MARKER)
        .map(|pos| &head[..pos])
        .unwrap_or_default();
    let label = prefix
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '(' | '"'))
        .to_string();
    let label = if label.is_empty() { None } else { Some(label) };
    (HeaderLayout::Labeled, label)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
