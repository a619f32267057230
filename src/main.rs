use clap::Parser;
use cstpol::analysis;
use cstpol::analysis::traces;
use cstpol::analysis::PolarizationResult;
use cstpol::error::Result;
use cstpol::ir::{Component, CstData};
use cstpol::output;
use cstpol::parser::{self, ParseOptions};
use num_complex::Complex64;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// Axial ratio and phase difference from CST S-parameter ASCII exports
#[derive(Parser)]
#[command(name = "cstpol", version)]
struct Cli {
    /// CST "Export / Plot Data (ASCII)" file
    input: String,

    /// Write the report to NAME.txt instead of stdout (default name: export_cst_result)
    #[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = "")]
    export: Option<String>,

    /// Write magnitude / unwrapped phase traces as CSV
    #[arg(long, value_name = "PATH")]
    traces: Option<String>,

    /// Co-polar component (Tyy)
    #[arg(long, default_value = "S21_VV")]
    co: Component,

    /// Cross-polar component (Txy)
    #[arg(long, default_value = "S21_HV")]
    cross: Component,

    /// Fail when blocks disagree on the frequency axis
    #[arg(long)]
    strict_axis: bool,

    /// Print run stats to stderr
    #[arg(long)]
    stats: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut stats = if cli.stats { Some(cstpol::stats::Stats::new()) } else { None };

    let input = std::fs::read_to_string(&cli.input).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", cli.input, e);
        std::process::exit(1);
    });

    let start = Instant::now();
    let options = ParseOptions { strict_axis: cli.strict_axis };
    let data = parser::parse_with(&input, options).unwrap_or_else(|e| {
        eprintln!("Parse error: {}", e);
        std::process::exit(1);
    });
    if let Some(ref mut s) = stats {
        s.add_phase("parse", start.elapsed());
        s.record_parse(&data);
    }

    let start = Instant::now();
    let result = analysis::run(&data, cli.co, cli.cross).unwrap_or_else(|e| {
        eprintln!("Analysis error: {}", e);
        std::process::exit(1);
    });
    if let Some(ref mut s) = stats {
        s.add_phase("polarization", start.elapsed());
        s.record_polarization(&result);
    }

    let source_name = Path::new(&cli.input)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.input.clone());
    let header = output::ExportHeader::now(env!("CARGO_PKG_NAME"), &source_name);

    let start = Instant::now();
    let written = match &cli.export {
        Some(name) => {
            let path = output::export_file_name(name);
            tracing::info!(path = %path, "writing export");
            write_export_file(&path, &data, &result, &header)
        }
        None => {
            let mut stdout = io::stdout().lock();
            output::write_export(&data, &result, &header, &mut stdout)
        }
    };
    written.unwrap_or_else(|e| {
        eprintln!("Output error: {}", e);
        std::process::exit(1);
    });

    if let Some(path) = &cli.traces {
        write_traces_file(path, &data).unwrap_or_else(|e| {
            eprintln!("Trace output error: {}", e);
            std::process::exit(1);
        });
    }
    if let Some(ref mut s) = stats {
        s.add_phase("output", start.elapsed());
    }

    if let Some(ref stats) = stats {
        stats.display();
    }
}

fn write_export_file(
    path: &str,
    data: &CstData,
    result: &PolarizationResult,
    header: &output::ExportHeader,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    output::write_export(data, result, header, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Traces of S21_VV, S21_HV and S11_VV.
fn write_traces_file(path: &str, data: &CstData) -> Result<()> {
    let shown = [Component::S21Vv, Component::S21Hv, Component::S11Vv];
    let columns: Vec<_> = shown.iter().map(|&c| data.filled(c)).collect();
    let series: Vec<&[Complex64]> = columns.iter().map(|v| v.as_slice()).collect();
    let labels: Vec<&str> = shown.iter().map(|c| c.label()).collect();

    let set = traces::traces(&data.frequency, &series, &labels)?;
    let mut writer = BufWriter::new(File::create(path)?);
    output::write_traces_csv(&set, &mut writer)?;
    writer.flush()?;
    Ok(())
}
