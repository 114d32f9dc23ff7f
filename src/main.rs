//! certforge – command-line certificate generator.
//!
//! Usage:
//!   certforge <certificate.json> [output_dir] [--config cfg.json]
//!             [--layout layout.json] [--html fragment.html]
//!   certforge --sample chapter|book|region [output_dir]
//!
//! The PDF is written under its derived name (e.g.
//! `certificado_capitulo_juan.pdf`). If `output_dir` is omitted it goes next
//! to the input file, or into the current directory for samples.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

use cert_forge::compose::compose;
use cert_forge::export::{DirectorySink, Exporter};
use cert_forge::images::DefaultLoader;
use cert_forge::markup::to_html;
use cert_forge::model::CertificateData;
use cert_forge::pipeline::{preview_certificate, PipelineConfig};
use cert_forge::samples;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_dir: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut layout_path: Option<PathBuf> = None;
    let mut html_path: Option<PathBuf> = None;
    let mut sample: Option<String> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => config_path = Some(required_value(&mut iter, arg, &args[0])),
            "--layout" | "-l" => layout_path = Some(required_value(&mut iter, arg, &args[0])),
            "--html" => html_path = Some(required_value(&mut iter, arg, &args[0])),
            "--sample" | "-s" => {
                sample = Some(sample_name(iter.next_if(|v| !v.starts_with('-'))));
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                // With --sample the only positional is the output directory.
                if positional == 0 && sample.is_none() {
                    input_path = Some(PathBuf::from(path));
                } else if output_dir.is_none() {
                    output_dir = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let data = match (&sample, &input_path) {
        (Some(name), _) => match samples::by_name(name) {
            Some(d) => d,
            None => {
                eprintln!("Error: unknown sample '{name}' (expected chapter, book or region).");
                process::exit(1);
            }
        },
        (None, Some(path)) => {
            let json = match fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error reading '{}': {e}", path.display());
                    process::exit(1);
                }
            };
            match CertificateData::from_json(&json) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            }
        }
        (None, None) => {
            eprintln!("Error: no certificate file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let config = match &config_path {
        Some(path) => match PipelineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        None => PipelineConfig::default(),
    };

    for issue in data.validate() {
        eprintln!("Warning: {issue}");
    }

    if let Some(path) = &html_path {
        write_or_exit(path, to_html(&compose(&data)).as_bytes());
    }
    if let Some(path) = &layout_path {
        let surface = preview_certificate(&data, &config, &DefaultLoader);
        write_or_exit(path, surface.to_json().as_bytes());
    }

    // Default output: the input's directory, or the current one for samples.
    let dir = output_dir.unwrap_or_else(|| {
        input_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(PathBuf::from)
            .unwrap_or_default()
    });
    let sink = DirectorySink::new(dir);

    match Exporter::new(config).export_to(&data, &DefaultLoader, &sink) {
        Ok(doc) => {
            eprintln!(
                "Wrote '{}' ({} bytes)",
                sink.path_for(&doc).display(),
                doc.bytes.len()
            );
        }
        Err(e) => {
            eprintln!("Error generating certificate: {e}");
            process::exit(1);
        }
    }
}

fn required_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
    prog: &str,
) -> PathBuf {
    match iter.next() {
        Some(v) => PathBuf::from(v),
        None => {
            eprintln!("Flag {flag} needs a value.");
            print_usage(prog);
            process::exit(1);
        }
    }
}

/// Name following `--sample`, or `chapter` when the next token is a flag or
/// there is none.
fn sample_name(next: Option<&String>) -> String {
    next.cloned().unwrap_or_else(|| "chapter".to_string())
}

fn write_or_exit(path: &Path, bytes: &[u8]) {
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("certforge – authorship certificate generator (cert-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <certificate.json> [output_dir] [--config cfg.json]");
    eprintln!("  {prog} --sample chapter|book|region [output_dir]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <certificate.json>  Certificate record (camelCase fields, \"type\": chapter|book|region)");
    eprintln!("  [output_dir]        Where the PDF goes (default: next to the input)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --config, -c    Pipeline config JSON (page size, upscale, strict, ...)");
    eprintln!("  --layout, -l    Also write the laid-out surface as JSON");
    eprintln!("  --html          Also write the composed content as HTML");
    eprintln!("  --sample, -s    Render a built-in sample certificate");
    eprintln!("  --help          Print this message");
}
