use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser};

use nudge::{Offset, codec};

#[derive(Debug, Parser)]
#[command(
    name = "nudge",
    about = "Inspect and edit the manual-position annotation of diagram source files."
)]
struct Args {
    /// Path to the diagram source file. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Where to write the rewritten document. Use '-' for stdout.
    /// Defaults to rewriting the input file in place.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Set a node offset in pixels, e.g. --set A=40,-16. May be repeated.
    /// Offsets at or below the epsilon floor drop out of the annotation.
    #[arg(long = "set", value_name = "NODE=DX,DY")]
    set: Vec<String>,

    /// Remove the position annotation entirely.
    #[arg(long = "clear", action = ArgAction::SetTrue, conflicts_with = "set")]
    clear: bool,

    /// Suppress informational output.
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum OutputDestination {
    Stdout,
    File(PathBuf),
}

fn main() {
    if let Err(err) = run() {
        eprintln!("\u{001b}[31merror:\u{001b}[0m {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let input = parse_input(args.input.as_deref())?;
    let source = load_source(&input)?;

    if args.clear {
        let rewritten = codec::merge_annotation(&source, &BTreeMap::new());
        let destination = resolve_output(args.output.as_deref(), &input)?;
        return write_output(destination, &rewritten, args.quiet);
    }

    if !args.set.is_empty() {
        let mut offsets: BTreeMap<String, Offset> = codec::decode(&source)
            .unwrap_or_default()
            .into_iter()
            .map(|(id, pixel)| (id, Offset::new(pixel.x as f32, pixel.y as f32)))
            .collect();

        for spec in &args.set {
            let (id, offset) = parse_set(spec)?;
            offsets.insert(id, offset);
        }

        let rewritten = codec::merge_annotation(&source, &offsets);
        let destination = resolve_output(args.output.as_deref(), &input)?;
        return write_output(destination, &rewritten, args.quiet);
    }

    let mapping = codec::decode(&source).unwrap_or_default();
    let json = serde_json::to_string_pretty(&mapping)?;
    println!("{json}");
    Ok(())
}

fn parse_set(spec: &str) -> Result<(String, Offset)> {
    let (id, rest) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NODE=DX,DY, got '{spec}'"))?;
    let (dx, dy) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("expected NODE=DX,DY, got '{spec}'"))?;

    let id = id.trim();
    if id.is_empty() {
        bail!("node identifier missing in '{spec}'");
    }

    let dx: i32 = dx
        .trim()
        .parse()
        .with_context(|| format!("invalid x offset in '{spec}'"))?;
    let dy: i32 = dy
        .trim()
        .parse()
        .with_context(|| format!("invalid y offset in '{spec}'"))?;

    Ok((id.to_string(), Offset::new(dx as f32, dy as f32)))
}

fn parse_input(input: Option<&str>) -> Result<InputSource> {
    match input {
        Some("-") | None => Ok(InputSource::Stdin),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.exists() {
                return Err(anyhow!("input file '{path_str}' does not exist"));
            }
            Ok(InputSource::File(path))
        }
    }
}

fn load_source(input: &InputSource) -> Result<String> {
    match input {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read diagram source from stdin")?;
            Ok(buffer)
        }
        InputSource::File(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display())),
    }
}

fn resolve_output(output: Option<&str>, input: &InputSource) -> Result<OutputDestination> {
    match output {
        Some("-") => Ok(OutputDestination::Stdout),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(anyhow!(
                        "output directory '{}' does not exist",
                        parent.display()
                    ));
                }
            }
            Ok(OutputDestination::File(path))
        }
        None => match input {
            InputSource::File(path) => Ok(OutputDestination::File(path.clone())),
            InputSource::Stdin => Ok(OutputDestination::Stdout),
        },
    }
}

fn write_output(destination: OutputDestination, contents: &str, quiet: bool) -> Result<()> {
    match destination {
        OutputDestination::Stdout => {
            io::stdout()
                .write_all(contents.as_bytes())
                .context("failed to write document to stdout")?;
        }
        OutputDestination::File(path) => {
            fs::write(&path, contents.as_bytes())
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            if !quiet {
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}
