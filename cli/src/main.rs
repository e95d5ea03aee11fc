//! pdfchunk CLI - financial PDF structuring and chunking tool

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfchunk::detect;
use pdfchunk::render::{to_json, to_metadata_lines};
use pdfchunk::{
    ChunkOptions, ChunkedDocument, JsonFormat, JsonLayoutService, ParseOutcome, Pipeline,
    PipelineOptions,
};

#[derive(Parser)]
#[command(name = "pdfchunk")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Structure financial PDFs into sections and token-bounded chunks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk one or more PDFs to JSON
    Chunk {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file, or directory when several inputs are given
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Emit one metadata record per chunk (JSON Lines) instead of the
        /// full document
        #[arg(long)]
        metadata: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show the section outline of a PDF
    Sections {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Args, Clone)]
struct PipelineArgs {
    /// Stored layout-analysis result (JSON) for the structured path
    #[arg(long, value_name = "FILE", env = "PDFCHUNK_LAYOUT_JSON")]
    layout_json: Option<PathBuf>,

    /// Maximum tokens per text chunk
    #[arg(long, default_value_t = 512, env = "PDFCHUNK_MAX_TOKENS")]
    max_tokens: usize,

    /// Tokens of trailing sentences repeated in the next chunk
    #[arg(long, default_value_t = 64, env = "PDFCHUNK_OVERLAP_TOKENS")]
    overlap_tokens: usize,

    /// Model whose tokenizer counts tokens
    #[arg(long, value_name = "MODEL", default_value = "gpt-4o", env = "PDFCHUNK_TOKENIZER")]
    tokenizer: String,

    /// Skip the structured path
    #[arg(long, env = "PDFCHUNK_HEURISTIC_ONLY")]
    heuristic_only: bool,
}

impl PipelineArgs {
    fn options(&self) -> PipelineOptions {
        let chunk = ChunkOptions::new()
            .with_max_tokens(self.max_tokens)
            .with_overlap_tokens(self.overlap_tokens)
            .with_tokenizer_model(self.tokenizer.clone());
        PipelineOptions::new()
            .with_chunk(chunk)
            .with_structured_enabled(!self.heuristic_only)
    }

    fn build(&self) -> pdfchunk::Result<Pipeline> {
        let pipeline = Pipeline::new(self.options())?;
        Ok(match &self.layout_json {
            Some(path) if !self.heuristic_only => {
                pipeline.with_service(JsonLayoutService::from_path(path))
            }
            _ => pipeline,
        })
    }
}

/// How a command ended when it did not fail.
#[derive(Debug, PartialEq, Eq)]
enum Status {
    Done,
    Empty,
}

type CliResult = Result<Status, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chunk {
            inputs,
            output,
            compact,
            metadata,
            pipeline,
        } => cmd_chunk(&inputs, output.as_deref(), compact, metadata, &pipeline),
        Commands::Sections { input, pipeline } => cmd_sections(&input, &pipeline),
        Commands::Info { input } => cmd_info(&input),
    };

    match result {
        Ok(Status::Done) => ExitCode::SUCCESS,
        Ok(Status::Empty) => ExitCode::from(2),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_chunk(
    inputs: &[PathBuf],
    output: Option<&Path>,
    compact: bool,
    metadata: bool,
    args: &PipelineArgs,
) -> CliResult {
    if inputs.len() > 1 && args.layout_json.is_some() {
        return Err("--layout-json applies to a single input file".into());
    }

    let pipeline = args.build()?;
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let render = |input: &Path, doc: &ChunkedDocument| -> pdfchunk::Result<String> {
        if metadata {
            to_metadata_lines(doc, &document_id(input))
        } else {
            to_json(doc, format)
        }
    };

    if let [input] = inputs {
        let spinner = spinner(&format!("Chunking {}", input.display()))?;
        let outcome = pipeline.process_path(input);
        spinner.finish_and_clear();

        let doc = match outcome? {
            ParseOutcome::Chunked(doc) => doc,
            ParseOutcome::Empty { path, page_count } => {
                eprintln!(
                    "{} no chunks from {} pages ({} path)",
                    "Empty:".yellow().bold(),
                    page_count,
                    path
                );
                return Ok(Status::Empty);
            }
        };
        report_fallback(input, &doc);

        let rendered = render(input.as_path(), &doc)?;
        match output {
            Some(path) => {
                fs::write(path, &rendered)?;
                eprintln!(
                    "{} {} ({} chunks)",
                    "Saved to".green(),
                    path.display(),
                    doc.chunks.len()
                );
            }
            None => println!("{}", rendered.trim_end()),
        }
        return Ok(Status::Done);
    }

    let output_dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    let spinner = spinner(&format!("Chunking {} files", inputs.len()))?;
    let outcomes = pipeline.process_many(inputs);
    spinner.finish_and_clear();

    let mut failed = 0usize;
    let mut empty = 0usize;
    for (input, outcome) in inputs.iter().zip(outcomes) {
        match outcome {
            Ok(ParseOutcome::Chunked(doc)) => {
                report_fallback(input, &doc);
                let path = output_dir.join(output_name(input, metadata));
                fs::write(&path, render(input.as_path(), &doc)?)?;
                println!(
                    "{} {} -> {} ({} chunks, {} path)",
                    "OK".green().bold(),
                    input.display(),
                    path.display(),
                    doc.chunks.len(),
                    doc.path
                );
            }
            Ok(ParseOutcome::Empty { page_count, .. }) => {
                empty += 1;
                println!(
                    "{} {} (no chunks from {} pages)",
                    "EMPTY".yellow().bold(),
                    input.display(),
                    page_count
                );
            }
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "FAIL".red().bold(), input.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, inputs.len()).into());
    }
    Ok(if empty > 0 { Status::Empty } else { Status::Done })
}

fn cmd_sections(input: &Path, args: &PipelineArgs) -> CliResult {
    let pipeline = args.build()?;
    let doc = match pipeline.process_path(input)? {
        ParseOutcome::Chunked(doc) => doc,
        ParseOutcome::Empty { .. } => {
            eprintln!("{} no sections found", "Empty:".yellow().bold());
            return Ok(Status::Empty);
        }
    };
    report_fallback(input, &doc);

    println!("{}", "Sections".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for summary in &doc.summaries {
        let indent = if summary.level == 2 { "  " } else { "" };
        println!(
            "{}{} {}",
            indent,
            summary.heading.bold(),
            format!("(p{}-{})", summary.start_page, summary.end_page).dimmed()
        );
    }
    println!();
    println!(
        "{}: {} sections, {} chunks via {} path",
        "Total".bold(),
        doc.summaries.len(),
        doc.chunks.len(),
        doc.path
    );
    Ok(Status::Done)
}

fn cmd_info(input: &Path) -> CliResult {
    let data = fs::read(input)?;
    let info = detect::inspect(&data)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), info.format);
    println!("{}: {}", "Pages".bold(), info.page_count);
    println!("{}: {}", "Size".bold(), data.len());
    Ok(Status::Done)
}

fn report_fallback(input: &Path, doc: &ChunkedDocument) {
    if let Some(reason) = &doc.fallback_reason {
        eprintln!(
            "{} {}: structured path abandoned ({})",
            "Fallback".yellow(),
            input.display(),
            reason
        );
    }
}

fn spinner(message: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// File stem used as the document id in metadata records.
fn document_id(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string())
}

fn output_name(input: &Path, metadata: bool) -> String {
    let ext = if metadata { "jsonl" } else { "json" };
    format!("{}.chunks.{}", document_id(input), ext)
}
