use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nerview::{evaluation_to_html, RenderConfigBuilder, RenderedDocument, StatsReporter};
use pseudo_io::{evaluate_dir, ClientConfig, FileIngestor, PseudoApiClient};
use serde::Serialize;
use serde_jsonlines::json_lines;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cache;
mod pipeline;

use pipeline::{
    document_from_records, pseudonymize_file, render_conll, render_with, JsonlRecord, Pipeline,
};

const EXAMPLE_TEXT: &str = include_str!("../assets/upload_example.txt");

#[derive(Debug, Parser)]
#[command(name = "nerview", version, about = "Highlight and pseudonymize named entities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Write the output to this file instead of stdout.
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,
    /// Print JSON instead of HTML.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Tag and pseudonymize documents (.txt, .odt, .docx, .pdf or .doc) with the remote service.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Only pseudonymize documents, without highlighting the entities.
    Pseudo {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Tag and pseudonymize the bundled example text.
    Example,
    /// Render a CoNLL prediction dump.
    Conll {
        file: PathBuf,
        /// Column holding the tags, 0 being the token.
        #[arg(short, long, default_value_t = 1)]
        column: usize,
        #[command(flatten)]
        redaction: RedactionArgs,
    },
    /// Render a JSON lines dump of `{text, tokens, spans}` records.
    Jsonl {
        file: PathBuf,
        #[command(flatten)]
        redaction: RedactionArgs,
    },
    /// Evaluate every `*.txt` file of a directory of `token\ttrue_tag\tpred_tag` lines.
    Errors {
        dir: PathBuf,
        /// Only render this file of the directory.
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Usage statistics of the remote service.
    Stats,
}

#[derive(Debug, clap::Args)]
struct RedactionArgs {
    /// Replace names by pseudonyms and addresses by a placeholder.
    #[arg(long)]
    redact: bool,
    #[arg(long)]
    address_placeholder: Option<String>,
    #[arg(long)]
    pseudonym_suffix: Option<String>,
}

impl RedactionArgs {
    fn config(&self) -> nerview::RenderConfig {
        let mut builder = RenderConfigBuilder::new();
        if let Some(placeholder) = &self.address_placeholder {
            builder = builder.address_placeholder(placeholder.as_str());
        }
        if let Some(suffix) = &self.pseudonym_suffix {
            builder = builder.pseudonym_suffix(suffix.as_str());
        }
        builder.build()
    }
}

fn write_output(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn rendered_output(rendered: &RenderedDocument, json: bool) -> Result<String> {
    if json {
        to_json(rendered)
    } else {
        Ok(format!(
            "{}\n{}",
            nerview::legend_html(),
            nerview::document_to_html(rendered)
        ))
    }
}

fn client() -> Result<PseudoApiClient> {
    let config = ClientConfig::from_env()?;
    Ok(PseudoApiClient::new(config)?)
}

fn run(cli: Cli) -> Result<()> {
    let out = cli.out.as_deref();
    match cli.command {
        Commands::Upload { files } => {
            let client = client()?;
            let ingestor = FileIngestor::default();
            let mut pipeline = Pipeline::new(&client, &ingestor);
            let mut outputs = Vec::with_capacity(files.len());
            for file in files.iter() {
                outputs.push(pipeline.process_file(file)?);
            }
            info!(
                "{} distinct documents processed, {} reused from the cache",
                pipeline.cached_documents(),
                pipeline.cache_hits()
            );
            let content = if cli.json {
                to_json(&outputs)?
            } else {
                outputs
                    .iter()
                    .map(|o| o.to_html())
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            write_output(out, &content)
        }
        Commands::Pseudo { files } => {
            let client = client()?;
            let ingestor = FileIngestor::default();
            let outputs = files
                .iter()
                .map(|file| pseudonymize_file(&client, &ingestor, file))
                .collect::<Result<Vec<_>>>()?;
            let content = if cli.json {
                to_json(&outputs)?
            } else {
                outputs
                    .iter()
                    .map(|o| nerview::pseudonymized_to_html(&o.pseudo_text))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            write_output(out, &content)
        }
        Commands::Example => {
            let client = client()?;
            let ingestor = FileIngestor::default();
            let output = Pipeline::new(&client, &ingestor).process_text(EXAMPLE_TEXT)?;
            let content = if cli.json {
                to_json(&output)?
            } else {
                output.to_html()
            };
            write_output(out, &content)
        }
        Commands::Conll {
            file,
            column,
            redaction,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let rendered = render_conll(&content, column, redaction.redact, &redaction.config())?;
            write_output(out, &rendered_output(&rendered, cli.json)?)
        }
        Commands::Jsonl { file, redaction } => {
            let records = json_lines::<JsonlRecord, _>(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?
                .collect::<std::io::Result<Vec<_>>>()
                .with_context(|| format!("Invalid record in {}", file.display()))?;
            let document = document_from_records(records)?;
            let rendered = render_with(&document, redaction.redact, &redaction.config())?;
            write_output(out, &rendered_output(&rendered, cli.json)?)
        }
        Commands::Errors { dir, file } => {
            let batch = evaluate_dir(&dir)?;
            eprint!("{}", StatsReporter::from(&batch));
            for (name, failure) in batch.failures.iter() {
                eprintln!("Not evaluated, {}: {}", name, failure);
            }
            let content = match (&file, cli.json) {
                (Some(name), json) => {
                    let evaluation = batch
                        .files
                        .get(name)
                        .with_context(|| format!("No evaluation for {}", name))?;
                    if json {
                        to_json(evaluation)?
                    } else {
                        evaluation_to_html(name, evaluation)
                    }
                }
                (None, true) => to_json(&batch)?,
                (None, false) => batch
                    .files
                    .iter()
                    .map(|(name, evaluation)| evaluation_to_html(name, evaluation))
                    .collect::<Vec<_>>()
                    .join("\n"),
            };
            write_output(out, &content)
        }
        Commands::Stats => {
            let stats = client()?.stats()?;
            write_output(out, &to_json(&stats)?)
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    run(Cli::parse())
}
