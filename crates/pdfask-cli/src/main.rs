use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pdfask_core::{
    CombinedCorpus, Config, Document, ExtractedDocument, GeminiBackend, compose_prompt,
    config_file, extract_document, relay,
};
use pdfask_pdf_mupdf::MupdfBackend;

mod output;

use output::ColorMode;

/// Ask questions about PDF files with a streaming language model answer
#[derive(Parser, Debug)]
#[command(name = "pdfask", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from the files and stream an answer to a question
    Ask {
        /// PDF files to read, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Question to ask about the documents
        #[arg(short, long)]
        question: String,

        /// Model name (overrides the config file)
        #[arg(long)]
        model: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Print the composed prompt instead of calling the model
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the combined text of the files without asking anything
    Extract {
        /// PDF files to read, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Ask {
            files,
            question,
            model,
            no_color,
            dry_run,
        } => ask(files, question, model, no_color, dry_run).await,
        Command::Extract { files } => extract(files).await,
    }
}

/// Log to stderr so stdout carries only the answer.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn ask(
    files: Vec<PathBuf>,
    question: String,
    model: Option<String>,
    no_color: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let file = config_file::load_config();
    let mut config = Config::from_file(&file, std::env::var("GOOGLE_API_KEY").ok());
    if let Some(model) = model {
        config.model = model;
    }

    let color = ColorMode(!no_color);
    let mut status = std::io::stderr();

    let documents = read_documents(&files)?;
    let extracted = extract_all(documents).await?;
    for (i, document) in extracted.iter().enumerate() {
        output::print_document_status(&mut status, i, extracted.len(), document, color)?;
    }

    let corpus = CombinedCorpus::from_documents(&extracted);
    let prompt = compose_prompt(&question, &corpus);

    if dry_run {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    if !config.has_credential() {
        output::print_warning(
            &mut status,
            "GOOGLE_API_KEY is not set; the model call will fail",
            color,
        )?;
    }

    let generator = Arc::new(GeminiBackend::new(&config)?);
    output::print_asking(&mut status, generator.model(), color)?;

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let mut fragments = std::pin::pin!(relay(generator, prompt, cancel.clone()));
    let mut stdout = std::io::stdout();
    while let Some(fragment) = fragments.next().await {
        stdout.write_all(fragment.as_bytes())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    if cancel.is_cancelled() {
        output::print_warning(&mut status, "cancelled", color)?;
    }
    Ok(())
}

async fn extract(files: Vec<PathBuf>) -> anyhow::Result<()> {
    let documents = read_documents(&files)?;
    let extracted = extract_all(documents).await?;
    let corpus = CombinedCorpus::from_documents(&extracted);

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{corpus}")?;
    stdout.flush()?;
    Ok(())
}

fn read_documents(files: &[PathBuf]) -> anyhow::Result<Vec<Document>> {
    tracing::debug!(files = files.len(), "reading documents");
    files
        .iter()
        .map(|path| {
            let data =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Document::new(document_name(path), data))
        })
        .collect()
}

/// MuPDF is blocking, so the whole batch runs off the async runtime.
async fn extract_all(documents: Vec<Document>) -> anyhow::Result<Vec<ExtractedDocument>> {
    let extracted = tokio::task::spawn_blocking(move || {
        let backend = MupdfBackend::new();
        documents
            .iter()
            .map(|d| extract_document(&backend, d))
            .collect::<Vec<_>>()
    })
    .await?;
    Ok(extracted)
}

/// The name a document is known by in the corpus markers.
fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_parses_files_in_order() {
        let cli = Cli::try_parse_from([
            "pdfask", "ask", "b.pdf", "a.pdf", "-q", "What?", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Ask {
                files,
                question,
                model,
                dry_run,
                no_color,
            } => {
                assert_eq!(files, vec![PathBuf::from("b.pdf"), PathBuf::from("a.pdf")]);
                assert_eq!(question, "What?");
                assert!(model.is_none());
                assert!(dry_run);
                assert!(!no_color);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ask_requires_a_question() {
        assert!(Cli::try_parse_from(["pdfask", "ask", "a.pdf"]).is_err());
    }

    #[test]
    fn extract_requires_files() {
        assert!(Cli::try_parse_from(["pdfask", "extract"]).is_err());
    }

    #[test]
    fn document_name_uses_file_name() {
        assert_eq!(document_name(Path::new("/tmp/papers/paper.pdf")), "paper.pdf");
        assert_eq!(document_name(Path::new("notes.pdf")), "notes.pdf");
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = read_documents(&[PathBuf::from("/definitely/not/here.pdf")]).unwrap_err();
        assert!(err.to_string().contains("here.pdf"));
    }
}
