//! vimdoc - Convert Markdown and HTML documents to Vim help files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use vimdoc_core::{vimscript, Config, DocConverter, InputFormat, SourceDocument};

/// Convert Markdown and HTML documents to Vim help files
#[derive(Parser, Debug)]
#[command(name = "vimdoc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a document to a Vim help file
    Convert {
        /// Markdown or HTML input (reads stdin when omitted)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /// Output file (writes stdout when omitted)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Longest list item, in lines, that still allows a compact list
        #[arg(long, value_name = "N")]
        threshold: Option<usize>,

        /// Help file name used for the first line and the tag prefix
        #[arg(short, long, value_name = "NAME")]
        file: Option<String>,

        /// Title shown on the first line
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Embed documentation of Vim script functions in a Markdown file
    Extract {
        /// Markdown file containing the documentation markers
        #[arg(value_name = "MARKDOWN")]
        markdown: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    match args.command {
        Command::Convert {
            input,
            output,
            threshold,
            file,
            title,
        } => {
            let file = file.or_else(|| output.as_deref().and_then(help_file_name));
            convert(&config, input.as_deref(), output.as_deref(), threshold, file, title)
        }
        Command::Extract { markdown } => extract(&config, &markdown),
    }
}

fn convert(
    config: &Config,
    input: Option<&Path>,
    output: Option<&Path>,
    threshold: Option<usize>,
    file: Option<String>,
    title: Option<String>,
) -> Result<()> {
    // Load document
    let doc = match input {
        Some(path) => SourceDocument::load(path, config)
            .with_context(|| format!("Failed to load document: {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read standard input")?;
            SourceDocument::parse(&text, InputFormat::detect(None, &text), config)?
        }
    };

    let mut converter = DocConverter::new(config);
    if let Some(threshold) = threshold {
        converter = converter.with_compact_threshold(threshold);
    }
    if let Some(file) = file {
        converter = converter.with_filename(file);
    }
    if let Some(title) = title.or(doc.title) {
        converter = converter.with_title(title);
    }

    let help = converter.convert(&doc.root).context("Conversion failed")?;

    match output {
        Some(path) => {
            fs::write(path, &help)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => io::stdout()
            .write_all(help.as_bytes())
            .context("Failed to write standard output")?,
    }
    Ok(())
}

fn extract(config: &Config, markdown: &Path) -> Result<()> {
    let date = chrono::Local::now().format("%B %e, %Y at %H:%M").to_string();
    let updated = vimscript::update_markdown(markdown, config.extract.start_level, &date)
        .with_context(|| format!("Failed to update {}", markdown.display()))?;
    if updated {
        log::info!("Updated {}", markdown.display());
    }
    Ok(())
}

/// Output files named `*.txt` double as the help file name
fn help_file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.ends_with(".txt").then(|| name.to_string())
}
