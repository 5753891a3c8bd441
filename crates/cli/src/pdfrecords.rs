//! pdfrecords - Interpret PDF pages into JSON records
//!
//! Writes one JSON object per page (JSON Lines) with the page box,
//! rotation and the glyph, line, rect and image records in device space.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{ArgAction, Parser};
use memmap2::Mmap;
use pdfgraph_core::high_level::{PageRecords, extract_pages_parallel_with_document, interpret_page};
use pdfgraph_core::interp::PageInterpreter;
use pdfgraph_core::{OpenOptions, PDFDocument, Record};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Interpret PDF page content into positioned records.
#[derive(Parser, Debug)]
#[command(name = "pdfrecords")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more paths to PDF files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Use debug logging level (overrides RUST_LOG)
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Page numbers to interpret (1-indexed), e.g. --page-numbers=1,3
    #[arg(long = "page-numbers", value_delimiter = ',')]
    page_numbers: Option<Vec<usize>>,

    /// The password to use for decrypting PDF file
    #[arg(short = 'P', long, default_value = "")]
    password: String,

    /// Interpret pages on all cores
    #[arg(long, action = ArgAction::SetTrue)]
    parallel: bool,

    /// Do not rebuild a broken xref table by scanning the file
    #[arg(long = "no-fallback", action = ArgAction::SetTrue)]
    no_fallback: bool,

    /// Operators interpreted per page before giving up
    #[arg(long = "max-operators", default_value_t = pdfgraph_core::config::DEFAULT_MAX_OPERATORS)]
    max_operators: usize,

    /// How deep form XObjects may nest
    #[arg(long = "max-xobject-depth", default_value_t = pdfgraph_core::config::DEFAULT_MAX_XOBJECT_DEPTH)]
    max_xobject_depth: usize,

    /// Leave image bytes out of image records
    #[arg(long = "omit-image-data", action = ArgAction::SetTrue)]
    omit_image_data: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_document(path: &Path, options: &OpenOptions) -> Result<PDFDocument> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    // SAFETY: the map is read-only and lives as long as the document.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("cannot map {}", path.display()))?;
    PDFDocument::open_with(Bytes::from_owner(mmap), options)
        .with_context(|| format!("cannot read {}", path.display()))
}

fn extract(doc: &PDFDocument, selected: Option<&HashSet<usize>>, parallel: bool) -> Vec<PageRecords> {
    let wanted = |index: usize| selected.is_none_or(|s| s.contains(&index));
    if parallel {
        let mut pages = extract_pages_parallel_with_document(doc);
        pages.retain(|p| wanted(p.index));
        return pages;
    }
    let mut interpreter = PageInterpreter::new(doc);
    doc.pages()
        .enumerate()
        .filter(|(index, _)| wanted(*index))
        .map(|(index, page)| interpret_page(&mut interpreter, index, &page))
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let options = OpenOptions::default()
        .with_password(args.password.clone())
        .with_fallback(!args.no_fallback)
        .with_max_operators(args.max_operators)
        .with_max_xobject_depth(args.max_xobject_depth);
    let selected: Option<HashSet<usize>> = args
        .page_numbers
        .as_ref()
        .map(|nums| nums.iter().map(|n| n.saturating_sub(1)).collect());

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("cannot create {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    for path in &args.files {
        let doc = open_document(path, &options)?;
        debug!(file = %path.display(), encrypted = doc.is_encrypted(), "opened");
        let mut pages = extract(&doc, selected.as_ref(), args.parallel);
        let failed = pages.iter().filter(|p| !p.is_ok()).count();
        info!(file = %path.display(), pages = pages.len(), failed, "interpreted");

        for page in &mut pages {
            if args.omit_image_data {
                for record in &mut page.records {
                    if let Record::Image { raw_bytes, .. } = record {
                        raw_bytes.clear();
                    }
                }
            }
            serde_json::to_writer(&mut output, page)?;
            writeln!(output)?;
        }
    }

    output.flush()?;
    Ok(())
}
