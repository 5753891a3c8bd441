//! dumppdf - Dump PDF internal structure as XML
//!
//! Prints trailers, selected objects, page dictionaries or every object
//! the cross-reference tables list. Streams can be written raw, decoded,
//! or as escaped text inside the XML.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{ArgAction, ArgGroup, Parser};
use memmap2::Mmap;
use pdfgraph_core::model::objects::DictExt;
use pdfgraph_core::{OpenOptions, PDFDocument, PDFObject};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Escape special characters for XML output.
fn escape(s: &[u8]) -> String {
    let mut result = String::with_capacity(s.len());
    for &byte in s {
        match byte {
            b'&' => result.push_str("&amp;"),
            b'<' => result.push_str("&lt;"),
            b'>' => result.push_str("&gt;"),
            b'"' => result.push_str("&quot;"),
            b'\'' => result.push_str("&#39;"),
            0..=31 | 127..=255 => result.push_str(&format!("&#{byte};")),
            _ => result.push(char::from(byte)),
        }
    }
    result
}

/// How stream payloads are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCodec {
    /// Dictionary only
    None,
    /// Undecoded bytes, no XML
    Raw,
    /// Decoded bytes, no XML
    Binary,
    /// Decoded bytes escaped into a `<data>` element
    Text,
}

fn dumpxml<W: Write>(out: &mut W, doc: &PDFDocument, obj: &PDFObject, codec: StreamCodec) -> Result<()> {
    match obj {
        PDFObject::Null => write!(out, "<null />")?,
        PDFObject::Bool(b) => write!(out, "<boolean>{b}</boolean>")?,
        PDFObject::Int(n) => write!(out, "<number>{n}</number>")?,
        PDFObject::Real(n) => write!(out, "<number>{n}</number>")?,
        PDFObject::String(s) => write!(out, r#"<string size="{}">{}</string>"#, s.len(), escape(s))?,
        PDFObject::Name(name) => write!(out, "<literal>{}</literal>", escape(name))?,
        PDFObject::Array(items) => {
            writeln!(out, r#"<list size="{}">"#, items.len())?;
            for item in items {
                dumpxml(out, doc, item, codec)?;
                writeln!(out)?;
            }
            write!(out, "</list>")?;
        }
        PDFObject::Dict(dict) => {
            writeln!(out, r#"<dict size="{}">"#, dict.len())?;
            for (k, v) in dict {
                writeln!(out, "<key>{}</key>", escape(k))?;
                write!(out, "<value>")?;
                dumpxml(out, doc, v, codec)?;
                writeln!(out, "</value>")?;
            }
            write!(out, "</dict>")?;
        }
        PDFObject::Stream(stream) => match codec {
            StreamCodec::Raw => out.write_all(stream.get_rawdata())?,
            StreamCodec::Binary => out.write_all(doc.decode_stream(stream))?,
            StreamCodec::Text | StreamCodec::None => {
                writeln!(out, "<stream>")?;
                writeln!(out, "<props>")?;
                dumpxml(out, doc, &PDFObject::Dict(stream.attrs.clone()), codec)?;
                writeln!(out)?;
                writeln!(out, "</props>")?;
                if codec == StreamCodec::Text {
                    let data = doc.decode_stream(stream);
                    writeln!(out, r#"<data size="{}">{}</data>"#, data.len(), escape(data))?;
                }
                write!(out, "</stream>")?;
            }
        },
        PDFObject::Ref(objref) => write!(out, r#"<ref id="{}" />"#, objref.objid)?,
    }
    Ok(())
}

fn dumptrailers<W: Write>(out: &mut W, doc: &PDFDocument, show_fallback_xref: bool) -> Result<()> {
    let mut any_regular = false;
    for (is_fallback, trailer) in doc.trailers() {
        any_regular |= !is_fallback;
        if !is_fallback || show_fallback_xref {
            writeln!(out, "<trailer>")?;
            dumpxml(out, doc, &PDFObject::Dict(trailer.clone()), StreamCodec::None)?;
            writeln!(out)?;
            writeln!(out, "</trailer>")?;
            writeln!(out)?;
        }
    }
    if !any_regular && !show_fallback_xref {
        warn!(
            "this PDF has no valid xref; use --show-fallback-xref to display \
             the fallback xref that lists all objects"
        );
    }
    Ok(())
}

fn dumpallobjs<W: Write>(
    out: &mut W,
    doc: &PDFDocument,
    codec: StreamCodec,
    show_fallback_xref: bool,
) -> Result<()> {
    write!(out, "<pdf>")?;
    for objid in doc.objids() {
        match doc.getobj(objid) {
            Ok(obj) => {
                writeln!(out, r#"<object id="{objid}">"#)?;
                dumpxml(out, doc, &obj, codec)?;
                writeln!(out)?;
                writeln!(out, "</object>")?;
                writeln!(out)?;
            }
            Err(err) => warn!(objid, %err, "object not readable"),
        }
    }
    dumptrailers(out, doc, show_fallback_xref)?;
    write!(out, "</pdf>")?;
    Ok(())
}

fn dumppdf<W: Write>(
    out: &mut W,
    doc: &PDFDocument,
    objids: &[u32],
    pagenos: &HashSet<usize>,
    codec: StreamCodec,
    show_fallback_xref: bool,
) -> Result<()> {
    for &objid in objids {
        match doc.getobj(objid) {
            Ok(obj) => dumpxml(out, doc, &obj, codec)?,
            Err(err) => warn!(objid, %err, "object not readable"),
        }
    }

    if !pagenos.is_empty() {
        for (pageno, page) in doc.pages().enumerate() {
            if !pagenos.contains(&pageno) {
                continue;
            }
            if codec == StreamCodec::None {
                dumpxml(out, doc, &PDFObject::Dict(page.attrs.clone()), codec)?;
            } else if let Some(contents) = page.attrs.get_key("Contents") {
                let resolved = doc.resolve(contents)?;
                dumpxml(out, doc, &resolved, codec)?;
            }
        }
    }

    if objids.is_empty() && pagenos.is_empty() {
        dumptrailers(out, doc, show_fallback_xref)?;
    }
    if codec != StreamCodec::Raw && codec != StreamCodec::Binary {
        writeln!(out)?;
    }
    Ok(())
}

/// Dump PDF internal structure as XML.
#[derive(Parser, Debug)]
#[command(name = "dumppdf")]
#[command(author, version, about = "Dump PDF structure in XML format", long_about = None)]
#[command(group(
    ArgGroup::new("stream_codec")
        .args(["raw_stream", "binary_stream", "text_stream"])
))]
struct Args {
    /// One or more paths to PDF files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Use debug logging level (overrides RUST_LOG)
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Page numbers to dump (1-indexed), e.g. --page-numbers=1,3
    #[arg(long = "page-numbers", value_delimiter = ',')]
    page_numbers: Option<Vec<usize>>,

    /// Comma-separated list of object IDs to dump
    #[arg(short = 'i', long = "objects", value_delimiter = ',')]
    objects: Option<Vec<u32>>,

    /// Dump every object the cross-reference tables list
    #[arg(short = 'a', long = "all", action = ArgAction::SetTrue)]
    all: bool,

    /// Show the fallback xref if the PDF has no valid xref
    #[arg(long = "show-fallback-xref", action = ArgAction::SetTrue)]
    show_fallback_xref: bool,

    /// The password to use for decrypting PDF file
    #[arg(short = 'P', long, default_value = "")]
    password: String,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Write stream objects without decoding
    #[arg(short = 'r', long = "raw-stream", action = ArgAction::SetTrue)]
    raw_stream: bool,

    /// Write decoded stream objects as binary
    #[arg(short = 'b', long = "binary-stream", action = ArgAction::SetTrue)]
    binary_stream: bool,

    /// Write decoded stream objects as escaped text
    #[arg(short = 't', long = "text-stream", action = ArgAction::SetTrue)]
    text_stream: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let codec = if args.raw_stream {
        StreamCodec::Raw
    } else if args.binary_stream {
        StreamCodec::Binary
    } else if args.text_stream {
        StreamCodec::Text
    } else {
        StreamCodec::None
    };
    let objids = args.objects.clone().unwrap_or_default();
    let pagenos: HashSet<usize> = args
        .page_numbers
        .iter()
        .flatten()
        .map(|n| n.saturating_sub(1))
        .collect();
    let options = OpenOptions::default().with_password(args.password.clone());

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("cannot create {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    for path in &args.files {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        // SAFETY: the map is read-only and lives as long as the document.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("cannot map {}", path.display()))?;
        let doc = PDFDocument::open_with(Bytes::from_owner(mmap), &options)
            .with_context(|| format!("cannot read {}", path.display()))?;

        if args.all {
            dumpallobjs(&mut output, &doc, codec, args.show_fallback_xref)?;
        } else {
            dumppdf(&mut output, &doc, &objids, &pagenos, codec, args.show_fallback_xref)?;
        }
    }

    output.flush()?;
    Ok(())
}
