//! `olecf-info`: inspects an OLE Compound File's allocation tables,
//! directory tree, and well-known property-set streams.

use std::collections::HashMap;
use std::process::exit;

use clap::Parser;
use lazy_static::lazy_static;
use log::{error, info, Level};
use simple_logger::init_with_level;

use olecf::{Item, OleFile, OpenOptions};

lazy_static! {
    /// Codepage names accepted by `-c`, spec.md §6.
    static ref CODEPAGES: HashMap<&'static str, &'static encoding_rs::Encoding> = {
        let mut m = HashMap::new();
        m.insert("ascii", encoding_rs::WINDOWS_1252);
        m.insert("windows-874", encoding_rs::WINDOWS_874);
        m.insert("windows-932", encoding_rs::SHIFT_JIS);
        m.insert("windows-936", encoding_rs::GBK);
        m.insert("windows-949", encoding_rs::EUC_KR);
        m.insert("windows-950", encoding_rs::BIG5);
        m.insert("windows-1250", encoding_rs::WINDOWS_1250);
        m.insert("windows-1251", encoding_rs::WINDOWS_1251);
        m.insert("windows-1252", encoding_rs::WINDOWS_1252);
        m.insert("windows-1253", encoding_rs::WINDOWS_1253);
        m.insert("windows-1254", encoding_rs::WINDOWS_1254);
        m.insert("windows-1255", encoding_rs::WINDOWS_1255);
        m.insert("windows-1256", encoding_rs::WINDOWS_1256);
        m.insert("windows-1257", encoding_rs::WINDOWS_1257);
        m.insert("windows-1258", encoding_rs::WINDOWS_1258);
        m
    };
}

/// Inspects an OLE Compound File.
#[derive(Parser)]
#[command(name = "olecf-info", version)]
struct Args {
    /// Path to the OLE Compound File to inspect.
    file: String,

    /// Show allocation table info (sector size, unallocated sector count).
    #[arg(short = 'a', long = "allocation")]
    allocation: bool,

    /// ASCII codepage used to decode STRING_ASCII property values.
    #[arg(short = 'c', long = "codepage", default_value = "ascii")]
    codepage: String,

    /// Verbose (debug-level) logging.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_with_level(if args.verbose { Level::Debug } else { Level::Info }).unwrap();

    let codepage = match CODEPAGES.get(args.codepage.as_str()) {
        Some(&enc) => enc,
        None => {
            error!("unknown codepage '{}'", args.codepage);
            exit(1);
        }
    };

    let file = match OpenOptions::new().codepage(codepage).open(&args.file) {
        Ok(f) => f,
        Err(e) => {
            error!("failed to open '{}': {}", args.file, e);
            exit(1);
        }
    };

    let (major, minor) = file.format_version();
    println!("format version: {major}.{minor}");
    println!("sector size: {}", file.sector_size());
    println!("short sector size: {}", file.short_sector_size());

    if args.allocation {
        println!("unallocated sectors: {}", file.unallocated_sector_count());
    }

    match file.root() {
        Some(root) => print_tree(&root, 0),
        None => error!("directory stream has no root storage entry"),
    }

    if let Some(item) = file.summary_information() {
        print_property_set("SummaryInformation", &item, codepage);
    }
    if let Some(item) = file.document_summary_information() {
        print_property_set("DocumentSummaryInformation", &item, codepage);
    }
}

fn print_tree(item: &Item, depth: usize) {
    info!("{}{} ({} bytes)", "  ".repeat(depth), item.name(), item.size());
    for child in item.children() {
        print_tree(&child, depth + 1);
    }
}

fn print_property_set(label: &str, item: &Item, codepage: &'static encoding_rs::Encoding) {
    let set = match item.as_property_set() {
        Ok(set) => set,
        Err(e) => {
            error!("failed to decode {label}: {e}");
            return;
        }
    };
    println!("{label}: {} section(s)", set.section_count());
    for section_index in 0..set.section_count() {
        let section = match set.section(section_index) {
            Some(s) => s,
            None => continue,
        };
        for prop_index in 0..section.property_count() {
            let Some(prop) = section.property(prop_index) else {
                continue;
            };
            let value = prop
                .value
                .as_string_ascii(codepage)
                .or_else(|| prop.value.as_u32().map(|v| v.to_string()))
                .unwrap_or_else(|| format!("{:?}", prop.value.raw()));
            println!("  [{}] property {} = {}", label, prop.id, value);
        }
    }
}
