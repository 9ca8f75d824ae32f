//! `olecf-export`: recursively exports an OLE Compound File's streams to a
//! directory on disk, mirroring the directory's own storage/stream layout.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use log::{error, info, Level};
use simple_logger::init_with_level;

use olecf::{Item, OleFile};

/// Exports every stream in an OLE Compound File to files on disk.
#[derive(Parser)]
#[command(name = "olecf-export", version)]
struct Args {
    /// Path to the OLE Compound File to export.
    file: String,

    /// Directory streams are written into, created if missing.
    #[arg(short = 't', long = "target", default_value = "export")]
    target: String,

    /// Optional file to append a line per exported stream to.
    #[arg(short = 'l', long = "logfile")]
    logfile: Option<String>,

    /// Verbose (debug-level) logging.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_with_level(if args.verbose { Level::Debug } else { Level::Info }).unwrap();

    let file = match OleFile::open(&args.file) {
        Ok(f) => f,
        Err(e) => {
            error!("failed to open '{}': {}", args.file, e);
            exit(1);
        }
    };

    let target = PathBuf::from(&args.target);
    if let Err(e) = fs::create_dir_all(&target) {
        error!("failed to create target directory '{}': {}", args.target, e);
        exit(1);
    }

    let mut log_file = match args.logfile.as_deref().map(open_log) {
        Some(Ok(f)) => Some(f),
        Some(Err(e)) => {
            error!("failed to open log file: {e}");
            exit(1);
        }
        None => None,
    };

    let Some(root) = file.root() else {
        error!("directory stream has no root storage entry");
        exit(1);
    };
    let mut exported = 0usize;
    export_children(&root, &target, &mut log_file, &mut exported);
    info!("exported {exported} stream(s) to {}", target.display());
}

fn open_log(path: &str) -> std::io::Result<fs::File> {
    fs::OpenOptions::new().create(true).append(true).open(path)
}

fn export_children(item: &Item, dir: &Path, log_file: &mut Option<fs::File>, exported: &mut usize) {
    for child in item.children() {
        let sanitized = sanitize(&child.name());
        let path = dir.join(&sanitized);
        if child.is_storage() {
            if let Err(e) = fs::create_dir_all(&path) {
                error!("failed to create '{}': {}", path.display(), e);
                continue;
            }
            export_children(&child, &path, log_file, exported);
        } else if child.is_stream() {
            match export_stream(&child, &path) {
                Ok(n) => {
                    *exported += 1;
                    info!("exported '{}' ({n} bytes)", path.display());
                    if let Some(f) = log_file {
                        let _ = writeln!(f, "{}\t{n}", path.display());
                    }
                }
                Err(e) => error!("failed to export '{}': {}", path.display(), e),
            }
        }
    }
}

fn export_stream(item: &Item, path: &Path) -> std::io::Result<usize> {
    let mut buf = vec![0u8; item.size() as usize];
    item.read(&mut buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    fs::write(path, &buf)?;
    Ok(buf.len())
}

/// Replaces path separators and other filesystem-hostile characters in a
/// stream's name so it can be used as a file name, spec.md §6's note that
/// export is a peripheral convenience, not a format-preserving operation.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}
