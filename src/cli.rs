// ============================================================================
// Mapquill CLI — headless map-record maintenance via command-line arguments
// ============================================================================
//
// Usage examples:
//   mapquill --export map.png              (decode the saved map to a PNG file)
//   mapquill --import sketch.png           (store a PNG as the saved map)
//   mapquill --clear                       (remove the saved map record)
//   mapquill --status                      (report whether a record exists)
//   mapquill --export map.png --storage-dir /tmp/maps --verbose
//
// No window is opened in CLI mode; everything runs synchronously on the
// current thread against the file store.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::canvas::MapCanvas;
use crate::settings::Settings;
use crate::store::{self, FileStore, MAP_RECORD_KEY, MapStore};

/// Mapquill headless map-record tool.
///
/// Export, import, inspect or remove the persisted parchment-map drawing
/// without opening the editor window.
#[derive(Parser, Debug)]
#[command(
    name = "mapquill",
    about = "Mapquill headless map-record tool",
    long_about = "Export, import, inspect or remove the persisted parchment-map\n\
                  drawing without opening the editor window.\n\n\
                  Example:\n  \
                  mapquill --export map.png\n  \
                  mapquill --import sketch.png --storage-dir /tmp/maps"
)]
pub struct CliArgs {
    /// Decode the persisted map record and write it to FILE as PNG.
    #[arg(short, long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Read FILE (PNG) and store it as the persisted map record.
    #[arg(short, long, value_name = "FILE")]
    pub import: Option<PathBuf>,

    /// Remove the persisted map record.
    #[arg(long)]
    pub clear: bool,

    /// Report whether a record exists and its decoded dimensions.
    #[arg(long)]
    pub status: bool,

    /// Store directory override (default: the OS data directory, or the
    /// settings-file value when set).
    #[arg(long, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Print per-step timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process
    /// arguments. Used by `main()` to route before creating a window.
    pub fn is_cli_mode() -> bool {
        std::env::args().skip(1).any(|a| {
            matches!(
                a.as_str(),
                "--export"
                    | "-e"
                    | "--import"
                    | "-i"
                    | "--clear"
                    | "--status"
                    | "--help"
                    | "-h"
                    | "--version"
                    | "-V"
            )
        })
    }
}

/// Entry point for CLI mode. Parses the real process arguments.
pub fn run() -> ExitCode {
    let args = CliArgs::parse();
    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mapquill: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &CliArgs) -> Result<(), String> {
    if args.export.is_none() && args.import.is_none() && !args.clear && !args.status {
        return Err("nothing to do (try --export, --import, --clear or --status)".into());
    }

    let mut store = open_store(args);
    if args.verbose {
        println!("store directory: {}", store.dir().display());
    }

    if let Some(path) = &args.import {
        let started = Instant::now();
        let bytes =
            std::fs::read(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let canvas = MapCanvas::from_png_bytes(&bytes)?;
        let record = store::encode_record(&canvas)?;
        store.set(MAP_RECORD_KEY, &record)?;
        if args.verbose {
            println!(
                "imported {} ({}x{}) in {:.1?}",
                path.display(),
                canvas.width(),
                canvas.height(),
                started.elapsed()
            );
        }
    }

    if let Some(path) = &args.export {
        let started = Instant::now();
        let record = store
            .get(MAP_RECORD_KEY)?
            .ok_or_else(|| "no map record to export".to_string())?;
        let canvas = store::decode_record(&record)?;
        std::fs::write(path, canvas.to_png_bytes()?)
            .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
        if args.verbose {
            println!(
                "exported {}x{} to {} in {:.1?}",
                canvas.width(),
                canvas.height(),
                path.display(),
                started.elapsed()
            );
        }
    }

    if args.clear {
        store.remove(MAP_RECORD_KEY)?;
        if args.verbose {
            println!("map record removed");
        }
    }

    if args.status {
        match store.get(MAP_RECORD_KEY)? {
            Some(record) => {
                let canvas = store::decode_record(&record)?;
                println!(
                    "map record present: {}x{}, {} bytes encoded",
                    canvas.width(),
                    canvas.height(),
                    record.len()
                );
            }
            None => println!("no map record"),
        }
    }

    Ok(())
}

fn open_store(args: &CliArgs) -> FileStore {
    if let Some(dir) = &args.storage_dir {
        return FileStore::with_dir(dir.clone());
    }
    let settings = Settings::load();
    if settings.storage_dir.is_empty() {
        FileStore::new()
    } else {
        FileStore::with_dir(PathBuf::from(settings.storage_dir))
    }
}
