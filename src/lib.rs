// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod export;
pub mod fingerprint;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod source;
pub mod tag;
pub mod types;
pub mod watch;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::export::{Value, load_outputs, render_bundle};
use crate::fingerprint::{FileStampStore, MemoryStampStore, StampStore, render_stamps};
use crate::fs::{FileSystem, RealFileSystem};
use crate::source::resolve;
use crate::tag::{ArtifactTagger, SystemClock};
use crate::watch::{WatchEvent, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, then runs one subcommand. Results go to
/// stdout; logs go to stderr.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config_path();
    let cfg = load_and_validate(&config_path)?;
    debug!(
        config = ?config_path,
        base_dir = ?cfg.base_dir(),
        sources = cfg.sources().len(),
        "config loaded"
    );

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let tagger = ArtifactTagger::new(SystemClock);

    match args.command {
        Command::Files { source } => {
            let tree = cfg.source_tree(&source)?;
            let files = resolve(fs.as_ref(), &tree)?;
            for path in files.iter() {
                println!("{path}");
            }
        }
        Command::Fingerprint { sources, stamps } => {
            let results = pipeline::fingerprint_sources(&cfg, fs, &sources).await?;
            if stamps {
                let rendered =
                    render_stamps(results.iter().map(|s| (s.name.as_str(), &s.fingerprint)))?;
                print!("{rendered}");
            } else {
                for s in &results {
                    println!("{} {}", s.name, s.fingerprint);
                }
            }
        }
        Command::Tag { artifact } => {
            let tag = pipeline::tag_artifact(&cfg, fs, &tagger, &artifact).await?;
            println!("{}", tag.tag);
            if let Some(alias) = tag.alias {
                println!("{alias}");
            }
        }
        Command::Export { outputs, format } => {
            let outputs: BTreeMap<String, Value> = match outputs {
                Some(path) => load_outputs(fs.as_ref(), &path)?,
                None => BTreeMap::new(),
            };
            let bundle = pipeline::export_bundle(&cfg, fs, &tagger, &outputs).await?;
            info!(keys = bundle.len(), %format, "exporting config bundle");
            print!("{}", render_bundle(&bundle, format)?);
        }
        Command::Plan { previous } => {
            let store: Box<dyn StampStore> = match previous {
                Some(path) => Box::new(FileStampStore::open(fs.as_ref(), path)?),
                None => Box::new(MemoryStampStore::new()),
            };
            let entries = pipeline::plan(&cfg, fs, store.as_ref()).await?;
            for e in &entries {
                println!("{} {} {}", e.source, e.decision, e.fingerprint);
            }
        }
        Command::Watch => watch_sources(&cfg).await?,
    }

    Ok(())
}

/// Print fingerprint transitions until Ctrl-C.
async fn watch_sources(cfg: &ConfigFile) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<WatchEvent>(64);
    let _handle = spawn_watcher(cfg.source_trees(), tx)?;

    loop {
        tokio::select! {
            ev = rx.recv() => {
                let Some(ev) = ev else { break };
                match &ev.previous {
                    Some(prev) => println!("{} {} -> {}", ev.source, prev.short(), ev.current),
                    None => println!("{} {}", ev.source, ev.current),
                }
            }
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("interrupted; stopping watch");
                break;
            }
        }
    }

    Ok(())
}
