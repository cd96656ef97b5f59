#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Result;
use clap::Parser;
use mapty::map::{FixedLocation, HeadlessMap, MapSurface};
use mapty::session::Session;
use mapty::storage::{KeyValueStore, MemoryStore, SqliteStore, WorkoutStorage};
use mapty::{cli, shell, utils};
use std::io;

#[macro_use]
extern crate mapty;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let store = open_store(&cli)?;
    let mut storage = WorkoutStorage::new(store);

    match cli.cmd {
        Some(cli::Cmd::List) => {
            let workouts = storage.load();
            dlog!("mode=list workouts={}", workouts.len());
            for w in workouts {
                println!(
                    "{}\t{}\t{}\t{}",
                    w.id(),
                    w.date().to_rfc3339(),
                    w.coords(),
                    w.description()
                );
            }
            Ok(())
        }
        Some(cli::Cmd::Reset) => {
            dlog!("mode=reset");
            if !storage.clear() {
                anyhow::bail!("Could not clear stored workouts.");
            }
            tracing::info!("stored workouts cleared");
            Ok(())
        }
        None => {
            let position = cli.position();
            dlog!("mode=session position={position:?} zoom={}", cli.zoom);

            let map = MapSurface::new(
                HeadlessMap::new(),
                FixedLocation::from_option(position),
                cli.zoom,
            );
            let mut session = Session::new(storage, map);
            session.start();

            let stdin = io::stdin();
            shell::run(&mut session, stdin.lock(), io::stdout().lock())
        }
    }
}

fn open_store(cli: &cli::Cli) -> Result<Box<dyn KeyValueStore>> {
    if cli.ephemeral {
        tracing::info!("using in-memory store");
        return Ok(Box::new(MemoryStore::new()));
    }
    tracing::info!(path = %cli.store.display(), "using SQLite store");
    Ok(Box::new(SqliteStore::open(&cli.store)?))
}
