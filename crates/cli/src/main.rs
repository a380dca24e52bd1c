//! `timetable-cli`: imports timetable archives into the schedule store and
//! prints matrix timetables back out of it, mostly for diagnostics. One
//! archive is one transaction; a failed archive is logged and skipped so the
//! rest of the run still completes, and the exit code reports whether
//! anything failed.

mod render;

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local, NaiveDate};
use clap::{Parser, Subcommand};
use matrix::Leg;
use schedule_store::{
    CalendarRepo, ConnectionInfo, PgScheduleStore, RouteRepo, ScheduleStore, ScheduleTransaction,
    TripRepo,
};
use sha1::{Digest, Sha1};
use utility::id::Id;

#[derive(Debug, Parser)]
#[command(name = "timetable-cli")]
#[command(about = "Imports bus timetable archives and prints matrix timetables")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import one or more TransXChange zip archives
    ImportTransxchange {
        #[arg(required = true)]
        archives: Vec<PathBuf>,
    },
    /// Import one or more ATCO-CIF zip archives
    ImportAtcoCif {
        #[arg(required = true)]
        archives: Vec<PathBuf>,
    },
    /// Import one or more GTFS feeds
    ImportGtfs {
        #[arg(required = true)]
        archives: Vec<PathBuf>,
        /// Only import routes whose route_id starts with this prefix
        #[arg(long)]
        route_prefix: Option<String>,
        /// The feed publishes stop times in UTC rather than local time
        #[arg(long)]
        utc: bool,
    },
    /// Print the matrix timetable for the given routes on a date
    Matrix {
        #[arg(required = true)]
        route_ids: Vec<i32>,
        #[arg(long)]
        date: NaiveDate,
    },
}

/// The archive's bytes, its filesystem mtime, and the SHA1 of its content.
struct ArchiveFile {
    name: String,
    bytes: Vec<u8>,
    mtime: DateTime<Local>,
    sha1: String,
}

fn read_archive(path: &Path) -> anyhow::Result<ArchiveFile> {
    let bytes = std::fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
    let mtime: DateTime<Local> = std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .with_context(|| format!("could not stat {}", path.display()))?
        .into();
    let sha1 = Sha1::digest(&bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ArchiveFile {
        name,
        bytes,
        mtime,
        sha1,
    })
}

fn source_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn connect() -> anyhow::Result<PgScheduleStore> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return PgScheduleStore::connect_url(&url)
            .await
            .map_err(|err| anyhow!("could not connect to the schedule store: {err}"));
    }
    let info = ConnectionInfo::from_env().ok_or_else(|| {
        anyhow!("set DATABASE_URL or DATABASE_{{USER,PASSWORD,HOST,PORT,NAME}}")
    })?;
    PgScheduleStore::connect(info)
        .await
        .map_err(|err| anyhow!("could not connect to the schedule store: {err}"))
}

enum Format {
    Transxchange,
    AtcoCif,
    Gtfs(gtfs::GtfsOptions),
}

async fn import(store: &PgScheduleStore, archives: &[PathBuf], format: Format) -> anyhow::Result<()> {
    let mut failures = 0usize;
    for path in archives {
        if let Err(err) = import_one(store, path, &format).await {
            log::error!("{}: {err:#}", path.display());
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} of {} archive(s) failed", archives.len());
    }
    Ok(())
}

async fn import_one(store: &PgScheduleStore, path: &Path, format: &Format) -> anyhow::Result<()> {
    let archive = read_archive(path)?;
    let reader = Cursor::new(archive.bytes);

    let mut tx = store.transaction().await?;
    match format {
        Format::Transxchange => {
            let source = source_name_for(path);
            ingest::ingest_transxchange(&mut tx, &source, archive.mtime, Some(archive.sha1), reader)
                .await?;
        }
        Format::AtcoCif => {
            let source = atco_cif::source_name(&archive.name);
            ingest::ingest_atco_cif(&mut tx, source, archive.mtime, Some(archive.sha1), reader)
                .await?;
        }
        Format::Gtfs(options) => {
            let source = source_name_for(path);
            ingest::ingest_gtfs(&mut tx, &source, archive.mtime, Some(archive.sha1), reader, options)
                .await?;
        }
    }
    tx.commit().await?;
    log::info!("imported {}", path.display());
    Ok(())
}

async fn print_matrix(
    store: &PgScheduleStore,
    route_ids: &[i32],
    date: NaiveDate,
) -> anyhow::Result<()> {
    let mut ops = store.auto();
    let mut outbound = Vec::new();
    let mut inbound = Vec::new();
    let mut operates_cache: HashMap<i32, bool> = HashMap::new();

    for &route_id in route_ids {
        let route_id = Id::new(route_id);
        let Some(route) = ops.route_by_id(route_id).await? else {
            log::warn!("route {route_id} does not exist or is deleted");
            continue;
        };

        for (trip_id, trip) in ops.trips_for_route(route_id).await? {
            let operates = match operates_cache.get(&trip.calendar_id.raw()).copied() {
                Some(operates) => operates,
                None => {
                    let operates = ops
                        .calendar_by_id(trip.calendar_id)
                        .await?
                        .is_some_and(|calendar| calendar.operates(date));
                    operates_cache.insert(trip.calendar_id.raw(), operates);
                    operates
                }
            };
            if !operates {
                continue;
            }

            let notes = ops.notes_for_trip(trip_id).await?;
            let leg = Leg {
                route_id,
                line_name: route.line_name.clone(),
                operator_id: trip.operator_id.clone(),
                trip,
                notes,
            };
            if leg.trip.inbound {
                inbound.push(leg);
            } else {
                outbound.push(leg);
            }
        }
    }

    if outbound.is_empty() && inbound.is_empty() {
        bail!("no trips operate on {date} for the given routes");
    }

    for (direction, legs) in [("Outbound", outbound), ("Inbound", inbound)] {
        if legs.is_empty() {
            continue;
        }
        let grouping = matrix::build_grouping(legs);
        println!("{direction}, {date}");
        print!("{}", render::render(&grouping));
        println!();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let store = connect().await?;

    match cli.command {
        Command::ImportTransxchange { archives } => {
            import(&store, &archives, Format::Transxchange).await
        }
        Command::ImportAtcoCif { archives } => import(&store, &archives, Format::AtcoCif).await,
        Command::ImportGtfs {
            archives,
            route_prefix,
            utc,
        } => {
            let options = gtfs::GtfsOptions {
                route_id_prefix: route_prefix,
                utc,
            };
            import(&store, &archives, Format::Gtfs(options)).await
        }
        Command::Matrix { route_ids, date } => print_matrix(&store, &route_ids, date).await,
    }
}
