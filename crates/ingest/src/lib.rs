//! The ingestion coordinator: the thing that actually drives the three
//! format-specific parsers and the store together. A parser crate only ever
//! sees one document or one archive; this crate is what decides which
//! Source that document belongs to, walks the zip wrapper it usually
//! arrives in, and runs the "replace this Source's Routes, then sweep
//! anything this run didn't touch" lifecycle.

pub mod arbitration;
pub mod error;
pub mod operator;
mod zipwalk;

use std::collections::HashMap;
use std::io::{Read, Seek};

use chrono::{DateTime, Local};
use model::operator::Operator;
use schedule_ir::IntermediateRoute;
use schedule_store::ScheduleOperations;
use utility::id::Id;

pub use error::{IngestError, Result};

/// Groups routes that are competing revisions of the same schedule and
/// keeps only the one `arbitration::select_current` picks for each group,
/// so an archive that republishes an earlier revision alongside a current
/// one never fights itself over which Trips survive. Distinct lines of one
/// service are distinct schedules and never compete.
fn select_current_revisions(
    routes: Vec<IntermediateRoute>,
    on_date: chrono::NaiveDate,
    ticketer: bool,
) -> Vec<IntermediateRoute> {
    let mut groups: HashMap<String, Vec<IntermediateRoute>> = HashMap::new();
    for route in routes {
        let segment = if ticketer {
            route.code.split('_').nth(1)
        } else {
            None
        };
        let base =
            arbitration::revision_key(route.service_code.as_deref().unwrap_or(&route.code), segment);
        let key = format!("{base}#{}", route.line_name);
        groups.entry(key).or_default().push(route);
    }
    groups
        .into_values()
        .filter_map(|candidates| arbitration::select_current(&candidates, on_date).cloned())
        .collect()
}

/// Persists a batch of already-parsed routes under one Source: creates or
/// reuses the Source, resolves each trip's operator, replaces each Route in
/// place (trip identity is preserved inside `replace_route` where the trip
/// count and start times match), then runs the end-of-archive sweep:
/// deleting Routes this run didn't touch, marking Services with no current
/// Route left, and reactivating any Stop a current Route now references.
///
/// An archive whose SHA1 was already ingested under a different Source is
/// skipped entirely; the original Source stays the representative one.
pub async fn persist_routes<Ops: ScheduleOperations + Send>(
    ops: &mut Ops,
    source_name: &str,
    mtime: DateTime<Local>,
    sha1: Option<String>,
    routes: Vec<IntermediateRoute>,
) -> Result<()> {
    let (source_id, mut source) = ops.get_or_create_source(source_name).await?;
    source.datetime = mtime;

    if let Some(sha1) = sha1 {
        if let Some((_, original)) = ops.source_by_sha1(&sha1, source_id).await? {
            log::info!("{source_name}: identical archive already ingested as {original}; skipping");
            return Ok(());
        }
        source.sha1 = Some(sha1);
    }

    let ticketer = source_name.to_ascii_lowercase().contains("ticketer");
    let routes = select_current_revisions(routes, mtime.date_naive(), ticketer);

    let mut operator_cache: HashMap<String, Option<Id<Operator>>> = HashMap::new();
    let mut touched_codes = Vec::with_capacity(routes.len());
    for mut route in routes {
        let competing_complete = ops
            .complete_source_claims_line(source_id, &route.line_name)
            .await?;
        if arbitration::should_defer_to(source.complete, competing_complete) {
            log::info!(
                "{source_name}: line {} is covered by a complete source; skipping",
                route.line_name
            );
            continue;
        }

        for trip in &mut route.trips {
            let Some(operator_ref) = trip.operator_ref.clone() else {
                continue;
            };
            let resolved = match operator_cache.get(&operator_ref).cloned() {
                Some(resolved) => resolved,
                None => {
                    let resolved = operator::resolve(ops, Some(&operator_ref)).await?;
                    operator_cache.insert(operator_ref, resolved.clone());
                    resolved
                }
            };
            trip.operator_ref = resolved.map(|id| id.raw());
        }

        let service_operator = route
            .trips
            .first()
            .and_then(|trip| trip.operator_ref.clone())
            .map(Id::new);
        let service_id = ops
            .get_or_create_service(
                &route.line_name,
                service_operator,
                route.unique_service_code.as_deref(),
            )
            .await?;

        touched_codes.push(route.code.clone());
        ops.replace_route(source_id, service_id, route).await?;
    }

    ops.delete_untouched_routes(source_id, &touched_codes).await?;
    ops.mark_services_without_current_routes_as_not_current().await?;
    ops.reactivate_referenced_stops().await?;
    // datetime (and sha1) advance only once everything else has succeeded
    ops.update_source(source_id, &source).await?;
    Ok(())
}

/// Walks a zip of TransXChange documents (one `.xml` file per service is the
/// usual shape, possibly nested inside another zip) and ingests all of them
/// as one Source.
pub async fn ingest_transxchange<Ops: ScheduleOperations + Send>(
    ops: &mut Ops,
    source_name: &str,
    mtime: DateTime<Local>,
    sha1: Option<String>,
    archive: impl Read + Seek,
) -> Result<()> {
    let entries = zipwalk::collect_files(archive, |name| {
        name.to_ascii_lowercase().ends_with(".xml")
    })?;

    let mut routes = Vec::new();
    for (name, bytes) in entries {
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                log::warn!("skipping {name}: not valid UTF-8");
                continue;
            }
        };
        match transxchange::parse_document(&text) {
            Ok(parsed) => routes.extend(parsed),
            Err(err) => log::warn!("skipping {name}: {err}"),
        }
    }

    persist_routes(ops, source_name, mtime, sha1, routes).await
}

/// Parses and ingests an ATCO-CIF zip archive as one Source.
pub async fn ingest_atco_cif<Ops: ScheduleOperations + Send>(
    ops: &mut Ops,
    source_name: &str,
    mtime: DateTime<Local>,
    sha1: Option<String>,
    archive: impl Read + Seek,
) -> Result<()> {
    let routes = atco_cif::parse_archive(archive)?;
    persist_routes(ops, source_name, mtime, sha1, routes).await
}

/// Parses and ingests a GTFS zip feed as one Source, including the stops it
/// declares (a GTFS feed is self-contained, unlike TransXChange's separate
/// `NaPTAN` stop file convention).
pub async fn ingest_gtfs<Ops: ScheduleOperations + Send>(
    ops: &mut Ops,
    source_name: &str,
    mtime: DateTime<Local>,
    sha1: Option<String>,
    archive: impl Read + Seek,
    options: &gtfs::GtfsOptions,
) -> Result<()> {
    let import = gtfs::parse_archive(archive, options)?;
    ops.upsert_stops(&import.stops).await?;
    persist_routes(ops, source_name, mtime, sha1, import.routes).await
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn route(code: &str, service_code: &str, line_name: &str, revision: i32) -> IntermediateRoute {
        IntermediateRoute {
            code: code.to_owned(),
            service_code: Some(service_code.to_owned()),
            line_name: line_name.to_owned(),
            line_brand: None,
            revision_number: Some(revision),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            outbound_description: None,
            inbound_description: None,
            unique_service_code: None,
            trips: Vec::new(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn competing_revisions_collapse_to_the_highest() {
        let survivors = select_current_revisions(
            vec![route("v1.xml", "PB1:1", "42", 1), route("v2.xml", "PB1:1", "42", 2)],
            today(),
            false,
        );
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].code, "v2.xml");
    }

    #[test]
    fn an_unstarted_revision_loses_to_the_one_in_effect() {
        let mut future = route("v2.xml", "PB1:1", "42", 2);
        future.start_date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let survivors = select_current_revisions(
            vec![route("v1.xml", "PB1:1", "42", 1), future],
            today(),
            false,
        );
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].code, "v1.xml");
    }

    #[test]
    fn sibling_lines_of_one_service_both_survive() {
        let mut survivors = select_current_revisions(
            vec![route("a.xml", "PB1:1", "42", 1), route("a.xml", "PB1:1", "42A", 1)],
            today(),
            false,
        );
        survivors.sort_by(|a, b| a.line_name.cmp(&b.line_name));
        assert_eq!(survivors.len(), 2);
    }

    #[test]
    fn ticketer_feeds_compare_revisions_per_filename_segment() {
        let survivors = select_current_revisions(
            vec![
                route("OP_depot1_42.xml", "42", "42", 1),
                route("OP_depot2_42.xml", "42", "42", 1),
            ],
            today(),
            true,
        );
        assert_eq!(survivors.len(), 2);
    }
}
