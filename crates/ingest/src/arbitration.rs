//! Source and revision arbitration: deciding which of several competing
//! Routes for the same line actually counts as current. Each rule here is a
//! pure predicate or selector so the coordinator can apply them without
//! needing to re-derive the policy at each call site.

use chrono::NaiveDate;
use model::source::PrefixWindow;
use schedule_ir::IntermediateRoute;
use std::collections::HashMap;

/// An incomplete source must defer to a complete one covering the same
/// operator, on a line the complete source also claims.
pub fn should_defer_to(candidate_complete: bool, competing_complete: bool) -> bool {
    competing_complete && !candidate_complete
}

/// Picks the filename prefix whose window covers `on_date`, for an
/// incremental feed whose `Source.settings` lists several prefixes each
/// covering a different date range. Ties go to the prefix with the later
/// start date, since a republished window is assumed to supersede the one
/// it overlaps.
pub fn current_prefix(settings: &HashMap<String, PrefixWindow>, on_date: NaiveDate) -> Option<&str> {
    settings
        .values()
        .filter(|(_, start, end)| *start <= on_date && on_date <= *end)
        .max_by_key(|(_, start, _)| *start)
        .map(|(prefix, _, _)| prefix.as_str())
}

/// `NCSD_TXC/`-prefixed codes win a tie in revision number.
fn is_ncsd_txc(code: &str) -> bool {
    code.starts_with("NCSD_TXC/")
}

/// The key used to compare revisions of the same underlying schedule. Most
/// feeds compare directly on `service_code`; "Ticketer" feeds instead key on
/// `service_code` plus the second segment of the source filename, since a
/// single Ticketer service code can appear in several unrelated archives.
pub fn revision_key(service_code: &str, ticketer_filename_segment: Option<&str>) -> String {
    match ticketer_filename_segment {
        Some(segment) => format!("{service_code}:{segment}"),
        None => service_code.to_owned(),
    }
}

/// Picks the Route that should count as current among a set that all share
/// one `revision_key`.
///
/// A per-date override (`start_date == end_date == on_date`) always wins.
/// Otherwise only routes whose publication window covers `on_date` are in
/// the race, so a revision that has not started yet (or has already ended)
/// never displaces the one actually in effect; if no window covers the
/// date, every candidate is considered. The highest `revision_number`
/// wins, with an `NCSD_TXC/`-coded route breaking a tie in its own favour.
pub fn select_current<'a>(
    candidates: &'a [IntermediateRoute],
    on_date: NaiveDate,
) -> Option<&'a IntermediateRoute> {
    if let Some(override_route) = candidates
        .iter()
        .find(|route| route.start_date == on_date && route.end_date == Some(on_date))
    {
        return Some(override_route);
    }

    let mut in_race: Vec<&IntermediateRoute> = candidates
        .iter()
        .filter(|route| {
            route.start_date <= on_date && route.end_date.is_none_or(|end| end >= on_date)
        })
        .collect();
    if in_race.is_empty() {
        in_race = candidates.iter().collect();
    }

    in_race.into_iter().max_by(|a, b| {
        is_ncsd_txc(&a.code)
            .cmp(&is_ncsd_txc(&b.code))
            .then(a.revision_number.cmp(&b.revision_number))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(code: &str, revision_number: Option<i32>, start: NaiveDate, end: Option<NaiveDate>) -> IntermediateRoute {
        IntermediateRoute {
            code: code.to_owned(),
            service_code: None,
            line_name: "1".to_owned(),
            line_brand: None,
            revision_number,
            start_date: start,
            end_date: end,
            outbound_description: None,
            inbound_description: None,
            unique_service_code: None,
            trips: Vec::new(),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn incomplete_source_defers_to_complete_one() {
        assert!(should_defer_to(false, true));
        assert!(!should_defer_to(true, true));
        assert!(!should_defer_to(false, false));
    }

    #[test]
    fn highest_revision_number_wins() {
        let a = route("R1", Some(1), date(1), None);
        let b = route("R2", Some(2), date(1), None);
        let routes = [a, b];
        let winner = select_current(&routes, date(10)).unwrap();
        assert_eq!(winner.code, "R2");
    }

    #[test]
    fn a_future_revision_does_not_displace_the_route_in_effect() {
        let active = route("R1", Some(1), date(1), None);
        let future = route("R2", Some(2), date(20), None);
        let routes = [active, future];
        let winner = select_current(&routes, date(10)).unwrap();
        assert_eq!(winner.code, "R1");
    }

    #[test]
    fn an_expired_revision_does_not_displace_the_route_in_effect() {
        let expired = route("R1", Some(2), date(1), Some(date(5)));
        let active = route("R2", Some(1), date(6), None);
        let routes = [expired, active];
        let winner = select_current(&routes, date(10)).unwrap();
        assert_eq!(winner.code, "R2");
    }

    #[test]
    fn when_no_window_covers_the_date_the_highest_revision_still_wins() {
        let a = route("R1", Some(1), date(20), None);
        let b = route("R2", Some(2), date(25), None);
        let routes = [a, b];
        let winner = select_current(&routes, date(10)).unwrap();
        assert_eq!(winner.code, "R2");
    }

    #[test]
    fn ncsd_txc_breaks_a_tie() {
        let a = route("PLAIN", Some(3), date(1), None);
        let b = route("NCSD_TXC/PLAIN", Some(3), date(1), None);
        let routes = [a, b];
        let winner = select_current(&routes, date(10)).unwrap();
        assert_eq!(winner.code, "NCSD_TXC/PLAIN");
    }

    #[test]
    fn a_per_date_override_wins_regardless_of_revision() {
        let a = route("R1", Some(9), date(1), None);
        let override_route = route("R2", Some(0), date(5), Some(date(5)));
        let routes = [a, override_route];
        let winner = select_current(&routes, date(5)).unwrap();
        assert_eq!(winner.code, "R2");
    }

    #[test]
    fn ticketer_revision_key_includes_the_filename_segment() {
        assert_eq!(revision_key("42", Some("op1")), "42:op1");
        assert_eq!(revision_key("42", None), "42");
    }

    #[test]
    fn current_prefix_picks_the_window_covering_the_date() {
        let mut settings = HashMap::new();
        settings.insert("early".to_owned(), ("EARLY_".to_owned(), date(1), date(10)));
        settings.insert("late".to_owned(), ("LATE_".to_owned(), date(11), date(20)));
        assert_eq!(current_prefix(&settings, date(5)), Some("EARLY_"));
        assert_eq!(current_prefix(&settings, date(15)), Some("LATE_"));
        assert_eq!(current_prefix(&settings, date(25)), None);
    }

    #[test]
    fn current_prefix_breaks_overlap_ties_with_the_later_start() {
        let mut settings = HashMap::new();
        settings.insert("old".to_owned(), ("OLD_".to_owned(), date(1), date(20)));
        settings.insert("new".to_owned(), ("NEW_".to_owned(), date(10), date(20)));
        assert_eq!(current_prefix(&settings, date(15)), Some("NEW_"));
    }
}
