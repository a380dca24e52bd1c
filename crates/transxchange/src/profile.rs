//! Turns a TransXChange `OperatingProfile` (plus the `ServicedOrganisations`
//! it may reference) into a `schedule_ir::CalendarRule`.

use std::collections::HashMap;

use chrono::NaiveDate;
use schedule_ir::{CalendarDateRule, CalendarRule};

use crate::xml::{DateRange, OperatingProfile, ServicedOrganisation};

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn ranges(ranges: &[DateRange]) -> Vec<(NaiveDate, NaiveDate)> {
    ranges
        .iter()
        .filter_map(|range| {
            let start = parse_date(&range.start_date)?;
            let end = range
                .end_date
                .as_deref()
                .and_then(parse_date)
                .unwrap_or(start);
            Some((start, end))
        })
        .collect()
}

pub struct ServicedOrganisations<'a> {
    by_code: HashMap<&'a str, &'a ServicedOrganisation>,
}

impl<'a> ServicedOrganisations<'a> {
    pub fn new(organisations: &'a [ServicedOrganisation]) -> Self {
        Self {
            by_code: organisations
                .iter()
                .map(|org| (org.organisation_code.as_str(), org))
                .collect(),
        }
    }

    fn working_days(&self, code: &str) -> Vec<(NaiveDate, NaiveDate)> {
        self.by_code
            .get(code)
            .map(|org| ranges(&org.working_days))
            .unwrap_or_default()
    }

    fn holidays(&self, code: &str) -> Vec<(NaiveDate, NaiveDate)> {
        self.by_code
            .get(code)
            .map(|org| ranges(&org.holidays))
            .unwrap_or_default()
    }
}

/// Builds the weekday/exception/bank-holiday portions of a `CalendarRule`
/// from a profile. `start_date`/`end_date` come from the enclosing Service's
/// `OperatingPeriod`; `summary` is filled in by the caller afterwards.
pub fn build_calendar(
    profile: Option<&OperatingProfile>,
    serviced_organisations: &ServicedOrganisations,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> CalendarRule {
    let mut rule = CalendarRule {
        mon: false,
        tue: false,
        wed: false,
        thu: false,
        fri: false,
        sat: false,
        sun: false,
        start_date,
        end_date,
        summary: String::new(),
        dates: Vec::new(),
        bank_holidays: Vec::new(),
    };

    let Some(profile) = profile else {
        // No OperatingProfile at all: TransXChange's convention is "runs
        // Monday to Friday" in the absence of anything more specific.
        rule.mon = true;
        rule.tue = true;
        rule.wed = true;
        rule.thu = true;
        rule.fri = true;
        return rule;
    };

    if let Some(regular) = &profile.regular_day_type {
        let (mon, tue, wed, thu, fri, sat, sun) = regular.days_of_week.mask();
        rule.mon = mon;
        rule.tue = tue;
        rule.wed = wed;
        rule.thu = thu;
        rule.fri = fri;
        rule.sat = sat;
        rule.sun = sun;
    }

    if let Some(special) = &profile.special_days_operation {
        for (start, end) in ranges(&special.days_of_operation) {
            rule.dates.push(CalendarDateRule {
                start_date: start,
                end_date: end,
                operation: true,
                special: true,
                summary: None,
            });
        }
        for (start, end) in ranges(&special.days_of_non_operation) {
            rule.dates.push(CalendarDateRule {
                start_date: start,
                end_date: end,
                operation: false,
                special: false,
                summary: None,
            });
        }
    }

    if let Some(bank_holidays) = &profile.bank_holiday_operation {
        if let Some(set) = &bank_holidays.days_of_operation {
            for holiday in set.entries() {
                rule.bank_holidays.push((holiday, true));
            }
        }
        if let Some(set) = &bank_holidays.days_of_non_operation {
            for holiday in set.entries() {
                rule.bank_holidays.push((holiday, false));
            }
        }
    }

    if let Some(serviced) = &profile.serviced_organisation_day_type {
        if let Some(ops) = &serviced.days_of_operation {
            for org_ref in &ops.working_days {
                for (start, end) in
                    serviced_organisations.working_days(&org_ref.serviced_organisation_ref)
                {
                    rule.dates.push(inclusive_window(start, end));
                }
            }
            for org_ref in &ops.holidays {
                for (start, end) in
                    serviced_organisations.holidays(&org_ref.serviced_organisation_ref)
                {
                    rule.dates.push(inclusive_window(start, end));
                }
            }
        }
        if let Some(non_ops) = &serviced.days_of_non_operation {
            for org_ref in &non_ops.working_days {
                for (start, end) in
                    serviced_organisations.working_days(&org_ref.serviced_organisation_ref)
                {
                    rule.dates.push(exclusive_window(start, end));
                }
            }
            for org_ref in &non_ops.holidays {
                for (start, end) in
                    serviced_organisations.holidays(&org_ref.serviced_organisation_ref)
                {
                    rule.dates.push(exclusive_window(start, end));
                }
            }
        }
    }

    rule
}

/// A `special` inclusive window is the only kind of inclusion `Calendar::operates`
/// actually honours (an ordinary, non-special inclusion is a no-op against the
/// weekday mask), so serviced-organisation "runs on these days" references are
/// encoded as special.
fn inclusive_window(start: NaiveDate, end: NaiveDate) -> CalendarDateRule {
    CalendarDateRule {
        start_date: start,
        end_date: end,
        operation: true,
        special: true,
        summary: None,
    }
}

fn exclusive_window(start: NaiveDate, end: NaiveDate) -> CalendarDateRule {
    CalendarDateRule {
        start_date: start,
        end_date: end,
        operation: false,
        special: false,
        summary: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{DaysOfWeek, RegularDayType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_profile_defaults_to_monday_to_friday() {
        let orgs = ServicedOrganisations::new(&[]);
        let rule = build_calendar(None, &orgs, date(2024, 1, 1), None);
        assert!(rule.mon && rule.fri && !rule.sat && !rule.sun);
    }

    #[test]
    fn regular_day_type_sets_the_weekday_mask() {
        let profile = OperatingProfile {
            regular_day_type: Some(RegularDayType {
                days_of_week: DaysOfWeek {
                    saturday: Some(String::new()),
                    sunday: Some(String::new()),
                    ..Default::default()
                },
            }),
            ..Default::default()
        };
        let orgs = ServicedOrganisations::new(&[]);
        let rule = build_calendar(Some(&profile), &orgs, date(2024, 1, 1), None);
        assert!(!rule.mon && rule.sat && rule.sun);
    }
}
