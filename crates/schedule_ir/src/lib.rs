//! The intermediate representation produced by all three parsers
//! (`transxchange`, `atco_cif`, `gtfs`) and consumed by `ingest`. Keeping one
//! shared shape here means the coordinator, the store, and the matrix
//! builder only ever have to know about one schedule model, not three.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use chrono::{Duration, NaiveDate};
use model::trip::TimingStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopActivity {
    Normal,
    PickUp,
    SetDown,
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StopUsage {
    pub stop_ref: String,
    pub timing_status: TimingStatus,
    pub activity: StopActivity,
}

/// A single day-range exception, pre-persistence. Mirrors
/// `model::calendar::CalendarDate` but without a row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDateRule {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub operation: bool,
    pub special: bool,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BankHolidayRef {
    AllBankHolidays,
    NewYearsDay,
    GoodFriday,
    EasterMonday,
    EarlyMayBankHoliday,
    SpringBankHoliday,
    SummerBankHoliday,
    ChristmasDay,
    BoxingDay,
}

impl From<BankHolidayRef> for model::calendar::BankHoliday {
    fn from(value: BankHolidayRef) -> Self {
        use model::calendar::BankHoliday as M;
        match value {
            BankHolidayRef::AllBankHolidays => M::AllBankHolidays,
            BankHolidayRef::NewYearsDay => M::NewYearsDay,
            BankHolidayRef::GoodFriday => M::GoodFriday,
            BankHolidayRef::EasterMonday => M::EasterMonday,
            BankHolidayRef::EarlyMayBankHoliday => M::EarlyMayBankHoliday,
            BankHolidayRef::SpringBankHoliday => M::SpringBankHoliday,
            BankHolidayRef::SummerBankHoliday => M::SummerBankHoliday,
            BankHolidayRef::ChristmasDay => M::ChristmasDay,
            BankHolidayRef::BoxingDay => M::BoxingDay,
        }
    }
}

/// A day on which a `ServicedOrganisation` has pupils/staff present
/// ("working days") or not ("holidays"). Declared once per organisation and
/// referenced by `OperatingProfile`s in TransXChange; expanded to ordinary
/// `CalendarDateRule`s before a `CalendarRule` is built.
#[derive(Debug, Clone, Default)]
pub struct ServicedOrganisation {
    pub code: String,
    pub name: Option<String>,
    pub working_days: Vec<(NaiveDate, NaiveDate)>,
    pub holidays: Vec<(NaiveDate, NaiveDate)>,
}

/// Pre-persistence calendar: weekday mask plus exceptions, addressed by a
/// content hash so many trips sharing the same rule set collapse onto one
/// `Calendar` row at store time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarRule {
    pub mon: bool,
    pub tue: bool,
    pub wed: bool,
    pub thu: bool,
    pub fri: bool,
    pub sat: bool,
    pub sun: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub summary: String,
    pub dates: Vec<CalendarDateRule>,
    pub bank_holidays: Vec<(BankHolidayRef, bool)>,
}

impl CalendarRule {
    /// Deterministic key over `(weekday mask, start, end, exception set,
    /// bank-holiday set)`, used by the coordinator to dedupe Calendars
    /// within and across an ingestion run. The exception and bank-holiday
    /// sets are sorted first so declaration order never splits a rule set
    /// into two rows; `summary` is display text and takes no part.
    /// Serviced-org windows are already folded into `dates` by the time
    /// this is called, so they participate in the hash through there.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        (
            self.mon, self.tue, self.wed, self.thu, self.fri, self.sat, self.sun,
        )
            .hash(&mut hasher);
        self.start_date.hash(&mut hasher);
        self.end_date.hash(&mut hasher);

        let mut dates = self.dates.clone();
        dates.sort_by_key(|date| (date.start_date, date.end_date, date.operation, date.special));
        dates.hash(&mut hasher);

        let mut bank_holidays = self.bank_holidays.clone();
        bank_holidays.sort();
        bank_holidays.hash(&mut hasher);

        hasher.finish()
    }

    pub fn to_model(&self) -> model::calendar::Calendar {
        model::calendar::Calendar {
            mon: self.mon,
            tue: self.tue,
            wed: self.wed,
            thu: self.thu,
            fri: self.fri,
            sat: self.sat,
            sun: self.sun,
            start_date: self.start_date,
            end_date: self.end_date,
            summary: self.summary.clone(),
            dates: self
                .dates
                .iter()
                .filter_map(|d| {
                    let date = model::calendar::CalendarDate {
                        start_date: d.start_date,
                        end_date: d.end_date,
                        operation: d.operation,
                        special: d.special,
                        summary: d.summary.clone(),
                    }
                    .validated();
                    if date.is_none() {
                        log::warn!(
                            "dropping calendar exception ending {} before it starts {}",
                            d.end_date,
                            d.start_date
                        );
                    }
                    date
                })
                .collect(),
            bank_holidays: self
                .bank_holidays
                .iter()
                .map(|(holiday, operation)| model::calendar::CalendarBankHoliday {
                    bank_holiday: (*holiday).into(),
                    operation: *operation,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntermediateStopTime {
    pub sequence: i32,
    pub stop_ref: String,
    pub arrival: Option<Duration>,
    pub departure: Option<Duration>,
    pub timing_status: TimingStatus,
    pub pick_up: bool,
    pub set_down: bool,
}

#[derive(Debug, Clone)]
pub struct IntermediateTrip {
    pub inbound: bool,
    pub start: Duration,
    pub end: Duration,
    pub destination_ref: Option<String>,
    pub ticket_machine_code: Option<String>,
    pub vehicle_journey_code: Option<String>,
    pub block_code: Option<String>,
    pub vehicle_type_code: Option<String>,
    pub garage_code: Option<String>,
    pub operator_ref: Option<String>,
    pub journey_pattern: Option<String>,
    pub calendar: CalendarRule,
    pub stops: Vec<IntermediateStopTime>,
    /// `(code, text)` trip-level footnotes.
    pub notes: Vec<(String, String)>,
}

impl IntermediateTrip {
    /// `start`/`end` from the stop list, mirroring
    /// `model::trip::Trip::recompute_extent`.
    pub fn recompute_extent(&mut self) {
        if let Some(first) = self.stops.first() {
            self.start = first.departure.or(first.arrival).unwrap_or_default();
        }
        if let Some(last) = self.stops.last() {
            self.end = last.arrival.or(last.departure).unwrap_or_default();
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntermediateRoute {
    pub code: String,
    pub service_code: Option<String>,
    pub line_name: String,
    pub line_brand: Option<String>,
    pub revision_number: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub outbound_description: Option<String>,
    pub inbound_description: Option<String>,
    pub unique_service_code: Option<String>,
    pub trips: Vec<IntermediateTrip>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> CalendarRule {
        CalendarRule {
            mon: true,
            tue: true,
            wed: true,
            thu: true,
            fri: true,
            sat: false,
            sun: false,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            summary: String::new(),
            dates: vec![],
            bank_holidays: vec![],
        }
    }

    #[test]
    fn identical_rule_sets_hash_equal() {
        assert_eq!(rule().content_hash(), rule().content_hash());
    }

    #[test]
    fn differing_rule_sets_hash_differently() {
        let mut other = rule();
        other.sat = true;
        assert_ne!(rule().content_hash(), other.content_hash());
    }

    #[test]
    fn backwards_exception_ranges_are_dropped_at_conversion() {
        let mut backwards = rule();
        backwards.dates.push(CalendarDateRule {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            operation: true,
            special: false,
            summary: None,
        });
        assert!(backwards.to_model().dates.is_empty());
    }

    #[test]
    fn summary_text_takes_no_part_in_the_hash() {
        let mut other = rule();
        other.summary = "Monday to Friday".to_owned();
        assert_eq!(rule().content_hash(), other.content_hash());
    }

    #[test]
    fn exception_declaration_order_takes_no_part_in_the_hash() {
        let exception = |day: u32, operation: bool| CalendarDateRule {
            start_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            operation,
            special: false,
            summary: None,
        };
        let mut forward = rule();
        forward.dates = vec![exception(1, false), exception(2, true)];
        let mut reversed = rule();
        reversed.dates = vec![exception(2, true), exception(1, false)];
        assert_eq!(forward.content_hash(), reversed.content_hash());
    }
}
