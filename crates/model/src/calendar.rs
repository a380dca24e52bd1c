//! The calendar engine: weekday masks, date-range exceptions, and
//! bank-holiday bindings, with a single predicate, `Calendar::operates`,
//! that answers whether a calendar is active on a given date.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use utility::id::HasId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankHoliday {
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

impl BankHoliday {
    const ALL: [BankHoliday; 8] = [
        BankHoliday::NewYearsDay,
        BankHoliday::GoodFriday,
        BankHoliday::EasterMonday,
        BankHoliday::EarlyMayBankHoliday,
        BankHoliday::SpringBankHoliday,
        BankHoliday::SummerBankHoliday,
        BankHoliday::ChristmasDay,
        BankHoliday::BoxingDay,
    ];

    /// Whether this named holiday concept materialises to `date` in `date`'s
    /// year. England/Wales bank holidays, with the usual "if it falls on a
    /// weekend, observed the following Monday" substitution for the fixed
    /// dates. `AllBankHolidays` is the union of all the named ones.
    pub fn occurs_on(self, date: NaiveDate) -> bool {
        match self {
            BankHoliday::AllBankHolidays => Self::ALL
                .iter()
                .any(|&holiday| occurs_on_concrete(holiday, date)),
            other => occurs_on_concrete(other, date),
        }
    }
}

fn occurs_on_concrete(holiday: BankHoliday, date: NaiveDate) -> bool {
    use BankHoliday::*;
    let year = date.year();
    match holiday {
        AllBankHolidays => false,
        NewYearsDay => date == observed(NaiveDate::from_ymd_opt(year, 1, 1).unwrap()),
        ChristmasDay => date == observed(NaiveDate::from_ymd_opt(year, 12, 25).unwrap()),
        BoxingDay => {
            let christmas = NaiveDate::from_ymd_opt(year, 12, 25).unwrap();
            let boxing_day = christmas + Duration::days(1);
            date == observed_after(boxing_day, christmas)
        }
        GoodFriday => date == easter_sunday(year) - Duration::days(2),
        EasterMonday => date == easter_sunday(year) + Duration::days(1),
        EarlyMayBankHoliday => date == nth_weekday(year, 5, Weekday::Mon, 1),
        SpringBankHoliday => date == last_weekday(year, 5, Weekday::Mon),
        SummerBankHoliday => date == last_weekday(year, 8, Weekday::Mon),
    }
}

/// If `date` falls on a weekend, rolls forward to the following Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Like `observed`, but also rolls forward if `blocked_by` (another holiday
/// already observed on the same day) lands on `date`.
fn observed_after(date: NaiveDate, blocked_by: NaiveDate) -> NaiveDate {
    let mut date = observed(date);
    if date == observed(blocked_by) {
        date += Duration::days(1);
        date = observed(date);
    }
    date
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let offset = (7 + weekday.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64)
        % 7;
    first + Duration::days(offset + 7 * (n as i64 - 1))
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
    };
    let mut date = next_month_first - Duration::days(1);
    while date.weekday() != weekday {
        date -= Duration::days(1);
    }
    date
}

/// Anonymous Gregorian algorithm.
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).unwrap()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDate {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Does the service run on these dates (`true`) or is this an exclusion
    /// (`false`)?
    pub operation: bool,
    /// `true`: an additive override that beats the weekday mask and any
    /// bank-holiday exclusion outright. `false`: an ordinary filter applied
    /// on top of the weekday mask.
    pub special: bool,
    pub summary: Option<String>,
}

impl CalendarDate {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// `None` if `end_date < start_date`; the row is dropped at ingest with
    /// a warning rather than stored.
    pub fn validated(self) -> Option<Self> {
        (self.end_date >= self.start_date).then_some(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarBankHoliday {
    pub bank_holiday: BankHoliday,
    pub operation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
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
    pub dates: Vec<CalendarDate>,
    pub bank_holidays: Vec<CalendarBankHoliday>,
}

impl HasId for Calendar {
    type IdType = i32;
}

impl Calendar {
    fn weekday_bit(&self, date: NaiveDate) -> bool {
        match date.weekday() {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }

    /// Precedence, highest first: special inclusive date range; ordinary
    /// exclusion; bank-holiday exclusion; bank-holiday inclusion; weekday
    /// mask. Outside `[start_date, end_date]` nothing operates.
    pub fn operates(&self, date: NaiveDate) -> bool {
        if date < self.start_date || self.end_date.is_some_and(|end| date > end) {
            return false;
        }

        let covering = self.dates.iter().filter(|d| d.contains(date));
        let mut has_exclusion = false;
        for calendar_date in covering {
            if !calendar_date.operation {
                has_exclusion = true;
                continue;
            }
            if calendar_date.special {
                return true;
            }
        }
        if has_exclusion {
            return false;
        }

        let bh_exclusion = self
            .bank_holidays
            .iter()
            .any(|bh| !bh.operation && bh.bank_holiday.occurs_on(date));
        if bh_exclusion {
            return false;
        }

        let bh_inclusion = self
            .bank_holidays
            .iter()
            .any(|bh| bh.operation && bh.bank_holiday.occurs_on(date));
        if bh_inclusion {
            return true;
        }

        self.weekday_bit(date)
    }

    /// Every day in `[start, end]` (inclusive) on which this calendar
    /// operates.
    pub fn operating_days(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut day = start;
        let mut days = Vec::new();
        while day <= end {
            if self.operates(day) {
                days.push(day);
            }
            day += Duration::days(1);
        }
        days
    }

    /// A mechanical, human-readable summary, e.g. "Monday to Friday". Known
    /// upstream phrasing bugs (a feed that spells a generated phrase
    /// "not School vacation …") are collapsed to their canonical form.
    pub fn summary_text(&self) -> String {
        let weekdays = [
            (self.mon, "Monday"),
            (self.tue, "Tuesday"),
            (self.wed, "Wednesday"),
            (self.thu, "Thursday"),
            (self.fri, "Friday"),
            (self.sat, "Saturday"),
            (self.sun, "Sunday"),
        ];
        let mut phrase = humanise_weekday_ranges(&weekdays);
        if !self.summary.is_empty() {
            phrase = self.summary.clone();
        }
        canonicalise_summary(&phrase)
    }
}

fn humanise_weekday_ranges(weekdays: &[(bool, &'static str); 7]) -> String {
    let active: Vec<&str> = weekdays
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
    if active.is_empty() {
        return "not operating".to_owned();
    }
    // find the longest contiguous run starting at Monday; real feeds are
    // almost always one contiguous run (Mon-Fri, Mon-Sat, weekends, ...)
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, (on, _)) in weekdays.iter().enumerate() {
        match (*on, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                runs.push((start, i - 1));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        runs.push((start, weekdays.len() - 1));
    }
    runs.into_iter()
        .map(|(start, end)| {
            if start == end {
                weekdays[start].1.to_owned()
            } else {
                format!("{} to {}", weekdays[start].1, weekdays[end].1)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn canonicalise_summary(phrase: &str) -> String {
    phrase.replace("not School vacation", "not school holidays")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_calendar() -> Calendar {
        Calendar {
            mon: true,
            tue: true,
            wed: true,
            thu: true,
            fri: true,
            sat: false,
            sun: false,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()),
            summary: String::new(),
            dates: vec![],
            bank_holidays: vec![],
        }
    }

    #[test]
    fn good_friday_2024_is_march_29() {
        assert!(BankHoliday::GoodFriday.occurs_on(NaiveDate::from_ymd_opt(2024, 3, 29).unwrap()));
    }

    #[test]
    fn christmas_day_2021_observed_on_monday_27th() {
        // 2021-12-25 was a Saturday.
        assert!(BankHoliday::ChristmasDay
            .occurs_on(NaiveDate::from_ymd_opt(2021, 12, 27).unwrap()));
    }

    // a mask-only calendar with an AllBankHolidays exclusion
    #[test]
    fn bank_holiday_exclusion_beats_weekday_mask() {
        let mut calendar = base_calendar();
        calendar.bank_holidays.push(CalendarBankHoliday {
            bank_holiday: BankHoliday::AllBankHolidays,
            operation: false,
        });

        let good_friday = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        assert!(!calendar.operates(good_friday));

        let normal_tuesday = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        assert!(calendar.operates(normal_tuesday));

        let christmas = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert!(!calendar.operates(christmas));
    }

    #[test]
    fn special_inclusion_beats_bank_holiday_exclusion() {
        let mut calendar = base_calendar();
        calendar.bank_holidays.push(CalendarBankHoliday {
            bank_holiday: BankHoliday::AllBankHolidays,
            operation: false,
        });
        let good_friday = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        calendar.dates.push(CalendarDate {
            start_date: good_friday,
            end_date: good_friday,
            operation: true,
            special: true,
            summary: None,
        });
        assert!(calendar.operates(good_friday));
    }

    #[test]
    fn ordinary_exclusion_beats_weekday_mask() {
        let mut calendar = base_calendar();
        let monday = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        calendar.dates.push(CalendarDate {
            start_date: monday,
            end_date: monday,
            operation: false,
            special: false,
            summary: None,
        });
        assert!(!calendar.operates(monday));
    }

    #[test]
    fn before_start_date_never_operates() {
        let calendar = base_calendar();
        let before = calendar.start_date - Duration::days(1);
        assert!(!calendar.operates(before));
    }

    #[test]
    fn summary_text_humanises_weekday_runs() {
        assert_eq!(base_calendar().summary_text(), "Monday to Friday");
        let mut weekend = base_calendar();
        weekend.mon = false;
        weekend.tue = false;
        weekend.wed = false;
        weekend.thu = false;
        weekend.fri = false;
        weekend.sat = true;
        weekend.sun = true;
        assert_eq!(weekend.summary_text(), "Saturday to Sunday");
    }

    #[test]
    fn known_malformed_summary_phrases_are_canonicalised() {
        let mut calendar = base_calendar();
        calendar.summary = "Saturdays not School vacation".to_owned();
        assert_eq!(calendar.summary_text(), "Saturdays not school holidays");
    }

    #[test]
    fn invalid_date_range_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let date = CalendarDate {
            start_date: start,
            end_date: end,
            operation: true,
            special: false,
            summary: None,
        };
        assert!(date.validated().is_none());
    }

    #[test]
    fn brute_force_matches_over_a_year() {
        let mut calendar = base_calendar();
        calendar.dates.push(CalendarDate {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
            operation: false,
            special: false,
            summary: None,
        });
        calendar.bank_holidays.push(CalendarBankHoliday {
            bank_holiday: BankHoliday::AllBankHolidays,
            operation: false,
        });

        let mut day = calendar.start_date;
        while day <= calendar.end_date.unwrap() {
            let brute_force = brute_force_operates(&calendar, day);
            assert_eq!(calendar.operates(day), brute_force, "mismatch on {day}");
            day += Duration::days(1);
        }
    }

    /// Independent, naively-ordered re-implementation of the same rule set,
    /// used only to cross-check `Calendar::operates`.
    fn brute_force_operates(calendar: &Calendar, date: NaiveDate) -> bool {
        if date < calendar.start_date || calendar.end_date.is_some_and(|e| date > e) {
            return false;
        }
        for calendar_date in &calendar.dates {
            if calendar_date.contains(date) && calendar_date.operation && calendar_date.special {
                return true;
            }
        }
        for calendar_date in &calendar.dates {
            if calendar_date.contains(date) && !calendar_date.operation {
                return false;
            }
        }
        for bh in &calendar.bank_holidays {
            if !bh.operation && bh.bank_holiday.occurs_on(date) {
                return false;
            }
        }
        for bh in &calendar.bank_holidays {
            if bh.operation && bh.bank_holiday.occurs_on(date) {
                return true;
            }
        }
        calendar.weekday_bit(date)
    }
}
