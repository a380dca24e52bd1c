//! `sqlx::FromRow` row shapes and their conversions to/from the domain
//! types in `model`. Kept separate from the query functions themselves so
//! the column list for a table has one home.

use chrono::{DateTime, Local, NaiveDate};
use model::{
    block::{Block, Garage, VehicleType},
    calendar::{BankHoliday, Calendar, CalendarBankHoliday, CalendarDate},
    note::Note,
    operator::{Operator, OperatorCode},
    route::Route,
    service::Service,
    source::Source,
    stop::Stop,
    trip::{StopTime, TimingStatus, Trip},
};
use sqlx::prelude::FromRow;
use utility::id::Id;

#[derive(Debug, Clone, FromRow)]
pub struct SourceRow {
    pub id: i32,
    pub name: String,
    pub url: Option<String>,
    pub datetime: DateTime<Local>,
    pub sha1: Option<String>,
    pub settings: Option<serde_json::Value>,
    pub complete: bool,
}

impl SourceRow {
    pub fn to_model(&self) -> Source {
        Source {
            name: self.name.clone(),
            url: self.url.clone(),
            datetime: self.datetime,
            sha1: self.sha1.clone(),
            settings: self
                .settings
                .clone()
                .and_then(|value| serde_json::from_value(value).ok()),
            complete: self.complete,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OperatorRow {
    pub code: String,
    pub name: Option<String>,
    pub licence_number: Option<String>,
}

impl OperatorRow {
    pub fn to_model(self) -> Operator {
        Operator {
            code: self.code,
            name: self.name,
            licence_number: self.licence_number,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OperatorCodeRow {
    pub code: String,
    pub operator_code: String,
}

impl OperatorCodeRow {
    pub fn to_model(self) -> OperatorCode {
        OperatorCode {
            code: self.code,
            operator_id: Id::new(self.operator_code),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ServiceRow {
    pub id: i32,
    pub line_name: String,
    pub description: Option<String>,
    pub operator_code: Option<String>,
    pub current: bool,
    pub unique_service_code: Option<String>,
}

impl ServiceRow {
    pub fn to_model(&self) -> Service {
        Service {
            line_name: self.line_name.clone(),
            description: self.description.clone(),
            operator_id: self.operator_code.clone().map(Id::new),
            current: self.current,
            unique_service_code: self.unique_service_code.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CalendarRow {
    pub id: i32,
    pub content_hash: i64,
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
}

impl CalendarRow {
    /// `dates`/`bank_holidays` come from their own tables, so they aren't
    /// part of the base row; call sites fill them in separately.
    pub fn to_model(&self, dates: Vec<CalendarDate>, bank_holidays: Vec<CalendarBankHoliday>) -> Calendar {
        Calendar {
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
            dates,
            bank_holidays,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CalendarDateRow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub operation: bool,
    pub special: bool,
    pub summary: Option<String>,
}

impl CalendarDateRow {
    pub fn to_model(&self) -> CalendarDate {
        CalendarDate {
            start_date: self.start_date,
            end_date: self.end_date,
            operation: self.operation,
            special: self.special,
            summary: self.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CalendarBankHolidayRow {
    pub bank_holiday: String,
    pub operation: bool,
}

impl CalendarBankHolidayRow {
    pub fn to_model(&self) -> Option<CalendarBankHoliday> {
        Some(CalendarBankHoliday {
            bank_holiday: parse_bank_holiday(&self.bank_holiday)?,
            operation: self.operation,
        })
    }
}

fn parse_bank_holiday(name: &str) -> Option<BankHoliday> {
    Some(match name {
        "all_bank_holidays" => BankHoliday::AllBankHolidays,
        "new_years_day" => BankHoliday::NewYearsDay,
        "good_friday" => BankHoliday::GoodFriday,
        "easter_monday" => BankHoliday::EasterMonday,
        "early_may_bank_holiday" => BankHoliday::EarlyMayBankHoliday,
        "spring_bank_holiday" => BankHoliday::SpringBankHoliday,
        "summer_bank_holiday" => BankHoliday::SummerBankHoliday,
        "christmas_day" => BankHoliday::ChristmasDay,
        "boxing_day" => BankHoliday::BoxingDay,
        _ => return None,
    })
}

pub fn bank_holiday_column(holiday: BankHoliday) -> &'static str {
    match holiday {
        BankHoliday::AllBankHolidays => "all_bank_holidays",
        BankHoliday::NewYearsDay => "new_years_day",
        BankHoliday::GoodFriday => "good_friday",
        BankHoliday::EasterMonday => "easter_monday",
        BankHoliday::EarlyMayBankHoliday => "early_may_bank_holiday",
        BankHoliday::SpringBankHoliday => "spring_bank_holiday",
        BankHoliday::SummerBankHoliday => "summer_bank_holiday",
        BankHoliday::ChristmasDay => "christmas_day",
        BankHoliday::BoxingDay => "boxing_day",
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RouteRow {
    pub id: i32,
    pub source_id: i32,
    pub service_id: i32,
    pub code: String,
    pub line_name: String,
    pub line_brand: Option<String>,
    pub revision_number: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub outbound_description: Option<String>,
    pub inbound_description: Option<String>,
}

impl RouteRow {
    pub fn to_model(&self) -> Route {
        Route {
            source_id: Id::new(self.source_id),
            service_id: Id::new(self.service_id),
            code: self.code.clone(),
            line_name: self.line_name.clone(),
            line_brand: self.line_brand.clone(),
            revision_number: self.revision_number,
            start_date: self.start_date,
            end_date: self.end_date,
            outbound_description: self.outbound_description.clone(),
            inbound_description: self.inbound_description.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TripRow {
    pub id: i32,
    pub route_id: i32,
    pub calendar_id: i32,
    pub inbound: bool,
    pub start_seconds: i64,
    pub end_seconds: i64,
    pub destination_stop: Option<String>,
    pub ticket_machine_code: Option<String>,
    pub vehicle_journey_code: Option<String>,
    pub block_id: Option<i32>,
    pub vehicle_type_id: Option<i32>,
    pub garage_id: Option<i32>,
    pub operator_code: Option<String>,
    pub journey_pattern: Option<String>,
}

impl TripRow {
    pub fn to_model(&self, stops: Vec<StopTime>) -> Trip {
        Trip {
            route_id: Id::new(self.route_id),
            calendar_id: Id::new(self.calendar_id),
            inbound: self.inbound,
            start: chrono::Duration::seconds(self.start_seconds),
            end: chrono::Duration::seconds(self.end_seconds),
            destination_id: self.destination_stop.clone().map(Id::new),
            ticket_machine_code: self.ticket_machine_code.clone(),
            vehicle_journey_code: self.vehicle_journey_code.clone(),
            block_id: self.block_id.map(Id::new),
            vehicle_type_id: self.vehicle_type_id.map(Id::new),
            garage_id: self.garage_id.map(Id::new),
            operator_id: self.operator_code.clone().map(Id::new),
            journey_pattern: self.journey_pattern.clone(),
            stops,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StopTimeRow {
    pub trip_id: i32,
    pub sequence: i32,
    pub stop_id: Option<String>,
    pub stop_code: Option<String>,
    pub arrival_seconds: Option<i64>,
    pub departure_seconds: Option<i64>,
    pub timing_status: i16,
    pub pick_up: bool,
    pub set_down: bool,
}

impl StopTimeRow {
    pub fn to_model(&self) -> StopTime {
        StopTime {
            sequence: self.sequence,
            stop_id: self.stop_id.clone().map(Id::new),
            stop_code: self.stop_code.clone(),
            arrival: self.arrival_seconds.map(chrono::Duration::seconds),
            departure: self.departure_seconds.map(chrono::Duration::seconds),
            timing_status: match self.timing_status {
                0 => TimingStatus::Principal,
                2 => TimingStatus::Info,
                _ => TimingStatus::Other,
            },
            pick_up: self.pick_up,
            set_down: self.set_down,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StopRow {
    pub atco_code: String,
    pub common_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub active: bool,
}

impl StopRow {
    pub fn to_model(&self) -> Stop {
        Stop {
            atco_code: self.atco_code.clone(),
            common_name: self.common_name.clone(),
            latlong: self.latitude.zip(self.longitude),
            active: self.active,
        }
    }

    pub fn from_model(stop: &Stop) -> Self {
        Self {
            atco_code: stop.atco_code.clone(),
            common_name: stop.common_name.clone(),
            latitude: stop.latitude(),
            longitude: stop.longitude(),
            active: stop.active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: i32,
    pub code: String,
    pub text: String,
}

impl NoteRow {
    pub fn to_model(&self) -> Note {
        Note {
            code: self.code.clone(),
            text: self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BlockRow {
    pub id: i32,
    pub code: String,
}

impl BlockRow {
    pub fn to_model(&self) -> Block {
        Block {
            code: self.code.clone(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GarageRow {
    pub id: i32,
    pub code: String,
}

impl GarageRow {
    pub fn to_model(&self) -> Garage {
        Garage {
            code: self.code.clone(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VehicleTypeRow {
    pub id: i32,
    pub code: String,
}

impl VehicleTypeRow {
    pub fn to_model(&self) -> VehicleType {
        VehicleType {
            code: self.code.clone(),
            description: None,
        }
    }
}
