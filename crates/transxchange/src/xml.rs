//! Wire shapes for the TransXChange elements this importer reads, deserialized
//! directly with `serde-xml-rs`. Field and element names follow the
//! TransXChange 2.1/2.4 schema; anything not listed here is ignored by
//! `serde-xml-rs`'s default "unknown fields are skipped" behaviour.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(rename = "StopPoints", default)]
    pub stop_points: StopPoints,
    #[serde(rename = "JourneyPatternSections", default)]
    pub journey_pattern_sections: JourneyPatternSections,
    #[serde(rename = "Operators", default)]
    pub operators: Operators,
    #[serde(rename = "Services", default)]
    pub services: Services,
    #[serde(rename = "VehicleJourneys", default)]
    pub vehicle_journeys: VehicleJourneys,
    #[serde(rename = "ServicedOrganisations", default)]
    pub serviced_organisations: ServicedOrganisations,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopPoints {
    #[serde(rename = "AnnotatedStopPointRef", default)]
    pub stops: Vec<AnnotatedStopPointRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotatedStopPointRef {
    #[serde(rename = "StopPointRef")]
    pub stop_point_ref: String,
    #[serde(rename = "CommonName", default)]
    pub common_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JourneyPatternSections {
    #[serde(rename = "JourneyPatternSection", default)]
    pub sections: Vec<JourneyPatternSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JourneyPatternSection {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "JourneyPatternTimingLink", default)]
    pub timing_links: Vec<JourneyPatternTimingLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JourneyPatternTimingLink {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "From")]
    pub from: StopUsageXml,
    #[serde(rename = "To")]
    pub to: StopUsageXml,
    #[serde(rename = "RunTime")]
    pub run_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopUsageXml {
    #[serde(rename = "StopPointRef")]
    pub stop_point_ref: String,
    #[serde(rename = "TimingStatus", default)]
    pub timing_status: Option<String>,
    #[serde(rename = "Activity", default)]
    pub activity: Option<String>,
    #[serde(rename = "WaitTime", default)]
    pub wait_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operators {
    #[serde(rename = "Operator", default)]
    pub operators: Vec<Operator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Operator {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "NationalOperatorCode", default)]
    pub national_operator_code: Option<String>,
    #[serde(rename = "OperatorCode", default)]
    pub operator_code: Option<String>,
    #[serde(rename = "OperatorShortName", default)]
    pub operator_short_name: Option<String>,
    #[serde(rename = "TradingName", default)]
    pub trading_name: Option<String>,
    #[serde(rename = "LicenceNumber", default)]
    pub licence_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Services {
    #[serde(rename = "Service", default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    #[serde(rename = "ServiceCode")]
    pub service_code: String,
    #[serde(rename = "Lines", default)]
    pub lines: Lines,
    #[serde(rename = "OperatingPeriod", default)]
    pub operating_period: Option<DateRange>,
    #[serde(rename = "RegisteredOperatorRef", default)]
    pub registered_operator_ref: Option<String>,
    #[serde(rename = "StandardService", default)]
    pub standard_service: Option<StandardService>,
    #[serde(rename = "OperatingProfile", default)]
    pub operating_profile: Option<OperatingProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lines {
    #[serde(rename = "Line", default)]
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Line {
    #[serde(rename = "LineName")]
    pub line_name: String,
    #[serde(rename = "OutboundDescription", default)]
    pub outbound_description: Option<LineDescription>,
    #[serde(rename = "InboundDescription", default)]
    pub inbound_description: Option<LineDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineDescription {
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandardService {
    #[serde(rename = "JourneyPattern", default)]
    pub journey_patterns: Vec<JourneyPattern>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JourneyPattern {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "DirectionCode", default)]
    pub direction_code: Option<String>,
    #[serde(rename = "RouteRef", default)]
    pub route_ref: Option<String>,
    #[serde(rename = "JourneyPatternSectionRefs", default)]
    pub section_refs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRange {
    #[serde(rename = "StartDate")]
    pub start_date: String,
    #[serde(rename = "EndDate", default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperatingProfile {
    #[serde(rename = "RegularDayType", default)]
    pub regular_day_type: Option<RegularDayType>,
    #[serde(rename = "SpecialDaysOperation", default)]
    pub special_days_operation: Option<SpecialDaysOperation>,
    #[serde(rename = "BankHolidayOperation", default)]
    pub bank_holiday_operation: Option<BankHolidayOperation>,
    #[serde(rename = "ServicedOrganisationDayType", default)]
    pub serviced_organisation_day_type: Option<ServicedOrganisationDayType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegularDayType {
    #[serde(rename = "DaysOfWeek", default)]
    pub days_of_week: DaysOfWeek,
}

/// TransXChange marks each active weekday by the mere *presence* of an empty
/// element (`<Monday/>`), so every field here is `Option<String>` rather than
/// `bool`; `serde-xml-rs` deserializes an empty element as an empty string,
/// and absence as `None`. `DaysOfWeek::mask` turns that into the seven-bool
/// mask the rest of the pipeline uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaysOfWeek {
    #[serde(rename = "Monday", default)]
    pub monday: Option<String>,
    #[serde(rename = "Tuesday", default)]
    pub tuesday: Option<String>,
    #[serde(rename = "Wednesday", default)]
    pub wednesday: Option<String>,
    #[serde(rename = "Thursday", default)]
    pub thursday: Option<String>,
    #[serde(rename = "Friday", default)]
    pub friday: Option<String>,
    #[serde(rename = "Saturday", default)]
    pub saturday: Option<String>,
    #[serde(rename = "Sunday", default)]
    pub sunday: Option<String>,
    #[serde(rename = "MondayToFriday", default)]
    pub monday_to_friday: Option<String>,
    #[serde(rename = "MondayToSaturday", default)]
    pub monday_to_saturday: Option<String>,
    #[serde(rename = "MondayToSunday", default)]
    pub monday_to_sunday: Option<String>,
    #[serde(rename = "Weekend", default)]
    pub weekend: Option<String>,
}

impl DaysOfWeek {
    /// `(mon, tue, wed, thu, fri, sat, sun)`.
    pub fn mask(&self) -> (bool, bool, bool, bool, bool, bool, bool) {
        let weekday_range = self.monday_to_friday.is_some()
            || self.monday_to_saturday.is_some()
            || self.monday_to_sunday.is_some();
        let mon = self.monday.is_some() || weekday_range;
        let tue = self.tuesday.is_some() || weekday_range;
        let wed = self.wednesday.is_some() || weekday_range;
        let thu = self.thursday.is_some() || weekday_range;
        let fri = self.friday.is_some() || weekday_range;
        let sat = self.saturday.is_some()
            || self.weekend.is_some()
            || self.monday_to_saturday.is_some()
            || self.monday_to_sunday.is_some();
        let sun = self.sunday.is_some() || self.weekend.is_some() || self.monday_to_sunday.is_some();
        (mon, tue, wed, thu, fri, sat, sun)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialDaysOperation {
    #[serde(rename = "DaysOfOperation", default)]
    pub days_of_operation: Vec<DateRange>,
    #[serde(rename = "DaysOfNonOperation", default)]
    pub days_of_non_operation: Vec<DateRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankHolidayOperation {
    #[serde(rename = "DaysOfOperation", default)]
    pub days_of_operation: Option<BankHolidaySet>,
    #[serde(rename = "DaysOfNonOperation", default)]
    pub days_of_non_operation: Option<BankHolidaySet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankHolidaySet {
    #[serde(rename = "AllBankHolidays", default)]
    pub all_bank_holidays: Option<String>,
    #[serde(rename = "NewYearsDay", default)]
    pub new_years_day: Option<String>,
    #[serde(rename = "GoodFriday", default)]
    pub good_friday: Option<String>,
    #[serde(rename = "EasterMonday", default)]
    pub easter_monday: Option<String>,
    #[serde(rename = "EarlyMayBankHoliday", default)]
    pub early_may_bank_holiday: Option<String>,
    #[serde(rename = "SpringBank", default)]
    pub spring_bank: Option<String>,
    #[serde(rename = "LateSummerBankHolidayNotScotland", default)]
    pub summer_bank_holiday: Option<String>,
    #[serde(rename = "ChristmasDay", default)]
    pub christmas_day: Option<String>,
    #[serde(rename = "BoxingDay", default)]
    pub boxing_day: Option<String>,
}

impl BankHolidaySet {
    pub fn entries(&self) -> Vec<schedule_ir::BankHolidayRef> {
        use schedule_ir::BankHolidayRef as B;
        let mut out = Vec::new();
        let mut push = |present: &Option<String>, holiday: B| {
            if present.is_some() {
                out.push(holiday);
            }
        };
        push(&self.all_bank_holidays, B::AllBankHolidays);
        push(&self.new_years_day, B::NewYearsDay);
        push(&self.good_friday, B::GoodFriday);
        push(&self.easter_monday, B::EasterMonday);
        push(&self.early_may_bank_holiday, B::EarlyMayBankHoliday);
        push(&self.spring_bank, B::SpringBankHoliday);
        push(&self.summer_bank_holiday, B::SummerBankHoliday);
        push(&self.christmas_day, B::ChristmasDay);
        push(&self.boxing_day, B::BoxingDay);
        out
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicedOrganisationDayType {
    #[serde(rename = "DaysOfOperation", default)]
    pub days_of_operation: Option<ServicedOrganisationRefs>,
    #[serde(rename = "DaysOfNonOperation", default)]
    pub days_of_non_operation: Option<ServicedOrganisationRefs>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicedOrganisationRefs {
    #[serde(rename = "WorkingDays", default)]
    pub working_days: Vec<ServicedOrganisationRef>,
    #[serde(rename = "Holidays", default)]
    pub holidays: Vec<ServicedOrganisationRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicedOrganisationRef {
    #[serde(rename = "ServicedOrganisationRef")]
    pub serviced_organisation_ref: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleJourneys {
    #[serde(rename = "VehicleJourney", default)]
    pub vehicle_journeys: Vec<VehicleJourney>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleJourney {
    #[serde(rename = "VehicleJourneyCode")]
    pub vehicle_journey_code: String,
    #[serde(rename = "ServiceRef", default)]
    pub service_ref: Option<String>,
    #[serde(rename = "LineRef", default)]
    pub line_ref: Option<String>,
    #[serde(rename = "JourneyPatternRef", default)]
    pub journey_pattern_ref: Option<String>,
    #[serde(rename = "VehicleJourneyRef", default)]
    pub vehicle_journey_ref: Option<String>,
    #[serde(rename = "DepartureTime")]
    pub departure_time: String,
    #[serde(rename = "OperatingProfile", default)]
    pub operating_profile: Option<OperatingProfile>,
    #[serde(rename = "OperatorRef", default)]
    pub operator_ref: Option<String>,
    #[serde(rename = "BlockNumber", default)]
    pub block_number: Option<String>,
    #[serde(rename = "Operational", default)]
    pub operational: Option<Operational>,
    #[serde(rename = "Garage", default)]
    pub garage: Option<Garage>,
    #[serde(rename = "StartDeadRun", default)]
    pub start_dead_run: Option<DeadRun>,
    #[serde(rename = "EndDeadRun", default)]
    pub end_dead_run: Option<DeadRun>,
    #[serde(rename = "VehicleJourneyTimingLink", default)]
    pub timing_links: Vec<VehicleJourneyTimingLink>,
    #[serde(rename = "Note", default)]
    pub notes: Vec<Note>,
}

/// A per-journey override of one journey-pattern timing link's run time.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleJourneyTimingLink {
    #[serde(rename = "JourneyPatternTimingLinkRef")]
    pub journey_pattern_timing_link_ref: String,
    #[serde(rename = "RunTime", default)]
    pub run_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Operational {
    #[serde(rename = "TicketMachine", default)]
    pub ticket_machine: Option<TicketMachine>,
    #[serde(rename = "VehicleType", default)]
    pub vehicle_type: Option<VehicleTypeXml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketMachine {
    #[serde(rename = "JourneyCode", default)]
    pub journey_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleTypeXml {
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Garage {
    #[serde(rename = "GarageCode", default)]
    pub garage_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeadRun {
    #[serde(rename = "ShortWorking", default)]
    pub short_working: Option<ShortWorking>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShortWorking {
    #[serde(rename = "JourneyPatternTimingLinkRef")]
    pub journey_pattern_timing_link_ref: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Note {
    #[serde(rename = "NoteCode", default)]
    pub note_code: Option<String>,
    #[serde(rename = "NoteText", default)]
    pub note_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicedOrganisations {
    #[serde(rename = "ServicedOrganisation", default)]
    pub organisations: Vec<ServicedOrganisation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicedOrganisation {
    #[serde(rename = "OrganisationCode")]
    pub organisation_code: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "WorkingDays", default)]
    pub working_days: Vec<DateRange>,
    #[serde(rename = "Holidays", default)]
    pub holidays: Vec<DateRange>,
}
