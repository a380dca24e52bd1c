//! The storage contract, expressed as an async trait so the coordinator and
//! the matrix builder depend only on behaviour, not on `sqlx` directly.
//! Split into one small trait per entity family, recombined under
//! [`ScheduleOperations`], with the same transaction/autocommit split the
//! realtime store uses.

use std::future::Future;

use chrono::NaiveDate;
use model::{
    block::{Block, Garage, VehicleType},
    calendar::Calendar,
    note::Note,
    operator::{Operator, OperatorCode},
    route::Route,
    service::Service,
    source::Source,
    stop::Stop,
    trip::Trip,
};
use schedule_ir::IntermediateRoute;
use utility::id::Id;

use crate::error::Result;

pub trait SourceRepo {
    async fn get_or_create_source(&mut self, name: &str) -> Result<(Id<Source>, Source)>;
    async fn update_source(&mut self, id: Id<Source>, source: &Source) -> Result<()>;

    /// Another Source that already ingested an archive with this content
    /// hash, so a feed republished byte-identically under a new name can be
    /// deduplicated by keeping the original.
    async fn source_by_sha1(
        &mut self,
        sha1: &str,
        excluding: Id<Source>,
    ) -> Result<Option<(Id<Source>, String)>>;

    /// Whether a *complete* Source other than `excluding` currently claims
    /// a Route with this line name; an incomplete source defers to it.
    async fn complete_source_claims_line(
        &mut self,
        excluding: Id<Source>,
        line_name: &str,
    ) -> Result<bool>;
}

pub trait OperatorRepo {
    async fn operator_by_code(&mut self, code: &str) -> Result<Option<Operator>>;
    async fn operator_by_licence_number(&mut self, licence_number: &str) -> Result<Option<Operator>>;
    async fn operator_by_name(&mut self, name: &str) -> Result<Option<Operator>>;

    /// The region-local alias entry for `code`, pointing at the canonical
    /// operator it stands for.
    async fn operator_code_mapping(&mut self, code: &str) -> Result<Option<OperatorCode>>;

    async fn upsert_operator(&mut self, operator: &Operator) -> Result<()>;
}

pub trait ServiceRepo {
    async fn get_or_create_service(
        &mut self,
        line_name: &str,
        operator_id: Option<Id<Operator>>,
        unique_service_code: Option<&str>,
    ) -> Result<Id<Service>>;

    /// Marks every Service with no remaining current Route as not-current,
    /// as the last step of an archive import.
    async fn mark_services_without_current_routes_as_not_current(&mut self) -> Result<()>;
}

pub trait CalendarRepo {
    /// Content-addressed get-or-create: two calendars with a bit-identical
    /// rule set resolve to the same row.
    async fn get_or_create_calendar(
        &mut self,
        content_hash: u64,
        calendar: &Calendar,
    ) -> Result<Id<Calendar>>;

    /// The full Calendar, exception ranges and bank-holiday bindings
    /// included, ready for `Calendar::operates`.
    async fn calendar_by_id(&mut self, id: Id<Calendar>) -> Result<Option<Calendar>>;
}

pub trait ReferenceDataRepo {
    async fn get_or_create_block(&mut self, code: &str) -> Result<Id<Block>>;
    async fn get_or_create_garage(&mut self, code: &str) -> Result<Id<Garage>>;
    async fn get_or_create_vehicle_type(&mut self, code: &str) -> Result<Id<VehicleType>>;
    async fn get_or_create_note(&mut self, code: &str, text: &str) -> Result<Id<Note>>;
}

pub trait StopRepo {
    async fn stop_by_atco_code(&mut self, atco_code: &str) -> Result<Option<Id<Stop>>>;
    async fn upsert_stops(&mut self, stops: &[Stop]) -> Result<()>;
    /// Reactivates every Stop referenced by a current Route.
    async fn reactivate_referenced_stops(&mut self) -> Result<()>;
}

pub trait RouteRepo {
    async fn route_by_id(&mut self, route_id: Id<Route>) -> Result<Option<Route>>;

    async fn route_by_source_and_code(
        &mut self,
        source_id: Id<Source>,
        code: &str,
    ) -> Result<Option<Route>>;

    /// All Routes for a Source whose publication window covers `on_date`,
    /// used by the ingestion coordinator's arbitration pass.
    async fn routes_for_source_on_date(
        &mut self,
        source_id: Id<Source>,
        on_date: NaiveDate,
    ) -> Result<Vec<(Id<Route>, Route)>>;

    /// Replaces a whole `IntermediateRoute` (Route + Trips + StopTimes)
    /// under one Source, preserving trip identity where it can: if the
    /// existing Route has the same trip count and the same ordered `start`
    /// offsets, the existing Trip rows (and their ids) are reused and just
    /// updated in place; otherwise the old Trips/StopTimes are deleted and
    /// the new ones inserted fresh. Live-tracking subscribers reference
    /// trip ids, so a no-op re-import must not churn them.
    async fn replace_route(
        &mut self,
        source_id: Id<Source>,
        service_id: Id<Service>,
        route: IntermediateRoute,
    ) -> Result<Id<Route>>;

    /// Marks every Route of this Source not touched by the current
    /// ingestion run as deleted, cascading to its Trips and StopTimes.
    async fn delete_untouched_routes(
        &mut self,
        source_id: Id<Source>,
        touched_codes: &[String],
    ) -> Result<()>;
}

pub trait TripRepo {
    async fn trips_for_route(&mut self, route_id: Id<Route>) -> Result<Vec<(Id<Trip>, Trip)>>;
    async fn notes_for_trip(&mut self, trip_id: Id<Trip>) -> Result<Vec<Note>>;
}

pub trait ScheduleOperations:
    SourceRepo
    + OperatorRepo
    + ServiceRepo
    + CalendarRepo
    + ReferenceDataRepo
    + StopRepo
    + RouteRepo
    + TripRepo
{
}

pub trait ScheduleTransaction: ScheduleOperations {
    async fn commit(self) -> Result<()>;
}

pub trait ScheduleAutocommit: ScheduleOperations {}

/// The top-level storage handle. Multiple concurrent accesses are possible
/// by cloning it, same as the realtime store.
pub trait ScheduleStore: Clone + Send + Sync + Sized {
    type Transaction: ScheduleTransaction + Send;
    type Autocommit: ScheduleAutocommit + Send;

    /// Bounds the number of rows bound into one bulk INSERT statement
    /// (Postgres's bind-parameter limit).
    const BULK_INSERT_MAX: usize;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;

    async fn perform_transaction<T, F, Fut>(&self, action: F) -> Result<T>
    where
        T: Send,
        F: Send + FnOnce(&mut Self::Transaction) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send;
}
