use std::{env, error::Error, future::Future};

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
use sqlx::Transaction;
use utility::id::Id;

use crate::{
    bulk::BULK_INSERT_MAX,
    error::Result,
    queries,
    repo::{
        CalendarRepo, OperatorRepo, ReferenceDataRepo, RouteRepo, ScheduleAutocommit,
        ScheduleOperations, ScheduleStore, ScheduleTransaction, ServiceRepo, SourceRepo, StopRepo,
        TripRepo,
    },
};

pub struct ConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl ConnectionInfo {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            username: env::var("DATABASE_USER").ok()?,
            password: env::var("DATABASE_PASSWORD").ok()?,
            hostname: env::var("DATABASE_HOST").ok()?,
            port: env::var("DATABASE_PORT").ok()?.parse().ok()?,
            database: env::var("DATABASE_NAME").ok()?,
        })
    }

    fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

#[derive(Clone)]
pub struct PgScheduleStore {
    pool: sqlx::PgPool,
}

impl PgScheduleStore {
    pub async fn connect(info: ConnectionInfo) -> std::result::Result<Self, Box<dyn Error>> {
        let pool = sqlx::postgres::PgPool::connect(&info.url()).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Convenience for `DATABASE_URL`-based configuration.
    pub async fn connect_url(url: &str) -> std::result::Result<Self, Box<dyn Error>> {
        let pool = sqlx::postgres::PgPool::connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

pub struct PgTransaction<'a> {
    tx: Transaction<'a, sqlx::Postgres>,
}

pub struct PgAutocommit {
    pool: sqlx::PgPool,
}

impl ScheduleAutocommit for PgAutocommit {}

impl ScheduleStore for PgScheduleStore {
    type Transaction = PgTransaction<'static>;
    type Autocommit = PgAutocommit;

    const BULK_INSERT_MAX: usize = BULK_INSERT_MAX;

    async fn transaction(&self) -> Result<Self::Transaction> {
        let tx = self.pool.begin().await.map_err(crate::error::convert_error)?;
        Ok(PgTransaction { tx })
    }

    fn auto(&self) -> Self::Autocommit {
        PgAutocommit {
            pool: self.pool.clone(),
        }
    }

    async fn perform_transaction<T, F, Fut>(&self, action: F) -> Result<T>
    where
        T: Send,
        F: Send + FnOnce(&mut Self::Transaction) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let tx = self.pool.begin().await.map_err(crate::error::convert_error)?;
        let mut tx = PgTransaction { tx };
        let result = action(&mut tx).await;
        tx.commit().await?;
        result
    }
}

impl ScheduleTransaction for PgTransaction<'_> {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(crate::error::convert_error)
    }
}

impl ScheduleOperations for PgAutocommit {}
impl ScheduleOperations for PgTransaction<'_> {}

impl SourceRepo for PgAutocommit {
    async fn get_or_create_source(&mut self, name: &str) -> Result<(Id<Source>, Source)> {
        queries::source::get_or_create(&self.pool, name).await
    }

    async fn update_source(&mut self, id: Id<Source>, source: &Source) -> Result<()> {
        queries::source::update(&self.pool, id, source).await
    }

    async fn source_by_sha1(
        &mut self,
        sha1: &str,
        excluding: Id<Source>,
    ) -> Result<Option<(Id<Source>, String)>> {
        queries::source::by_sha1(&self.pool, sha1, excluding).await
    }

    async fn complete_source_claims_line(
        &mut self,
        excluding: Id<Source>,
        line_name: &str,
    ) -> Result<bool> {
        queries::source::complete_claims_line(&self.pool, excluding, line_name).await
    }
}

impl SourceRepo for PgTransaction<'_> {
    async fn get_or_create_source(&mut self, name: &str) -> Result<(Id<Source>, Source)> {
        queries::source::get_or_create(&mut *self.tx, name).await
    }

    async fn update_source(&mut self, id: Id<Source>, source: &Source) -> Result<()> {
        queries::source::update(&mut *self.tx, id, source).await
    }

    async fn source_by_sha1(
        &mut self,
        sha1: &str,
        excluding: Id<Source>,
    ) -> Result<Option<(Id<Source>, String)>> {
        queries::source::by_sha1(&mut *self.tx, sha1, excluding).await
    }

    async fn complete_source_claims_line(
        &mut self,
        excluding: Id<Source>,
        line_name: &str,
    ) -> Result<bool> {
        queries::source::complete_claims_line(&mut *self.tx, excluding, line_name).await
    }
}

impl OperatorRepo for PgAutocommit {
    async fn operator_by_code(&mut self, code: &str) -> Result<Option<Operator>> {
        queries::operator::by_code(&self.pool, code).await
    }

    async fn operator_by_licence_number(&mut self, licence_number: &str) -> Result<Option<Operator>> {
        queries::operator::by_licence_number(&self.pool, licence_number).await
    }

    async fn operator_by_name(&mut self, name: &str) -> Result<Option<Operator>> {
        queries::operator::by_name(&self.pool, name).await
    }

    async fn operator_code_mapping(&mut self, code: &str) -> Result<Option<OperatorCode>> {
        queries::operator::code_mapping(&self.pool, code).await
    }

    async fn upsert_operator(&mut self, operator: &Operator) -> Result<()> {
        queries::operator::upsert(&self.pool, operator).await
    }
}

impl OperatorRepo for PgTransaction<'_> {
    async fn operator_by_code(&mut self, code: &str) -> Result<Option<Operator>> {
        queries::operator::by_code(&mut *self.tx, code).await
    }

    async fn operator_by_licence_number(&mut self, licence_number: &str) -> Result<Option<Operator>> {
        queries::operator::by_licence_number(&mut *self.tx, licence_number).await
    }

    async fn operator_by_name(&mut self, name: &str) -> Result<Option<Operator>> {
        queries::operator::by_name(&mut *self.tx, name).await
    }

    async fn operator_code_mapping(&mut self, code: &str) -> Result<Option<OperatorCode>> {
        queries::operator::code_mapping(&mut *self.tx, code).await
    }

    async fn upsert_operator(&mut self, operator: &Operator) -> Result<()> {
        queries::operator::upsert(&mut *self.tx, operator).await
    }
}

impl ServiceRepo for PgAutocommit {
    async fn get_or_create_service(
        &mut self,
        line_name: &str,
        operator_id: Option<Id<Operator>>,
        unique_service_code: Option<&str>,
    ) -> Result<Id<Service>> {
        queries::service::get_or_create(&self.pool, line_name, operator_id, unique_service_code).await
    }

    async fn mark_services_without_current_routes_as_not_current(&mut self) -> Result<()> {
        queries::service::mark_without_current_routes_as_not_current(&self.pool).await
    }
}

impl ServiceRepo for PgTransaction<'_> {
    async fn get_or_create_service(
        &mut self,
        line_name: &str,
        operator_id: Option<Id<Operator>>,
        unique_service_code: Option<&str>,
    ) -> Result<Id<Service>> {
        queries::service::get_or_create(&mut *self.tx, line_name, operator_id, unique_service_code).await
    }

    async fn mark_services_without_current_routes_as_not_current(&mut self) -> Result<()> {
        queries::service::mark_without_current_routes_as_not_current(&mut *self.tx).await
    }
}

impl CalendarRepo for PgAutocommit {
    async fn get_or_create_calendar(&mut self, content_hash: u64, calendar: &Calendar) -> Result<Id<Calendar>> {
        queries::calendar::get_or_create(&self.pool, content_hash, calendar).await
    }

    async fn calendar_by_id(&mut self, id: Id<Calendar>) -> Result<Option<Calendar>> {
        queries::calendar::by_id(&self.pool, id).await
    }
}

impl CalendarRepo for PgTransaction<'_> {
    async fn get_or_create_calendar(&mut self, content_hash: u64, calendar: &Calendar) -> Result<Id<Calendar>> {
        queries::calendar::get_or_create(&mut *self.tx, content_hash, calendar).await
    }

    async fn calendar_by_id(&mut self, id: Id<Calendar>) -> Result<Option<Calendar>> {
        queries::calendar::by_id(&mut *self.tx, id).await
    }
}

impl ReferenceDataRepo for PgAutocommit {
    async fn get_or_create_block(&mut self, code: &str) -> Result<Id<Block>> {
        queries::reference::get_or_create_block(&self.pool, code).await
    }

    async fn get_or_create_garage(&mut self, code: &str) -> Result<Id<Garage>> {
        queries::reference::get_or_create_garage(&self.pool, code).await
    }

    async fn get_or_create_vehicle_type(&mut self, code: &str) -> Result<Id<VehicleType>> {
        queries::reference::get_or_create_vehicle_type(&self.pool, code).await
    }

    async fn get_or_create_note(&mut self, code: &str, text: &str) -> Result<Id<Note>> {
        queries::reference::get_or_create_note(&self.pool, code, text).await
    }
}

impl ReferenceDataRepo for PgTransaction<'_> {
    async fn get_or_create_block(&mut self, code: &str) -> Result<Id<Block>> {
        queries::reference::get_or_create_block(&mut *self.tx, code).await
    }

    async fn get_or_create_garage(&mut self, code: &str) -> Result<Id<Garage>> {
        queries::reference::get_or_create_garage(&mut *self.tx, code).await
    }

    async fn get_or_create_vehicle_type(&mut self, code: &str) -> Result<Id<VehicleType>> {
        queries::reference::get_or_create_vehicle_type(&mut *self.tx, code).await
    }

    async fn get_or_create_note(&mut self, code: &str, text: &str) -> Result<Id<Note>> {
        queries::reference::get_or_create_note(&mut *self.tx, code, text).await
    }
}

impl StopRepo for PgAutocommit {
    async fn stop_by_atco_code(&mut self, atco_code: &str) -> Result<Option<Id<Stop>>> {
        queries::stop::by_atco_code(&self.pool, atco_code).await
    }

    async fn upsert_stops(&mut self, stops: &[Stop]) -> Result<()> {
        queries::stop::upsert_many(&self.pool, stops).await
    }

    async fn reactivate_referenced_stops(&mut self) -> Result<()> {
        queries::stop::reactivate_referenced(&self.pool).await
    }
}

impl StopRepo for PgTransaction<'_> {
    async fn stop_by_atco_code(&mut self, atco_code: &str) -> Result<Option<Id<Stop>>> {
        queries::stop::by_atco_code(&mut *self.tx, atco_code).await
    }

    async fn upsert_stops(&mut self, stops: &[Stop]) -> Result<()> {
        queries::stop::upsert_many(&mut *self.tx, stops).await
    }

    async fn reactivate_referenced_stops(&mut self) -> Result<()> {
        queries::stop::reactivate_referenced(&mut *self.tx).await
    }
}

impl RouteRepo for PgAutocommit {
    async fn route_by_id(&mut self, route_id: Id<Route>) -> Result<Option<Route>> {
        queries::route::by_id(&self.pool, route_id).await
    }

    async fn route_by_source_and_code(&mut self, source_id: Id<Source>, code: &str) -> Result<Option<Route>> {
        queries::route::by_source_and_code(&self.pool, source_id, code).await
    }

    async fn routes_for_source_on_date(
        &mut self,
        source_id: Id<Source>,
        on_date: NaiveDate,
    ) -> Result<Vec<(Id<Route>, Route)>> {
        queries::route::for_source_on_date(&self.pool, source_id, on_date).await
    }

    async fn replace_route(
        &mut self,
        source_id: Id<Source>,
        service_id: Id<Service>,
        route: IntermediateRoute,
    ) -> Result<Id<Route>> {
        queries::route::replace(&self.pool, source_id, service_id, route).await
    }

    async fn delete_untouched_routes(&mut self, source_id: Id<Source>, touched_codes: &[String]) -> Result<()> {
        queries::route::delete_untouched(&self.pool, source_id, touched_codes).await
    }
}

impl RouteRepo for PgTransaction<'_> {
    async fn route_by_id(&mut self, route_id: Id<Route>) -> Result<Option<Route>> {
        queries::route::by_id(&mut *self.tx, route_id).await
    }

    async fn route_by_source_and_code(&mut self, source_id: Id<Source>, code: &str) -> Result<Option<Route>> {
        queries::route::by_source_and_code(&mut *self.tx, source_id, code).await
    }

    async fn routes_for_source_on_date(
        &mut self,
        source_id: Id<Source>,
        on_date: NaiveDate,
    ) -> Result<Vec<(Id<Route>, Route)>> {
        queries::route::for_source_on_date(&mut *self.tx, source_id, on_date).await
    }

    async fn replace_route(
        &mut self,
        source_id: Id<Source>,
        service_id: Id<Service>,
        route: IntermediateRoute,
    ) -> Result<Id<Route>> {
        queries::route::replace(&mut *self.tx, source_id, service_id, route).await
    }

    async fn delete_untouched_routes(&mut self, source_id: Id<Source>, touched_codes: &[String]) -> Result<()> {
        queries::route::delete_untouched(&mut *self.tx, source_id, touched_codes).await
    }
}

impl TripRepo for PgAutocommit {
    async fn trips_for_route(&mut self, route_id: Id<Route>) -> Result<Vec<(Id<Trip>, Trip)>> {
        queries::trip::for_route(&self.pool, route_id).await
    }

    async fn notes_for_trip(&mut self, trip_id: Id<Trip>) -> Result<Vec<Note>> {
        queries::trip::notes_for_trip(&self.pool, trip_id).await
    }
}

impl TripRepo for PgTransaction<'_> {
    async fn trips_for_route(&mut self, route_id: Id<Route>) -> Result<Vec<(Id<Trip>, Trip)>> {
        queries::trip::for_route(&mut *self.tx, route_id).await
    }

    async fn notes_for_trip(&mut self, trip_id: Id<Trip>) -> Result<Vec<Note>> {
        queries::trip::notes_for_trip(&mut *self.tx, trip_id).await
    }
}
