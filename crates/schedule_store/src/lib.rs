pub mod bulk;
pub mod error;
pub mod postgres;
pub mod queries;
pub mod repo;
pub mod row;

pub use error::{StoreError, Result};
pub use postgres::{ConnectionInfo, PgAutocommit, PgScheduleStore, PgTransaction};
pub use repo::{
    CalendarRepo, OperatorRepo, ReferenceDataRepo, RouteRepo, ScheduleAutocommit,
    ScheduleOperations, ScheduleStore, ScheduleTransaction, ServiceRepo, SourceRepo, StopRepo,
    TripRepo,
};
