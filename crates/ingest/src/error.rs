use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    TransXChange(#[from] transxchange::TransxchangeError),
    #[error(transparent)]
    AtcoCif(#[from] atco_cif::AtcoCifError),
    #[error(transparent)]
    Gtfs(#[from] gtfs::GtfsError),
    #[error(transparent)]
    Store(#[from] schedule_store::StoreError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
