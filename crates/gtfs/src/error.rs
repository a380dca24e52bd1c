use thiserror::Error;

#[derive(Debug, Error)]
pub enum GtfsError {
    #[error("could not open GTFS archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("missing required file {0} in GTFS archive")]
    MissingFile(&'static str),

    #[error("malformed row in {file}: {source}")]
    Row {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, GtfsError>;
