use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtcoCifError {
    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),
    #[error("I/O error reading archive entry: {0}")]
    Io(#[from] std::io::Error),
    #[error("record line {line} is too short for a {record} record")]
    Truncated { line: usize, record: &'static str },
}

pub type Result<T> = std::result::Result<T, AtcoCifError>;
