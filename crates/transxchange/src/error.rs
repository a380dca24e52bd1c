use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransxchangeError {
    #[error("malformed TransXChange document: {0}")]
    Xml(#[from] serde_xml_rs::Error),
}

pub type Result<T> = std::result::Result<T, TransxchangeError>;
