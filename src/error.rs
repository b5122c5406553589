use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read the store: {0}")]
    StoreRead(#[from] calamine::XlsxError),

    #[error("could not write the store: {0}")]
    StoreWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("the store has no worksheet")]
    NoWorksheet,

    #[error("configuration file {0} not found")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid input '{0}'. Please enter a number for temperature.")]
    InvalidTemperature(String),

    #[error("File {0} not found. Please add at least one entry first.")]
    StoreNotFound(PathBuf),

    #[error("No data available to plot.")]
    NoData,

    #[error("Column '{0}' is missing from the store, nothing to plot.")]
    MissingColumn(String),

    #[error("could not draw the chart: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, FeverError>;
