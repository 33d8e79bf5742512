use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("No readings found")]
    NoData,

    #[error("Multiple devices found, select one of: {}", .candidates.join(", "))]
    Ambiguous { candidates: Vec<String> },
}
