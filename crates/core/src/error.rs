use thiserror::Error;

/// Failures computing the next block for a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("period is not configured")]
    MissingPeriod,

    #[error("period type is not configured")]
    MissingPeriodType,

    #[error("period must be greater than zero")]
    ZeroPeriod,

    #[error("unrecognized period type")]
    UnknownDiscipline,

    #[error("block time overflow")]
    Overflow,
}

/// Failures applying a configuration change to a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigureError {
    #[error("period is required for new events")]
    PeriodRequired,

    #[error("period type is required for new events")]
    PeriodTypeRequired,

    #[error("period must be greater than zero")]
    ZeroPeriod,

    #[error("an initial due date/time needs a period")]
    AnchorWithoutPeriod,

    #[error("initial due date/time is out of range")]
    InvalidAnchor,
}
