use thiserror::Error;

/// Input rejected on the client before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("custom repayment must be greater than zero")]
    NonPositiveCustomRepayment,
    #[error("custom repayment is missing or not a number: {0:?}")]
    MalformedCustomRepayment(String),
    #[error("submit the loan details before {action}")]
    NoPriorSubmission { action: &'static str },
}

/// Structural problems in a schedule delivered by the calculation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("schedule is empty")]
    Empty,
    #[error("payment number {found} out of sequence, expected {expected}")]
    OutOfSequence { expected: u32, found: u32 },
    #[error("payment {payment_number}: {field} is negative")]
    NegativeAmount {
        payment_number: u32,
        field: &'static str,
    },
}

/// The calculation service answered with a shape the client cannot use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("response has a custom schedule without a difference")]
    CustomWithoutDifference,
    #[error("response has a difference without a custom schedule")]
    DifferenceWithoutCustom,
}
