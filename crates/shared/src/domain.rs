use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ValidationError};

/// Largest gap tolerated between `principal + interest` and `payment`.
pub const ROUNDING_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Loan details entered by the user, everything except the custom repayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub purchase_price: Decimal,
    /// Annual rate in percent.
    pub interest_rate: Decimal,
    pub down_payment: Decimal,
    /// Term in years.
    pub loan_term: u32,
    pub start_date: NaiveDate,
}

impl LoanParameters {
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("purchase_price", self.purchase_price.to_string()),
            ("interest_rate", self.interest_rate.to_string()),
            ("down_payment", self.down_payment.to_string()),
            ("loan_term", self.loan_term.to_string()),
            ("start_date", self.start_date.format("%Y-%m-%d").to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CustomRepayment(Decimal);

impl CustomRepayment {
    pub fn new(amount: Decimal) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveCustomRepayment);
        }
        Ok(Self(amount))
    }

    pub fn amount(self) -> Decimal {
        self.0
    }
}

impl FromStr for CustomRepayment {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let amount = Decimal::from_str(trimmed)
            .map_err(|_| ValidationError::MalformedCustomRepayment(trimmed.to_string()))?;
        Self::new(amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRequest {
    pub params: LoanParameters,
    pub custom_repayment: Option<CustomRepayment>,
}

impl LoanRequest {
    pub fn original(params: LoanParameters) -> Self {
        Self {
            params,
            custom_repayment: None,
        }
    }

    pub fn with_custom(params: LoanParameters, custom_repayment: CustomRepayment) -> Self {
        Self {
            params,
            custom_repayment: Some(custom_repayment),
        }
    }

    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = self.params.form_fields();
        if let Some(custom) = self.custom_repayment {
            fields.push(("custom_repayment", custom.amount().to_string()));
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_number: u32,
    pub date: NaiveDate,
    pub payment: Decimal,
    pub principal: Decimal,
    pub interest: Decimal,
    pub balance: Decimal,
}

impl PaymentRecord {
    fn check_amounts(&self) -> Result<(), ScheduleError> {
        let fields = [
            ("payment", self.payment),
            ("principal", self.principal),
            ("interest", self.interest),
            ("balance", self.balance),
        ];
        for (field, value) in fields {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ScheduleError::NegativeAmount {
                    payment_number: self.payment_number,
                    field,
                });
            }
        }
        Ok(())
    }
}

/// Payment records numbered 1..=n without gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PaymentRecord>", into = "Vec<PaymentRecord>")]
pub struct Schedule {
    records: Vec<PaymentRecord>,
}

impl Schedule {
    pub fn records(&self) -> &[PaymentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaymentRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&PaymentRecord> {
        self.records.last()
    }

    /// Records that break `principal + interest == payment` or let the
    /// balance grow. Informational only.
    pub fn consistency_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for record in &self.records {
            let drift = (record.principal + record.interest - record.payment).abs();
            if drift > ROUNDING_TOLERANCE {
                issues.push(format!(
                    "payment {}: principal + interest differs from payment by {drift}",
                    record.payment_number
                ));
            }
        }
        for pair in self.records.windows(2) {
            if pair[1].balance > pair[0].balance {
                issues.push(format!(
                    "payment {}: balance increased from {} to {}",
                    pair[1].payment_number, pair[0].balance, pair[1].balance
                ));
            }
        }
        issues
    }
}

impl TryFrom<Vec<PaymentRecord>> for Schedule {
    type Error = ScheduleError;

    fn try_from(records: Vec<PaymentRecord>) -> Result<Self, Self::Error> {
        if records.is_empty() {
            return Err(ScheduleError::Empty);
        }
        for (index, record) in records.iter().enumerate() {
            let expected = index as u32 + 1;
            if record.payment_number != expected {
                return Err(ScheduleError::OutOfSequence {
                    expected,
                    found: record.payment_number,
                });
            }
            record.check_amounts()?;
        }
        Ok(Self { records })
    }
}

impl From<Schedule> for Vec<PaymentRecord> {
    fn from(schedule: Schedule) -> Self {
        schedule.records
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a PaymentRecord;
    type IntoIter = std::slice::Iter<'a, PaymentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub monthly_payment: Decimal,
    pub total_payments: Decimal,
    pub total_interest: Decimal,
    pub payoff_date: NaiveDate,
}

/// A schedule together with the summary the service computed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub summary: Summary,
    pub schedule: Schedule,
}

/// Scalar comparison numbers, exactly as delivered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonDiff {
    pub total_payments_diff: Decimal,
    pub months_diff: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonResult {
    OriginalOnly {
        original: ScheduleResult,
    },
    WithCustom {
        original: ScheduleResult,
        custom: ScheduleResult,
        diff: ComparisonDiff,
    },
}

impl ComparisonResult {
    pub fn original(&self) -> &ScheduleResult {
        match self {
            Self::OriginalOnly { original } | Self::WithCustom { original, .. } => original,
        }
    }

    pub fn into_original(self) -> ScheduleResult {
        match self {
            Self::OriginalOnly { original } | Self::WithCustom { original, .. } => original,
        }
    }

    pub fn has_custom(&self) -> bool {
        matches!(self, Self::WithCustom { .. })
    }
}
