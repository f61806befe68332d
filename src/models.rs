//! Data models for policy and claim records.
//!
//! This module contains the raw input records handed to the analytics
//! pipeline, the enums they carry, and the lenient decoders that turn
//! loosely-typed ledger exports into well-typed values.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Insurance plan tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlanType {
    Basic,
    Premium,
    Platinum,
    /// Any code or name outside the known tiers.
    #[default]
    Unknown,
}

impl PlanType {
    /// Map a ledger code to a plan.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => PlanType::Basic,
            1 => PlanType::Premium,
            2 => PlanType::Platinum,
            _ => PlanType::Unknown,
        }
    }

    fn from_name(name: &str) -> Self {
        match normalize(name).as_str() {
            "basic" => PlanType::Basic,
            "premium" => PlanType::Premium,
            "platinum" => PlanType::Platinum,
            _ => PlanType::Unknown,
        }
    }

    /// Display label used as the distribution key.
    pub fn label(&self) -> &'static str {
        match self {
            PlanType::Basic => "Basic",
            PlanType::Premium => "Premium",
            PlanType::Platinum => "Platinum",
            PlanType::Unknown => "Unknown",
        }
    }
}

/// How the premium is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PaymentType {
    OneTime,
    Monthly,
    #[default]
    Unknown,
}

impl PaymentType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => PaymentType::OneTime,
            1 => PaymentType::Monthly,
            _ => PaymentType::Unknown,
        }
    }

    fn from_name(name: &str) -> Self {
        match normalize(name).as_str() {
            "onetime" => PaymentType::OneTime,
            "monthly" => PaymentType::Monthly,
            _ => PaymentType::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentType::OneTime => "One-time",
            PaymentType::Monthly => "Monthly",
            PaymentType::Unknown => "Unknown",
        }
    }
}

/// Lifecycle state of a policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
    #[default]
    Unknown,
}

impl PolicyStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => PolicyStatus::Active,
            1 => PolicyStatus::Expired,
            2 => PolicyStatus::Cancelled,
            _ => PolicyStatus::Unknown,
        }
    }

    fn from_name(name: &str) -> Self {
        match normalize(name).as_str() {
            "active" => PolicyStatus::Active,
            "expired" => PolicyStatus::Expired,
            "cancelled" | "canceled" => PolicyStatus::Cancelled,
            _ => PolicyStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PolicyStatus::Active => "Active",
            PolicyStatus::Expired => "Expired",
            PolicyStatus::Cancelled => "Cancelled",
            PolicyStatus::Unknown => "Unknown",
        }
    }
}

/// Processing state of a claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
    #[default]
    Unknown,
}

impl ClaimStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ClaimStatus::Pending,
            1 => ClaimStatus::Approved,
            2 => ClaimStatus::Rejected,
            3 => ClaimStatus::Paid,
            _ => ClaimStatus::Unknown,
        }
    }

    fn from_name(name: &str) -> Self {
        match normalize(name).as_str() {
            "pending" => ClaimStatus::Pending,
            "approved" => ClaimStatus::Approved,
            "rejected" => ClaimStatus::Rejected,
            "paid" => ClaimStatus::Paid,
            _ => ClaimStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Paid => "Paid",
            ClaimStatus::Unknown => "Unknown",
        }
    }

    /// Approved and paid claims both count as approved.
    pub fn is_approved(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Paid)
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .collect::<String>()
        .to_lowercase()
}

macro_rules! labelled_enum_serde {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.label())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = Option::<lenient::RawValue>::deserialize(deserializer)?;
                Ok(match raw.as_ref().and_then(lenient::RawValue::as_code) {
                    Some(code) => <$ty>::from_code(code),
                    None => raw
                        .as_ref()
                        .and_then(lenient::RawValue::as_str)
                        .map(<$ty>::from_name)
                        .unwrap_or_default(),
                })
            }
        }
    )*};
}

labelled_enum_serde!(PlanType, PaymentType, PolicyStatus, ClaimStatus);

/// Which date field a filter or bucket reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    StartDate,
    SubmissionDate,
    ProcessedDate,
}

/// Records that carry one or more epoch-second dates.
pub trait Dated {
    /// Returns the requested date, or `None` when the record has no such
    /// field or the value is missing.
    fn date(&self, field: DateField) -> Option<i64>;
}

/// A single insurance policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default, deserialize_with = "lenient::identifier")]
    pub policy_id: String,
    #[serde(default)]
    pub plan_type: PlanType,
    #[serde(default)]
    pub payment_type: PaymentType,
    /// Seconds since epoch.
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub start_date: Option<i64>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_paid: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub coverage_amount: f64,
    /// Coverage already consumed by claims. Never exceeds `coverage_amount`.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub claims_used: f64,
    #[serde(default)]
    pub status: PolicyStatus,
}

impl Dated for Policy {
    fn date(&self, field: DateField) -> Option<i64> {
        match field {
            DateField::StartDate => self.start_date,
            _ => None,
        }
    }
}

/// A claim filed against a policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    #[serde(default, deserialize_with = "lenient::identifier")]
    pub claim_id: String,
    #[serde(default, deserialize_with = "lenient::identifier")]
    pub policy_id: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub submission_date: Option<i64>,
    /// `None` until the claim has been processed.
    #[serde(default, deserialize_with = "lenient::processed_timestamp")]
    pub processed_date: Option<i64>,
    #[serde(default)]
    pub status: ClaimStatus,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub claim_amount: f64,
    /// Only meaningful when the claim is approved or paid.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub approved_amount: f64,
}

impl Dated for Claim {
    fn date(&self, field: DateField) -> Option<i64> {
        match field {
            DateField::SubmissionDate => self.submission_date,
            DateField::ProcessedDate => self.processed_date,
            DateField::StartDate => None,
        }
    }
}

/// Portfolio counters reported by the record source alongside the lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounters {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_policies: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_claims: Option<u64>,
}

/// Decoders for fields delivered as numbers, strings, or not at all.
mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub(super) enum RawValue {
        Int(i64),
        Float(f64),
        Str(String),
        Other(serde_json::Value),
    }

    impl RawValue {
        fn as_f64(&self) -> Option<f64> {
            let value = match self {
                RawValue::Int(i) => *i as f64,
                RawValue::Float(f) => *f,
                RawValue::Str(s) => s.trim().parse::<f64>().ok()?,
                RawValue::Other(_) => return None,
            };
            value.is_finite().then_some(value)
        }

        /// Integer code, accepting numeric strings.
        pub(super) fn as_code(&self) -> Option<i64> {
            match self {
                RawValue::Int(i) => Some(*i),
                RawValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
                RawValue::Str(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
        }

        pub(super) fn as_str(&self) -> Option<&str> {
            match self {
                RawValue::Str(s) => Some(s.as_str()),
                _ => None,
            }
        }
    }

    fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RawValue>, D::Error> {
        Option::<RawValue>::deserialize(deserializer)
    }

    /// Non-negative amount; anything unusable becomes 0.
    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(raw(deserializer)?
            .and_then(|r| r.as_f64())
            .filter(|v| *v >= 0.0)
            .unwrap_or(0.0))
    }

    /// Epoch seconds; negative or unparseable values are treated as absent.
    pub fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Ok(raw(deserializer)?.as_ref().and_then(to_seconds))
    }

    /// Like [`timestamp`], but `0` also means "not processed yet".
    pub fn processed_timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Ok(timestamp(deserializer)?.filter(|t| *t > 0))
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(raw(deserializer)?
            .as_ref()
            .and_then(RawValue::as_code)
            .and_then(|c| u64::try_from(c).ok()))
    }

    pub fn identifier<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match raw(deserializer)? {
            Some(RawValue::Int(i)) => i.to_string(),
            Some(RawValue::Float(f)) => f.to_string(),
            Some(RawValue::Str(s)) => s,
            Some(RawValue::Other(v)) => v.to_string(),
            None => String::new(),
        })
    }

    fn to_seconds(raw: &RawValue) -> Option<i64> {
        let seconds = match raw {
            RawValue::Int(i) => *i,
            RawValue::Str(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(i) => i,
                    Err(_) => {
                        let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
                        f.trunc() as i64
                    }
                }
            }
            RawValue::Float(f) if f.is_finite() => f.trunc() as i64,
            _ => return None,
        };
        (seconds >= 0).then_some(seconds)
    }
}
