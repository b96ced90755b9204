use serde::{Deserialize, Serialize};

/// Action taken by PX4 when the telemetry datalink is lost. 0 disables it.
pub const DATALINK_LOSS_ACTION: &str = "NAV_DLL_ACT";
/// Action taken by PX4 when the RC link is lost. 0 disables it.
pub const RC_LOSS_ACTION: &str = "NAV_RCL_ACT";
/// Return-to-launch path policy.
pub const RTL_TYPE: &str = "RTL_TYPE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Integer,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Integer(i64),
    Real(f64),
}

impl ParamValue {
    pub fn kind(self) -> ParamKind {
        match self {
            ParamValue::Integer(_) => ParamKind::Integer,
            ParamValue::Real(_) => ParamKind::Real,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            ParamValue::Integer(value) => value == 0,
            ParamValue::Real(value) => value == 0.0,
        }
    }

    /// Integer view of the value; reals are rounded to the nearest integer.
    pub fn as_integer(self) -> i64 {
        match self {
            ParamValue::Integer(value) => value,
            ParamValue::Real(value) => value.round() as i64,
        }
    }

    pub fn as_real(self) -> f64 {
        match self {
            ParamValue::Integer(value) => value as f64,
            ParamValue::Real(value) => value,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Integer(value) => write!(f, "{value}"),
            ParamValue::Real(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailsafeParameter {
    pub id: String,
    pub value: ParamValue,
}

impl FailsafeParameter {
    pub fn kind(&self) -> ParamKind {
        self.value.kind()
    }

    pub fn is_disabled(&self) -> bool {
        self.value.is_zero()
    }
}
