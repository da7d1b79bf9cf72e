//! # Conditions
//!
//! A condition tests one field of an [`ApprovalContext`]. Rules are authored
//! with untyped [`ConditionSpec`]s and compiled into the typed [`Condition`]
//! union, so an operator that makes no sense for a field (`matches` on an
//! amount, `gt` on an address) is rejected when the rule is added rather
//! than when a context is evaluated.
//!
//! | Type       | Field tested        | Operators                                   |
//! |------------|---------------------|---------------------------------------------|
//! | `amount`   | `amount`            | `eq` `gt` `lt` `in`                         |
//! | `time`     | `timestamp`         | `eq` `gt` `lt` `in`                         |
//! | `address`  | `recipient`         | `eq` `in` `contains` `matches`              |
//! | `contract` | `contract_address`  | `eq` `in` `contains` `matches`              |
//! | `custom`   | `metadata[context]` | `eq` `gt` `lt` `in` `contains` `matches`    |
//!
//! A condition whose field is absent from the context does not match.

use super::errors::ConditionError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{format_address, parse_address, Address, ApprovalContext, U256};
use std::str::FromStr;

/// Which context field a condition reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionType {
    Amount,
    Address,
    Time,
    Contract,
    Custom,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Address => "address",
            Self::Time => "time",
            Self::Contract => "contract",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for ConditionType {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amount" => Ok(Self::Amount),
            "address" => Ok(Self::Address),
            "time" => Ok(Self::Time),
            "contract" => Ok(Self::Contract),
            "custom" => Ok(Self::Custom),
            other => Err(ConditionError::UnknownType(other.to_string())),
        }
    }
}

/// Comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    In,
    Contains,
    Matches,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::In => "in",
            Self::Contains => "contains",
            Self::Matches => "matches",
        }
    }
}

impl FromStr for Operator {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Eq),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "in" => Ok(Self::In),
            "contains" => Ok(Self::Contains),
            "matches" => Ok(Self::Matches),
            other => Err(ConditionError::UnknownOperator(other.to_string())),
        }
    }
}

/// Authoring form of a condition, as found in policy files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub operator: String,
    pub value: Value,
    /// Metadata key for `custom` conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ConditionSpec {
    pub fn new(kind: &str, operator: &str, value: Value) -> Self {
        Self {
            kind: kind.to_string(),
            operator: operator.to_string(),
            value,
            context: None,
        }
    }

    pub fn with_context(mut self, key: &str) -> Self {
        self.context = Some(key.to_string());
        self
    }
}

/// Compiled regular expression, compared by its source text.
#[derive(Clone, Debug)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, ConditionError> {
        Regex::new(source)
            .map(Self)
            .map_err(|e| ConditionError::InvalidPattern(e.to_string()))
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

/// Numeric comparison over amounts and timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumericPredicate {
    Eq(U256),
    Gt(U256),
    Lt(U256),
    In(Vec<U256>),
}

impl NumericPredicate {
    pub fn test(&self, actual: U256) -> bool {
        match self {
            Self::Eq(v) => actual == *v,
            Self::Gt(v) => actual > *v,
            Self::Lt(v) => actual < *v,
            Self::In(values) => values.contains(&actual),
        }
    }
}

/// Address comparison. Text forms compare against the lowercase `0x…` rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressPredicate {
    Eq(Address),
    In(Vec<Address>),
    Contains(String),
    Matches(Pattern),
}

impl AddressPredicate {
    pub fn test(&self, actual: &Address) -> bool {
        match self {
            Self::Eq(a) => actual == a,
            Self::In(list) => list.contains(actual),
            Self::Contains(fragment) => format_address(actual).contains(fragment.as_str()),
            Self::Matches(pattern) => pattern.is_match(&format_address(actual)),
        }
    }
}

/// Structural comparison over a metadata value.
#[derive(Clone, Debug, PartialEq)]
pub enum ValuePredicate {
    Eq(Value),
    Gt(f64),
    Lt(f64),
    In(Vec<Value>),
    Contains(Value),
    Matches(Pattern),
}

impl ValuePredicate {
    pub fn test(&self, actual: &Value) -> bool {
        match self {
            Self::Eq(v) => same_value(actual, v),
            Self::Gt(t) => actual.as_f64().is_some_and(|n| n > *t),
            Self::Lt(t) => actual.as_f64().is_some_and(|n| n < *t),
            Self::In(values) => values.iter().any(|v| same_value(actual, v)),
            Self::Contains(needle) => match (actual, needle) {
                (Value::String(hay), Value::String(n)) => hay.contains(n.as_str()),
                (Value::Array(items), n) => items.iter().any(|item| same_value(item, n)),
                _ => false,
            },
            Self::Matches(pattern) => actual.as_str().is_some_and(|s| pattern.is_match(s)),
        }
    }
}

/// JSON equality where numbers compare by value, so `7` equals `7.0`.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// A compiled condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "ConditionSpec", try_from = "ConditionSpec")]
pub enum Condition {
    Amount(NumericPredicate),
    Address(AddressPredicate),
    Time(NumericPredicate),
    Contract(AddressPredicate),
    Custom { key: String, predicate: ValuePredicate },
}

impl Condition {
    /// Compile an authoring-form condition.
    pub fn from_spec(spec: &ConditionSpec) -> Result<Self, ConditionError> {
        let kind: ConditionType = spec.kind.parse()?;
        let operator: Operator = spec.operator.parse()?;
        if spec.value.is_null() {
            return Err(ConditionError::NullValue);
        }

        match kind {
            ConditionType::Amount => numeric_predicate(kind, operator, &spec.value).map(Self::Amount),
            ConditionType::Time => numeric_predicate(kind, operator, &spec.value).map(Self::Time),
            ConditionType::Address => {
                address_predicate(kind, operator, &spec.value).map(Self::Address)
            }
            ConditionType::Contract => {
                address_predicate(kind, operator, &spec.value).map(Self::Contract)
            }
            ConditionType::Custom => {
                let key = spec
                    .context
                    .as_deref()
                    .filter(|k| !k.is_empty())
                    .ok_or(ConditionError::MissingContextKey)?;
                Ok(Self::Custom {
                    key: key.to_string(),
                    predicate: value_predicate(operator, &spec.value)?,
                })
            }
        }
    }

    pub fn kind(&self) -> ConditionType {
        match self {
            Self::Amount(_) => ConditionType::Amount,
            Self::Address(_) => ConditionType::Address,
            Self::Time(_) => ConditionType::Time,
            Self::Contract(_) => ConditionType::Contract,
            Self::Custom { .. } => ConditionType::Custom,
        }
    }

    /// Test the context field selected by this condition's type.
    pub fn evaluate(&self, context: &ApprovalContext) -> bool {
        match self {
            Self::Amount(p) => context.amount.is_some_and(|amount| p.test(amount)),
            Self::Time(p) => p.test(U256::from(context.timestamp)),
            Self::Address(p) => context.recipient.as_ref().is_some_and(|r| p.test(r)),
            Self::Contract(p) => context.contract_address.as_ref().is_some_and(|c| p.test(c)),
            Self::Custom { key, predicate } => {
                context.metadata.get(key).is_some_and(|v| predicate.test(v))
            }
        }
    }

    /// Canonical authoring form: decimal amounts, lowercase addresses.
    pub fn to_spec(&self) -> ConditionSpec {
        let kind = self.kind().as_str();
        match self {
            Self::Amount(p) | Self::Time(p) => {
                let (op, value) = match p {
                    NumericPredicate::Eq(v) => (Operator::Eq, Value::String(v.to_string())),
                    NumericPredicate::Gt(v) => (Operator::Gt, Value::String(v.to_string())),
                    NumericPredicate::Lt(v) => (Operator::Lt, Value::String(v.to_string())),
                    NumericPredicate::In(vs) => (
                        Operator::In,
                        Value::Array(vs.iter().map(|v| Value::String(v.to_string())).collect()),
                    ),
                };
                ConditionSpec::new(kind, op.as_str(), value)
            }
            Self::Address(p) | Self::Contract(p) => {
                let (op, value) = match p {
                    AddressPredicate::Eq(a) => (Operator::Eq, Value::String(format_address(a))),
                    AddressPredicate::In(list) => (
                        Operator::In,
                        Value::Array(
                            list.iter()
                                .map(|a| Value::String(format_address(a)))
                                .collect(),
                        ),
                    ),
                    AddressPredicate::Contains(f) => (Operator::Contains, Value::String(f.clone())),
                    AddressPredicate::Matches(p) => {
                        (Operator::Matches, Value::String(p.as_str().to_string()))
                    }
                };
                ConditionSpec::new(kind, op.as_str(), value)
            }
            Self::Custom { key, predicate } => {
                let (op, value) = match predicate {
                    ValuePredicate::Eq(v) => (Operator::Eq, v.clone()),
                    ValuePredicate::Gt(t) => (Operator::Gt, Value::from(*t)),
                    ValuePredicate::Lt(t) => (Operator::Lt, Value::from(*t)),
                    ValuePredicate::In(vs) => (Operator::In, Value::Array(vs.clone())),
                    ValuePredicate::Contains(v) => (Operator::Contains, v.clone()),
                    ValuePredicate::Matches(p) => {
                        (Operator::Matches, Value::String(p.as_str().to_string()))
                    }
                };
                ConditionSpec::new(kind, op.as_str(), value).with_context(key)
            }
        }
    }
}

impl TryFrom<ConditionSpec> for Condition {
    type Error = ConditionError;

    fn try_from(spec: ConditionSpec) -> Result<Self, Self::Error> {
        Self::from_spec(&spec)
    }
}

impl From<Condition> for ConditionSpec {
    fn from(condition: Condition) -> Self {
        condition.to_spec()
    }
}

// =============================================================================
// COMPILATION HELPERS
// =============================================================================

fn unsupported(kind: ConditionType, operator: Operator) -> ConditionError {
    ConditionError::UnsupportedOperator {
        kind: kind.as_str().to_string(),
        operator: operator.as_str().to_string(),
    }
}

fn non_empty_list(value: &Value) -> Result<&Vec<Value>, ConditionError> {
    match value {
        Value::Array(items) if !items.is_empty() => Ok(items),
        Value::Array(_) => Err(ConditionError::InvalidValue(
            "'in' needs at least one value".to_string(),
        )),
        _ => Err(ConditionError::InvalidValue(
            "'in' needs an array".to_string(),
        )),
    }
}

fn parse_u256(value: &Value) -> Result<U256, ConditionError> {
    match value {
        Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(|| {
            ConditionError::InvalidValue(format!(
                "{n} is not a non-negative integer (use a decimal string for large values)"
            ))
        }),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None => U256::from_dec_str(s).ok(),
            };
            parsed.ok_or_else(|| ConditionError::InvalidValue(format!("'{s}' is not a number")))
        }
        other => Err(ConditionError::InvalidValue(format!(
            "{other} is not a number"
        ))),
    }
}

fn parse_address_value(value: &Value) -> Result<Address, ConditionError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ConditionError::InvalidValue(format!("{value} is not an address string")))?;
    parse_address(raw).map_err(|e| ConditionError::InvalidValue(e.to_string()))
}

fn pattern_value(value: &Value) -> Result<Pattern, ConditionError> {
    let source = value
        .as_str()
        .ok_or_else(|| ConditionError::InvalidValue("'matches' needs a string".to_string()))?;
    Pattern::new(source)
}

fn numeric_predicate(
    kind: ConditionType,
    operator: Operator,
    value: &Value,
) -> Result<NumericPredicate, ConditionError> {
    match operator {
        Operator::Eq => Ok(NumericPredicate::Eq(parse_u256(value)?)),
        Operator::Gt => Ok(NumericPredicate::Gt(parse_u256(value)?)),
        Operator::Lt => Ok(NumericPredicate::Lt(parse_u256(value)?)),
        Operator::In => non_empty_list(value)?
            .iter()
            .map(parse_u256)
            .collect::<Result<Vec<_>, _>>()
            .map(NumericPredicate::In),
        Operator::Contains | Operator::Matches => Err(unsupported(kind, operator)),
    }
}

fn address_predicate(
    kind: ConditionType,
    operator: Operator,
    value: &Value,
) -> Result<AddressPredicate, ConditionError> {
    match operator {
        Operator::Eq => Ok(AddressPredicate::Eq(parse_address_value(value)?)),
        Operator::In => non_empty_list(value)?
            .iter()
            .map(parse_address_value)
            .collect::<Result<Vec<_>, _>>()
            .map(AddressPredicate::In),
        Operator::Contains => {
            let fragment = value
                .as_str()
                .map(str::to_ascii_lowercase)
                .filter(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_hexdigit() || c == 'x'))
                .ok_or_else(|| {
                    ConditionError::InvalidValue(format!("{value} is not a hex fragment"))
                })?;
            Ok(AddressPredicate::Contains(fragment))
        }
        Operator::Matches => Ok(AddressPredicate::Matches(pattern_value(value)?)),
        Operator::Gt | Operator::Lt => Err(unsupported(kind, operator)),
    }
}

fn value_predicate(operator: Operator, value: &Value) -> Result<ValuePredicate, ConditionError> {
    let threshold = |v: &Value| {
        v.as_f64()
            .ok_or_else(|| ConditionError::InvalidValue(format!("{v} is not a number")))
    };
    match operator {
        Operator::Eq => Ok(ValuePredicate::Eq(value.clone())),
        Operator::Gt => Ok(ValuePredicate::Gt(threshold(value)?)),
        Operator::Lt => Ok(ValuePredicate::Lt(threshold(value)?)),
        Operator::In => Ok(ValuePredicate::In(non_empty_list(value)?.clone())),
        Operator::Contains => Ok(ValuePredicate::Contains(value.clone())),
        Operator::Matches => Ok(ValuePredicate::Matches(pattern_value(value)?)),
    }
}
