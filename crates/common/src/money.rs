//! Amounts are carried as integer cents and exposed as decimal numbers in JSON.

/// Largest single amount accepted from clients, in cents (one trillion units).
pub const MAX_CENTS: i64 = 100_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Amount is too large")]
pub struct AmountOverflow;

/// Rounds a client amount to the nearest cent. `None` when it is not finite or
/// its magnitude is above `MAX_CENTS`.
pub fn to_cents(amount: f64) -> Option<i64> {
    if !amount.is_finite() {
        return None;
    }
    let cents = (amount * 100.0).round();
    if cents.abs() > MAX_CENTS as f64 {
        return None;
    }
    Some(cents as i64)
}

/// Rounds a computed cent value, failing when it does not fit in an `i64`.
pub fn round_cents(cents: f64) -> Result<i64, AmountOverflow> {
    let cents = cents.round();
    if !cents.is_finite() || cents.abs() >= i64::MAX as f64 {
        return Err(AmountOverflow);
    }
    Ok(cents as i64)
}

pub fn checked_add(a: i64, b: i64) -> Result<i64, AmountOverflow> {
    a.checked_add(b).ok_or(AmountOverflow)
}

pub fn checked_sum<I: IntoIterator<Item = i64>>(amounts: I) -> Result<i64, AmountOverflow> {
    amounts.into_iter().try_fold(0i64, checked_add)
}

pub fn to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Human-readable amount: `200`, `12.50`, `-3`.
pub fn format_amount(cents: i64) -> String {
    if cents % 100 == 0 {
        format!("{}", cents / 100)
    } else {
        format!("{:.2}", to_amount(cents))
    }
}

/// `#[serde(with = "common::money::amount")]` for `i64` cent fields.
pub mod amount {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(super::to_amount(*cents))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        super::to_cents(amount).ok_or_else(|| D::Error::custom(super::AmountOverflow))
    }
}

pub mod optional_amount {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cents: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match cents {
            Some(c) => serializer.serialize_some(&super::to_amount(*c)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let amount = Option::<f64>::deserialize(deserializer)?;
        amount
            .map(|a| super::to_cents(a).ok_or_else(|| D::Error::custom(super::AmountOverflow)))
            .transpose()
    }
}

/// Category → cents maps, e.g. `MonthlySummary::by_category`.
pub mod amount_map {
    use serde::de::Error;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, i64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (key, cents) in map {
            out.serialize_entry(key, &super::to_amount(*cents))?;
        }
        out.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, i64>, D::Error> {
        let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(k, v)| {
                super::to_cents(v)
                    .map(|cents| (k, cents))
                    .ok_or_else(|| D::Error::custom(super::AmountOverflow))
            })
            .collect()
    }
}
