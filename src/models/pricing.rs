use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// One pricing row as returned by the pricing webhook. Rates arrive as
/// decimal strings (sometimes numbers), `ativo` as 1/0, "1"/"true" or a
/// plain boolean depending on the upstream automation run.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingDto {
    #[serde(default)]
    pub modelo: String,
    /// Cost per 1,000,000 input tokens.
    #[serde(default, deserialize_with = "de_decimal")]
    pub entrada: Option<f64>,
    /// Cost per 1,000,000 output tokens.
    #[serde(default, deserialize_with = "de_decimal")]
    pub saida: Option<f64>,
    #[serde(default)]
    pub moeda: String,
    /// ISO timestamp from which this price applies. May be missing or
    /// malformed; such rows are treated as undated (legacy candidates only).
    #[serde(default)]
    pub data: String,
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub ativo: bool,
}

/// A dated price version for one model. Immutable once created upstream;
/// superseded, never deleted.
#[derive(Debug, Clone)]
pub struct PriceVersion {
    pub model: String,
    pub input_rate: f64,
    pub output_rate: f64,
    pub currency: String,
    pub effective_at: DateTime<Utc>,
    pub id: String,
    pub active: bool,
}

/// The undated "current" price for a model, used only as a legacy fallback
/// when the model has no dated versions at all.
#[derive(Debug, Clone)]
pub struct CurrentPrice {
    pub model: String,
    pub input_rate: f64,
    pub output_rate: f64,
    pub currency: String,
}

/// Accepts a JSON number or a decimal string.
pub(crate) fn de_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Accepts 1/0, "1", "true", or a boolean.
pub(crate) fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_accepts_strings_and_numbers() {
        let dto: PricingDto =
            serde_json::from_str(r#"{"modelo":"m","entrada":"0.40","saida":1.6,"ID":"1"}"#)
                .unwrap();
        assert_eq!(dto.entrada, Some(0.40));
        assert_eq!(dto.saida, Some(1.6));
    }

    #[test]
    fn flag_accepts_all_upstream_spellings() {
        for (raw, expected) in [
            (r#"{"ativo":1}"#, true),
            (r#"{"ativo":"1"}"#, true),
            (r#"{"ativo":"true"}"#, true),
            (r#"{"ativo":true}"#, true),
            (r#"{"ativo":0}"#, false),
            (r#"{"ativo":"0"}"#, false),
            (r#"{}"#, false),
        ] {
            let dto: PricingDto = serde_json::from_str(raw).unwrap();
            assert_eq!(dto.ativo, expected, "raw: {raw}");
        }
    }
}
