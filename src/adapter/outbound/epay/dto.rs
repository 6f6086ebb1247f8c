//! Wire types of the epay query API.
//!
//! Gateways disagree on whether ids, statuses and amounts are JSON strings
//! or numbers, so those fields are read loosely and normalized to strings.

use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::id::ItemId;
use crate::domain::item::{ItemStatus, Order, Settlement};
use crate::error::GatewayError;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Response envelope. `code == 1` means success.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new", deserialize_with = "nullable_list")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct OrderDto {
    pub trade_no: String,
    #[serde(default)]
    pub out_trade_no: String,
    #[serde(default, rename = "type")]
    pub pay_type: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub pid: String,
    #[serde(default)]
    pub addtime: Option<String>,
    #[serde(default)]
    pub endtime: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub money: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SettlementDto {
    #[serde(deserialize_with = "loose_string")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub pid: String,
    #[serde(default)]
    pub account: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub money: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub realmoney: String,
    #[serde(default)]
    pub addtime: Option<String>,
    #[serde(default)]
    pub endtime: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub status: String,
}

impl TryFrom<OrderDto> for Order {
    type Error = GatewayError;

    fn try_from(dto: OrderDto) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: parse_amount("money", &dto.money)?,
            trade_no: ItemId::new(dto.trade_no),
            out_trade_no: dto.out_trade_no,
            pay_type: dto.pay_type,
            name: dto.name,
            status: ItemStatus::from_code(dto.status),
            created_at: parse_time(dto.addtime.as_deref()),
            completed_at: parse_time(dto.endtime.as_deref()),
        })
    }
}

impl TryFrom<SettlementDto> for Settlement {
    type Error = GatewayError;

    fn try_from(dto: SettlementDto) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: parse_amount("money", &dto.money)?,
            realized_amount: parse_amount("realmoney", &dto.realmoney)?,
            id: ItemId::new(dto.id),
            account: dto.account,
            status: ItemStatus::from_code(dto.status),
            created_at: parse_time(dto.addtime.as_deref()),
            completed_at: parse_time(dto.endtime.as_deref()),
        })
    }
}

/// Empty amounts read as zero; anything else must be a decimal.
fn parse_amount(field: &str, raw: &str) -> Result<Decimal, GatewayError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(raw)
        .map_err(|e| GatewayError::Decode(format!("invalid {field} {raw:?}: {e}")))
}

/// Unparseable or zero timestamps (`0000-00-00 00:00:00`) read as absent.
fn parse_time(raw: Option<&str>) -> Option<NaiveDateTime> {
    raw.and_then(|s| NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT).ok())
}

fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
