//! Normalization of raw search results into [`ListingDraft`]s.
//!
//! The search response is kept as untyped JSON: the marketplace omits or nulls
//! fields freely and a single malformed listing must not poison the batch.
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::ListingDraft;

pub const UNKNOWN_DISTRICT: &str = "Unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("listing is not a JSON object")]
    NotAnObject,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Listing objects found under `data.clientCompatibleListings.data`.
/// A broken path means there is nothing to process this cycle.
pub fn listings_in(envelope: &Value) -> &[Value] {
    envelope
        .pointer("/data/clientCompatibleListings/data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Extract every usable listing from a search response, in response order.
pub fn extract_batch(envelope: &Value) -> Vec<ListingDraft> {
    let raw = listings_in(envelope);
    let mut drafts = Vec::with_capacity(raw.len());
    for item in raw {
        match extract_listing(item) {
            Ok(draft) => drafts.push(draft),
            Err(err) => {
                warn!(listing_id = %raw_id(item), %err, "skipping listing");
            }
        }
    }
    debug!(total = raw.len(), accepted = drafts.len(), "extracted listings");
    drafts
}

/// Normalize one raw listing object.
pub fn extract_listing(raw: &Value) -> Result<ListingDraft, ExtractError> {
    if !raw.is_object() {
        return Err(ExtractError::NotAnObject);
    }

    let id = raw.get("id").and_then(id_string).unwrap_or_default();
    let title = str_at(raw, "/title");
    let url = str_at(raw, "/url");
    let owner_name = str_at(raw, "/contact/name");
    let district_name = match raw.pointer("/location/district/name") {
        Some(Value::String(name)) => name.clone(),
        _ => UNKNOWN_DISTRICT.to_string(),
    };
    let price = price_of(raw);

    let mut missing = Vec::new();
    if id.is_empty() {
        missing.push("id");
    }
    if district_name.is_empty() {
        missing.push("district_name");
    }
    if owner_name.is_empty() {
        missing.push("owner_name");
    }
    if price.map_or(true, |p| p == 0.0) {
        missing.push("price");
    }
    if title.is_empty() {
        missing.push("title");
    }
    if url.is_empty() {
        missing.push("url");
    }
    if !missing.is_empty() {
        return Err(ExtractError::MissingFields(missing));
    }

    Ok(ListingDraft {
        id,
        title,
        url,
        owner_name,
        price: price.unwrap_or_default(),
        district_name,
        has_phone: raw.pointer("/contact/phone").map_or(false, truthy),
        description: str_at(raw, "/description"),
        created_time: str_at(raw, "/created_time"),
        last_refresh_time: str_at(raw, "/last_refresh_time"),
        user_id: raw.pointer("/user/id").and_then(id_string),
        user_uuid: raw.pointer("/user/uuid").and_then(id_string),
    })
}

/// The numeric value of the `price` entry in `params`, if any.
fn price_of(raw: &Value) -> Option<f64> {
    raw.get("params")?
        .as_array()?
        .iter()
        .find(|p| p.get("key").and_then(Value::as_str) == Some("price"))?
        .pointer("/value/value")
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter(|p: &f64| p.is_finite())
}

fn str_at(raw: &Value, pointer: &str) -> String {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Ids arrive as numbers or strings. Zero and blank strings count as absent.
fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                (i != 0).then(|| i.to_string())
            } else if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f != 0.0 && f.fract() == 0.0)
                    .map(|f| format!("{f:.0}"))
            }
        }
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn raw_id(raw: &Value) -> String {
    raw.get("id")
        .and_then(id_string)
        .unwrap_or_else(|| "unknown".into())
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
