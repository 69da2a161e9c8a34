use serde_json::Value;
use tracing::{debug, info};

use crate::datasets::TaxonomyTool;
use crate::domain::{LineageEntry, LineageRecord, Rank, TaxId};
use crate::error::TaxError;

pub trait LineageSource {
    fn fetch(&self, taxid: &TaxId) -> Result<LineageRecord, TaxError>;
}

/// Runs one taxonomy lookup and maps the response onto a [`LineageRecord`].
/// Never retries; that is the resolver's job.
pub struct LineageFetcher<T: TaxonomyTool> {
    tool: T,
}

impl<T: TaxonomyTool> LineageFetcher<T> {
    pub fn new(tool: T) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }
}

impl<T: TaxonomyTool> LineageSource for LineageFetcher<T> {
    fn fetch(&self, taxid: &TaxId) -> Result<LineageRecord, TaxError> {
        let stdout = self.tool.summary(taxid)?;
        let record = parse_summary(taxid, &stdout)?;
        info!(%taxid, "lineage fetched");
        Ok(record)
    }
}

pub fn parse_summary(taxid: &TaxId, stdout: &str) -> Result<LineageRecord, TaxError> {
    let value: Value =
        serde_json::from_str(stdout.trim()).map_err(|err| TaxError::InvalidJson {
            taxid: taxid.to_string(),
            message: err.to_string(),
        })?;
    extract_lineage(taxid, &value)
}

pub fn extract_lineage(taxid: &TaxId, raw: &Value) -> Result<LineageRecord, TaxError> {
    let taxonomy = raw
        .get("taxonomy")
        .and_then(|v| v.as_object())
        .ok_or_else(|| malformed(taxid, "missing taxonomy object"))?;

    let mut record = LineageRecord::unknown();
    let Some(classification) = taxonomy.get("classification") else {
        debug!(%taxid, "response has no classification");
        return Ok(record);
    };
    let classification = classification
        .as_object()
        .ok_or_else(|| malformed(taxid, "classification is not an object"))?;

    for rank in Rank::ALL {
        let taxon = classification.get(rank.as_str()).filter(|v| !is_empty(v));
        let Some(taxon) = taxon else {
            debug!(%taxid, %rank, "rank absent");
            continue;
        };
        let id = scalar_field(taxon, "id")
            .ok_or_else(|| malformed(taxid, &format!("{rank} has no usable id")))?;
        let name = scalar_field(taxon, "name")
            .ok_or_else(|| malformed(taxid, &format!("{rank} has no usable name")))?;
        debug!(%taxid, %rank, %id, %name, "rank resolved");
        *record.get_mut(rank) = LineageEntry::new(id, name);
    }
    Ok(record)
}

fn scalar_field(taxon: &Value, key: &str) -> Option<String> {
    match taxon.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Values that count as an absent rank.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn malformed(taxid: &TaxId, message: &str) -> TaxError {
    TaxError::MalformedResponse {
        taxid: taxid.to_string(),
        message: message.to_string(),
    }
}
