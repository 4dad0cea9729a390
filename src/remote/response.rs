//! Validation of `groups.getById` response bodies.
//!
//! Accepted shapes:
//!
//! ```text
//! {"response": [{"id": 42, "name": "Cats", "members_count": 10}]}
//! {"response": {"groups": [...], "profiles": []}}
//! ```
//!
//! Anything carrying an `error` member, a missing or empty `response`, or an
//! entry without `id`/`name`/`members_count` fails the whole call.

use serde::Deserialize;
use serde_json::Value;

use super::error::{FetchError, FetchResult};
use crate::group::GroupRecord;

#[derive(Debug, Deserialize)]
struct RawGroup {
    id: Option<i64>,
    name: Option<String>,
    members_count: Option<i64>,
}

impl RawGroup {
    fn into_record(self, index: usize) -> FetchResult<GroupRecord> {
        let missing = |field: &str| {
            FetchError::Validation(format!("entry {} has no usable `{}`", index, field))
        };

        Ok(GroupRecord {
            id: self.id.ok_or_else(|| missing("id"))?,
            name: self.name.ok_or_else(|| missing("name"))?,
            member_count: self.members_count.ok_or_else(|| missing("members_count"))?,
        })
    }
}

fn describe_error(error: &Value) -> String {
    let code = error.get("error_code").and_then(Value::as_i64);
    let msg = error.get("error_msg").and_then(Value::as_str);
    match (code, msg) {
        (Some(code), Some(msg)) => format!("API error {}: {}", code, msg),
        (None, Some(msg)) => format!("API error: {}", msg),
        _ => format!("API error: {}", error),
    }
}

fn entries(body: &Value) -> FetchResult<&Vec<Value>> {
    if let Some(error) = body.get("error") {
        return Err(FetchError::Validation(describe_error(error)));
    }

    let response = body
        .get("response")
        .ok_or_else(|| FetchError::Validation("missing `response`".to_string()))?;

    let list = match response {
        Value::Array(list) => list,
        Value::Object(obj) => obj
            .get("groups")
            .and_then(Value::as_array)
            .ok_or_else(|| FetchError::Validation("`response` has no `groups` array".to_string()))?,
        other => {
            return Err(FetchError::Validation(format!(
                "unexpected `response` type: {}",
                other
            )));
        }
    };

    if list.is_empty() {
        return Err(FetchError::Validation("empty `response`".to_string()));
    }

    Ok(list)
}

fn parse_entry(index: usize, entry: &Value) -> FetchResult<GroupRecord> {
    let raw = RawGroup::deserialize(entry)
        .map_err(|e| FetchError::Validation(format!("entry {} is malformed: {}", index, e)))?;
    raw.into_record(index)
}

/// Validates a single-group response: exactly one well-formed entry.
pub fn parse_single(body: &Value) -> FetchResult<GroupRecord> {
    let list = entries(body)?;
    if list.len() != 1 {
        return Err(FetchError::Validation(format!(
            "expected exactly one group, got {}",
            list.len()
        )));
    }
    parse_entry(0, &list[0])
}

/// Validates a batch response: every entry must be well-formed.
pub fn parse_batch(body: &Value) -> FetchResult<Vec<GroupRecord>> {
    entries(body)?
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect()
}
