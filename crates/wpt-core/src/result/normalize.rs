use std::collections::HashMap;

use crate::error::WptError;
use crate::result::model::{NormalizedResult, RawEnvelope, Run, TestResult};

/// Decode a `jsonResult.php` body and reshape it into a [`NormalizedResult`].
///
/// # Errors
///
/// Returns [`WptError::Decode`] when the body is not valid JSON or a field has
/// the wrong type, and [`WptError::InvalidRunKey`] when a `runs` key is not a
/// run index. No partial result is returned on either path.
pub fn normalize(body: &[u8]) -> Result<NormalizedResult, WptError> {
    let envelope: RawEnvelope = serde_json::from_slice(body)?;
    normalize_envelope(envelope)
}

/// Reshape an already decoded envelope.
pub fn normalize_envelope(envelope: RawEnvelope) -> Result<NormalizedResult, WptError> {
    let RawEnvelope {
        status_code,
        status_text,
        data,
        ..
    } = envelope;

    let runs = order_runs(data.runs)?;

    Ok(NormalizedResult {
        status_code,
        status_text,
        data: TestResult {
            info: data.info,
            runs,
        },
    })
}

/// Turn the index-keyed `runs` object into a sequence sorted by the numeric
/// value of each key. `"10"` sorts after `"2"`; missing indices are not filled.
pub fn order_runs(runs: HashMap<String, Run>) -> Result<Vec<Run>, WptError> {
    let mut indexed = Vec::with_capacity(runs.len());
    for (key, run) in runs {
        let index = parse_run_index(&key)?;
        indexed.push((index, key, run));
    }

    indexed.sort_unstable_by_key(|(index, _, _)| *index);

    // Keys such as "1" and "01" name the same index and have no defined order.
    if let Some(pair) = indexed.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        let (first, second) = if pair[0].1 <= pair[1].1 {
            (&pair[0].1, &pair[1].1)
        } else {
            (&pair[1].1, &pair[0].1)
        };
        return Err(WptError::InvalidRunKey {
            key: second.clone(),
            reason: format!("duplicates run index of key {first:?}"),
        });
    }

    tracing::trace!(count = indexed.len(), "ordered runs");

    Ok(indexed.into_iter().map(|(_, _, run)| run).collect())
}

fn parse_run_index(key: &str) -> Result<u64, WptError> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WptError::InvalidRunKey {
            key: key.to_string(),
            reason: "not a non-negative integer".to_string(),
        });
    }
    key.parse().map_err(|e| WptError::InvalidRunKey {
        key: key.to_string(),
        reason: format!("{e}"),
    })
}
