use crate::error::{EngineError, Result};
use sentra_common::types::ReducedSeries;
use std::collections::HashMap;

/// Align reduced series across the queries of a multi-part condition so they
/// can be compared positionally.
///
/// Query 0 is the reference and is copied unchanged. Every later query must
/// either match the reference series-for-series by exact name, or consist of
/// exactly one series, which is then broadcast against every reference name
/// (the scalar-like comparator case). Anything else — no series, or a count
/// that matches neither rule — is rejected rather than guessed at.
pub fn normalize(
    queries: &[HashMap<String, ReducedSeries>],
) -> Result<Vec<HashMap<String, ReducedSeries>>> {
    let Some((reference, rest)) = queries.split_first() else {
        return Ok(Vec::new());
    };

    let mut normalized = Vec::with_capacity(queries.len());
    normalized.push(reference.clone());

    for (offset, query) in rest.iter().enumerate() {
        let query_index = offset + 1;

        if query.len() == reference.len() {
            let mut aligned = HashMap::with_capacity(reference.len());
            for name in reference.keys() {
                let series = query.get(name).ok_or_else(|| EngineError::MissingSeries {
                    query_index,
                    name: name.clone(),
                })?;
                aligned.insert(name.clone(), series.clone());
            }
            normalized.push(aligned);
        } else if query.len() == 1 {
            let single = query
                .values()
                .next()
                .cloned()
                .ok_or(EngineError::EmptyQueryResult { query_index })?;
            let aligned = reference
                .keys()
                .map(|name| (name.clone(), single.clone()))
                .collect();
            normalized.push(aligned);
        } else if query.is_empty() {
            return Err(EngineError::EmptyQueryResult { query_index });
        } else {
            return Err(EngineError::AmbiguousJoin {
                query_index,
                expected: reference.len(),
                actual: query.len(),
            });
        }
    }

    Ok(normalized)
}
