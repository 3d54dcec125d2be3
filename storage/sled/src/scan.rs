use kestrel_core::{Entity, Query, QueryResults, Value};
use kestrel_proto::{Cursor, MoreResults};
use tracing::debug;

use crate::{
    database::{decode_entity, Database},
    error::SledTransportError,
};

/// Run `query` by scanning every stored entity.
///
/// The cursor handed back is the position in the sorted, de-duplicated result stream just past
/// the last returned entity. An offset is applied after the start cursor.
pub(crate) fn run_query(database: &Database, query: &Query, max_batch: usize) -> Result<QueryResults, SledTransportError> {
    let mut matched = Vec::new();
    for item in database.entities_tree.iter() {
        let (_key, bytes) = item?;
        let entity = decode_entity(&bytes)?;
        if query.matches(&entity) {
            matched.push(entity);
        }
    }
    matched.sort_by(|a, b| query.compare(a, b));

    if !query.get_distinct_on().is_empty() {
        matched = distinct(matched, query.get_distinct_on());
    }

    let start = match query.start_cursor() {
        Some(cursor) => cursor.decode::<u64>()? as usize,
        None => 0,
    };
    let begin = start.saturating_add(query.get_offset()).min(matched.len());
    let wanted = query.get_limit().unwrap_or(usize::MAX);
    let take = (matched.len() - begin).min(wanted).min(max_batch);
    let end = begin + take;

    let more_results = if end == matched.len() {
        MoreResults::NoMoreResults
    } else if take == wanted {
        MoreResults::MoreResultsAfterLimit
    } else {
        MoreResults::NotFinished
    };
    debug!("scan: {} matched, returning {}..{} ({:?})", matched.len(), begin, end, more_results);

    let entities = matched
        .drain(begin..end)
        .map(|entity| if query.projection().is_empty() { entity } else { entity.project(query.projection()) })
        .collect();
    Ok(QueryResults { entities, cursor: Some(Cursor::encode(&(end as u64))?), more_results })
}

/// Keep the first entity for each combination of values of `properties`
fn distinct(entities: Vec<Entity>, properties: &[String]) -> Vec<Entity> {
    let mut seen: Vec<Vec<Option<Value>>> = Vec::new();
    entities
        .into_iter()
        .filter(|entity| {
            let values: Vec<Option<Value>> = properties.iter().map(|p| Query::property_value(entity, p)).collect();
            if seen.contains(&values) {
                false
            } else {
                seen.push(values);
                true
            }
        })
        .collect()
}
