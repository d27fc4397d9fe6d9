use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::{AppError, Result};

/// `{"results": [...]}` wrapper used by paginated upstream endpoints
#[derive(Deserialize)]
struct Paged<T> {
    results: Vec<T>,
}

/// Decode a collection body: a bare JSON array first, then the wrapped shape.
pub fn decode_list<T: DeserializeOwned>(resource: &str, body: &[u8]) -> Result<Vec<T>> {
    let bare_err = match serde_json::from_slice::<Vec<T>>(body) {
        Ok(items) => return Ok(items),
        Err(e) => e,
    };

    match serde_json::from_slice::<Paged<T>>(body) {
        Ok(paged) => Ok(paged.results),
        Err(wrapped_err) => Err(AppError::decode(
            resource,
            format!(
                "neither a list ({}) nor a results wrapper ({})",
                bare_err, wrapped_err
            ),
        )),
    }
}

pub fn decode_one<T: DeserializeOwned>(resource: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::decode(resource, e.to_string()))
}
