//! Response validation and field extraction.
//!
//! [`validate`] classifies a raw exchange; only a [`ValidatedPayload`] is
//! handed to the page-count and page-content stages. Rejection reasons are
//! checked in order and the first match wins:
//!
//! 1. transport error
//! 2. status outside `200..=299`
//! 3. body is not a JSON object
//! 4. `stat` absent or not `"ok"`

use serde::Deserialize;
use serde_json::Value;

use super::dto::{PageCountEnvelopeDto, PhotoListEnvelopeDto};
use super::outcome::CollectionFailure;
use crate::domain::ports::{RawResponse, TransportError};

const OK_STATUS: &str = "ok";

/// Why a response was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No response was received.
    Transport(TransportError),
    /// Status code outside `200..=299`.
    Status(u16),
    /// Body did not parse as a JSON object.
    Malformed(String),
    /// Status sentinel missing or not `ok`.
    Upstream {
        /// The `stat` value, when present.
        stat: Option<String>,
        /// The upstream `message`, when present.
        message: Option<String>,
    },
}

impl From<Rejection> for CollectionFailure {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Transport(error) => Self::Transport {
                message: error.to_string(),
            },
            Rejection::Status(status) => Self::Protocol {
                message: format!("unexpected status {status}"),
            },
            Rejection::Malformed(message) => Self::Protocol { message },
            Rejection::Upstream { stat, message } => Self::UpstreamRejection {
                message: message
                    .or_else(|| stat.map(|stat| format!("status {stat}")))
                    .unwrap_or_else(|| "missing status".to_owned()),
            },
        }
    }
}

/// A response that passed every validation check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload {
    document: Value,
}

/// Classify one exchange as a validated payload or a rejection.
///
/// # Errors
///
/// Returns the first [`Rejection`] that applies.
///
/// # Examples
/// ```
/// use pin_gallery::domain::ports::RawResponse;
/// use pin_gallery::domain::{Rejection, validate};
///
/// let rejected = validate(Ok(RawResponse::new(503, "busy")));
/// assert_eq!(rejected.err(), Some(Rejection::Status(503)));
/// ```
pub fn validate(
    exchange: Result<RawResponse, TransportError>,
) -> Result<ValidatedPayload, Rejection> {
    let response = exchange.map_err(Rejection::Transport)?;
    if !response.is_success() {
        return Err(Rejection::Status(response.status));
    }

    let document: Value = serde_json::from_slice(&response.body)
        .map_err(|error| Rejection::Malformed(format!("invalid JSON payload: {error}")))?;
    if !document.is_object() {
        return Err(Rejection::Malformed(
            "JSON payload is not an object".to_owned(),
        ));
    }

    // A non-string `stat` is treated like a missing one.
    let stat = string_field(&document, "stat");
    if stat.as_deref() != Some(OK_STATUS) {
        return Err(Rejection::Upstream {
            stat,
            message: string_field(&document, "message"),
        });
    }

    Ok(ValidatedPayload { document })
}

fn string_field(document: &Value, key: &str) -> Option<String> {
    document.get(key).and_then(Value::as_str).map(str::to_owned)
}

impl ValidatedPayload {
    /// Total number of result pages reported by the search.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionFailure::Protocol`] when the photo container or its
    /// page count is absent or malformed.
    pub fn total_pages(&self) -> Result<i64, CollectionFailure> {
        PageCountEnvelopeDto::deserialize(&self.document)
            .map(|envelope| envelope.photos.pages)
            .map_err(|error| CollectionFailure::Protocol {
                message: format!("page count missing from response: {error}"),
            })
    }

    /// Image URLs of every photo on the page, in response order.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionFailure::Protocol`] when the container or list is
    /// absent or malformed, and [`CollectionFailure::PartialEntry`] for the
    /// first entry without an image URL.
    pub fn photo_urls(&self) -> Result<Vec<String>, CollectionFailure> {
        let envelope = PhotoListEnvelopeDto::deserialize(&self.document).map_err(|error| {
            CollectionFailure::Protocol {
                message: format!("photo list missing from response: {error}"),
            }
        })?;

        envelope
            .photos
            .photo
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.url_m.ok_or(CollectionFailure::PartialEntry { index }))
            .collect()
    }
}
