//! DTOs for decoding search responses.
//!
//! Responses are validated into a JSON document first; the stage that needs a
//! field decodes only that part of the document through these types.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct PageCountEnvelopeDto {
    pub(super) photos: PageCountDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct PageCountDto {
    pub(super) pages: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct PhotoListEnvelopeDto {
    pub(super) photos: PhotoListDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct PhotoListDto {
    pub(super) photo: Vec<PhotoEntryDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PhotoEntryDto {
    pub(super) url_m: Option<String>,
}
