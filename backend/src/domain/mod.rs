//! Domain primitives, services, and ports.
//!
//! Purpose: hold the photo-collection pipeline and pin management free of
//! transport and storage details. Adapters live in `crate::outbound` and are
//! injected through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Coordinate, BoundingBox, MapRegion: geographic primitives.
//! - PhotoCollectionService: search, page selection, persistence, images.
//! - PinService: pin and photo housekeeping, last map region.
//! - CollectionOutcome: Success / EmptyResult / Failure.

pub mod error;
pub mod geo;
mod mapping;
pub mod photo_search;
pub mod pins;
pub mod ports;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::geo::{BoundingBox, Coordinate, MapRegion};
pub use self::photo_search::{
    CollectionFailure, CollectionOutcome, PageCountProbe, PageSampler, PhotoCollectionPorts,
    PhotoCollectionService, PhotoSearchConfig, RandomPageSampler, Rejection, SearchParameters,
    ValidatedPayload, eligible_page_bound, select_page, validate,
};
pub use self::pins::PinService;
