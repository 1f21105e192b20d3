//! HTTP outbound adapters.
//!
//! This module provides a thin reqwest implementation of the
//! `PhotoTransport` port.

mod reqwest_transport;

pub use reqwest_transport::{DEFAULT_USER_AGENT, ReqwestPhotoTransport};
