//! Search request parameters for `flickr.photos.search`.
//!
//! The page-count probe carries no `page` key; the page fetch always does.

use std::collections::BTreeMap;

use url::Url;

use crate::domain::geo::BoundingBox;

/// Query keys understood by the search endpoint.
pub mod keys {
    /// API method name.
    pub const METHOD: &str = "method";
    /// API credential.
    pub const API_KEY: &str = "api_key";
    /// Search rectangle.
    pub const BOUNDING_BOX: &str = "bbox";
    /// Safe-search level.
    pub const SAFE_SEARCH: &str = "safe_search";
    /// Extra fields to include per photo.
    pub const EXTRAS: &str = "extras";
    /// Response format.
    pub const FORMAT: &str = "format";
    /// Disables the JSONP wrapper.
    pub const NO_JSON_CALLBACK: &str = "nojsoncallback";
    /// Results per page.
    pub const PER_PAGE: &str = "per_page";
    /// 1-based page number.
    pub const PAGE: &str = "page";
}

const SEARCH_METHOD: &str = "flickr.photos.search";
const USE_SAFE_SEARCH: &str = "1";
const MEDIUM_URL_EXTRA: &str = "url_m";
const JSON_FORMAT: &str = "json";
const DISABLE_JSON_CALLBACK: &str = "1";

/// Canonical parameter set for one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParameters {
    params: BTreeMap<&'static str, String>,
}

impl SearchParameters {
    /// Parameters for the page-count probe over `bbox`.
    ///
    /// # Examples
    /// ```
    /// use pin_gallery::domain::{BoundingBox, Coordinate, SearchParameters};
    ///
    /// let bbox = BoundingBox::around(Coordinate::new(10.0, 20.0));
    /// let probe = SearchParameters::for_area(&bbox, "key", 21);
    /// assert_eq!(probe.page(), None);
    /// assert_eq!(probe.with_page(3).page(), Some(3));
    /// ```
    pub fn for_area(bbox: &BoundingBox, api_key: &str, per_page: u32) -> Self {
        let params = BTreeMap::from([
            (keys::METHOD, SEARCH_METHOD.to_owned()),
            (keys::API_KEY, api_key.to_owned()),
            (keys::BOUNDING_BOX, bbox.to_string()),
            (keys::SAFE_SEARCH, USE_SAFE_SEARCH.to_owned()),
            (keys::EXTRAS, MEDIUM_URL_EXTRA.to_owned()),
            (keys::FORMAT, JSON_FORMAT.to_owned()),
            (keys::NO_JSON_CALLBACK, DISABLE_JSON_CALLBACK.to_owned()),
            (keys::PER_PAGE, per_page.to_string()),
        ]);
        Self { params }
    }

    /// Copy of these parameters requesting `page`.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        let mut params = self.params.clone();
        params.insert(keys::PAGE, page.to_string());
        Self { params }
    }

    /// Requested page, when one is set.
    pub fn page(&self) -> Option<u32> {
        self.params.get(keys::PAGE).and_then(|raw| raw.parse().ok())
    }

    /// Value for `key`, when present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Encode as the query string of `endpoint`, keys in sorted order.
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(self.params.iter().map(|(key, value)| (*key, value.as_str())));
        url
    }
}
