//! Photo-collection pipeline for a pin.
//!
//! One run probes the search for its page count, picks a page, fetches it,
//! and persists one record per photo. Image bytes are fetched separately,
//! keyed by source URL, and written to every record sharing that URL.
//!
//! Network calls share one semaphore so concurrent pins and image fetches
//! stay within `max_concurrent_requests`.

use std::sync::Arc;

use tokio::sync::{Semaphore, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::Error;
use crate::domain::geo::BoundingBox;
use crate::domain::mapping::map_store_error;
use crate::domain::ports::{Location, PhotoStore, PhotoTransport, RawResponse, TransportError};

mod dto;
mod outcome;
mod page;
mod query;
mod response;

pub use outcome::{CollectionFailure, CollectionOutcome};
pub use page::{PageSampler, RandomPageSampler, eligible_page_bound, select_page};
pub use query::{SearchParameters, keys};
pub use response::{Rejection, ValidatedPayload, validate};

/// Default search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.flickr.com/services/rest";
/// Photos requested per page.
pub const DEFAULT_PER_PAGE: u32 = 21;
/// Most results the search will paginate through.
pub const DEFAULT_RESULT_CEILING: u32 = 4_000;

/// Settings for the search pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSearchConfig {
    /// Search endpoint.
    pub endpoint: Url,
    /// API credential.
    pub api_key: String,
    /// Photos per page.
    pub per_page: u32,
    /// Most results the search will paginate through.
    pub result_ceiling: u32,
    /// Concurrent network call limit.
    pub max_concurrent_requests: usize,
}

impl PhotoSearchConfig {
    /// Configuration with default paging for `endpoint` and `api_key`.
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: api_key.into(),
            per_page: DEFAULT_PER_PAGE,
            result_ceiling: DEFAULT_RESULT_CEILING,
            max_concurrent_requests: 4,
        }
    }

    /// Highest page the search will serve, never below 1.
    ///
    /// # Examples
    /// ```
    /// use pin_gallery::domain::PhotoSearchConfig;
    /// use url::Url;
    ///
    /// let endpoint = Url::parse("https://example.test/rest")?;
    /// let config = PhotoSearchConfig::new(endpoint, "key");
    /// assert_eq!(config.max_allowed_page(), 190);
    /// # Ok::<(), url::ParseError>(())
    /// ```
    pub fn max_allowed_page(&self) -> u32 {
        (self.result_ceiling / self.per_page.max(1)).max(1)
    }
}

/// Outbound dependencies of the pipeline.
pub struct PhotoCollectionPorts {
    /// HTTP transport for search calls and image downloads.
    pub transport: Arc<dyn PhotoTransport>,
    /// Pin and photo store.
    pub store: Arc<dyn PhotoStore>,
}

impl PhotoCollectionPorts {
    /// Build a port bundle.
    pub fn new(transport: Arc<dyn PhotoTransport>, store: Arc<dyn PhotoStore>) -> Self {
        Self { transport, store }
    }
}

/// Page count reported by the probe, with the parameters that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCountProbe {
    /// Probe parameters; the page fetch reuses them.
    pub parameters: SearchParameters,
    /// Total pages reported by the search.
    pub total_pages: i64,
}

/// Fetches and caches photo collections for pins.
pub struct PhotoCollectionService {
    transport: Arc<dyn PhotoTransport>,
    store: Arc<dyn PhotoStore>,
    sampler: Arc<dyn PageSampler>,
    request_permits: Arc<Semaphore>,
    config: PhotoSearchConfig,
}

impl PhotoCollectionService {
    /// Build a service that samples pages with [`RandomPageSampler`].
    pub fn new(ports: PhotoCollectionPorts, config: PhotoSearchConfig) -> Self {
        Self::with_sampler(ports, Arc::new(RandomPageSampler), config)
    }

    /// Build a service with an injected page sampler.
    pub fn with_sampler(
        ports: PhotoCollectionPorts,
        sampler: Arc<dyn PageSampler>,
        config: PhotoSearchConfig,
    ) -> Self {
        Self {
            transport: ports.transport,
            store: ports.store,
            sampler,
            request_permits: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            config,
        }
    }

    /// Run the whole pipeline for `location`.
    ///
    /// Stages run in order and any stage may end the run; nothing retries.
    /// ```rust,ignore
    /// let outcome = service.collect(&location).await;
    /// println!("{}", outcome.user_message());
    /// ```
    pub async fn collect(&self, location: &Location) -> CollectionOutcome {
        let outcome = match self.discover_page_count(location).await {
            Ok(probe) => match select_page(
                probe.total_pages,
                self.config.max_allowed_page(),
                self.sampler.as_ref(),
            ) {
                Ok(page) => self.fetch_page(location, &probe.parameters, page).await,
                Err(failure) => failure.into(),
            },
            Err(failure) => failure.into(),
        };

        match &outcome {
            CollectionOutcome::Failure(failure) => {
                warn!(location_id = %location.id, %failure, "photo collection failed");
            }
            CollectionOutcome::EmptyResult => {
                info!(location_id = %location.id, "photo search matched nothing");
            }
            CollectionOutcome::Success { persisted } => {
                info!(location_id = %location.id, persisted, "photo collection stored");
            }
        }
        outcome
    }

    /// Run [`Self::collect`] on the runtime and deliver its outcome once.
    pub fn spawn_collect(
        self: &Arc<Self>,
        location: Location,
    ) -> oneshot::Receiver<CollectionOutcome> {
        let (sender, receiver) = oneshot::channel();
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = service.collect(&location).await;
            if sender.send(outcome).is_err() {
                debug!(location_id = %location.id, "collection outcome receiver dropped");
            }
        });
        receiver
    }

    /// Delete the pin's photos, then run the pipeline again.
    ///
    /// # Errors
    ///
    /// Returns a domain error when the existing photos cannot be deleted.
    pub async fn renew_collection(&self, location: &Location) -> Result<CollectionOutcome, Error> {
        let removed = self
            .store
            .delete_photos_for_location(location.id)
            .await
            .map_err(map_store_error)?;
        debug!(location_id = %location.id, removed, "cleared photo collection");
        Ok(self.collect(location).await)
    }

    /// Probe the search for `location` without a page parameter.
    ///
    /// # Errors
    ///
    /// Returns a [`CollectionFailure`] when the response is rejected or has no
    /// page count.
    pub async fn discover_page_count(
        &self,
        location: &Location,
    ) -> Result<PageCountProbe, CollectionFailure> {
        let bbox = BoundingBox::around(location.coordinate);
        let parameters =
            SearchParameters::for_area(&bbox, &self.config.api_key, self.config.per_page);

        let payload = validate(self.send(&parameters.to_url(&self.config.endpoint)).await)?;
        let total_pages = payload.total_pages()?;
        debug!(location_id = %location.id, %bbox, total_pages, "discovered page count");

        Ok(PageCountProbe {
            parameters,
            total_pages,
        })
    }

    /// Fetch `page` and persist one record per photo on it.
    pub async fn fetch_page(
        &self,
        location: &Location,
        parameters: &SearchParameters,
        page: u32,
    ) -> CollectionOutcome {
        let target = parameters.with_page(page).to_url(&self.config.endpoint);
        let urls = match validate(self.send(&target).await)
            .map_err(CollectionFailure::from)
            .and_then(|payload| payload.photo_urls())
        {
            Ok(urls) => urls,
            Err(failure) => return failure.into(),
        };
        if urls.is_empty() {
            return CollectionOutcome::EmptyResult;
        }

        match self.store.create_photos(location.id, &urls).await {
            Ok(photos) => CollectionOutcome::Success {
                persisted: photos.len(),
            },
            Err(error) => CollectionFailure::Persistence {
                message: error.to_string(),
            }
            .into(),
        }
    }

    /// Download the image at `url` and store it on every record sharing it.
    ///
    /// Records are resolved when the write runs, so deleted pins simply
    /// match nothing. Failures are logged and dropped; there is no retry.
    pub async fn fetch_image(&self, url: &str) {
        let target = match Url::parse(url) {
            Ok(target) => target,
            Err(error) => {
                warn!(%url, %error, "photo URL is not fetchable");
                return;
            }
        };

        let image = match self.send(&target).await {
            Ok(response) if response.is_success() => response.body,
            Ok(response) => {
                warn!(%url, status = response.status, "image download rejected");
                return;
            }
            Err(error) => {
                warn!(%url, %error, "image download failed");
                return;
            }
        };

        match self.store.store_image_for_url(url, &image).await {
            Ok(updated) => debug!(%url, updated, bytes = image.len(), "stored image"),
            Err(error) => warn!(%url, %error, "storing image failed"),
        }
    }

    /// Run [`Self::fetch_image`] on the runtime.
    pub fn spawn_image_fetch(self: &Arc<Self>, url: String) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.fetch_image(&url).await })
    }

    async fn send(&self, url: &Url) -> Result<RawResponse, TransportError> {
        let _permit = self
            .request_permits
            .acquire()
            .await
            .map_err(|_| TransportError::transport("request limiter closed"))?;
        self.transport.get(url).await
    }
}

#[cfg(test)]
mod tests;
