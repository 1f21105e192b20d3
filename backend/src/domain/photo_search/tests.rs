//! Unit tests for the photo-collection pipeline.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};
use tokio::time::timeout;
use url::Url;

use super::*;
use crate::domain::geo::Coordinate;
use crate::domain::ports::{MockPhotoTransport, Photo, PhotoStore, StoreChange};
use crate::test_support::{
    InMemoryPhotoStore, ScriptedTransport, page_count_body, photo_page_body,
};

const SHARED_URL: &str = "http://x/y.jpg";

struct FixedSampler(u32);

impl PageSampler for FixedSampler {
    fn sample(&self, upper: u32) -> u32 {
        self.0.min(upper)
    }
}

#[fixture]
fn config() -> PhotoSearchConfig {
    let endpoint = Url::parse(DEFAULT_ENDPOINT).expect("default endpoint should parse");
    PhotoSearchConfig::new(endpoint, "test-key")
}

#[fixture]
fn store() -> Arc<InMemoryPhotoStore> {
    Arc::new(InMemoryPhotoStore::new())
}

fn ok(body: String) -> Result<RawResponse, TransportError> {
    Ok(RawResponse::new(200, body))
}

fn service(
    transport: Arc<dyn PhotoTransport>,
    store: Arc<InMemoryPhotoStore>,
    config: PhotoSearchConfig,
) -> Arc<PhotoCollectionService> {
    Arc::new(PhotoCollectionService::with_sampler(
        PhotoCollectionPorts::new(transport, store),
        Arc::new(FixedSampler(1)),
        config,
    ))
}

async fn pin(store: &InMemoryPhotoStore, latitude: f64, longitude: f64) -> Location {
    store
        .create_location(Coordinate::new(latitude, longitude))
        .await
        .expect("pin should be created")
}

#[rstest]
#[tokio::test]
async fn collect_persists_every_photo_on_the_selected_page(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_probe(ok(page_count_body(5)))
            .with_page(ok(photo_page_body(&[
                "https://x/1.jpg",
                "https://x/2.jpg",
                "https://x/3.jpg",
            ]))),
    );
    let location = pin(&store, 48.5, 2.25).await;
    let service = service(transport.clone(), store.clone(), config);

    let outcome = service.collect(&location).await;

    assert_eq!(outcome, CollectionOutcome::Success { persisted: 3 });
    let photos = store
        .photos_for_location(location.id)
        .await
        .expect("photos should load");
    assert_eq!(photos.len(), 3);
    assert!(photos.iter().all(|photo| photo.location_id == location.id));
    assert!(photos.iter().all(|photo| !photo.has_image()));
}

#[rstest]
#[tokio::test]
async fn probe_omits_the_page_and_fetch_includes_the_selected_one(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_probe(ok(page_count_body(10)))
            .with_page(ok(photo_page_body(&["https://x/1.jpg"]))),
    );
    let location = pin(&store, 10.0, 20.0).await;
    let service = Arc::new(PhotoCollectionService::with_sampler(
        PhotoCollectionPorts::new(transport.clone(), store.clone()),
        Arc::new(FixedSampler(4)),
        config,
    ));

    let outcome = service.collect(&location).await;
    assert!(outcome.is_success());

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    let page_of = |url: &Url| {
        url.query_pairs()
            .find(|(key, _)| key == keys::PAGE)
            .map(|(_, value)| value.into_owned())
    };
    assert_eq!(page_of(&requests[0]), None);
    assert_eq!(page_of(&requests[1]), Some("4".to_owned()));
    assert!(
        requests[0]
            .query_pairs()
            .any(|(key, value)| key == keys::BOUNDING_BOX && value == "19,9,21,11")
    );
}

#[rstest]
#[tokio::test]
async fn empty_page_reports_empty_result_and_creates_nothing(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_probe(ok(page_count_body(1)))
            .with_page(ok(photo_page_body(&[]))),
    );
    let location = pin(&store, 0.0, 0.0).await;

    let outcome = service(transport, store.clone(), config)
        .collect(&location)
        .await;

    assert_eq!(outcome, CollectionOutcome::EmptyResult);
    assert!(store.all_photos().is_empty());
}

#[rstest]
#[case::transport(
    Err(TransportError::transport("connection refused")),
    "Transport"
)]
#[case::status(Ok(RawResponse::new(500, "oops")), "Protocol")]
#[case::malformed(Ok(RawResponse::new(200, "<html>")), "Protocol")]
#[case::upstream(
    Ok(RawResponse::new(200, r#"{"stat":"fail","message":"Invalid API Key"}"#)),
    "UpstreamRejection"
)]
#[case::no_page_count(Ok(RawResponse::new(200, r#"{"stat":"ok"}"#)), "Protocol")]
#[tokio::test]
async fn rejected_probe_ends_in_failure_without_a_page_fetch(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
    #[case] probe: Result<RawResponse, TransportError>,
    #[case] expected: &str,
) {
    let transport = Arc::new(ScriptedTransport::new().with_probe(probe));
    let location = pin(&store, 1.0, 1.0).await;

    let outcome = service(transport.clone(), store.clone(), config)
        .collect(&location)
        .await;

    let CollectionOutcome::Failure(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    let kind = match failure {
        CollectionFailure::Transport { .. } => "Transport",
        CollectionFailure::Protocol { .. } => "Protocol",
        CollectionFailure::UpstreamRejection { .. } => "UpstreamRejection",
        CollectionFailure::PartialEntry { .. } => "PartialEntry",
        CollectionFailure::Persistence { .. } => "Persistence",
    };
    assert_eq!(kind, expected);
    assert_eq!(transport.requests().len(), 1, "no page fetch should follow");
    assert!(store.all_photos().is_empty());
}

#[rstest]
#[tokio::test]
async fn zero_pages_is_a_failure(config: PhotoSearchConfig, store: Arc<InMemoryPhotoStore>) {
    let transport = Arc::new(ScriptedTransport::new().with_probe(ok(page_count_body(0))));
    let location = pin(&store, 1.0, 1.0).await;

    let outcome = service(transport, store, config).collect(&location).await;

    assert!(matches!(
        outcome,
        CollectionOutcome::Failure(CollectionFailure::Protocol { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn entry_without_url_fails_the_batch_and_persists_nothing(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let body = r#"{"photos":{"photo":[{"url_m":"https://x/1.jpg"},{"id":"2"}]},"stat":"ok"}"#;
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_probe(ok(page_count_body(3)))
            .with_page(ok(body.to_owned())),
    );
    let location = pin(&store, 1.0, 1.0).await;

    let outcome = service(transport, store.clone(), config)
        .collect(&location)
        .await;

    assert_eq!(
        outcome,
        CollectionOutcome::Failure(CollectionFailure::PartialEntry { index: 1 })
    );
    assert!(store.all_photos().is_empty());
}

#[rstest]
#[tokio::test]
async fn failed_bulk_write_is_a_persistence_failure(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_probe(ok(page_count_body(3)))
            .with_page(ok(photo_page_body(&["https://x/1.jpg"]))),
    );
    let location = pin(&store, 1.0, 1.0).await;
    store.fail_photo_writes();

    let outcome = service(transport, store, config).collect(&location).await;

    assert!(matches!(
        outcome,
        CollectionOutcome::Failure(CollectionFailure::Persistence { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn collecting_twice_keeps_the_union_without_dedup(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let page = photo_page_body(&["https://x/1.jpg", "https://x/2.jpg"]);
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_probe(ok(page_count_body(2)))
            .with_page(ok(page.clone()))
            .with_probe(ok(page_count_body(2)))
            .with_page(ok(page)),
    );
    let location = pin(&store, 1.0, 1.0).await;
    let service = service(transport, store.clone(), config);

    assert!(service.collect(&location).await.is_success());
    assert!(service.collect(&location).await.is_success());

    let photos = store
        .photos_for_location(location.id)
        .await
        .expect("photos should load");
    assert_eq!(photos.len(), 4);
}

#[rstest]
#[tokio::test]
async fn renew_collection_replaces_existing_photos(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_probe(ok(page_count_body(2)))
            .with_page(ok(photo_page_body(&["https://x/old.jpg"])))
            .with_probe(ok(page_count_body(2)))
            .with_page(ok(photo_page_body(&["https://x/new.jpg"]))),
    );
    let location = pin(&store, 1.0, 1.0).await;
    let service = service(transport, store.clone(), config);
    assert!(service.collect(&location).await.is_success());

    let outcome = service
        .renew_collection(&location)
        .await
        .expect("renewal should run");

    assert_eq!(outcome, CollectionOutcome::Success { persisted: 1 });
    let urls: Vec<String> = store.all_photos().into_iter().map(|p| p.url).collect();
    assert_eq!(urls, vec!["https://x/new.jpg".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn spawned_collection_delivers_its_outcome_once(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_probe(ok(page_count_body(1)))
            .with_page(ok(photo_page_body(&[]))),
    );
    let location = pin(&store, 1.0, 1.0).await;

    let receiver = service(transport, store, config).spawn_collect(location);
    let outcome = timeout(Duration::from_secs(5), receiver)
        .await
        .expect("outcome should arrive")
        .expect("sender should not be dropped");

    assert_eq!(outcome, CollectionOutcome::EmptyResult);
}

#[rstest]
#[tokio::test]
async fn image_fetch_fans_out_to_every_record_sharing_the_url(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let first = pin(&store, 1.0, 1.0).await;
    let second = pin(&store, 1.5, 1.5).await;
    store
        .create_photos(first.id, &[SHARED_URL.to_owned()])
        .await
        .expect("photo should be created");
    store
        .create_photos(second.id, &[SHARED_URL.to_owned(), "http://x/z.jpg".to_owned()])
        .await
        .expect("photos should be created");
    let transport = Arc::new(
        ScriptedTransport::new().with_image(SHARED_URL, Ok(RawResponse::new(200, b"jpeg".to_vec()))),
    );

    service(transport, store.clone(), config)
        .fetch_image(SHARED_URL)
        .await;

    let shared = store
        .photos_with_url(SHARED_URL)
        .await
        .expect("photos should load");
    assert_eq!(shared.len(), 2);
    assert!(shared.iter().all(|photo| photo.image.as_deref() == Some(&b"jpeg"[..])));
    let other = store
        .photos_with_url("http://x/z.jpg")
        .await
        .expect("photos should load");
    assert!(!other[0].has_image());
}

#[rstest]
#[case::not_found(Ok(RawResponse::new(404, "missing")))]
#[case::transport(Err(TransportError::timeout("slow")))]
#[tokio::test]
async fn failed_image_fetch_is_dropped_silently(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
    #[case] response: Result<RawResponse, TransportError>,
) {
    let location = pin(&store, 1.0, 1.0).await;
    store
        .create_photos(location.id, &[SHARED_URL.to_owned()])
        .await
        .expect("photo should be created");
    let transport = Arc::new(ScriptedTransport::new().with_image(SHARED_URL, response));

    service(transport.clone(), store.clone(), config)
        .fetch_image(SHARED_URL)
        .await;

    assert_eq!(transport.requests().len(), 1, "no retry is attempted");
    assert!(store.all_photos().iter().all(|photo| !photo.has_image()));
}

#[rstest]
#[tokio::test]
async fn image_landing_after_pin_deletion_updates_nothing(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let location = pin(&store, 1.0, 1.0).await;
    store
        .create_photos(location.id, &[SHARED_URL.to_owned()])
        .await
        .expect("photo should be created");
    let transport = Arc::new(
        ScriptedTransport::new().with_image(SHARED_URL, Ok(RawResponse::new(200, b"jpeg".to_vec()))),
    );
    let (mut entered, release) = transport.hold_images();
    let mut changes = store.subscribe();
    let service = service(transport, store.clone(), config);

    let handle = service.spawn_image_fetch(SHARED_URL.to_owned());
    timeout(Duration::from_secs(5), entered.recv())
        .await
        .expect("download should start")
        .expect("gate should stay open");
    assert!(
        store
            .delete_location(location.id)
            .await
            .expect("delete should succeed")
    );
    release.notify_one();
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("fetch should finish")
        .expect("fetch task should not panic");

    assert!(store.all_photos().is_empty());
    let mut late_writes = Vec::new();
    while let Ok(change) = changes.try_recv() {
        if matches!(change, StoreChange::PayloadStored { .. }) {
            late_writes.push(change);
        }
    }
    assert!(late_writes.is_empty(), "late write should touch no records");
}

#[rstest]
#[tokio::test]
async fn network_calls_respect_the_concurrency_limit(
    mut config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    config.max_concurrent_requests = 1;
    let urls: Vec<String> = (0..4).map(|n| format!("https://x/{n}.jpg")).collect();
    let location = pin(&store, 1.0, 1.0).await;
    store
        .create_photos(location.id, &urls)
        .await
        .expect("photos should be created");
    let transport = urls.iter().fold(ScriptedTransport::new(), |transport, url| {
        transport.with_image(url, Ok(RawResponse::new(200, b"jpeg".to_vec())))
    });
    let transport = Arc::new(transport);
    let service = service(transport.clone(), store.clone(), config);

    let handles: Vec<_> = urls
        .iter()
        .map(|url| service.spawn_image_fetch(url.clone()))
        .collect();
    for handle in handles {
        handle.await.expect("fetch task should not panic");
    }

    assert_eq!(transport.max_in_flight(), 1);
    assert!(store.all_photos().iter().all(Photo::has_image));
}

#[rstest]
#[tokio::test]
async fn mocked_transport_sees_the_configured_endpoint(
    config: PhotoSearchConfig,
    store: Arc<InMemoryPhotoStore>,
) {
    let mut transport = MockPhotoTransport::new();
    transport
        .expect_get()
        .withf(|url| {
            url.as_str().starts_with(DEFAULT_ENDPOINT)
                && url
                    .query_pairs()
                    .any(|(key, value)| key == keys::API_KEY && value == "test-key")
        })
        .times(1)
        .returning(|_| Ok(RawResponse::new(200, r#"{"stat":"ok","photos":{"pages":0}}"#)));
    let location = pin(&store, 1.0, 1.0).await;

    let outcome = service(Arc::new(transport), store, config)
        .collect(&location)
        .await;

    assert!(matches!(outcome, CollectionOutcome::Failure(_)));
}
