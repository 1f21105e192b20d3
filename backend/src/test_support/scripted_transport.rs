//! Transport double that serves scripted search and image responses.
//!
//! Search calls are recognised by their `method` query key and split into
//! page-count probes (no `page` key) and page fetches. Anything else is an
//! image download served from a per-URL table, defaulting to 404.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use url::Url;

use crate::domain::photo_search::keys;
use crate::domain::ports::{PhotoTransport, RawResponse, TransportError};

type Scripted = Result<RawResponse, TransportError>;

#[derive(Clone)]
struct ImageGate {
    entered: mpsc::UnboundedSender<String>,
    release: Arc<Notify>,
}

/// Scripted [`PhotoTransport`].
#[derive(Default)]
pub struct ScriptedTransport {
    probes: Mutex<VecDeque<Scripted>>,
    pages: Mutex<VecDeque<Scripted>>,
    images: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<Url>>,
    image_gate: Mutex<Option<ImageGate>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl ScriptedTransport {
    /// Empty script; every call fails until responses are queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response to the next page-count probe.
    #[must_use]
    pub fn with_probe(self, response: Scripted) -> Self {
        lock(&self.probes).push_back(response);
        self
    }

    /// Queue the response to the next page fetch.
    #[must_use]
    pub fn with_page(self, response: Scripted) -> Self {
        lock(&self.pages).push_back(response);
        self
    }

    /// Serve `response` for every download of `url`.
    #[must_use]
    pub fn with_image(self, url: &str, response: Scripted) -> Self {
        lock(&self.images).insert(url.to_owned(), response);
        self
    }

    /// Hold image downloads until released.
    ///
    /// Each held download reports its URL on the returned receiver and waits
    /// for one `notify_one` on the returned handle.
    pub fn hold_images(&self) -> (mpsc::UnboundedReceiver<String>, Arc<Notify>) {
        let (entered, receiver) = mpsc::unbounded_channel();
        let release = Arc::new(Notify::new());
        lock(&self.image_gate).replace(ImageGate {
            entered,
            release: Arc::clone(&release),
        });
        (receiver, release)
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<Url> {
        lock(&self.requests).clone()
    }

    /// Highest number of requests observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn next_search(&self, url: &Url) -> Scripted {
        let is_page_fetch = url.query_pairs().any(|(key, _)| key == keys::PAGE);
        let queue = if is_page_fetch {
            &self.pages
        } else {
            &self.probes
        };
        lock(queue)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::transport("search script exhausted")))
    }

    fn image(&self, url: &Url) -> Scripted {
        lock(&self.images)
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(RawResponse::new(404, "not found")))
    }
}

#[async_trait]
impl PhotoTransport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        lock(&self.requests).push(url.clone());
        let active_now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active_now, Ordering::SeqCst);

        let is_search = url.query_pairs().any(|(key, _)| key == keys::METHOD);
        let response = if is_search {
            tokio::task::yield_now().await;
            self.next_search(url)
        } else {
            let gate = lock(&self.image_gate).clone();
            if let Some(ImageGate { entered, release }) = gate {
                let _ = entered.send(url.to_string());
                release.notified().await;
            }
            self.image(url)
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
