use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use bytes::Bytes;
use log::debug;

const SCHEME_PREFIX: &str = "blob:form-relay/";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-local handles to downloaded bodies, the native stand-in for
/// `URL.createObjectURL`.
#[derive(Debug, Default)]
pub struct ObjectUrls {
    next: AtomicU64,
    objects: Mutex<BTreeMap<ObjectUrl, Bytes>>,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Bytes) -> ObjectUrl {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        let url = ObjectUrl(format!("{SCHEME_PREFIX}{id}"));
        debug!("{url}: {} bytes.", bytes.len());
        self.lock().insert(url.clone(), bytes);
        url
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Option<Bytes> {
        self.lock().get(url).cloned()
    }

    /// Release the handle. Returns `false` if it was not live.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        self.lock().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<ObjectUrl, Bytes>> {
        // The map stays consistent even if a holder panicked.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
