// Offline-resilient inventory catalogs. Each catalog fetches a whole
// collection from the remote API, persists the snapshot under its kind's
// cache key, and serves the persisted copy when the network fails. The
// three kinds write to disjoint keys and never affect each other.

use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::api_client::{FetchError, InventoryApi};
use crate::inventory::{CatalogItem, Flight, Hotel, InventoryKind, Rental};
use crate::store::KeyValueStore;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no {kind} with id {id} in remote or cache")]
    NotFound { kind: InventoryKind, id: u64 },
}

// Which path produced a value: a live fetch or the offline cache. Callers
// that do not care take into_inner(); tests assert the provenance.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Live(T),
    Cached(T),
}

impl<T> Sourced<T> {
    pub fn into_inner(self) -> T {
        match self {
            Sourced::Live(value) | Sourced::Cached(value) => value,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Sourced::Cached(_))
    }
}

pub struct CatalogService<T: CatalogItem> {
    api: Arc<dyn InventoryApi>,
    store: Arc<dyn KeyValueStore>,
    _item: PhantomData<fn() -> T>,
}

pub type FlightCatalog = CatalogService<Flight>;
pub type HotelCatalog = CatalogService<Hotel>;
pub type RentalCatalog = CatalogService<Rental>;

impl<T: CatalogItem> CatalogService<T> {
    pub fn new(api: Arc<dyn InventoryApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store,
            _item: PhantomData,
        }
    }

    // Fetch the whole catalog. On success the snapshot replaces the cached
    // blob in full; on failure the cached blob is served instead, and only
    // when that is missing too does the original failure reach the caller.
    pub async fn list_all(&self) -> Result<Sourced<Vec<T>>, CatalogError> {
        match self.fetch_list().await {
            Ok(items) => {
                self.persist(&items);
                Ok(Sourced::Live(items))
            }
            Err(err) => {
                warn!(kind = %T::KIND, error = %err, "serving catalog from local cache");
                match self.read_cached() {
                    Some(items) => Ok(Sourced::Cached(items)),
                    None => Err(err.into()),
                }
            }
        }
    }

    // Fetch a single item, falling back to a linear search of the cached
    // list. With a cached list that lacks the id the lookup has failed
    // against both sources and reports NotFound; without any cache the
    // original fetch failure propagates, unless the remote itself answered
    // 404.
    pub async fn get_by_id(&self, id: u64) -> Result<Sourced<T>, CatalogError> {
        match self.fetch_item(id).await {
            Ok(item) => Ok(Sourced::Live(item)),
            Err(err) => match self.read_cached() {
                Some(items) => match items.into_iter().find(|item| item.id() == id) {
                    Some(item) => {
                        debug!(kind = %T::KIND, id, "resolved item from cached list");
                        Ok(Sourced::Cached(item))
                    }
                    None => Err(CatalogError::NotFound { kind: T::KIND, id }),
                },
                None if err.is_not_found() => Err(CatalogError::NotFound { kind: T::KIND, id }),
                None => Err(err.into()),
            },
        }
    }

    async fn fetch_list(&self) -> Result<Vec<T>, FetchError> {
        let path = T::KIND.list_path();
        let value = self.api.get_json(path).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Decode {
            path: path.to_owned(),
            source: e,
        })
    }

    async fn fetch_item(&self, id: u64) -> Result<T, FetchError> {
        let path = T::KIND.item_path(id);
        let value = self.api.get_json(&path).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Decode { path, source: e })
    }

    // Losing durability must not fail the fetch that just succeeded.
    fn persist(&self, items: &[T]) {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(kind = %T::KIND, error = %e, "could not serialize catalog snapshot");
                return;
            }
        };
        if let Err(e) = self.store.set(T::KIND.cache_key(), &raw) {
            warn!(kind = %T::KIND, error = %e, "could not persist catalog snapshot");
        }
    }

    // A failed or unreadable cache read is the same as having no cache.
    fn read_cached(&self) -> Option<Vec<T>> {
        let raw = match self.store.get(T::KIND.cache_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(kind = %T::KIND, error = %e, "could not read catalog snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(kind = %T::KIND, error = %e, "discarding unreadable catalog snapshot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use crate::store::{MemoryStore, StoreError};

    // In-process stand-in for the remote API with a kill switch. Unknown
    // paths answer 404; offline mode answers 503 for everything.
    #[derive(Default)]
    struct MockApi {
        responses: Mutex<HashMap<String, Value>>,
        offline: AtomicBool,
    }

    impl MockApi {
        fn new() -> Self {
            Self::default()
        }

        fn respond(&self, path: &str, value: Value) {
            self.responses.lock().insert(path.to_owned(), value);
        }

        fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl InventoryApi for MockApi {
        async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(FetchError::Status {
                    path: path.to_owned(),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                });
            }
            match self.responses.lock().get(path) {
                Some(value) => Ok(value.clone()),
                None => Err(FetchError::Status {
                    path: path.to_owned(),
                    status: reqwest::StatusCode::NOT_FOUND,
                }),
            }
        }
    }

    // Store whose reads and writes always fail, for durability-loss paths.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError {
                key: key.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            let _ = value;
            Err(StoreError {
                key: key.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
    }

    fn flight_json(id: u64, airline: &str) -> Value {
        json!({
            "id": id,
            "airline": airline,
            "departure_city": "Jakarta",
            "arrival_city": "Denpasar",
            "departure_time": "2025-08-01T06:30:00Z",
            "arrival_time": "2025-08-01T09:20:00Z",
            "price": 1_500_000,
            "duration": "1h 50m",
            "image_url": "https://img.example.com/flight.png"
        })
    }

    fn catalog(api: &Arc<MockApi>, store: &Arc<MemoryStore>) -> FlightCatalog {
        CatalogService::new(
            Arc::clone(api) as Arc<dyn InventoryApi>,
            Arc::clone(store) as Arc<dyn KeyValueStore>,
        )
    }

    #[tokio::test]
    async fn test_list_round_trips_through_cache() {
        let api = Arc::new(MockApi::new());
        let store = Arc::new(MemoryStore::new());
        let flights = catalog(&api, &store);

        api.respond("/flights", json!([flight_json(1, "Garuda Indonesia")]));

        let live = flights.list_all().await.unwrap();
        assert!(!live.is_cached());
        let live = live.into_inner();
        assert_eq!(live.len(), 1);

        // Network gone: the exact same collection comes back, marked cached
        api.set_offline(true);
        let fallback = flights.list_all().await.unwrap();
        assert!(fallback.is_cached());
        let fallback = fallback.into_inner();
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].id, live[0].id);
        assert_eq!(fallback[0].airline, live[0].airline);
    }

    #[tokio::test]
    async fn test_refetch_overwrites_instead_of_appending() {
        let api = Arc::new(MockApi::new());
        let store = Arc::new(MemoryStore::new());
        let flights = catalog(&api, &store);

        api.respond(
            "/flights",
            json!([flight_json(1, "Garuda Indonesia"), flight_json(2, "Lion Air")]),
        );
        flights.list_all().await.unwrap();

        api.respond("/flights", json!([flight_json(3, "Citilink")]));
        flights.list_all().await.unwrap();

        api.set_offline(true);
        let cached = flights.list_all().await.unwrap().into_inner();
        assert_eq!(cached.len(), 1, "second snapshot must replace the first");
        assert_eq!(cached[0].id, 3);
    }

    #[tokio::test]
    async fn test_get_by_id_resolves_against_cached_list() {
        let api = Arc::new(MockApi::new());
        let store = Arc::new(MemoryStore::new());
        let flights = catalog(&api, &store);

        api.respond("/flights", json!([flight_json(1, "Garuda Indonesia")]));
        flights.list_all().await.unwrap();

        api.set_offline(true);
        let found = flights.get_by_id(1).await.unwrap();
        assert!(found.is_cached());
        assert_eq!(found.into_inner().id, 1);

        // Cached list exists but has no id 2: the id is missing, not the network
        match flights.get_by_id(2).await {
            Err(CatalogError::NotFound { kind, id }) => {
                assert_eq!(kind, InventoryKind::Flight);
                assert_eq!(id, 2);
            }
            other => panic!("expected NotFound, got {:?}", other.map(|s| s.is_cached())),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_prefers_live_item() {
        let api = Arc::new(MockApi::new());
        let store = Arc::new(MemoryStore::new());
        let flights = catalog(&api, &store);

        api.respond("/flights/1", flight_json(1, "Garuda Indonesia"));
        let item = flights.get_by_id(1).await.unwrap();
        assert!(!item.is_cached());
        assert_eq!(item.into_inner().airline, "Garuda Indonesia");
    }

    #[tokio::test]
    async fn test_offline_with_empty_cache_propagates_fetch_failure() {
        let api = Arc::new(MockApi::new());
        let store = Arc::new(MemoryStore::new());
        let flights = catalog(&api, &store);

        api.set_offline(true);
        match flights.list_all().await {
            Err(CatalogError::Fetch(FetchError::Status { status, .. })) => {
                assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
            }
            other => panic!("expected fetch failure, got {:?}", other.is_ok()),
        }

        // Same for a single item: the request never produced an answer,
        // so this is a fetch failure rather than a missing id
        match flights.get_by_id(1).await {
            Err(CatalogError::Fetch(_)) => {}
            other => panic!("expected fetch failure, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_remote_404_with_empty_cache_is_not_found() {
        let api = Arc::new(MockApi::new());
        let store = Arc::new(MemoryStore::new());
        let flights = catalog(&api, &store);

        match flights.get_by_id(42).await {
            Err(CatalogError::NotFound { id, .. }) => assert_eq!(id, 42),
            other => panic!("expected NotFound, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_treated_as_missing() {
        let api = Arc::new(MockApi::new());
        let store = Arc::new(MemoryStore::new());
        let flights = catalog(&api, &store);

        store
            .set(InventoryKind::Flight.cache_key(), "not json at all")
            .unwrap();

        api.set_offline(true);
        assert!(matches!(
            flights.list_all().await,
            Err(CatalogError::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn test_broken_store_does_not_fail_a_live_fetch() {
        let api = Arc::new(MockApi::new());
        let flights: FlightCatalog = CatalogService::new(
            Arc::clone(&api) as Arc<dyn InventoryApi>,
            Arc::new(BrokenStore),
        );

        api.respond("/flights", json!([flight_json(1, "Garuda Indonesia")]));
        let result = flights.list_all().await.unwrap();
        assert!(!result.is_cached());
        assert_eq!(result.into_inner().len(), 1);
    }

    #[tokio::test]
    async fn test_kinds_use_disjoint_cache_partitions() {
        let api = Arc::new(MockApi::new());
        let store = Arc::new(MemoryStore::new());
        let flights = catalog(&api, &store);
        let hotels: HotelCatalog = CatalogService::new(
            Arc::clone(&api) as Arc<dyn InventoryApi>,
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
        );

        api.respond("/flights", json!([flight_json(1, "Garuda Indonesia")]));
        flights.list_all().await.unwrap();

        // The hotel catalog has no snapshot of its own to fall back on
        api.set_offline(true);
        assert!(hotels.list_all().await.is_err());
        assert!(flights.list_all().await.unwrap().is_cached());
    }
}
