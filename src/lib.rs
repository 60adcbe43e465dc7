// Offline-resilient data-access core for the Travio travel-booking client

// One module per component
pub mod api_client;
pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod store;

// Re-export key types for convenience
pub use api_client::{ApiClient, ClientConfig, FetchError, InventoryApi, DEFAULT_BASE_URL};
pub use catalog::{
    CatalogError, CatalogService, FlightCatalog, HotelCatalog, RentalCatalog, Sourced,
};
pub use inventory::{
    CatalogItem, Flight, Hotel, HotelFacility, HotelLocation, InventoryKind, Rental,
    RentalLocation,
};
pub use orders::{
    avatar_for, MemberTier, Order, OrderDraft, OrderKind, OrderStatus, OrderStore, UserProfile,
    ORDERS_KEY, USER_KEY,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
