// Server-owned inventory records mirrored by the offline cache. The client
// never mutates these; it only reads and caches whole-collection snapshots.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// Category of bookable item. Each kind has its own schema, endpoints and
// cache partition, so staleness in one catalog never affects another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryKind {
    Flight,
    Hotel,
    Rental,
}

impl InventoryKind {
    pub fn cache_key(self) -> &'static str {
        match self {
            InventoryKind::Flight => "offline_flights",
            InventoryKind::Hotel => "offline_hotels",
            InventoryKind::Rental => "offline_rentals",
        }
    }

    pub fn list_path(self) -> &'static str {
        match self {
            InventoryKind::Flight => "/flights",
            InventoryKind::Hotel => "/hotels",
            InventoryKind::Rental => "/rentals",
        }
    }

    pub fn item_path(self, id: u64) -> String {
        format!("{}/{}", self.list_path(), id)
    }
}

impl std::fmt::Display for InventoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            InventoryKind::Flight => "flight",
            InventoryKind::Hotel => "hotel",
            InventoryKind::Rental => "rental",
        })
    }
}

// Ties an item type to its kind and its numeric identifier (unique per kind).
pub trait CatalogItem: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    const KIND: InventoryKind;

    fn id(&self) -> u64;
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Flight {
    pub id: u64,
    pub airline: String,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: f64,
    pub duration: String,
    pub image_url: String,
}

impl CatalogItem for Flight {
    const KIND: InventoryKind = InventoryKind::Flight;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotelLocation {
    pub id: u64,
    pub city: String,
    pub country: String,
    pub hotel_id: u64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotelFacility {
    pub facility: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Hotel {
    pub id: u64,
    pub name: String,
    pub rating: f64,
    pub price_per_night: f64,
    pub image_url: String,
    pub hotel_locations: Vec<HotelLocation>,
    pub hotel_facilities: Vec<HotelFacility>,
}

impl CatalogItem for Hotel {
    const KIND: InventoryKind = InventoryKind::Hotel;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RentalLocation {
    pub id: u64,
    pub city: String,
    pub country: String,
    pub rental_id: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Rental {
    pub id: u64,
    pub company_name: String,
    pub car_model: String,
    pub price_per_day: f64,
    pub availability: String,
    pub image_url: String,
    pub rental_locations: Vec<RentalLocation>,
}

impl CatalogItem for Rental {
    const KIND: InventoryKind = InventoryKind::Rental;

    fn id(&self) -> u64 {
        self.id
    }
}
