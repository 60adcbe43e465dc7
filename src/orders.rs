// The order ledger and user profile: the durable source of truth for
// everything the user has booked. State lives in memory, is mirrored to the
// key-value store on every mutation, and is restored verbatim at startup.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::store::KeyValueStore;

pub const ORDERS_KEY: &str = "travio_orders";
pub const USER_KEY: &str = "travio_user";

const ORDER_ID_PREFIX: &str = "TRV-";
const AVATAR_BASE: &str = "https://api.dicebear.com/9.x/avataaars/svg";

const DEFAULT_NAME: &str = "Maya Anders";
const DEFAULT_EMAIL: &str = "maya@travio.app";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    Flight,
    Hotel,
    Rental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Success,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberTier {
    Classic,
    Silver,
    Gold,
    Platinum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OrderKind,
    pub title: String,
    pub subtitle: String,
    pub price_per_unit: f64,
    pub total_price: f64,
    pub date_range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_info: Option<String>,
    pub status: OrderStatus,
    pub image: String,
}

// Everything a booking action supplies; id and status are assigned here.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub kind: OrderKind,
    pub title: String,
    pub subtitle: String,
    pub price_per_unit: f64,
    pub total_price: f64,
    pub date_range: String,
    pub duration_info: Option<String>,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub member_level: MemberTier,
}

impl UserProfile {
    fn default_profile() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            email: DEFAULT_EMAIL.to_owned(),
            avatar: avatar_for(DEFAULT_NAME),
            member_level: MemberTier::Gold,
        }
    }
}

// The avatar is a pure function of the name and is never set independently.
pub fn avatar_for(name: &str) -> String {
    format!("{AVATAR_BASE}?seed={name}")
}

struct Ledger {
    orders: Vec<Order>,
    user: UserProfile,
}

// Explicitly constructed and handed to whoever needs it; owns the order list
// and the profile for the life of the process. Mutations are synchronous,
// write through to the store, and tick the revision channel.
pub struct OrderStore {
    state: RwLock<Ledger>,
    store: Arc<dyn KeyValueStore>,
    revision: watch::Sender<u64>,
}

impl OrderStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let orders = restore(store.as_ref(), ORDERS_KEY).unwrap_or_default();
        let user = restore(store.as_ref(), USER_KEY).unwrap_or_else(UserProfile::default_profile);
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(Ledger { orders, user }),
            store,
            revision,
        }
    }

    // Cloned snapshot, most recent order first.
    pub fn orders(&self) -> Vec<Order> {
        self.state.read().orders.clone()
    }

    pub fn user(&self) -> UserProfile {
        self.state.read().user.clone()
    }

    // The receiver ticks after every order or profile mutation; both belong
    // to one consistency domain and share the channel.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn add_order(&self, draft: OrderDraft) -> Order {
        let mut state = self.state.write();
        let order = Order {
            id: next_order_id(&state.orders),
            kind: draft.kind,
            title: draft.title,
            subtitle: draft.subtitle,
            price_per_unit: draft.price_per_unit,
            total_price: draft.total_price,
            date_range: draft.date_range,
            duration_info: draft.duration_info,
            status: OrderStatus::Pending,
            image: draft.image,
        };
        state.orders.insert(0, order.clone());
        self.persist(ORDERS_KEY, &state.orders);
        drop(state);
        self.notify();
        order
    }

    // An unknown id is ignored; the ledger never raises on a stale reference.
    pub fn update_order_status(&self, id: &str, status: OrderStatus) {
        let mut state = self.state.write();
        match state.orders.iter_mut().find(|order| order.id == id) {
            Some(order) => order.status = status,
            None => {
                debug!(id, "ignoring status update for unknown order");
                return;
            }
        }
        self.persist(ORDERS_KEY, &state.orders);
        drop(state);
        self.notify();
    }

    pub fn update_user_profile(&self, name: &str, email: &str) {
        let mut state = self.state.write();
        state.user.name = name.to_owned();
        state.user.email = email.to_owned();
        state.user.avatar = avatar_for(name);
        self.persist(USER_KEY, &state.user);
        drop(state);
        self.notify();
    }

    // Losing durability is less severe than failing the booking action, so
    // store failures end here.
    fn persist<V: Serialize>(&self, key: &str, value: &V) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "could not serialize ledger state");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &raw) {
            warn!(key, error = %e, "could not persist ledger state");
        }
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

// Absent and unreadable restore the same way; a corrupt blob must not keep
// the client from starting.
fn restore<V: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<V> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "could not read ledger state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable ledger state");
            None
        }
    }
}

// Booking references keep the TRV- prefix plus the last six digits of the
// creation time in milliseconds. Two bookings can land in the same
// millisecond, so the suffix is bumped until it is unique in the list.
fn next_order_id(existing: &[Order]) -> String {
    let mut suffix = (Utc::now().timestamp_millis() % 1_000_000) as u32;
    loop {
        let id = format!("{ORDER_ID_PREFIX}{suffix:06}");
        if !existing.iter().any(|order| order.id == id) {
            return id;
        }
        suffix = (suffix + 1) % 1_000_000;
    }
}
