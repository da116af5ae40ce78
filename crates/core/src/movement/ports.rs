//! Collaborator ports.
//!
//! The engine consumes a location/warehouse directory, an item directory and
//! a stock-availability oracle, and hands completed movements to an
//! inventory sink. All four are async traits so callers can back them with
//! HTTP clients, databases or in-process fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockflow_shared::types::{ItemId, LocationId, SiteId, UnitOfMeasure, WarehouseId};
use thiserror::Error;

use crate::movement::service::InventoryIntent;

/// Errors raised by a collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator could not be reached.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator did not answer in time.
    #[error("Collaborator timed out after {0:?}")]
    Timeout(Duration),

    /// The collaborator answered with a refusal.
    #[error("Collaborator rejected the request: {0}")]
    Rejected(String),
}

/// A storage location inside a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Location id.
    pub id: LocationId,
    /// Warehouse the location belongs to.
    pub warehouse_id: WarehouseId,
    /// Short code, e.g. `A-01-03`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Inactive locations are kept for history only.
    pub is_active: bool,
}

/// A warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    /// Warehouse id.
    pub id: WarehouseId,
    /// Site the warehouse belongs to.
    pub site_id: SiteId,
    /// Short code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Inactive warehouses are kept for history only.
    pub is_active: bool,
}

/// A stocked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item id.
    pub id: ItemId,
    /// Stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Unit the item is normally counted in.
    pub default_unit: UnitOfMeasure,
}

/// Location and warehouse lookups.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// Looks up a location.
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, CollaboratorError>;

    /// Looks up a warehouse.
    async fn get_warehouse(&self, id: WarehouseId)
    -> Result<Option<Warehouse>, CollaboratorError>;
}

#[async_trait]
impl<T: LocationDirectory + ?Sized> LocationDirectory for Arc<T> {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, CollaboratorError> {
        (**self).get_location(id).await
    }

    async fn get_warehouse(
        &self,
        id: WarehouseId,
    ) -> Result<Option<Warehouse>, CollaboratorError> {
        (**self).get_warehouse(id).await
    }
}

/// Item lookups.
#[async_trait]
pub trait ItemDirectory: Send + Sync {
    /// Looks up an item.
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, CollaboratorError>;
}

/// Answers "is quantity Q of item I available at location L".
///
/// A pre-check only; nothing is reserved.
#[async_trait]
pub trait StockOracle: Send + Sync {
    /// Returns true when at least `quantity` of `item_id` is on hand.
    async fn has_available_stock(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        quantity: Decimal,
    ) -> Result<bool, CollaboratorError>;
}

/// Applies the stock changes of a completed movement.
///
/// Called exactly once per completion.
#[async_trait]
pub trait InventorySink: Send + Sync {
    /// Books the deltas.
    async fn apply_movement_deltas(&self, intent: &InventoryIntent)
    -> Result<(), CollaboratorError>;
}

/// Caching decorator over a [`LocationDirectory`].
///
/// Only hits are cached; a missing location is asked for again next time.
/// Errors are never cached.
pub struct CachedLocationDirectory<D> {
    inner: D,
    locations: Cache<LocationId, Arc<Location>>,
    warehouses: Cache<WarehouseId, Arc<Warehouse>>,
}

impl<D: LocationDirectory> CachedLocationDirectory<D> {
    /// Wraps `inner` with a cache of `capacity` entries per kind living `ttl`.
    #[must_use]
    pub fn new(inner: D, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            locations: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            warehouses: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        self.locations.invalidate_all();
        self.warehouses.invalidate_all();
    }

    /// Drops one cached location.
    pub async fn invalidate_location(&self, id: LocationId) {
        self.locations.invalidate(&id).await;
    }
}

#[async_trait]
impl<D: LocationDirectory> LocationDirectory for CachedLocationDirectory<D> {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, CollaboratorError> {
        if let Some(cached) = self.locations.get(&id).await {
            return Ok(Some((*cached).clone()));
        }
        let found = self.inner.get_location(id).await?;
        if let Some(location) = &found {
            self.locations.insert(id, Arc::new(location.clone())).await;
        }
        Ok(found)
    }

    async fn get_warehouse(
        &self,
        id: WarehouseId,
    ) -> Result<Option<Warehouse>, CollaboratorError> {
        if let Some(cached) = self.warehouses.get(&id).await {
            return Ok(Some((*cached).clone()));
        }
        let found = self.inner.get_warehouse(id).await?;
        if let Some(warehouse) = &found {
            self.warehouses.insert(id, Arc::new(warehouse.clone())).await;
        }
        Ok(found)
    }
}
