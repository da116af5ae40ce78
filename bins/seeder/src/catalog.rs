//! In-process stand-ins for the location, item and inventory services.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::info;

use stockflow_core::movement::{
    CollaboratorError, InventoryIntent, InventorySink, Item, ItemDirectory, Location,
    LocationDirectory, StockOracle, Warehouse,
};
use stockflow_shared::types::{ItemId, LocationId, SiteId, UnitOfMeasure, WarehouseId};

/// A single demo warehouse with a handful of locations and items.
pub struct Catalog {
    pub warehouse: Warehouse,
    locations: HashMap<LocationId, Location>,
    items: HashMap<ItemId, Item>,
}

impl Catalog {
    pub fn demo() -> Self {
        let warehouse = Warehouse {
            id: WarehouseId::new(),
            site_id: SiteId::new(),
            code: "WH-MAIN".into(),
            name: "Main warehouse".into(),
            is_active: true,
        };

        let locations = [
            ("DOCK-IN", "Receiving dock"),
            ("A-01-01", "Aisle A bay 1"),
            ("A-02-01", "Aisle A bay 2"),
            ("DOCK-OUT", "Shipping dock"),
        ]
        .into_iter()
        .map(|(code, name)| {
            let location = Location {
                id: LocationId::new(),
                warehouse_id: warehouse.id,
                code: code.into(),
                name: name.into(),
                is_active: true,
            };
            (location.id, location)
        })
        .collect();

        let items = [
            ("SKU-1001", "Pallet wrap", UnitOfMeasure::Each),
            ("SKU-2040", "Bolts M8", UnitOfMeasure::Box),
            ("SKU-3300", "Hydraulic oil", UnitOfMeasure::Liter),
        ]
        .into_iter()
        .map(|(sku, name, default_unit)| {
            let item = Item {
                id: ItemId::new(),
                sku: sku.into(),
                name: name.into(),
                default_unit,
            };
            (item.id, item)
        })
        .collect();

        Self {
            warehouse,
            locations,
            items,
        }
    }

    /// Location id for a code. Codes are fixed by [`Self::demo`].
    pub fn location(&self, code: &str) -> Option<LocationId> {
        self.locations
            .values()
            .find(|location| location.code == code)
            .map(|location| location.id)
    }

    /// Item id for a SKU.
    pub fn item(&self, sku: &str) -> Option<&Item> {
        self.items.values().find(|item| item.sku == sku)
    }
}

#[async_trait]
impl LocationDirectory for Catalog {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, CollaboratorError> {
        Ok(self.locations.get(&id).cloned())
    }

    async fn get_warehouse(
        &self,
        id: WarehouseId,
    ) -> Result<Option<Warehouse>, CollaboratorError> {
        Ok((id == self.warehouse.id).then(|| self.warehouse.clone()))
    }
}

#[async_trait]
impl ItemDirectory for Catalog {
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, CollaboratorError> {
        Ok(self.items.get(&id).cloned())
    }
}

/// On-hand balances per item and location.
///
/// Answers stock questions and absorbs the deltas of completed movements.
#[derive(Default)]
pub struct Ledger {
    on_hand: DashMap<(ItemId, LocationId), Decimal>,
}

impl Ledger {
    pub fn receive(&self, item_id: ItemId, location_id: LocationId, quantity: Decimal) {
        *self.on_hand.entry((item_id, location_id)).or_default() += quantity;
    }

    pub fn balance(&self, item_id: ItemId, location_id: LocationId) -> Decimal {
        self.on_hand
            .get(&(item_id, location_id))
            .map_or(Decimal::ZERO, |balance| *balance)
    }
}

#[async_trait]
impl StockOracle for Ledger {
    async fn has_available_stock(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        quantity: Decimal,
    ) -> Result<bool, CollaboratorError> {
        Ok(self.balance(item_id, location_id) >= quantity)
    }
}

#[async_trait]
impl InventorySink for Ledger {
    async fn apply_movement_deltas(
        &self,
        intent: &InventoryIntent,
    ) -> Result<(), CollaboratorError> {
        for delta in &intent.deltas {
            let balance = self.balance(delta.item_id, delta.location_id) + delta.quantity;
            if balance < Decimal::ZERO && !intent.allows_negative_stock {
                return Err(CollaboratorError::Rejected(format!(
                    "item {} would go negative at {}",
                    delta.item_id, delta.location_id
                )));
            }
        }

        for delta in &intent.deltas {
            self.receive(delta.item_id, delta.location_id, delta.quantity);
        }
        info!(
            movement_id = %intent.movement_id,
            movement_type = %intent.movement_type,
            deltas = intent.deltas.len(),
            "Inventory updated"
        );
        Ok(())
    }
}
