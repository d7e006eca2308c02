//! Market catalog, inventory, buying, selling and admin item grants

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::bestiary::Rarity;
use super::players::PlayerService;
use super::wallet;
use super::GameError;

/// Name of the catalog entry that converts straight into mana crystals
pub const MANA_PACK: &str = "Mana Crystal Pack";
/// Mana crystals granted by one pack
pub const MANA_PACK_AMOUNT: i64 = 10;

/// An item for sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketItem {
    pub name: &'static str,
    pub price: i64,
    pub description: &'static str,
    pub item_type: &'static str,
    pub rarity: Rarity,
}

const CATALOG: [MarketItem; 8] = [
    MarketItem {
        name: "Summoning Orb",
        price: 250,
        description: "Summon a new beast",
        item_type: "Consumable",
        rarity: Rarity::Common,
    },
    MarketItem {
        name: "Training Manual",
        price: 100,
        description: "Gain 30-50 EXP for a beast",
        item_type: "Consumable",
        rarity: Rarity::Common,
    },
    MarketItem {
        name: "Health Potion",
        price: 75,
        description: "Increase beast health by 10-20",
        item_type: "Consumable",
        rarity: Rarity::Common,
    },
    MarketItem {
        name: "Power Potion",
        price: 85,
        description: "Increase beast power by 2-5",
        item_type: "Consumable",
        rarity: Rarity::Common,
    },
    MarketItem {
        name: "Magic Potion",
        price: 85,
        description: "Increase beast magic by 2-5",
        item_type: "Consumable",
        rarity: Rarity::Common,
    },
    MarketItem {
        name: MANA_PACK,
        price: 200,
        description: "Get 10 Mana Crystals",
        item_type: "Consumable",
        rarity: Rarity::Common,
    },
    MarketItem {
        name: "Element Stone",
        price: 500,
        description: "Change a beast's element",
        item_type: "Consumable",
        rarity: Rarity::Rare,
    },
    MarketItem {
        name: "Evolution Essence",
        price: 1000,
        description: "Required for beast evolution",
        item_type: "Material",
        rarity: Rarity::Epic,
    },
];

/// Everything the market sells
pub fn catalog() -> &'static [MarketItem] {
    &CATALOG
}

/// Look up a catalog entry by name, ignoring case
pub fn find_item(name: &str) -> Option<&'static MarketItem> {
    let name = name.trim();
    CATALOG.iter().find(|item| item.name.eq_ignore_ascii_case(name))
}

/// Price paid for one unit: half the market price for catalog items,
/// otherwise a fixed value by rarity
pub fn sell_price(item_name: &str, rarity: Rarity) -> i64 {
    match CATALOG.iter().find(|item| item.name == item_name) {
        Some(item) => item.price / 2,
        None => rarity.sell_value(),
    }
}

/// An inventory row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub inventory_id: i64,
    pub item_name: String,
    pub item_type: String,
    pub rarity: Rarity,
    pub quantity: i64,
}

/// Result of a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseResult {
    pub item: MarketItem,
    pub balance: i64,
    /// None when the item converted into mana crystals
    pub added: Option<InventoryItem>,
    pub mana_added: i64,
}

/// Result of selling one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleResult {
    pub item_name: String,
    pub price: i64,
    pub balance: i64,
    pub remaining_quantity: i64,
}

/// Result of an admin grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiveResult {
    pub item_name: String,
    pub quantity: i64,
    pub recipient: i64,
}

/// Market and inventory operations
pub struct MarketService {
    pool: SqlitePool,
}

impl MarketService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inventory of `user_id`, ordered by rarity then name
    pub async fn inventory(&self, user_id: i64) -> Result<Vec<InventoryItem>, GameError> {
        let rows: Vec<InventoryRow> = sqlx::query_as(
            r#"
            SELECT inventory_id, item_name, item_type, rarity, quantity
            FROM inventory WHERE user_id = ?
            ORDER BY item_name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        // Rarity is stored as text, so order by tier here
        let mut items = rows
            .into_iter()
            .map(InventoryRow::into_item)
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by_key(|item| item.rarity);
        Ok(items)
    }

    /// Buy one unit of a catalog item by name
    pub async fn buy(&self, user_id: i64, name: &str) -> Result<PurchaseResult, GameError> {
        let item = *find_item(name).ok_or_else(|| GameError::ItemNotFound(name.trim().to_string()))?;

        let mut tx = self.pool.begin().await?;
        PlayerService::get_or_create_with(&mut tx, user_id).await?;
        let balance = wallet::debit(&mut tx, user_id, item.price, "market purchase").await?;

        let (added, mana_added) = if item.name == MANA_PACK {
            sqlx::query("UPDATE players SET mana_crystals = mana_crystals + ? WHERE user_id = ?")
                .bind(MANA_PACK_AMOUNT)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            (None, MANA_PACK_AMOUNT)
        } else {
            let result = sqlx::query(
                "INSERT INTO inventory (user_id, item_name, item_type, rarity) VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(item.name)
            .bind(item.item_type)
            .bind(item.rarity.as_str())
            .execute(&mut *tx)
            .await?;
            let added = InventoryItem {
                inventory_id: result.last_insert_rowid(),
                item_name: item.name.to_string(),
                item_type: item.item_type.to_string(),
                rarity: item.rarity,
                quantity: 1,
            };
            (Some(added), 0)
        };

        tx.commit().await?;
        info!("Player {} bought {} for {}", user_id, item.name, item.price);

        Ok(PurchaseResult {
            item,
            balance,
            added,
            mana_added,
        })
    }

    /// Sell one unit of an inventory row
    pub async fn sell(&self, user_id: i64, inventory_id: i64) -> Result<SaleResult, GameError> {
        let mut tx = self.pool.begin().await?;
        let item = fetch_owned(&mut tx, user_id, inventory_id)
            .await?
            .ok_or(GameError::InventoryItemNotFound(inventory_id))?;
        let price = sell_price(&item.item_name, item.rarity);

        if item.quantity > 1 {
            sqlx::query("UPDATE inventory SET quantity = quantity - 1 WHERE inventory_id = ?")
                .bind(inventory_id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("DELETE FROM inventory WHERE inventory_id = ?")
                .bind(inventory_id)
                .execute(&mut *tx)
                .await?;
        }
        let balance = wallet::credit(&mut tx, user_id, price, "market sale").await?;

        tx.commit().await?;
        info!("Player {} sold {} for {}", user_id, item.item_name, price);

        Ok(SaleResult {
            item_name: item.item_name,
            price,
            balance,
            remaining_quantity: item.quantity - 1,
        })
    }

    /// Copy inventory row `inventory_id` to `recipient`. Adds to the
    /// recipient's quantity when they already hold that row.
    pub async fn give(
        &self,
        inventory_id: i64,
        quantity: i64,
        recipient: i64,
    ) -> Result<GiveResult, GameError> {
        if quantity <= 0 {
            return Err(GameError::InvalidChoice(format!("quantity {}", quantity)));
        }

        let mut tx = self.pool.begin().await?;
        let item_name: Option<(String,)> =
            sqlx::query_as("SELECT item_name FROM inventory WHERE inventory_id = ?")
                .bind(inventory_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (item_name,) = item_name.ok_or(GameError::InventoryItemNotFound(inventory_id))?;

        PlayerService::get_or_create_with(&mut tx, recipient).await?;

        let updated = sqlx::query(
            "UPDATE inventory SET quantity = quantity + ? WHERE inventory_id = ? AND user_id = ?",
        )
        .bind(quantity)
        .bind(inventory_id)
        .bind(recipient)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            sqlx::query(
                r#"
                INSERT INTO inventory (user_id, item_name, item_type, rarity, quantity)
                SELECT ?, item_name, item_type, rarity, ?
                FROM inventory WHERE inventory_id = ?
                "#,
            )
            .bind(recipient)
            .bind(quantity)
            .bind(inventory_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Gave {}x {} to {}", quantity, item_name, recipient);

        Ok(GiveResult {
            item_name,
            quantity,
            recipient,
        })
    }
}

async fn fetch_owned(
    conn: &mut SqliteConnection,
    user_id: i64,
    inventory_id: i64,
) -> Result<Option<InventoryItem>, GameError> {
    let row: Option<InventoryRow> = sqlx::query_as(
        r#"
        SELECT inventory_id, item_name, item_type, rarity, quantity
        FROM inventory WHERE inventory_id = ? AND user_id = ?
        "#,
    )
    .bind(inventory_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(InventoryRow::into_item).transpose()
}

/// Row type for SQLite queries
#[derive(sqlx::FromRow)]
struct InventoryRow {
    inventory_id: i64,
    item_name: String,
    item_type: String,
    rarity: String,
    quantity: i64,
}

impl InventoryRow {
    fn into_item(self) -> Result<InventoryItem, GameError> {
        let rarity = self
            .rarity
            .parse()
            .map_err(|_| GameError::Corrupt(format!("inventory {} rarity", self.inventory_id)))?;
        Ok(InventoryItem {
            inventory_id: self.inventory_id,
            item_name: self.item_name,
            item_type: self.item_type,
            rarity,
            quantity: self.quantity,
        })
    }
}
