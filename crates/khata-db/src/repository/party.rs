//! # Party Repository
//!
//! Customers and vendors. Documents only read parties; contact management
//! owns the writes.

use chrono::{DateTime, Utc};
use khata_core::{Address, Money, Party, PartyKind};
use sqlx::SqlitePool;
use tracing::debug;

use super::like_pattern;
use crate::error::DbResult;

const SELECT_PARTIES: &str = r#"
    SELECT
        id, kind, name, business_name, phone, email,
        billing_line, billing_city, billing_state, billing_postal_code, billing_country,
        shipping_line, shipping_city, shipping_state, shipping_postal_code, shipping_country,
        gstin, opening_balance_cents, created_at, updated_at
    FROM parties
"#;

/// Raw `parties` row.
#[derive(Debug, sqlx::FromRow)]
struct PartyRow {
    id: String,
    kind: PartyKind,
    name: String,
    business_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    billing_line: Option<String>,
    billing_city: Option<String>,
    billing_state: Option<String>,
    billing_postal_code: Option<String>,
    billing_country: Option<String>,
    shipping_line: Option<String>,
    shipping_city: Option<String>,
    shipping_state: Option<String>,
    shipping_postal_code: Option<String>,
    shipping_country: Option<String>,
    gstin: Option<String>,
    opening_balance_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PartyRow> for Party {
    fn from(row: PartyRow) -> Self {
        let shipping = Address {
            line: row.shipping_line,
            city: row.shipping_city,
            state: row.shipping_state,
            postal_code: row.shipping_postal_code,
            country: row.shipping_country,
        };

        Party {
            id: row.id,
            kind: row.kind,
            name: row.name,
            business_name: row.business_name,
            phone: row.phone,
            email: row.email,
            billing_address: Address {
                line: row.billing_line,
                city: row.billing_city,
                state: row.billing_state,
                postal_code: row.billing_postal_code,
                country: row.billing_country,
            },
            shipping_address: Some(shipping).filter(|a| !a.is_empty()),
            gstin: row.gstin,
            opening_balance: Money::from_minor(row.opening_balance_cents),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for party database operations.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    /// Creates a new PartyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    /// Gets a party by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Party>> {
        let sql = format!("{SELECT_PARTIES} WHERE id = ?1");

        let row = sqlx::query_as::<_, PartyRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Party::from))
    }

    /// Name / business name search. Empty query lists everyone.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Party>> {
        let query = query.trim();
        debug!(query = %query, "Searching parties");

        let rows = if query.is_empty() {
            let sql = format!("{SELECT_PARTIES} ORDER BY name, id");
            sqlx::query_as::<_, PartyRow>(&sql)
                .fetch_all(&self.pool)
                .await?
        } else {
            let sql = format!(
                r#"{SELECT_PARTIES}
                WHERE name LIKE ?1 ESCAPE '\'
                   OR business_name LIKE ?1 ESCAPE '\'
                   OR phone LIKE ?1 ESCAPE '\'
                   OR gstin LIKE ?1 ESCAPE '\'
                ORDER BY name, id
                "#
            );
            sqlx::query_as::<_, PartyRow>(&sql)
                .bind(like_pattern(query))
                .fetch_all(&self.pool)
                .await?
        };

        Ok(rows.into_iter().map(Party::from).collect())
    }

    /// Inserts a new party.
    pub async fn insert(&self, party: &Party) -> DbResult<()> {
        debug!(id = %party.id, name = %party.name, "Inserting party");

        let billing = &party.billing_address;
        let shipping = party.shipping_address.clone().unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO parties (
                id, kind, name, business_name, phone, email,
                billing_line, billing_city, billing_state, billing_postal_code, billing_country,
                shipping_line, shipping_city, shipping_state, shipping_postal_code, shipping_country,
                gstin, opening_balance_cents, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&party.id)
        .bind(party.kind)
        .bind(&party.name)
        .bind(&party.business_name)
        .bind(&party.phone)
        .bind(&party.email)
        .bind(&billing.line)
        .bind(&billing.city)
        .bind(&billing.state)
        .bind(&billing.postal_code)
        .bind(&billing.country)
        .bind(shipping.line)
        .bind(shipping.city)
        .bind(shipping.state)
        .bind(shipping.postal_code)
        .bind(shipping.country)
        .bind(&party.gstin)
        .bind(party.opening_balance.minor())
        .bind(party.created_at)
        .bind(party.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn party(name: &str, shipping: Option<Address>) -> Party {
        Party {
            id: crate::repository::generate_id(),
            kind: PartyKind::Customer,
            name: name.to_string(),
            business_name: Some(format!("{} Enterprises", name)),
            phone: Some("9820012345".to_string()),
            email: None,
            billing_address: Address {
                line: Some("4 Market Yard".to_string()),
                city: Some("Pune".to_string()),
                state: Some("Maharashtra".to_string()),
                postal_code: Some("411037".to_string()),
                country: Some("India".to_string()),
            },
            shipping_address: shipping,
            gstin: Some("27AAPFU0939F1ZV".to_string()),
            opening_balance: Money::from_minor(150_000),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_round_trip_addresses() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let with_ship = party(
            "Meera",
            Some(Address {
                line: Some("Gate 2, MIDC".to_string()),
                city: Some("Chakan".to_string()),
                ..Address::default()
            }),
        );
        let without_ship = party("Arjun", None);

        db.parties().insert(&with_ship).await.unwrap();
        db.parties().insert(&without_ship).await.unwrap();

        let loaded = db.parties().get_by_id(&with_ship.id).await.unwrap().unwrap();
        assert_eq!(loaded.billing_address, with_ship.billing_address);
        assert_eq!(loaded.shipping_address, with_ship.shipping_address);
        assert_eq!(loaded.opening_balance.minor(), 150_000);

        let loaded = db.parties().get_by_id(&without_ship.id).await.unwrap().unwrap();
        assert!(loaded.shipping_address.is_none());
        assert_eq!(loaded.ship_to(), &loaded.billing_address);
    }

    #[tokio::test]
    async fn test_search() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.parties().insert(&party("Meera", None)).await.unwrap();
        db.parties().insert(&party("Arjun", None)).await.unwrap();

        let all = db.parties().search("").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Arjun");

        let found = db.parties().search("meera ent").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(db.parties().get_by_id("nope").await.unwrap().is_none());
    }
}
