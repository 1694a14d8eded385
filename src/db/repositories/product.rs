use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::products;

#[derive(Debug, Clone)]
pub struct Product {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub created_at: String,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            price: model.price,
            image: model.image,
            created_at: model.created_at,
        }
    }
}

/// Fields for a new product row. The site itself never writes products;
/// this exists for seeding and tests.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<Product>> {
        let rows = products::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list products")?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Case-insensitive substring match on the title. `LIKE '%q%'`, which on
    /// SQLite is case-insensitive for ASCII. No ranking, no pagination.
    pub async fn search_by_title(&self, query: &str) -> Result<Vec<Product>> {
        let rows = products::Entity::find()
            .filter(products::Column::Title.contains(query))
            .all(&self.conn)
            .await
            .context("Failed to search products by title")?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn insert(&self, product: NewProduct) -> Result<Product> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = products::ActiveModel {
            title: Set(product.title),
            description: Set(product.description),
            price: Set(product.price),
            image: Set(product.image),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert product")?;

        Ok(Product::from(model))
    }
}
