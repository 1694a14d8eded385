use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

use crate::entities::reports;

#[derive(Debug, Clone)]
pub struct Report {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub subject: String,
    pub message: String,
    pub created_at: String,
}

impl From<reports::Model> for Report {
    fn from(model: reports::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            subject: model.subject,
            message: model.message,
            created_at: model.created_at,
        }
    }
}

/// A validated report submission ready for persistence.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub subject: String,
    pub message: String,
}

pub struct ReportRepository {
    conn: DatabaseConnection,
}

impl ReportRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, report: NewReport) -> Result<Report> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = reports::ActiveModel {
            name: Set(report.name),
            email: Set(report.email),
            phone: Set(report.phone),
            address: Set(report.address),
            subject: Set(report.subject),
            message: Set(report.message),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert report")?;

        Ok(Report::from(model))
    }

    pub async fn list_all(&self) -> Result<Vec<Report>> {
        let rows = reports::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list reports")?;

        Ok(rows.into_iter().map(Report::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        let count = reports::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count reports")?;

        Ok(count)
    }
}
