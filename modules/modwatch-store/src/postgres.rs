//! Postgres-backed store. One table per entity kind, each with a unique
//! index on its identity field; that index is what rejects the losing
//! writer when a job run and a manual API call race on the same key.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use modwatch_common::{
    Alert, ContentRecord, ContentType, Incident, ModwatchError,
};

use crate::traits::{
    apply_update, ContentStore, DirectoryStore, IncidentStore, IncidentUpdate, InsertOutcome,
    Result,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id UUID PRIMARY KEY,
        post_id TEXT NOT NULL UNIQUE,
        author_id TEXT,
        body TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id UUID PRIMARY KEY,
        comment_id TEXT NOT NULL UNIQUE,
        parent_id TEXT,
        author_id TEXT,
        body TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id UUID PRIMARY KEY,
        message_id TEXT NOT NULL UNIQUE,
        author_id TEXT,
        body TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS incidents (
        id UUID PRIMARY KEY,
        incident_id TEXT NOT NULL UNIQUE,
        content_id TEXT NOT NULL,
        content_type TEXT NOT NULL,
        author_id TEXT NOT NULL,
        severity_level TEXT NOT NULL,
        status TEXT NOT NULL,
        ts TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS alerts (
        id UUID PRIMARY KEY,
        alert_id TEXT NOT NULL UNIQUE,
        incident_id TEXT NOT NULL,
        admin_id TEXT,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS schools (
        id UUID PRIMARY KEY,
        school_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL UNIQUE,
        username TEXT,
        school_id TEXT
    )",
];

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await
            .map_err(db_err)?;
        Ok(Self { pool })
    }

    /// Idempotent schema pass, run once at startup.
    pub async fn migrate(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await.map_err(db_err)?;
        }
        tracing::info!("Schema migration complete");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn content_table(content_type: ContentType) -> &'static str {
        match content_type {
            ContentType::Post => "posts",
            ContentType::Comment => "comments",
            ContentType::Message => "messages",
        }
    }
}

fn db_err(e: sqlx::Error) -> ModwatchError {
    ModwatchError::Database(e.to_string())
}

#[derive(sqlx::FromRow)]
struct IncidentRow {
    incident_id: String,
    content_id: String,
    content_type: String,
    author_id: String,
    severity_level: String,
    status: String,
    ts: DateTime<Utc>,
}

impl TryFrom<IncidentRow> for Incident {
    type Error = ModwatchError;

    fn try_from(row: IncidentRow) -> Result<Self> {
        Ok(Incident {
            incident_id: row.incident_id,
            content_id: row.content_id,
            content_type: row.content_type.parse()?,
            author_id: row.author_id,
            severity_level: row.severity_level.parse()?,
            status: row.status.parse()?,
            timestamp: row.ts,
        })
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn insert_content(&self, record: &ContentRecord) -> Result<InsertOutcome> {
        let table = Self::content_table(record.content_type);
        let id_field = record.content_type.identity_field();

        let query = if record.content_type == ContentType::Comment {
            format!(
                "INSERT INTO {table} (id, {id_field}, parent_id, author_id, body, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT ({id_field}) DO NOTHING"
            )
        } else {
            format!(
                "INSERT INTO {table} (id, {id_field}, author_id, body, created_at)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT ({id_field}) DO NOTHING"
            )
        };

        let mut q = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(&record.content_id);
        if record.content_type == ContentType::Comment {
            q = q.bind(&record.parent_id);
        }
        let result = q
            .bind(&record.author_id)
            .bind(&record.body)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn content_exists(&self, content_type: ContentType, content_id: &str) -> Result<bool> {
        let table = Self::content_table(content_type);
        let id_field = content_type.identity_field();
        let row = sqlx::query_as::<_, (i64,)>(&format!(
            "SELECT COUNT(*) FROM {table} WHERE {id_field} = $1"
        ))
        .bind(content_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.0 > 0)
    }

    async fn count_content(&self, content_type: ContentType) -> Result<i64> {
        let table = Self::content_table(content_type);
        let row = sqlx::query_as::<_, (i64,)>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.0)
    }
}

#[async_trait]
impl IncidentStore for PgStore {
    async fn create_incident(&self, incident: &Incident) -> Result<()> {
        incident.validate()?;

        let result = sqlx::query(
            "INSERT INTO incidents
                 (id, incident_id, content_id, content_type, author_id, severity_level, status, ts)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(&incident.incident_id)
        .bind(&incident.content_id)
        .bind(incident.content_type.to_string())
        .bind(&incident.author_id)
        .bind(incident.severity_level.to_string())
        .bind(incident.status.to_string())
        .bind(incident.timestamp)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_database_error()
                    .is_some_and(|d| d.is_unique_violation())
                {
                    Err(ModwatchError::Conflict(format!(
                        "incident '{}' already exists",
                        incident.incident_id
                    )))
                } else {
                    Err(db_err(e))
                }
            }
        }
    }

    async fn incident_exists(&self, incident_id: &str) -> Result<bool> {
        let row = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM incidents WHERE incident_id = $1",
        )
        .bind(incident_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.0 > 0)
    }

    async fn get_incident(&self, incident_id: &str) -> Result<Option<Incident>> {
        let row = sqlx::query_as::<_, IncidentRow>(
            "SELECT incident_id, content_id, content_type, author_id, severity_level, status, ts
             FROM incidents WHERE incident_id = $1",
        )
        .bind(incident_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Incident::try_from).transpose()
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>> {
        let rows = sqlx::query_as::<_, IncidentRow>(
            "SELECT incident_id, content_id, content_type, author_id, severity_level, status, ts
             FROM incidents ORDER BY ts DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Incident::try_from).collect()
    }

    async fn count_incidents(&self) -> Result<i64> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM incidents")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.0)
    }

    async fn update_incident(
        &self,
        incident_id: &str,
        update: &IncidentUpdate,
    ) -> Result<Incident> {
        let existing = self
            .get_incident(incident_id)
            .await?
            .ok_or_else(|| ModwatchError::NotFound(format!("incident '{incident_id}'")))?;

        let updated = apply_update(&existing, update)?;

        sqlx::query("UPDATE incidents SET status = $1 WHERE incident_id = $2")
            .bind(updated.status.to_string())
            .bind(incident_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(updated)
    }

    async fn delete_incident(&self, incident_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM incidents WHERE incident_id = $1")
            .bind(incident_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(ModwatchError::NotFound(format!("incident '{incident_id}'")));
        }
        Ok(())
    }

    async fn create_alert(&self, alert: &Alert) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO alerts (id, alert_id, incident_id, admin_id, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (alert_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(&alert.alert_id)
        .bind(&alert.incident_id)
        .bind(&alert.admin_id)
        .bind(alert.status.to_string())
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(ModwatchError::Conflict(format!(
                "alert '{}' already exists",
                alert.alert_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn author_exists(&self, author_id: &str) -> Result<bool> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users WHERE user_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.0 > 0)
    }

    async fn author_schools(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT u.user_id, s.name FROM users u
             JOIN schools s ON u.school_id = s.school_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().collect())
    }
}
