use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A job row joined with its company's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: i64,
    pub company_id: i64,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: String,
    pub experience_level: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub is_remote: bool,
    pub status: String,
    pub posted_at: DateTime<Utc>,
}
