use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CareRequest, Contact, ElderlyProfile, Medication, Metric, NewCareRequest, NewUser, PatientDetails,
    ProfileEntry, ProfileKey, RequestCreated, RequestStatus, Role, Task, Transition, User,
};
use crate::database::repository::{
    CareRequestRepository, ProfileRepository, Store, StoreResult, UserRepository,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        role TEXT NOT NULL,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        telephone TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS care_requests (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        age INTEGER NOT NULL,
        gender TEXT NOT NULL,
        emergency_contact TEXT NOT NULL,
        address TEXT NOT NULL,
        medical_condition TEXT NOT NULL,
        medical_history TEXT NOT NULL,
        family_username TEXT NOT NULL,
        caretaker_username TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS care_requests_family_idx ON care_requests (family_username)",
    "CREATE INDEX IF NOT EXISTS care_requests_caretaker_idx ON care_requests (caretaker_username)",
    r#"
    CREATE TABLE IF NOT EXISTS elderly_profiles (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        age INTEGER NOT NULL,
        gender TEXT NOT NULL,
        emergency_contact TEXT NOT NULL,
        address TEXT NOT NULL,
        medical_condition TEXT NOT NULL,
        medical_history TEXT NOT NULL,
        family_username TEXT NOT NULL UNIQUE,
        caretaker_username TEXT,
        tasks JSONB NOT NULL DEFAULT '[]'::jsonb,
        medications JSONB NOT NULL DEFAULT '[]'::jsonb,
        metrics JSONB NOT NULL DEFAULT '[]'::jsonb,
        contacts JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS elderly_profiles_caretaker_idx ON elderly_profiles (caretaker_username)",
];

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    role: String,
    username: String,
    email: String,
    telephone: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            role: row.role.parse::<Role>().map_err(DatabaseError::Corrupt)?,
            username: row.username,
            email: row.email,
            telephone: row.telephone,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RequestRow {
    id: Uuid,
    name: String,
    age: i32,
    gender: String,
    emergency_contact: String,
    address: String,
    medical_condition: String,
    medical_history: String,
    family_username: String,
    caretaker_username: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for CareRequest {
    type Error = DatabaseError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(CareRequest {
            id: row.id,
            patient: PatientDetails {
                name: row.name,
                age: row.age,
                gender: row.gender,
                emergency_contact: row.emergency_contact,
                address: row.address,
                condition: row.medical_condition,
                medical_history: row.medical_history,
            },
            family_username: row.family_username,
            caretaker_username: row.caretaker_username,
            status: row.status.parse::<RequestStatus>().map_err(DatabaseError::Corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    name: String,
    age: i32,
    gender: String,
    emergency_contact: String,
    address: String,
    medical_condition: String,
    medical_history: String,
    family_username: String,
    caretaker_username: Option<String>,
    tasks: Json<Vec<Task>>,
    medications: Json<Vec<Medication>>,
    metrics: Json<Vec<Metric>>,
    contacts: Json<Vec<Contact>>,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for ElderlyProfile {
    fn from(row: ProfileRow) -> Self {
        ElderlyProfile {
            id: row.id,
            patient: PatientDetails {
                name: row.name,
                age: row.age,
                gender: row.gender,
                emergency_contact: row.emergency_contact,
                address: row.address,
                condition: row.medical_condition,
                medical_history: row.medical_history,
            },
            family_username: row.family_username,
            caretaker_username: row.caretaker_username,
            tasks: row.tasks.0,
            medications: row.medications.0,
            metrics: row.metrics.0,
            contacts: row.contacts.0,
            created_at: row.created_at,
        }
    }
}

/// Postgres-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }
}

fn map_unique_violation(err: sqlx::Error, what: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::Conflict(format!("{} already exists", what))
        }
        _ => DatabaseError::Sqlx(err),
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = user.into_user();
        sqlx::query(
            r#"
            INSERT INTO users (id, role, username, email, telephone, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(user.role.as_str())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.telephone)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "user"))?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE role = $1 ORDER BY created_at")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

#[async_trait]
impl CareRequestRepository for PgStore {
    async fn create_request(&self, request: NewCareRequest) -> StoreResult<RequestCreated> {
        let request = request.into_request();
        let patient = &request.patient;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO care_requests
                (id, name, age, gender, emergency_contact, address, medical_condition,
                 medical_history, family_username, caretaker_username, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(request.id)
        .bind(&patient.name)
        .bind(patient.age)
        .bind(&patient.gender)
        .bind(&patient.emergency_contact)
        .bind(&patient.address)
        .bind(&patient.condition)
        .bind(&patient.medical_history)
        .bind(&request.family_username)
        .bind(&request.caretaker_username)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *tx)
        .await?;

        // Get-or-create: the unique family_username makes a second insert a no-op
        let inserted = sqlx::query(
            r#"
            INSERT INTO elderly_profiles
                (id, name, age, gender, emergency_contact, address, medical_condition,
                 medical_history, family_username)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (family_username) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&patient.name)
        .bind(patient.age)
        .bind(&patient.gender)
        .bind(&patient.emergency_contact)
        .bind(&patient.address)
        .bind(&patient.condition)
        .bind(&patient.medical_history)
        .bind(&request.family_username)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RequestCreated {
            request,
            profile_created: inserted.rows_affected() == 1,
        })
    }

    async fn find_request(&self, id: Uuid) -> StoreResult<Option<CareRequest>> {
        sqlx::query_as::<_, RequestRow>("SELECT * FROM care_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(CareRequest::try_from)
            .transpose()
    }

    async fn list_requests_for(&self, username: &str) -> StoreResult<Vec<CareRequest>> {
        sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT * FROM care_requests
            WHERE caretaker_username = $1 OR family_username = $1
            ORDER BY created_at
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CareRequest::try_from)
        .collect()
    }

    async fn transition_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        actor: &str,
    ) -> StoreResult<Transition> {
        let mut tx = self.pool.begin().await?;

        // Row lock serialises concurrent transitions of the same request
        let current = sqlx::query_as::<_, RequestRow>("SELECT * FROM care_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(Transition::NotFound);
        };
        if current.caretaker_username != actor {
            return Ok(Transition::Forbidden {
                caretaker: current.caretaker_username,
            });
        }

        let updated = sqlx::query_as::<_, RequestRow>(
            "UPDATE care_requests SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let request = CareRequest::try_from(updated)?;

        let bound_profile = if status == RequestStatus::Accepted {
            sqlx::query_scalar::<_, Uuid>(
                "UPDATE elderly_profiles SET caretaker_username = $2 WHERE family_username = $1 RETURNING id",
            )
            .bind(&request.family_username)
            .bind(&request.caretaker_username)
            .fetch_optional(&mut *tx)
            .await?
        } else {
            None
        };

        tx.commit().await?;

        Ok(Transition::Applied { request, bound_profile })
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn find_profile_for(&self, username: &str) -> StoreResult<Option<ElderlyProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT * FROM elderly_profiles
            WHERE caretaker_username = $1 OR family_username = $1
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ElderlyProfile::from))
    }

    async fn find_profile_by_family(&self, family_username: &str) -> StoreResult<Option<ElderlyProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM elderly_profiles WHERE family_username = $1")
            .bind(family_username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ElderlyProfile::from))
    }

    async fn append_entry(&self, key: ProfileKey, entry: ProfileEntry) -> StoreResult<bool> {
        // Column names come from a closed enum, never from input
        let column = entry.collection().column();
        let item = Json(json!([entry.to_json()?]));

        let (sql, username) = match &key {
            ProfileKey::Family(family) => (
                format!(
                    "UPDATE elderly_profiles SET {col} = {col} || $2::jsonb \
                     WHERE family_username = $1 RETURNING id",
                    col = column
                ),
                family,
            ),
            ProfileKey::Caretaker(caretaker) => (
                format!(
                    "UPDATE elderly_profiles SET {col} = {col} || $2::jsonb \
                     WHERE id = (SELECT id FROM elderly_profiles WHERE caretaker_username = $1 \
                                 ORDER BY created_at, id LIMIT 1) \
                     RETURNING id",
                    col = column
                ),
                caretaker,
            ),
        };

        let updated = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(username)
            .bind(item)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated.is_some())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
