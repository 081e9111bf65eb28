//! User profile model
//!
//! One JSON document per user. Writes are merges: a partial document is
//! folded into the stored one key by key, so callers only send what changed.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::db::{DbError, DbResult};
use crate::nutrition::{NutritionRequest, NutritionResult};

/// Goal written into a new profile
pub const DEFAULT_GOAL: &str = "maintenance";

fn default_goal() -> String {
    DEFAULT_GOAL.to_string()
}

fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Calculator inputs and outputs as stored in a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionData {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: u32,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
    #[serde(flatten)]
    pub result: NutritionResult,
}

impl NutritionData {
    pub fn new(request: &NutritionRequest, result: NutritionResult) -> Self {
        Self {
            height_cm: request.height_cm,
            weight_kg: request.weight_kg,
            age_years: request.age_years,
            gender: request.gender.clone(),
            activity_level: request.activity_level.clone(),
            goal: request.goal.clone(),
            result,
        }
    }
}

/// Typed view of a profile document. Keys this struct does not know about
/// are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default = "default_goal")]
    pub goal: String,
    #[serde(default)]
    pub profile_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_data: Option<NutritionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub profile: ProfileDocument,
    pub created_at: String,
    pub updated_at: String,
}

/// Profile summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_complete: bool,
    pub updated_at: String,
}

/// Deep-merge `patch` into `target`.
///
/// Objects merge recursively; arrays, scalars and nulls replace the stored
/// value. A non-object patch replaces the target wholesale.
pub fn merge_documents(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                let nested = patch_value.is_object()
                    && target_map.get(key).map_or(false, Value::is_object);
                if !nested {
                    target_map.insert(key.clone(), patch_value.clone());
                } else if let Some(existing) = target_map.get_mut(key) {
                    merge_documents(existing, patch_value);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Partial profile written after a calculation
#[derive(Debug, Clone, Default)]
pub struct NutritionProfileUpdate {
    pub nutrition_data: Option<NutritionData>,
    pub preferences: Option<Vec<String>>,
    pub restrictions: Option<Vec<String>>,
    pub medical_conditions: Option<Vec<String>>,
    pub profile_complete: Option<bool>,
}

impl NutritionProfileUpdate {
    /// Only the fields that are set end up in the patch
    pub fn to_patch(&self) -> DbResult<Value> {
        let mut patch = Map::new();
        if let Some(data) = &self.nutrition_data {
            patch.insert("goal".to_string(), Value::String(data.goal.clone()));
            patch.insert("nutrition_data".to_string(), serde_json::to_value(data)?);
        }
        if let Some(preferences) = &self.preferences {
            patch.insert("preferences".to_string(), json!(preferences));
        }
        if let Some(restrictions) = &self.restrictions {
            patch.insert("restrictions".to_string(), json!(restrictions));
        }
        if let Some(conditions) = &self.medical_conditions {
            patch.insert("medical_conditions".to_string(), json!(conditions));
        }
        if let Some(complete) = self.profile_complete {
            patch.insert("profile_complete".to_string(), Value::Bool(complete));
        }
        Ok(Value::Object(patch))
    }
}

impl UserProfile {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let document: String = row.get("document")?;
        let profile = serde_json::from_str(&document).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Self {
            user_id: row.get("user_id")?,
            profile,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create a new profile with empty preference lists
    pub fn create(conn: &Connection, user_id: &str, name: &str, email: &str) -> DbResult<Self> {
        if Self::exists(conn, user_id)? {
            return Err(DbError::Conflict(format!("Profile '{}'", user_id)));
        }

        let document = json!({
            "uid": user_id,
            "email": email,
            "name": name,
            "created_at": now_timestamp(),
            "preferences": [],
            "restrictions": [],
            "medical_conditions": [],
            "goal": DEFAULT_GOAL,
            "profile_complete": false,
        });

        conn.execute(
            "INSERT INTO user_profiles (user_id, document) VALUES (?1, ?2)",
            params![user_id, document.to_string()],
        )?;
        info!(user_id, "Created profile");

        Self::get(conn, user_id)?.ok_or_else(|| DbError::NotFound(format!("Profile '{}'", user_id)))
    }

    pub fn exists(conn: &Connection, user_id: &str) -> DbResult<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM user_profiles WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Get a profile by user ID
    pub fn get(conn: &Connection, user_id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_profiles WHERE user_id = ?1")?;

        let result = stmt.query_row([user_id], Self::from_row);
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the raw stored document
    pub fn get_document(conn: &Connection, user_id: &str) -> DbResult<Option<Value>> {
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM user_profiles WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Merge a partial document into the profile, creating it if needed
    pub fn merge(conn: &Connection, user_id: &str, patch: &Value) -> DbResult<Self> {
        if !patch.is_object() {
            return Err(DbError::InvalidDocument(
                "profile update must be a JSON object".to_string(),
            ));
        }

        let tx = conn.unchecked_transaction()?;

        let now = now_timestamp();
        let mut document = match Self::get_document(&tx, user_id)? {
            Some(existing) => existing,
            None => {
                debug!(user_id, "Merging into new profile");
                json!({ "uid": user_id, "created_at": now })
            }
        };

        merge_documents(&mut document, patch);
        if let Value::Object(map) = &mut document {
            map.insert("uid".to_string(), Value::String(user_id.to_string()));
            map.insert("updated_at".to_string(), Value::String(now));
        }

        // The stored document must still read back as a profile
        serde_json::from_value::<ProfileDocument>(document.clone())
            .map_err(|e| DbError::InvalidDocument(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO user_profiles (user_id, document)
            VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET
                document = excluded.document,
                updated_at = datetime('now')
            "#,
            params![user_id, document.to_string()],
        )?;
        tx.commit()?;
        info!(user_id, "Updated profile");

        Self::get(conn, user_id)?.ok_or_else(|| DbError::NotFound(format!("Profile '{}'", user_id)))
    }

    /// Delete a profile and everything stored for it
    pub fn delete(conn: &Connection, user_id: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM user_profiles WHERE user_id = ?1", [user_id])?;
        Ok(rows > 0)
    }

    /// List profile summaries, most recently updated first
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<ProfileSummary>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT user_id,
                   json_extract(document, '$.name') AS name,
                   json_extract(document, '$.email') AS email,
                   COALESCE(json_extract(document, '$.profile_complete'), 0) AS profile_complete,
                   updated_at
            FROM user_profiles
            ORDER BY updated_at DESC, user_id ASC
            LIMIT ?1 OFFSET ?2
            "#,
        )?;

        let profiles = stmt
            .query_map(params![limit, offset], |row| {
                Ok(ProfileSummary {
                    user_id: row.get("user_id")?,
                    name: row.get("name")?,
                    email: row.get("email")?,
                    profile_complete: row.get("profile_complete")?,
                    updated_at: row.get("updated_at")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(profiles)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM user_profiles", [], |row| row.get(0))?)
    }
}
