//! Diet plan model
//!
//! Generated plan text saved against a profile.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Plan horizon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Daily => "daily",
            PlanType::Weekly => "weekly",
            PlanType::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Some(PlanType::Daily),
            "weekly" | "week" => Some(PlanType::Weekly),
            "monthly" | "month" => Some(PlanType::Monthly),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanType::Daily => "Daily",
            PlanType::Weekly => "Weekly",
            PlanType::Monthly => "Monthly",
        }
    }
}

/// A saved diet plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietPlan {
    pub id: i64,
    pub user_id: String,
    pub plan_type: PlanType,
    pub content: String,
    pub created_at: String,
}

impl DietPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let plan_type: String = row.get("plan_type")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            plan_type: PlanType::from_str(&plan_type).unwrap_or_default(),
            content: row.get("content")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn create(conn: &Connection, user_id: &str, plan_type: PlanType, content: &str) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO diet_plans (user_id, plan_type, content) VALUES (?1, ?2, ?3)",
            params![user_id, plan_type.as_str(), content],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Diet plan {}", id)))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM diet_plans WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Plans for a user, newest first
    pub fn list_for_user(conn: &Connection, user_id: &str, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM diet_plans WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let plans = stmt
            .query_map(params![user_id, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM diet_plans WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::UserProfile;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        UserProfile::create(&conn, "u1", "Ada", "ada@example.com").unwrap();
        conn
    }

    #[test]
    fn test_plan_type_parsing() {
        assert_eq!(PlanType::from_str("Weekly"), Some(PlanType::Weekly));
        assert_eq!(PlanType::from_str("month"), Some(PlanType::Monthly));
        assert_eq!(PlanType::from_str("yearly"), None);
    }

    #[test]
    fn test_create_list_delete() {
        let conn = test_conn();
        let first = DietPlan::create(&conn, "u1", PlanType::Daily, "Oats for breakfast").unwrap();
        let second = DietPlan::create(&conn, "u1", PlanType::Weekly, "Seven days of meals").unwrap();

        let plans = DietPlan::list_for_user(&conn, "u1", 10).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].id, second.id);
        assert_eq!(plans[0].plan_type, PlanType::Weekly);

        assert!(DietPlan::delete(&conn, first.id).unwrap());
        assert!(DietPlan::get_by_id(&conn, first.id).unwrap().is_none());
    }

    #[test]
    fn test_plan_requires_profile() {
        let conn = test_conn();
        assert!(DietPlan::create(&conn, "nobody", PlanType::Daily, "text").is_err());
    }

    #[test]
    fn test_plans_removed_with_profile() {
        let conn = test_conn();
        DietPlan::create(&conn, "u1", PlanType::Monthly, "A month").unwrap();
        UserProfile::delete(&conn, "u1").unwrap();
        assert!(DietPlan::list_for_user(&conn, "u1", 10).unwrap().is_empty());
    }
}
