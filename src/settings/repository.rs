//! SQLite-backed setting repository

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::sync::MutexGuard;

use super::{NewSetting, Setting, SettingChanges, SettingValue, SettingsError};
use crate::database::Database;
use crate::repository::Repository;

const COLUMNS: &str = "id, key, value, created_at, updated_at, deleted_at";

/// Data access for the `settings` table
#[derive(Clone)]
pub struct SettingRepository {
    db: Database,
}

impl SettingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, SettingsError> {
        self.db.lock().map_err(SettingsError::Poisoned)
    }

    /// A live setting by key
    pub fn find_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!("SELECT {COLUMNS} FROM settings WHERE key = ?1 AND deleted_at IS NULL"),
            params![key],
        )
    }

    /// Return the row for `key`, creating it with `value` when absent.
    ///
    /// An existing row keeps its value, so re-seeding never resets a toggle.
    pub fn first_or_create(
        &self,
        key: &str,
        value: SettingValue,
    ) -> Result<(Setting, bool), SettingsError> {
        {
            let conn = self.conn()?;
            let existing = query_one(
                &conn,
                &format!("SELECT {COLUMNS} FROM settings WHERE key = ?1"),
                params![key],
            )?;
            if let Some(setting) = existing {
                return Ok((setting, false));
            }
        }

        let created = self.create(NewSetting::new(key, value))?;
        Ok((created, true))
    }

    /// Any row by id, including soft-deleted ones
    fn find_with_trashed(
        &self,
        conn: &Connection,
        id: i64,
    ) -> Result<Option<Setting>, SettingsError> {
        query_one(
            conn,
            &format!("SELECT {COLUMNS} FROM settings WHERE id = ?1"),
            params![id],
        )
    }
}

impl Repository for SettingRepository {
    type Model = Setting;
    type NewModel = NewSetting;
    type Changes = SettingChanges;
    type Error = SettingsError;

    fn all(&self) -> Result<Vec<Setting>, SettingsError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM settings WHERE deleted_at IS NULL ORDER BY id"
        ))?;
        let rows = stmt.query_map([], SettingRow::from_row)?;

        let mut settings = Vec::new();
        for row in rows {
            settings.push(row?.into_setting()?);
        }
        Ok(settings)
    }

    fn find(&self, id: i64) -> Result<Option<Setting>, SettingsError> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!("SELECT {COLUMNS} FROM settings WHERE id = ?1 AND deleted_at IS NULL"),
            params![id],
        )
    }

    fn create(&self, attributes: NewSetting) -> Result<Setting, SettingsError> {
        let conn = self.conn()?;
        let now = timestamp(Utc::now());
        conn.execute(
            "INSERT INTO settings (key, value, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![attributes.key, attributes.value.to_column()?, now],
        )
        .map_err(|e| conflict_or(e, &attributes.key))?;

        let id = conn.last_insert_rowid();
        tracing::debug!("Created setting {} ({})", attributes.key, id);
        self.find_with_trashed(&conn, id)?
            .ok_or_else(|| SettingsError::NotFound(id.to_string()))
    }

    fn update(&self, attributes: SettingChanges, object: &Setting) -> Result<Setting, SettingsError> {
        let conn = self.conn()?;
        let key = attributes.key.unwrap_or_else(|| object.key.clone());
        let value = attributes.value.unwrap_or_else(|| object.value.clone());

        let changed = conn
            .execute(
                "UPDATE settings SET key = ?1, value = ?2, updated_at = ?3
                 WHERE id = ?4 AND deleted_at IS NULL",
                params![key, value.to_column()?, timestamp(Utc::now()), object.id],
            )
            .map_err(|e| conflict_or(e, &key))?;
        if changed == 0 {
            return Err(SettingsError::NotFound(object.key.clone()));
        }

        tracing::debug!("Updated setting {} = {}", key, value);
        self.find_with_trashed(&conn, object.id)?
            .ok_or_else(|| SettingsError::NotFound(object.key.clone()))
    }

    fn delete(&self, object: &Setting) -> Result<bool, SettingsError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE settings SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![timestamp(Utc::now()), object.id],
        )?;
        Ok(changed > 0)
    }

    fn restore(&self, object: &Setting) -> Result<Setting, SettingsError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE settings SET deleted_at = NULL WHERE id = ?1",
            params![object.id],
        )?;
        if changed == 0 {
            return Err(SettingsError::NotFound(object.key.clone()));
        }
        self.find_with_trashed(&conn, object.id)?
            .ok_or_else(|| SettingsError::NotFound(object.key.clone()))
    }

    fn force_delete(&self, object: &Setting) -> Result<bool, SettingsError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM settings WHERE id = ?1", params![object.id])?;
        Ok(changed > 0)
    }
}

/// Raw column values of one settings row
struct SettingRow {
    id: i64,
    key: String,
    value: String,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl SettingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            value: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
            deleted_at: row.get(5)?,
        })
    }

    fn into_setting(self) -> Result<Setting, SettingsError> {
        Ok(Setting {
            id: self.id,
            value: SettingValue::from_column(&self.value)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            deleted_at: self.deleted_at.as_deref().map(parse_timestamp).transpose()?,
            key: self.key,
        })
    }
}

fn query_one<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<Setting>, SettingsError> {
    conn.query_row(sql, params, SettingRow::from_row)
        .optional()?
        .map(SettingRow::into_setting)
        .transpose()
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SettingsError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| SettingsError::InvalidTimestamp(raw.to_string()))
}

/// Map unique-constraint failures to `Conflict`
fn conflict_or(err: rusqlite::Error, key: &str) -> SettingsError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            SettingsError::Conflict(key.to_string())
        }
        _ => SettingsError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> SettingRepository {
        SettingRepository::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_create_and_all() {
        let repo = repo();
        repo.create(NewSetting::new("show_contact_section", false)).unwrap();
        repo.create(NewSetting::new("theme", SettingValue::Text("dark".into())))
            .unwrap();

        let all = repo.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].key, "show_contact_section");
        assert_eq!(all[0].value, SettingValue::Bool(false));
        assert_eq!(all[1].value, SettingValue::Text("dark".into()));
    }

    #[test]
    fn test_duplicate_key_conflicts() {
        let repo = repo();
        repo.create(NewSetting::new("a", true)).unwrap();
        let err = repo.create(NewSetting::new("a", false)).unwrap_err();
        assert!(matches!(err, SettingsError::Conflict(key) if key == "a"));
    }

    #[test]
    fn test_update_persists_and_is_retrievable() {
        let repo = repo();
        let setting = repo.create(NewSetting::new("show_contact_section", false)).unwrap();

        let updated = repo
            .update(SettingChanges::value(true), &setting)
            .unwrap();
        assert_eq!(updated.value, SettingValue::Bool(true));
        assert!(updated.updated_at >= setting.updated_at);

        let stored = repo.find_by_key("show_contact_section").unwrap().unwrap();
        assert_eq!(stored.value, SettingValue::Bool(true));
        assert_eq!(repo.all().unwrap()[0].value, SettingValue::Bool(true));
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let repo = repo();
        let setting = repo.create(NewSetting::new("gone", false)).unwrap();
        repo.force_delete(&setting).unwrap();

        let err = repo.update(SettingChanges::value(true), &setting).unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(_)));
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let repo = repo();
        let setting = repo.create(NewSetting::new("flag", true)).unwrap();

        assert!(repo.delete(&setting).unwrap());
        assert!(!repo.delete(&setting).unwrap());
        assert!(repo.find(setting.id).unwrap().is_none());
        assert!(repo.all().unwrap().is_empty());

        let restored = repo.restore(&setting).unwrap();
        assert!(restored.deleted_at.is_none());
        assert_eq!(repo.find(setting.id).unwrap().unwrap().key, "flag");
    }

    #[test]
    fn test_force_delete() {
        let repo = repo();
        let setting = repo.create(NewSetting::new("flag", true)).unwrap();
        assert!(repo.force_delete(&setting).unwrap());
        assert!(!repo.force_delete(&setting).unwrap());
        assert!(repo.restore(&setting).is_err());
    }

    #[test]
    fn test_first_or_create_keeps_existing_value() {
        let repo = repo();
        let (first, created) = repo.first_or_create("flag", false.into()).unwrap();
        assert!(created);

        repo.update(SettingChanges::value(true), &first).unwrap();

        let (again, created) = repo.first_or_create("flag", false.into()).unwrap();
        assert!(!created);
        assert_eq!(again.value, SettingValue::Bool(true));
        assert_eq!(repo.all().unwrap().len(), 1);
    }
}
