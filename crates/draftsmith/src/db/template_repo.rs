//! Template repository: rows of the `templates` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct TemplateRow {
    pub id: String,
    pub owner_id: String,
    pub original_name: String,
    pub format: String,
    pub mime_type: Option<String>,
    pub file_path: String,
    pub file_size: i64,
    /// JSON array of sections.
    pub sections: String,
    pub page_count: i64,
    pub times_used: i64,
    pub last_used_at: Option<String>,
    pub created_at: String,
}

impl TemplateRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            original_name: row.get("original_name")?,
            format: row.get("format")?,
            mime_type: row.get("mime_type")?,
            file_path: row.get("file_path")?,
            file_size: row.get("file_size")?,
            sections: row.get("sections")?,
            page_count: row.get("page_count")?,
            times_used: row.get("times_used")?,
            last_used_at: row.get("last_used_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, template: &TemplateRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO templates (id, owner_id, original_name, format, mime_type, file_path,
             file_size, sections, page_count, times_used, last_used_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                template.id,
                template.owner_id,
                template.original_name,
                template.format,
                template.mime_type,
                template.file_path,
                template.file_size,
                template.sections,
                template.page_count,
                template.times_used,
                template.last_used_at,
                template.created_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a template by id, restricted to its owner.
pub fn find_for_owner(
    db: &Database,
    id: &str,
    owner_id: &str,
) -> Result<Option<TemplateRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM templates WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
                TemplateRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Lists an owner's templates, newest first.
pub fn list_by_owner(db: &Database, owner_id: &str) -> Result<Vec<TemplateRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM templates WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![owner_id], TemplateRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes a template row. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str, owner_id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "DELETE FROM templates WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(affected > 0)
    })
}

/// Bumps the usage counter in a single statement.
/// Returns false if the template no longer exists.
pub fn increment_usage(db: &Database, id: &str, used_at: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE templates SET times_used = times_used + 1, last_used_at = ?2 WHERE id = ?1",
            params![id, used_at],
        )?;
        Ok(affected > 0)
    })
}
