use std::path::PathBuf;

use chrono::Utc;

use crate::db::template_repo::{self, TemplateRow};
use crate::db::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::model::{Section, Template, TemplateFormat, TemplateUsage};

/// Owner-scoped access to stored templates.
#[derive(Clone)]
pub struct TemplateStore {
    db: Database,
}

impl TemplateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn insert(&self, template: &Template) -> Result<(), DatabaseError> {
        template_repo::insert(&self.db, &to_row(template)?)
    }

    pub fn get(&self, id: &str, owner_id: &str) -> Result<Option<Template>, DatabaseError> {
        template_repo::find_for_owner(&self.db, id, owner_id)?
            .map(from_row)
            .transpose()
    }

    pub fn list(&self, owner_id: &str) -> Result<Vec<Template>, DatabaseError> {
        template_repo::list_by_owner(&self.db, owner_id)?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// Removes the record. The caller releases the backing artifact.
    pub fn delete(&self, id: &str, owner_id: &str) -> Result<bool, DatabaseError> {
        template_repo::delete(&self.db, id, owner_id)
    }

    /// Atomically bumps `times_used` and stamps `last_used_at`.
    pub fn increment_usage(&self, id: &str) -> Result<bool, DatabaseError> {
        template_repo::increment_usage(&self.db, id, &format_timestamp(&Utc::now()))
    }
}

fn to_row(template: &Template) -> Result<TemplateRow, DatabaseError> {
    let sections = serde_json::to_string(&template.sections).map_err(|e| corrupt(&template.id, e))?;
    Ok(TemplateRow {
        id: template.id.clone(),
        owner_id: template.owner_id.clone(),
        original_name: template.original_name.clone(),
        format: template.format.as_str().to_string(),
        mime_type: template.mime_type.clone(),
        file_path: template.file_path.to_string_lossy().into_owned(),
        file_size: template.file_size as i64,
        sections,
        page_count: i64::from(template.page_count),
        times_used: template.usage.times_used as i64,
        last_used_at: template.usage.last_used_at.as_ref().map(format_timestamp),
        created_at: format_timestamp(&template.created_at),
    })
}

fn from_row(row: TemplateRow) -> Result<Template, DatabaseError> {
    let format = TemplateFormat::parse(&row.format).ok_or_else(|| DatabaseError::Corrupt {
        table: "templates",
        id: row.id.clone(),
        reason: format!("unknown format '{}'", row.format),
    })?;
    let sections: Vec<Section> =
        serde_json::from_str(&row.sections).map_err(|e| corrupt(&row.id, e))?;
    let created_at = parse_timestamp(&row.created_at).unwrap_or_else(|| {
        log::warn!(
            "Template {} has unparseable created_at '{}'",
            row.id,
            row.created_at
        );
        Utc::now()
    });

    Ok(Template {
        id: row.id,
        owner_id: row.owner_id,
        original_name: row.original_name,
        format,
        mime_type: row.mime_type,
        file_path: PathBuf::from(row.file_path),
        file_size: row.file_size.max(0) as u64,
        sections,
        page_count: u32::try_from(row.page_count).unwrap_or(1),
        usage: TemplateUsage {
            times_used: row.times_used.max(0) as u64,
            last_used_at: row.last_used_at.as_deref().and_then(parse_timestamp),
        },
        created_at,
    })
}

fn corrupt(id: &str, e: serde_json::Error) -> DatabaseError {
    DatabaseError::Corrupt {
        table: "templates",
        id: id.to_string(),
        reason: e.to_string(),
    }
}
