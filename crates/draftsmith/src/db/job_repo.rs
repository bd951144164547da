//! Job repository: `generation_jobs` and their `generated_sections`.
//!
//! Status changes are single guarded `UPDATE`s; a return value of `false`
//! means the job was not in one of the expected source states.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

const JOB_SELECT: &str = "SELECT j.*, t.original_name AS template_name
     FROM generation_jobs j LEFT JOIN templates t ON t.id = j.template_id";

#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub owner_id: String,
    pub template_id: String,
    /// JSON array of topics.
    pub topics: String,
    pub requested_pages: i64,
    pub status: String,
    pub primary_path: Option<String>,
    pub converted_path: Option<String>,
    pub total_word_count: i64,
    pub generation_time_ms: i64,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    /// Joined from `templates`; `None` once the template is deleted.
    pub template_name: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            template_id: row.get("template_id")?,
            topics: row.get("topics")?,
            requested_pages: row.get("requested_pages")?,
            status: row.get("status")?,
            primary_path: row.get("primary_path")?,
            converted_path: row.get("converted_path")?,
            total_word_count: row.get("total_word_count")?,
            generation_time_ms: row.get("generation_time_ms")?,
            error: row.get("error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            completed_at: row.get("completed_at")?,
            template_name: row.get("template_name")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SectionRow {
    pub job_id: String,
    pub position: i64,
    pub section_name: String,
    pub topic_index: i64,
    pub content: String,
    pub word_count: i64,
    pub created_at: String,
}

impl SectionRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            job_id: row.get("job_id")?,
            position: row.get("position")?,
            section_name: row.get("section_name")?,
            topic_index: row.get("topic_index")?,
            content: row.get("content")?,
            word_count: row.get("word_count")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub owner_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new job. The stored status is always `pending`.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO generation_jobs (id, owner_id, template_id, topics, requested_pages,
             status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?6)",
            params![
                job.id,
                job.owner_id,
                job.template_id,
                job.topics,
                job.requested_pages,
                job.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("{} WHERE j.id = ?1", JOB_SELECT);
        let row = conn
            .query_row(&sql, params![id], JobRow::from_row)
            .optional()?;
        Ok(row)
    })
}

/// Sections of a job in append order.
pub fn sections_for_job(db: &Database, job_id: &str) -> Result<Vec<SectionRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM generated_sections WHERE job_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt
            .query_map(params![job_id], SectionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Moves a job to `to` if its current status is one of `from`.
pub fn transition(
    db: &Database,
    id: &str,
    from: &[&str],
    to: &str,
    now: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            &format!(
                "UPDATE generation_jobs SET status = ?2, updated_at = ?3
                 WHERE id = ?1 AND status IN ({})",
                status_list(from)
            ),
            params![id, to, now],
        )?;
        Ok(affected > 0)
    })
}

/// Appends a section to a job whose status is `while_status`. Returns the new
/// position, or `None` if the job is in any other status.
#[allow(clippy::too_many_arguments)]
pub fn append_section(
    db: &Database,
    job_id: &str,
    while_status: &str,
    section_name: &str,
    topic_index: i64,
    content: &str,
    word_count: i64,
    now: &str,
) -> Result<Option<i64>, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;

        let accepting: bool = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM generation_jobs WHERE id = ?1 AND status = ?2)",
            params![job_id, while_status],
            |r| r.get(0),
        )?;
        if !accepting {
            return Ok(None);
        }

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM generated_sections WHERE job_id = ?1",
            params![job_id],
            |r| r.get(0),
        )?;

        tx.execute(
            "INSERT INTO generated_sections (job_id, position, section_name, topic_index,
             content, word_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![job_id, position, section_name, topic_index, content, word_count, now],
        )?;
        tx.execute(
            "UPDATE generation_jobs SET updated_at = ?2 WHERE id = ?1",
            params![job_id, now],
        )?;
        tx.commit()?;

        Ok(Some(position))
    })
}

/// Moves a job in one of the `from` statuses to `completed`, recording
/// artifacts and metadata.
#[allow(clippy::too_many_arguments)]
pub fn complete(
    db: &Database,
    id: &str,
    from: &[&str],
    primary_path: &str,
    converted_path: &str,
    total_word_count: i64,
    generation_time_ms: i64,
    now: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            &format!(
                "UPDATE generation_jobs
                 SET status = 'completed', primary_path = ?2, converted_path = ?3,
                     total_word_count = ?4, generation_time_ms = ?5, error = NULL,
                     updated_at = ?6, completed_at = ?6
                 WHERE id = ?1 AND status IN ({})",
                status_list(from)
            ),
            params![
                id,
                primary_path,
                converted_path,
                total_word_count,
                generation_time_ms,
                now
            ],
        )?;
        Ok(affected > 0)
    })
}

/// Moves a job in one of the `from` statuses to `failed`. Sections already
/// appended are kept.
pub fn fail(
    db: &Database,
    id: &str,
    from: &[&str],
    error: &str,
    generation_time_ms: i64,
    now: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            &format!(
                "UPDATE generation_jobs
                 SET status = 'failed', error = ?2, generation_time_ms = ?3,
                     total_word_count = (SELECT COALESCE(SUM(word_count), 0)
                                         FROM generated_sections WHERE job_id = ?1),
                     updated_at = ?4, completed_at = ?4
                 WHERE id = ?1 AND status IN ({})",
                status_list(from)
            ),
            params![id, error, generation_time_ms, now],
        )?;
        Ok(affected > 0)
    })
}

/// Queries jobs newest first, returning (rows, total_count).
pub fn query(db: &Database, filter: &JobFilter) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref owner_id) = filter.owner_id {
            conditions.push(format!("j.owner_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(owner_id.clone()));
        }
        if let Some(ref status) = filter.status {
            conditions.push(format!("j.status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM generation_jobs j {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "{} {} ORDER BY j.created_at DESC, j.rowid DESC LIMIT ?{} OFFSET ?{}",
            JOB_SELECT,
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Per-status job counts and the word total over completed jobs.
pub fn stats(
    db: &Database,
    owner_id: &str,
) -> Result<(Vec<(String, u64)>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM generation_jobs WHERE owner_id = ?1 GROUP BY status",
        )?;
        let counts = stmt
            .query_map(params![owner_id], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let total_words: u64 = conn.query_row(
            "SELECT COALESCE(SUM(total_word_count), 0) FROM generation_jobs
             WHERE owner_id = ?1 AND status = 'completed'",
            params![owner_id],
            |r| r.get(0),
        )?;

        Ok((counts, total_words))
    })
}

/// Renders `['a', 'b']` as `'a', 'b'`. Callers only pass status literals.
fn status_list(statuses: &[&str]) -> String {
    statuses
        .iter()
        .filter(|s| s.chars().all(|c| c.is_ascii_lowercase() || c == '_'))
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: &str = "2026-01-01T00:00:00.000000Z";
    const T1: &str = "2026-01-01T00:00:01.000000Z";

    fn job(id: &str, owner: &str, created_at: &str) -> JobRow {
        JobRow {
            id: id.to_string(),
            owner_id: owner.to_string(),
            template_id: "tpl".to_string(),
            topics: "[]".to_string(),
            requested_pages: 1,
            status: "pending".to_string(),
            primary_path: None,
            converted_path: None,
            total_word_count: 0,
            generation_time_ms: 0,
            error: None,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
            completed_at: None,
            template_name: None,
        }
    }

    #[test]
    fn test_insert_is_pending() {
        let db = Database::open_in_memory().unwrap();
        let mut row = job("j1", "alice", T0);
        row.status = "completed".to_string();
        insert(&db, &row).unwrap();

        let found = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(found.status, "pending");
        assert!(found.completed_at.is_none());
    }

    #[test]
    fn test_guarded_transitions() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &job("j1", "alice", T0)).unwrap();

        assert!(!transition(&db, "j1", &["processing"], "completed", T1).unwrap());
        assert!(transition(&db, "j1", &["pending"], "processing", T1).unwrap());
        assert!(!transition(&db, "j1", &["pending"], "processing", T1).unwrap());

        assert!(complete(&db, "j1", &["processing"], "/a.docx", "/a.pdf", 10, 5, T1).unwrap());
        assert!(!fail(&db, "j1", &["pending", "processing"], "late", 6, T1).unwrap());
        assert!(!complete(&db, "j1", &["processing"], "/b.docx", "/b.pdf", 10, 5, T1).unwrap());

        let found = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(found.status, "completed");
        assert_eq!(found.primary_path.as_deref(), Some("/a.docx"));
        assert_eq!(found.completed_at.as_deref(), Some(T1));
    }

    #[test]
    fn test_append_only_while_processing() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &job("j1", "alice", T0)).unwrap();

        assert_eq!(
            append_section(&db, "j1", "processing", "CONTENT", 0, "early", 1, T0).unwrap(),
            None
        );

        transition(&db, "j1", &["pending"], "processing", T0).unwrap();
        assert_eq!(
            append_section(&db, "j1", "processing", "OBJECTIVE", 0, "a b", 2, T0).unwrap(),
            Some(0)
        );
        assert_eq!(
            append_section(&db, "j1", "processing", "CONTENT", 0, "c d e", 3, T1).unwrap(),
            Some(1)
        );

        assert!(fail(&db, "j1", &["pending", "processing"], "boom", 9, T1).unwrap());
        assert_eq!(
            append_section(&db, "j1", "processing", "REFERENCES", 0, "late", 1, T1).unwrap(),
            None
        );

        let sections = sections_for_job(&db, "j1").unwrap();
        let names: Vec<&str> = sections.iter().map(|s| s.section_name.as_str()).collect();
        assert_eq!(names, vec!["OBJECTIVE", "CONTENT"]);

        let found = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(found.status, "failed");
        assert_eq!(found.error.as_deref(), Some("boom"));
        assert_eq!(found.total_word_count, 5);
    }

    #[test]
    fn test_query_paginates_newest_first() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..5 {
            let created_at = format!("2026-01-0{}T00:00:00.000000Z", i + 1);
            insert(&db, &job(&format!("j{}", i), "alice", &created_at)).unwrap();
        }
        insert(&db, &job("other", "bob", T0)).unwrap();

        let filter = JobFilter {
            owner_id: Some("alice".to_string()),
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        };
        let (rows, total) = query(&db, &filter).unwrap();
        assert_eq!(total, 5);
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["j2", "j1"]);
    }

    #[test]
    fn test_stats_counts_words_of_completed_only() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &job("done", "alice", T0)).unwrap();
        insert(&db, &job("broken", "alice", T0)).unwrap();
        insert(&db, &job("waiting", "alice", T0)).unwrap();

        transition(&db, "done", &["pending"], "processing", T0).unwrap();
        complete(&db, "done", &["processing"], "/p", "/c", 900, 1, T1).unwrap();

        transition(&db, "broken", &["pending"], "processing", T0).unwrap();
        append_section(&db, "broken", "processing", "CONTENT", 0, "x", 400, T0).unwrap();
        fail(&db, "broken", &["pending", "processing"], "err", 1, T1).unwrap();

        let (mut counts, words) = stats(&db, "alice").unwrap();
        counts.sort();
        assert_eq!(words, 900);
        assert_eq!(
            counts,
            vec![
                ("completed".to_string(), 1),
                ("failed".to_string(), 1),
                ("pending".to_string(), 1)
            ]
        );
    }
}
