//! FIR and attachment persistence.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crime_dashboard_crime_models::{FirStatus, Priority};
use crime_dashboard_fir_models::stats::FirStats;
use crime_dashboard_fir_models::{AttachmentRecord, FileCategory, FirRecord, NewAttachment, NewFir};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Storage for FIRs and their attachments.
#[async_trait]
pub trait FirRepository: Send + Sync {
    /// Inserts a FIR and all of its attachments as one unit.
    ///
    /// Either the FIR and every attachment row are stored, or nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any insert fails.
    async fn create(
        &self,
        fir: &NewFir,
        attachments: &[NewAttachment],
    ) -> Result<FirRecord, DbError>;

    /// Returns every FIR with its attachments, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn list(&self) -> Result<Vec<FirRecord>, DbError>;

    /// Returns one FIR with its attachments.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn get(&self, id: i64) -> Result<Option<FirRecord>, DbError>;

    /// Moves a FIR from `from` to `to`.
    ///
    /// Returns `false` if the FIR does not exist or is no longer in `from`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the update fails.
    async fn set_status(&self, id: i64, from: FirStatus, to: FirStatus) -> Result<bool, DbError>;

    /// Aggregates dashboard statistics.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn stats(&self) -> Result<FirStats, DbError>;
}

/// [`FirRepository`] backed by a `switchy_database` connection.
pub struct SqliteFirRepository {
    db: Arc<dyn Database>,
}

impl SqliteFirRepository {
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

fn opt_string(value: Option<&String>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |v| DatabaseValue::String(v.clone()))
}

async fn insert_fir(
    db: &dyn Database,
    fir: &NewFir,
    attachments: &[NewAttachment],
    now: DateTime<Utc>,
) -> Result<FirRecord, DbError> {
    let timestamp = now.to_rfc3339();

    let rows = db
        .query_raw_params(
            "INSERT INTO firs (
                complainant_name, complainant_address, complainant_phone,
                complainant_email, incident_date, incident_time, location,
                incident_type, description, witnesses, priority, status,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING id",
            &[
                DatabaseValue::String(fir.complainant_name.clone()),
                DatabaseValue::String(fir.complainant_address.clone()),
                opt_string(fir.complainant_phone.as_ref()),
                opt_string(fir.complainant_email.as_ref()),
                DatabaseValue::String(fir.incident_date.format(DATE_FORMAT).to_string()),
                DatabaseValue::String(fir.incident_time.format(TIME_FORMAT).to_string()),
                DatabaseValue::String(fir.location.clone()),
                DatabaseValue::String(fir.incident_type.clone()),
                DatabaseValue::String(fir.description.clone()),
                opt_string(fir.witnesses.as_ref()),
                DatabaseValue::String(fir.priority.to_string()),
                DatabaseValue::String(FirStatus::Pending.to_string()),
                DatabaseValue::String(timestamp.clone()),
            ],
        )
        .await?;

    let fir_id: i64 = rows
        .first()
        .ok_or_else(|| DbError::conversion("INSERT INTO firs returned no id"))?
        .to_value("id")
        .map_err(|e| DbError::conversion(format!("Failed to parse FIR id: {e}")))?;

    let mut stored = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let size = i64::try_from(attachment.size_bytes)
            .map_err(|_| DbError::conversion("attachment size exceeds i64"))?;

        let rows = db
            .query_raw_params(
                "INSERT INTO attachments (
                    fir_id, file_path, file_type, original_name, size_bytes, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id",
                &[
                    DatabaseValue::Int64(fir_id),
                    DatabaseValue::String(attachment.file_path.clone()),
                    DatabaseValue::String(attachment.file_type.to_string()),
                    DatabaseValue::String(attachment.original_name.clone()),
                    DatabaseValue::Int64(size),
                    DatabaseValue::String(timestamp.clone()),
                ],
            )
            .await?;

        let id: i64 = rows
            .first()
            .ok_or_else(|| DbError::conversion("INSERT INTO attachments returned no id"))?
            .to_value("id")
            .map_err(|e| DbError::conversion(format!("Failed to parse attachment id: {e}")))?;

        stored.push(AttachmentRecord {
            id,
            fir_id,
            file_path: attachment.file_path.clone(),
            file_type: attachment.file_type,
            original_name: attachment.original_name.clone(),
            size_bytes: attachment.size_bytes,
        });
    }

    Ok(FirRecord::from_new(fir_id, fir.clone(), now, stored))
}

fn text(row: &Row, name: &str) -> Result<String, DbError> {
    row.to_value::<String>(name)
        .map_err(|e| DbError::conversion(format!("Failed to read column {name}: {e}")))
}

fn opt_text(row: &Row, name: &str) -> Result<Option<String>, DbError> {
    row.to_value::<Option<String>>(name)
        .map_err(|e| DbError::conversion(format!("Failed to read column {name}: {e}")))
}

fn int(row: &Row, name: &str) -> Result<i64, DbError> {
    row.to_value::<i64>(name)
        .map_err(|e| DbError::conversion(format!("Failed to read column {name}: {e}")))
}

fn parse_column<T: std::str::FromStr>(row: &Row, name: &str) -> Result<T, DbError> {
    let raw = text(row, name)?;
    raw.parse()
        .map_err(|_| DbError::conversion(format!("Unexpected {name} value: {raw}")))
}

fn attachment_from_row(row: &Row) -> Result<AttachmentRecord, DbError> {
    let size = int(row, "size_bytes")?;
    Ok(AttachmentRecord {
        id: int(row, "id")?,
        fir_id: int(row, "fir_id")?,
        file_path: text(row, "file_path")?,
        file_type: parse_column::<FileCategory>(row, "file_type")?,
        original_name: text(row, "original_name")?,
        size_bytes: u64::try_from(size).unwrap_or(0),
    })
}

fn fir_from_row(row: &Row, attachments: Vec<AttachmentRecord>) -> Result<FirRecord, DbError> {
    let incident_date = text(row, "incident_date")?;
    let incident_time = text(row, "incident_time")?;
    let created_at = text(row, "created_at")?;

    Ok(FirRecord {
        id: int(row, "id")?,
        complainant_name: text(row, "complainant_name")?,
        complainant_address: text(row, "complainant_address")?,
        complainant_phone: opt_text(row, "complainant_phone")?,
        complainant_email: opt_text(row, "complainant_email")?,
        incident_date: NaiveDate::parse_from_str(&incident_date, DATE_FORMAT)
            .map_err(|e| DbError::conversion(format!("Bad incident_date {incident_date}: {e}")))?,
        incident_time: NaiveTime::parse_from_str(&incident_time, TIME_FORMAT)
            .map_err(|e| DbError::conversion(format!("Bad incident_time {incident_time}: {e}")))?,
        location: text(row, "location")?,
        incident_type: text(row, "incident_type")?,
        description: text(row, "description")?,
        witnesses: opt_text(row, "witnesses")?,
        priority: parse_column::<Priority>(row, "priority")?,
        status: parse_column::<FirStatus>(row, "status")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| DbError::conversion(format!("Bad created_at {created_at}: {e}")))?
            .with_timezone(&Utc),
        attachments,
    })
}

fn group_attachments(rows: &[Row]) -> Result<BTreeMap<i64, Vec<AttachmentRecord>>, DbError> {
    let mut by_fir: BTreeMap<i64, Vec<AttachmentRecord>> = BTreeMap::new();
    for row in rows {
        let attachment = attachment_from_row(row)?;
        by_fir.entry(attachment.fir_id).or_default().push(attachment);
    }
    Ok(by_fir)
}

fn count(row: &Row) -> Result<u64, DbError> {
    let n = int(row, "n")?;
    Ok(u64::try_from(n).unwrap_or(0))
}

#[async_trait]
impl FirRepository for SqliteFirRepository {
    async fn create(
        &self,
        fir: &NewFir,
        attachments: &[NewAttachment],
    ) -> Result<FirRecord, DbError> {
        let txn = self.db.begin_transaction().await?;

        match insert_fir(txn.as_ref(), fir, attachments, Utc::now()).await {
            Ok(record) => {
                txn.commit().await?;
                log::info!(
                    "Created FIR {} with {} attachment(s)",
                    record.id,
                    record.attachments.len()
                );
                Ok(record)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    log::error!("Failed to roll back FIR insert: {rollback}");
                }
                Err(e)
            }
        }
    }

    async fn list(&self) -> Result<Vec<FirRecord>, DbError> {
        let fir_rows = self
            .db
            .query_raw_params("SELECT * FROM firs ORDER BY id DESC", &[])
            .await?;
        let attachment_rows = self
            .db
            .query_raw_params("SELECT * FROM attachments ORDER BY id", &[])
            .await?;

        let mut attachments = group_attachments(&attachment_rows)?;

        fir_rows
            .iter()
            .map(|row| {
                let id = int(row, "id")?;
                fir_from_row(row, attachments.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn get(&self, id: i64) -> Result<Option<FirRecord>, DbError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT * FROM firs WHERE id = $1",
                &[DatabaseValue::Int64(id)],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let attachment_rows = self
            .db
            .query_raw_params(
                "SELECT * FROM attachments WHERE fir_id = $1 ORDER BY id",
                &[DatabaseValue::Int64(id)],
            )
            .await?;

        let attachments = attachment_rows
            .iter()
            .map(attachment_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        fir_from_row(row, attachments).map(Some)
    }

    async fn set_status(&self, id: i64, from: FirStatus, to: FirStatus) -> Result<bool, DbError> {
        let updated = self
            .db
            .exec_raw_params(
                "UPDATE firs SET status = $1, updated_at = $2
                 WHERE id = $3 AND status = $4",
                &[
                    DatabaseValue::String(to.to_string()),
                    DatabaseValue::String(Utc::now().to_rfc3339()),
                    DatabaseValue::Int64(id),
                    DatabaseValue::String(from.to_string()),
                ],
            )
            .await?;

        Ok(updated > 0)
    }

    async fn stats(&self) -> Result<FirStats, DbError> {
        let mut status = BTreeMap::new();
        for row in &self
            .db
            .query_raw_params("SELECT status, COUNT(*) AS n FROM firs GROUP BY status", &[])
            .await?
        {
            status.insert(parse_column::<FirStatus>(row, "status")?, count(row)?);
        }

        let mut priority = BTreeMap::new();
        for row in &self
            .db
            .query_raw_params(
                "SELECT priority, COUNT(*) AS n FROM firs GROUP BY priority",
                &[],
            )
            .await?
        {
            priority.insert(parse_column::<Priority>(row, "priority")?, count(row)?);
        }

        let mut types = BTreeMap::new();
        for row in &self
            .db
            .query_raw_params(
                "SELECT incident_type, COUNT(*) AS n FROM firs GROUP BY incident_type",
                &[],
            )
            .await?
        {
            types.insert(text(row, "incident_type")?, count(row)?);
        }

        let mut months = BTreeMap::new();
        for row in &self
            .db
            .query_raw_params(
                "SELECT substr(incident_date, 1, 7) AS month,
                        COUNT(*) AS n,
                        SUM(CASE WHEN status = $1 THEN 1 ELSE 0 END) AS resolved
                 FROM firs
                 GROUP BY month",
                &[DatabaseValue::String(FirStatus::Resolved.to_string())],
            )
            .await?
        {
            let resolved = int(row, "resolved")?;
            months.insert(
                text(row, "month")?,
                (count(row)?, u64::try_from(resolved).unwrap_or(0)),
            );
        }

        let total = status.values().sum();

        Ok(FirStats::assemble(total, &status, &priority, types, months))
    }
}

#[cfg(test)]
mod tests {
    use crime_dashboard_fir_models::FirDraft;

    use super::*;
    use crate::test_support::{cleanup, temp_db};

    fn new_fir(name: &str, kind: &str, date: &str) -> NewFir {
        FirDraft {
            complainant_name: Some(name.to_string()),
            complainant_address: Some("3 Temple Street".to_string()),
            incident_date: Some(date.to_string()),
            incident_time: Some("19:30".to_string()),
            location: Some("Old Bus Stand".to_string()),
            incident_type: Some(kind.to_string()),
            description: Some("Chain snatching near the ticket counter".to_string()),
            ..FirDraft::default()
        }
        .validate()
        .unwrap()
    }

    fn attachment(name: &str) -> NewAttachment {
        NewAttachment {
            file_path: format!("uploads/{name}"),
            file_type: FileCategory::from_filename(name),
            original_name: name.to_string(),
            size_bytes: 1_024,
        }
    }

    #[tokio::test]
    async fn create_then_list_returns_record_with_attachments() {
        let (db, path) = temp_db("fir_create").await;
        let repo = SqliteFirRepository::new(Arc::from(db));

        let created = repo
            .create(
                &new_fir("Selvi", "Theft", "2024-05-01"),
                &[attachment("a.jpg"), attachment("b.pdf")],
            )
            .await
            .unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], created);
        assert_eq!(all[0].status, FirStatus::Pending);
        assert_eq!(all[0].attachments.len(), 2);
        assert_eq!(all[0].attachments[1].file_type, FileCategory::Document);

        cleanup(&path);
    }

    #[tokio::test]
    async fn failed_attachment_insert_rolls_back_the_fir() {
        let (db, path) = temp_db("fir_rollback").await;
        let repo = SqliteFirRepository::new(Arc::from(db));

        let unstorable = NewAttachment {
            size_bytes: u64::MAX,
            ..attachment("huge.mp4")
        };
        let result = repo
            .create(
                &new_fir("Kannan", "Theft", "2024-05-02"),
                &[attachment("ok.jpg"), unstorable],
            )
            .await;
        assert!(matches!(result, Err(DbError::Conversion { .. })));

        assert!(repo.list().await.unwrap().is_empty());
        assert_eq!(repo.stats().await.unwrap().total, 0);

        let next = repo
            .create(&new_fir("Kannan", "Theft", "2024-05-02"), &[attachment("ok.jpg")])
            .await
            .unwrap();
        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, next.id);
        assert_eq!(all[0].attachments.len(), 1);

        cleanup(&path);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_ids_increase() {
        let (db, path) = temp_db("fir_order").await;
        let repo = SqliteFirRepository::new(Arc::from(db));

        let first = repo.create(&new_fir("One", "Theft", "2024-01-01"), &[]).await.unwrap();
        let second = repo.create(&new_fir("Two", "Fraud", "2024-01-02"), &[]).await.unwrap();
        assert!(second.id > first.id);

        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        cleanup(&path);
    }

    #[tokio::test]
    async fn get_missing_fir_is_none() {
        let (db, path) = temp_db("fir_get").await;
        let repo = SqliteFirRepository::new(Arc::from(db));
        assert!(repo.get(999).await.unwrap().is_none());
        cleanup(&path);
    }

    #[tokio::test]
    async fn set_status_is_compare_and_set() {
        let (db, path) = temp_db("fir_status").await;
        let repo = SqliteFirRepository::new(Arc::from(db));
        let fir = repo.create(&new_fir("Ravi", "Assault", "2024-02-10"), &[]).await.unwrap();

        assert!(
            repo.set_status(fir.id, FirStatus::Pending, FirStatus::UnderInvestigation)
                .await
                .unwrap()
        );
        assert!(
            !repo
                .set_status(fir.id, FirStatus::Pending, FirStatus::UnderInvestigation)
                .await
                .unwrap()
        );
        assert_eq!(
            repo.get(fir.id).await.unwrap().unwrap().status,
            FirStatus::UnderInvestigation
        );

        cleanup(&path);
    }

    #[tokio::test]
    async fn sql_stats_match_record_stats() {
        let (db, path) = temp_db("fir_stats").await;
        let repo = SqliteFirRepository::new(Arc::from(db));

        repo.create(&new_fir("A", "Theft", "2024-01-03"), &[]).await.unwrap();
        let b = repo.create(&new_fir("B", "Theft", "2024-01-09"), &[]).await.unwrap();
        repo.create(&new_fir("C", "Fraud", "2024-03-15"), &[]).await.unwrap();
        repo.set_status(b.id, FirStatus::Pending, FirStatus::UnderInvestigation)
            .await
            .unwrap();
        repo.set_status(b.id, FirStatus::UnderInvestigation, FirStatus::Resolved)
            .await
            .unwrap();

        let from_sql = repo.stats().await.unwrap();
        let from_records = FirStats::from_records(&repo.list().await.unwrap());
        assert_eq!(from_sql, from_records);
        assert_eq!(from_sql.total, 3);
        assert_eq!(from_sql.monthly[0].resolved, 1);

        cleanup(&path);
    }
}
