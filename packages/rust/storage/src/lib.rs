//! libSQL storage layer for research runs and persisted keywords.
//!
//! The [`Storage`] struct wraps a local libSQL database holding run
//! lifecycle state, each run's append-only progress log, and the persisted
//! keyword rows the clustering pass later annotates in place.
//!
//! **Lifecycle rules:** terminal run states (`completed`, `failed`) are
//! immutable — every transition is guarded in SQL, and a guarded miss is a
//! no-op reported back to the caller, never an overwrite.

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};

use keywordscout_shared::{
    KeywordScoutError, PersistedKeyword, ProgressEntry, ResearchRun, Result, RunId, RunStatus,
};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| KeywordScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    KeywordScoutError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Run lifecycle
    // -----------------------------------------------------------------------

    /// Insert a new research run record (normally in `pending`).
    pub async fn insert_run(&self, run: &ResearchRun) -> Result<()> {
        let seeds_json = serde_json::to_string(&run.seed_keywords)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO research_runs
                   (id, domain, niche, status, seeds_json, total_found, error_message, created_at, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    run.id.to_string(),
                    run.domain.as_str(),
                    run.niche.as_str(),
                    run.status.as_str(),
                    seeds_json.as_str(),
                    run.total_found,
                    run.error_message.as_deref(),
                    run.created_at.to_rfc3339(),
                    run.started_at.map(|t| t.to_rfc3339()),
                    run.completed_at.map(|t| t.to_rfc3339()),
                ],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a run by ID.
    pub async fn get_run(&self, id: &RunId) -> Result<Option<ResearchRun>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, domain, niche, status, seeds_json, total_found, error_message,
                        created_at, started_at, completed_at
                 FROM research_runs WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_run(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(KeywordScoutError::Storage(e.to_string())),
        }
    }

    /// List all runs, newest first.
    pub async fn list_runs(&self) -> Result<Vec<ResearchRun>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, domain, niche, status, seeds_json, total_found, error_message,
                        created_at, started_at, completed_at
                 FROM research_runs ORDER BY created_at DESC",
                params![],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_run(&row)?);
        }
        Ok(results)
    }

    /// Record the seeds a run ended up using (supplied or generated).
    pub async fn set_run_seeds(&self, id: &RunId, seeds: &[String]) -> Result<()> {
        let seeds_json = serde_json::to_string(seeds)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        self.conn
            .execute(
                "UPDATE research_runs SET seeds_json = ?1 WHERE id = ?2",
                params![seeds_json.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Transition `pending → processing`. Returns false if the run was not
    /// pending (transition refused).
    pub async fn mark_processing(&self, id: &RunId) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE research_runs SET status = 'processing', started_at = ?1
                 WHERE id = ?2 AND status = 'pending'",
                params![now.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        if changed == 0 {
            tracing::warn!(run_id = %id, "refused processing transition for non-pending run");
        }
        Ok(changed > 0)
    }

    /// Transition `processing → completed`, recording the pre-truncation
    /// candidate count. Returns false if the run was not processing.
    pub async fn mark_completed(&self, id: &RunId, total_found: i64) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE research_runs
                 SET status = 'completed', total_found = ?1, completed_at = ?2, error_message = NULL
                 WHERE id = ?3 AND status = 'processing'",
                params![total_found, now.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        if changed == 0 {
            tracing::warn!(run_id = %id, "refused completed transition for non-processing run");
        }
        Ok(changed > 0)
    }

    /// Transition a non-terminal run to `failed` with an error message.
    /// Returns false if the run was already terminal.
    pub async fn mark_failed(&self, id: &RunId, error_message: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE research_runs
                 SET status = 'failed', error_message = ?1, completed_at = ?2
                 WHERE id = ?3 AND status IN ('pending', 'processing')",
                params![error_message, now.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        if changed == 0 {
            tracing::warn!(run_id = %id, "refused failed transition for terminal run");
        }
        Ok(changed > 0)
    }

    // -----------------------------------------------------------------------
    // Progress log
    // -----------------------------------------------------------------------

    /// Append a progress entry to a run's log.
    pub async fn append_progress(&self, id: &RunId, message: &str, indent: u8) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO run_progress (run_id, seq, time, message, indent)
                 SELECT ?1, COALESCE(MAX(seq), 0) + 1, ?2, ?3, ?4
                 FROM run_progress WHERE run_id = ?1",
                params![id.to_string(), now.as_str(), message, i64::from(indent)],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// The full progress log for a run, in append order.
    pub async fn list_progress(&self, id: &RunId) -> Result<Vec<ProgressEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT seq, time, message, indent FROM run_progress
                 WHERE run_id = ?1 ORDER BY seq",
                params![id.to_string()],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(ProgressEntry {
                seq: row
                    .get::<i64>(0)
                    .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
                time: parse_datetime(
                    &row.get::<String>(1)
                        .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
                )?,
                message: row
                    .get::<String>(2)
                    .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
                indent: row.get::<i64>(3).unwrap_or(0) as u8,
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Keywords
    // -----------------------------------------------------------------------

    /// Insert a persisted keyword row.
    pub async fn insert_keyword(&self, kw: &PersistedKeyword) -> Result<()> {
        let sources_json = serde_json::to_string(&kw.sources)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        let siblings_json = serde_json::to_string(&kw.cluster_siblings)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO keywords
                   (id, run_id, text, volume, difficulty, cpc, opportunity, intent,
                    sources_json, cluster_id, is_representative, cluster_size, siblings_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    kw.id.as_str(),
                    kw.run_id.as_str(),
                    kw.text.as_str(),
                    kw.volume.map(i64::from),
                    kw.difficulty.map(i64::from),
                    kw.cpc,
                    kw.opportunity.map(i64::from),
                    kw.intent.as_str(),
                    sources_json.as_str(),
                    kw.cluster_id,
                    kw.is_representative as i64,
                    kw.cluster_size,
                    siblings_json.as_str(),
                    kw.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// List a run's keywords, best opportunity first.
    ///
    /// With `representatives_only`, collapsed to cluster representatives
    /// plus unclustered keywords — the "representatives" view the API layer
    /// projects.
    pub async fn list_keywords(
        &self,
        run_id: &RunId,
        representatives_only: bool,
    ) -> Result<Vec<PersistedKeyword>> {
        let sql = if representatives_only {
            "SELECT id, run_id, text, volume, difficulty, cpc, opportunity, intent,
                    sources_json, cluster_id, is_representative, cluster_size, siblings_json, created_at
             FROM keywords
             WHERE run_id = ?1 AND (is_representative = 1 OR cluster_id IS NULL)
             ORDER BY opportunity DESC"
        } else {
            "SELECT id, run_id, text, volume, difficulty, cpc, opportunity, intent,
                    sources_json, cluster_id, is_representative, cluster_size, siblings_json, created_at
             FROM keywords
             WHERE run_id = ?1
             ORDER BY opportunity DESC"
        };

        let mut rows = self
            .conn
            .query(sql, params![run_id.to_string()])
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_keyword(&row)?);
        }
        Ok(results)
    }

    /// Annotate a keyword as a (non-representative) cluster member.
    pub async fn annotate_cluster_member(&self, keyword_id: &str, cluster_id: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE keywords
                 SET cluster_id = ?1, is_representative = 0
                 WHERE id = ?2",
                params![cluster_id, keyword_id],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Annotate a keyword as its cluster's representative, carrying the
    /// cluster size and sibling texts.
    pub async fn annotate_cluster_representative(
        &self,
        keyword_id: &str,
        cluster_id: i64,
        cluster_size: i64,
        siblings: &[String],
    ) -> Result<()> {
        let siblings_json = serde_json::to_string(siblings)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        self.conn
            .execute(
                "UPDATE keywords
                 SET cluster_id = ?1, is_representative = 1, cluster_size = ?2, siblings_json = ?3
                 WHERE id = ?4",
                params![cluster_id, cluster_size, siblings_json.as_str(), keyword_id],
            )
            .await
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<chrono::DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KeywordScoutError::Storage(format!("invalid date: {e}")))
}

fn parse_optional_datetime(s: Option<String>) -> Result<Option<chrono::DateTime<Utc>>> {
    s.map(|v| parse_datetime(&v)).transpose()
}

/// Convert a database row to a [`ResearchRun`].
fn row_to_run(row: &libsql::Row) -> Result<ResearchRun> {
    let status_str: String = row
        .get(3)
        .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
    let status: RunStatus = status_str
        .parse()
        .map_err(|e: String| KeywordScoutError::Storage(e))?;

    let seeds_json: String = row
        .get(4)
        .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
    let seed_keywords: Vec<String> = serde_json::from_str(&seeds_json)
        .map_err(|e| KeywordScoutError::Storage(format!("invalid seeds_json: {e}")))?;

    Ok(ResearchRun {
        id: row
            .get::<String>(0)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?
            .parse()
            .map_err(|e| KeywordScoutError::Storage(format!("invalid run id: {e}")))?,
        domain: row
            .get::<String>(1)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
        niche: row
            .get::<String>(2)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
        status,
        seed_keywords,
        total_found: row
            .get::<i64>(5)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
        error_message: row.get::<String>(6).ok(),
        created_at: parse_datetime(
            &row.get::<String>(7)
                .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
        )?,
        started_at: parse_optional_datetime(row.get::<String>(8).ok())?,
        completed_at: parse_optional_datetime(row.get::<String>(9).ok())?,
    })
}

/// Convert a database row to a [`PersistedKeyword`].
fn row_to_keyword(row: &libsql::Row) -> Result<PersistedKeyword> {
    let intent_str: String = row
        .get(7)
        .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
    let intent = intent_str
        .parse()
        .map_err(|e: String| KeywordScoutError::Storage(e))?;

    let sources_json: String = row
        .get(8)
        .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
    let sources: Vec<String> = serde_json::from_str(&sources_json)
        .map_err(|e| KeywordScoutError::Storage(format!("invalid sources_json: {e}")))?;

    let siblings_json: String = row
        .get(12)
        .map_err(|e| KeywordScoutError::Storage(e.to_string()))?;
    let cluster_siblings: Vec<String> = serde_json::from_str(&siblings_json)
        .map_err(|e| KeywordScoutError::Storage(format!("invalid siblings_json: {e}")))?;

    Ok(PersistedKeyword {
        id: row
            .get::<String>(0)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
        run_id: row
            .get::<String>(1)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
        text: row
            .get::<String>(2)
            .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
        volume: row.get::<i64>(3).ok().map(|v| v as u32),
        difficulty: row.get::<i64>(4).ok().map(|v| v as u8),
        cpc: row.get::<f64>(5).ok(),
        opportunity: row.get::<i64>(6).ok().map(|v| v as u8),
        intent,
        sources,
        cluster_id: row.get::<i64>(9).ok(),
        is_representative: row.get::<i64>(10).unwrap_or(0) != 0,
        cluster_size: row.get::<i64>(11).unwrap_or(1),
        cluster_siblings,
        created_at: parse_datetime(
            &row.get::<String>(13)
                .map_err(|e| KeywordScoutError::Storage(e.to_string()))?,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use keywordscout_shared::SearchIntent;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("ks_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn sample_keyword(run_id: &RunId, text: &str, opportunity: u8) -> PersistedKeyword {
        PersistedKeyword {
            id: Uuid::now_v7().to_string(),
            run_id: run_id.to_string(),
            text: text.into(),
            volume: Some(1000),
            difficulty: Some(50),
            cpc: Some(2.50),
            opportunity: Some(opportunity),
            intent: SearchIntent::Commercial,
            sources: vec!["seed".into(), "autocomplete".into()],
            cluster_id: None,
            is_representative: false,
            cluster_size: 1,
            cluster_siblings: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("ks_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn run_lifecycle_happy_path() {
        let storage = test_storage().await;
        let run = ResearchRun::new("acme.io", "developer tools");
        let id = run.id.clone();

        storage.insert_run(&run).await.expect("insert run");

        assert!(storage.mark_processing(&id).await.expect("processing"));
        let fetched = storage.get_run(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Processing);
        assert!(fetched.started_at.is_some());

        storage
            .set_run_seeds(&id, &["seo tools".into(), "keyword research".into()])
            .await
            .expect("set seeds");

        assert!(storage.mark_completed(&id, 42).await.expect("completed"));
        let fetched = storage.get_run(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Completed);
        assert_eq!(fetched.total_found, 42);
        assert_eq!(fetched.seed_keywords.len(), 2);
        assert!(fetched.completed_at.is_some());
    }

    #[tokio::test]
    async fn terminal_states_are_immutable() {
        let storage = test_storage().await;
        let run = ResearchRun::new("acme.io", "developer tools");
        let id = run.id.clone();
        storage.insert_run(&run).await.unwrap();
        storage.mark_processing(&id).await.unwrap();
        storage.mark_failed(&id, "boom").await.unwrap();

        // Every further transition is refused.
        assert!(!storage.mark_processing(&id).await.unwrap());
        assert!(!storage.mark_completed(&id, 10).await.unwrap());
        assert!(!storage.mark_failed(&id, "boom again").await.unwrap());

        let fetched = storage.get_run(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Failed);
        assert_eq!(fetched.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn processing_requires_pending() {
        let storage = test_storage().await;
        let run = ResearchRun::new("acme.io", "developer tools");
        let id = run.id.clone();
        storage.insert_run(&run).await.unwrap();

        // Completed requires processing first.
        assert!(!storage.mark_completed(&id, 5).await.unwrap());
        assert!(storage.mark_processing(&id).await.unwrap());
        assert!(!storage.mark_processing(&id).await.unwrap());
    }

    #[tokio::test]
    async fn progress_log_is_ordered_and_append_only() {
        let storage = test_storage().await;
        let run = ResearchRun::new("acme.io", "developer tools");
        let id = run.id.clone();
        storage.insert_run(&run).await.unwrap();

        storage.append_progress(&id, "Generating seeds", 0).await.unwrap();
        storage.append_progress(&id, "Expanding \"seo tools\"", 1).await.unwrap();
        storage.append_progress(&id, "Scoring candidates", 0).await.unwrap();

        let log = storage.list_progress(&id).await.expect("list progress");
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].seq, 1);
        assert_eq!(log[1].seq, 2);
        assert_eq!(log[2].seq, 3);
        assert_eq!(log[1].message, "Expanding \"seo tools\"");
        assert_eq!(log[1].indent, 1);
        assert_eq!(log[2].indent, 0);
    }

    #[tokio::test]
    async fn keywords_roundtrip_and_rank() {
        let storage = test_storage().await;
        let run = ResearchRun::new("acme.io", "developer tools");
        let id = run.id.clone();
        storage.insert_run(&run).await.unwrap();

        storage
            .insert_keyword(&sample_keyword(&id, "keyword research", 60))
            .await
            .unwrap();
        storage
            .insert_keyword(&sample_keyword(&id, "seo tools", 85))
            .await
            .unwrap();
        storage
            .insert_keyword(&sample_keyword(&id, "content ideas", 40))
            .await
            .unwrap();

        let all = storage.list_keywords(&id, false).await.expect("list");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].text, "seo tools");
        assert_eq!(all[2].text, "content ideas");
        assert_eq!(all[0].sources, vec!["seed", "autocomplete"]);
        assert_eq!(all[0].intent, SearchIntent::Commercial);
    }

    #[tokio::test]
    async fn cluster_annotation_updates_in_place() {
        let storage = test_storage().await;
        let run = ResearchRun::new("acme.io", "developer tools");
        let id = run.id.clone();
        storage.insert_run(&run).await.unwrap();

        let rep = sample_keyword(&id, "seo tools", 85);
        let member = sample_keyword(&id, "tools for seo", 70);
        let loner = sample_keyword(&id, "content marketing", 60);
        storage.insert_keyword(&rep).await.unwrap();
        storage.insert_keyword(&member).await.unwrap();
        storage.insert_keyword(&loner).await.unwrap();

        storage
            .annotate_cluster_representative(&rep.id, 1, 2, &["tools for seo".into()])
            .await
            .unwrap();
        storage.annotate_cluster_member(&member.id, 1).await.unwrap();

        let all = storage.list_keywords(&id, false).await.unwrap();
        assert_eq!(all.len(), 3, "annotation never removes rows");

        let rep_row = all.iter().find(|k| k.text == "seo tools").unwrap();
        assert_eq!(rep_row.cluster_id, Some(1));
        assert!(rep_row.is_representative);
        assert_eq!(rep_row.cluster_size, 2);
        assert_eq!(rep_row.cluster_siblings, vec!["tools for seo"]);

        let member_row = all.iter().find(|k| k.text == "tools for seo").unwrap();
        assert_eq!(member_row.cluster_id, Some(1));
        assert!(!member_row.is_representative);

        // Representatives view: the representative plus the unclustered row.
        let reps = storage.list_keywords(&id, true).await.unwrap();
        let texts: Vec<&str> = reps.iter().map(|k| k.text.as_str()).collect();
        assert_eq!(texts, vec!["seo tools", "content marketing"]);
    }

    #[tokio::test]
    async fn list_runs_newest_first() {
        let storage = test_storage().await;
        let first = ResearchRun::new("first.io", "niche one");
        let second = ResearchRun::new("second.io", "niche two");
        storage.insert_run(&first).await.unwrap();
        storage.insert_run(&second).await.unwrap();

        let runs = storage.list_runs().await.expect("list runs");
        assert_eq!(runs.len(), 2);
    }
}
