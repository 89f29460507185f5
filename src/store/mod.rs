//! Persistent store for generations and model results, backed by DuckDB.
//!
//! Architecture:
//! - `Store` is the public API, holding an `mpsc::Sender<StoreCommand>`
//! - `StoreWorker` runs on `std::thread::spawn` (DuckDB is sync) and owns the
//!   connection; each command is one short statement, replied to over a
//!   `tokio::sync::oneshot`
//! - Callers never hold anything across a provider round trip; concurrent
//!   inserts from sibling tasks queue for microseconds, not for each other's
//!   network calls

pub mod schema;

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc;

use tokio::sync::oneshot;

use crate::cost::Cost;
use crate::error::StoreError;
use crate::model::{Generation, GenerationWithResults, ModelResult, Visibility};

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

enum StoreCommand {
    InsertGeneration {
        generation: Generation,
        reply: Reply<()>,
    },
    InsertResult {
        result: ModelResult,
        reply: Reply<()>,
    },
    GetGeneration {
        id: String,
        reply: Reply<Option<Generation>>,
    },
    ResultsFor {
        generation_id: String,
        reply: Reply<Vec<ModelResult>>,
    },
    CountVisible {
        owner_id: String,
        reply: Reply<u64>,
    },
    ListVisible {
        owner_id: String,
        limit: u64,
        offset: u64,
        reply: Reply<Vec<GenerationWithResults>>,
    },
    ListOwned {
        owner_id: String,
        limit: u64,
        reply: Reply<Vec<GenerationWithResults>>,
    },
    Shutdown,
}

/// Async handle to the store worker. Share it behind an `Arc`.
pub struct Store {
    tx: mpsc::Sender<StoreCommand>,
    worker_handle: Option<std::thread::JoinHandle<()>>,
}

impl Store {
    /// Open (or create) the database file and apply migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = duckdb::Connection::open(path)?;
        Self::start(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::start(duckdb::Connection::open_in_memory()?)
    }

    fn start(conn: duckdb::Connection) -> Result<Self, StoreError> {
        schema::apply_migrations(&conn)?;

        // Unbounded: result inserts must never be dropped or block a runtime thread.
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("versus-store".into())
            .spawn(move || StoreWorker { rx, conn }.run())?;

        Ok(Self {
            tx,
            worker_handle: Some(handle),
        })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> StoreCommand,
    ) -> Result<T, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .map_err(|_| StoreError::WorkerGone)?;
        rx.await.map_err(|_| StoreError::WorkerGone)?
    }

    pub async fn insert_generation(&self, generation: Generation) -> Result<(), StoreError> {
        self.request(|reply| StoreCommand::InsertGeneration { generation, reply })
            .await
    }

    pub async fn insert_result(&self, result: ModelResult) -> Result<(), StoreError> {
        self.request(|reply| StoreCommand::InsertResult { result, reply })
            .await
    }

    pub async fn get_generation(&self, id: &str) -> Result<Option<Generation>, StoreError> {
        let id = id.to_string();
        self.request(|reply| StoreCommand::GetGeneration { id, reply })
            .await
    }

    /// Results for one generation, in persistence order.
    pub async fn results_for(&self, generation_id: &str) -> Result<Vec<ModelResult>, StoreError> {
        let generation_id = generation_id.to_string();
        self.request(|reply| StoreCommand::ResultsFor {
            generation_id,
            reply,
        })
        .await
    }

    /// Number of generations owned by `owner_id` or public.
    pub async fn count_visible(&self, owner_id: &str) -> Result<u64, StoreError> {
        let owner_id = owner_id.to_string();
        self.request(|reply| StoreCommand::CountVisible { owner_id, reply })
            .await
    }

    /// Generations owned by `owner_id` or public, newest first.
    pub async fn list_visible(
        &self,
        owner_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<GenerationWithResults>, StoreError> {
        let owner_id = owner_id.to_string();
        self.request(|reply| StoreCommand::ListVisible {
            owner_id,
            limit,
            offset,
            reply,
        })
        .await
    }

    /// Generations owned by `owner_id`, newest first.
    pub async fn list_owned(
        &self,
        owner_id: &str,
        limit: u64,
    ) -> Result<Vec<GenerationWithResults>, StoreError> {
        let owner_id = owner_id.to_string();
        self.request(|reply| StoreCommand::ListOwned {
            owner_id,
            limit,
            reply,
        })
        .await
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let _ = self.tx.send(StoreCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Background worker
// ---------------------------------------------------------------------------

struct StoreWorker {
    rx: mpsc::Receiver<StoreCommand>,
    conn: duckdb::Connection,
}

impl StoreWorker {
    fn run(self) {
        loop {
            match self.rx.recv() {
                Ok(StoreCommand::InsertGeneration { generation, reply }) => {
                    let _ = reply.send(insert_generation(&self.conn, &generation));
                }
                Ok(StoreCommand::InsertResult { result, reply }) => {
                    let _ = reply.send(insert_result(&self.conn, &result));
                }
                Ok(StoreCommand::GetGeneration { id, reply }) => {
                    let _ = reply.send(get_generation(&self.conn, &id));
                }
                Ok(StoreCommand::ResultsFor {
                    generation_id,
                    reply,
                }) => {
                    let outcome = results_for(&self.conn, std::slice::from_ref(&generation_id))
                        .map(|mut by_id| by_id.remove(&generation_id).unwrap_or_default());
                    let _ = reply.send(outcome);
                }
                Ok(StoreCommand::CountVisible { owner_id, reply }) => {
                    let _ = reply.send(count_visible(&self.conn, &owner_id));
                }
                Ok(StoreCommand::ListVisible {
                    owner_id,
                    limit,
                    offset,
                    reply,
                }) => {
                    let _ = reply.send(list_visible(&self.conn, &owner_id, limit, offset));
                }
                Ok(StoreCommand::ListOwned {
                    owner_id,
                    limit,
                    reply,
                }) => {
                    let _ = reply.send(list_owned(&self.conn, &owner_id, limit));
                }
                Ok(StoreCommand::Shutdown) => {
                    tracing::debug!("store: worker shutting down");
                    break;
                }
                Err(_) => {
                    tracing::debug!("store: channel closed, worker exiting");
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// DuckDB takes LIMIT and OFFSET as BIGINT.
fn sql_bound(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

const GENERATION_COLUMNS: &str = "id, prompt, owner_id, visibility, created_at";

const RESULT_COLUMNS: &str = "id, generation_id, model_id, prompt, generated_payload, \
                              execution_time_ms, cost, error, created_at";

fn insert_generation(conn: &duckdb::Connection, generation: &Generation) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO generations (id, prompt, owner_id, visibility, created_at) \
         VALUES (?, ?, ?, ?, ?)",
        duckdb::params![
            generation.id,
            generation.prompt,
            generation.owner_id,
            generation.visibility.as_str(),
            generation.created_at,
        ],
    )?;
    Ok(())
}

fn insert_result(conn: &duckdb::Connection, result: &ModelResult) -> Result<(), StoreError> {
    conn.execute(
        &format!("INSERT INTO model_results ({RESULT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
        duckdb::params![
            result.id,
            result.generation_id,
            result.model_id,
            result.prompt,
            result.generated_payload,
            result.execution_time_ms as i64,
            result.cost.as_usd(),
            result.error,
            result.created_at,
        ],
    )?;
    Ok(())
}

fn map_generation(row: &duckdb::Row<'_>) -> duckdb::Result<Generation> {
    let visibility: String = row.get(3)?;
    Ok(Generation {
        id: row.get(0)?,
        prompt: row.get(1)?,
        owner_id: row.get(2)?,
        visibility: Visibility::from_column(&visibility),
        created_at: row.get(4)?,
    })
}

fn map_result(row: &duckdb::Row<'_>) -> duckdb::Result<ModelResult> {
    let execution_time_ms: i64 = row.get(5)?;
    Ok(ModelResult {
        id: row.get(0)?,
        generation_id: row.get(1)?,
        model_id: row.get(2)?,
        prompt: row.get(3)?,
        generated_payload: row.get(4)?,
        execution_time_ms: execution_time_ms.max(0) as u64,
        cost: Cost::from_column(row.get(6)?),
        error: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn get_generation(conn: &duckdb::Connection, id: &str) -> Result<Option<Generation>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GENERATION_COLUMNS} FROM generations WHERE id = ?"
    ))?;
    let mut rows = stmt.query(duckdb::params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(map_generation(row)?)),
        None => Ok(None),
    }
}

/// Results grouped by generation id, each group in persistence order.
fn results_for(
    conn: &duckdb::Connection,
    generation_ids: &[String],
) -> Result<HashMap<String, Vec<ModelResult>>, StoreError> {
    let mut grouped: HashMap<String, Vec<ModelResult>> = HashMap::new();
    if generation_ids.is_empty() {
        return Ok(grouped);
    }

    let placeholders = vec!["?"; generation_ids.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESULT_COLUMNS} FROM model_results \
         WHERE generation_id IN ({placeholders}) \
         ORDER BY created_at ASC, id ASC"
    ))?;
    let rows = stmt.query_map(duckdb::params_from_iter(generation_ids.iter()), map_result)?;
    for row in rows {
        let result = row?;
        grouped
            .entry(result.generation_id.clone())
            .or_default()
            .push(result);
    }
    Ok(grouped)
}

fn count_visible(conn: &duckdb::Connection, owner_id: &str) -> Result<u64, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM generations WHERE owner_id = ? OR visibility = 'public'",
    )?;
    let count: i64 = stmt.query_row(duckdb::params![owner_id], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

fn list_visible(
    conn: &duckdb::Connection,
    owner_id: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<GenerationWithResults>, StoreError> {
    let (limit, offset) = (sql_bound(limit), sql_bound(offset));
    let sql = format!(
        "SELECT {GENERATION_COLUMNS} FROM generations \
         WHERE owner_id = ? OR visibility = 'public' \
         ORDER BY created_at DESC, seq DESC \
         LIMIT {limit} OFFSET {offset}"
    );
    list_with_results(conn, &sql, owner_id)
}

fn list_owned(
    conn: &duckdb::Connection,
    owner_id: &str,
    limit: u64,
) -> Result<Vec<GenerationWithResults>, StoreError> {
    let limit = sql_bound(limit);
    let sql = format!(
        "SELECT {GENERATION_COLUMNS} FROM generations \
         WHERE owner_id = ? \
         ORDER BY created_at DESC, seq DESC \
         LIMIT {limit}"
    );
    list_with_results(conn, &sql, owner_id)
}

fn list_with_results(
    conn: &duckdb::Connection,
    sql: &str,
    owner_id: &str,
) -> Result<Vec<GenerationWithResults>, StoreError> {
    let generations = {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(duckdb::params![owner_id], map_generation)?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    let ids: Vec<String> = generations.iter().map(|g| g.id.clone()).collect();
    let mut results = results_for(conn, &ids)?;

    Ok(generations
        .into_iter()
        .map(|generation| {
            let results = results.remove(&generation.id).unwrap_or_default();
            GenerationWithResults {
                generation,
                results,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> duckdb::Connection {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        schema::apply_migrations(&conn).unwrap();
        conn
    }

    fn generation(id: &str, owner: &str, visibility: Visibility, created_at: i64) -> Generation {
        Generation {
            id: id.to_string(),
            prompt: format!("prompt {id}"),
            owner_id: owner.to_string(),
            visibility,
            created_at,
        }
    }

    #[test]
    fn unknown_cost_reads_back_as_unknown() {
        let conn = conn();
        insert_generation(&conn, &generation("g1", "o", Visibility::Public, 1)).unwrap();
        let priced = ModelResult::success("g1", "a", "p", "x".into(), 5, Cost::Unknown);
        let failed = ModelResult::failure("g1", "b", "p", "boom".into(), 7);
        insert_result(&conn, &priced).unwrap();
        insert_result(&conn, &failed).unwrap();

        let by_id = results_for(&conn, &["g1".to_string()]).unwrap();
        let results = &by_id["g1"];
        assert_eq!(results.len(), 2);
        let a = results.iter().find(|r| r.model_id == "a").unwrap();
        let b = results.iter().find(|r| r.model_id == "b").unwrap();
        assert_eq!(a.cost, Cost::Unknown);
        assert_eq!(b.cost, Cost::ZERO);
        assert_eq!(b.error.as_deref(), Some("boom"));
        assert_eq!(b.execution_time_ms, 7);
    }

    #[test]
    fn private_generations_of_others_are_hidden() {
        let conn = conn();
        insert_generation(&conn, &generation("mine", "me", Visibility::Private, 1)).unwrap();
        insert_generation(&conn, &generation("theirs", "you", Visibility::Private, 2)).unwrap();
        insert_generation(&conn, &generation("public", "you", Visibility::Public, 3)).unwrap();

        assert_eq!(count_visible(&conn, "me").unwrap(), 2);
        let ids: Vec<String> = list_visible(&conn, "me", 10, 0)
            .unwrap()
            .into_iter()
            .map(|g| g.generation.id)
            .collect();
        assert_eq!(ids, vec!["public", "mine"]);
    }

    #[test]
    fn same_millisecond_orders_by_insertion() {
        let conn = conn();
        for id in ["first", "second", "third"] {
            insert_generation(&conn, &generation(id, "o", Visibility::Public, 42)).unwrap();
        }
        let ids: Vec<String> = list_owned(&conn, "o", 10)
            .unwrap()
            .into_iter()
            .map(|g| g.generation.id)
            .collect();
        assert_eq!(ids, vec!["third", "second", "first"]);
    }

    #[test]
    fn get_generation_missing_is_none() {
        let conn = conn();
        assert!(get_generation(&conn, "nope").unwrap().is_none());
    }
}
