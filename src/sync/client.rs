use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::sync::transport::{encode_path, Response, Transport};
use crate::tree::Snapshot;

/// Outcome of every sync call: data or a typed error, never a panic.
pub type Outcome<T> = Result<T, SyncError>;

/// How a content write ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The server accepted the content.
    Written,
    /// A newer write to the same path took over; this one's response is void.
    Superseded,
}

#[derive(Deserialize)]
struct TreeEnvelope {
    #[serde(default)]
    data: Option<Snapshot>,
}

#[derive(Deserialize)]
struct RenameEnvelope {
    data: RenameData,
}

#[derive(Deserialize)]
struct RenameData {
    result: Snapshot,
}

#[derive(Deserialize)]
struct DeleteReply {
    ok: bool,
}

struct InFlight {
    generation: u64,
    cancel: oneshot::Sender<()>,
}

#[derive(Default)]
struct WriteTable {
    next_generation: u64,
    entries: HashMap<String, InFlight>,
}

/// Client for the document store's file API.
///
/// Cheap to clone; clones share the table of in-flight writes.
#[derive(Clone)]
pub struct SyncClient {
    transport: Arc<dyn Transport>,
    writes: Arc<Mutex<WriteTable>>,
}

impl SyncClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            writes: Arc::new(Mutex::new(WriteTable::default())),
        }
    }

    /// `GET /files`. The snapshot is `None` when the body carries no `data`.
    pub async fn fetch_tree(&self) -> Outcome<Option<Snapshot>> {
        let res = self
            .transport
            .get("/files")
            .await
            .map_err(|e| tree_failed(e.to_string()))?;
        if !res.is_success() {
            return Err(tree_failed(format!(
                "{}: Could not retrieve file tree",
                res.status
            )));
        }
        let envelope: TreeEnvelope =
            serde_json::from_str(&res.body).map_err(|e| tree_failed(e.to_string()))?;
        info!("fetched file tree");
        Ok(envelope.data)
    }

    /// `GET /files/{rel_path}`, returning the raw text.
    pub async fn read_file(&self, rel_path: &str) -> Outcome<String> {
        let path = format!("/files/{}", encode_path(rel_path));
        let res = self.transport.get(&path).await.map_err(|e| {
            warn!(path = %rel_path, error = %e, "read failed");
            SyncError::FileReadFailed {
                detail: e.to_string(),
                not_found: false,
            }
        })?;
        if !res.is_success() {
            warn!(path = %rel_path, status = res.status, "read failed");
            return Err(SyncError::FileReadFailed {
                detail: format!("{}: Could not get file; does it exist?", res.status),
                not_found: res.status == 404,
            });
        }
        debug!(path = %rel_path, bytes = res.body.len(), "read file");
        Ok(res.body)
    }

    /// `POST /files` with `filename` and `content`.
    ///
    /// Starting a write cancels any write still in flight for the same path.
    /// The cancelled call resolves to `WriteStatus::Superseded` whatever the
    /// server eventually says about it.
    pub async fn write_file(&self, rel_path: &str, content: &str) -> Outcome<WriteStatus> {
        let (generation, mut cancelled) = self.begin_write(rel_path);
        let request = self.transport.post_form(
            "/files",
            vec![
                ("filename", rel_path.to_string()),
                ("content", content.to_string()),
            ],
        );

        let result = tokio::select! {
            biased;
            _ = &mut cancelled => None,
            res = request => Some(res),
        };
        let still_current = self.finish_write(rel_path, generation);

        let result = match result {
            Some(result) if still_current => result,
            _ => {
                debug!(path = %rel_path, generation, "write superseded");
                return Ok(WriteStatus::Superseded);
            }
        };
        match result {
            Ok(res) if res.is_success() => {
                debug!(path = %rel_path, generation, "wrote file");
                Ok(WriteStatus::Written)
            }
            Ok(res) => Err(write_failed(rel_path, format!("{}: Could not update file", res.status))),
            Err(e) => Err(write_failed(rel_path, e.to_string())),
        }
    }

    /// `POST /rename`; returns the server's canonical node for the new name.
    pub async fn rename_file(&self, rel_path: &str, new_name: &str) -> Outcome<Snapshot> {
        let res = self
            .transport
            .post_form(
                "/rename",
                vec![
                    ("filename", rel_path.to_string()),
                    ("new_filename", new_name.to_string()),
                ],
            )
            .await
            .map_err(|e| rename_failed(e.to_string()))?;
        if !res.is_success() {
            return Err(rename_failed(format!("{}: Could not rename file", res.status)));
        }
        let envelope: RenameEnvelope =
            serde_json::from_str(&res.body).map_err(|e| rename_failed(e.to_string()))?;
        info!(from = %rel_path, to = %envelope.data.result.name(), "renamed on server");
        Ok(envelope.data.result)
    }

    /// `POST /delete`. A body of `{"ok": false}` is a failure even on 200.
    pub async fn delete_file(&self, rel_path: &str) -> Outcome<()> {
        let res = self
            .transport
            .post_form("/delete", vec![("filename", rel_path.to_string())])
            .await
            .map_err(|e| delete_failed(e.to_string()))?;
        check_delete(res)?;
        info!(path = %rel_path, "deleted on server");
        Ok(())
    }

    /// Whether a write for `rel_path` is currently outstanding.
    pub fn has_in_flight(&self, rel_path: &str) -> bool {
        self.writes.lock().entries.contains_key(rel_path)
    }

    pub fn in_flight_count(&self) -> usize {
        self.writes.lock().entries.len()
    }

    fn begin_write(&self, rel_path: &str) -> (u64, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let mut table = self.writes.lock();
        table.next_generation += 1;
        let generation = table.next_generation;
        let previous = table.entries.insert(
            rel_path.to_string(),
            InFlight {
                generation,
                cancel: tx,
            },
        );
        if let Some(previous) = previous {
            let _ = previous.cancel.send(());
            debug!(path = %rel_path, cancelled = previous.generation, "cancelling in-flight write");
        }
        (generation, rx)
    }

    /// Clear this write's token unless a newer write owns the slot.
    fn finish_write(&self, rel_path: &str, generation: u64) -> bool {
        let mut table = self.writes.lock();
        let owns_slot = table
            .entries
            .get(rel_path)
            .map(|entry| entry.generation == generation)
            .unwrap_or(false);
        if owns_slot {
            table.entries.remove(rel_path);
        }
        owns_slot
    }
}

fn check_delete(res: Response) -> Outcome<()> {
    if !res.is_success() {
        return Err(delete_failed(format!("{}: Could not delete file", res.status)));
    }
    let reply: DeleteReply =
        serde_json::from_str(&res.body).map_err(|e| delete_failed(e.to_string()))?;
    if !reply.ok {
        return Err(delete_failed(
            "Backend error occurred during deletion. See logs".into(),
        ));
    }
    Ok(())
}

fn tree_failed(detail: String) -> SyncError {
    warn!(%detail, "tree fetch failed");
    SyncError::TreeFetchFailed { detail }
}

fn write_failed(rel_path: &str, detail: String) -> SyncError {
    warn!(path = %rel_path, %detail, "write failed");
    SyncError::FileWriteFailed { detail }
}

fn rename_failed(detail: String) -> SyncError {
    warn!(%detail, "rename failed");
    SyncError::RenameFailed { detail }
}

fn delete_failed(detail: String) -> SyncError {
    warn!(%detail, "delete failed");
    SyncError::DeleteFailed { detail }
}
