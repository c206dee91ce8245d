use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::sync::client::{Outcome, SyncClient, WriteStatus};
use crate::tree::index::is_same_or_descendant;

type SettledFn = Arc<dyn Fn(String, Outcome<WriteStatus>) + Send + Sync>;

struct Pending {
    timer: JoinHandle<()>,
    content: String,
    /// Set once the quiet period is over and the write has been handed
    /// to the client.
    fired: Arc<AtomicBool>,
}

impl Pending {
    fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Coalesces rapid edits into one write per quiet period.
///
/// At most one timer per path: a new edit replaces the previous timer,
/// and only a timer firing issues `SyncClient::write_file`.
pub struct WriteScheduler {
    client: SyncClient,
    delay: Duration,
    pending: HashMap<String, Pending>,
    on_settled: SettledFn,
}

impl WriteScheduler {
    pub fn new(
        client: SyncClient,
        delay: Duration,
        on_settled: impl Fn(String, Outcome<WriteStatus>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            client,
            delay,
            pending: HashMap::new(),
            on_settled: Arc::new(on_settled),
        }
    }

    /// Record an edit of `rel_path`, restarting its quiet-period timer.
    pub fn schedule(&mut self, rel_path: &str, content: String) {
        self.pending.retain(|_, p| !p.timer.is_finished());
        if let Some(previous) = self.pending.remove(rel_path) {
            previous.timer.abort();
        }
        self.insert(rel_path, content, self.delay);
    }

    /// Drop the entry for `rel_path` once its write has gone out. An edit
    /// made after that write is still waiting and is kept.
    pub fn settled(&mut self, rel_path: &str) {
        if self.pending.get(rel_path).is_some_and(Pending::has_fired) {
            self.pending.remove(rel_path);
        }
    }

    /// Number of edits still inside their quiet period.
    pub fn pending_count(&self) -> usize {
        self.pending.values().filter(|p| !p.has_fired()).count()
    }

    /// Send every edit still inside its quiet period now. Returns the
    /// writes, including ones already in flight, so callers can await them.
    pub fn flush(&mut self) -> Vec<JoinHandle<()>> {
        let mut writes = Vec::new();
        for (path, pending) in self.pending.drain().collect::<Vec<_>>() {
            if pending.has_fired() {
                writes.push(pending.timer);
                continue;
            }
            pending.timer.abort();
            debug!(path = %path, "flushing pending write");
            let (timer, _) = self.spawn_write(&path, pending.content, Duration::ZERO);
            writes.push(timer);
        }
        writes
    }

    /// Move pending edits at or under `old` along with a rename so they
    /// land on the new path.
    pub fn path_moved(&mut self, old: &str, new: &str) {
        for path in self.paths_under(old) {
            let Some(pending) = self.pending.remove(&path) else {
                continue;
            };
            if pending.has_fired() {
                continue;
            }
            pending.timer.abort();
            let moved = format!("{}{}", new, &path[old.len()..]);
            self.schedule(&moved, pending.content);
        }
    }

    /// Forget pending edits at or under a path that no longer exists.
    pub fn cancel(&mut self, rel_path: &str) {
        for path in self.paths_under(rel_path) {
            if let Some(pending) = self.pending.remove(&path) {
                pending.timer.abort();
            }
        }
    }

    fn paths_under(&self, rel_path: &str) -> Vec<String> {
        self.pending
            .keys()
            .filter(|p| is_same_or_descendant(p, rel_path))
            .cloned()
            .collect()
    }

    fn insert(&mut self, rel_path: &str, content: String, delay: Duration) {
        let (timer, fired) = self.spawn_write(rel_path, content.clone(), delay);
        self.pending.insert(
            rel_path.to_string(),
            Pending {
                timer,
                content,
                fired,
            },
        );
    }

    fn spawn_write(
        &self,
        rel_path: &str,
        content: String,
        delay: Duration,
    ) -> (JoinHandle<()>, Arc<AtomicBool>) {
        let client = self.client.clone();
        let on_settled = self.on_settled.clone();
        let path = rel_path.to_string();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let timer = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            flag.store(true, Ordering::Release);
            // The write runs on its own task so a later edit aborting this
            // timer cannot tear down a request that is already out.
            let write = tokio::spawn(async move {
                let outcome = client.write_file(&path, &content).await;
                on_settled(path, outcome);
            });
            let _ = write.await;
        });
        (timer, fired)
    }
}

impl Drop for WriteScheduler {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.timer.abort();
        }
    }
}
