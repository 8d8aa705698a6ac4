//! Event storage.
//!
//! Two interchangeable strategies sit behind [`EventStore`]:
//! - [`LocalStore`]: a JSON file on disk, written directly.
//! - [`RemoteStore`]: a sync server reached over a WebSocket, which owns the
//!   durable copy and pushes snapshots to every connected client.
//!
//! Callers hold an `Arc<dyn EventStore>` chosen at startup and never need to
//! know which one is active.

mod backoff;
mod file;
mod local;
mod remote;

pub use backoff::ReconnectPolicy;
pub use file::EventFile;
pub use local::LocalStore;
pub use remote::{RemoteStore, RemoteStoreOptions};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::VcalResult;
use crate::event::{Event, EventDraft};

/// CRUD over the event collection, plus a stream of collection snapshots.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// The current collection.
    async fn list_events(&self) -> VcalResult<Vec<Event>>;

    /// Store a new event under a freshly assigned id.
    async fn create_event(&self, draft: EventDraft) -> VcalResult<Event>;

    /// Replace the event with the same id. Fails with `NotFound` if there is none.
    async fn update_event(&self, event: Event) -> VcalResult<Event>;

    /// Remove the event with this id. Removing an unknown id is a no-op.
    async fn delete_event(&self, id: &str) -> VcalResult<()>;

    /// Receives the full collection after every change.
    fn subscribe(&self) -> watch::Receiver<Vec<Event>>;
}
