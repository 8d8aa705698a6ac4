//! Core types for vcal.
//!
//! This crate is shared by the `vcal` CLI and `vcal-server`:
//! - `Event` and its recurrence rule
//! - the occurrence engine and month grid builder (pure, no I/O)
//! - the `EventStore` trait with a file-backed and a server-backed store
//! - the push-sync wire protocol
//! - the application controller and global configuration

pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod occurrence;
pub mod protocol;
pub mod recurrence;
pub mod store;

mod serde_util;

pub use app::{AppState, CalendarApp};
pub use config::{StoreKind, VcalConfig};
pub use error::{VcalError, VcalResult};
pub use event::{DEFAULT_COLOR, Event, EventDraft};
pub use grid::{DayCell, MonthGrid, build_grid};
pub use occurrence::occurrences_on;
pub use recurrence::{Recurrence, RecurrenceRule};
pub use store::{EventStore, LocalStore, RemoteStore, RemoteStoreOptions};
