//! Application state coordinator
//!
//! [`AppState`] owns the catalog, guide, favorites, history and playback
//! controller, and is the single place where ingestion failures are turned
//! into user notifications.

pub mod notification;
pub mod state;

pub use notification::{Notification, NotificationLevel, Notifier};
pub use state::{AppState, Collaborators, IngestSummary};
