//! Report delivery
//!
//! This module holds the record-type directory, the mail transport seam and
//! the notifier that sends one mail per report cell.

pub mod directory;
pub mod mailer;
pub mod notifier;

// Re-export commonly used items
pub use directory::{DirectoryEntry, RecordTypeDirectory};
pub use mailer::{SendMail, SmtpMailer};
pub use notifier::{Notifier, NotifySummary};
