//! One mail per non-empty report cell

use log::{error, info, warn};
use std::sync::Arc;

use crate::core::constants::report;
use crate::notify::directory::RecordTypeDirectory;
use crate::notify::mailer::SendMail;
use crate::reporting::collator::{Accumulator, Bucket};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifySummary {
    pub sent: usize,
    pub failed: usize,
    /// Cells whose record type has no directory entry
    pub skipped: usize,
}

pub struct Notifier {
    mailer: Arc<dyn SendMail>,
    smtp_server: String,
    from_mail: String,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn SendMail>,
        smtp_server: impl Into<String>,
        from_mail: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            smtp_server: smtp_server.into(),
            from_mail: from_mail.into(),
        }
    }

    /// Send every non-empty cell, bucket by bucket. Failures are logged and
    /// counted; nothing is retried.
    pub async fn notify(
        &self,
        accumulator: &Accumulator,
        directory: &RecordTypeDirectory,
    ) -> NotifySummary {
        let mut summary = NotifySummary::default();

        for (bucket, record_type, body) in accumulator.cells() {
            let Some(entry) = directory.get(record_type) else {
                warn!("no mailing list entry for record type {record_type}, dropping {bucket} report");
                summary.skipped += 1;
                continue;
            };

            let subject = subject_for(&entry.display_name, bucket);
            match self
                .mailer
                .send(
                    &self.smtp_server,
                    &entry.recipients,
                    &self.from_mail,
                    body,
                    &subject,
                )
                .await
            {
                Ok(()) => {
                    info!("sent '{subject}' to {}", entry.recipients.join(", "));
                    summary.sent += 1;
                }
                Err(err) => {
                    error!("couldn't send '{subject}': {err}");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

/// `[urlchecker <display name>] <bucket subject>`
pub fn subject_for(display_name: &str, bucket: Bucket) -> String {
    format!(
        "[{} {display_name}] {}",
        report::SUBJECT_TAG,
        bucket.subject()
    )
}
