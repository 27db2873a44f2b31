//! Command handlers for CLI subcommands.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Value, json};
use tracing::info;

use handover_core::app::{App, AppBuilder};
use handover_core::config::HandoverConfig;
use handover_core::domain::{Notification, NotificationKey, OwnershipRow, WorkerId};
use handover_core::impls::{
    InMemoryAbsenceCalendar, InMemoryNotificationSink, InMemoryOutcomeArchive,
    InMemoryOwnershipStore, RecordingEventSink, StaticSubstituteMatcher,
};
use handover_core::ports::{Clock, SystemClock, UlidGenerator};

use crate::cli::Commands;
use crate::fixture::Fixture;

/// In-memory ports seeded from a fixture, plus the app wired on top.
struct Session {
    app: App,
    store: Arc<InMemoryOwnershipStore>,
    notifications: Arc<InMemoryNotificationSink>,
    archive: Arc<InMemoryOutcomeArchive>,
    events: Arc<RecordingEventSink>,
    seen: HashSet<NotificationKey>,
}

impl Session {
    async fn open(fixture: &Fixture, config: HandoverConfig) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store = Arc::new(InMemoryOwnershipStore::new());
        for row in &fixture.ownership {
            store.insert_row(*row).await?;
        }

        let matcher = Arc::new(StaticSubstituteMatcher::new());
        for entry in &fixture.substitutes {
            matcher.set(entry.absent_worker_id, entry.task_id, entry.substitute_id);
        }

        let calendar = Arc::new(InMemoryAbsenceCalendar::new(fixture.absences.iter().copied()));

        let notifications = Arc::new(InMemoryNotificationSink::with_ttl(
            Arc::clone(&clock),
            config.notification_ttl,
        ));
        notifications
            .restore(fixture.notifications.iter().cloned())
            .await;

        let archive = Arc::new(InMemoryOutcomeArchive::new(
            Arc::clone(&clock),
            Arc::new(UlidGenerator::new(Arc::clone(&clock))),
        ));
        let events = Arc::new(RecordingEventSink::new());

        let app = AppBuilder::new()
            .ownership_store(store.clone())
            .substitute_matcher(matcher)
            .absence_calendar(calendar)
            .notification_sink(notifications.clone())
            .outcome_archive(archive.clone())
            .event_sink(events.clone())
            .clock(clock)
            .config(config)
            .build()?;

        Ok(Self {
            app,
            store,
            notifications,
            archive,
            events,
            seen: fixture.notifications.iter().map(|n| n.key).collect(),
        })
    }

    /// Drain pending effects and collect what this run produced.
    async fn close(self, result: Value) -> Result<(Value, Vec<OwnershipRow>, Vec<Notification>)> {
        let Session {
            app,
            store,
            notifications,
            archive,
            events,
            seen,
        } = self;
        app.shutdown().await;

        let expired = notifications.purge_expired().await;
        if expired > 0 {
            info!(expired, "expired notifications dropped");
        }
        let kept = notifications.all().await;
        let sent: Vec<&Notification> = kept.iter().filter(|n| !seen.contains(&n.key)).collect();

        let output = json!({
            "result": result,
            "notifications": sent,
            "archived": archive.entries().await,
            "events": events.events().await,
        });
        let ownership = store
            .snapshot()
            .await
            .into_iter()
            .map(OwnershipRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((output, ownership, kept))
    }
}

/// Execute a CLI command against the fixture at `path`.
pub async fn execute(command: Commands, path: &Path, save: bool) -> Result<()> {
    let mut fixture = Fixture::load(path)?;
    let config = HandoverConfig::from_env()?;

    if let Commands::Inbox { worker } = command {
        return cmd_inbox(&fixture, config, WorkerId::new(worker)).await;
    }

    let session = Session::open(&fixture, config).await?;
    let result = match command {
        Commands::Reallocate { worker } => {
            serde_json::to_value(session.app.reallocate(WorkerId::new(worker)).await?)?
        }
        Commands::Return { worker } => {
            serde_json::to_value(session.app.return_tasks(WorkerId::new(worker)).await?)?
        }
        Commands::SweepAbsences { date } => {
            serde_json::to_value(session.app.run_scheduled_reallocation(date).await?)?
        }
        Commands::SweepReturns { date } => {
            serde_json::to_value(session.app.run_scheduled_return(date).await?)?
        }
        Commands::Inbox { .. } => Value::Null,
    };

    let (output, ownership, notifications) = session.close(result).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if save {
        fixture.ownership = ownership;
        fixture.notifications = notifications;
        fixture.save(path)?;
        info!(path = %path.display(), "fixture updated");
    }
    Ok(())
}

async fn cmd_inbox(fixture: &Fixture, config: HandoverConfig, worker: WorkerId) -> Result<()> {
    let sink = InMemoryNotificationSink::with_ttl(Arc::new(SystemClock), config.notification_ttl);
    sink.restore(fixture.notifications.iter().cloned()).await;
    let inbox = sink.inbox(worker).await;
    println!("{}", serde_json::to_string_pretty(&inbox)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use handover_core::domain::{AbsenceRecord, TaskId};

    use crate::fixture::SubstituteEntry;

    fn fixture() -> Fixture {
        Fixture {
            ownership: vec![
                OwnershipRow {
                    task_id: 1,
                    original_owner_id: 7,
                    acting_owner_id: 7,
                },
                OwnershipRow {
                    task_id: 2,
                    original_owner_id: 7,
                    acting_owner_id: 7,
                },
            ],
            absences: vec![AbsenceRecord::absent(
                WorkerId::new(7),
                Utc::now().date_naive(),
            )],
            substitutes: vec![
                SubstituteEntry {
                    absent_worker_id: WorkerId::new(7),
                    task_id: TaskId::new(1),
                    substitute_id: None,
                },
                SubstituteEntry {
                    absent_worker_id: WorkerId::new(7),
                    task_id: TaskId::new(2),
                    substitute_id: Some(WorkerId::new(9)),
                },
            ],
            notifications: Vec::new(),
        }
    }

    #[tokio::test]
    async fn session_reports_new_notifications_and_updated_rows() {
        let session = Session::open(&fixture(), HandoverConfig::default())
            .await
            .unwrap();
        let outcomes = session.app.reallocate(WorkerId::new(7)).await.unwrap();
        let result = serde_json::to_value(&outcomes).unwrap();

        let (output, ownership, notifications) = session.close(result).await.unwrap();

        assert_eq!(output["notifications"].as_array().unwrap().len(), 2);
        assert_eq!(output["archived"].as_array().unwrap().len(), 2);
        assert_eq!(ownership[1].acting_owner_id, 9);
        assert_eq!(notifications.len(), 2);
    }

    #[tokio::test]
    async fn invalid_rows_are_rejected_on_load() {
        let mut bad = fixture();
        bad.ownership[0].task_id = 0;

        let result = Session::open(&bad, HandoverConfig::default()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn sweep_with_explicit_date_uses_it() {
        let session = Session::open(&fixture(), HandoverConfig::default())
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();

        let report = session
            .app
            .run_scheduled_reallocation(Some(date))
            .await
            .unwrap();

        assert_eq!(report.date, date);
        assert_eq!(report.processed_count, 0);
    }

    #[tokio::test]
    async fn out_of_range_substitute_leaves_fixture_loadable() {
        let mut input = fixture();
        input.substitutes[1].substitute_id = Some(WorkerId::new(u64::MAX));
        let session = Session::open(&input, HandoverConfig::default())
            .await
            .unwrap();

        let outcomes = session.app.reallocate(WorkerId::new(7)).await.unwrap();
        assert!(outcomes.iter().all(|o| !o.reallocated));
        let (_, ownership, _) = session.close(Value::Null).await.unwrap();

        assert_eq!(ownership[1].acting_owner_id, 7);
        let reloaded = Fixture {
            ownership,
            ..Fixture::default()
        };
        assert!(Session::open(&reloaded, HandoverConfig::default()).await.is_ok());
    }
}
