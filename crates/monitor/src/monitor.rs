use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use heartwatch_core::config::MonitorConfig;
use heartwatch_core::{
    apply_configuration, evaluate_downtime, evaluate_heartbeat, ConfigureRequest,
    DowntimeDecision, HeartbeatOutcome, NotificationKind, ScheduleRecord,
};
use heartwatch_notify::Dispatcher;
use heartwatch_queue::{encode_heartbeat, parse_batch, QueueConsumer, QueueProducer};
use heartwatch_storage::RecordStore;

use crate::error::MonitorError;
use crate::report::{PollReport, Recorded, SweepFailure, SweepReport};

/// Messages requested per receive call unless overridden.
pub const DEFAULT_BATCH_SIZE: u32 = 10;

/// Ties the record store, the alert dispatcher and the decision logic in
/// `heartwatch_core` together. Every operation takes the clock as a
/// parameter.
pub struct Monitor {
    store: Arc<dyn RecordStore>,
    dispatcher: Dispatcher,
    settings: MonitorConfig,
    batch_size: u32,
}

impl Monitor {
    pub fn new(store: Arc<dyn RecordStore>, dispatcher: Dispatcher, settings: MonitorConfig) -> Self {
        Self {
            store,
            dispatcher,
            settings,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Messages requested per queue receive.
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Record a heartbeat for `name` observed at `event_time`.
    ///
    /// The updated record is written before any alert goes out. Store
    /// failures are reported as a configuration alert instead of an error;
    /// only a failed dispatch is returned to the caller.
    pub async fn record(&self, name: &str, event_time: i64) -> Result<Recorded, MonitorError> {
        let current = match self.store.get(name).await {
            Ok(current) => current,
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to read record");
                return self.config_error(name).await;
            }
        };

        match evaluate_heartbeat(current.as_ref(), event_time) {
            HeartbeatOutcome::Stale => {
                debug!(name = %name, event_time, "Ignoring stale heartbeat");
                Ok(Recorded::Stale)
            }
            HeartbeatOutcome::UnknownEvent => {
                warn!(name = %name, "Heartbeat for unconfigured event");
                self.config_error(name).await
            }
            HeartbeatOutcome::Misconfigured(e) => {
                warn!(name = %name, error = %e, "Cannot schedule event");
                self.config_error(name).await
            }
            HeartbeatOutcome::Accepted { record, notification } => {
                if let Err(e) = self.store.put(&record).await {
                    warn!(name = %name, error = %e, "Failed to write record");
                    return self.config_error(name).await;
                }
                debug!(
                    name = %name,
                    event_time,
                    next_block_time = ?record.next_block_time,
                    "Heartbeat recorded"
                );
                if let Some(kind) = notification {
                    self.dispatcher.notify(kind, name, current.as_ref()).await?;
                }
                Ok(Recorded::Accepted { notification })
            }
        }
    }

    async fn config_error(&self, name: &str) -> Result<Recorded, MonitorError> {
        self.dispatcher
            .notify(NotificationKind::ConfigError, name, None)
            .await?;
        Ok(Recorded::ConfigError)
    }

    /// Raise Down alerts for every enabled record whose deadline has passed.
    ///
    /// A record that cannot be written or alerted on is collected in the
    /// report and the sweep moves on.
    pub async fn sweep(&self, now: i64) -> Result<SweepReport, MonitorError> {
        let records = self.store.scan().await?;
        let mut report = SweepReport::default();

        for record in &records {
            report.checked += 1;
            let decision = evaluate_downtime(record, now, self.settings.max_notify_count);

            let Some(updated) = decision.updated() else {
                if decision == DowntimeDecision::Unschedulable {
                    warn!(name = %record.name, "Record has a due time but no period; skipping");
                }
                continue;
            };

            if let Err(e) = self.store.put(updated).await {
                warn!(name = %record.name, error = %e, "Failed to write record during sweep");
                report.failures.push(SweepFailure::new(&record.name, e));
                continue;
            }

            match decision {
                DowntimeDecision::Notify { .. } => {
                    match self
                        .dispatcher
                        .notify(NotificationKind::Down, &record.name, Some(record))
                        .await
                    {
                        Ok(()) => report.notified += 1,
                        Err(e) => {
                            warn!(name = %record.name, error = %e, "Down alert failed");
                            report.failures.push(SweepFailure::new(&record.name, e));
                        }
                    }
                }
                _ => {
                    debug!(
                        name = %record.name,
                        error_count = updated.error_count,
                        "Down alert suppressed; notify budget spent"
                    );
                    report.suppressed += 1;
                }
            }
        }

        info!(
            checked = report.checked,
            notified = report.notified,
            suppressed = report.suppressed,
            failures = report.failures.len(),
            "Sweep complete"
        );
        Ok(report)
    }

    /// Drain up to `poll_count` batches from the queue, then sweep.
    ///
    /// Each batch is handled in arrival order before the next one is
    /// fetched. A message is acked once it has been recorded; messages that
    /// cannot be parsed are acked and dropped so they are not redelivered.
    pub async fn poll(&self, consumer: &dyn QueueConsumer, now: i64) -> Result<PollReport, MonitorError> {
        let mut report = PollReport::default();

        for _ in 0..self.settings.poll_count {
            let messages = consumer.poll_batch(self.batch_size).await?;
            if messages.is_empty() {
                break;
            }
            report.received += messages.len();

            let (heartbeats, rejected) = parse_batch(&messages);

            for (msg, e) in rejected {
                warn!(message_id = %msg.id, error = %e, "Dropping unreadable heartbeat");
                report.rejected += 1;
                ack(consumer, &msg.receipt_handle).await;
            }

            for (msg, heartbeat) in heartbeats {
                let event_time = if self.settings.use_server_time { now } else { heartbeat.time };
                match self.record(&heartbeat.name, event_time).await {
                    Ok(Recorded::Accepted { .. }) => report.recorded += 1,
                    Ok(Recorded::Stale) => report.stale += 1,
                    Ok(Recorded::ConfigError) => report.config_errors += 1,
                    Err(e) => {
                        error!(name = %heartbeat.name, error = %e, "Alert for heartbeat failed");
                        report.dispatch_failures += 1;
                    }
                }
                ack(consumer, &msg.receipt_handle).await;
            }
        }

        report.sweep = self.sweep(now).await?;
        Ok(report)
    }

    /// Poll on `run_interval_secs` until `shutdown` resolves.
    pub async fn run<F>(&self, consumer: &dyn QueueConsumer, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(Duration::from_secs(self.settings.run_interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.settings.run_interval_secs, "Monitor loop started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Monitor loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let now = Utc::now().timestamp();
                    match self.poll(consumer, now).await {
                        Ok(report) => info!(
                            received = report.received,
                            recorded = report.recorded,
                            notified = report.sweep.notified,
                            "Poll cycle complete"
                        ),
                        Err(e) => error!(error = %e, "Poll cycle failed"),
                    }
                }
            }
        }
    }

    /// Create or update the schedule for `name`.
    pub async fn configure(
        &self,
        name: &str,
        request: &ConfigureRequest,
        now: DateTime<Utc>,
    ) -> Result<ScheduleRecord, MonitorError> {
        let existing = self.store.get(name).await?;
        let record = apply_configuration(existing.as_ref(), name, request, now).map_err(|source| {
            MonitorError::Configure {
                name: name.to_string(),
                source,
            }
        })?;
        self.store.put(&record).await?;

        info!(
            name = %name,
            created = existing.is_none(),
            period_seconds = ?record.period_seconds,
            period_type = ?record.period_type,
            enabled = record.enabled,
            "Event configured"
        );
        Ok(record)
    }

    /// Stored records sorted by name, optionally only the one called `name`.
    pub async fn show(&self, name: Option<&str>) -> Result<Vec<ScheduleRecord>, MonitorError> {
        let mut records = self.store.scan().await?;
        if let Some(name) = name {
            records.retain(|r| r.name == name);
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}

/// Enqueue a heartbeat for `name` at `time`, returning the message id.
pub async fn send_heartbeat(producer: &dyn QueueProducer, name: &str, time: i64) -> Result<String, MonitorError> {
    let id = producer.send(&encode_heartbeat(name, time)).await?;
    info!(name = %name, time, message_id = %id, "Heartbeat sent");
    Ok(id)
}

async fn ack(consumer: &dyn QueueConsumer, receipt_handle: &str) {
    if let Err(e) = consumer.ack(receipt_handle).await {
        warn!(error = %e, "Failed to ack message; it will be redelivered");
    }
}
