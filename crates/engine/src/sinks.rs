//! Notification sinks shipped with the engine.

use tokio::sync::mpsc;

use crate::{AlertEvent, stores::NotificationSink};

/// Logs every alert. The default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, event: AlertEvent) {
        tracing::info!(
            "alert {:?} for budget {} (user {}, {}): {} -> {}, {:.1}% used",
            event.kind,
            event.budget_id,
            event.user_id,
            event.period,
            event.from_status.as_str(),
            event.to_status.as_str(),
            event.percentage_used
        );
    }
}

/// Forwards alerts into an unbounded channel, for a delivery task that lives
/// elsewhere (push, email, tests).
#[derive(Clone, Debug)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<AlertEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlertEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&self, event: AlertEvent) {
        if let Err(err) = self.sender.send(event) {
            tracing::debug!("alert receiver dropped, discarding {}", err.0.id);
        }
    }
}
