use async_trait::async_trait;

use crate::models::Booking;

/// Narrow seam to whatever push/notification system fronts the app. The core
/// only ever announces lifecycle events; delivery, tokens and retries live on
/// the other side.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: &str, message: &str) -> anyhow::Result<()>;
}

/// Default sink: log the event and move on. Real deployments plug in a push
/// provider here.
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, user_id: &str, message: &str) -> anyhow::Result<()> {
        tracing::info!(user_id, message, "notification");
        Ok(())
    }
}

/// Best-effort delivery: a failed notification never fails the request that
/// triggered it.
pub async fn notify_booking_event(sink: &dyn NotificationSink, booking: &Booking, message: &str) {
    if let Err(e) = sink.notify(&booking.user_id, message).await {
        tracing::warn!(booking_id = %booking.id, %e, "notification delivery failed");
    }
}
