use chrono::NaiveDate;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

/// Publishes day-scoped change events over Redis pub/sub. Events carry no
/// payload beyond the day; subscribers recompute a full snapshot from the
/// database, so a lost event only delays the next refresh.
#[derive(Clone)]
pub struct ChangeFeed {
    conn: MultiplexedConnection,
}

impl ChangeFeed {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    pub fn votes_channel(day: NaiveDate) -> String {
        format!("mess:votes:{day}")
    }

    pub fn complaints_channel(day: NaiveDate) -> String {
        format!("mess:complaints:{day}")
    }

    pub fn votes_changed(&self, day: NaiveDate) {
        self.publish(Self::votes_channel(day), day);
    }

    pub fn complaints_changed(&self, day: NaiveDate) {
        self.publish(Self::complaints_channel(day), day);
    }

    // Fire-and-forget: a publish failure must never fail the write that
    // triggered it.
    fn publish(&self, channel: String, day: NaiveDate) {
        let mut conn = self.conn.clone();
        tokio::spawn(async move {
            if let Err(e) = conn.publish::<_, _, ()>(&channel, day.to_string()).await {
                warn!("pubsub publish to {channel} failed: {e}");
            }
        });
    }
}
