use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use chrono::{Local, NaiveDate};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    middleware::session::decode_session_token,
    models::session::Session,
    services::{changefeed::ChangeFeed, complaints::ComplaintLedger, votes::VoteLedger},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LiveQueryParams {
    pub token: String,
    pub date: Option<NaiveDate>,
}

/// Client → server frame switching the subscribed day.
#[derive(Debug, Deserialize)]
struct SubscribeFrame {
    #[serde(rename = "type")]
    kind: String,
    date: NaiveDate,
}

pub async fn live_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<LiveQueryParams>,
) -> Response {
    let session = decode_session_token(&params.token, &state.config.jwt_secret);

    ws.on_upgrade(move |socket| async move {
        match session {
            Ok(session) => {
                info!("live feed connected: subject={}", session.subject_id());
                handle_socket(socket, state, session, params.date).await;
            }
            Err(e) => {
                error!("live feed auth failed: {}", e);
            }
        }
    })
}

/// One pub/sub connection per subscribed day. Every event triggers a full
/// snapshot push; switching days tears the old subscription down and opens
/// a fresh one, snapshot first.
async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    session: Session,
    initial_date: Option<NaiveDate>,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut day = initial_date.unwrap_or_else(|| Local::now().date_naive());

    'subscription: loop {
        let mut pubsub = match state.redis_client.get_async_pubsub().await {
            Ok(c) => c,
            Err(e) => {
                error!("Redis pubsub error: {}", e);
                return;
            }
        };
        if let Err(e) = pubsub.subscribe(ChangeFeed::votes_channel(day)).await {
            error!("Redis subscribe error: {}", e);
            return;
        }
        if session.is_management() {
            if let Err(e) = pubsub.subscribe(ChangeFeed::complaints_channel(day)).await {
                error!("Redis subscribe error: {}", e);
                return;
            }
        }

        // Snapshot on (re)subscribe so the client never waits for an event.
        if send_votes_snapshot(&state, day, &mut sender).await.is_err() {
            return;
        }
        if send_complaints_snapshot(&state, &session, day, &mut sender)
            .await
            .is_err()
        {
            return;
        }

        let mut events = pubsub.on_message();
        loop {
            tokio::select! {
                event = events.next() => {
                    // A dropped pub/sub connection gets rebuilt, same day.
                    let Some(event) = event else { continue 'subscription };
                    let sent = if event.get_channel_name() == ChangeFeed::complaints_channel(day) {
                        send_complaints_snapshot(&state, &session, day, &mut sender).await
                    } else {
                        send_votes_snapshot(&state, day, &mut sender).await
                    };
                    if sent.is_err() {
                        return;
                    }
                }
                frame = receiver.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(new_day) = parse_subscribe(&text) {
                                if new_day != day {
                                    info!("live feed switching to {new_day}");
                                    day = new_day;
                                    continue 'subscription;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("live feed disconnected");
                            return;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(_)) => return,
                    }
                }
            }
        }
    }
}

fn parse_subscribe(text: &str) -> Option<NaiveDate> {
    let frame: SubscribeFrame = serde_json::from_str(text).ok()?;
    (frame.kind == "subscribe").then_some(frame.date)
}

async fn send_votes_snapshot(
    state: &AppState,
    day: NaiveDate,
    sender: &mut SplitSink<WebSocket, Message>,
) -> Result<(), axum::Error> {
    let counts = match VoteLedger::counts(&state.db, day).await {
        Ok(counts) => counts,
        Err(e) => {
            // Keep the socket; the next event retries the query.
            warn!("live votes snapshot for {day} failed: {e}");
            return Ok(());
        }
    };
    let frame = json!({ "type": "votes", "day": day, "counts": counts });
    sender.send(Message::Text(frame.to_string().into())).await
}

async fn send_complaints_snapshot(
    state: &AppState,
    session: &Session,
    day: NaiveDate,
    sender: &mut SplitSink<WebSocket, Message>,
) -> Result<(), axum::Error> {
    // Students only get the votes feed.
    let Session::Management(manager) = session else {
        return Ok(());
    };
    let today = Local::now().date_naive();
    let complaints = match ComplaintLedger::list(&state.db, manager, today, Some(day), None).await
    {
        Ok(complaints) => complaints,
        Err(e) => {
            warn!("live complaints snapshot for {day} failed: {e}");
            return Ok(());
        }
    };
    let frame = json!({ "type": "complaints", "day": day, "complaints": complaints });
    sender.send(Message::Text(frame.to_string().into())).await
}
