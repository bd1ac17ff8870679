// ── Background tasks ──
//
// The frame reader and heartbeat live for one connection; the
// reconnect loop outlives connections until it succeeds or is stopped.

use std::sync::atomic::Ordering;
use std::time::Duration;

use futures_util::StreamExt;
use smarthq_api::FrameStream;
use smarthq_api::wire::PingRequest;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Client, ConnectionState};
use crate::events::Event;

/// Consume inbound frames until the stream ends or `cancel` fires.
///
/// Cancellation means someone else is tearing the connection down and
/// owns the state change. A stream ending on its own is a drop.
pub(super) async fn read_loop(client: Client, mut frames: FrameStream, cancel: CancellationToken) {
    let failure = loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            frame = frames.next() => match frame {
                Some(Ok(text)) => client.dispatch(&text).await,
                Some(Err(e)) if e.is_frame_local() => {
                    warn!(error = %e, "Discarding unreadable frame");
                }
                Some(Err(e)) => break Some(e),
                None => break None,
            },
        }
    };

    match failure {
        Some(e) => warn!(error = %e, "Event stream closed abnormally"),
        None => info!("Event stream closed by server"),
    }

    // Stops the heartbeat for this connection.
    cancel.cancel();
    on_stream_closed(&client).await;
}

async fn on_stream_closed(client: &Client) {
    let previous = client
        .inner
        .state
        .send_replace(ConnectionState::Disconnected);
    if previous != ConnectionState::Connected {
        debug!(state = %previous, "Stream ended before the connection was up");
        return;
    }

    client.inner.events.publish(Event::Disconnected).await;
    client.start_reconnecting();
}

/// Send a ping every `period`. The first ping goes out one full period
/// after the connection is established.
pub(super) async fn heartbeat_loop(client: Client, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let ping = PingRequest::new(Uuid::new_v4().to_string());
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = client.send_frame(&ping) => match result {
                Ok(()) => debug!(id = %ping.id, "Heartbeat ping sent"),
                Err(e) => warn!(error = %e, "Heartbeat ping failed"),
            },
        }
    }
}

/// Retry the connection with capped exponential backoff until it
/// sticks, reconnection is disabled, or `cancel` fires.
pub(super) async fn reconnect_loop(client: Client, cancel: CancellationToken) {
    let policy = client.inner.config.reconnect;
    let mut attempt: u32 = 0;

    loop {
        if !client.inner.auto_reconnect.load(Ordering::SeqCst) {
            break;
        }

        let delay = policy.delay_for(attempt);
        let number = attempt.saturating_add(1);
        if !mark_reconnecting(&client.inner.state, number) {
            // A caller's connect() got there first.
            if client.finish_reconnect() {
                debug!("Connection restored elsewhere, stopping reconnection");
                return;
            }
        }
        info!(attempt = number, delay_secs = delay.as_secs(), "Reconnecting after delay");

        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }
        if !client.inner.auto_reconnect.load(Ordering::SeqCst) {
            break;
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            result = client.try_connect() => result,
        };

        match result {
            Ok(()) => {
                if client.finish_reconnect() {
                    info!(attempts = number, "Reconnected to SmartHQ");
                    return;
                }
                debug!("Connection dropped again right after reconnecting");
                attempt = 0;
            }
            Err(e) => {
                warn!(attempt = number, error = %e, "Reconnect attempt failed");
                attempt = number;
            }
        }
    }

    debug!("Reconnection disabled, stopping");
    client.retire_reconnect();
}

/// Move to `Reconnecting { attempt }` unless another attempt is already
/// in flight or has succeeded. Returns whether the state changed.
fn mark_reconnecting(state: &watch::Sender<ConnectionState>, attempt: u32) -> bool {
    state.send_if_modified(|current| match current {
        ConnectionState::Disconnected | ConnectionState::Reconnecting { .. } => {
            *current = ConnectionState::Reconnecting { attempt };
            true
        }
        _ => false,
    })
}
