//! Websocket transport adapter.
//!
//! Each upgraded connection becomes one [`Session`]. The socket is split:
//! the stream half feeds [`read_events`] on its own task, which decodes
//! `Event` JSON into the session's queue; the sink half is wrapped in a
//! [`WsCommandSink`] that the frame loop sends commands through.
//!
//! A read error, a close frame, or an undecodable message ends the reader
//! and closes the queue, which ends the session on its next frame.

use std::error::Error as StdError;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, Stream, StreamExt};
use imweb_core::{CommandSink, EventQueue, Session, TransportError};
use imweb_types::{Command, Event, SessionId};
use tokio_util::task::task_tracker::TaskTrackerToken;
use tracing::{debug, trace, warn};

use crate::state::AppState;

/// Why the reader task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderEnd {
    /// The peer sent a close frame or the stream ended.
    PeerClosed,
    /// The socket reported an error.
    ReadError,
    /// A text frame was not a valid event.
    DecodeError,
    /// The session closed the queue first.
    SessionEnded,
}

/// Upgrade an HTTP request to a websocket and run a session on it.
///
/// # Route
///
/// `GET /ws` (configurable)
pub async fn ws_session<S>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse
where
    S: Clone + Send + Sync + 'static,
{
    // Taken before the upgrade so a session accepted during shutdown is
    // already counted when the server starts waiting.
    let token = state.sessions.token();
    ws.on_upgrade(move |socket| handle_socket(socket, state, token))
}

/// Drive one session until it ends, then release the socket.
async fn handle_socket<S>(socket: WebSocket, state: Arc<AppState<S>>, token: TaskTrackerToken)
where
    S: Clone + Send + Sync + 'static,
{
    let session = Session::new(
        SessionId::new(),
        state.initial.clone(),
        Arc::clone(&state.render),
        Arc::clone(&state.markup),
        &state.frame,
    );
    let id = session.id();
    debug!(session = %id, "websocket client connected");

    let (sink, stream) = socket.split();
    let reader = tokio::spawn(read_events(stream, session.queue(), id));

    let mut sink = WsCommandSink::new(sink);
    let end = session.run(&mut sink, state.shutdown.clone()).await;

    reader.abort();
    sink.close().await;
    debug!(session = %id, reason = %end, "websocket released");
    drop(token);
}

/// Decode inbound messages into the queue until the connection ends.
///
/// Ping, pong, and binary frames are ignored. The queue is always closed on
/// return so the frame loop observes the end of input.
pub async fn read_events<St, E>(
    mut stream: St,
    queue: Arc<EventQueue>,
    session: SessionId,
) -> ReaderEnd
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: StdError,
{
    let end = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<Event>(text.as_str()) {
                    Ok(event) => {
                        trace!(
                            session = %session,
                            element = %event.id,
                            event = %event.event,
                            "received event"
                        );
                        if queue.push(event).await.is_err() {
                            break ReaderEnd::SessionEnded;
                        }
                    }
                    Err(e) => {
                        warn!(
                            session = %session,
                            error = %e,
                            "undecodable event, closing session"
                        );
                        break ReaderEnd::DecodeError;
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => break ReaderEnd::PeerClosed,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!(session = %session, error = %e, "websocket read failed");
                break ReaderEnd::ReadError;
            }
        }
    };

    queue.close();
    debug!(session = %session, reason = ?end, "reader stopped");
    end
}

/// Outbound half of a websocket, encoding each command as a JSON text frame.
pub struct WsCommandSink<T> {
    inner: T,
}

impl<T> WsCommandSink<T> {
    /// Wrap the sink half of a split socket.
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T, E> WsCommandSink<T>
where
    T: Sink<Message, Error = E> + Unpin,
    E: StdError,
{
    /// Send a close frame. Failures are logged; the peer may already be gone.
    pub async fn close(&mut self) {
        if let Err(e) = self.inner.close().await {
            debug!(error = %e, "websocket close failed");
        }
    }
}

impl<T, E> CommandSink for WsCommandSink<T>
where
    T: Sink<Message, Error = E> + Unpin + Send,
    E: StdError + Send + 'static,
{
    async fn send(&mut self, command: &Command) -> Result<(), TransportError> {
        let json = serde_json::to_string(command)?;
        self.inner
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::classify(&e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io;

    use futures::channel::mpsc;
    use imweb_core::OverflowPolicy;
    use imweb_types::ElementId;

    use super::*;

    fn text(json: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(json.into()))
    }

    fn queue() -> Arc<EventQueue> {
        Arc::new(EventQueue::new(16, OverflowPolicy::Block))
    }

    #[tokio::test]
    async fn reader_queues_events_until_close() {
        let queue = queue();
        let stream = futures::stream::iter(vec![
            text(r#"{"id":"Increment","event":"clicked"}"#),
            Ok(Message::Ping(Vec::new().into())),
            text(r#"{"id":"Decrement","event":"clicked"}"#),
            Ok(Message::Close(None)),
            text(r#"{"id":"never","event":"clicked"}"#),
        ]);

        let end = read_events(stream, Arc::clone(&queue), SessionId::new()).await;

        assert_eq!(end, ReaderEnd::PeerClosed);
        assert!(queue.is_closed());
        assert_eq!(queue.try_pop(), Some(Event::clicked("Increment")));
        assert_eq!(queue.try_pop(), Some(Event::clicked("Decrement")));
        assert_eq!(queue.try_pop(), None);
    }

    #[tokio::test]
    async fn reader_stops_on_undecodable_message() {
        let queue = queue();
        let stream = futures::stream::iter(vec![
            text("not json"),
            text(r#"{"id":"a","event":"clicked"}"#),
        ]);

        let end = read_events(stream, Arc::clone(&queue), SessionId::new()).await;

        assert_eq!(end, ReaderEnd::DecodeError);
        assert!(queue.is_closed());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn reader_stops_on_read_error() {
        let queue = queue();
        let stream = futures::stream::iter(vec![
            text(r#"{"id":"a","event":"clicked"}"#),
            Err(axum::Error::new(io::Error::from(io::ErrorKind::ConnectionReset))),
        ]);

        let end = read_events(stream, Arc::clone(&queue), SessionId::new()).await;

        assert_eq!(end, ReaderEnd::ReadError);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn reader_stops_when_session_closed_queue() {
        let queue = queue();
        queue.close();
        let stream = futures::stream::iter(vec![text(r#"{"id":"a","event":"clicked"}"#)]);

        let end = read_events(stream, Arc::clone(&queue), SessionId::new()).await;

        assert_eq!(end, ReaderEnd::SessionEnded);
    }

    #[tokio::test]
    async fn sink_sends_json_text_frames() {
        let (tx, mut rx) = mpsc::unbounded::<Message>();
        let mut sink = WsCommandSink::new(tx);
        let command = Command::add(ElementId::from("count-text"), String::from("<div>0</div>"));

        sink.send(&command).await.unwrap();

        let Some(Message::Text(frame)) = rx.next().await else {
            panic!("expected a text frame");
        };
        let decoded: Command = serde_json::from_str(frame.as_str()).unwrap();
        assert_eq!(decoded, command);
    }

    #[tokio::test]
    async fn broken_pipe_is_reported_as_disconnect() {
        let failing = Box::pin(futures::sink::unfold((), |(), _msg: Message| async {
            Err::<(), io::Error>(io::Error::from(io::ErrorKind::BrokenPipe))
        }));
        let mut sink = WsCommandSink::new(failing);

        let err = sink
            .send(&Command::add(ElementId::from("a"), String::new()))
            .await
            .unwrap_err();

        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn other_send_errors_are_soft() {
        let failing = Box::pin(futures::sink::unfold((), |(), _msg: Message| async {
            Err::<(), io::Error>(io::Error::new(io::ErrorKind::InvalidData, "frame too large"))
        }));
        let mut sink = WsCommandSink::new(failing);

        let err = sink
            .send(&Command::add(ElementId::from("a"), String::new()))
            .await
            .unwrap_err();

        assert!(!err.is_disconnect());
    }
}
