//! Request/response dispatcher for DAP.
//!
//! Tracks pending requests by their sequence number, routes responses to
//! waiting callers via oneshot channels, and forwards events to the
//! session's event channel.
use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use crate::error::DapError;
use crate::protocol::{Event, Message, Response};

/// Events buffered while nobody is waiting; later ones are dropped.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// What a waiting request eventually receives.
pub type ResponseSlot = oneshot::Receiver<Result<Response, DapError>>;

/// Why the reader side of a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// The adapter closed the stream.
    Eof,
    /// Reading from the socket failed.
    Io(String),
    /// The adapter sent something that is not a DAP frame.
    Protocol(String),
    /// The client shut the session down.
    Closed,
}

impl Disconnect {
    /// Classify a reader error.
    pub fn from_error(err: &DapError) -> Self {
        match err {
            DapError::ConnectionClosed => Disconnect::Eof,
            DapError::Protocol(msg) => Disconnect::Protocol(msg.clone()),
            other => Disconnect::Io(other.to_string()),
        }
    }

    /// The error reported to callers still waiting on the session.
    pub fn to_error(&self) -> DapError {
        match self {
            Disconnect::Eof | Disconnect::Closed => DapError::ConnectionClosed,
            Disconnect::Io(msg) => DapError::Io(std::io::Error::other(msg.clone())),
            Disconnect::Protocol(msg) => DapError::Protocol(msg.clone()),
        }
    }
}

struct PendingRequest {
    command: String,
    tx: oneshot::Sender<Result<Response, DapError>>,
}

/// Manages pending requests and routes incoming messages.
pub struct Dispatcher {
    /// Map of request seq to the waiting caller.
    pending: HashMap<i64, PendingRequest>,
    /// Sink for events; dropped once the session is closed.
    events: Option<mpsc::Sender<Event>>,
    /// Set once the reader has stopped.
    closed: Option<Disconnect>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiving end of its event channel.
    pub fn new() -> (Self, mpsc::Receiver<Event>) {
        Self::with_event_capacity(EVENT_QUEUE_CAPACITY)
    }

    /// Like [`new`](Dispatcher::new) with a custom event queue size.
    pub fn with_event_capacity(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let dispatcher = Self {
            pending: HashMap::new(),
            events: Some(events_tx),
            closed: None,
        };
        (dispatcher, events_rx)
    }

    /// Register a pending request and return the slot its response lands in.
    ///
    /// Fails once the session has been closed.
    pub fn register_request(&mut self, seq: i64, command: &str) -> Result<ResponseSlot, DapError> {
        if let Some(reason) = &self.closed {
            return Err(reason.to_error());
        }
        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            seq,
            PendingRequest {
                command: command.to_string(),
                tx,
            },
        );
        Ok(rx)
    }

    /// How many requests are pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Why the session closed, if it has.
    pub fn closed_reason(&self) -> Option<&Disconnect> {
        self.closed.as_ref()
    }

    /// Route an incoming message.
    ///
    /// - Responses resolve the pending request with the same `request_seq`.
    /// - Events go to the event channel.
    /// - Reverse requests from the adapter are logged and ignored.
    pub fn dispatch(&mut self, message: Message) {
        match message {
            Message::Response(response) => self.resolve(response),
            Message::Event(event) => {
                tracing::debug!(event = %event.event, seq = event.seq, "received event");
                if let Some(events) = &self.events {
                    match events.try_send(event) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(event)) => {
                            tracing::warn!(event = %event.event, "event queue full, dropping event");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            tracing::debug!("event receiver dropped");
                        }
                    }
                }
            }
            Message::Request(request) => {
                tracing::debug!(command = %request.command, "ignoring reverse request");
            }
        }
    }

    fn resolve(&mut self, response: Response) {
        let Some(pending) = self.pending.remove(&response.request_seq) else {
            tracing::warn!(
                request_seq = response.request_seq,
                command = %response.command,
                "response for unknown request"
            );
            return;
        };

        let result = if response.command == pending.command {
            Ok(response)
        } else {
            Err(DapError::InvalidResponse(format!(
                "response to seq {} is for '{}', expected '{}'",
                response.request_seq, response.command, pending.command
            )))
        };
        // The caller may have given up (timeout); that's fine.
        let _ = pending.tx.send(result);
    }

    /// Forget a pending request. Returns true if it was still pending.
    pub fn cancel(&mut self, seq: i64) -> bool {
        self.pending.remove(&seq).is_some()
    }

    /// Mark the session closed, failing every pending request and ending the
    /// event stream. Only the first reason is kept.
    pub fn close(&mut self, reason: Disconnect) {
        for (_, pending) in self.pending.drain() {
            let _ = pending.tx.send(Err(reason.to_error()));
        }
        self.events = None;
        if self.closed.is_none() {
            self.closed = Some(reason);
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.pending.len())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(request_seq: i64, command: &str) -> Message {
        Message::Response(Response {
            seq: 100 + request_seq,
            request_seq,
            success: true,
            command: command.into(),
            message: None,
            body: None,
        })
    }

    fn event(name: &str) -> Message {
        Message::Event(Event {
            seq: 0,
            event: name.into(),
            body: None,
        })
    }

    #[tokio::test]
    async fn dispatcher_register_and_resolve() {
        let (mut disp, _events) = Dispatcher::new();
        let rx = disp.register_request(1, "initialize").unwrap();
        assert_eq!(disp.pending_count(), 1);

        disp.dispatch(response(1, "initialize"));
        assert_eq!(disp.pending_count(), 0);

        let resp = rx.await.unwrap().unwrap();
        assert_eq!(resp.request_seq, 1);
        assert_eq!(resp.command, "initialize");
    }

    #[tokio::test]
    async fn dispatcher_matches_by_seq_not_arrival_order() {
        let (mut disp, _events) = Dispatcher::new();
        let first = disp.register_request(1, "variables").unwrap();
        let second = disp.register_request(2, "variables").unwrap();

        disp.dispatch(response(2, "variables"));
        disp.dispatch(response(1, "variables"));

        assert_eq!(first.await.unwrap().unwrap().request_seq, 1);
        assert_eq!(second.await.unwrap().unwrap().request_seq, 2);
    }

    #[tokio::test]
    async fn dispatcher_command_mismatch_is_invalid_response() {
        let (mut disp, _events) = Dispatcher::new();
        let rx = disp.register_request(3, "scopes").unwrap();
        disp.dispatch(response(3, "stackTrace"));
        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, DapError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn dispatcher_routes_events_to_channel() {
        let (mut disp, mut events) = Dispatcher::new();
        let rx = disp.register_request(1, "initialize").unwrap();

        disp.dispatch(event("output"));
        disp.dispatch(event("initialized"));
        assert_eq!(disp.pending_count(), 1);

        assert_eq!(events.recv().await.unwrap().event, "output");
        assert_eq!(events.recv().await.unwrap().event, "initialized");

        disp.dispatch(response(1, "initialize"));
        assert!(rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn dispatcher_drops_events_when_queue_full() {
        let (mut disp, mut events) = Dispatcher::with_event_capacity(2);
        disp.dispatch(event("output"));
        disp.dispatch(event("thread"));
        disp.dispatch(event("stopped"));

        assert_eq!(events.recv().await.unwrap().event, "output");
        assert_eq!(events.recv().await.unwrap().event, "thread");
        assert!(events.try_recv().is_err());

        // Draining frees room again.
        disp.dispatch(event("stopped"));
        assert_eq!(events.recv().await.unwrap().event, "stopped");
    }

    #[test]
    fn dispatcher_unknown_response_is_dropped() {
        let (mut disp, _events) = Dispatcher::new();
        disp.dispatch(response(42, "attach"));
        assert_eq!(disp.pending_count(), 0);
    }

    #[test]
    fn dispatcher_cancel() {
        let (mut disp, _events) = Dispatcher::new();
        let _rx = disp.register_request(5, "variables").unwrap();
        assert!(disp.cancel(5));
        assert!(!disp.cancel(5));
        assert_eq!(disp.pending_count(), 0);
    }

    #[tokio::test]
    async fn dispatcher_close_fails_pending_and_ends_events() {
        let (mut disp, mut events) = Dispatcher::new();
        let rx = disp.register_request(1, "stackTrace").unwrap();

        disp.close(Disconnect::Protocol("missing Content-Length header".into()));

        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, DapError::Protocol(_)));
        assert!(events.recv().await.is_none());
        assert!(matches!(
            disp.register_request(2, "scopes"),
            Err(DapError::Protocol(_))
        ));
    }

    #[test]
    fn dispatcher_close_keeps_first_reason() {
        let (mut disp, _events) = Dispatcher::new();
        disp.close(Disconnect::Eof);
        disp.close(Disconnect::Closed);
        assert_eq!(disp.closed_reason(), Some(&Disconnect::Eof));
    }

    #[test]
    fn disconnect_maps_errors() {
        assert_eq!(
            Disconnect::from_error(&DapError::ConnectionClosed),
            Disconnect::Eof
        );
        assert!(matches!(
            Disconnect::from_error(&DapError::Protocol("bad".into())),
            Disconnect::Protocol(_)
        ));
        assert!(matches!(
            Disconnect::Io("reset".into()).to_error(),
            DapError::Io(_)
        ));
        assert!(matches!(
            Disconnect::Closed.to_error(),
            DapError::ConnectionClosed
        ));
    }
}
