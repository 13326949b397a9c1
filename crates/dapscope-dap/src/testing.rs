//! In-process stub adapter used by unit tests.

use serde_json::{json, Value};
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

use crate::client::{ClientOptions, DapClient};
use crate::error::DapError;
use crate::protocol::{Message, Request};
use crate::transport::{encode_message, MessageReader};

/// The adapter end of a duplex pipe.
pub(crate) struct StubAdapter {
    reader: MessageReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    next_seq: i64,
}

/// A client wired to a stub adapter.
pub(crate) fn connected_pair(options: ClientOptions) -> (DapClient, StubAdapter) {
    let (client_io, stub_io) = tokio::io::duplex(64 * 1024);
    let (client_read, client_write) = tokio::io::split(client_io);
    let (stub_read, stub_write) = tokio::io::split(stub_io);
    let client = DapClient::from_transport(client_read, client_write, options);
    let stub = StubAdapter {
        reader: MessageReader::new(stub_read),
        writer: stub_write,
        next_seq: 1,
    };
    (client, stub)
}

impl StubAdapter {
    /// Read the next request the client sent.
    pub(crate) async fn expect_request(&mut self) -> Request {
        match self.reader.read_message().await.unwrap() {
            Message::Request(req) => req,
            other => panic!("expected request, got {other:?}"),
        }
    }

    /// Read the next request and check its command.
    pub(crate) async fn expect_command(&mut self, command: &str) -> Request {
        let req = self.expect_request().await;
        assert_eq!(req.command, command, "unexpected request: {req:?}");
        req
    }

    /// Assert the client closed its side of the pipe.
    pub(crate) async fn expect_closed(&mut self) {
        match self.reader.read_message().await {
            Err(DapError::ConnectionClosed) => {}
            other => panic!("expected end of stream, got {other:?}"),
        }
    }

    /// Send an arbitrary JSON message.
    pub(crate) async fn send(&mut self, value: Value) {
        let message: Message = serde_json::from_value(value).unwrap();
        self.send_raw(&encode_message(&message).unwrap()).await;
    }

    /// Send raw bytes, framing included.
    pub(crate) async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Answer `req` successfully with `body`.
    pub(crate) async fn respond(&mut self, req: &Request, body: Value) {
        let seq = self.bump();
        self.send(json!({
            "seq": seq,
            "type": "response",
            "request_seq": req.seq,
            "command": req.command,
            "success": true,
            "body": body
        }))
        .await;
    }

    /// Answer `req` with `success: false`.
    pub(crate) async fn reject(&mut self, req: &Request, message: &str) {
        let seq = self.bump();
        self.send(json!({
            "seq": seq,
            "type": "response",
            "request_seq": req.seq,
            "command": req.command,
            "success": false,
            "message": message
        }))
        .await;
    }

    /// Emit an event.
    pub(crate) async fn event(&mut self, name: &str, body: Value) {
        let seq = self.bump();
        self.send(json!({"seq": seq, "type": "event", "event": name, "body": body}))
            .await;
    }

    fn bump(&mut self) -> i64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
