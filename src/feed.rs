use std::collections::HashMap;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use core::str;
use futures::prelude::*;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tokio_util::codec::{Decoder, FramedRead};
use tokio_util::io::StreamReader;

use crate::error::{Error, Result};

const DEFAULT_RETRY: Duration = Duration::from_millis(3000);
const DEFAULT_EVENT: &str = "message";
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Event(FeedEvent),
    /// Server-requested reconnection delay.
    Retry(Duration),
}

pub type Handler = Box<dyn FnMut(&str) -> Result<()> + Send>;

/// Decodes a `text/event-stream` body into frames.
#[derive(Debug, Default)]
pub struct EventStreamCodec {
    event: Option<String>,
    data: String,
    id: Option<String>,
    has_data: bool,
    bom_checked: bool,
}

impl EventStreamCodec {
    /// Splits off the next line, accepting LF, CRLF and CR terminators.
    fn next_line(src: &mut BytesMut, eof: bool) -> Option<BytesMut> {
        let end = src.iter().position(|b| *b == b'\n' || *b == b'\r')?;

        let terminator_len = if src[end] == b'\r' {
            match src.get(end + 1) {
                Some(b'\n') => 2,
                Some(_) => 1,
                // a CR at the end of the buffer may be the first half of CRLF
                None if eof => 1,
                None => return None,
            }
        } else {
            1
        };

        let line = src.split_to(end);
        src.advance(terminator_len);
        Some(line)
    }

    fn process_line(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
                self.has_data = true;
            }
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            "retry" if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
                if let Ok(millis) = value.parse() {
                    return Some(Frame::Retry(Duration::from_millis(millis)));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Frame> {
        let event = self.event.take();
        // the last event id survives across events
        let id = self.id.clone();
        if !std::mem::take(&mut self.has_data) {
            self.data.clear();
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        data.pop();
        Some(Frame::Event(FeedEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
            id,
        }))
    }

    fn decode_lines(&mut self, src: &mut BytesMut, eof: bool) -> Result<Option<Frame>> {
        if !self.bom_checked {
            if !eof && src.len() < BOM.len() && BOM.starts_with(&src[..]) {
                return Ok(None);
            }
            if src.starts_with(BOM) {
                src.advance(BOM.len());
            }
            self.bom_checked = true;
        }

        while let Some(line) = Self::next_line(src, eof) {
            let line = str::from_utf8(line.as_ref()).map_err(|_| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Invalid String",
                ))
            })?;
            if let Some(frame) = self.process_line(line) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

impl Decoder for EventStreamCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.decode_lines(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        // an incomplete trailing event is discarded
        let frame = self.decode_lines(src, true)?;
        if frame.is_none() {
            src.clear();
        }
        Ok(frame)
    }
}

/// Subscribes to a server-sent events endpoint and routes each named event to
/// its handler.
pub struct FeedSubscriber {
    url: Url,
    handlers: HashMap<String, Handler>,
    retry: Duration,
    last_event_id: Option<String>,
    client: reqwest::Client,
}

impl FeedSubscriber {
    pub fn new(url: Url, handlers: HashMap<String, Handler>) -> Self {
        Self {
            url,
            handlers,
            retry: DEFAULT_RETRY,
            last_event_id: None,
            client: reqwest::Client::new(),
        }
    }

    /// Keeps the feed connected until the server rejects it.
    pub async fn run(mut self) {
        loop {
            match self.connect().await {
                Ok(()) => log::info!("Events Disconnected"),
                Err(e @ Error::Feed(_)) => {
                    log::error!("Events Disconnected, giving up: {e}");
                    return;
                }
                Err(e) => log::info!("Events Disconnected: {e}"),
            }
            tokio::time::sleep(self.retry()).await;
            log::debug!(
                "reconnecting to {} (last event id {:?})",
                self.url,
                self.last_event_id()
            );
        }
    }

    async fn connect(&mut self) -> Result<()> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = &self.last_event_id {
            request = request.header("Last-Event-ID", id.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {} failed: {}", self.url, e)))?;

        if response.status() != StatusCode::OK {
            return Err(Error::Feed(format!("unexpected status {}", response.status())));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("text/event-stream") {
            return Err(Error::Feed(format!("unexpected content type '{content_type}'")));
        }

        log::info!("Events Connected");

        let body = response.bytes_stream().map_err(std::io::Error::other);
        let frames = FramedRead::new(StreamReader::new(body), EventStreamCodec::default());
        self.consume(frames).await
    }

    /// Drains a stream of frames, returning when the stream ends or fails.
    pub async fn consume<S>(&mut self, frames: S) -> Result<()>
    where
        S: Stream<Item = Result<Frame>>,
    {
        futures::pin_mut!(frames);
        while let Some(frame) = frames.next().await {
            match frame? {
                Frame::Retry(retry) => self.retry = retry,
                Frame::Event(event) => self.dispatch(&event),
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &FeedEvent) {
        // an empty id resets the last event id
        if let Some(id) = &event.id {
            self.last_event_id = Some(id.clone()).filter(|id| !id.is_empty());
        }

        match self.handlers.get_mut(&event.event) {
            Some(handler) => {
                if let Err(e) = handler(&event.data) {
                    log::warn!("'{}' handler failed: {e}", event.event);
                }
            }
            None => log::trace!("no handler for '{}'", event.event),
        }
    }

    #[cfg(test)]
    fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn retry(&self) -> Duration {
        self.retry
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }
}
