use anyhow::{Context, Result};
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::collector::{StreamListener, TRANSPORT_FAILURE_CODE};
use crate::config::Authenticator;
use crate::error::{ParseError, StreamError};

/// Longest record line accepted from a push source.
pub const MAX_RECORD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The listener asked to stop.
    Stopped,
    /// The source closed the connection.
    Closed,
    /// The source refused the connection with a non-success status.
    Rejected { status: u16 },
    /// The connection failed after it was established.
    TransportFailed,
}

/// Split a comma-separated keyword list, dropping blanks.
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

enum Line {
    Complete(Vec<u8>),
    Oversized,
}

/// Newline framing over arbitrary chunks. Bytes already searched are not
/// searched again, and no line grows past `limit`.
struct LineSplitter {
    buffer: Vec<u8>,
    scanned: usize,
    skipping: bool,
    limit: usize,
}

impl LineSplitter {
    fn new(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            skipping: false,
            limit,
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn next_line(&mut self) -> Option<Line> {
        loop {
            let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') else {
                if self.skipping {
                    self.buffer.clear();
                    self.scanned = 0;
                    return None;
                }
                if self.buffer.len() > self.limit {
                    self.buffer.clear();
                    self.scanned = 0;
                    self.skipping = true;
                    return Some(Line::Oversized);
                }
                self.scanned = self.buffer.len();
                return None;
            };

            let newline = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.scanned = 0;

            // Tail of a line already reported as oversized.
            if self.skipping {
                self.skipping = false;
                continue;
            }
            if newline > self.limit {
                return Some(Line::Oversized);
            }
            return Some(Line::Complete(line));
        }
    }

    /// Whatever followed the last newline, if it belongs to a usable line.
    fn into_remainder(self) -> Option<Vec<u8>> {
        if self.skipping || self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }
}

/// Feed newline-delimited records from `chunks` to `listener` until it
/// returns `false` or the chunks run out. Blank lines are keep-alives.
///
/// A failed chunk is reported through `on_source_error` with
/// [`TRANSPORT_FAILURE_CODE`] and ends the run.
pub async fn drive_listener<S, B, E, L>(mut chunks: S, listener: &mut L) -> StreamEnd
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
    L: StreamListener + ?Sized,
{
    let mut lines = LineSplitter::new(MAX_RECORD_BYTES);

    while let Some(chunk) = chunks.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "stream transport failed");
                // The run is over whatever the listener answers.
                listener.on_source_error(TRANSPORT_FAILURE_CODE);
                return StreamEnd::TransportFailed;
            }
        };
        lines.push(chunk.as_ref());

        while let Some(line) = lines.next_line() {
            let proceed = match line {
                Line::Complete(line) => dispatch_line(&line, listener),
                Line::Oversized => listener.on_malformed(ParseError::TooLarge {
                    limit: MAX_RECORD_BYTES,
                }),
            };
            if !proceed {
                return StreamEnd::Stopped;
            }
        }
    }

    if let Some(rest) = lines.into_remainder() {
        if !dispatch_line(&rest, listener) {
            return StreamEnd::Stopped;
        }
    }

    StreamEnd::Closed
}

fn dispatch_line<L: StreamListener + ?Sized>(line: &[u8], listener: &mut L) -> bool {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => return listener.on_malformed(ParseError::Utf8(e)),
    };
    if text.is_empty() {
        trace!("keep-alive");
        return true;
    }
    listener.on_record(text)
}

/// A non-success status refuses the whole run, so the listener's answer is not
/// consulted.
fn reject_status<L: StreamListener + ?Sized>(status: u16, listener: &mut L) -> Option<StreamEnd> {
    if (200..300).contains(&status) {
        return None;
    }
    listener.on_source_error(status);
    Some(StreamEnd::Rejected { status })
}

/// Push source: keyword-filtered live posts over a long-lived HTTP response.
pub struct StreamClient {
    client: Client,
    authenticator: Authenticator,
    base_url: Url,
}

impl StreamClient {
    pub fn new(authenticator: Authenticator, base_url: Url) -> Result<Self> {
        // No overall timeout: the response stays open for the whole run.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .read_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            authenticator,
            base_url,
        })
    }

    fn filter_url(&self) -> String {
        format!(
            "{}/statuses/filter.json",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    pub async fn filter<L>(&self, keywords: &[String], listener: &mut L) -> Result<StreamEnd, StreamError>
    where
        L: StreamListener + ?Sized,
    {
        let body = format!(
            "track={}&tweet_mode=extended",
            urlencoding::encode(&keywords.join(","))
        );
        info!(keywords = %keywords.join(","), "connecting to filtered stream");

        let response = self
            .client
            .post(self.filter_url())
            .header(AUTHORIZATION, self.authenticator.authorization())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if let Some(end) = reject_status(response.status().as_u16(), listener) {
            return Ok(end);
        }
        debug!("stream connected");

        let chunks = stream::unfold(response, |mut response| async move {
            match response.chunk().await {
                Ok(Some(bytes)) => Some((Ok(bytes), response)),
                Ok(None) => None,
                Err(e) => Some((Err(e), response)),
            }
        });

        // Returning drops the response, which closes the connection.
        Ok(drive_listener(Box::pin(chunks), listener).await)
    }
}
