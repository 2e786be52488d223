//! Blocking HTTP transport.
//!
//! Owns one `reqwest` blocking client bound to a base URL. Changing the URL
//! or a timeout rebuilds the client. Every call blocks the calling thread.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;

use crate::config::OllamaConfig;
use crate::error::{Error, Result};
use crate::json;
use crate::stream::StreamControl;

const JSON_CONTENT_TYPE: &str = "application/json";
const CHUNK_SIZE: usize = 8192;

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// The body of a 2xx reply, or the matching status error.
    ///
    /// A 404 becomes [`Error::ModelNotFound`] when the call concerned `model`.
    pub fn into_body(self, model: Option<&str>) -> Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(status_error(self.status, &self.body, model))
        }
    }
}

/// How a streamed exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamOutcome {
    /// The server closed the stream.
    Completed,
    /// The chunk handler asked to stop and the connection was dropped.
    Stopped,
}

pub(crate) fn status_error(status: u16, body: &str, model: Option<&str>) -> Error {
    let message = json::error_text(body);
    match model {
        Some(model) if status == 404 => Error::model_not_found(model),
        _ => Error::http_status(status, message),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    base_url: String,
    read_timeout: Duration,
    write_timeout: Duration,
    client: Client,
}

impl Transport {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let read_timeout = config.read_timeout_duration();
        let write_timeout = config.write_timeout_duration();
        Ok(Self {
            base_url: config.base_url.clone(),
            read_timeout,
            write_timeout,
            client: build_client(read_timeout, write_timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<()> {
        self.client = build_client(self.read_timeout, self.write_timeout)?;
        self.base_url = base_url.into();
        Ok(())
    }

    pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.client = build_client(timeout, self.write_timeout)?;
        self.read_timeout = timeout;
        Ok(())
    }

    pub fn set_write_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.client = build_client(self.read_timeout, timeout)?;
        self.write_timeout = timeout;
        Ok(())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub fn get(&self, path: &str) -> Result<HttpReply> {
        self.send("GET", path, self.client.get(self.url(path)))
    }

    pub fn head(&self, path: &str) -> Result<HttpReply> {
        self.send("HEAD", path, self.client.head(self.url(path)))
    }

    pub fn post_json(&self, path: &str, body: String) -> Result<HttpReply> {
        let builder = self.client.post(self.url(path)).body(body);
        self.send("POST", path, builder)
    }

    pub fn post_bytes(&self, path: &str, body: Vec<u8>) -> Result<HttpReply> {
        let builder = self.client.post(self.url(path)).body(body);
        self.send("POST", path, builder)
    }

    pub fn delete_json(&self, path: &str, body: String) -> Result<HttpReply> {
        let builder = self.client.delete(self.url(path)).body(body);
        self.send("DELETE", path, builder)
    }

    /// POST `body` and hand every chunk of a 2xx reply to `on_chunk` as it
    /// arrives. Returning [`StreamControl::Stop`] closes the connection.
    pub fn post_streaming<F>(
        &self,
        path: &str,
        body: String,
        model: Option<&str>,
        mut on_chunk: F,
    ) -> Result<StreamOutcome>
    where
        F: FnMut(&[u8]) -> StreamControl,
    {
        tracing::debug!(method = "POST", path, "dispatching streaming request");
        let mut response = self
            .client
            .post(self.url(path))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()?;

        let status = response.status().as_u16();
        tracing::debug!(path, status, "stream opened");
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, &body, model));
        }

        let mut chunk = vec![0_u8; CHUNK_SIZE];
        loop {
            let read = match response.read(&mut chunk) {
                Ok(0) => return Ok(StreamOutcome::Completed),
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::transport(format!("Read failed: {e}"))),
            };
            if on_chunk(&chunk[..read]).is_stop() {
                tracing::debug!(path, "stream closed by caller");
                drop(response);
                return Ok(StreamOutcome::Stopped);
            }
        }
    }

    fn send(&self, method: &str, path: &str, builder: RequestBuilder) -> Result<HttpReply> {
        tracing::debug!(method, path, "dispatching request");
        let response = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        tracing::debug!(method, path, status, "reply received");
        Ok(HttpReply { status, body })
    }
}

fn build_client(read_timeout: Duration, write_timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(read_timeout)
        .connect_timeout(write_timeout)
        .build()
        .map_err(|e| Error::transport(format!("Failed to create HTTP client: {e}")))
}
