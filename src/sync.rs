//! Pushes status changes to the remote endpoint.
//!
//! Updates are fire-and-forget from the caller's side: the local board has
//! already changed by the time [`StatusSink::notify`] is called, and failures
//! are only logged. All updates go through one worker thread in the order
//! they were queued, so two quick toggles of the same card reach the
//! endpoint in the order the user made them.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub unique_id: String,
    pub status: String,
}

pub trait StatusSink {
    fn notify(&self, id: &str, status: &str);
}

pub struct SyncClient {
    tx: Option<Sender<StatusUpdate>>,
    worker: Option<JoinHandle<()>>,
}

impl SyncClient {
    pub fn spawn(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        let (tx, rx) = mpsc::channel::<StatusUpdate>();
        let worker = thread::spawn(move || {
            let client = Client::new();
            for update in rx {
                post_update(&client, &api_url, &update);
            }
        });
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// A client that drops every update. Used when no endpoint is configured.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Waits for queued updates to be sent, then stops the worker.
    pub fn shutdown(mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("sync worker panicked");
            }
        }
    }
}

impl StatusSink for SyncClient {
    fn notify(&self, id: &str, status: &str) {
        let Some(tx) = &self.tx else {
            tracing::debug!("sync disabled, not sending {} -> {}", id, status);
            return;
        };
        let update = StatusUpdate {
            unique_id: id.to_string(),
            status: status.to_string(),
        };
        if tx.send(update).is_err() {
            tracing::warn!("sync worker is gone, dropped update for {}", id);
        }
    }
}

fn post_update(client: &Client, api_url: &str, update: &StatusUpdate) {
    tracing::debug!("POST {} {:?}", api_url, update);
    match client.post(api_url).json(update).send() {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("synced {} -> {}", update.unique_id, update.status);
        }
        Ok(resp) => {
            tracing::warn!(
                "sync for {} returned HTTP {}",
                update.unique_id,
                resp.status()
            );
        }
        Err(err) => {
            tracing::warn!("sync for {} failed: {}", update.unique_id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::tests::serve_once;

    #[test]
    fn payload_uses_string_identifier() {
        let update = StatusUpdate {
            unique_id: "12".into(),
            status: "Complete".into(),
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"unique_id":"12","status":"Complete"}"#
        );
    }

    #[test]
    fn posts_json_body() {
        let (url, server) = serve_once("200 OK", "ok");
        let client = SyncClient::spawn(url);
        client.notify("7", "Complete");
        client.shutdown();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /feed"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let sent: StatusUpdate = serde_json::from_str(body).unwrap();
        assert_eq!(sent.unique_id, "7");
        assert_eq!(sent.status, "Complete");
    }

    #[test]
    fn failures_are_swallowed() {
        let (url, server) = serve_once("500 Internal Server Error", "boom");
        let client = SyncClient::spawn(url);
        client.notify("7", "Pending");
        client.shutdown();
        server.join().unwrap();
    }

    #[test]
    fn disabled_client_accepts_updates() {
        let client = SyncClient::disabled();
        assert!(!client.is_enabled());
        client.notify("1", "Complete");
        client.shutdown();
    }
}
