use crate::transport::api_client::{expect_ok, ApiClient};
use crate::transport::http_client::ApiRequest;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

const KEEPALIVE_ENDPOINT: &str = "accounts/current_user/";

/// Pings the lightweight account endpoint once under the usual refresh policy.
///
/// Returns whether the ping succeeded. Every failure is logged and swallowed.
#[instrument(skip(api))]
pub async fn keepalive_once(api: &ApiClient) -> bool {
    let sessions = api.sessions();
    if !sessions.is_loaded().await {
        warn!("Keepalive skipped: no session loaded");
        return false;
    }

    let request = ApiRequest::api(Method::GET, KEEPALIVE_ENDPOINT);
    match api.execute(&request).await.and_then(expect_ok) {
        Ok(_) => {
            sessions.record_keepalive().await;
            debug!("Keepalive ping ok");
            true
        }
        Err(e) => {
            error!("Keepalive ping failed: {}", e);
            false
        }
    }
}

/// Handle of the background keepalive task. Dropping it stops the task.
pub struct KeepaliveHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl KeepaliveHandle {
    /// Signals the task and waits for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Keepalive task ended abnormally: {:?}", e);
            }
        }
    }
}

impl Drop for KeepaliveHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawns the periodic keepalive. The first ping happens one `period` after start.
pub fn spawn_keepalive(api: Arc<ApiClient>, period: Duration) -> KeepaliveHandle {
    let (tx, mut rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        info!("Keepalive started, interval {:?}", period);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = &mut rx => {
                    info!("Keepalive stopped");
                    break;
                }
                _ = ticker.tick() => {
                    keepalive_once(&api).await;
                }
            }
        }
    });

    KeepaliveHandle {
        shutdown: Some(tx),
        task: Some(task),
    }
}
