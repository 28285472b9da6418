//! Wraps one [`crate::worker::Worker`] in the `Service` trait. `App`
//! registers `worker_concurrency` of these under distinct names
//! (`worker-0`, `worker-1`, ...) so `ServiceManager` shuts each down and
//! reports each independently, same as `services::web::WebService`'s
//! internal-shutdown-channel pattern.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::Service;
use crate::worker::Worker;

pub struct WorkerService {
    name: &'static str,
    worker: Arc<Worker>,
    shutdown_tx: Option<broadcast::Sender<()>>,
}

impl WorkerService {
    /// `name` is leaked to satisfy `Service::name`'s `&'static str`; this
    /// runs once per worker at startup, not per job.
    pub fn new(name: String, worker: Arc<Worker>) -> Self {
        Self {
            name: Box::leak(name.into_boxed_str()),
            worker,
            shutdown_tx: None,
        }
    }
}

#[async_trait::async_trait]
impl Service for WorkerService {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&mut self) -> Result<(), anyhow::Error> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        self.shutdown_tx = Some(shutdown_tx);
        self.worker.run(shutdown_rx).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), anyhow::Error> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}
