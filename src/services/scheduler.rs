//! Wraps [`crate::scheduler::Scheduler`] in the `Service` trait, following
//! `services::web::WebService`'s pattern of an internal shutdown broadcast
//! channel signaled from `Service::shutdown`.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::Service;
use crate::scheduler::Scheduler;

pub struct SchedulerService {
    scheduler: Arc<Scheduler>,
    shutdown_tx: Option<broadcast::Sender<()>>,
}

impl SchedulerService {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self {
            scheduler,
            shutdown_tx: None,
        }
    }
}

#[async_trait::async_trait]
impl Service for SchedulerService {
    fn name(&self) -> &'static str {
        "scheduler"
    }

    async fn run(&mut self) -> Result<(), anyhow::Error> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        self.shutdown_tx = Some(shutdown_tx);
        self.scheduler.run(shutdown_rx).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), anyhow::Error> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}
