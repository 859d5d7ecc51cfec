//! Records a captured visitor and fans them out to the campaign's outputs.
//!
//! Both branches run as background tasks once the visitor has been redirected. They never
//! wait on each other: a failed insert does not stop delivery, and one failed output does not
//! stop the others. Deliveries share a bounded pool of permits and each one is cut off after
//! `output_timeout`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use campaign_auth::oauth::NormalizedResult;
use log::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::campaign::CampaignState;
use crate::error::{campaign_error, CampaignErrorKind, DomainErrorKind, Error, InternalErrorKind};
use crate::output::OutputFactory;
use crate::store::{CampaignStore, NewSubscriber};
use crate::{subscribers, Id};

/// Outcome of one fan-out, for logs and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Dispatcher {
    store: Arc<dyn CampaignStore>,
    factory: OutputFactory,
    permits: Arc<Semaphore>,
    output_timeout: Duration,
    tasks: Mutex<JoinSet<()>>,
    closed: AtomicBool,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        factory: OutputFactory,
        concurrency: usize,
        output_timeout: Duration,
    ) -> Self {
        Self {
            store,
            factory,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            output_timeout,
            tasks: Mutex::new(JoinSet::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Runs `task` in the background, tracked so `drain` can wait for it.
    ///
    /// Refused once the dispatcher is closed.
    pub fn spawn<F>(&self, task: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(closed_error());
        }
        let mut tasks = self.tasks.lock().map_err(|_| closed_error())?;
        // Reap finished tasks so the set only holds what is still running.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
        Ok(())
    }

    /// Starts recording `result` on the campaign's list and delivering it to every output.
    ///
    /// Returns as soon as the work is scheduled. Failures are logged, never returned.
    pub fn on_callback_result(
        self: &Arc<Self>,
        state: &CampaignState,
        result: NormalizedResult,
        owner_id: Id,
    ) -> Result<(), Error> {
        let this = Arc::clone(self);
        let state = state.clone();
        self.spawn(async move {
            this.record_and_dispatch(&state, result, owner_id).await;
        })
    }

    /// Runs the record and the fan-out side by side and waits for both.
    ///
    /// Neither branch can stop the other. Work that is already tracked calls this directly, so
    /// a drain in progress still waits for both branches.
    pub async fn record_and_dispatch(
        self: &Arc<Self>,
        state: &CampaignState,
        result: NormalizedResult,
        owner_id: Id,
    ) -> DispatchReport {
        let record = async {
            let Ok(list_id) = Id::parse_str(&state.list_id) else {
                warn!(
                    "{:?}: list id {} is not a UUID",
                    CampaignErrorKind::RecordFailure,
                    state.list_id
                );
                return;
            };
            let new = NewSubscriber {
                list_id,
                owner_id,
                provider: state.provider_name,
                display_name: result.display_name.clone(),
                email_address: result.email_address.clone(),
            };
            if let Err(e) = self.record_subscriber(new).await {
                warn!("Subscriber was not recorded: {e:?}");
            }
        };
        let fan_out = self.dispatch_to_outputs(&state.output_ids, owner_id, &result);

        let ((), report) = tokio::join!(record, fan_out);
        info!(
            "Delivered subscriber to {} of {} outputs",
            report.delivered,
            state.output_ids.len()
        );
        report
    }

    /// Inserts the subscriber. Failures, such as an email seen before, are `RecordFailure`.
    pub async fn record_subscriber(&self, new: NewSubscriber) -> Result<subscribers::Model, Error> {
        debug!("Recording {} on list {}", new.email_address, new.list_id);
        let subscriber = self
            .store
            .insert_subscriber(new)
            .await
            .map_err(|e| e.into_campaign(CampaignErrorKind::RecordFailure))?;
        info!(
            "Recorded subscriber {} on list {}",
            subscriber.id, subscriber.email_list_id
        );
        Ok(subscriber)
    }

    /// Delivers `result` to every output concurrently and waits for all of them.
    pub async fn dispatch_to_outputs(
        self: &Arc<Self>,
        output_ids: &[String],
        owner_id: Id,
        result: &NormalizedResult,
    ) -> DispatchReport {
        let mut deliveries = JoinSet::new();
        for output_id in output_ids {
            let this = Arc::clone(self);
            let output_id = output_id.clone();
            let result = result.clone();
            deliveries.spawn(async move {
                match this.deliver(&output_id, owner_id, &result).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Output {output_id} skipped: {e:?}");
                        false
                    }
                }
            });
        }

        let mut report = DispatchReport::default();
        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok(true) => report.delivered += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    error!("Output delivery task did not finish: {e}");
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn deliver(
        &self,
        output_id: &str,
        owner_id: Id,
        result: &NormalizedResult,
    ) -> Result<(), Error> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| delivery_failure(closed_error()))?;

        let id = Id::parse_str(output_id)
            .map_err(|_| campaign_error(CampaignErrorKind::OutputDeliveryFailure))?;

        let delivery = async {
            let model = self.store.output_by_id_and_owner(id, owner_id).await?;
            let output = self.factory.build(model)?;
            debug!("Delivering to {} output {}", output.kind(), output.id());
            output
                .handle(&result.email_address, &result.display_name)
                .await
        };

        match tokio::time::timeout(self.output_timeout, delivery).await {
            Ok(outcome) => outcome.map_err(delivery_failure),
            Err(_) => {
                warn!(
                    "Output {output_id} timed out after {}s",
                    self.output_timeout.as_secs()
                );
                Err(campaign_error(CampaignErrorKind::OutputDeliveryFailure))
            }
        }
    }

    /// Waits until every tracked task, including ones spawned while waiting, has finished.
    pub async fn drain(&self) {
        loop {
            let mut tasks = match self.tasks.lock() {
                Ok(mut guard) => std::mem::take(&mut *guard),
                Err(_) => return,
            };
            if tasks.is_empty() {
                return;
            }
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!("Background campaign task did not finish: {e}");
                }
            }
        }
    }

    /// Stops accepting work and waits up to `grace` for in-flight tasks.
    pub async fn shutdown(&self, grace: Duration) {
        self.closed.store(true, Ordering::SeqCst);
        if tokio::time::timeout(grace, self.drain()).await.is_err() {
            warn!("Campaign tasks still running after {}s, abandoning them", grace.as_secs());
        }
    }
}

fn delivery_failure(err: Error) -> Error {
    err.or_campaign(CampaignErrorKind::OutputDeliveryFailure)
}

fn closed_error() -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
            "dispatcher is shut down".to_string(),
        )),
    }
}
