use crate::adapters::database::push_token_repo::TokenStore;
use crate::adapters::push::{MulticastMessage, PushError, PushProvider};
use crate::domain::notification::{DispatchReport, Notification};
use crate::domain::push_token::PushToken;
use crate::error::{AppError, Result};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Recipient cap of a single FCM multicast call.
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Clone, Debug)]
struct Metrics {
    sent: Counter<u64>,
    failed: Counter<u64>,
    invalidated_tokens: Counter<u64>,
    prune_errors: Counter<u64>,
    dispatch_errors: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("pushcast-server");
        Self {
            sent: meter
                .u64_counter("push_sent_total")
                .with_description("Total number of push notifications accepted by the provider")
                .build(),
            failed: meter
                .u64_counter("push_failed_total")
                .with_description("Total number of push notifications rejected by the provider")
                .build(),
            invalidated_tokens: meter
                .u64_counter("push_invalidated_tokens_total")
                .with_description("Total number of push tokens removed due to being unregistered")
                .build(),
            prune_errors: meter
                .u64_counter("push_prune_errors_total")
                .with_description("Total number of failed deletions of unregistered tokens")
                .build(),
            dispatch_errors: meter
                .u64_counter("push_dispatch_errors_total")
                .with_description("Total number of broadcasts aborted by a store or provider failure")
                .build(),
        }
    }
}

/// Fans a notification out to every stored token and prunes the ones the provider reports as unregistered.
#[derive(Clone, Debug)]
pub struct DispatchService {
    store: Arc<dyn TokenStore>,
    provider: Arc<dyn PushProvider>,
    max_batch_size: usize,
    deadline: Option<Duration>,
    metrics: Metrics,
}

impl DispatchService {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, provider: Arc<dyn PushProvider>, max_batch_size: usize) -> Self {
        Self {
            store,
            provider,
            max_batch_size: max_batch_size.clamp(1, MAX_BATCH_SIZE),
            deadline: None,
            metrics: Metrics::new(),
        }
    }

    /// Bounds the listing and sending phases of each broadcast.
    ///
    /// Pruning runs after the deadline and is always awaited.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Broadcasts `notification` to every registered token.
    ///
    /// Tokens are sent in chunks of at most `max_batch_size`. Tokens the provider reports as unregistered are
    /// deleted in a single call once sending stops. A failed deletion is logged and does not change the result.
    ///
    /// # Errors
    /// Returns `AppError::NoRecipients` if the store is empty (no send is attempted).
    /// Returns `AppError::Store` or `AppError::Provider` if listing tokens or any send fails.
    /// Returns `AppError::Timeout` if the deadline passes before every chunk was sent.
    #[tracing::instrument(level = "info", skip_all, fields(recipients = tracing::field::Empty))]
    pub async fn dispatch(&self, notification: &Notification) -> Result<DispatchReport> {
        let expires_at = self.deadline.map(|d| Instant::now() + d);

        let tokens = self
            .before_deadline(expires_at, self.store.list())
            .await
            .and_then(|listed| listed.map_err(AppError::from))
            .inspect_err(|_| self.metrics.dispatch_errors.add(1, &[KeyValue::new("stage", "list")]))?;
        if tokens.is_empty() {
            return Err(AppError::NoRecipients);
        }
        tracing::Span::current().record("recipients", tokens.len());

        let data = BTreeMap::from([
            ("title".to_string(), notification.title().to_string()),
            ("body".to_string(), notification.body().to_string()),
        ]);

        let mut report = DispatchReport::default();
        let mut dead_ids = Vec::new();
        let mut outcome = Ok(());

        for chunk in tokens.chunks(self.max_batch_size) {
            match self.before_deadline(expires_at, self.send_chunk(chunk, &data)).await {
                Ok(Ok((sent, failed, dead))) => {
                    report.sent += sent;
                    report.failed += failed;
                    dead_ids.extend(dead);
                }
                Ok(Err(e)) => {
                    outcome = Err(AppError::from(e));
                    break;
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        self.metrics.sent.add(report.sent as u64, &[]);
        self.metrics.failed.add(report.failed as u64, &[]);

        // Dead tokens learned before a failing or late chunk are still pruned.
        report.pruned = self.prune(&dead_ids).await;

        if let Err(e) = outcome {
            self.metrics.dispatch_errors.add(1, &[KeyValue::new("stage", "send")]);
            return Err(e);
        }

        tracing::info!(sent = report.sent, failed = report.failed, pruned = report.pruned, "Broadcast complete");
        Ok(report)
    }

    async fn before_deadline<T>(&self, expires_at: Option<Instant>, fut: impl Future<Output = T>) -> Result<T> {
        match (expires_at, self.deadline) {
            (Some(at), Some(limit)) => tokio::time::timeout_at(at, fut).await.map_err(|_| AppError::Timeout(limit)),
            _ => Ok(fut.await),
        }
    }

    /// Sends one chunk and returns `(sent, failed, dead ids)`.
    async fn send_chunk(
        &self,
        chunk: &[PushToken],
        data: &BTreeMap<String, String>,
    ) -> std::result::Result<(usize, usize, Vec<String>), PushError> {
        let message =
            MulticastMessage { data: data.clone(), tokens: chunk.iter().map(|t| t.token.clone()).collect() };

        let batch = self.provider.send_multicast(&message).await?;
        if batch.responses.len() != chunk.len() {
            return Err(PushError::Misaligned { expected: chunk.len(), actual: batch.responses.len() });
        }

        let dead = chunk
            .iter()
            .zip(&batch.responses)
            .filter(|(_, response)| response.is_unregistered())
            .map(|(record, _)| record.id.clone())
            .collect::<Vec<_>>();

        tracing::debug!(
            size = chunk.len(),
            sent = batch.success_count,
            failed = batch.failure_count,
            dead = dead.len(),
            "Chunk sent"
        );

        Ok((batch.success_count, batch.failure_count, dead))
    }

    /// Deletes unregistered tokens, returning how many were removed.
    async fn prune(&self, dead_ids: &[String]) -> usize {
        if dead_ids.is_empty() {
            return 0;
        }

        match self.store.delete_many(dead_ids).await {
            Ok(()) => {
                tracing::info!(count = dead_ids.len(), "Removed unregistered push tokens");
                self.metrics.invalidated_tokens.add(dead_ids.len() as u64, &[]);
                dead_ids.len()
            }
            Err(e) => {
                tracing::error!(error = %e, count = dead_ids.len(), "Failed to delete unregistered push tokens");
                self.metrics.prune_errors.add(1, &[]);
                0
            }
        }
    }
}
