//! Reaction aggregator
//!
//! Claims each channel in the progress ledger, walks its history page by page
//! (with a nested replies walk per thread root) and flushes every page through the
//! persistence writer together with its checkpoint. Channels are independent
//! units; a channel-fatal error fails only that channel, a workspace-fatal error
//! stops the run.

use std::convert::Infallible;

use chrono::Duration;
use futures::stream::{self, StreamExt};
use reaction_client::ApiError;
use reaction_core::{
    ChannelId, Checkpoint, ClaimOutcome, ClaimRequest, DomainError, FlushBatch, Message,
    MessageTs, PageOrder, ReactionTally, ResumePoint,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{AggregateReport, AggregationRequest, ChannelReport, ChannelResult, RunOutcome};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::stop::StopHandle;

/// Failure reason recorded when a claim is released on stop
const INTERRUPTED_REASON: &str = "interrupted before completion";

/// Fixed parameters of one run
#[derive(Debug, Clone)]
struct RunParams {
    run_id: String,
    order: PageOrder,
    /// Exclusive lower bound: nothing at or before it is counted
    window: MessageTs,
    /// Position given to records that have none
    initial_cursor: MessageTs,
    force_rescan: bool,
    lease: Duration,
}

impl RunParams {
    /// History request bounds for a walk resuming at `position`
    fn bounds(&self, position: &ResumePoint) -> (Option<MessageTs>, Option<MessageTs>) {
        match self.order {
            PageOrder::NewestFirst => (Some(self.window.clone()), position.cursor.clone()),
            PageOrder::OldestFirst => {
                let oldest = match &position.cursor {
                    Some(cursor) if *cursor > self.window => cursor.clone(),
                    _ => self.window.clone(),
                };
                (Some(oldest), None)
            }
        }
    }

    /// Interval between lease renewals
    fn heartbeat(&self) -> std::time::Duration {
        (self.lease / 3)
            .to_std()
            .unwrap_or_default()
            .max(std::time::Duration::from_millis(100))
    }

    fn claim(&self) -> ClaimRequest {
        ClaimRequest {
            run_id: self.run_id.clone(),
            initial_cursor: Some(self.initial_cursor.clone()),
            force_rescan: self.force_rescan,
            lease: self.lease,
        }
    }

    /// Thread roots in walk order
    fn sort_roots(&self, roots: &mut [&Message]) {
        match self.order {
            PageOrder::NewestFirst => roots.sort_by(|a, b| b.ts.cmp(&a.ts)),
            PageOrder::OldestFirst => roots.sort_by(|a, b| a.ts.cmp(&b.ts)),
        }
    }
}

/// Aggregation service
pub struct AggregatorService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AggregatorService<'a> {
    /// Create a new AggregatorService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Aggregate reactions for the requested channels
    ///
    /// Returns the counts accumulated in this invocation only; stored totals live
    /// in the reaction table.
    #[instrument(skip(self, request, stop), fields(window_days = request.window_days))]
    pub async fn aggregate(
        &self,
        request: &AggregationRequest,
        stop: &StopHandle,
    ) -> ServiceResult<AggregateReport> {
        request.validate()?;

        let now = self.ctx.clock().now();
        let run_id = Uuid::new_v4().to_string();
        let order = self.ctx.slack().history_order();
        let window = MessageTs::from_datetime(now - Duration::days(i64::from(request.window_days)));
        let params = RunParams {
            run_id: run_id.clone(),
            order,
            initial_cursor: match order {
                PageOrder::NewestFirst => MessageTs::from_datetime(now),
                PageOrder::OldestFirst => window.clone(),
            },
            window,
            force_rescan: request.force_rescan,
            lease: request.lease(),
        };

        let mut report = AggregateReport {
            run_id,
            outcome: RunOutcome::Completed,
            abort_reason: None,
            window_days: request.window_days,
            started_at: now,
            finished_at: now,
            channels: Vec::new(),
        };

        if let Some(reason) = self.preflight(request.strict_scopes).await {
            error!(run_id = %report.run_id, reason = %reason, "Aborting run before ingestion");
            report.outcome = RunOutcome::Aborted;
            report.abort_reason = Some(reason);
            report.finished_at = self.ctx.clock().now();
            return Ok(report);
        }

        let channels = self.resolve_channels(request).await?;
        self.ctx.progress_ledger().register(&channels).await?;

        info!(
            run_id = %params.run_id,
            channels = channels.len(),
            max_workers = request.max_workers,
            force_rescan = params.force_rescan,
            "Starting aggregation run"
        );

        let halt = StopHandle::new();
        let results: Vec<(ChannelReport, Option<String>)> = stream::iter(channels)
            .map(|channel_id| self.run_channel(channel_id, &params, stop, &halt))
            .buffered(request.max_workers)
            .collect()
            .await;

        for (channel, abort_reason) in results {
            if report.abort_reason.is_none() {
                report.abort_reason = abort_reason;
            }
            report.channels.push(channel);
        }

        report.outcome = if report.abort_reason.is_some() {
            RunOutcome::Aborted
        } else if report.channels.iter().all(|c| c.result.is_done()) {
            RunOutcome::Completed
        } else {
            RunOutcome::Partial
        };
        report.finished_at = self.ctx.clock().now();

        info!(
            run_id = %report.run_id,
            outcome = ?report.outcome,
            reactions = report.total_reactions(),
            "Aggregation run finished"
        );
        Ok(report)
    }

    /// Scope check; returns a reason when the run must not start
    async fn preflight(&self, strict: bool) -> Option<String> {
        match self.ctx.slack().granted_scopes().await {
            Ok(Some(granted)) => {
                let missing = granted.missing_required();
                if missing.is_empty() {
                    debug!(scopes = %granted, "Required scopes present");
                    None
                } else if strict {
                    Some(format!("missing required scopes: {missing}"))
                } else {
                    warn!(missing = %missing, "Credential lacks required scopes; continuing");
                    None
                }
            }
            Ok(None) => {
                warn!("Granted scopes not reported; skipping scope check");
                None
            }
            Err(e) if e.is_workspace_fatal() => Some(e.to_string()),
            Err(e) => {
                warn!(error = %e, "Scope check failed; continuing");
                None
            }
        }
    }

    async fn resolve_channels(&self, request: &AggregationRequest) -> ServiceResult<Vec<ChannelId>> {
        if request.channels.is_empty() {
            return Ok(self.ctx.channel_repo().list_candidates().await?);
        }

        let mut seen = std::collections::HashSet::new();
        Ok(request
            .channel_ids()
            .into_iter()
            .filter(|id| !id.as_str().is_empty() && seen.insert(id.clone()))
            .collect())
    }

    fn should_stop(stop: &StopHandle, halt: &StopHandle) -> bool {
        stop.is_requested() || halt.is_requested()
    }

    /// Process one channel and turn its error, if any, into a channel result
    async fn run_channel(
        &self,
        channel_id: ChannelId,
        params: &RunParams,
        stop: &StopHandle,
        halt: &StopHandle,
    ) -> (ChannelReport, Option<String>) {
        let mut report = ChannelReport::new(channel_id.clone(), ChannelResult::Interrupted);

        let work = self.process_channel(&channel_id, params, &mut report, stop, halt);
        let outcome = tokio::select! {
            biased;
            result = work => result,
            never = self.keep_claim_alive(&channel_id, params) => match never {},
        };

        match outcome {
            Ok(result) => {
                report.result = result;
                (report, None)
            }
            Err(err) if err.is_workspace_fatal() => {
                halt.request_stop();
                let reason = err.to_string();
                error!(
                    channel_id = %channel_id,
                    run_id = %params.run_id,
                    error = %reason,
                    "Workspace-fatal error; stopping run"
                );
                self.release(&channel_id, params, &format!("run aborted: {}", err.error_code()))
                    .await;
                report.result = ChannelResult::Failed {
                    reason: reason.clone(),
                };
                (report, Some(reason))
            }
            Err(ServiceError::Domain(DomainError::NotInProgress(_))) => {
                warn!(
                    channel_id = %channel_id,
                    run_id = %params.run_id,
                    "Claim taken over by another run"
                );
                report.result = ChannelResult::HeldByOther { owner: None };
                (report, None)
            }
            Err(err) => {
                let reason = match &err {
                    ServiceError::Api(api) => channel_failure_reason(api),
                    other => other.to_string(),
                };
                error!(
                    channel_id = %channel_id,
                    run_id = %params.run_id,
                    reason = %reason,
                    pages = report.pages,
                    "Channel failed"
                );
                self.release(&channel_id, params, &reason).await;
                report.result = ChannelResult::Failed { reason };
                (report, None)
            }
        }
    }

    async fn process_channel(
        &self,
        channel_id: &ChannelId,
        params: &RunParams,
        report: &mut ChannelReport,
        stop: &StopHandle,
        halt: &StopHandle,
    ) -> ServiceResult<ChannelResult> {
        if Self::should_stop(stop, halt) {
            debug!(channel_id = %channel_id, "Stop requested before claim; leaving channel pending");
            return Ok(ChannelResult::Interrupted);
        }

        let record = match self
            .ctx
            .progress_ledger()
            .mark_in_progress(channel_id, &params.claim())
            .await?
        {
            ClaimOutcome::Claimed(record) => record,
            ClaimOutcome::AlreadyCompleted(record) => {
                info!(
                    channel_id = %channel_id,
                    reaction_count = record.reaction_count,
                    "Channel already completed; skipping"
                );
                return Ok(ChannelResult::AlreadyCompleted);
            }
            ClaimOutcome::HeldByOther(record) => {
                warn!(
                    channel_id = %channel_id,
                    owner = ?record.owner,
                    "Channel claimed by another run; skipping"
                );
                return Ok(ChannelResult::HeldByOther {
                    owner: record.owner,
                });
            }
        };

        let mut position = record.position;
        if position.cursor.as_ref() == Some(&params.initial_cursor) {
            info!(channel_id = %channel_id, run_id = %params.run_id, "Starting channel");
        } else {
            info!(
                channel_id = %channel_id,
                run_id = %params.run_id,
                cursor = ?position.cursor.as_ref().map(MessageTs::as_str),
                last_thread_ts = ?position.last_thread_ts.as_ref().map(MessageTs::as_str),
                reaction_count = record.reaction_count,
                "Resuming channel"
            );
        }

        let client = self.ctx.slack();
        let (oldest, latest) = params.bounds(&position);
        let mut walker = client.history(channel_id, oldest, latest);

        loop {
            if Self::should_stop(stop, halt) {
                return self.interrupt(channel_id, params, report).await;
            }

            let Some(page) = walker.next_page().await? else {
                break;
            };

            let messages: Vec<Message> = page
                .messages
                .into_iter()
                .filter(|m| m.ts > params.window)
                .collect();

            let mut roots: Vec<&Message> = messages.iter().filter(|m| m.is_thread_root()).collect();
            params.sort_roots(&mut roots);

            for root in roots {
                if params
                    .order
                    .thread_done(&root.ts, position.last_thread_ts.as_ref())
                {
                    debug!(channel_id = %channel_id, thread_ts = %root.ts, "Thread already flushed");
                    continue;
                }
                if Self::should_stop(stop, halt) {
                    return self.interrupt(channel_id, params, report).await;
                }
                self.walk_thread(channel_id, &root.ts, &mut position, params, report)
                    .await?;
            }

            let mut tally = ReactionTally::new();
            for message in messages.iter().filter(|m| !m.is_reply()) {
                tally.add_entries(&message.reactions);
            }

            position = ResumePoint {
                cursor: params
                    .order
                    .frontier(messages.iter().map(|m| &m.ts))
                    .or(position.cursor),
                last_thread_ts: None,
            };
            self.flush(channel_id, params, position.clone(), messages, tally, report)
                .await?;
            report.pages += 1;

            debug!(
                channel_id = %channel_id,
                page = page.number,
                cursor = ?position.cursor.as_ref().map(MessageTs::as_str),
                "History page flushed"
            );
        }

        self.ctx
            .progress_ledger()
            .mark_completed(channel_id, &params.run_id)
            .await?;

        info!(
            channel_id = %channel_id,
            run_id = %params.run_id,
            pages = report.pages,
            threads = report.threads,
            reactions = report.reactions.total(),
            "Channel completed"
        );
        Ok(ChannelResult::Completed)
    }

    /// Walk one thread's replies, flushing each page; the last flush marks the
    /// thread done in the ledger
    async fn walk_thread(
        &self,
        channel_id: &ChannelId,
        root_ts: &MessageTs,
        position: &mut ResumePoint,
        params: &RunParams,
        report: &mut ChannelReport,
    ) -> ServiceResult<()> {
        let mut walker = self.ctx.slack().replies(channel_id, root_ts);

        while let Some(page) = walker.next_page().await? {
            let last = page.is_last();
            let replies: Vec<Message> = page
                .messages
                .into_iter()
                .filter(|m| &m.ts != root_ts)
                .collect();

            let mut tally = ReactionTally::new();
            for reply in &replies {
                tally.add_entries(&reply.reactions);
            }

            let checkpoint_at = if last {
                position.with_thread(root_ts.clone())
            } else {
                position.clone()
            };
            self.flush(channel_id, params, checkpoint_at.clone(), replies, tally, report)
                .await?;

            if last {
                *position = checkpoint_at;
            }
        }

        report.threads += 1;
        Ok(())
    }

    async fn flush(
        &self,
        channel_id: &ChannelId,
        params: &RunParams,
        position: ResumePoint,
        messages: Vec<Message>,
        reactions: ReactionTally,
        report: &mut ChannelReport,
    ) -> ServiceResult<()> {
        let batch = FlushBatch {
            checkpoint: Checkpoint {
                channel_id: channel_id.clone(),
                run_id: params.run_id.clone(),
                position,
                reaction_delta: i64::try_from(reactions.total()).unwrap_or(i64::MAX),
            },
            messages,
            reactions,
        };
        self.ctx.writer().flush(&batch).await?;

        report.messages += batch.messages.len() as u64;
        report.reactions.merge(&batch.reactions);
        Ok(())
    }

    async fn interrupt(
        &self,
        channel_id: &ChannelId,
        params: &RunParams,
        report: &ChannelReport,
    ) -> ServiceResult<ChannelResult> {
        warn!(
            channel_id = %channel_id,
            run_id = %params.run_id,
            pages = report.pages,
            "Stop requested; releasing channel"
        );
        self.release(channel_id, params, INTERRUPTED_REASON).await;
        Ok(ChannelResult::Interrupted)
    }

    /// Move a claimed channel to `failed` so any later run may resume it
    ///
    /// A claim another run has since taken over is left alone.
    async fn release(&self, channel_id: &ChannelId, params: &RunParams, reason: &str) {
        match self
            .ctx
            .progress_ledger()
            .mark_failed(channel_id, &params.run_id, reason)
            .await
        {
            Ok(()) => {}
            Err(DomainError::NotInProgress(_)) => {
                info!(
                    channel_id = %channel_id,
                    run_id = %params.run_id,
                    "Claim already taken over by another run; not releasing"
                );
            }
            Err(e) => {
                warn!(channel_id = %channel_id, error = %e, "Failed to release channel claim");
            }
        }
    }

    /// Renew the claim every third of the lease; runs until dropped
    async fn keep_claim_alive(&self, channel_id: &ChannelId, params: &RunParams) -> Infallible {
        let period = params.heartbeat();
        loop {
            tokio::time::sleep(period).await;
            match self
                .ctx
                .progress_ledger()
                .renew(channel_id, &params.run_id)
                .await
            {
                Ok(()) => debug!(channel_id = %channel_id, "Claim renewed"),
                Err(e) => debug!(channel_id = %channel_id, error = %e, "Claim not renewed"),
            }
        }
    }
}

/// Failure reason stored in the ledger for a channel-fatal API error
fn channel_failure_reason(err: &ApiError) -> String {
    match err {
        ApiError::Channel { code, .. } | ApiError::Api { code, .. } => code.clone(),
        other => other.to_string(),
    }
}
