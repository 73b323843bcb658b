//! Service context - dependency container for services
//!
//! Holds the store ports, the API client and the clock. Everything behind a port
//! is an `Arc<dyn ...>` so tests can swap in their own implementations.

use std::sync::Arc;

use reaction_client::SlackClient;
use reaction_core::traits::{
    ChannelRepository, Clock, MessageRepository, PersistenceWriter, ProgressLedger,
    ReactionRepository, SystemClock,
};
use reaction_db::{
    SqliteChannelRepository, SqliteMessageRepository, SqlitePersistenceWriter, SqlitePool,
    SqliteProgressLedger, SqliteReactionRepository,
};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Database pool
    pool: SqlitePool,

    // Repositories
    channel_repo: Arc<dyn ChannelRepository>,
    message_repo: Arc<dyn MessageRepository>,
    reaction_repo: Arc<dyn ReactionRepository>,
    progress_ledger: Arc<dyn ProgressLedger>,
    writer: Arc<dyn PersistenceWriter>,

    // Remote API
    slack: Arc<SlackClient>,

    clock: Arc<dyn Clock>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: SqlitePool,
        channel_repo: Arc<dyn ChannelRepository>,
        message_repo: Arc<dyn MessageRepository>,
        reaction_repo: Arc<dyn ReactionRepository>,
        progress_ledger: Arc<dyn ProgressLedger>,
        writer: Arc<dyn PersistenceWriter>,
        slack: Arc<SlackClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool,
            channel_repo,
            message_repo,
            reaction_repo,
            progress_ledger,
            writer,
            slack,
            clock,
        }
    }

    /// Wire the SQLite implementations of every port onto one pool
    pub fn sqlite(pool: SqlitePool, slack: SlackClient, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            pool.clone(),
            Arc::new(SqliteChannelRepository::new(pool.clone())),
            Arc::new(SqliteMessageRepository::new(pool.clone())),
            Arc::new(SqliteReactionRepository::new(pool.clone())),
            Arc::new(SqliteProgressLedger::new(pool.clone()).with_clock(clock.clone())),
            Arc::new(SqlitePersistenceWriter::new(pool).with_clock(clock.clone())),
            Arc::new(slack),
            clock,
        )
    }

    // === Database Pool ===

    /// Get the SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // === Repositories ===

    pub fn channel_repo(&self) -> &dyn ChannelRepository {
        self.channel_repo.as_ref()
    }

    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    pub fn reaction_repo(&self) -> &dyn ReactionRepository {
        self.reaction_repo.as_ref()
    }

    pub fn progress_ledger(&self) -> &dyn ProgressLedger {
        self.progress_ledger.as_ref()
    }

    pub fn writer(&self) -> &dyn PersistenceWriter {
        self.writer.as_ref()
    }

    // === Remote API ===

    pub fn slack(&self) -> &SlackClient {
        self.slack.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("pool", &"SqlitePool")
            .field("repositories", &"...")
            .field("slack", &self.slack)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
///
/// Ports that are not set explicitly fall back to their SQLite implementation on
/// the given pool.
pub struct ServiceContextBuilder {
    pool: Option<SqlitePool>,
    channel_repo: Option<Arc<dyn ChannelRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    reaction_repo: Option<Arc<dyn ReactionRepository>>,
    progress_ledger: Option<Arc<dyn ProgressLedger>>,
    writer: Option<Arc<dyn PersistenceWriter>>,
    slack: Option<Arc<SlackClient>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            pool: None,
            channel_repo: None,
            message_repo: None,
            reaction_repo: None,
            progress_ledger: None,
            writer: None,
            slack: None,
            clock: None,
        }
    }

    pub fn pool(mut self, pool: SqlitePool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn channel_repo(mut self, repo: Arc<dyn ChannelRepository>) -> Self {
        self.channel_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn reaction_repo(mut self, repo: Arc<dyn ReactionRepository>) -> Self {
        self.reaction_repo = Some(repo);
        self
    }

    pub fn progress_ledger(mut self, ledger: Arc<dyn ProgressLedger>) -> Self {
        self.progress_ledger = Some(ledger);
        self
    }

    pub fn writer(mut self, writer: Arc<dyn PersistenceWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn slack(mut self, client: SlackClient) -> Self {
        self.slack = Some(Arc::new(client));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if the pool or the API client is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let pool = self
            .pool
            .ok_or_else(|| ServiceError::validation("pool is required"))?;
        let slack = self
            .slack
            .ok_or_else(|| ServiceError::validation("slack client is required"))?;
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(ServiceContext::new(
            pool.clone(),
            self.channel_repo
                .unwrap_or_else(|| Arc::new(SqliteChannelRepository::new(pool.clone()))),
            self.message_repo
                .unwrap_or_else(|| Arc::new(SqliteMessageRepository::new(pool.clone()))),
            self.reaction_repo
                .unwrap_or_else(|| Arc::new(SqliteReactionRepository::new(pool.clone()))),
            self.progress_ledger.unwrap_or_else(|| {
                Arc::new(SqliteProgressLedger::new(pool.clone()).with_clock(clock.clone()))
            }),
            self.writer.unwrap_or_else(|| {
                Arc::new(SqlitePersistenceWriter::new(pool.clone()).with_clock(clock.clone()))
            }),
            slack,
            clock,
        ))
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
