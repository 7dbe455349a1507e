//! The eligibility engine.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use promo_core::{
    DEFAULT_CODE_PREFIX, DEFAULT_ORACLE_TIMEOUT_MS, DEFAULT_STORE_TIMEOUT_MS, DEFAULT_WINDOW_SECS,
};
use promo_store::{
    IssueOutcome, RecordStore, StoreError, StoredTime, StubOutcome, UserId, UserRecord,
};
use tracing::{debug, error, info, warn};

use crate::code::CodeGenerator;
use crate::error::EngineError;
use crate::membership::{MembershipAction, MembershipEvent};
use crate::oracle::SubscriptionOracle;
use crate::outcome::{Greeting, Outcome};
use crate::state::{Decision, EligibilityState, NewUserPolicy, decide};
use crate::status::MembershipStatus;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Channel whose membership is checked.
    pub channel_id: String,
    /// Length of the eligibility window after `joined_at`.
    pub window: Duration,
    pub new_user_policy: NewUserPolicy,
    /// Budget for one oracle lookup.
    pub oracle_timeout: Duration,
    /// Budget for one store call.
    pub store_timeout: Duration,
    pub code_prefix: String,
}

impl EngineConfig {
    /// Configuration for `channel_id` with default settings.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            new_user_policy: NewUserPolicy::default(),
            oracle_timeout: Duration::from_millis(DEFAULT_ORACLE_TIMEOUT_MS),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
        }
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn new_user_policy(mut self, policy: NewUserPolicy) -> Self {
        self.new_user_policy = policy;
        self
    }

    pub fn oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.code_prefix = prefix.into();
        self
    }
}

/// Decides and records promo code issuance.
///
/// Safe to share across tasks: the engine holds no mutable state and relies
/// on the store's conditional writes for at-most-once issuance. Every oracle
/// lookup and store call runs under its configured timeout.
///
/// # Example
///
/// ```
/// use promo_engine::{EligibilityEngine, EngineConfig, MembershipStatus, Outcome, StaticOracle};
/// use promo_store::{MemoryStore, UserId};
///
/// # async fn example() -> Result<(), promo_engine::EngineError> {
/// let oracle = StaticOracle::new().with(UserId(7), MembershipStatus::Member);
/// let engine = EligibilityEngine::new(EngineConfig::new("@shop"), MemoryStore::new(), oracle);
///
/// // Subscribed before any join was seen: a stub, no code.
/// assert_eq!(engine.check(UserId(7), Some("ann")).await?, Outcome::SubscribedNoWindow);
/// # Ok(())
/// # }
/// ```
pub struct EligibilityEngine {
    config: EngineConfig,
    window: TimeDelta,
    codes: CodeGenerator,
    store: Arc<dyn RecordStore>,
    oracle: Arc<dyn SubscriptionOracle>,
}

impl EligibilityEngine {
    pub fn new<S, O>(config: EngineConfig, store: S, oracle: O) -> Self
    where
        S: RecordStore + 'static,
        O: SubscriptionOracle + 'static,
    {
        let window = TimeDelta::from_std(config.window).unwrap_or(TimeDelta::MAX);
        let codes = CodeGenerator::new(config.code_prefix.clone());
        Self {
            config,
            window,
            codes,
            store: Arc::new(store),
            oracle: Arc::new(oracle),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The record store the engine writes to.
    #[inline]
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Check a user at the current time.
    pub async fn check(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
    ) -> Result<Outcome, EngineError> {
        self.check_at(user_id, display_name, Utc::now()).await
    }

    /// Check a user at `now`, issuing a code if eligible.
    ///
    /// Returns [`EngineError::StoreUnavailable`] only when the store fails;
    /// oracle failures resolve to [`Outcome::NotSubscribed`].
    pub async fn check_at(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Outcome, EngineError> {
        let status = self.membership(user_id).await;
        if !status.is_active() {
            debug!(user_id = %user_id, status = %status, "check: not subscribed");
            return Ok(Outcome::NotSubscribed);
        }

        let record = self.find(user_id).await?;
        let decision = decide(
            status,
            record.as_ref(),
            now,
            self.window,
            self.config.new_user_policy,
        );
        let outcome = self.execute(decision, user_id, display_name, now).await?;
        debug!(user_id = %user_id, outcome = outcome.as_str(), "check done");
        Ok(outcome)
    }

    /// Greet a user at the current time.
    pub async fn greet(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
    ) -> Result<Greeting, EngineError> {
        self.greet_at(user_id, display_name, Utc::now()).await
    }

    /// Greet a user at `now`.
    ///
    /// Never issues a code. An active member without a record gets a stub,
    /// the same as a check would under [`NewUserPolicy::Stub`].
    pub async fn greet_at(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Greeting, EngineError> {
        let status = self.membership(user_id).await;
        let record = self.find(user_id).await?;

        let greeting = match (status.is_active(), record) {
            (false, None) => Greeting::NotSubscribed,
            (false, Some(_)) => Greeting::Lapsed,
            (true, None) => {
                self.create_stub(user_id, display_name).await?;
                Greeting::Subscribed
            }
            (true, Some(record)) => {
                match EligibilityState::derive(Some(&record), now, self.window) {
                    EligibilityState::WithinWindow => Greeting::SubscribedEligible,
                    _ => Greeting::Subscribed,
                }
            }
        };
        debug!(user_id = %user_id, greeting = greeting.as_str(), "greet done");
        Ok(greeting)
    }

    /// Record the start of a window on a join transition.
    pub async fn on_membership(
        &self,
        event: &MembershipEvent,
    ) -> Result<MembershipAction, EngineError> {
        if !event.is_join() {
            debug!(
                user_id = %event.user_id,
                old = %event.old_status,
                new = %event.new_status,
                "membership change ignored"
            );
            return Ok(MembershipAction::Ignored);
        }

        let joined = self
            .store_call(self.store.upsert_join(
                event.user_id,
                event.display_name.as_deref(),
                event.at,
            ))
            .await?;
        if joined.is_mutation() {
            info!(user_id = %event.user_id, joined_at = %event.at, outcome = ?joined, "join recorded");
            Ok(MembershipAction::JoinRecorded)
        } else {
            debug!(user_id = %event.user_id, "join already known, keeping first timestamp");
            Ok(MembershipAction::JoinAlreadyKnown)
        }
    }

    async fn execute(
        &self,
        decision: Decision,
        user_id: UserId,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Outcome, EngineError> {
        match decision {
            Decision::Respond(outcome) => Ok(outcome),
            Decision::CreateStub => {
                self.create_stub(user_id, display_name).await?;
                Ok(Outcome::SubscribedNoWindow)
            }
            Decision::IssueCode => self.issue(user_id, now).await,
            Decision::OpenWindowAndIssue => {
                // Insert-only: a record written since the read (a join, a
                // stub from /start, an ineligible marker) is never given a
                // window here.
                let created = self
                    .store_call(self.store.create_joined(user_id, display_name, now))
                    .await?;
                if created == StubOutcome::Created {
                    info!(user_id = %user_id, joined_at = %now, "window opened on first check");
                    return self.issue(user_id, now).await;
                }

                // Someone else wrote the record first; judge what it holds.
                let record = self.find(user_id).await?;
                match decide(
                    MembershipStatus::Member,
                    record.as_ref(),
                    now,
                    self.window,
                    NewUserPolicy::Stub,
                ) {
                    Decision::IssueCode => self.issue(user_id, now).await,
                    Decision::Respond(outcome) => Ok(outcome),
                    Decision::CreateStub | Decision::OpenWindowAndIssue => {
                        Ok(Outcome::SubscribedNoWindow)
                    }
                }
            }
        }
    }

    async fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Outcome, EngineError> {
        let code = self.codes.generate();
        match self
            .store_call(self.store.issue_code(user_id, &code, now))
            .await?
        {
            IssueOutcome::Issued => {
                info!(user_id = %user_id, code = %code, "promo code issued");
                Ok(Outcome::CodeIssued(code))
            }
            IssueOutcome::AlreadyIssued => {
                debug!(user_id = %user_id, "code already present, issue skipped");
                Ok(Outcome::AlreadyRewarded)
            }
        }
    }

    async fn create_stub(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
    ) -> Result<(), EngineError> {
        let created = self
            .store_call(self.store.create_stub(user_id, display_name))
            .await?;
        if created == StubOutcome::Created {
            info!(user_id = %user_id, "stub recorded for subscriber without window");
        }
        Ok(())
    }

    async fn find(&self, user_id: UserId) -> Result<Option<UserRecord>, EngineError> {
        let record = self.store_call(self.store.find(user_id)).await?;
        if let Some(record) = &record {
            warn_malformed(record);
        }
        Ok(record)
    }

    /// Look up membership, resolving every failure to an inactive status.
    async fn membership(&self, user_id: UserId) -> MembershipStatus {
        let lookup = self
            .oracle
            .membership_status(&self.config.channel_id, user_id);
        match tokio::time::timeout(self.config.oracle_timeout, lookup).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    error_type = e.error_type(),
                    "membership lookup failed, treating as not subscribed"
                );
                MembershipStatus::Unknown
            }
            Err(_) => {
                warn!(
                    user_id = %user_id,
                    timeout_ms = self.config.oracle_timeout.as_millis() as u64,
                    "membership lookup timed out, treating as not subscribed"
                );
                MembershipStatus::Unknown
            }
        }
    }

    async fn store_call<T, F>(&self, call: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let result = match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        };
        result.map_err(|e| {
            if !e.is_unavailable() {
                error!(error = %e, error_type = e.error_type(), "store call failed");
            }
            EngineError::StoreUnavailable(e)
        })
    }
}

impl std::fmt::Debug for EligibilityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EligibilityEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn warn_malformed(record: &UserRecord) {
    if let Some(StoredTime::Malformed(raw)) = &record.joined_at {
        warn!(
            user_id = %record.user_id,
            value = %raw,
            "unparseable joined_at, treating window as expired"
        );
    }
    if let Some(StoredTime::Malformed(raw)) = &record.code_issued_at {
        warn!(
            user_id = %record.user_id,
            value = %raw,
            "unparseable code_issued_at"
        );
    }
}
