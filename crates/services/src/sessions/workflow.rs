use std::sync::Arc;

use rand::Rng;
use rand::rng;
use tracing::warn;

use exam_core::Clock;
use exam_core::attempt::{AttemptError, ExamAttempt};
use exam_core::model::AttemptBlueprint;
use exam_core::reconcile::{PointValues, reconcile};
use storage::repository::{PendingSnapshot, ResolvedSnapshot, SessionRepository, StorageError};

use super::plan::SessionBuilder;
use super::service::SessionService;
use crate::bank::{PoolFilter, QuestionBank};
use crate::error::SessionError;
use crate::grading::{GradingAnswer, GradingRequest, GradingService};

/// Terminal report of one finish call.
#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    /// This call submitted the attempt and resolved it.
    Submitted(ResolvedSnapshot),
    /// A submission was already in flight; nothing was sent.
    AlreadyPending,
    /// The attempt was already resolved; nothing was sent.
    AlreadyResolved,
}

/// Orchestrates attempt assembly, persistence, and resolution.
///
/// The collaborators — question bank, grading service, snapshot store —
/// come in as trait objects so tests can script verdicts and count calls.
#[derive(Clone)]
pub struct SessionWorkflow {
    clock: Clock,
    bank: Arc<dyn QuestionBank>,
    grader: Arc<dyn GradingService>,
    repository: Arc<dyn SessionRepository>,
    points: PointValues,
}

impl SessionWorkflow {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<dyn QuestionBank>,
        grader: Arc<dyn GradingService>,
        repository: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            clock,
            bank,
            grader,
            repository,
            points: PointValues::default(),
        }
    }

    /// Replaces the uniform scoring table with a pre-computed one.
    #[must_use]
    pub fn with_points(mut self, points: PointValues) -> Self {
        self.points = points;
        self
    }

    /// Assemble a new attempt from the bank and persist its pending
    /// snapshot, using a fresh thread RNG for the selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` when nothing matched the filter,
    /// and propagates bank and storage failures.
    pub async fn start(
        &self,
        blueprint: AttemptBlueprint,
        filter: &PoolFilter,
    ) -> Result<SessionService, SessionError> {
        let mut rng = rng();
        self.start_with_rng(blueprint, filter, &mut rng).await
    }

    /// Assemble a new attempt with an injected RNG, for deterministic
    /// selections in tests.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` when nothing matched the filter,
    /// and propagates bank and storage failures.
    pub async fn start_with_rng<R: Rng + ?Sized>(
        &self,
        blueprint: AttemptBlueprint,
        filter: &PoolFilter,
        rng: &mut R,
    ) -> Result<SessionService, SessionError> {
        let pool = self.bank.fetch(filter).await?;
        let plan = SessionBuilder::new(blueprint.target_weight()).build_with_rng(&pool, rng);
        if plan.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        let started_at = self.clock.now();
        let attempt = ExamAttempt::new(blueprint, plan.items, started_at)?;

        let snapshot = PendingSnapshot {
            blueprint: attempt.blueprint().clone(),
            items: attempt.items().to_vec(),
            started_at,
            saved_at: started_at,
        };
        self.repository.save_pending(&snapshot).await?;

        Ok(SessionService::new(attempt))
    }

    /// Rebuild the interrupted attempt from the pending slot. The item
    /// sequence and start time come back as saved; answers start blank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) when no attempt is
    /// resumable.
    pub async fn resume(&self) -> Result<SessionService, SessionError> {
        let snapshot = self
            .repository
            .load_pending()
            .await?
            .ok_or(StorageError::NotFound)?;

        let attempt = ExamAttempt::new(snapshot.blueprint, snapshot.items, snapshot.started_at)?;
        Ok(SessionService::new(attempt))
    }

    /// Submit the attempt for grading and resolve it.
    ///
    /// Locks every remaining item, sends the answered ones, reconciles the
    /// verdict, persists the resolved snapshot, and clears the pending
    /// slot. A second call during or after submission reports
    /// `AlreadyPending` / `AlreadyResolved` without sending anything — the
    /// grading request goes out at most once per attempt.
    ///
    /// # Errors
    ///
    /// A failed grading call releases the submission guard so the finish
    /// can be retried, then propagates. A failed resolved-snapshot write
    /// propagates after the attempt is already terminal.
    pub async fn finish(
        &self,
        session: &mut SessionService,
    ) -> Result<FinishOutcome, SessionError> {
        let answered = match session.attempt_mut().begin_submission() {
            Ok(answered) => answered,
            Err(AttemptError::SubmissionInFlight) => return Ok(FinishOutcome::AlreadyPending),
            Err(AttemptError::AlreadyResolved) => return Ok(FinishOutcome::AlreadyResolved),
            Err(err) => return Err(err.into()),
        };

        let request = GradingRequest::new(
            session.attempt().blueprint().context(),
            answered
                .iter()
                .map(|(item, letter)| GradingAnswer::from_selection(item, *letter))
                .collect(),
        );

        let result = match self.grader.grade(&request).await {
            Ok(result) => result,
            Err(err) => {
                session.attempt_mut().fail_submission()?;
                return Err(err.into());
            }
        };

        let now = self.clock.now();
        let attempt = session.attempt_mut();
        let report = reconcile(attempt.items(), attempt.answers(), &result, &self.points);
        let snapshot = ResolvedSnapshot {
            result,
            report: report.clone(),
            answers: attempt.answers().clone(),
            elapsed_seconds: attempt.elapsed_seconds(now),
            finished_at: now,
        };
        attempt.complete_submission(report)?;

        if let Err(err) = self.repository.save_resolved(&snapshot).await {
            warn!(error = %err, "resolved attempt could not be persisted");
            return Err(err.into());
        }
        self.repository.clear_pending().await?;

        Ok(FinishOutcome::Submitted(snapshot))
    }

    /// Load the last graded attempt for the review surface.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) when no attempt has been
    /// graded yet.
    pub async fn load_review(&self) -> Result<ResolvedSnapshot, SessionError> {
        Ok(self
            .repository
            .load_resolved()
            .await?
            .ok_or(StorageError::NotFound)?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
