//! Puzzle Orchestrator: bounded retry loop with verifier-attributed feedback.
//!
//! Flow per attempt: classify → select strategy → solve → verify.
//! A failed verification blames one stage; only that stage sees the feedback on
//! the next attempt. After the loop (success or exhaustion) the explainer always
//! runs on the last complete attempt, so a result is returned even when the
//! solution never verified.

use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::puzzle::models::{
    Classification, ExplanationSummary, Feedback, FinalResult, IssueSource, Solution, Stage,
    Strategy, Verification,
};
use crate::puzzle::stages::PuzzleStages;

/// What to do when a stage call itself fails (malformed structured output, API error).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StageFailurePolicy {
    /// Propagate the error and abort the run.
    #[default]
    Abort,
    /// Count the attempt as a failed verification blamed on the solver.
    RetryAsSolverIssue,
}

#[derive(Debug, Error)]
#[error("unknown stage failure policy '{0}' (expected 'abort' or 'retry')")]
pub struct UnknownPolicy(String);

impl FromStr for StageFailurePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(StageFailurePolicy::Abort),
            "retry" | "retry_as_solver_issue" => Ok(StageFailurePolicy::RetryAsSolverIssue),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// One complete classify → strategy → solve → verify pass.
#[derive(Debug, Clone)]
struct Attempt {
    classification: Classification,
    strategy: Strategy,
    solution: Solution,
    verification: Verification,
}

pub struct PuzzleOrchestrator<'a> {
    stages: &'a dyn PuzzleStages,
    max_retries: u32,
    policy: StageFailurePolicy,
}

impl<'a> PuzzleOrchestrator<'a> {
    pub fn new(stages: &'a dyn PuzzleStages, max_retries: u32, policy: StageFailurePolicy) -> Self {
        Self {
            stages,
            max_retries,
            policy,
        }
    }

    /// Solves `puzzle`, retrying up to `max_retries` attempts (at least one).
    pub async fn solve(&self, puzzle: &str) -> Result<FinalResult, AppError> {
        let max_attempts = self.max_retries.max(1);
        let mut feedback = Feedback::default();
        let mut last_attempt: Option<Attempt> = None;
        let mut last_error: Option<AppError> = None;
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            attempts = attempt;
            info!("Puzzle attempt {attempt}/{max_attempts}");

            match self.run_attempt(puzzle, &feedback).await {
                Ok(outcome) => {
                    feedback = Feedback::from_verification(&outcome.verification);
                    let passed = outcome.verification.is_valid;
                    last_attempt = Some(outcome);

                    if passed {
                        info!("Verification PASSED on attempt {attempt}");
                        break;
                    }
                    warn!(
                        "Verification FAILED on attempt {attempt}: {}",
                        feedback.text
                    );
                }
                Err(err) => match self.policy {
                    StageFailurePolicy::Abort => return Err(err),
                    StageFailurePolicy::RetryAsSolverIssue => {
                        warn!(
                            "Stage failure on attempt {attempt}, retrying as solver issue: {err}"
                        );
                        feedback = Feedback::from_verification(&stage_failure_verification(&err));
                        last_error = Some(err);
                    }
                },
            }
        }

        let Some(outcome) = last_attempt else {
            return Err(last_error.unwrap_or_else(|| {
                AppError::Internal(anyhow::anyhow!("puzzle run finished without an attempt"))
            }));
        };

        info!("Building explanation");
        let explanation = self
            .stages
            .explain(puzzle, &outcome.solution, &outcome.verification)
            .await?;

        let answer = if explanation.final_answer.trim().is_empty() {
            outcome.solution.answer.clone()
        } else {
            explanation.final_answer
        };

        Ok(FinalResult {
            puzzle_type: outcome.classification.puzzle_type,
            difficulty: outcome.classification.difficulty,
            strategy: outcome.strategy.description,
            answer,
            explanation: ExplanationSummary {
                assumptions: explanation.assumptions,
                deductions: explanation.deductions,
                verification: explanation.verification,
            },
            verified: outcome.verification.is_valid,
            attempts,
        })
    }

    async fn run_attempt(&self, puzzle: &str, feedback: &Feedback) -> Result<Attempt, AppError> {
        let classification = self
            .stages
            .classify(puzzle, feedback.routed_to(Stage::Classifier))
            .await?;
        info!(
            "Classified: type={}, difficulty={}",
            classification.puzzle_type, classification.difficulty
        );

        let strategy = self
            .stages
            .select_strategy(puzzle, &classification, feedback.routed_to(Stage::Strategy))
            .await?;
        info!("Strategy: {}", strategy.description);

        let solution = self
            .stages
            .solve(puzzle, &strategy, feedback.routed_to(Stage::Solver))
            .await?;
        info!("Answer: {}", solution.answer);

        let verification = self
            .stages
            .verify(puzzle, &classification, &strategy, &solution, &feedback.text)
            .await?;

        Ok(Attempt {
            classification,
            strategy,
            solution,
            verification,
        })
    }
}

fn stage_failure_verification(err: &AppError) -> Verification {
    Verification {
        is_valid: false,
        issue_source: IssueSource::Solver,
        issue_details: err.to_string(),
        suggestion: "Respond with output that matches the required JSON schema".to_string(),
        verification_summary: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::puzzle::models::Explanation;

    #[derive(Default)]
    struct Calls {
        classifier: Vec<String>,
        strategy: Vec<String>,
        solver: Vec<String>,
        verifier: Vec<String>,
        explained: Vec<String>,
    }

    /// Scripted stages: verdicts are popped per verify call (valid once exhausted).
    #[derive(Default)]
    struct ScriptedStages {
        verdicts: Mutex<VecDeque<Verification>>,
        failing_solver_calls: HashSet<usize>,
        classifier_always_fails: bool,
        explained_answer: String,
        calls: Mutex<Calls>,
    }

    impl ScriptedStages {
        fn with_verdicts(verdicts: Vec<Verification>) -> Self {
            Self {
                verdicts: Mutex::new(verdicts.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PuzzleStages for ScriptedStages {
        async fn classify(
            &self,
            _puzzle: &str,
            feedback: &str,
        ) -> Result<Classification, AppError> {
            self.calls.lock().unwrap().classifier.push(feedback.to_string());
            if self.classifier_always_fails {
                return Err(AppError::Llm("classifier stage failed: malformed".to_string()));
            }
            Ok(Classification {
                puzzle_type: "constraint_satisfaction".to_string(),
                difficulty: "hard".to_string(),
            })
        }

        async fn select_strategy(
            &self,
            _puzzle: &str,
            _classification: &Classification,
            feedback: &str,
        ) -> Result<Strategy, AppError> {
            self.calls.lock().unwrap().strategy.push(feedback.to_string());
            Ok(Strategy {
                description: "grid elimination".to_string(),
            })
        }

        async fn solve(
            &self,
            _puzzle: &str,
            _strategy: &Strategy,
            feedback: &str,
        ) -> Result<Solution, AppError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.solver.push(feedback.to_string());
                calls.solver.len()
            };
            if self.failing_solver_calls.contains(&call) {
                return Err(AppError::Llm("solver stage failed: malformed".to_string()));
            }
            Ok(Solution {
                answer: format!("answer-{call}"),
                constraints: vec!["clue 1".to_string()],
            })
        }

        async fn verify(
            &self,
            _puzzle: &str,
            _classification: &Classification,
            _strategy: &Strategy,
            _solution: &Solution,
            previous_feedback: &str,
        ) -> Result<Verification, AppError> {
            self.calls
                .lock()
                .unwrap()
                .verifier
                .push(previous_feedback.to_string());
            Ok(self
                .verdicts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(valid))
        }

        async fn explain(
            &self,
            _puzzle: &str,
            solution: &Solution,
            _verification: &Verification,
        ) -> Result<Explanation, AppError> {
            self.calls
                .lock()
                .unwrap()
                .explained
                .push(solution.answer.clone());
            Ok(Explanation {
                final_answer: self.explained_answer.clone(),
                assumptions: vec!["houses numbered left to right".to_string()],
                deductions: vec!["clue 8 fixes house 1".to_string()],
                verification: "all clues hold".to_string(),
            })
        }
    }

    fn valid() -> Verification {
        Verification {
            is_valid: true,
            issue_source: IssueSource::None,
            issue_details: String::new(),
            suggestion: String::new(),
            verification_summary: Some("ok".to_string()),
        }
    }

    fn failed(source: IssueSource) -> Verification {
        Verification {
            is_valid: false,
            issue_source: source,
            issue_details: "clue 4 violated".to_string(),
            suggestion: "re-check".to_string(),
            verification_summary: None,
        }
    }

    #[tokio::test]
    async fn test_solver_blamed_once_then_passes() {
        let stages = ScriptedStages::with_verdicts(vec![failed(IssueSource::Solver), valid()]);
        let orchestrator = PuzzleOrchestrator::new(&stages, 3, StageFailurePolicy::Abort);

        let result = orchestrator.solve("puzzle").await.unwrap();
        let calls = stages.calls.lock().unwrap();

        assert_eq!(calls.solver.len(), 2);
        assert!(calls.solver[0].is_empty());
        assert_eq!(
            calls.solver[1],
            "Issue in solver: clue 4 violated. Suggestion: re-check"
        );
        assert!(calls.classifier.iter().all(|f| f.is_empty()));
        assert!(calls.strategy.iter().all(|f| f.is_empty()));
        assert_eq!(calls.classifier.len(), 2);
        assert_eq!(calls.explained, vec!["answer-2".to_string()]);
        assert!(result.verified);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_still_explains_last_attempt() {
        let stages = ScriptedStages::with_verdicts(vec![
            failed(IssueSource::Solver),
            failed(IssueSource::Solver),
            failed(IssueSource::Solver),
        ]);
        let orchestrator = PuzzleOrchestrator::new(&stages, 3, StageFailurePolicy::Abort);

        let result = orchestrator.solve("puzzle").await.unwrap();
        let calls = stages.calls.lock().unwrap();

        assert_eq!(calls.verifier.len(), 3);
        assert_eq!(calls.explained, vec!["answer-3".to_string()]);
        assert!(!result.verified);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.answer, "answer-3");
    }

    #[tokio::test]
    async fn test_classifier_blame_routes_only_to_classifier() {
        let stages =
            ScriptedStages::with_verdicts(vec![failed(IssueSource::Classifier), valid()]);
        let orchestrator = PuzzleOrchestrator::new(&stages, 3, StageFailurePolicy::Abort);

        orchestrator.solve("puzzle").await.unwrap();
        let calls = stages.calls.lock().unwrap();

        assert!(calls.classifier[1].starts_with("Issue in classifier:"));
        assert!(calls.strategy[1].is_empty());
        assert!(calls.solver[1].is_empty());
    }

    #[tokio::test]
    async fn test_unattributed_failure_routes_to_solver() {
        let stages = ScriptedStages::with_verdicts(vec![failed(IssueSource::None), valid()]);
        let orchestrator = PuzzleOrchestrator::new(&stages, 3, StageFailurePolicy::Abort);

        orchestrator.solve("puzzle").await.unwrap();
        let calls = stages.calls.lock().unwrap();

        assert!(calls.solver[1].starts_with("Issue in solver:"));
        assert!(calls.classifier[1].is_empty());
    }

    #[tokio::test]
    async fn test_verifier_always_receives_last_feedback() {
        let stages = ScriptedStages::with_verdicts(vec![failed(IssueSource::Strategy), valid()]);
        let orchestrator = PuzzleOrchestrator::new(&stages, 3, StageFailurePolicy::Abort);

        orchestrator.solve("puzzle").await.unwrap();
        let calls = stages.calls.lock().unwrap();

        assert!(calls.verifier[0].is_empty());
        assert!(calls.verifier[1].starts_with("Issue in strategy:"));
    }

    #[tokio::test]
    async fn test_stage_failure_aborts_by_default() {
        let stages = ScriptedStages {
            failing_solver_calls: HashSet::from([1]),
            ..Default::default()
        };
        let orchestrator = PuzzleOrchestrator::new(&stages, 3, StageFailurePolicy::Abort);

        let result = orchestrator.solve("puzzle").await;
        assert!(matches!(result, Err(AppError::Llm(_))));
        assert!(stages.calls.lock().unwrap().explained.is_empty());
    }

    #[tokio::test]
    async fn test_stage_failure_retried_as_solver_issue() {
        let stages = ScriptedStages {
            failing_solver_calls: HashSet::from([1]),
            ..Default::default()
        };
        let orchestrator =
            PuzzleOrchestrator::new(&stages, 3, StageFailurePolicy::RetryAsSolverIssue);

        let result = orchestrator.solve("puzzle").await.unwrap();
        let calls = stages.calls.lock().unwrap();

        assert_eq!(calls.solver.len(), 2);
        assert!(calls.solver[1].starts_with("Issue in solver:"));
        assert!(calls.solver[1].contains("malformed"));
        assert!(result.verified);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_retry_policy_without_any_complete_attempt_fails() {
        let stages = ScriptedStages {
            classifier_always_fails: true,
            ..Default::default()
        };
        let orchestrator =
            PuzzleOrchestrator::new(&stages, 2, StageFailurePolicy::RetryAsSolverIssue);

        let result = orchestrator.solve("puzzle").await;
        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(stages.calls.lock().unwrap().classifier.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_runs_one_attempt() {
        let stages = ScriptedStages::with_verdicts(vec![failed(IssueSource::Solver)]);
        let orchestrator = PuzzleOrchestrator::new(&stages, 0, StageFailurePolicy::Abort);

        let result = orchestrator.solve("puzzle").await.unwrap();
        assert_eq!(result.attempts, 1);
        assert_eq!(stages.calls.lock().unwrap().explained.len(), 1);
    }

    #[tokio::test]
    async fn test_explainer_final_answer_takes_precedence() {
        let stages = ScriptedStages {
            explained_answer: "The German owns the fish.".to_string(),
            ..Default::default()
        };
        let orchestrator = PuzzleOrchestrator::new(&stages, 3, StageFailurePolicy::Abort);

        let result = orchestrator.solve("puzzle").await.unwrap();
        assert_eq!(result.answer, "The German owns the fish.");
        assert_eq!(result.strategy, "grid elimination");
        assert_eq!(result.explanation.deductions.len(), 1);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "abort".parse::<StageFailurePolicy>().unwrap(),
            StageFailurePolicy::Abort
        );
        assert_eq!(
            "RETRY".parse::<StageFailurePolicy>().unwrap(),
            StageFailurePolicy::RetryAsSolverIssue
        );
        assert!("sometimes".parse::<StageFailurePolicy>().is_err());
    }
}
