/*!

Suspend and resume are fixed sequences of steps. Each step is classified up front as either
[`Policy::Required`] or [`Policy::BestEffort`] in a static table, and [`Steps`] runs them
uniformly: a best-effort failure is logged and the sequence continues, a required failure stops
the sequence and is returned.

!*/

use crate::error::{LifecycleError, LifecycleResult, Residue};
use log::{info, warn};
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;

/// What happens when a step fails.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Policy {
    /// The failure stops the sequence and is returned to the caller.
    Required,
    /// The failure is logged and the sequence continues.
    BestEffort,
}

/// A step of a sequence. `Display` is the title logged when the step starts.
pub trait Phase: Copy + Debug + Display + Eq + Send + Sync + 'static {
    /// `true` if the step can change the cluster.
    fn mutating(&self) -> bool;
}

/// Looks up the policy of `phase`. A phase missing from the table is treated as required.
pub fn policy_of<P: Phase>(table: &[(P, Policy)], phase: P) -> Policy {
    table
        .iter()
        .find(|(p, _)| *p == phase)
        .map(|(_, policy)| *policy)
        .unwrap_or(Policy::Required)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Done,
    /// A best-effort step failed and was skipped, with the reason.
    Skipped(String),
    /// A required step failed, with the reason.
    Failed(String),
}

/// The outcome of every step that ran, in order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report<P> {
    entries: Vec<(P, Outcome)>,
}

impl<P: Phase> Report<P> {
    pub fn entries(&self) -> &[(P, Outcome)] {
        &self.entries
    }

    pub fn outcome(&self, phase: P) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, outcome)| outcome)
    }

    /// The best-effort steps that failed.
    pub fn skipped(&self) -> impl Iterator<Item = (P, &str)> {
        self.entries.iter().filter_map(|(phase, outcome)| match outcome {
            Outcome::Skipped(reason) => Some((*phase, reason.as_str())),
            _ => None,
        })
    }
}

impl<P: Phase> Display for Report<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (phase, outcome) in &self.entries {
            match outcome {
                Outcome::Done => writeln!(f, "  [done]    {}", phase)?,
                Outcome::Skipped(reason) => writeln!(f, "  [skipped] {}: {}", phase, reason)?,
                Outcome::Failed(reason) => writeln!(f, "  [failed]  {}: {}", phase, reason)?,
            }
        }
        Ok(())
    }
}

/// Runs the steps of a sequence against its policy table and records their outcomes.
pub struct Steps<P: 'static> {
    policies: &'static [(P, Policy)],
    report: Report<P>,
    mutated: bool,
}

impl<P: Phase> Steps<P> {
    pub fn new(policies: &'static [(P, Policy)]) -> Self {
        Self {
            policies,
            report: Report {
                entries: Vec::new(),
            },
            mutated: false,
        }
    }

    /// Runs `step` as `phase`. Returns `Ok(None)` if a best-effort step failed.
    pub async fn run<T, F>(&mut self, phase: P, step: F) -> LifecycleResult<Option<T>>
    where
        F: Future<Output = LifecycleResult<T>>,
    {
        info!("{}", phase);
        match step.await {
            Ok(value) => {
                self.mutated |= phase.mutating();
                self.report.entries.push((phase, Outcome::Done));
                Ok(Some(value))
            }
            Err(e) => match policy_of(self.policies, phase) {
                Policy::BestEffort => {
                    warn!("{} failed, continuing: {}", phase, e);
                    self.mutated |= phase.mutating();
                    self.report
                        .entries
                        .push((phase, Outcome::Skipped(e.to_string())));
                    Ok(None)
                }
                Policy::Required => {
                    self.report
                        .entries
                        .push((phase, Outcome::Failed(e.to_string())));
                    Err(self.classify(phase, e))
                }
            },
        }
    }

    /// Runs a step that the table marks as required and returns its value.
    pub async fn run_required<T, F>(&mut self, phase: P, step: F) -> LifecycleResult<T>
    where
        F: Future<Output = LifecycleResult<T>>,
    {
        debug_assert_eq!(policy_of(self.policies, phase), Policy::Required);
        match self.run(phase, step).await? {
            Some(value) => Ok(value),
            None => Err(LifecycleError::new_with_context(
                Residue::Unknown,
                format!("Required step '{}' did not complete", phase),
            )),
        }
    }

    /// Whether any mutating step has run.
    pub fn mutated(&self) -> bool {
        self.mutated
    }

    pub fn finish(self) -> Report<P> {
        self.report
    }

    // Nothing can have changed if no mutating step has run, and something has changed if one has
    // completed. Otherwise the failing step itself knows best.
    fn classify(&self, phase: P, e: LifecycleError) -> LifecycleError {
        if self.mutated {
            e.with_residue(Residue::Partial)
        } else if !phase.mutating() {
            e.with_residue(Residue::Untouched)
        } else {
            e
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    enum TestPhase {
        Read,
        Write,
        Optional,
        Last,
    }

    impl Display for TestPhase {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            Debug::fmt(self, f)
        }
    }

    impl Phase for TestPhase {
        fn mutating(&self) -> bool {
            !matches!(self, TestPhase::Read)
        }
    }

    const POLICY: &[(TestPhase, Policy)] = &[
        (TestPhase::Read, Policy::Required),
        (TestPhase::Write, Policy::Required),
        (TestPhase::Optional, Policy::BestEffort),
    ];

    fn fail<T>() -> LifecycleResult<T> {
        Err(LifecycleError::new_with_context(Residue::Unknown, "boom"))
    }

    #[tokio::test]
    async fn best_effort_failures_continue() {
        let mut steps = Steps::new(POLICY);
        assert_eq!(steps.run(TestPhase::Read, async { Ok(1) }).await.unwrap(), Some(1));
        assert_eq!(
            steps.run(TestPhase::Optional, async { fail::<()>() }).await.unwrap(),
            None
        );
        let report = steps.finish();
        assert_eq!(report.outcome(TestPhase::Read), Some(&Outcome::Done));
        assert_eq!(
            report.skipped().collect::<Vec<_>>(),
            vec![(TestPhase::Optional, "boom")]
        );
    }

    #[tokio::test]
    async fn residue_of_required_failures() {
        let mut steps = Steps::new(POLICY);
        let e = steps.run(TestPhase::Read, async { fail::<()>() }).await.unwrap_err();
        assert_eq!(e.residue(), Residue::Untouched);

        let mut steps = Steps::new(POLICY);
        let e = steps.run(TestPhase::Write, async { fail::<()>() }).await.unwrap_err();
        assert_eq!(e.residue(), Residue::Unknown);

        let mut steps = Steps::new(POLICY);
        steps.run(TestPhase::Write, async { Ok(()) }).await.unwrap();
        assert!(steps.mutated());
        let e = steps.run(TestPhase::Read, async { fail::<()>() }).await.unwrap_err();
        assert_eq!(e.residue(), Residue::Partial);
        assert_eq!(
            steps.finish().outcome(TestPhase::Read),
            Some(&Outcome::Failed("boom".into()))
        );
    }

    #[test]
    fn unlisted_phases_are_required() {
        assert_eq!(policy_of(POLICY, TestPhase::Last), Policy::Required);
        assert_eq!(policy_of(POLICY, TestPhase::Optional), Policy::BestEffort);
    }
}
