//! Walks a [`SweepPlan`] on real (or stub) hardware.
//!
//! A [`SweepRunner`] is an iterator of [`StepReport`]s: each call to `next`
//! measures exactly one setpoint. Whatever way the sweep ends (exhausted,
//! failed, or dropped half-way) the strip is blanked and released exactly
//! once before control goes back to the caller.

use crate::dataset::ObservationSink;
use crate::device::LedStrip;
use crate::error::{Error, Result};
use crate::instrument::PowerSupply;
use crate::measurement::{MeasurementStep, Observation};
use crate::plan::{Setpoint, SetpointIter, SweepPlan};
use crate::progress::ProgressTracker;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// One finished step, with everything a progress display shows for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// 1-based position of this step in the sweep.
    pub index: usize,
    pub total: usize,
    pub setpoint: Setpoint,
    pub observation: Observation,
    pub percent_complete: f64,
    pub eta: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub steps: usize,
    pub elapsed: Duration,
}

/// Consumes step reports for display. Rendering is entirely up to the
/// implementor; `()` discards everything.
pub trait ProgressDisplay {
    fn step(&mut self, report: &StepReport);

    fn finish(&mut self, _summary: &SweepSummary) {}
}

impl ProgressDisplay for () {
    fn step(&mut self, _report: &StepReport) {}
}

pub struct SweepRunner<'a, P: PowerSupply + ?Sized, L: LedStrip + ?Sized> {
    setpoints: SetpointIter<'a>,
    step: MeasurementStep,
    supply: &'a mut P,
    strip: &'a mut L,
    progress: ProgressTracker,
    state: RunState,
}

impl<'a, P: PowerSupply + ?Sized, L: LedStrip + ?Sized> SweepRunner<'a, P, L> {
    pub fn new(
        plan: &'a SweepPlan,
        step: MeasurementStep,
        supply: &'a mut P,
        strip: &'a mut L,
    ) -> Self {
        Self {
            setpoints: plan.produce(),
            step,
            supply,
            strip,
            progress: ProgressTracker::start(plan.total_count()),
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Run the whole sweep, writing every observation to `sink` and
    /// reporting every step to `display`.
    pub fn run<S, D>(mut self, sink: &mut S, display: &mut D) -> Result<SweepSummary>
    where
        S: ObservationSink + ?Sized,
        D: ProgressDisplay + ?Sized,
    {
        sink.write_header()?;

        while let Some(report) = self.next() {
            let report = report?;
            if let Err(e) = sink.write_observation(&report.observation) {
                return Err(self.fail(e.into()));
            }
            display.step(&report);
        }

        let summary = SweepSummary {
            steps: self.progress.index(),
            elapsed: self.progress.elapsed(),
        };
        log::info!(
            "Sweep finished: {} steps in {:.1} s",
            summary.steps,
            summary.elapsed.as_secs_f64()
        );
        display.finish(&summary);
        Ok(summary)
    }

    fn shutdown(&mut self) -> Result<()> {
        log::debug!("Blanking and releasing LED strip");
        let blanked = self.strip.blank();
        let released = self.strip.release();
        blanked?;
        released?;
        Ok(())
    }

    /// Clean up after `error` and hand it back untouched.
    fn fail(&mut self, error: Error) -> Error {
        self.state = RunState::Failed;
        log::error!("Sweep aborted at step {}: {}", self.progress.index() + 1, error);
        if let Err(cleanup) = self.shutdown() {
            log::warn!("Cleanup after failed sweep also failed: {}", cleanup);
        }
        error
    }

    fn complete(&mut self) -> Option<Result<StepReport>> {
        match self.shutdown() {
            Ok(()) => {
                self.state = RunState::Completed;
                None
            }
            Err(e) => {
                self.state = RunState::Failed;
                Some(Err(e))
            }
        }
    }
}

impl<P: PowerSupply + ?Sized, L: LedStrip + ?Sized> Iterator for SweepRunner<'_, P, L> {
    type Item = Result<StepReport>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            RunState::Completed | RunState::Failed => return None,
            RunState::Idle => {
                log::info!("Starting sweep of {} setpoints", self.progress.total());
                self.progress = ProgressTracker::start(self.progress.total());
                self.state = RunState::Running;
            }
            RunState::Running => {}
        }

        let Some(setpoint) = self.setpoints.next() else {
            return self.complete();
        };

        match self
            .step
            .measure(&mut *self.supply, &mut *self.strip, &setpoint)
        {
            Ok(observation) => {
                self.progress.advance();
                Some(Ok(StepReport {
                    index: self.progress.index(),
                    total: self.progress.total(),
                    setpoint,
                    observation,
                    percent_complete: self.progress.percent_complete(),
                    eta: self.progress.estimated_time_remaining(),
                }))
            }
            Err(e) => Some(Err(self.fail(e))),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            RunState::Completed | RunState::Failed => (0, Some(0)),
            _ => (0, Some(self.setpoints.len())),
        }
    }
}

impl<P: PowerSupply + ?Sized, L: LedStrip + ?Sized> Drop for SweepRunner<'_, P, L> {
    fn drop(&mut self) {
        if self.state == RunState::Running {
            log::warn!(
                "Sweep dropped after {} of {} steps",
                self.progress.index(),
                self.progress.total()
            );
            self.state = RunState::Failed;
            if let Err(e) = self.shutdown() {
                log::warn!("Cleanup of abandoned sweep failed: {}", e);
            }
        }
    }
}
