use std::time::Instant;

use tracing::{debug, instrument, trace};

use crate::actions::ActionResults;
use crate::debug::debug_sink;
use crate::evaluate::{evaluate, evaluate_observed};
use crate::trace::{ActionEvent, ConditionEvent, Tee, Tracer};
use crate::{Actions, Result, Rule, RunReport, Variables};

/// Run every rule in order against one pair of bound hosts.
///
/// A rule whose conditions hold has all of its actions invoked in order.
/// With `stop_on_first_trigger`, no rule after the first triggered one is
/// evaluated. Debug output follows [`enable_debug`](crate::enable_debug).
///
/// Returns whether any rule triggered.
///
/// # Errors
///
/// The first error from any condition or action aborts the run and is
/// returned as is. Actions already invoked are not undone.
pub fn run_all<R, V, A>(
    rules: &R,
    variables: &V,
    actions: &mut A,
    stop_on_first_trigger: bool,
) -> Result<bool>
where
    R: AsRef<[Rule]> + ?Sized,
    V: Variables,
    A: Actions,
{
    let report = Runner::new()
        .stop_on_first_trigger(stop_on_first_trigger)
        .run(rules, variables, actions)?;
    Ok(report.triggered_any())
}

/// Configurable rule run.
///
/// # Example
///
/// ```no_run
/// # use rulebook::{Actions, Result, Rule, RunReport, Runner, TraceLog, Variables};
/// # fn demo<V: Variables, A: Actions>(rules: &[Rule], vars: &V, acts: &mut A) -> Result<RunReport> {
/// let mut log = TraceLog::new();
/// let report = Runner::new()
///     .stop_on_first_trigger(true)
///     .tracer(&mut log)
///     .run(rules, vars, acts)?;
/// # Ok(report)
/// # }
/// ```
#[derive(Default)]
#[must_use]
pub struct Runner<'a> {
    stop_on_first_trigger: bool,
    debug: Option<bool>,
    tracer: Option<&'a mut dyn Tracer>,
    results: Option<&'a mut ActionResults>,
}

impl<'a> Runner<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_on_first_trigger(mut self, stop: bool) -> Self {
        self.stop_on_first_trigger = stop;
        self
    }

    /// Print debug lines to stdout for this run, regardless of
    /// [`enable_debug`](crate::enable_debug).
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    /// Receive a structured event per evaluated node and per action.
    pub fn tracer(mut self, tracer: &'a mut dyn Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Accumulator handed to every action invoked in this run.
    pub fn results(mut self, results: &'a mut ActionResults) -> Self {
        self.results = Some(results);
        self
    }

    /// # Errors
    ///
    /// See [`run_all`].
    #[instrument(level = "debug", skip_all, fields(rules = rules.as_ref().len()))]
    pub fn run<R, V, A>(self, rules: &R, variables: &V, actions: &mut A) -> Result<RunReport>
    where
        R: AsRef<[Rule]> + ?Sized,
        V: Variables,
        A: Actions,
    {
        let started = Instant::now();
        let Runner {
            stop_on_first_trigger,
            debug,
            tracer,
            mut results,
        } = self;

        let mut stdout = debug_sink(debug);
        let mut tee;
        let mut tracer: Option<&mut dyn Tracer> = match (tracer, stdout.as_mut()) {
            (Some(user), Some(stdout)) => {
                tee = Tee {
                    first: stdout,
                    second: user,
                };
                Some(&mut tee)
            }
            (Some(user), None) => Some(user),
            (None, Some(stdout)) => Some(stdout),
            (None, None) => None,
        };

        let mut evaluated = Vec::new();
        let mut triggered = Vec::new();
        let mut invoked = 0;

        for (index, rule) in rules.as_ref().iter().enumerate() {
            evaluated.push(index);
            let held = match tracer.as_deref_mut() {
                Some(tracer) => {
                    evaluate_observed(&rule.conditions, variables, &mut |node, result| {
                        tracer.condition(&ConditionEvent {
                            rule_index: index,
                            node: node.summary(),
                            result,
                        });
                    })?
                }
                None => evaluate(&rule.conditions, variables)?,
            };
            trace!(rule = index, held, "evaluated rule");
            if !held {
                continue;
            }

            triggered.push(index);
            debug!(rule = index, actions = rule.actions.len(), "rule triggered");
            for invocation in &rule.actions {
                let (descriptor, params) = A::registry().prepare(invocation)?;
                if let Some(tracer) = tracer.as_deref_mut() {
                    tracer.action(&ActionEvent {
                        rule_index: index,
                        action: invocation.name.clone(),
                        params: params.clone(),
                    });
                }
                descriptor.call(actions, &params, results.as_deref_mut())?;
                invoked += 1;
            }

            if stop_on_first_trigger {
                debug!(rule = index, "stopping after first trigger");
                break;
            }
        }

        Ok(RunReport::new(evaluated, triggered, invoked, started.elapsed()))
    }
}
