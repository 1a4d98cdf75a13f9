//! Observing a run.
//!
//! A [`Tracer`] receives one [`ConditionEvent`] per condition node the
//! evaluator actually visited and one [`ActionEvent`] per action invocation.
//! Tracers only observe; they cannot change results or ordering.

use std::io::{self, Write};

use serde::Serialize;

use crate::actions::Params;

/// A condition node finished evaluating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionEvent {
    pub rule_index: usize,
    /// The node alone: a leaf's `name operator value`, or `all of N`,
    /// `any of N`, `not` for composites.
    pub node: String,
    pub result: bool,
}

/// An action is about to run with these coerced parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionEvent {
    pub rule_index: usize,
    pub action: String,
    pub params: Params,
}

pub trait Tracer {
    fn condition(&mut self, event: &ConditionEvent);
    fn action(&mut self, event: &ActionEvent);
}

/// Human-readable tracer used for debug output.
///
/// Writes one line per event:
///
/// ```text
/// rule 0: current_inventory greater_than 20 => true
/// rule 0: action put_on_sale {"sale_percentage":0.25}
/// ```
///
/// Write failures are ignored.
#[derive(Debug)]
pub struct DebugTracer<W: Write = io::Stdout> {
    out: W,
}

impl DebugTracer<io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for DebugTracer<io::Stdout> {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> DebugTracer<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Tracer for DebugTracer<W> {
    fn condition(&mut self, event: &ConditionEvent) {
        let _ = writeln!(
            self.out,
            "rule {}: {} => {}",
            event.rule_index, event.node, event.result
        );
    }

    fn action(&mut self, event: &ActionEvent) {
        let params = serde_json::to_string(&event.params).unwrap_or_default();
        let _ = writeln!(
            self.out,
            "rule {}: action {} {params}",
            event.rule_index, event.action
        );
    }
}

/// One recorded event, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    Condition(ConditionEvent),
    Action(ActionEvent),
}

/// Tracer that keeps every event in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
}

impl TraceLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn conditions(&self) -> impl Iterator<Item = &ConditionEvent> {
        self.events.iter().filter_map(|e| match e {
            TraceEvent::Condition(c) => Some(c),
            TraceEvent::Action(_) => None,
        })
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionEvent> {
        self.events.iter().filter_map(|e| match e {
            TraceEvent::Action(a) => Some(a),
            TraceEvent::Condition(_) => None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Tracer for TraceLog {
    fn condition(&mut self, event: &ConditionEvent) {
        self.events.push(TraceEvent::Condition(event.clone()));
    }

    fn action(&mut self, event: &ActionEvent) {
        self.events.push(TraceEvent::Action(event.clone()));
    }
}

/// Forward every event to two tracers.
pub(crate) struct Tee<'a> {
    pub(crate) first: &'a mut dyn Tracer,
    pub(crate) second: &'a mut dyn Tracer,
}

impl Tracer for Tee<'_> {
    fn condition(&mut self, event: &ConditionEvent) {
        self.first.condition(event);
        self.second.condition(event);
    }

    fn action(&mut self, event: &ActionEvent) {
        self.first.action(event);
        self.second.action(event);
    }
}
