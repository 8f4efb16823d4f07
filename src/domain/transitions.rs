//! Transition table
//!
//! Transitions are indexed by (state, event). A pair may hold one unguarded
//! transition, or any number of guarded ones evaluated in registration order.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use crate::errors::{PhaseflowError, Result};
use crate::schemas::{Event, ProjectState, State};

use super::guards::Guard;

type ActionFn = dyn Fn(&mut ProjectState) -> Result<()> + Send + Sync;

/// A side effect run when a transition leaves or enters a state
#[derive(Clone)]
pub struct Action {
    description: String,
    run: Arc<ActionFn>,
}

impl Action {
    pub fn new<F>(description: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut ProjectState) -> Result<()> + Send + Sync + 'static,
    {
        Action {
            description: description.into(),
            run: Arc::new(run),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn run(&self, project: &mut ProjectState) -> Result<()> {
        (self.run)(project)
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// One edge of the workflow graph
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: State,
    pub event: Event,
    pub to: State,
    pub guard: Option<Guard>,
    pub on_entry: Option<Action>,
    pub on_exit: Option<Action>,
}

impl Transition {
    pub fn new(from: impl Into<State>, event: impl Into<Event>, to: impl Into<State>) -> Self {
        Transition {
            from: from.into(),
            event: event.into(),
            to: to.into(),
            guard: None,
            on_entry: None,
            on_exit: None,
        }
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn on_entry(mut self, action: Action) -> Self {
        self.on_entry = Some(action);
        self
    }

    pub fn on_exit(mut self, action: Action) -> Self {
        self.on_exit = Some(action);
        self
    }
}

/// Outcome of looking up a transition for the current record
#[derive(Debug)]
pub enum Selection<'a> {
    /// The event has no transition from this state
    Unregistered,
    /// Transitions exist but every guard failed; holds the failure reasons
    Blocked(Vec<String>),
    /// The transition to take
    Eligible(&'a Transition),
}

/// Immutable index of transitions keyed by (state, event)
#[derive(Debug, Default)]
pub struct TransitionTable {
    index: HashMap<(State, Event), Vec<Transition>>,
    states: BTreeSet<State>,
}

impl TransitionTable {
    /// Index the transitions, rejecting ambiguous unguarded pairs.
    pub fn new(transitions: Vec<Transition>) -> Result<Self> {
        let mut table = TransitionTable::default();

        for transition in transitions {
            table.states.insert(transition.from.clone());
            table.states.insert(transition.to.clone());

            let key = (transition.from.clone(), transition.event.clone());
            let existing = table.index.entry(key).or_default();

            let unguarded_exists = existing.iter().any(|t| t.guard.is_none());
            if transition.guard.is_none() && !existing.is_empty() {
                return Err(PhaseflowError::Validation(format!(
                    "unguarded transition {} --{}--> {} overlaps an existing transition for the same state and event",
                    transition.from, transition.event, transition.to
                )));
            }
            if unguarded_exists {
                return Err(PhaseflowError::Validation(format!(
                    "guarded transition {} --{}--> {} shadowed by an unguarded transition",
                    transition.from, transition.event, transition.to
                )));
            }
            existing.push(transition);
        }

        Ok(table)
    }

    /// All states named by any transition
    pub fn states(&self) -> &BTreeSet<State> {
        &self.states
    }

    pub fn contains_state(&self, state: &State) -> bool {
        self.states.contains(state)
    }

    /// Transitions registered for (state, event), in registration order
    pub fn lookup(&self, state: &State, event: &Event) -> &[Transition] {
        self.index
            .get(&(state.clone(), event.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Events that have at least one transition out of `state`, sorted
    pub fn events_from(&self, state: &State) -> Vec<&Event> {
        let mut events: Vec<&Event> = self
            .index
            .keys()
            .filter(|(from, _)| from == state)
            .map(|(_, event)| event)
            .collect();
        events.sort();
        events
    }

    /// Pick the transition `event` would take from `state`.
    ///
    /// When more than one guard passes, the first registered transition wins.
    pub fn select(&self, state: &State, event: &Event, project: &ProjectState) -> Selection<'_> {
        let candidates = self.lookup(state, event);
        if candidates.is_empty() {
            return Selection::Unregistered;
        }

        let mut chosen: Option<&Transition> = None;
        let mut reasons = Vec::new();
        for transition in candidates {
            let result = match &transition.guard {
                None => {
                    return Selection::Eligible(transition);
                }
                Some(guard) => guard.evaluate(project),
            };
            tracing::debug!(
                state = %state,
                event = %event,
                target = %transition.to,
                valid = result.valid,
                "evaluated guard"
            );

            if result.valid {
                match chosen {
                    None => chosen = Some(transition),
                    Some(first) => {
                        tracing::warn!(
                            state = %state,
                            event = %event,
                            taken = %first.to,
                            ignored = %transition.to,
                            "multiple guards satisfied; taking the first registered transition"
                        );
                    }
                }
            } else if let Some(reason) = result.reason {
                reasons.push(reason);
            }
        }

        match chosen {
            Some(transition) => Selection::Eligible(transition),
            None => Selection::Blocked(reasons),
        }
    }

    /// States that cannot be reached from `initial` by any transition
    pub fn unreachable_from(&self, initial: &State) -> Vec<State> {
        let mut seen: BTreeSet<&State> = BTreeSet::new();
        let mut queue: VecDeque<&State> = VecDeque::new();
        seen.insert(initial);
        queue.push_back(initial);

        while let Some(state) = queue.pop_front() {
            for ((from, _), transitions) in &self.index {
                if from != state {
                    continue;
                }
                for transition in transitions {
                    if seen.insert(&transition.to) {
                        queue.push_back(&transition.to);
                    }
                }
            }
        }

        self.states
            .iter()
            .filter(|s| !seen.contains(s))
            .cloned()
            .collect()
    }
}
