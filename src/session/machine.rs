use statig::blocking::IntoStateMachineExt as _;
use statig::prelude::*;

use super::SessionPhase;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SessionEvent {
    EnableRequested,
    Mounted { retries: u8 },
    MountFailed,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SessionApplyStatus {
    Applied,
    Unchanged,
    InvalidTransition,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct SessionMachine {
    phase: SessionPhase,
    retries: Option<u8>,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct DispatchContext {
    status: SessionApplyStatus,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            status: SessionApplyStatus::Unchanged,
        }
    }
}

impl SessionMachine {
    fn enter(&mut self, context: &mut DispatchContext, phase: SessionPhase) {
        self.phase = phase;
        context.status = SessionApplyStatus::Applied;
    }
}

#[state_machine(initial = "State::disabled()")]
impl SessionMachine {
    #[state]
    fn disabled(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::EnableRequested => {
                self.enter(context, SessionPhase::Enabling);
                Transition(State::enabling())
            }
            SessionEvent::Disabled => Handled,
            _ => {
                context.status = SessionApplyStatus::InvalidTransition;
                Handled
            }
        }
    }

    #[state]
    fn enabling(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Mounted { retries } => {
                self.retries = Some(*retries);
                self.enter(context, SessionPhase::Enabled);
                Transition(State::enabled())
            }
            SessionEvent::MountFailed => {
                self.retries = None;
                self.enter(context, SessionPhase::Failed);
                Transition(State::failed())
            }
            SessionEvent::Disabled => {
                self.enter(context, SessionPhase::Disabled);
                Transition(State::disabled())
            }
            SessionEvent::EnableRequested => Handled,
        }
    }

    #[state]
    fn enabled(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::EnableRequested => {
                self.enter(context, SessionPhase::Enabling);
                Transition(State::enabling())
            }
            SessionEvent::Disabled => {
                self.enter(context, SessionPhase::Disabled);
                Transition(State::disabled())
            }
            _ => {
                context.status = SessionApplyStatus::InvalidTransition;
                Handled
            }
        }
    }

    #[state]
    fn failed(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::EnableRequested => {
                self.enter(context, SessionPhase::Enabling);
                Transition(State::enabling())
            }
            SessionEvent::Disabled => {
                self.enter(context, SessionPhase::Disabled);
                Transition(State::disabled())
            }
            _ => {
                context.status = SessionApplyStatus::InvalidTransition;
                Handled
            }
        }
    }
}

pub(super) struct SessionEngine {
    machine: statig::blocking::StateMachine<SessionMachine>,
}

impl SessionEngine {
    pub(super) fn new() -> Self {
        Self {
            machine: SessionMachine {
                phase: SessionPhase::Disabled,
                retries: None,
            }
            .state_machine(),
        }
    }

    pub(super) fn phase(&self) -> SessionPhase {
        self.machine.inner().phase
    }

    /// Retries used by the last successful mount; cleared by a failed one.
    pub(super) fn retries(&self) -> Option<u8> {
        self.machine.inner().retries
    }

    pub(super) fn apply(&mut self, event: SessionEvent) -> SessionApplyStatus {
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        context.status
    }
}
