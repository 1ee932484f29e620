//! Workflow services built on the unit of work.
//!
//! `process` only moves an entity one hop, so a pull or delete is driven to
//! completion by repeating `process` rounds until nothing is left in flight.

use crate::config::ServiceConfig;
use crate::error::{BusError, BusResult};
use crate::messages::EntityOutcome;
use linksync_core::{
    CoreError, CoreResult, Identifier, InvalidOperationRequested, LinkGateway, Operation,
    Process, State, StateChanged, UnitOfWork,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Result of driving a process to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Rounds that produced at least one update.
    pub rounds: usize,
    /// Every committed update, in commit order.
    pub updates: Vec<StateChanged>,
}

/// Result of a pull or delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResponse {
    /// The starting operation.
    pub operation: Operation,
    /// The requested identifiers.
    pub requested: BTreeSet<Identifier>,
    /// Every committed update, in commit order.
    pub updates: Vec<StateChanged>,
    /// Rejections of the starting operation.
    pub errors: Vec<InvalidOperationRequested>,
    /// State of each requested identifier once the workflow settled.
    pub final_states: BTreeMap<Identifier, State>,
}

impl ProcessResponse {
    /// Returns how the workflow ended for `identifier`.
    ///
    /// An identifier that changed state completed, even if the starting
    /// operation was rejected because an earlier workflow was still in
    /// flight.
    pub fn outcome(&self, identifier: &Identifier) -> Option<EntityOutcome> {
        let state = *self.final_states.get(identifier)?;
        if self.updates.iter().any(|u| &u.identifier == identifier) {
            return Some(EntityOutcome::Completed(state));
        }
        self.errors
            .iter()
            .find(|e| &e.identifier == identifier)
            .map(|e| EntityOutcome::Rejected(e.state))
    }

    /// Returns the number of requested identifiers.
    pub fn requested_count(&self) -> usize {
        self.requested.len()
    }

    /// Returns the number of requested identifiers that completed in a
    /// settled state.
    pub fn settled_count(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, EntityOutcome::Completed(s) if s.is_settled()))
            .count()
    }

    /// Returns the number of requested identifiers whose workflow was
    /// rejected.
    pub fn rejected_count(&self) -> usize {
        self.outcomes().filter(|o| o.is_rejected()).count()
    }

    fn outcomes(&self) -> impl Iterator<Item = EntityOutcome> + '_ {
        self.requested.iter().filter_map(|id| self.outcome(id))
    }
}

/// Pulls `requested` into the local store.
///
/// Starts a pull for every requested identifier, then drives every
/// requested identifier with a pull in flight (including pulls interrupted
/// earlier) until it settles.
///
/// # Errors
///
/// Returns `PreconditionViolated` if `requested` is empty or names an
/// identifier not present in the source. Gateway failures propagate.
pub fn pull<G>(
    gateway: &G,
    requested: &BTreeSet<Identifier>,
    config: &ServiceConfig,
) -> BusResult<ProcessResponse>
where
    G: LinkGateway + ?Sized,
{
    start_and_complete(gateway, Operation::StartPull, Process::Pull, requested, config)
}

/// Removes `requested` from the local store.
///
/// Mirrors [`pull`] with the delete workflow.
///
/// # Errors
///
/// Same as [`pull`].
pub fn delete<G>(
    gateway: &G,
    requested: &BTreeSet<Identifier>,
    config: &ServiceConfig,
) -> BusResult<ProcessResponse>
where
    G: LinkGateway + ?Sized,
{
    start_and_complete(
        gateway,
        Operation::StartDelete,
        Process::Delete,
        requested,
        config,
    )
}

fn start_and_complete<G>(
    gateway: &G,
    operation: Operation,
    process: Process,
    requested: &BTreeSet<Identifier>,
    config: &ServiceConfig,
) -> BusResult<ProcessResponse>
where
    G: LinkGateway + ?Sized,
{
    let mut uow = UnitOfWork::begin(gateway);
    let in_flight = {
        let mut link = uow.link()?;
        link.apply(operation, requested)?;
        link.process_identifiers(process)
    };
    let started = uow.commit()?;
    info!(
        %operation,
        requested = requested.len(),
        started = started.updates.len(),
        rejected = started.rejections.len(),
        "workflow started"
    );

    let pending: BTreeSet<Identifier> = requested.intersection(&in_flight).cloned().collect();
    let mut updates = started.updates;
    if !pending.is_empty() {
        let completed = process_to_completion(gateway, &pending, process, config)?;
        updates.extend(completed.updates);
    }

    let link = gateway.create_link()?;
    let final_states = requested
        .iter()
        .filter_map(|id| link.entity(id).map(|e| (id.clone(), e.state())))
        .collect();

    Ok(ProcessResponse {
        operation,
        requested: requested.clone(),
        updates,
        errors: started.rejections,
        final_states,
    })
}

/// Applies `process` rounds to `requested` until none of them carries
/// `process` any more or a round changes nothing.
///
/// Each round runs in its own unit of work.
///
/// # Errors
///
/// Returns `PreconditionViolated` for an empty request, an identifier not in
/// the source or `Process::None`. Returns `ProcessDidNotSettle` once
/// `config.max_process_rounds` productive rounds have run without settling.
pub fn process_to_completion<G>(
    gateway: &G,
    requested: &BTreeSet<Identifier>,
    process: Process,
    config: &ServiceConfig,
) -> BusResult<ProcessOutcome>
where
    G: LinkGateway + ?Sized,
{
    if !process.is_active() {
        return Err(CoreError::precondition("cannot drive an empty process").into());
    }

    let mut outcome = ProcessOutcome::default();
    loop {
        let mut uow = UnitOfWork::begin(gateway);
        let pending = {
            let link = uow.link()?;
            link.check_requested(requested)?;
            let in_flight = link.process_identifiers(process);
            requested
                .intersection(&in_flight)
                .cloned()
                .collect::<BTreeSet<_>>()
        };

        if pending.is_empty() {
            uow.rollback();
            break;
        }
        if outcome.rounds >= config.max_process_rounds {
            uow.rollback();
            return Err(BusError::ProcessDidNotSettle {
                process,
                rounds: outcome.rounds,
            });
        }

        uow.link()?.apply(Operation::Process, &pending)?;
        let summary = uow.commit()?;
        if summary.updates.is_empty() {
            break;
        }

        outcome.rounds += 1;
        debug!(
            %process,
            round = outcome.rounds,
            updates = summary.updates.len(),
            "process round committed"
        );
        outcome.updates.extend(summary.updates);
    }

    info!(%process, rounds = outcome.rounds, updates = outcome.updates.len(), "process settled");
    Ok(outcome)
}

/// Returns the identifiers present only in the source.
pub fn list_idle_entities<G>(gateway: &G) -> CoreResult<BTreeSet<Identifier>>
where
    G: LinkGateway + ?Sized,
{
    Ok(gateway.create_link()?.identifiers_with_state(State::Unshared))
}
