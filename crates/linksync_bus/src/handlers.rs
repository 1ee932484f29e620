//! Command handlers and bus wiring.

use crate::bus::{MessageBus, Outbox};
use crate::config::ServiceConfig;
use crate::error::BusResult;
use crate::messages::{BusCommand, CommandKind, EntityOutcome, Event};
use crate::services::{self, ProcessResponse};
use linksync_core::{Identifier, LinkGateway, Process};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Handles every [`BusCommand`] against one gateway.
pub struct LinkHandlers<G: LinkGateway + ?Sized> {
    gateway: Arc<G>,
    config: ServiceConfig,
}

impl<G: LinkGateway + ?Sized> LinkHandlers<G> {
    /// Creates handlers over `gateway`.
    pub fn new(gateway: Arc<G>, config: ServiceConfig) -> Self {
        Self { gateway, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Handles `command`.
    pub fn handle(&self, command: &BusCommand, outbox: &mut Outbox) -> BusResult<()> {
        match command {
            BusCommand::PullEntities { requested } => {
                self.fan_out(Process::Pull, requested, outbox)
            }
            BusCommand::DeleteEntities { requested } => {
                self.fan_out(Process::Delete, requested, outbox)
            }
            BusCommand::PullEntity { identifier } => {
                self.run_one(Process::Pull, identifier, outbox)
            }
            BusCommand::DeleteEntity { identifier } => {
                self.run_one(Process::Delete, identifier, outbox)
            }
            BusCommand::ListIdleEntities => {
                let identifiers = services::list_idle_entities(self.gateway.as_ref())?;
                outbox.publish(Event::IdleEntitiesListed { identifiers });
                Ok(())
            }
        }
    }

    fn fan_out(
        &self,
        process: Process,
        requested: &BTreeSet<Identifier>,
        outbox: &mut Outbox,
    ) -> BusResult<()> {
        self.gateway.create_link()?.check_requested(requested)?;
        debug!(%process, requested = requested.len(), "fanning out batch");

        outbox.publish(Event::BatchProcessingStarted {
            process,
            identifiers: requested.clone(),
        });
        for identifier in requested {
            let identifier = identifier.clone();
            outbox.send(match process {
                Process::Delete => BusCommand::DeleteEntity { identifier },
                _ => BusCommand::PullEntity { identifier },
            });
        }
        outbox.publish(Event::BatchProcessingFinished {
            process,
            identifiers: requested.clone(),
        });
        Ok(())
    }

    fn run_one(
        &self,
        process: Process,
        identifier: &Identifier,
        outbox: &mut Outbox,
    ) -> BusResult<()> {
        outbox.publish(Event::ProcessStarted {
            process,
            identifier: identifier.clone(),
        });

        let requested = BTreeSet::from([identifier.clone()]);
        let gateway = self.gateway.as_ref();
        let response = match process {
            Process::Delete => services::delete(gateway, &requested, &self.config)?,
            _ => services::pull(gateway, &requested, &self.config)?,
        };
        self.publish_records(&response, outbox);

        if let Some(outcome) = response.outcome(identifier) {
            outbox.publish(Event::ProcessFinished {
                process,
                identifier: identifier.clone(),
                outcome,
            });
        }
        Ok(())
    }

    fn publish_records(&self, response: &ProcessResponse, outbox: &mut Outbox) {
        if !self.config.emit_state_changes {
            return;
        }
        for update in &response.updates {
            outbox.publish(Event::StateChanged(update.clone()));
        }
        for error in &response.errors {
            outbox.publish(Event::InvalidOperationRequested(error.clone()));
        }
    }
}

/// Builds a bus with a handler for every command kind.
///
/// # Errors
///
/// Registration on a fresh bus does not fail; the error is propagated for
/// callers that wrap this in their own wiring.
pub fn bootstrap<G>(gateway: Arc<G>, config: ServiceConfig) -> BusResult<MessageBus>
where
    G: LinkGateway + ?Sized + 'static,
{
    let handlers = Arc::new(LinkHandlers::new(gateway, config));
    let mut bus = MessageBus::new();
    for kind in CommandKind::ALL {
        let handlers = Arc::clone(&handlers);
        bus.register(
            kind,
            move |command: &BusCommand, outbox: &mut Outbox| -> BusResult<()> {
                handlers.handle(command, outbox)
            },
        )?;
    }
    Ok(bus)
}

/// Returns the outcome a [`Event::ProcessFinished`] carries, if `event` is one.
pub fn finished_outcome(event: &Event) -> Option<(&Identifier, EntityOutcome)> {
    match event {
        Event::ProcessFinished {
            identifier,
            outcome,
            ..
        } => Some((identifier, *outcome)),
        _ => None,
    }
}
