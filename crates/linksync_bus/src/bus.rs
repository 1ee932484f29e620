//! Synchronous message bus.
//!
//! The bus routes each [`BusCommand`] to its single handler and each
//! [`Event`] to every handler subscribed to its kind. Handlers never call
//! back into the bus; they push follow-up messages into an [`Outbox`].
//!
//! ## Ordering
//!
//! Messages produced by one handler are dispatched in the order they were
//! pushed, and before anything that was already waiting in the queue. A
//! batch command that sends one command per identifier and then publishes
//! its completion event therefore sees every per-identifier command, and
//! every event those commands cascade into, handled before the completion
//! event.

use crate::error::{BusError, BusResult};
use crate::messages::{BusCommand, CommandKind, Event, EventKind, Message};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, error, warn};

/// Messages produced by a handler.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    /// Creates an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a command.
    pub fn send(&mut self, command: BusCommand) {
        self.messages.push(Message::Command(command));
    }

    /// Queues an event.
    pub fn publish(&mut self, event: Event) {
        self.messages.push(Message::Event(event));
    }

    /// Returns the number of queued messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing was queued.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the queued messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// Handles one kind of command.
pub trait CommandHandler {
    /// Handles `command`, queueing follow-up messages into `outbox`.
    fn handle(&self, command: &BusCommand, outbox: &mut Outbox) -> BusResult<()>;
}

impl<F> CommandHandler for F
where
    F: Fn(&BusCommand, &mut Outbox) -> BusResult<()>,
{
    fn handle(&self, command: &BusCommand, outbox: &mut Outbox) -> BusResult<()> {
        self(command, outbox)
    }
}

/// Observes one kind of event.
pub trait EventHandler {
    /// Handles `event`, queueing follow-up messages into `outbox`.
    fn handle(&self, event: &Event, outbox: &mut Outbox) -> BusResult<()>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event, &mut Outbox) -> BusResult<()>,
{
    fn handle(&self, event: &Event, outbox: &mut Outbox) -> BusResult<()> {
        self(event, outbox)
    }
}

/// Single-threaded dispatcher for commands and events.
#[derive(Default)]
pub struct MessageBus {
    commands: HashMap<CommandKind, Box<dyn CommandHandler>>,
    events: HashMap<EventKind, Vec<Box<dyn EventHandler>>>,
}

impl MessageBus {
    /// Creates a bus with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateHandler` if `kind` already has a handler.
    pub fn register<H>(&mut self, kind: CommandKind, handler: H) -> BusResult<()>
    where
        H: CommandHandler + 'static,
    {
        if self.commands.contains_key(&kind) {
            return Err(BusError::DuplicateHandler { kind });
        }
        self.commands.insert(kind, Box::new(handler));
        Ok(())
    }

    /// Adds a handler for events of `kind`.
    ///
    /// Handlers for the same kind run in subscription order.
    pub fn subscribe<H>(&mut self, kind: EventKind, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.events.entry(kind).or_default().push(Box::new(handler));
    }

    /// Returns true if `kind` has a handler.
    pub fn handles(&self, kind: CommandKind) -> bool {
        self.commands.contains_key(&kind)
    }

    /// Returns the number of handlers subscribed to `kind`.
    pub fn subscribers(&self, kind: EventKind) -> usize {
        self.events.get(&kind).map_or(0, Vec::len)
    }

    /// Dispatches `message` and everything it cascades into.
    ///
    /// # Errors
    ///
    /// A failing command handler, or a command without a handler, aborts
    /// dispatch: the error is returned and the remaining queue is dropped.
    /// Event handler failures are logged and do not stop dispatch.
    pub fn handle(&self, message: impl Into<Message>) -> BusResult<()> {
        let mut queue = VecDeque::from([message.into()]);
        let mut dispatched = 0usize;

        while let Some(message) = queue.pop_front() {
            dispatched += 1;
            debug!(kind = message.name(), queued = queue.len(), "dispatching");

            let produced = match &message {
                Message::Command(command) => match self.dispatch_command(command) {
                    Ok(produced) => produced,
                    Err(e) => {
                        warn!(
                            error = %e,
                            command = command.kind().name(),
                            dropped = queue.len(),
                            "command failed, aborting dispatch"
                        );
                        return Err(e);
                    }
                },
                Message::Event(event) => self.dispatch_event(event),
            };

            for follow_up in produced.into_iter().rev() {
                queue.push_front(follow_up);
            }
        }

        debug!(dispatched, "queue drained");
        Ok(())
    }

    fn dispatch_command(&self, command: &BusCommand) -> BusResult<Vec<Message>> {
        let kind = command.kind();
        let handler = self
            .commands
            .get(&kind)
            .ok_or(BusError::UnhandledCommand { kind })?;

        let mut outbox = Outbox::new();
        handler.handle(command, &mut outbox)?;
        Ok(outbox.into_messages())
    }

    fn dispatch_event(&self, event: &Event) -> Vec<Message> {
        let kind = event.kind();
        let Some(handlers) = self.events.get(&kind) else {
            return Vec::new();
        };

        let mut produced = Vec::new();
        for (index, handler) in handlers.iter().enumerate() {
            let mut outbox = Outbox::new();
            match handler.handle(event, &mut outbox) {
                Ok(()) => produced.extend(outbox.into_messages()),
                Err(e) => {
                    error!(
                        error = %e,
                        event = kind.name(),
                        handler = index,
                        "event handler failed"
                    );
                }
            }
        }
        produced
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut commands: Vec<_> = self.commands.keys().collect();
        commands.sort();
        f.debug_struct("MessageBus")
            .field("commands", &commands)
            .field(
                "subscribers",
                &self.events.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linksync_core::{Identifier, Process};
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    fn pull(id: &str) -> BusCommand {
        BusCommand::PullEntity {
            identifier: Identifier::from(id),
        }
    }

    fn started(id: &str) -> Event {
        Event::ProcessStarted {
            process: Process::Pull,
            identifier: Identifier::from(id),
        }
    }

    fn record_commands(bus: &mut MessageBus, kind: CommandKind, log: &Rc<RefCell<Vec<String>>>) {
        let log = Rc::clone(log);
        bus.register(kind, move |command: &BusCommand, _: &mut Outbox| -> BusResult<()> {
            log.borrow_mut().push(format!("{command:?}"));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn unregistered_command_is_an_error() {
        let bus = MessageBus::new();
        let err = bus.handle(BusCommand::ListIdleEntities).unwrap_err();

        assert!(matches!(
            err,
            BusError::UnhandledCommand {
                kind: CommandKind::ListIdleEntities
            }
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut bus = MessageBus::new();
        let noop = |_: &BusCommand, _: &mut Outbox| -> BusResult<()> { Ok(()) };
        bus.register(CommandKind::PullEntity, noop).unwrap();

        let err = bus.register(CommandKind::PullEntity, noop).unwrap_err();
        assert!(matches!(err, BusError::DuplicateHandler { .. }));
        assert!(bus.handles(CommandKind::PullEntity));
    }

    #[test]
    fn events_without_handlers_are_ignored() {
        let bus = MessageBus::new();
        bus.handle(started("1")).unwrap();
        assert_eq!(bus.subscribers(EventKind::ProcessStarted), 0);
    }

    #[test]
    fn follow_ups_run_in_push_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = MessageBus::new();
        let fan_out = |_: &BusCommand, outbox: &mut Outbox| -> BusResult<()> {
            outbox.send(pull("a"));
            outbox.send(pull("b"));
            Ok(())
        };
        bus.register(CommandKind::PullEntities, fan_out).unwrap();
        record_commands(&mut bus, CommandKind::PullEntity, &log);

        bus.handle(BusCommand::PullEntities {
            requested: BTreeSet::new(),
        })
        .unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert!(log[0].contains("Identifier(a)"));
        assert!(log[1].contains("Identifier(b)"));
    }

    #[test]
    fn cascades_drain_before_earlier_siblings() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = MessageBus::new();

        let fan_out = |_: &BusCommand, outbox: &mut Outbox| -> BusResult<()> {
            outbox.send(pull("a"));
            outbox.send(pull("b"));
            outbox.publish(Event::BatchProcessingFinished {
                process: Process::Pull,
                identifiers: BTreeSet::new(),
            });
            Ok(())
        };
        let start = |command: &BusCommand, outbox: &mut Outbox| -> BusResult<()> {
            if let BusCommand::PullEntity { identifier } = command {
                outbox.publish(Event::ProcessStarted {
                    process: Process::Pull,
                    identifier: identifier.clone(),
                });
            }
            Ok(())
        };
        bus.register(CommandKind::PullEntities, fan_out).unwrap();
        bus.register(CommandKind::PullEntity, start).unwrap();

        for kind in [EventKind::ProcessStarted, EventKind::BatchProcessingFinished] {
            let order = Rc::clone(&order);
            bus.subscribe(kind, move |event: &Event, _: &mut Outbox| -> BusResult<()> {
                let label = match event {
                    Event::ProcessStarted { identifier, .. } => identifier.to_string(),
                    _ => "finished".to_string(),
                };
                order.borrow_mut().push(label);
                Ok(())
            });
        }

        bus.handle(BusCommand::PullEntities {
            requested: BTreeSet::new(),
        })
        .unwrap();

        assert_eq!(*order.borrow(), vec!["a", "b", "finished"]);
    }

    #[test]
    fn failing_event_handler_does_not_stop_others() {
        let seen = Rc::new(RefCell::new(0));
        let mut bus = MessageBus::new();

        let offline = |_: &Event, outbox: &mut Outbox| -> BusResult<()> {
            outbox.send(pull("never"));
            Err(BusError::handler("listener offline"))
        };
        let counter = Rc::clone(&seen);
        let count = move |_: &Event, _: &mut Outbox| -> BusResult<()> {
            *counter.borrow_mut() += 1;
            Ok(())
        };
        bus.subscribe(EventKind::ProcessStarted, offline);
        bus.subscribe(EventKind::ProcessStarted, count);

        bus.handle(started("1")).unwrap();
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn failing_command_aborts_remaining_queue() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = MessageBus::new();

        let fan_out = |_: &BusCommand, outbox: &mut Outbox| -> BusResult<()> {
            outbox.send(BusCommand::DeleteEntity {
                identifier: Identifier::from("x"),
            });
            outbox.send(pull("after"));
            Ok(())
        };
        let fail = |_: &BusCommand, _: &mut Outbox| -> BusResult<()> {
            Err(BusError::handler("gateway down"))
        };
        bus.register(CommandKind::PullEntities, fan_out).unwrap();
        bus.register(CommandKind::DeleteEntity, fail).unwrap();
        record_commands(&mut bus, CommandKind::PullEntity, &log);

        let err = bus
            .handle(BusCommand::PullEntities {
                requested: BTreeSet::new(),
            })
            .unwrap_err();

        assert!(matches!(err, BusError::Handler(_)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn outbox_accessors() {
        let mut outbox = Outbox::new();
        assert!(outbox.is_empty());
        outbox.send(BusCommand::ListIdleEntities);
        outbox.publish(started("1"));
        assert_eq!(outbox.len(), 2);
        assert!(matches!(outbox.messages()[1], Message::Event(_)));
    }
}
