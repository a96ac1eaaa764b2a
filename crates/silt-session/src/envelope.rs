//! Pending-command envelopes.
//!
//! An [`Envelope`] pairs a [`Command`] with the channel its reply must
//! be delivered on. Resolution consumes the envelope, so answering a
//! command twice does not compile. Delivery to a sink whose receiver is
//! gone is a silent no-op: an enqueued command cannot be withdrawn, and
//! a connection that disappeared before its reply is not an error.

use crossbeam_channel::Sender;

use silt_core::{Command, Reply};

/// A command awaiting exactly one reply.
#[derive(Debug)]
pub struct Envelope {
    command: Command,
    // Taken on resolve/cancel; Some here in Drop means the consumer
    // leaked a pending command.
    sink: Option<Sender<Reply>>,
}

impl Envelope {
    pub fn new(command: Command, sink: Sender<Reply>) -> Self {
        Self {
            command,
            sink: Some(sink),
        }
    }

    /// The command awaiting resolution.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Deliver the reply, consuming the envelope. If the submitter has
    /// disconnected the reply is dropped silently.
    pub fn resolve(mut self, reply: Reply) {
        let sink = self
            .sink
            .take()
            .expect("sink is present until resolve or cancel");
        if sink.send(reply).is_err() {
            log::debug!(
                "reply to {} dropped: submitter disconnected",
                self.command.name()
            );
        }
    }

    /// Discard the envelope without a reply. Only for submission paths
    /// where the command never reached the consumer; once enqueued, the
    /// consumer must `resolve` instead.
    pub(crate) fn cancel(mut self) {
        self.sink.take();
    }
}

impl Drop for Envelope {
    fn drop(&mut self) {
        if self.sink.is_some() {
            log::warn!("envelope for {} dropped unresolved", self.command.name());
            debug_assert!(false, "every enqueued envelope must be resolved");
        }
    }
}
