//! The host side of an export: progress, failures and cancellation.

use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Callbacks into the application driving an export.
///
/// `set_maximum` and `set_current` are called from the export worker while
/// the job runs; `report_failure` and `refresh_preview` are called from the
/// context that finalizes the job.
pub trait ExportHost: Send + Sync {
    /// Total number of progress steps.
    fn set_maximum(&self, maximum: usize);

    /// Steps completed so far.
    fn set_current(&self, current: usize);

    /// Show an export failure to the user.
    fn report_failure(&self, message: &str);

    /// Refresh any preview of the saved document.
    fn refresh_preview(&self) {}
}

/// A host that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl ExportHost for NullHost {
    fn set_maximum(&self, _maximum: usize) {}

    fn set_current(&self, _current: usize) {}

    fn report_failure(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// Events forwarded by [`ChannelHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// `set_maximum` was called
    Maximum(usize),
    /// `set_current` was called
    Current(usize),
    /// `report_failure` was called
    Failure(String),
    /// `refresh_preview` was called
    PreviewRefreshed,
}

/// A host forwarding every callback, in order, over a channel.
#[derive(Debug, Clone)]
pub struct ChannelHost {
    sender: Sender<HostEvent>,
}

impl ChannelHost {
    /// Create the host and the receiving end for the UI.
    pub fn new() -> (Self, Receiver<HostEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, event: HostEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.sender.send(event);
    }
}

impl ExportHost for ChannelHost {
    fn set_maximum(&self, maximum: usize) {
        self.send(HostEvent::Maximum(maximum));
    }

    fn set_current(&self, current: usize) {
        self.send(HostEvent::Current(current));
    }

    fn report_failure(&self, message: &str) {
        self.send(HostEvent::Failure(message.to_string()));
    }

    fn refresh_preview(&self) {
        self.send(HostEvent::PreviewRefreshed);
    }
}

/// Shared flag asking a running export to stop at the next page boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Monotonic progress reporting for one strategy run.
pub(crate) struct Progress<'a> {
    host: &'a dyn ExportHost,
    cancel: &'a CancelToken,
    current: usize,
    maximum: usize,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(host: &'a dyn ExportHost, cancel: &'a CancelToken) -> Self {
        Self {
            host,
            cancel,
            current: 0,
            maximum: 0,
        }
    }

    pub(crate) fn begin(&mut self, maximum: usize) {
        self.maximum = maximum;
        self.current = 0;
        self.host.set_maximum(maximum);
    }

    pub(crate) fn advance(&mut self) {
        if self.current < self.maximum {
            self.current += 1;
            self.host.set_current(self.current);
        }
    }

    /// Jump to the end, for backends that report no per-page progress.
    pub(crate) fn complete(&mut self) {
        if self.current < self.maximum {
            self.current = self.maximum;
            self.host.set_current(self.current);
        }
    }

    /// Page boundary: fail with [`Error::Cancelled`] if asked to stop.
    pub(crate) fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let (host, events) = ChannelHost::new();
        let cancel = CancelToken::new();
        let mut progress = Progress::new(&host, &cancel);

        progress.begin(2);
        progress.advance();
        progress.advance();
        progress.advance();
        progress.complete();

        let events: Vec<_> = events.try_iter().collect();
        assert_eq!(
            events,
            vec![
                HostEvent::Maximum(2),
                HostEvent::Current(1),
                HostEvent::Current(2)
            ]
        );
    }

    #[test]
    fn test_checkpoint_observes_cancel() {
        let cancel = CancelToken::new();
        let progress = Progress::new(&NullHost, &cancel);
        assert!(progress.checkpoint().is_ok());

        cancel.clone().cancel();
        assert!(matches!(progress.checkpoint(), Err(Error::Cancelled)));
    }
}
