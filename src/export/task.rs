//! Running an export job on a background worker.
//!
//! The worker owns the job while it runs and hands it back through a
//! single-slot channel. Finalization happens on the thread that calls
//! [`ExportTask::finish`], so hosts may touch UI state or take the
//! document's write lock from their callbacks.

use super::host::{CancelToken, ExportHost};
use super::job::{ExportContext, ExportJob};
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Name given to export worker threads.
pub const WORKER_NAME: &str = "inkport-export";

/// Handle to a job running on a worker thread.
pub struct ExportTask {
    receiver: Receiver<ExportJob>,
    worker: Option<JoinHandle<()>>,
    host: Arc<dyn ExportHost>,
    cancel: CancelToken,
    done: Option<ExportJob>,
    finished: bool,
}

impl ExportTask {
    /// Start `job` on a new worker thread.
    pub fn spawn(job: ExportJob, context: ExportContext) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let host = Arc::clone(&context.host);
        let cancel = context.cancel.clone();

        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                let mut job = job;
                let mut context = context;
                if let Err(e) = job.execute(&mut context) {
                    log::error!("Export job not started: {}", e);
                }
                // Release the document before the owner sees the job.
                drop(context);
                let _ = sender.send(job);
            })?;

        Ok(Self {
            receiver,
            worker: Some(worker),
            host,
            cancel,
            done: None,
            finished: false,
        })
    }

    /// Ask the worker to stop at the next page boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token shared with the worker.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Whether the worker has handed back the job. Never blocks.
    pub fn is_finished(&mut self) -> bool {
        if !self.finished {
            match self.receiver.try_recv() {
                Ok(job) => self.store(Some(job)),
                Err(TryRecvError::Disconnected) => self.store(None),
                Err(TryRecvError::Empty) => {}
            }
        }
        self.finished
    }

    /// Wait up to `timeout` for the worker. Returns whether it finished.
    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        if !self.finished {
            match self.receiver.recv_timeout(timeout) {
                Ok(job) => self.store(Some(job)),
                Err(RecvTimeoutError::Disconnected) => self.store(None),
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        self.finished
    }

    /// Wait for the worker, then finalize the job on this thread.
    pub fn finish(mut self) -> Result<ExportJob> {
        if !self.finished {
            let job = self.receiver.recv().ok();
            self.store(job);
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Export worker panicked");
            }
        }

        let mut job = self
            .done
            .take()
            .ok_or_else(|| Error::Other("export worker terminated without a result".into()))?;
        job.finalize(self.host.as_ref())?;
        Ok(job)
    }

    /// Like [`finish`](Self::finish), but cancels the job if it is still
    /// running after `timeout`.
    pub fn finish_timeout(mut self, timeout: Duration) -> Result<ExportJob> {
        if !self.wait_timeout(timeout) {
            log::info!("Export still running after {:?}, cancelling", timeout);
            self.cancel();
        }
        self.finish()
    }

    /// Wait for the worker without blocking the async runtime, then finalize.
    #[cfg(feature = "async")]
    pub async fn finish_async(mut self) -> Result<ExportJob> {
        if !self.finished {
            let receiver = self.receiver.clone();
            let job = tokio::task::spawn_blocking(move || receiver.recv().ok())
                .await
                .map_err(|e| Error::Other(format!("export wait failed: {}", e)))?;
            self.store(job);
        }
        self.finish()
    }

    fn store(&mut self, job: Option<ExportJob>) {
        self.done = job;
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LABEL_PNG;
    use crate::export::{ChannelHost, ExportOptions, HostEvent, JobState};
    use crate::model::{Document, Page};

    #[test]
    fn test_finish_finalizes_job() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        doc.add_page(Page::new(72.0, 72.0));

        let (host, events) = ChannelHost::new();
        let context = ExportContext::new(doc.into_shared()).with_host(Arc::new(host));
        let job = ExportJob::new(dir.path().join("page"), LABEL_PNG)
            .with_options(ExportOptions::new().with_dpi(72.0));

        let task = ExportTask::spawn(job, context).unwrap();
        let job = task.finish().unwrap();

        assert_eq!(job.state(), JobState::Finalized);
        assert!(job.is_success());
        assert!(dir.path().join("page.png").exists());
        let events: Vec<_> = events.try_iter().collect();
        assert_eq!(events, vec![HostEvent::Maximum(1), HostEvent::Current(1)]);
    }

    #[test]
    fn test_started_job_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::new().into_shared();
        let mut job = ExportJob::new(dir.path().join("a"), LABEL_PNG);
        job.resolve(&crate::catalog::FormatCatalog::with_defaults(), &doc)
            .unwrap();

        let task = ExportTask::spawn(job, ExportContext::new(doc)).unwrap();
        let err = task.finish().unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }
}
