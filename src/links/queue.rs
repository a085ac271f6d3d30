//! FIFO mutation queue
//!
//! A single worker thread owns access to the shared state and runs queued
//! jobs one at a time, in submission order. Each job reports back through its
//! own reply channel, so a failing or panicking job only affects its caller.
//! A job that queues more work on its own queue gets [`StoreError::Reentrant`]
//! instead of waiting on itself forever.

use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, warn};

use crate::error::StoreError;

type Job<S> = Box<dyn FnOnce(&S) + Send>;

/// Serializes every operation against `S`
pub struct MutationQueue<S> {
    state: Arc<S>,
    sender: Option<Sender<Job<S>>>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

/// Handle to the result of a queued job
#[must_use = "a ticket does nothing unless waited on"]
pub struct Ticket<R> {
    reply: Receiver<Result<R, StoreError>>,
}

impl<R> Ticket<R> {
    /// Block until the job has run
    pub fn wait(self) -> Result<R, StoreError> {
        self.reply.recv().map_err(|_| StoreError::QueueClosed)?
    }
}

impl<S: Send + Sync + 'static> MutationQueue<S> {
    /// Start the worker thread
    pub fn new(state: S) -> Result<Self, StoreError> {
        let state = Arc::new(state);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job<S>>();

        let worker_state = Arc::clone(&state);
        let worker = thread::Builder::new()
            .name("mutation-queue".to_string())
            .spawn(move || {
                for job in receiver {
                    job(&worker_state);
                }
                debug!("mutation queue drained");
            })
            .map_err(StoreError::Spawn)?;

        Ok(Self {
            state,
            sender: Some(sender),
            worker_id: worker.thread().id(),
            worker: Some(worker),
        })
    }

    /// Shared state, for work that needs no serialization
    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// Queue a job behind everything already submitted
    pub fn enqueue<R, F>(&self, job: F) -> Ticket<R>
    where
        R: Send + 'static,
        F: FnOnce(&S) -> Result<R, StoreError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);

        if thread::current().id() == self.worker_id {
            warn!("rejecting update queued from the mutation queue worker");
            reply_tx.send(Err(StoreError::Reentrant)).ok();
            return Ticket { reply: reply_rx };
        }

        let wrapped: Job<S> = Box::new(move |state| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(state)))
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    warn!("queued update panicked: {}", message);
                    Err(StoreError::Panicked(message))
                });
            // The caller may have dropped its ticket
            reply_tx.send(outcome).ok();
        });

        match &self.sender {
            Some(sender) => {
                debug!(pending = sender.len(), "queueing mutation");
                // On failure the job (and its reply sender) is dropped, which
                // surfaces as QueueClosed from the ticket.
                sender.send(wrapped).ok();
            }
            None => drop(wrapped),
        }

        Ticket { reply: reply_rx }
    }

    /// Queue a job and wait for it
    pub fn run<R, F>(&self, job: F) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&S) -> Result<R, StoreError> + Send + 'static,
    {
        self.enqueue(job).wait()
    }
}

impl<S> Drop for MutationQueue<S> {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish queued jobs and exit
        self.sender.take();

        if let Some(worker) = self.worker.take() {
            if self.worker_id != thread::current().id() && worker.join().is_err() {
                warn!("mutation queue worker panicked");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
