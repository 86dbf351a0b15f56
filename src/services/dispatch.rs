//! Delivery of outcomes back onto the caller's own context.
//!
//! Network work runs on spawned tasks; callbacks never run there. A task
//! finishing a request sends the outcome and the callback through a channel,
//! and the owning [`CallerContext`] invokes the callback when it drains that
//! channel. Dropping the context cancels its token, which stops outstanding
//! tasks and guarantees no callback fires afterwards.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::outcome::ResultOutcome;

pub type RequestId = Uuid;

pub type ResultCallback = Box<dyn FnOnce(ResultOutcome) + Send + 'static>;

struct Delivery {
    request_id: RequestId,
    outcome: ResultOutcome,
    callback: ResultCallback,
}

/// Every registration ends in exactly one message.
enum Message {
    Deliver(Delivery),
    /// The callback was dropped without an outcome.
    Abandoned(RequestId),
}

/// The context that submitted requests and receives their outcomes.
pub struct CallerContext {
    sender: mpsc::UnboundedSender<Message>,
    receiver: mpsc::UnboundedReceiver<Message>,
    shutdown: CancellationToken,
    /// Registrations whose message has not been received yet.
    outstanding: Arc<AtomicUsize>,
}

impl CallerContext {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            shutdown: CancellationToken::new(),
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cloneable handle used to register callbacks from anywhere.
    pub fn handle(&self) -> ContextHandle {
        ContextHandle {
            sender: self.sender.clone(),
            shutdown: self.shutdown.clone(),
            outstanding: self.outstanding.clone(),
        }
    }

    /// Number of registered callbacks still waiting for dispatch.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Wait for the next outcome and run its callback here.
    ///
    /// Returns `None` without waiting when no registered callback is still
    /// outstanding, and `None` once the context has been torn down.
    pub async fn dispatch_next(&mut self) -> Option<RequestId> {
        while self.outstanding() > 0 {
            let message = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return None,
                message = self.receiver.recv() => message?,
            };
            if let Some(request_id) = self.receive(message) {
                return Some(request_id);
            }
        }
        None
    }

    /// Run callbacks for every outcome already waiting, without blocking.
    pub fn dispatch_ready(&mut self) -> usize {
        let mut delivered = 0;
        while !self.shutdown.is_cancelled() {
            match self.receiver.try_recv() {
                Ok(message) => {
                    if self.receive(message).is_some() {
                        delivered += 1;
                    }
                }
                Err(_) => break,
            }
        }
        delivered
    }

    /// Stop all outstanding work. Pending outcomes are discarded.
    pub fn teardown(self) {
        drop(self);
    }

    fn receive(&self, message: Message) -> Option<RequestId> {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        match message {
            Message::Deliver(delivery) => {
                tracing::debug!(request_id = %delivery.request_id, outcome = delivery.outcome.label(), "Delivering result");
                (delivery.callback)(delivery.outcome);
                Some(delivery.request_id)
            }
            Message::Abandoned(request_id) => {
                tracing::debug!(request_id = %request_id, "Callback abandoned without a result");
                None
            }
        }
    }
}

impl Default for CallerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CallerContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Clone)]
pub struct ContextHandle {
    sender: mpsc::UnboundedSender<Message>,
    shutdown: CancellationToken,
    outstanding: Arc<AtomicUsize>,
}

impl ContextHandle {
    pub fn register<F>(&self, callback: F) -> PendingCallback
    where
        F: FnOnce(ResultOutcome) + Send + 'static,
    {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        PendingCallback {
            request_id: Uuid::new_v4(),
            callback: Some(Box::new(callback)),
            sender: self.sender.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// A callback awaiting its one and only outcome. Completing consumes it;
/// dropping it uncompleted tells the context not to wait for it.
pub struct PendingCallback {
    request_id: RequestId,
    callback: Option<ResultCallback>,
    sender: mpsc::UnboundedSender<Message>,
    shutdown: CancellationToken,
}

impl PendingCallback {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Token cancelled when the owning context goes away.
    pub fn cancellation(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Hand the outcome to the owning context. Returns false if the context is gone.
    pub fn complete(mut self, outcome: ResultOutcome) -> bool {
        if self.shutdown.is_cancelled() {
            tracing::debug!(request_id = %self.request_id, "Context torn down, dropping result");
            return false;
        }

        let Some(callback) = self.callback.take() else {
            return false;
        };
        let delivery = Delivery {
            request_id: self.request_id,
            outcome,
            callback,
        };
        match self.sender.send(Message::Deliver(delivery)) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(request_id = %self.request_id, "Context closed, dropping result");
                false
            }
        }
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        if self.callback.take().is_some() {
            let _ = self.sender.send(Message::Abandoned(self.request_id));
        }
    }
}
