//! Background snapshotting of atlas pixels.
//!
//! Each atlas owns a [`SnapshotSlot`]: a single-slot mailbox holding the most
//! recent pixel copy to stabilize, plus the last published snapshot. The render
//! thread fills the mailbox and pokes the worker; the worker moves the payload
//! into an `Arc` and swaps it in as the published snapshot. Readers only ever
//! clone the published `Arc`, so they never observe a half-written snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use image::RgbaImage;

/// Mailbox + published snapshot for one atlas.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    pending: Mutex<Option<RgbaImage>>,
    published: Mutex<Option<Arc<RgbaImage>>>,
    generation: AtomicU64,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent completed snapshot.
    pub fn latest(&self) -> Option<Arc<RgbaImage>> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of snapshots published so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stores `pixels` as the next payload. Returns `true` if the mailbox was
    /// empty, i.e. the worker needs to be notified.
    fn post(&self, pixels: RgbaImage) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let was_empty = pending.is_none();
        *pending = Some(pixels);
        was_empty
    }

    /// Publishes any pending payload inline, then returns the latest snapshot.
    ///
    /// Used for repaints: a payload still sitting in the mailbox is newer than
    /// anything the worker has published.
    pub fn newest(&self) -> Option<Arc<RgbaImage>> {
        self.publish_pending();
        self.latest()
    }

    /// Publishes the pending payload, if any.
    ///
    /// The mailbox lock is held across the swap so a concurrent `clear` can
    /// never be overtaken by a payload taken before it.
    pub(crate) fn publish_pending(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(pixels) = pending.take() else {
            return;
        };
        let previous = self
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::new(pixels));
        self.generation.fetch_add(1, Ordering::AcqRel);
        drop(pending);
        // Release the old buffer outside the locks.
        drop(previous);
    }

    /// Drops both the pending payload and the published snapshot.
    pub(crate) fn clear(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.take();
        self.published.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

pub(crate) enum Job {
    Snapshot(Arc<SnapshotSlot>),
    Fence(mpsc::SyncSender<()>),
    Shutdown,
}

/// Sending side handed to atlases.
#[derive(Clone)]
pub struct SnapshotQueue {
    tx: mpsc::Sender<Job>,
}

impl SnapshotQueue {
    /// Queue with no worker behind it; the caller drains the receiver by hand.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::Receiver<Job>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Schedules a snapshot of `pixels` for `slot`. Never blocks on the worker.
    pub fn submit(&self, slot: &Arc<SnapshotSlot>, pixels: RgbaImage) {
        if !slot.post(pixels) {
            // A job for this slot is already queued; it will pick up the newer payload.
            return;
        }
        if self.tx.send(Job::Snapshot(Arc::clone(slot))).is_err() {
            log::warn!("snapshot worker is gone; publishing snapshot inline");
            slot.publish_pending();
        }
    }
}

/// The single background thread that publishes atlas snapshots.
pub struct SnapshotWorker {
    queue: SnapshotQueue,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotWorker {
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = std::thread::Builder::new()
            .name("tessel-snapshot".to_string())
            .spawn(move || run(rx))
            .context("failed to spawn snapshot worker thread")?;

        log::debug!("snapshot worker started");

        Ok(Self {
            queue: SnapshotQueue { tx },
            handle: Some(handle),
        })
    }

    pub fn queue(&self) -> SnapshotQueue {
        self.queue.clone()
    }

    /// Blocks until every job queued before this call has completed.
    pub fn flush(&self) {
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        if self.queue.tx.send(Job::Fence(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.recv();
    }
}

impl Drop for SnapshotWorker {
    fn drop(&mut self) {
        let _ = self.queue.tx.send(Job::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("snapshot worker panicked");
            }
        }
    }
}

fn run(rx: mpsc::Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        match job {
            Job::Snapshot(slot) => slot.publish_pending(),
            Job::Fence(done) => {
                let _ = done.send(());
            }
            Job::Shutdown => break,
        }
    }
    log::debug!("snapshot worker stopped");
}
