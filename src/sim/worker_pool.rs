//! Fixed-size worker pool with a bounded job queue
//!
//! `submit` never blocks: when the queue is full (or the pool has been
//! stopped) the job runs on the caller's thread instead.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::lock;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    sender: Option<SyncSender<Job>>,
    workers: Vec<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
    ran_inline: AtomicUsize,
}

impl WorkerPool {
    pub fn new(workers: usize, queue: usize) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::sync_channel::<Job>(queue);
        let receiver = Arc::new(Mutex::new(receiver));
        let cancelled = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let receiver = Arc::clone(&receiver);
            let cancelled = Arc::clone(&cancelled);
            let handle = thread::Builder::new()
                .name(format!("projectile-worker-{index}"))
                .spawn(move || worker_loop(&receiver, &cancelled))?;
            handles.push(handle);
        }

        log::debug!("worker pool started: {workers} workers, queue {queue}");
        Ok(Self {
            sender: Some(sender),
            workers: handles,
            cancelled,
            ran_inline: AtomicUsize::new(0),
        })
    }

    pub fn submit(&self, job: Job) {
        let job = match &self.sender {
            Some(sender) => match sender.try_send(job) {
                Ok(()) => return,
                Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => job,
            },
            None => job,
        };
        self.ran_inline.fetch_add(1, Ordering::Relaxed);
        job();
    }

    /// Jobs that fell back to the submitting thread
    pub fn ran_inline(&self) -> usize {
        self.ran_inline.load(Ordering::Relaxed)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.sender.is_none()
    }

    /// Cancel, close the queue and join every worker. Safe to call twice.
    /// Jobs still queued are dropped without running.
    pub fn stop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.sender = None;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::warn!("projectile worker panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(receiver: &Mutex<Receiver<Job>>, cancelled: &AtomicBool) {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        let job = lock(receiver).recv();
        match job {
            Ok(job) => {
                if cancelled.load(Ordering::SeqCst) {
                    break;
                }
                job();
            }
            Err(_) => break,
        }
    }
}
