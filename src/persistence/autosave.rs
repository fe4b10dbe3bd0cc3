//! Periodic background auto-save of the live arrangement to `layouts/autosave.json`.
//!
//! Dirtiness is tracked with generation counters: every change bumps `generation`, every
//! successful write of a snapshot captured at generation `g` raises `saved` to `g`. The state
//! is dirty while `generation > saved`, so a change that lands while a write is in flight
//! keeps the flag set.
//!
//! Writes run on a dedicated worker thread. Queued jobs are coalesced: only the newest pending
//! snapshot is written.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::docking::DockingManager;

use super::error::LayoutResult;
use super::snapshot::LayoutSnapshot;
use super::store::LayoutStore;

#[derive(Debug, Default)]
pub struct DirtyTracker {
    generation: AtomicU64,
    saved: AtomicU64,
}

impl DirtyTracker {
    /// Record a change. Returns the new generation.
    pub fn mark_dirty(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn saved_generation(&self) -> u64 {
        self.saved.load(Ordering::Acquire)
    }

    pub fn is_dirty(&self) -> bool {
        self.generation() > self.saved_generation()
    }

    /// Record that the state of `generation` reached disk.
    pub fn mark_saved(&self, generation: u64) {
        self.saved.fetch_max(generation, Ordering::AcqRel);
    }
}

/// Outcome of one auto-save write, reported back from the worker.
#[derive(Debug)]
pub struct SaveReport {
    pub generation: u64,
    pub path: PathBuf,
    pub result: LayoutResult<()>,
}

#[derive(Debug)]
struct SaveJob {
    generation: u64,
    snapshot: LayoutSnapshot,
}

#[derive(Debug)]
enum SaveMsg {
    Save(SaveJob),
    Shutdown,
}

struct SaveWorker {
    sender: mpsc::Sender<SaveMsg>,
    handle: Option<JoinHandle<()>>,
    reports: mpsc::Receiver<SaveReport>,
}

impl SaveWorker {
    fn start(store: LayoutStore, tracker: Arc<DirtyTracker>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<SaveMsg>();
        let (report_tx, report_rx) = mpsc::channel::<SaveReport>();

        let handle = thread::Builder::new()
            .name("layout-autosave".into())
            .spawn(move || save_loop(&store, &tracker, &rx, &report_tx))?;

        Ok(Self {
            sender: tx,
            handle: Some(handle),
            reports: report_rx,
        })
    }

    fn send(&self, job: SaveJob) -> Result<(), mpsc::SendError<SaveMsg>> {
        self.sender.send(SaveMsg::Save(job))
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        self.sender.send(SaveMsg::Shutdown).ok();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("layout auto-save thread panicked");
            }
        }
    }
}

fn save_loop(
    store: &LayoutStore,
    tracker: &DirtyTracker,
    rx: &mpsc::Receiver<SaveMsg>,
    reports: &mpsc::Sender<SaveReport>,
) {
    loop {
        let Ok(first) = rx.recv() else {
            return;
        };

        let mut latest: Option<SaveJob> = None;
        let mut shutdown = false;
        for msg in std::iter::once(first).chain(rx.try_iter()) {
            match msg {
                SaveMsg::Save(job) => latest = Some(job),
                SaveMsg::Shutdown => shutdown = true,
            }
        }

        if let Some(job) = latest {
            let report = write_job(store, tracker, job);
            reports.send(report).ok();
        }
        if shutdown {
            return;
        }
    }
}

fn write_job(store: &LayoutStore, tracker: &DirtyTracker, job: SaveJob) -> SaveReport {
    let path = store.autosave_path();
    let result = store.write(&path, &job.snapshot);
    match &result {
        Ok(()) => {
            tracker.mark_saved(job.generation);
            log::debug!("auto-saved generation {} to {}", job.generation, path.display());
        }
        Err(err) => log::warn!("auto-save of generation {} failed: {err}", job.generation),
    }
    SaveReport {
        generation: job.generation,
        path,
        result,
    }
}

/// Interval-driven auto-save. Driven by [`Self::tick`] from the host's timer.
pub struct AutoSave {
    interval: Duration,
    elapsed: Duration,
    store: LayoutStore,
    tracker: Arc<DirtyTracker>,
    worker: Option<SaveWorker>,
    dispatched: u64,
}

impl AutoSave {
    /// `background` runs writes on a worker thread; if the thread cannot be spawned, writes fall
    /// back to the calling thread.
    pub fn new(store: LayoutStore, interval: Duration, background: bool) -> Self {
        let tracker = Arc::new(DirtyTracker::default());
        let worker = if background {
            match SaveWorker::start(store.clone(), Arc::clone(&tracker)) {
                Ok(worker) => Some(worker),
                Err(err) => {
                    log::warn!("cannot start auto-save thread, saving inline: {err}");
                    None
                }
            }
        } else {
            None
        };
        Self {
            interval,
            elapsed: Duration::ZERO,
            store,
            tracker,
            worker,
            dispatched: 0,
        }
    }

    pub fn tracker(&self) -> &Arc<DirtyTracker> {
        &self.tracker
    }

    pub fn mark_dirty(&self) -> u64 {
        self.tracker.mark_dirty()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub fn is_background(&self) -> bool {
        self.worker.is_some()
    }

    /// Advance the timer. When the interval elapses and there are unsaved changes, capture `dock`
    /// and save it. Returns whether a save was started.
    pub fn tick(&mut self, dt: Duration, dock: &DockingManager) -> bool {
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = Duration::ZERO;
        self.save_if_dirty(dock)
    }

    /// Start a save of `dock` now if anything changed since the last one was dispatched.
    pub fn save_if_dirty(&mut self, dock: &DockingManager) -> bool {
        let generation = self.tracker.generation();
        if !self.tracker.is_dirty() || generation <= self.dispatched {
            return false;
        }
        let job = SaveJob {
            generation,
            snapshot: LayoutSnapshot::capture("Autosave", "", None, dock),
        };
        self.dispatched = generation;

        let unsent = match &self.worker {
            Some(worker) => match worker.send(job) {
                Ok(()) => return true,
                Err(mpsc::SendError(msg)) => msg,
            },
            None => SaveMsg::Save(job),
        };
        let SaveMsg::Save(job) = unsent else {
            return false;
        };
        if self.worker.take().is_some() {
            log::warn!("auto-save thread gone, saving inline");
        }
        let report = write_job(&self.store, &self.tracker, job);
        if report.result.is_err() {
            self.retry_after_failure();
        }
        true
    }

    /// Let the next tick retry everything not yet on disk.
    fn retry_after_failure(&mut self) {
        self.dispatched = self.tracker.saved_generation();
    }

    /// Drain finished background writes.
    pub fn poll_reports(&mut self) -> Vec<SaveReport> {
        let reports: Vec<SaveReport> = self
            .worker
            .as_ref()
            .map(|w| w.reports.try_iter().collect())
            .unwrap_or_default();
        if reports.iter().any(|r| r.result.is_err()) {
            self.retry_after_failure();
        }
        reports
    }

    /// Wait up to `timeout` for the next background write to finish.
    pub fn recv_report(&mut self, timeout: Duration) -> Option<SaveReport> {
        let report = self.worker.as_ref()?.reports.recv_timeout(timeout).ok()?;
        if report.result.is_err() {
            self.retry_after_failure();
        }
        Some(report)
    }

    /// Stop the worker (letting queued writes finish), then write synchronously if still dirty.
    ///
    /// Returns whether a final write happened.
    pub fn shutdown(&mut self, dock: &DockingManager) -> LayoutResult<bool> {
        self.worker = None;
        if !self.tracker.is_dirty() {
            return Ok(false);
        }
        let generation = self.tracker.generation();
        let snapshot = LayoutSnapshot::capture("Autosave", "", None, dock);
        let path = self.store.autosave_path();
        self.store.write(&path, &snapshot)?;
        self.tracker.mark_saved(generation);
        self.dispatched = generation;
        log::info!("final auto-save to {}", path.display());
        Ok(true)
    }
}
