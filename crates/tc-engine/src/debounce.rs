//! Debounce with a max-wait ceiling.
//!
//! A burst of edits at `t1 < … < tn` fires the value at `tn` either
//! `quiet_period` after `tn` or at `t1 + max_wait`, whichever comes first.
//! Continuous typing therefore still fires roughly once per `max_wait`,
//! and the final value is never dropped.
//!
//! The timing rules live in [`Debouncer`], which is driven by explicit
//! instants and has no runtime dependency. [`DebounceGate`] runs a
//! `Debouncer` on a local task and invokes a callback when it fires.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};

// ─── State machine ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet_period: Duration,
    max_wait: Duration,
    pending: Option<T>,
    /// First edit of the current burst.
    burst_start: Option<Instant>,
    last_edit: Option<Instant>,
    /// Value of the previous fire.
    last_fired: Option<T>,
    /// The current burst held a value other than `last_fired`. A burst
    /// that never left the fired value is not fired again.
    diverged: bool,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(quiet_period: Duration, max_wait: Duration) -> Self {
        Self {
            quiet_period,
            max_wait: max_wait.max(quiet_period),
            pending: None,
            burst_start: None,
            last_edit: None,
            last_fired: None,
            diverged: false,
        }
    }

    /// Record an edit at `now`.
    pub fn edit(&mut self, now: Instant, value: T) {
        self.burst_start.get_or_insert(now);
        self.last_edit = Some(now);
        self.diverged |= self.last_fired.as_ref() != Some(&value);
        self.pending = Some(value);
    }

    /// When the pending value is due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        let settle = self.last_edit? + self.quiet_period;
        let ceiling = self.burst_start? + self.max_wait;
        Some(settle.min(ceiling))
    }

    /// Fire if the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.fire(),
            _ => None,
        }
    }

    /// Fire the pending value immediately, ignoring the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.fire()
    }

    /// Drop the pending value without firing.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.burst_start = None;
        self.last_edit = None;
        self.diverged = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn fire(&mut self) -> Option<T> {
        let value = self.pending.take()?;
        self.burst_start = None;
        self.last_edit = None;
        if !std::mem::take(&mut self.diverged) {
            log::trace!("debounce: burst never left the fired value, skipping");
            return None;
        }
        self.last_fired = Some(value.clone());
        Some(value)
    }
}

// ─── Async driver ────────────────────────────────────────────────────────

enum GateCommand<T> {
    Edit(T),
    Flush,
    Cancel,
}

/// A `Debouncer` running on a local task.
///
/// Must be created inside a `tokio::task::LocalSet`. Dropping the gate
/// stops its task and discards any pending value.
pub struct DebounceGate<T> {
    tx: mpsc::UnboundedSender<GateCommand<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone + PartialEq + 'static> DebounceGate<T> {
    pub fn spawn<F>(quiet_period: Duration, max_wait: Duration, on_fire: F) -> Self
    where
        F: FnMut(T) + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::new(quiet_period, max_wait);
        let task = tokio::task::spawn_local(run_gate(rx, debouncer, on_fire));
        Self { tx, task }
    }

    pub fn push(&self, value: T) {
        // Send only fails once the task is gone, which means we are dropping.
        let _ = self.tx.send(GateCommand::Edit(value));
    }

    pub fn flush(&self) {
        let _ = self.tx.send(GateCommand::Flush);
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(GateCommand::Cancel);
    }
}

impl<T> Drop for DebounceGate<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_gate<T, F>(
    mut rx: mpsc::UnboundedReceiver<GateCommand<T>>,
    mut debouncer: Debouncer<T>,
    mut on_fire: F,
) where
    T: Clone + PartialEq,
    F: FnMut(T),
{
    loop {
        let deadline = debouncer.deadline();
        tokio::select! {
            command = rx.recv() => match command {
                Some(GateCommand::Edit(value)) => debouncer.edit(Instant::now(), value),
                Some(GateCommand::Flush) => {
                    if let Some(value) = debouncer.flush() {
                        on_fire(value);
                    }
                }
                Some(GateCommand::Cancel) => debouncer.cancel(),
                None => break,
            },
            _ = sleep_until_some(deadline) => {
                if let Some(value) = debouncer.poll(Instant::now()) {
                    on_fire(value);
                }
            }
        }
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
