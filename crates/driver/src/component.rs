// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One component worker: a dedicated OS thread running the task state
//! machine IDLE -> PREPARE -> RUNNING -> DONE (spec §4.5), grounded on
//! `original_source/src/tomato/drivers/example_counter/counter.py::run_counter`
//! generalised across drivers. A `std::thread` rather than a tokio task
//! because sampling is a blocking, precisely-timed loop that must not share
//! a runtime worker with the control socket's async I/O.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde_json::Value;

use tomato_core::{validate_task, Attr, Task, TechniqueSchema};

use crate::error::DriverError;

const QUEUE_DEPTH: usize = 4;
const MIN_POLL: Duration = Duration::from_millis(10);
const MAX_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Preparing,
    Running,
    Done,
}

#[derive(Debug, Clone)]
pub struct DataPoint {
    pub uts: f64,
    pub value: Value,
}

/// One reading function per technique: given the coerced task params,
/// produce the value sampled on this tick.
pub trait Sampler: Send + Sync {
    fn sample(&self, technique: &str, params: &BTreeMap<String, Value>, elapsed: Duration) -> Value;
}

enum Msg {
    Start(Task, BTreeMap<String, Value>),
    Measure(String),
    Stop,
}

struct Shared {
    state: Mutex<WorkerState>,
    cache: Mutex<Vec<DataPoint>>,
    last: Mutex<Option<DataPoint>>,
    started: AtomicBool,
}

/// Owns the task queue, data cache and running thread for one `(address,
/// channel)` slot.
pub struct ComponentWorker {
    tx: SyncSender<Msg>,
    shared: Arc<Shared>,
    attrs: BTreeMap<String, Attr>,
    techniques: BTreeMap<String, TechniqueSchema>,
    constants: BTreeMap<String, Value>,
    values: Mutex<BTreeMap<String, Value>>,
    handle: Option<JoinHandle<()>>,
}

impl ComponentWorker {
    pub fn spawn(
        sampler: Arc<dyn Sampler>,
        attrs: BTreeMap<String, Attr>,
        techniques: BTreeMap<String, TechniqueSchema>,
        constants: BTreeMap<String, Value>,
    ) -> Self {
        let (tx, rx) = sync_channel(QUEUE_DEPTH);
        let shared = Arc::new(Shared {
            state: Mutex::new(WorkerState::Idle),
            cache: Mutex::new(Vec::new()),
            last: Mutex::new(None),
            started: AtomicBool::new(false),
        });
        let thread_shared = shared.clone();
        let values = Mutex::new(default_values(&attrs));
        let handle = std::thread::spawn(move || run(rx, thread_shared, sampler));
        Self { tx, shared, attrs, techniques, constants, values, handle: Some(handle) }
    }

    pub fn attrs(&self) -> &BTreeMap<String, Attr> {
        &self.attrs
    }

    pub fn techniques(&self) -> &BTreeMap<String, TechniqueSchema> {
        &self.techniques
    }

    pub fn constants(&self) -> &BTreeMap<String, Value> {
        &self.constants
    }

    /// Validate and hand off a new task. Preempts whatever the worker is
    /// currently running (spec §4.5 "queue has a pending ... new Task ->
    /// DONE (current task cancelled)").
    pub fn start_task(&self, task: Task) -> Result<(), DriverError> {
        let coerced = validate_task(&task, &self.techniques, &self.attrs)?;
        self.tx.send(Msg::Start(task, coerced)).map_err(|_| DriverError::WorkerGone)
    }

    pub fn stop_task(&self) -> Result<(), DriverError> {
        self.tx.send(Msg::Stop).map_err(|_| DriverError::WorkerGone)
    }

    /// `cmp_measure`: enqueue a one-shot sample if idle and the queue is
    /// empty (spec §4.4 "enqueue a one-shot measurement if idle and queue
    /// empty").
    pub fn measure(&self, technique: String) -> Result<(), DriverError> {
        if self.state() != WorkerState::Idle {
            return Err(DriverError::Busy);
        }
        self.tx.send(Msg::Measure(technique)).map_err(|_| DriverError::WorkerGone)
    }

    pub fn state(&self) -> WorkerState {
        *self.shared.state.lock()
    }

    pub fn started(&self) -> bool {
        self.shared.started.load(Ordering::SeqCst)
    }

    /// Take and clear whatever has accumulated in the cache since the last
    /// drain, used by `task_data`.
    pub fn drain_data(&self) -> Vec<DataPoint> {
        std::mem::take(&mut *self.shared.cache.lock())
    }

    /// `cmp_last_data`: the most recent sample, never cleared.
    pub fn last_data(&self) -> Option<DataPoint> {
        self.shared.last.lock().clone()
    }

    pub fn get_attr(&self, name: &str) -> Result<Value, DriverError> {
        if !self.attrs.contains_key(name) {
            return Err(DriverError::Core(tomato_core::CoreError::UnknownAttr(name.to_string())));
        }
        Ok(self.values.lock().get(name).cloned().unwrap_or(Value::Null))
    }

    pub fn set_attr(&self, name: &str, val: &Value) -> Result<Value, DriverError> {
        let attr = self
            .attrs
            .get(name)
            .ok_or_else(|| DriverError::Core(tomato_core::CoreError::UnknownAttr(name.to_string())))?;
        let coerced = attr.coerce_and_check(val)?;
        self.values.lock().insert(name.to_string(), coerced.clone());
        Ok(coerced)
    }

    /// `cmp_status`: every status-tagged attr's current value, plus
    /// `running`.
    pub fn status(&self) -> BTreeMap<String, Value> {
        let values = self.values.lock();
        let mut out: BTreeMap<String, Value> =
            self.attrs.values().filter(|a| a.status).map(|a| (a.name.clone(), values.get(&a.name).cloned().unwrap_or(Value::Null))).collect();
        out.insert("running".to_string(), Value::Bool(matches!(self.state(), WorkerState::Preparing | WorkerState::Running)));
        out
    }
}

fn default_values(attrs: &BTreeMap<String, Attr>) -> BTreeMap<String, Value> {
    attrs
        .values()
        .map(|a| {
            let default = match a.ty {
                tomato_core::AttrType::Bool => Value::Bool(false),
                tomato_core::AttrType::Int => Value::from(0),
                tomato_core::AttrType::Float => Value::from(0.0),
                tomato_core::AttrType::Str => Value::from(""),
            };
            (a.name.clone(), default)
        })
        .collect()
}

impl Drop for ComponentWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn unix_ts() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

fn run(rx: Receiver<Msg>, shared: Arc<Shared>, sampler: Arc<dyn Sampler>) {
    let mut pending: Option<Msg> = None;
    loop {
        let msg = match pending.take() {
            Some(m) => m,
            None => match rx.recv() {
                Ok(m) => m,
                Err(_) => return,
            },
        };
        let (task, params) = match msg {
            Msg::Stop => return,
            Msg::Measure(technique) => {
                *shared.state.lock() = WorkerState::Preparing;
                let value = sampler.sample(&technique, &BTreeMap::new(), Duration::ZERO);
                let point = DataPoint { uts: unix_ts(), value };
                shared.cache.lock().push(point.clone());
                *shared.last.lock() = Some(point);
                *shared.state.lock() = WorkerState::Idle;
                continue;
            }
            Msg::Start(task, params) => (task, params),
        };

        *shared.state.lock() = WorkerState::Preparing;
        shared.started.store(true, Ordering::SeqCst);
        shared.cache.lock().clear();

        let sampling_interval = Duration::from_secs_f64(task.sampling_interval.max(0.001));
        let max_duration =
            if task.max_duration > 0.0 { Some(Duration::from_secs_f64(task.max_duration)) } else { None };
        let t0 = Instant::now();
        let mut next_sample = t0 + sampling_interval;

        *shared.state.lock() = WorkerState::Running;
        loop {
            let now = Instant::now();
            if now >= next_sample {
                let value = sampler.sample(&task.technique_name, &params, now.duration_since(t0));
                let point = DataPoint { uts: unix_ts(), value };
                shared.cache.lock().push(point.clone());
                *shared.last.lock() = Some(point);
                next_sample += sampling_interval;
            }

            if let Some(max) = max_duration {
                if now.duration_since(t0) >= max {
                    break;
                }
            }

            match rx.try_recv() {
                Ok(next @ Msg::Start(..)) => {
                    pending = Some(next);
                    break;
                }
                Ok(Msg::Stop) => {
                    pending = Some(Msg::Stop);
                    break;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => return,
            }

            std::thread::sleep((sampling_interval / 20).clamp(MIN_POLL, MAX_POLL));
        }

        shared.started.store(false, Ordering::SeqCst);
        *shared.state.lock() = WorkerState::Done;
        *shared.state.lock() = WorkerState::Idle;
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
