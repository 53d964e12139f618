//! Background fetch worker for the dashboard.
//!
//! Fetches run off the UI thread. Every request carries a generation number;
//! only the result for the newest request is ever applied ("last refresh
//! wins"). Requests that queue up behind a slow fetch are collapsed so the
//! worker never fetches a window that has already been superseded.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::app::pipeline::{Snapshot, fetch_snapshot};
use crate::data::SeriesSource;
use crate::domain::StressConfig;
use crate::error::AppError;

/// Tracks requested vs. settled refresh generations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Generations {
    requested: u64,
    settled: u64,
}

impl Generations {
    /// Allocate the generation for a new request.
    pub fn next(&mut self) -> u64 {
        self.requested += 1;
        self.requested
    }

    /// True if `generation` is the newest request; marks it settled.
    pub fn accept(&mut self, generation: u64) -> bool {
        if generation != self.requested {
            return false;
        }
        self.settled = generation;
        true
    }

    pub fn in_flight(&self) -> bool {
        self.settled < self.requested
    }

    pub fn latest(&self) -> u64 {
        self.requested
    }
}

struct FetchRequest {
    generation: u64,
    config: StressConfig,
}

pub struct FetchResult {
    pub generation: u64,
    pub outcome: Result<Snapshot, AppError>,
}

/// Owns the fetch thread. Dropping it closes the request channel, which ends the thread.
pub struct RefreshWorker {
    requests: Option<Sender<FetchRequest>>,
    results: Receiver<FetchResult>,
    generations: Generations,
    handle: Option<JoinHandle<()>>,
}

impl RefreshWorker {
    pub fn spawn(source: Arc<dyn SeriesSource>) -> Result<Self, AppError> {
        let (req_tx, req_rx) = mpsc::channel::<FetchRequest>();
        let (res_tx, res_rx) = mpsc::channel::<FetchResult>();

        let handle = thread::Builder::new()
            .name("fstress-fetch".to_string())
            .spawn(move || fetch_loop(source, req_rx, res_tx))
            .map_err(|e| AppError::new(crate::error::EXIT_DATA, format!("Failed to start fetch worker: {e}")))?;

        Ok(Self {
            requests: Some(req_tx),
            results: res_rx,
            generations: Generations::default(),
            handle: Some(handle),
        })
    }

    /// Queue a fetch for `config`'s window. Returns the request's generation.
    pub fn request(&mut self, config: &StressConfig) -> Result<u64, AppError> {
        let generation = self.generations.next();
        let request = FetchRequest {
            generation,
            config: config.clone(),
        };
        self.requests
            .as_ref()
            .and_then(|tx| tx.send(request).ok())
            .ok_or_else(|| AppError::data("Fetch worker has stopped."))?;
        Ok(generation)
    }

    /// Non-blocking: the newest settled result, if one arrived. Stale results are dropped.
    pub fn poll(&mut self) -> Option<FetchResult> {
        let mut accepted = None;
        loop {
            match self.results.try_recv() {
                Ok(result) => {
                    if self.generations.accept(result.generation) {
                        accepted = Some(result);
                    } else {
                        debug!(generation = result.generation, "dropping superseded refresh");
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return accepted,
            }
        }
    }

    pub fn in_flight(&self) -> bool {
        self.generations.in_flight()
    }

    pub fn latest_generation(&self) -> u64 {
        self.generations.latest()
    }
}

impl Drop for RefreshWorker {
    fn drop(&mut self) {
        self.requests.take();
        // An in-flight HTTP fetch is bounded by the client timeout.
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn fetch_loop(source: Arc<dyn SeriesSource>, requests: Receiver<FetchRequest>, results: Sender<FetchResult>) {
    while let Ok(mut request) = requests.recv() {
        // Skip anything already superseded by a newer request.
        while let Ok(newer) = requests.try_recv() {
            debug!(skipped = request.generation, "collapsing queued refresh");
            request = newer;
        }

        let outcome = fetch_snapshot(source.as_ref(), &request.config);
        let result = FetchResult {
            generation: request.generation,
            outcome,
        };
        if results.send(result).is_err() {
            break;
        }
    }
}
