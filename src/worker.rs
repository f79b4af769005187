//! Background thermal detection.
//!
//! Thermal detection is the one pipeline stage heavy enough to keep off an
//! interactive thread. [`ThermalWorker`] owns a detection thread and talks
//! to it with one request and one response message per job, tagged with a
//! correlation id. A newer submission supersedes older ones: queued stale
//! requests are skipped by the thread and stale results are dropped by the
//! handle. Jobs are never cancelled mid-computation.
//!
//! # Example
//! ```
//! use igc_thermals::{ClimbRange, DetectThermalCirclesConfig, ThermalWorker};
//! use igc_thermals::synthetic::SyntheticFlight;
//!
//! let fixes = SyntheticFlight::new(46.5, 8.0).straight(60, 0.0, 10.0, 1.0).fixes();
//! let climbs = vec![ClimbRange::Indices { start_idx: 0, end_idx: 59 }];
//!
//! let mut worker = ThermalWorker::spawn();
//! let id = worker.submit(fixes, climbs, DetectThermalCirclesConfig::default()).unwrap();
//! let result = worker.recv_latest().unwrap().unwrap();
//! assert_eq!(result.request_id, id);
//! assert!(result.circles.is_empty());
//! ```

use std::sync::mpsc::{self, TryRecvError};
use std::thread;

use log::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::thermal::{
    detect_thermal_circles_in_climbs, ClimbRange, DetectThermalCirclesConfig, ThermalCircle,
};
use crate::FixPoint;

/// Output of one detection job.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalResult {
    /// Correlation id returned by [`ThermalWorker::submit`]
    pub request_id: u64,
    pub circles: Vec<ThermalCircle>,
}

struct ThermalRequest {
    id: u64,
    fixes: Vec<FixPoint>,
    climbs: Vec<ClimbRange>,
    config: DetectThermalCirclesConfig,
}

/// Handle to a background thermal detection thread.
///
/// Dropping the handle closes the request channel and joins the thread
/// after its current job.
pub struct ThermalWorker {
    requests: Option<mpsc::Sender<ThermalRequest>>,
    results: mpsc::Receiver<ThermalResult>,
    thread: Option<thread::JoinHandle<()>>,
    next_id: u64,
    /// Newest submitted id whose result has not been handed out yet
    pending: Option<u64>,
}

impl ThermalWorker {
    /// Start the detection thread.
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = mpsc::channel::<ThermalRequest>();
        let (result_tx, result_rx) = mpsc::channel();

        let thread = thread::spawn(move || {
            while let Ok(mut request) = request_rx.recv() {
                // Only the newest queued request matters
                while let Ok(newer) = request_rx.try_recv() {
                    debug!("[ThermalWorker] Skipping superseded request {}", request.id);
                    request = newer;
                }

                let circles =
                    detect_thermal_circles_in_climbs(&request.fixes, &request.climbs, &request.config);
                info!(
                    "[ThermalWorker] Request {} done: {} circles",
                    request.id,
                    circles.len()
                );

                let result = ThermalResult {
                    request_id: request.id,
                    circles,
                };
                if result_tx.send(result).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: Some(request_tx),
            results: result_rx,
            thread: Some(thread),
            next_id: 1,
            pending: None,
        }
    }

    /// Queue a detection job. Returns its correlation id.
    ///
    /// Ids increase monotonically; the newest id supersedes all earlier ones.
    pub fn submit(
        &mut self,
        fixes: Vec<FixPoint>,
        climbs: Vec<ClimbRange>,
        config: DetectThermalCirclesConfig,
    ) -> Result<u64> {
        let id = self.next_id;
        let request = ThermalRequest {
            id,
            fixes,
            climbs,
            config,
        };

        self.requests
            .as_ref()
            .ok_or(AnalysisError::WorkerDisconnected)?
            .send(request)
            .map_err(|_| AnalysisError::WorkerDisconnected)?;

        self.next_id += 1;
        self.pending = Some(id);
        Ok(id)
    }

    /// Id of the newest submission still awaiting its result.
    pub fn pending_request(&self) -> Option<u64> {
        self.pending
    }

    /// Non-blocking: the newest job's result if it has arrived.
    ///
    /// Results for superseded ids are discarded. `Ok(None)` when nothing
    /// is pending or the newest job is still running.
    pub fn try_latest(&mut self) -> Result<Option<ThermalResult>> {
        while let Some(wanted) = self.pending {
            match self.results.try_recv() {
                Ok(result) => {
                    if let Some(result) = self.accept(wanted, result) {
                        return Ok(Some(result));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(AnalysisError::WorkerDisconnected),
            }
        }
        Ok(None)
    }

    /// Blocking: wait for the newest job's result.
    ///
    /// `Ok(None)` when nothing is pending.
    pub fn recv_latest(&mut self) -> Result<Option<ThermalResult>> {
        while let Some(wanted) = self.pending {
            let result = self
                .results
                .recv()
                .map_err(|_| AnalysisError::WorkerDisconnected)?;
            if let Some(result) = self.accept(wanted, result) {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    fn accept(&mut self, wanted: u64, result: ThermalResult) -> Option<ThermalResult> {
        if result.request_id == wanted {
            self.pending = None;
            Some(result)
        } else {
            debug!(
                "[ThermalWorker] Discarding stale result {} (waiting for {})",
                result.request_id, wanted
            );
            None
        }
    }
}

impl Default for ThermalWorker {
    fn default() -> Self {
        Self::spawn()
    }
}

impl Drop for ThermalWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the thread loop
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
