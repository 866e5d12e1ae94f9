//! Trip progress engine
//!
//! Owns the trip state machine (Idle -> Active -> {Stopped, Completed};
//! Stopped/Completed -> Idle via reset), consumes position fixes and
//! resolver/estimator results, and emits progress events on a broadcast
//! channel. All collaborators are injected; the engine holds no global
//! state.
//!
//! Command concurrency: at most one `start_trip` / `update_next_stop` is in
//! flight at a time, guarded by an atomic busy flag; a second concurrent
//! call fails with `OperationInProgress`. Fixes arriving while a command is
//! in flight are dropped - the pending command reseeds state with a fresh
//! position on completion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use domain::entities::{NextStopLeg, Trip, TripSnapshot, TripStatus};
use domain::events::{
    EtaReport, LocationErrorKind, NextStopProgress, ProgressUpdate, TripEvent,
};
use domain::value_objects::{PositionFix, SpeedHistory, SpeedSample};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{PositionEvent, PositionPort, TripStorePort};
use crate::services::{AddressResolver, RouteEstimator};

use super::eta::{self, EtaContext, format_eta_minutes};
use super::progress;

/// Tunable engine constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remaining distance below which the destination counts as reached (km)
    #[serde(default = "default_arrival_threshold_km")]
    pub arrival_threshold_km: f64,

    /// Distance to the stop below which the stop counts as reached (km)
    #[serde(default = "default_next_stop_threshold_km")]
    pub next_stop_threshold_km: f64,

    /// Minimum inter-fix displacement for a speed sample (km)
    #[serde(default = "default_min_movement_km")]
    pub min_movement_km: f64,

    /// Upper bound of the plausible speed band (km/h)
    #[serde(default = "default_max_plausible_speed_kmh")]
    pub max_plausible_speed_kmh: f64,

    /// Speed samples required before nonzero progress is reported
    #[serde(default = "default_min_speed_samples")]
    pub min_speed_samples_for_progress: usize,

    /// Bound of the speed history
    #[serde(default = "default_speed_history_limit")]
    pub speed_history_limit: usize,

    /// Persist a snapshot every N accepted fixes
    #[serde(default = "default_snapshot_every_fixes")]
    pub snapshot_every_fixes: u32,

    /// Capacity of the event broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

const fn default_arrival_threshold_km() -> f64 {
    0.05
}

const fn default_next_stop_threshold_km() -> f64 {
    0.05
}

const fn default_min_movement_km() -> f64 {
    0.001
}

const fn default_max_plausible_speed_kmh() -> f64 {
    200.0
}

const fn default_min_speed_samples() -> usize {
    2
}

const fn default_speed_history_limit() -> usize {
    10
}

const fn default_snapshot_every_fixes() -> u32 {
    5
}

const fn default_event_buffer() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_km: default_arrival_threshold_km(),
            next_stop_threshold_km: default_next_stop_threshold_km(),
            min_movement_km: default_min_movement_km(),
            max_plausible_speed_kmh: default_max_plausible_speed_kmh(),
            min_speed_samples_for_progress: default_min_speed_samples(),
            speed_history_limit: default_speed_history_limit(),
            snapshot_every_fixes: default_snapshot_every_fixes(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Observable engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No trip
    Idle,
    /// Tracking
    Active,
    /// Paused, state retained
    Stopped,
    /// Arrived, state retained until reset
    Completed,
}

#[derive(Debug, Default)]
struct EngineState {
    trip: Option<Trip>,
    last_fix: Option<PositionFix>,
    fixes_since_snapshot: u32,
    tracking: Option<JoinHandle<()>>,
}

/// Side effects computed under the state lock, executed after release
struct FixOutcome {
    events: Vec<TripEvent>,
    snapshot: Option<TripSnapshot>,
    completed: bool,
}

/// RAII guard for the single-command-in-flight rule
struct CommandGuard<'a>(&'a AtomicBool);

impl Drop for CommandGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The trip progress engine
pub struct TripProgressEngine {
    resolver: AddressResolver,
    routes: RouteEstimator,
    positions: Arc<dyn PositionPort>,
    store: Arc<dyn TripStorePort>,
    config: EngineConfig,
    state: Mutex<EngineState>,
    busy: AtomicBool,
    position_fatal: AtomicBool,
    events: broadcast::Sender<TripEvent>,
}

impl std::fmt::Debug for TripProgressEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripProgressEngine")
            .field("status", &self.status())
            .field("busy", &self.busy.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl TripProgressEngine {
    /// Create an engine with injected collaborators
    #[must_use]
    pub fn new(
        resolver: AddressResolver,
        routes: RouteEstimator,
        positions: Arc<dyn PositionPort>,
        store: Arc<dyn TripStorePort>,
        config: EngineConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            resolver,
            routes,
            positions,
            store,
            config,
            state: Mutex::new(EngineState::default()),
            busy: AtomicBool::new(false),
            position_fatal: AtomicBool::new(false),
            events,
        }
    }

    /// Subscribe to engine events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TripEvent> {
        self.events.subscribe()
    }

    /// Current engine status
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        match self.state.lock().trip.as_ref().map(|trip| trip.status) {
            None => EngineStatus::Idle,
            Some(TripStatus::Active) => EngineStatus::Active,
            Some(TripStatus::Stopped) => EngineStatus::Stopped,
            Some(TripStatus::Completed) => EngineStatus::Completed,
        }
    }

    /// Snapshot of the current trip state, if any
    #[must_use]
    pub fn current_trip(&self) -> Option<Trip> {
        self.state.lock().trip.clone()
    }

    /// Start tracking a trip to `destination_address`
    ///
    /// A failing optional next-stop geocode is non-fatal: the trip starts
    /// without a stop and a warning is logged. Any other resolver, router,
    /// or position failure aborts the start and leaves the engine Idle.
    #[instrument(skip(self))]
    pub async fn start_trip(
        self: &Arc<Self>,
        destination_address: &str,
        next_stop_address: Option<&str>,
    ) -> Result<Trip, ApplicationError> {
        if self.position_fatal.load(Ordering::Acquire) {
            return Err(ApplicationError::PositionPermissionDenied);
        }
        let _guard = self.acquire_command_slot()?;
        if self.state.lock().trip.is_some() {
            return Err(ApplicationError::AlreadyActive);
        }

        let fix = self.positions.current_position().await?;
        let destination = self.resolver.resolve(destination_address).await?;

        let next_stop = match next_stop_address {
            Some(address) if !address.trim().is_empty() => {
                match self.resolver.resolve(address).await {
                    Ok(place) => Some(place),
                    Err(err) => {
                        warn!(
                            error = %err,
                            "Next-stop geocoding failed; starting trip without a stop"
                        );
                        None
                    },
                }
            },
            _ => None,
        };

        let route = self
            .routes
            .estimate(&fix.location, &destination.location)
            .await?;

        let mut trip = Trip::new(fix.location, destination, route, fix.timestamp);
        trip.speed_history = SpeedHistory::with_limit(self.config.speed_history_limit);
        if let Some(place) = next_stop {
            let leg_estimate = match self
                .routes
                .estimate(&fix.location, &place.location)
                .await
            {
                Ok(estimate) => Some(estimate),
                Err(err) => {
                    warn!(
                        error = %err,
                        "Next-stop route estimate failed; falling back to straight-line"
                    );
                    None
                },
            };
            trip.next_stop = Some(NextStopLeg::at_start(place, trip.origin, leg_estimate));
        }

        {
            let mut state = self.state.lock();
            state.trip = Some(trip.clone());
            state.last_fix = Some(fix);
            state.fixes_since_snapshot = 0;
        }

        if let Err(err) = self.spawn_tracking().await {
            let mut state = self.state.lock();
            state.trip = None;
            state.last_fix = None;
            return Err(err);
        }

        self.persist(TripSnapshot::new(trip.clone(), fix.timestamp)).await;

        let eta = trip.route_estimate.duration_minutes.map(|minutes| EtaReport {
            minutes,
            display: format_eta_minutes(minutes),
        });
        let _ = self.events.send(TripEvent::ProgressUpdate(ProgressUpdate {
            progress_percent: 0.0,
            distance_traveled_km: 0.0,
            remaining_distance_km: trip.total_distance_km,
            total_distance_km: trip.total_distance_km,
            eta,
        }));

        info!(
            destination = %trip.destination.label,
            total_km = trip.total_distance_km,
            has_stop = trip.next_stop.is_some(),
            "Trip started"
        );
        Ok(trip)
    }

    /// Resume a previously persisted trip after a restart
    #[instrument(skip(self))]
    pub async fn resume_trip(self: &Arc<Self>) -> Result<Trip, ApplicationError> {
        let _guard = self.acquire_command_slot()?;
        if self.state.lock().trip.is_some() {
            return Err(ApplicationError::AlreadyActive);
        }

        let Some(snapshot) = self.store.load().await? else {
            return Err(ApplicationError::NoActiveTrip);
        };
        if !snapshot.is_current_version() || snapshot.trip.status.is_completed() {
            warn!(
                schema_version = snapshot.schema_version,
                status = %snapshot.trip.status,
                "Discarding unusable trip snapshot"
            );
            if let Err(err) = self.store.clear().await {
                warn!(error = %err, "Failed to clear stale trip snapshot");
            }
            return Err(ApplicationError::NoActiveTrip);
        }

        let mut trip = snapshot.trip;
        trip.status = TripStatus::Active;
        {
            let mut state = self.state.lock();
            state.trip = Some(trip.clone());
            state.last_fix = None;
            state.fixes_since_snapshot = 0;
        }

        if let Err(err) = self.spawn_tracking().await {
            let mut state = self.state.lock();
            state.trip = None;
            return Err(err);
        }

        let _ = self.events.send(TripEvent::ProgressUpdate(ProgressUpdate {
            progress_percent: progress::progress_percent(
                trip.total_distance_km,
                trip.remaining_distance_km,
            ),
            distance_traveled_km: trip.distance_traveled_km,
            remaining_distance_km: trip.remaining_distance_km,
            total_distance_km: trip.total_distance_km,
            eta: None,
        }));

        info!(destination = %trip.destination.label, "Trip resumed");
        Ok(trip)
    }

    /// Ingest one position fix
    ///
    /// No-op unless a trip exists and is active. Fixes arriving while a
    /// command is in flight are dropped.
    pub async fn on_position(&self, fix: PositionFix) {
        if self.busy.load(Ordering::Acquire) {
            debug!("Dropping position fix while a command is in flight");
            return;
        }

        let outcome = {
            let mut guard = self.state.lock();
            self.apply_fix(&mut guard, fix)
        };
        let Some(outcome) = outcome else { return };

        for event in &outcome.events {
            let _ = self.events.send(event.clone());
        }
        if outcome.completed {
            if let Err(err) = self.store.clear().await {
                warn!(error = %err, "Failed to clear snapshot after completion");
            }
            info!("Trip complete");
        } else if let Some(snapshot) = outcome.snapshot {
            self.persist(snapshot).await;
        }
    }

    /// Set or replace the intermediate stop during an active trip
    ///
    /// A geocoding failure leaves the previous stop untouched. A routing
    /// failure degrades the leg to a straight-line total.
    #[instrument(skip(self))]
    pub async fn update_next_stop(&self, address: &str) -> Result<Trip, ApplicationError> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(ApplicationError::InvalidAddress);
        }
        if !self
            .state
            .lock()
            .trip
            .as_ref()
            .is_some_and(Trip::is_active)
        {
            return Err(ApplicationError::NoActiveTrip);
        }
        let _guard = self.acquire_command_slot()?;

        let fix = self.positions.current_position().await?;
        let place = self.resolver.resolve(trimmed).await?;
        let leg_estimate = match self
            .routes
            .estimate(&fix.location, &place.location)
            .await
        {
            Ok(estimate) => Some(estimate),
            Err(err) => {
                warn!(
                    error = %err,
                    "Stop-leg route estimate failed; falling back to straight-line"
                );
                None
            },
        };

        let (trip, event) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let trip = state
                .trip
                .as_mut()
                .filter(|trip| trip.is_active())
                .ok_or(ApplicationError::NoActiveTrip)?;

            let leg = NextStopLeg::mid_trip(place, fix.location, leg_estimate);
            let stop = progress::next_stop_progress(&leg, Some(&fix.location));
            let eta = eta::estimate_eta(&EtaContext {
                remaining_km: stop.distance_to_stop_km,
                leg_total_km: stop.leg_total_km,
                route: leg.route_estimate.as_ref(),
                speed_history: &trip.speed_history,
                trip_distance_traveled_km: trip.distance_traveled_km,
                trip_elapsed_minutes: trip.elapsed_minutes(fix.timestamp),
                now: fix.timestamp,
            });
            trip.next_stop = Some(leg);
            state.last_fix = Some(fix);

            let event = TripEvent::NextStopProgress(NextStopProgress {
                progress_percent: stop.percent,
                distance_to_stop_km: stop.distance_to_stop_km,
                eta: Some(eta),
                reached: stop.distance_to_stop_km <= self.config.next_stop_threshold_km,
            });
            (trip.clone(), event)
        };

        let _ = self.events.send(event);
        self.persist(TripSnapshot::new(trip.clone(), fix.timestamp)).await;
        info!(
            stop = %trip.next_stop.as_ref().map_or("", |leg| leg.place.label.as_str()),
            "Next stop updated"
        );
        Ok(trip)
    }

    /// Remove the intermediate stop; later fixes emit no stop progress
    pub async fn clear_next_stop(&self) {
        let snapshot = {
            let mut state = self.state.lock();
            let Some(trip) = state.trip.as_mut() else {
                return;
            };
            if trip.next_stop.take().is_none() {
                return;
            }
            Some(TripSnapshot::new(trip.clone(), Utc::now()))
        };
        if let Some(snapshot) = snapshot {
            self.persist(snapshot).await;
        }
        info!("Next stop cleared");
    }

    /// Pause tracking, retaining trip state
    #[instrument(skip(self))]
    pub async fn stop_trip(&self) -> Result<(), ApplicationError> {
        let (handle, snapshot) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let trip = state.trip.as_mut().ok_or(ApplicationError::NoActiveTrip)?;
            if !trip.is_active() {
                return Err(ApplicationError::NoActiveTrip);
            }
            trip.status = TripStatus::Stopped;
            (
                state.tracking.take(),
                TripSnapshot::new(trip.clone(), Utc::now()),
            )
        };
        if let Some(handle) = handle {
            handle.abort();
        }
        self.positions.stop_tracking().await;
        self.persist(snapshot).await;
        info!("Trip stopped");
        Ok(())
    }

    /// Clear all trip state and the persisted snapshot; always succeeds
    #[instrument(skip(self))]
    pub async fn reset_trip(&self) {
        let handle = {
            let mut state = self.state.lock();
            state.trip = None;
            state.last_fix = None;
            state.fixes_since_snapshot = 0;
            state.tracking.take()
        };
        if let Some(handle) = handle {
            handle.abort();
        }
        self.positions.stop_tracking().await;
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "Failed to clear trip snapshot");
        }
        info!("Trip reset");
    }

    fn acquire_command_slot(&self) -> Result<CommandGuard<'_>, ApplicationError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(CommandGuard(&self.busy))
        } else {
            Err(ApplicationError::OperationInProgress)
        }
    }

    async fn spawn_tracking(self: &Arc<Self>) -> Result<(), ApplicationError> {
        let mut receiver = self.positions.start_tracking().await?;
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match event {
                    PositionEvent::Fix(fix) => engine.on_position(fix).await,
                    PositionEvent::Error(kind) => engine.on_location_error(kind),
                }
                if !engine.tracking_wanted() {
                    break;
                }
            }
            engine.positions.stop_tracking().await;
        });
        self.state.lock().tracking = Some(handle);
        Ok(())
    }

    fn tracking_wanted(&self) -> bool {
        self.state.lock().trip.as_ref().is_some_and(Trip::is_active)
    }

    fn on_location_error(&self, kind: LocationErrorKind) {
        if kind.is_fatal() && self.position_fatal.swap(true, Ordering::AcqRel) {
            // Fatal errors are surfaced once, not repeated
            return;
        }
        warn!(kind = %kind, "Location error");
        let _ = self.events.send(TripEvent::LocationError(kind));
    }

    /// Core per-fix computation; runs under the state lock, no I/O
    fn apply_fix(&self, guard: &mut EngineState, fix: PositionFix) -> Option<FixOutcome> {
        let state = &mut *guard;
        let trip = state.trip.as_mut()?;
        if !trip.is_active() {
            return None;
        }

        if let Some(previous) = &state.last_fix {
            if let Some(speed) =
                progress::instantaneous_speed_kmh(previous, &fix, self.config.min_movement_km)
            {
                if speed > 0.0 && speed < self.config.max_plausible_speed_kmh {
                    trip.speed_history.push(SpeedSample::new(speed, fix.timestamp));
                } else {
                    debug!(speed_kmh = speed, "Rejected implausible speed sample");
                }
            }
        }
        state.last_fix = Some(fix);

        let remaining =
            progress::remaining_distance_km(&fix.location, &trip.destination.location);
        let traveled = progress::distance_traveled_km(trip.total_distance_km, remaining);
        trip.remaining_distance_km = remaining;
        trip.distance_traveled_km = traveled;

        let mut events = Vec::with_capacity(3);

        if remaining <= self.config.arrival_threshold_km {
            trip.status = TripStatus::Completed;
            trip.remaining_distance_km = 0.0;
            trip.distance_traveled_km = trip.total_distance_km;
            events.push(TripEvent::TripComplete(Box::new(trip.clone())));
            events.push(TripEvent::ProgressUpdate(ProgressUpdate {
                progress_percent: 100.0,
                distance_traveled_km: trip.total_distance_km,
                remaining_distance_km: 0.0,
                total_distance_km: trip.total_distance_km,
                eta: None,
            }));
            return Some(FixOutcome {
                events,
                snapshot: None,
                completed: true,
            });
        }

        if let Some(leg) = &trip.next_stop {
            let stop = progress::next_stop_progress(leg, Some(&fix.location));
            let eta = eta::estimate_eta(&EtaContext {
                remaining_km: stop.distance_to_stop_km,
                leg_total_km: stop.leg_total_km,
                route: leg.route_estimate.as_ref(),
                speed_history: &trip.speed_history,
                trip_distance_traveled_km: traveled,
                trip_elapsed_minutes: trip.elapsed_minutes(fix.timestamp),
                now: fix.timestamp,
            });
            events.push(TripEvent::NextStopProgress(NextStopProgress {
                progress_percent: stop.percent,
                distance_to_stop_km: stop.distance_to_stop_km,
                eta: Some(eta),
                reached: stop.distance_to_stop_km <= self.config.next_stop_threshold_km,
            }));
        }

        // A single noisy first fix must not fake progress
        let percent = if trip.speed_history.len() < self.config.min_speed_samples_for_progress {
            0.0
        } else {
            progress::progress_percent(trip.total_distance_km, remaining)
        };
        let eta = eta::estimate_eta(&EtaContext {
            remaining_km: remaining,
            leg_total_km: trip.total_distance_km,
            route: Some(&trip.route_estimate),
            speed_history: &trip.speed_history,
            trip_distance_traveled_km: traveled,
            trip_elapsed_minutes: trip.elapsed_minutes(fix.timestamp),
            now: fix.timestamp,
        });
        events.push(TripEvent::ProgressUpdate(ProgressUpdate {
            progress_percent: percent,
            distance_traveled_km: traveled,
            remaining_distance_km: remaining,
            total_distance_km: trip.total_distance_km,
            eta: Some(eta),
        }));

        state.fixes_since_snapshot += 1;
        let snapshot = if state.fixes_since_snapshot >= self.config.snapshot_every_fixes {
            state.fixes_since_snapshot = 0;
            Some(TripSnapshot::new(trip.clone(), fix.timestamp))
        } else {
            None
        };

        Some(FixOutcome {
            events,
            snapshot,
            completed: false,
        })
    }

    async fn persist(&self, snapshot: TripSnapshot) {
        if let Err(err) = self.store.save(&snapshot).await {
            warn!(error = %err, "Failed to persist trip snapshot");
        }
    }
}
