//! Nearest-branch resolution state machine.
//!
//! Status starts at `loading`. On [`NearestBranchResolver::mount`] the
//! permission grant decides whether a position is requested straight away
//! (`granted`, or no way to ask), held back until the user opts in
//! (`prompt`), or skipped entirely (`denied`). Every failure settles on the
//! head office with no distance.
//!
//! Each state-changing step takes a new generation number. A position result
//! only lands if its generation is still current, so a slow fix can never
//! overwrite a newer outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tas_core::{Coordinates, Office, OfficeDirectory};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::capability::{
    PermissionSource, PermissionState, PositionOptions, PositionSource, SessionStore,
    DISMISSED_KEY,
};
use crate::error::LocateError;
use crate::status::{LocationStatus, Resolution};

pub struct NearestBranchResolver<P, Q, S> {
    offices: OfficeDirectory,
    position: Option<P>,
    permissions: Option<Q>,
    session: S,
    options: PositionOptions,
    state: watch::Sender<Resolution>,
    generation: AtomicU64,
}

impl<P, Q, S> NearestBranchResolver<P, Q, S>
where
    P: PositionSource,
    Q: PermissionSource,
    S: SessionStore,
{
    /// `None` for `position` or `permissions` means the platform lacks that
    /// capability; use [`crate::Unsupported`] as the type parameter.
    pub fn new(
        offices: OfficeDirectory,
        position: Option<P>,
        permissions: Option<Q>,
        session: S,
    ) -> Self {
        let (state, _) = watch::channel(Resolution::default());
        Self {
            offices,
            position,
            permissions,
            session,
            options: PositionOptions::default(),
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Like [`NearestBranchResolver::new`] but from a raw office list.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::EmptyOfficeList`] if `offices` is empty.
    pub fn try_new(
        offices: Vec<Office>,
        position: Option<P>,
        permissions: Option<Q>,
        session: S,
    ) -> Result<Self, LocateError> {
        let offices = OfficeDirectory::new(offices)?;
        Ok(Self::new(offices, position, permissions, session))
    }

    #[must_use]
    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn offices(&self) -> &OfficeDirectory {
        &self.offices
    }

    #[must_use]
    pub fn snapshot(&self) -> Resolution {
        self.state.borrow().clone()
    }

    /// Receiver that observes every change to the exposed [`Resolution`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.state.subscribe()
    }

    /// Run the initial permission check and, where allowed, the first lookup.
    ///
    /// The permission answer only applies if nothing else changed the state
    /// while the query was pending.
    pub async fn mount(&self) {
        let dismissed = self
            .session
            .get(DISMISSED_KEY)
            .is_some_and(|v| !v.is_empty());
        let generation = self.begin(|r| r.dismissed = dismissed);

        if self.position.is_none() {
            tracing::debug!("no position capability on this platform");
            self.settle_on_head_office(LocationStatus::Unavailable);
            return;
        }

        let Some(permissions) = &self.permissions else {
            self.request_location(None).await;
            return;
        };

        match permissions.query().await {
            Ok(PermissionState::Prompt) => {
                self.settle_if_current(generation, LocationStatus::Prompt);
            }
            Ok(PermissionState::Denied) => {
                self.settle_if_current(generation, LocationStatus::Denied);
            }
            Ok(PermissionState::Granted) => self.request_location(Some(generation)).await,
            Err(err) => {
                tracing::debug!(error = %err, "requesting position without a permission answer");
                self.request_location(Some(generation)).await;
            }
        }
    }

    /// User asked to share their location.
    pub async fn enable_location(&self) {
        self.request_location(None).await;
    }

    /// Hide the prompt/denied banners for the rest of the session.
    pub fn dismiss(&self) {
        self.session.set(DISMISSED_KEY, "true");
        self.state.send_modify(|r| r.dismissed = true);
    }

    /// React to a permission grant reported after mount.
    ///
    /// An undecided grant leaves the current state alone.
    pub async fn on_permission_change(&self, state: PermissionState) {
        match state {
            PermissionState::Granted => self.request_location(None).await,
            PermissionState::Denied => self.settle_on_head_office(LocationStatus::Denied),
            PermissionState::Prompt => {}
        }
    }

    /// Start an acquisition. With `after`, only start if that generation is
    /// still the latest one.
    async fn request_location(&self, after: Option<u64>) {
        let Some(position) = &self.position else {
            self.settle_on_head_office(LocationStatus::Unavailable);
            return;
        };

        let Some(generation) = self.begin_after(after, |r| {
            r.status = LocationStatus::Loading;
            r.distance_km = None;
        }) else {
            tracing::debug!(?after, "permission answer superseded; not requesting position");
            return;
        };

        let applied = match self.acquire(position).await {
            Ok(point) => {
                let (office, km) = self.offices.nearest(point);
                let office = office.clone();
                tracing::debug!(office = %office.id, distance_km = km, "nearest office resolved");
                self.finish(generation, |r| {
                    r.status = LocationStatus::Granted;
                    r.office = Some(office);
                    r.distance_km = Some(km);
                })
            }
            Err(err) => {
                tracing::info!(error = %err, "location lookup failed; using head office");
                let status = err.status();
                let head = self.offices.head_office().clone();
                self.finish(generation, |r| {
                    r.status = status;
                    r.office = Some(head);
                    r.distance_km = None;
                })
            }
        };

        if !applied {
            tracing::debug!(generation, "discarding superseded location result");
        }
    }

    async fn acquire(&self, position: &P) -> Result<Coordinates, LocateError> {
        let request = position.current_position(self.options);
        match tokio::time::timeout(self.options.timeout, request).await {
            Ok(Ok(point)) if point.is_valid() => Ok(point),
            Ok(Ok(point)) => Err(LocateError::PositionUnavailable(format!(
                "invalid coordinates ({}, {})",
                point.lat, point.lng
            ))),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(LocateError::AcquisitionTimeout),
        }
    }

    fn settle_on_head_office(&self, status: LocationStatus) {
        let head = self.offices.head_office().clone();
        self.begin(|r| {
            r.status = status;
            r.office = Some(head);
            r.distance_km = None;
        });
        tracing::debug!(%status, "settled on head office");
    }

    /// Settle on the head office with `status` unless `generation` is stale.
    fn settle_if_current(&self, generation: u64, status: LocationStatus) {
        let head = self.offices.head_office().clone();
        let applied = self.finish(generation, |r| {
            r.status = status;
            r.office = Some(head);
            r.distance_km = None;
        });
        if applied {
            tracing::debug!(%status, "settled on head office");
        } else {
            tracing::debug!(%status, generation, "discarding superseded permission answer");
        }
    }

    /// Start a new generation and apply `update`. Any result still in flight
    /// from an older generation will be dropped.
    fn begin(&self, update: impl FnOnce(&mut Resolution)) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|r| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            update(r);
        });
        generation
    }

    /// Like [`Self::begin`], but when `after` is set the new generation is
    /// only taken if `after` is still the latest one. Returns `None` otherwise.
    fn begin_after(
        &self,
        after: Option<u64>,
        update: impl FnOnce(&mut Resolution),
    ) -> Option<u64> {
        let mut started = None;
        self.state.send_if_modified(|r| {
            let current = self.generation.load(Ordering::SeqCst);
            if after.is_some_and(|g| g != current) {
                return false;
            }
            self.generation.store(current + 1, Ordering::SeqCst);
            update(r);
            started = Some(current + 1);
            true
        });
        started
    }

    /// Apply `update` only if `generation` is still the latest one.
    fn finish(&self, generation: u64, update: impl FnOnce(&mut Resolution)) -> bool {
        self.state.send_if_modified(|r| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            update(r);
            true
        })
    }
}

impl<P, Q, S> NearestBranchResolver<P, Q, S>
where
    P: PositionSource + 'static,
    Q: PermissionSource + 'static,
    S: SessionStore + 'static,
{
    /// Follow permission changes for as long as the platform reports them.
    ///
    /// Returns `None` when there is no permission source or it cannot be
    /// observed.
    pub fn spawn_permission_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut changes = self.permissions.as_ref()?.subscribe()?;
        let resolver = Arc::clone(self);

        Some(tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let state = *changes.borrow_and_update();
                tracing::debug!(?state, "location permission changed");
                resolver.on_permission_change(state).await;
            }
        }))
    }
}
