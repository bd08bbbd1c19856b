// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Transition orchestration.
//!
//! `ControlCore` owns the property store and is its only writer. Every
//! external request runs probe-snapshot → validate → write → commit. A
//! property moves Idle → Validating → Writing → Idle; the claim registry
//! below is what enforces "one in-flight mutation per property": a request
//! claims its property (and the cleared property of a joint request, in tag
//! order) before validating, or fails fast with `Busy`. Cancellation is
//! honored only before the write begins — once a physical write sequence
//! starts it runs to completion or rollback.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::config::{PlatformConfig, PolicyEppLink};
use crate::error::{PlatformError, Result, WriteError};
use crate::probe::{HardwareProbe, SysfsProbe};
use crate::properties::{
    CapabilitySet, ChangeEvent, ChangeOutcome, PptSet, Property, PropertyState, PropertyValue,
    Transition, TransitionRequest,
};
use crate::store::PropertyStore;
use crate::validate::TransitionValidator;
use crate::writer::{self, HardwareWriter, SysfsWriter};

/// Capacity of the change-notification channel. Slow subscribers observe a
/// lag error rather than blocking transitions.
const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct ControlCore {
    probe: Arc<dyn HardwareProbe>,
    writer: Arc<dyn HardwareWriter>,
    /// Capability snapshot; replaced atomically by `refresh()`. In-flight
    /// validations keep the `Arc` they started with, so a refresh never
    /// tears a running validation.
    caps: RwLock<Arc<CapabilitySet>>,
    store: Mutex<PropertyStore>,
    in_flight: Mutex<BTreeSet<Property>>,
    events: broadcast::Sender<ChangeEvent>,
    policy_epp: PolicyEppLink,
}

impl std::fmt::Debug for ControlCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlCore").finish_non_exhaustive()
    }
}

/// Removes the claimed properties from the in-flight registry on every exit
/// path.
struct ClaimGuard<'a> {
    core: &'a ControlCore,
    props: Vec<Property>,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.core.in_flight.lock().unwrap();
        for property in &self.props {
            in_flight.remove(property);
        }
    }
}

impl ControlCore {
    /// Boot the core against the real sysfs surfaces.
    pub async fn new(config: &PlatformConfig) -> Result<Self> {
        let probe = Arc::new(SysfsProbe::new(
            config.sysfs_root.clone(),
            Duration::from_millis(config.probe_timeout_ms),
        ));
        let writer = Arc::new(SysfsWriter::from_config(config));
        Self::with_parts(probe, writer, config.policy_epp).await
    }

    /// Boot the core with explicit probe/writer implementations.
    pub async fn with_parts(
        probe: Arc<dyn HardwareProbe>,
        writer: Arc<dyn HardwareWriter>,
        policy_epp: PolicyEppLink,
    ) -> Result<Self> {
        let report = probe.detect().await?;
        info!(
            supported = report.caps.supported().len(),
            "control core starting"
        );

        let mut store = PropertyStore::new();
        store.seed(report.values);

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            probe,
            writer,
            caps: RwLock::new(Arc::new(report.caps)),
            store: Mutex::new(store),
            in_flight: Mutex::new(BTreeSet::new()),
            events,
            policy_epp,
        })
    }

    /// The full wire domain of properties. Hardware support is reported
    /// separately by [`Self::capabilities`].
    pub fn list_properties(&self) -> Vec<Property> {
        Property::ALL.to_vec()
    }

    /// Current capability snapshot.
    pub async fn capabilities(&self) -> Arc<CapabilitySet> {
        self.caps.read().await.clone()
    }

    /// Last-known state of a property. Never fails.
    pub fn state(&self, property: Property) -> PropertyState {
        self.store.lock().unwrap().get(property)
    }

    /// Subscribe to change notifications. Late subscribers receive only
    /// future events.
    pub fn subscribe(&self) -> BroadcastStream<ChangeEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    /// Re-run hardware detection and atomically swap the capability set.
    /// Does not touch the property store.
    pub async fn refresh(&self) -> Result<()> {
        let report = self.probe.detect().await?;
        *self.caps.write().await = Arc::new(report.caps);
        info!("capability set refreshed");
        Ok(())
    }

    /// Re-read one property from hardware and commit the fresh value,
    /// clearing any stale mark left by a partial failure.
    pub async fn reread(&self, property: Property) -> Result<PropertyState> {
        let _claim = self.claim(&[property])?;
        let value = self.writer.read(property).await?;
        let state = self.store.lock().unwrap().reseed(property, value);
        debug!(%property, value = %value, "state re-read from hardware");
        Ok(state)
    }

    /// Arbitrate and apply one requested change.
    pub async fn request_change(&self, request: TransitionRequest) -> Result<Transition> {
        if request.clear == Some(request.property) {
            return Err(PlatformError::Rejected(
                crate::error::Rejection::ConflictingState {
                    property: request.property,
                    with: request.property,
                    reason: "clearing side-effect targets the requested property".into(),
                },
            ));
        }

        let mut claim_props = vec![request.property];
        claim_props.extend(request.clear);
        // Rule-4 partners are held too: their current value feeds conflict
        // validation, so they must not commit until this transition settles.
        claim_props.extend_from_slice(TransitionValidator::interacting(request.property));
        let _claim = self.claim(&claim_props)?;

        let caps = self.capabilities().await;

        // Validating.
        let (prior, prior_clear) = {
            let store = self.store.lock().unwrap();
            TransitionValidator::validate(&request, &caps, &store)
                .map_err(PlatformError::Rejected)?;
            let prior_clear = request.clear.map(|clear| (clear, store.get(clear)));
            (store.get(request.property), prior_clear)
        };

        // Idempotent no-op: the hardware already holds this value.
        if !request.force
            && request.clear.is_none()
            && !prior.stale
            && prior.value == Some(request.value)
        {
            debug!(property = %request.property, "no-op transition, hardware untouched");
            return Ok(Transition {
                property: request.property,
                state: prior,
                cleared: None,
            });
        }

        // Writing.
        match prior_clear {
            Some((clear, clear_prior)) => {
                self.joint_transition(&request, prior, clear, clear_prior)
                    .await
            }
            None => self.single_transition(&request, prior, &caps).await,
        }
    }

    /// Apply the requested power limits as one logical grouped write.
    ///
    /// Every touched limit must be Idle; the group commits together or, on a
    /// failed step, rolls back together. An incomplete rollback marks every
    /// touched limit stale.
    pub async fn request_power_limits(
        &self,
        set: PptSet,
    ) -> Result<Vec<(Property, PropertyState)>> {
        let entries = set.entries();
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let props: Vec<Property> = entries.iter().map(|(p, _)| *p).collect();
        let _claim = self.claim(&props)?;

        let caps = self.capabilities().await;
        let priors: Vec<(Property, PropertyState)> = {
            let store = self.store.lock().unwrap();
            TransitionValidator::validate_ppt_set(&set, &caps)
                .map_err(PlatformError::Rejected)?;
            props.iter().map(|p| (*p, store.get(*p))).collect()
        };

        match writer::write_group(self.writer.as_ref(), &entries).await {
            Ok(()) => {
                let committed: Vec<(Property, PropertyState)> = {
                    let mut store = self.store.lock().unwrap();
                    let mut committed = Vec::with_capacity(entries.len());
                    for ((property, value), (_, prior)) in entries.iter().zip(&priors) {
                        committed.push((*property, store.set(*property, *value, prior.revision)?));
                    }
                    committed
                };
                for (property, state) in &committed {
                    self.emit(*property, state.clone(), ChangeOutcome::Applied);
                }
                Ok(committed)
            }
            Err(err @ WriteError::PartialFailure { .. }) => {
                let WriteError::PartialFailure { applied, failed } = &err else {
                    unreachable!()
                };
                let reason = err.to_string();
                let mut touched = applied.clone();
                touched.push(*failed);
                self.poison(&touched, &reason);
                Err(err.into())
            }
            Err(err) => {
                let state = self.state(err.property());
                self.emit(
                    err.property(),
                    state,
                    ChangeOutcome::Failed {
                        reason: err.to_string(),
                    },
                );
                Err(err.into())
            }
        }
    }

    /// Single-property write and commit.
    async fn single_transition(
        &self,
        request: &TransitionRequest,
        prior: PropertyState,
        caps: &CapabilitySet,
    ) -> Result<Transition> {
        match self.write_primary(request, caps).await {
            Ok(()) => {
                let state = {
                    let mut store = self.store.lock().unwrap();
                    store.set(request.property, request.value, prior.revision)?
                };
                self.emit(request.property, state.clone(), ChangeOutcome::Applied);
                Ok(Transition {
                    property: request.property,
                    state,
                    cleared: None,
                })
            }
            Err(err @ WriteError::PartialFailure { .. }) => {
                let reason = err.to_string();
                self.poison(&[request.property], &reason);
                Err(err.into())
            }
            Err(err) => {
                self.emit(
                    request.property,
                    prior,
                    ChangeOutcome::Failed {
                        reason: err.to_string(),
                    },
                );
                Err(err.into())
            }
        }
    }

    /// Joint transition with a clearing side-effect: the clear leg is
    /// written first (re-enabling the hardware the primary leg needs), the
    /// primary second. A failed primary rolls the clear leg back; if that
    /// rollback also fails, both properties are marked unknown.
    async fn joint_transition(
        &self,
        request: &TransitionRequest,
        prior: PropertyState,
        clear: Property,
        clear_prior: PropertyState,
    ) -> Result<Transition> {
        if let Err(err) = self.writer.write(clear, &PropertyValue::Bool(false)).await {
            // Nothing changed yet; a clean failure.
            self.emit(
                request.property,
                prior,
                ChangeOutcome::Failed {
                    reason: err.to_string(),
                },
            );
            return Err(err.into());
        }

        if let Err(primary_err) = self.writer.write(request.property, &request.value).await {
            let rollback_value = clear_prior.value.unwrap_or(PropertyValue::Bool(true));
            if self.writer.write(clear, &rollback_value).await.is_err() {
                warn!(property = %request.property, cleared = %clear, "joint rollback failed");
                let partial = WriteError::PartialFailure {
                    applied: vec![clear],
                    failed: request.property,
                };
                let reason = partial.to_string();
                self.poison(&[request.property, clear], &reason);
                return Err(partial.into());
            }
            // Both legs restored; prior states still hold.
            self.emit(
                request.property,
                prior,
                ChangeOutcome::Failed {
                    reason: primary_err.to_string(),
                },
            );
            return Err(primary_err.into());
        }

        let (state, cleared_state) = {
            let mut store = self.store.lock().unwrap();
            let state = store.set(request.property, request.value, prior.revision)?;
            let cleared_state =
                store.set(clear, PropertyValue::Bool(false), clear_prior.revision)?;
            (state, cleared_state)
        };
        self.emit(request.property, state.clone(), ChangeOutcome::Applied);
        self.emit(clear, cleared_state.clone(), ChangeOutcome::Applied);
        Ok(Transition {
            property: request.property,
            state,
            cleared: Some((clear, cleared_state)),
        })
    }

    /// The primary physical write; throttle-policy changes carry the linked
    /// EPP hint when the cpufreq surface supports it.
    async fn write_primary(
        &self,
        request: &TransitionRequest,
        caps: &CapabilitySet,
    ) -> std::result::Result<(), WriteError> {
        if request.property == Property::ThrottlePolicy && self.policy_epp.enabled {
            if let Some(policy) = request.value.as_throttle_policy() {
                let epp = self.policy_epp.epp_for(policy);
                let linked = caps.cpu.supports_epp(epp).then_some(epp);
                return writer::write_policy(self.writer.as_ref(), &request.value, linked).await;
            }
        }
        self.writer.write(request.property, &request.value).await
    }

    /// Claim properties for exclusive transition, or fail fast with `Busy`.
    /// Claims are recorded in `Property` tag order; admission of a multi-
    /// property claim is atomic under the registry lock.
    fn claim(&self, props: &[Property]) -> Result<ClaimGuard<'_>> {
        let mut sorted: Vec<Property> = props.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(busy) = sorted.iter().find(|p| in_flight.contains(p)) {
            return Err(PlatformError::Busy { property: *busy });
        }
        for property in &sorted {
            in_flight.insert(*property);
        }
        Ok(ClaimGuard {
            core: self,
            props: sorted,
        })
    }

    /// Mark properties unknown after an incomplete rollback and notify
    /// subscribers.
    fn poison(&self, props: &[Property], reason: &str) {
        let states: Vec<(Property, PropertyState)> = {
            let mut store = self.store.lock().unwrap();
            props.iter().map(|p| (*p, store.mark_stale(*p))).collect()
        };
        for (property, state) in states {
            self.emit(
                property,
                state,
                ChangeOutcome::StateUnknown {
                    reason: reason.to_string(),
                },
            );
        }
    }

    fn emit(&self, property: Property, state: PropertyState, outcome: ChangeOutcome) {
        // No subscribers is fine.
        let _ = self.events.send(ChangeEvent {
            property,
            state,
            outcome,
        });
    }
}
