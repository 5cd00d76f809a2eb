//! Lifecycle test driver
//!
//! The driver runs a [`TestCase`] end to end:
//!
//! ```text
//!  for each step ──► apply configuration ──► run checks
//!                      │                        │
//!                      ▼                        ▼
//!               RecordReconciler          StateVerifier
//!                      │                        │
//!                      └──────► RunState ◄──────┘
//!
//!  after the last step (or the first failure)
//!      ──► destroy everything in RunState ──► verify every created record is gone
//! ```
//!
//! Each record address moves through
//! `Absent → Created → Verified → [Updated → Verified]* → Destroyed → DestroyVerified`.
//! The first failure ends the run; teardown is still attempted.

pub mod case;

use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::handle::ProviderHandle;
use crate::reconciler::{ReconcileAction, RecordReconciler};
use crate::record::{DesiredRecord, Record, RecordType, Zone};
use crate::resource::{Configuration, DomainBlock, RecordBlock, ResourceAddress, ResourceBlock};
use crate::state::{ResourceKind, RunState};
use crate::verifier::{ExpectedAttributes, StateVerifier};

pub use case::{Check, TestCase, TestStep};

/// Lifecycle phase of a record address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Absent,
    Created,
    Verified,
    Updated,
    Destroyed,
    DestroyVerified,
}

impl LifecyclePhase {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn permits(self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;
        matches!(
            (self, next),
            (Absent, Created)
                | (Created, Verified)
                | (Verified, Updated)
                | (Updated, Verified)
                | (Verified, Created)
                | (Created | Verified | Updated, Destroyed)
                | (Destroyed, Created)
                | (Destroyed, DestroyVerified)
        )
    }
}

/// Events emitted by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Run started
    RunStarted { case: String, steps: usize },

    /// A step is about to be applied
    StepStarted { step: usize },

    /// A resource was created
    ResourceCreated { address: ResourceAddress, id: String },

    /// A record was updated in place
    ResourceUpdated { address: ResourceAddress, id: String },

    /// A resource was deleted and recreated
    ResourceReplaced {
        address: ResourceAddress,
        previous_id: String,
        id: String,
    },

    /// A resource already matched its declaration
    ResourceUnchanged { address: ResourceAddress, id: String },

    /// A resource was deleted
    ResourceDestroyed { address: ResourceAddress, id: String },

    /// A check passed
    CheckPassed { step: usize, check: String },

    /// A record address changed lifecycle phase
    PhaseChanged {
        address: ResourceAddress,
        from: LifecyclePhase,
        to: LifecyclePhase,
    },

    /// Run finished
    RunFinished { case: String, success: bool },
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub case: String,
    pub steps: usize,
    /// Records verified as destroyed during teardown
    pub destroyed_records: usize,
    /// Phase history per record address, starting after `Absent`
    pub history: BTreeMap<ResourceAddress, Vec<LifecyclePhase>>,
}

/// Tracks the lifecycle phase of each record address
#[derive(Debug, Default)]
struct PhaseTracker {
    history: BTreeMap<ResourceAddress, Vec<LifecyclePhase>>,
}

impl PhaseTracker {
    fn current(&self, address: &ResourceAddress) -> LifecyclePhase {
        self.history
            .get(address)
            .and_then(|h| h.last().copied())
            .unwrap_or(LifecyclePhase::Absent)
    }

    fn addresses_in(&self, phases: &[LifecyclePhase]) -> Vec<ResourceAddress> {
        self.history
            .keys()
            .filter(|addr| phases.contains(&self.current(addr)))
            .cloned()
            .collect()
    }
}

/// Drives test cases against a provider
pub struct LifecycleDriver {
    provider: ProviderHandle,
    reconciler: RecordReconciler,
    verifier: StateVerifier,
    cleanup_on_failure: bool,
    event_tx: mpsc::Sender<LifecycleEvent>,
}

impl LifecycleDriver {
    /// Create a new driver
    ///
    /// # Returns
    ///
    /// A tuple of (driver, event_receiver) where event_receiver yields lifecycle events
    pub fn new(
        provider: ProviderHandle,
        config: DriverConfig,
    ) -> Result<(Self, mpsc::Receiver<LifecycleEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let driver = Self {
            reconciler: RecordReconciler::new(provider.records()),
            verifier: StateVerifier::new(provider.records(), &config.verifier),
            provider,
            cleanup_on_failure: config.cleanup_on_failure,
            event_tx: tx,
        };

        Ok((driver, rx))
    }

    /// Run a test case from `Absent` to `DestroyVerified`
    pub async fn run(&self, case: &TestCase) -> Result<RunReport> {
        let mut state = RunState::new();
        self.run_with_state(case, &mut state).await
    }

    /// Run a test case, threading the caller's run state
    ///
    /// On return the state reflects whatever could not be torn down.
    pub async fn run_with_state(&self, case: &TestCase, state: &mut RunState) -> Result<RunReport> {
        info!("Starting lifecycle run {} ({} steps)", case.name, case.steps.len());
        self.emit_event(LifecycleEvent::RunStarted {
            case: case.name.clone(),
            steps: case.steps.len(),
        });

        let mut tracker = PhaseTracker::default();
        let outcome = match self.run_steps(case, state, &mut tracker).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Lifecycle run {} failed: {}", case.name, e);
                if !self.cleanup_on_failure {
                    warn!("Leaving {} resource(s) in place", state.len());
                    self.finish(case, false);
                    return Err(e);
                }
                Err(e)
            }
        };

        let teardown = self.teardown(state, &mut tracker).await;

        let result = match (outcome, teardown) {
            (Err(e), Err(cleanup)) => {
                warn!("Cleanup after failed run {} also failed: {}", case.name, cleanup);
                Err(e)
            }
            (Err(e), Ok(_)) => Err(e),
            (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(destroyed_records)) => Ok(RunReport {
                case: case.name.clone(),
                steps: case.steps.len(),
                destroyed_records,
                history: tracker.history,
            }),
        };

        self.finish(case, result.is_ok());
        result
    }

    fn finish(&self, case: &TestCase, success: bool) {
        if success {
            info!("Lifecycle run {} passed", case.name);
        }
        self.emit_event(LifecycleEvent::RunFinished {
            case: case.name.clone(),
            success,
        });
    }

    async fn run_steps(
        &self,
        case: &TestCase,
        state: &mut RunState,
        tracker: &mut PhaseTracker,
    ) -> Result<()> {
        for (index, step) in case.steps.iter().enumerate() {
            let step_no = index + 1;
            self.emit_event(LifecycleEvent::StepStarted { step: step_no });
            debug!("Applying step {} of {}", step_no, case.name);

            self.apply(step_no, &step.config, state, tracker).await?;
            self.run_checks(step_no, &step.checks, state).await?;

            for address in
                tracker.addresses_in(&[LifecyclePhase::Created, LifecyclePhase::Updated])
            {
                self.transition(tracker, &address, LifecyclePhase::Verified)?;
            }
        }
        Ok(())
    }

    /// Apply one configuration on top of the run state
    async fn apply(
        &self,
        step: usize,
        config: &Configuration,
        state: &mut RunState,
        tracker: &mut PhaseTracker,
    ) -> Result<()> {
        config.validate().map_err(|e| e.at_step(step, "configuration"))?;

        // Resources dropped from the configuration are destroyed first
        for address in state.teardown_order() {
            if !config.contains(&address) {
                self.destroy_resource(&address, state)
                    .await
                    .map_err(|e| e.at_step(step, address.as_str()))?;
                if tracker.history.contains_key(&address) {
                    self.transition(tracker, &address, LifecyclePhase::Destroyed)?;
                }
            }
        }

        for (address, block) in config.ordered() {
            let applied = match block {
                ResourceBlock::Domain(domain) => self.apply_domain(address, domain, state).await,
                ResourceBlock::Record(record) => {
                    self.apply_record(address, record, state, tracker).await
                }
            };
            applied.map_err(|e| e.at_step(step, address.as_str()))?;
        }

        Ok(())
    }

    async fn apply_domain(
        &self,
        address: &ResourceAddress,
        block: &DomainBlock,
        state: &mut RunState,
    ) -> Result<()> {
        let zones = self.provider.zones();
        let desired = Zone::new(&block.name, &block.ip_address);

        if let Some(prior) = state.get(address) {
            let unchanged = prior.attribute("name") == Some(block.name.as_str())
                && prior.attribute("ip_address") == Some(block.ip_address.as_str());
            let previous_id = prior.id.clone();

            if unchanged {
                match zones.retrieve_zone(&previous_id).await {
                    Ok(_) => {
                        self.emit_event(LifecycleEvent::ResourceUnchanged {
                            address: address.clone(),
                            id: previous_id,
                        });
                        return Ok(());
                    }
                    Err(e) if e.is_not_found() => {
                        warn!(
                            "Domain {} ({}) vanished remotely, creating it again",
                            previous_id, address
                        );
                        state.remove(address);
                        return self.create_domain(address, &desired, state).await;
                    }
                    Err(e) => return Err(e),
                }
            }

            // Zones have no update; a changed declaration recreates the zone
            self.delete_zone(&previous_id).await?;
            let zone = zones.create_zone(&desired).await?;
            state.put_zone(address, &zone);
            self.emit_event(LifecycleEvent::ResourceReplaced {
                address: address.clone(),
                previous_id,
                id: zone.name.clone(),
            });
            return Ok(());
        }

        self.create_domain(address, &desired, state).await
    }

    async fn create_domain(
        &self,
        address: &ResourceAddress,
        desired: &Zone,
        state: &mut RunState,
    ) -> Result<()> {
        let zone = self.provider.zones().create_zone(desired).await?;
        info!("Created domain {} ({})", zone.name, address);
        state.put_zone(address, &zone);
        self.emit_event(LifecycleEvent::ResourceCreated {
            address: address.clone(),
            id: zone.name,
        });
        Ok(())
    }

    async fn apply_record(
        &self,
        address: &ResourceAddress,
        block: &RecordBlock,
        state: &mut RunState,
        tracker: &mut PhaseTracker,
    ) -> Result<()> {
        let domain = block.domain.resolve(state)?;
        let record_type: RecordType = block
            .record_type
            .parse()
            .map_err(|e| Error::create(&domain, &block.name, e))?;

        let desired = DesiredRecord {
            domain,
            name: block.name.clone(),
            record_type,
            data: block.value.clone(),
            priority: block.priority,
            port: block.port,
            weight: block.weight,
        };

        let prior = match state.get(address) {
            Some(known) => {
                self.reconciler
                    .refresh(known.domain(), &known.record_id())
                    .await?
            }
            None => None,
        };

        match self.reconciler.plan(&desired, prior.as_ref()) {
            ReconcileAction::Create => {
                let record = self.reconciler.ensure(&desired, None).await?;
                state.put_record(address, &record);
                self.transition(tracker, address, LifecyclePhase::Created)?;
                self.emit_event(LifecycleEvent::ResourceCreated {
                    address: address.clone(),
                    id: record.id.to_string(),
                });
            }
            ReconcileAction::Update => {
                let prior = expect_prior(prior, address)?;
                let record = self.reconciler.ensure(&desired, Some(&prior.id)).await?;
                if record.id != prior.id {
                    return Err(Error::IdChanged {
                        address: address.to_string(),
                        previous: prior.id.to_string(),
                        current: record.id.to_string(),
                    });
                }
                state.put_record(address, &record);
                self.transition(tracker, address, LifecyclePhase::Updated)?;
                self.emit_event(LifecycleEvent::ResourceUpdated {
                    address: address.clone(),
                    id: record.id.to_string(),
                });
            }
            ReconcileAction::Replace => {
                let prior = expect_prior(prior, address)?;
                self.reconciler.destroy(&prior.domain, &prior.id).await?;
                let record = self.reconciler.ensure(&desired, None).await?;
                state.put_record(address, &record);
                self.transition(tracker, address, LifecyclePhase::Created)?;
                self.emit_event(LifecycleEvent::ResourceReplaced {
                    address: address.clone(),
                    previous_id: prior.id.to_string(),
                    id: record.id.to_string(),
                });
            }
            ReconcileAction::NoChange => {
                let record = expect_prior(prior, address)?;
                state.put_record(address, &record);
                self.emit_event(LifecycleEvent::ResourceUnchanged {
                    address: address.clone(),
                    id: record.id.to_string(),
                });
            }
        }

        Ok(())
    }

    async fn run_checks(&self, step: usize, checks: &[Check], state: &RunState) -> Result<()> {
        let mut captured: BTreeMap<ResourceAddress, Record> = BTreeMap::new();

        for check in checks {
            let address = check.address();
            self.run_check(check, state, &mut captured)
                .await
                .map_err(|e| e.at_step(step, address.as_str()))?;

            debug!("Check passed: {}", check);
            self.emit_event(LifecycleEvent::CheckPassed {
                step,
                check: check.to_string(),
            });
        }
        Ok(())
    }

    async fn run_check(
        &self,
        check: &Check,
        state: &RunState,
        captured: &mut BTreeMap<ResourceAddress, Record>,
    ) -> Result<()> {
        match check {
            Check::RecordExists(address) => {
                let known = state
                    .get(address)
                    .ok_or_else(|| Error::not_found(format!("{} is not in run state", address)))?;
                let record = self
                    .verifier
                    .verify_exists(known.domain(), &known.record_id())
                    .await?;
                captured.insert(address.clone(), record);
            }
            Check::RecordData { address, expected } => {
                let record = captured.get(address).ok_or_else(|| {
                    Error::Other(format!(
                        "no record captured for {}; check existence first",
                        address
                    ))
                })?;
                self.verifier
                    .verify_attributes(record, &ExpectedAttributes::data(expected))?;
            }
            Check::ResourceAttr {
                address,
                key,
                expected,
            } => {
                let actual = state.attribute(address, key).ok_or_else(|| {
                    Error::not_found(format!("{} has no attribute {}", address, key))
                })?;
                if actual != expected.as_str() {
                    return Err(Error::mismatch(key, expected, actual));
                }
            }
        }
        Ok(())
    }

    /// Destroy every resource in the run state and verify destruction
    ///
    /// Destruction is best-effort: every resource is attempted and the first
    /// failure is returned. Resources that could not be destroyed stay in the
    /// state. Returns the number of records verified as destroyed.
    pub async fn destroy_all(&self, state: &mut RunState) -> Result<usize> {
        let mut tracker = PhaseTracker::default();
        self.teardown(state, &mut tracker).await
    }

    async fn teardown(&self, state: &mut RunState, tracker: &mut PhaseTracker) -> Result<usize> {
        let mut first_error = None;

        for address in state.teardown_order() {
            match self.destroy_resource(&address, state).await {
                Ok(()) => {
                    if tracker.history.contains_key(&address) {
                        self.transition(tracker, &address, LifecyclePhase::Destroyed)?;
                    }
                }
                Err(e) => {
                    warn!("Failed to destroy {}: {}", address, e);
                    if first_error.is_none() {
                        first_error = Some(e.at_teardown(address.as_str()));
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let verified = self.verify_all_destroyed(state).await?;
        for address in tracker.addresses_in(&[LifecyclePhase::Destroyed]) {
            self.transition(tracker, &address, LifecyclePhase::DestroyVerified)?;
        }
        Ok(verified)
    }

    /// Check that every record created during the run can no longer be retrieved
    pub async fn verify_all_destroyed(&self, state: &RunState) -> Result<usize> {
        let created = state.created_records();
        for record in created {
            self.verifier
                .verify_destroyed(&record.domain, &record.id)
                .await
                .map_err(|e| e.at_teardown(record.address.as_str()))?;
        }
        info!("Verified {} record(s) destroyed", created.len());
        Ok(created.len())
    }

    async fn destroy_resource(&self, address: &ResourceAddress, state: &mut RunState) -> Result<()> {
        let Some(known) = state.get(address).cloned() else {
            return Ok(());
        };

        let outcome = match known.kind {
            ResourceKind::Record => {
                self.reconciler
                    .destroy(known.domain(), &known.record_id())
                    .await
            }
            ResourceKind::Domain => self.delete_zone(&known.id).await,
        };

        match outcome {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!("{} was already gone", address);
            }
            Err(e) => return Err(e),
        }

        state.remove(address);
        self.emit_event(LifecycleEvent::ResourceDestroyed {
            address: address.clone(),
            id: known.id,
        });
        Ok(())
    }

    async fn delete_zone(&self, name: &str) -> Result<()> {
        self.provider.zones().delete_zone(name).await?;
        info!("Deleted domain {}", name);
        Ok(())
    }

    fn transition(
        &self,
        tracker: &mut PhaseTracker,
        address: &ResourceAddress,
        to: LifecyclePhase,
    ) -> Result<()> {
        let from = tracker.current(address);
        if !from.permits(to) {
            return Err(Error::Other(format!(
                "illegal lifecycle transition for {}: {:?} -> {:?}",
                address, from, to
            )));
        }

        tracker.history.entry(address.clone()).or_default().push(to);
        self.emit_event(LifecycleEvent::PhaseChanged {
            address: address.clone(),
            from,
            to,
        });
        Ok(())
    }

    /// Emit a lifecycle event
    fn emit_event(&self, event: LifecycleEvent) {
        // Send event, logging warning if channel is full (backpressure)
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

fn expect_prior(prior: Option<Record>, address: &ResourceAddress) -> Result<Record> {
    prior.ok_or_else(|| Error::Other(format!("no prior state for {}", address)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_machine_permits_documented_path() {
        use LifecyclePhase::*;
        let path = [Absent, Created, Verified, Updated, Verified, Destroyed, DestroyVerified];
        for pair in path.windows(2) {
            assert!(pair[0].permits(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_phase_machine_rejects_shortcuts() {
        use LifecyclePhase::*;
        assert!(!Absent.permits(Verified));
        assert!(!Created.permits(Updated));
        assert!(!Verified.permits(DestroyVerified));
        assert!(!DestroyVerified.permits(Created));
    }
}
