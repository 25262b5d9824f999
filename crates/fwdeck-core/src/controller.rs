// ── Controller abstraction ──
//
// Full lifecycle management for a control-plane connection: liveness
// probe, initial load, background polling, CRUD coordination against the
// remote store, optimistic reordering, and the apply/rollback workflow.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fwdeck_api::{ApiClient, TlsMode, TransportConfig};

use crate::command::{Command, CommandResult};
use crate::command::requests::{
    CreateInterfaceRequest, CreateNatRuleRequest, CreateRuleRequest, CreateZoneRequest,
    UpdateConfigRequest, UpdateInterfaceRequest, UpdateNatRuleRequest, UpdateRuleRequest,
    UpdateZoneRequest,
};
use crate::config::{ControllerConfig, ReorderPersistence, TlsVerification};
use crate::convert;
use crate::error::CoreError;
use crate::model::{
    Counter, Entity, EntityId, FirewallConfig, Health, NatRule, NetworkInterface, Rule, Zone,
};
use crate::notify::{Notification, Notifier};
use crate::ordering::Ordered;
use crate::store::{DataStore, EntityCollection, Ticket};
use crate::stream::EntityStream;
use crate::validation;
use crate::workflow::{Workflow, WorkflowOp, WorkflowState};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The store object the application shell owns and injects.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Entity CRUD methods
/// report failures as notifications and return `None`/`false`; the
/// apply/rollback workflow notifies *and* returns the error.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<DataStore>,
    notifier: Notifier,
    workflow: Workflow,
    connection_state: watch::Sender<ConnectionState>,
    client: Mutex<Option<ApiClient>>,
    cancel: CancellationToken,
    /// Child token for the current connection, replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a Controller from configuration. Does NOT connect; the API
    /// client is built by [`connect()`](Self::connect).
    pub fn new(config: ControllerConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a Controller around a ready-made API client.
    pub fn with_client(config: ControllerConfig, client: ApiClient) -> Self {
        Self::build(config, Some(client))
    }

    fn build(config: ControllerConfig, client: Option<ApiClient>) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: Arc::new(DataStore::new()),
                notifier: Notifier::new(),
                workflow: Workflow::new(),
                connection_state,
                client: Mutex::new(client),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Probe liveness, load every collection, and spawn background tasks
    /// (counter polling, periodic refresh) per the configured intervals.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        if let Err(e) = self.establish().await {
            self.inner.connection_state.send_replace(ConnectionState::Failed);
            return Err(e);
        }

        let config = &self.inner.config;
        let mut handles = self.inner.task_handles.lock().await;

        if !config.counters_poll_interval.is_zero() {
            let ctrl = self.clone();
            let cancel = child.clone();
            let interval = config.counters_poll_interval;
            handles.push(tokio::spawn(counters_poll_task(ctrl, interval, cancel)));
        }

        if !config.refresh_interval.is_zero() {
            let ctrl = self.clone();
            let cancel = child.clone();
            let interval = config.refresh_interval;
            handles.push(tokio::spawn(refresh_task(ctrl, interval, cancel)));
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(url = %config.url, "connected to control plane");
        Ok(())
    }

    async fn establish(&self) -> Result<(), CoreError> {
        let client = {
            let mut guard = self.inner.client.lock().await;
            if let Some(client) = guard.as_ref() {
                client.clone()
            } else {
                let config = &self.inner.config;
                let client = ApiClient::from_api_key(
                    config.url.as_str(),
                    &config.api_key,
                    &build_transport(config),
                )?;
                *guard = Some(client.clone());
                client
            }
        };

        let health = Health::from(client.health().await?);
        debug!(status = %health.status, service = ?health.service, "control plane is up");

        self.full_refresh().await
    }

    /// Cancel background tasks and reset the connection state.
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Reload rules, NAT rules, zones, interfaces, and settings
    /// concurrently. Each failure is notified; the first one is returned.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let (rules, nat, zones, interfaces, config) = tokio::join!(
            self.fetch_rules(),
            self.fetch_nat_rules(),
            self.fetch_zones(),
            self.fetch_interfaces(),
            self.fetch_config(),
        );

        rules.and(nat).and(zones).and(interfaces).and(config)?;
        self.inner.store.mark_refreshed();
        Ok(())
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Background polling is disabled since only one request-response
    /// cycle is needed.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.counters_poll_interval = Duration::ZERO;
        cfg.refresh_interval = Duration::ZERO;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to operation outcomes.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifier.subscribe()
    }

    pub fn workflow_state(&self) -> WorkflowState {
        self.inner.workflow.state()
    }

    pub fn subscribe_workflow(&self) -> watch::Receiver<WorkflowState> {
        self.inner.workflow.subscribe()
    }

    /// `true` while an apply or rollback is in flight.
    pub fn applying(&self) -> bool {
        self.inner.workflow.is_busy()
    }

    /// Advisory: rules or NAT rules changed since the last apply/rollback.
    pub fn draft_dirty(&self) -> bool {
        self.inner.workflow.is_dirty()
    }

    pub fn subscribe_draft_dirty(&self) -> watch::Receiver<bool> {
        self.inner.workflow.subscribe_dirty()
    }

    // ── Snapshot accessors (delegate to DataStore) ───────────────

    pub fn rules_snapshot(&self) -> Arc<Vec<Arc<Rule>>> {
        self.inner.store.rules_snapshot()
    }

    pub fn nat_rules_snapshot(&self) -> Arc<Vec<Arc<NatRule>>> {
        self.inner.store.nat_rules_snapshot()
    }

    pub fn zones_snapshot(&self) -> Arc<Vec<Arc<Zone>>> {
        self.inner.store.zones_snapshot()
    }

    pub fn interfaces_snapshot(&self) -> Arc<Vec<Arc<NetworkInterface>>> {
        self.inner.store.interfaces_snapshot()
    }

    pub fn counters_snapshot(&self) -> Arc<Vec<Arc<Counter>>> {
        self.inner.store.counters_snapshot()
    }

    pub fn firewall_config(&self) -> Option<Arc<FirewallConfig>> {
        self.inner.store.firewall_config()
    }

    pub fn subscribe_rules(&self) -> EntityStream<Rule> {
        self.inner.store.subscribe_rules()
    }

    pub fn subscribe_nat_rules(&self) -> EntityStream<NatRule> {
        self.inner.store.subscribe_nat_rules()
    }

    // ── Loads ────────────────────────────────────────────────────
    //
    // Each replaces its collection wholesale. `false` means the failure
    // was already notified.

    pub async fn load_rules(&self) -> bool {
        self.fetch_rules().await.is_ok()
    }

    pub async fn load_nat_rules(&self) -> bool {
        self.fetch_nat_rules().await.is_ok()
    }

    pub async fn load_zones(&self) -> bool {
        self.fetch_zones().await.is_ok()
    }

    pub async fn load_interfaces(&self) -> bool {
        self.fetch_interfaces().await.is_ok()
    }

    pub async fn load_config(&self) -> bool {
        self.fetch_config().await.is_ok()
    }

    /// Counter failures are kept on the store rather than notified, so a
    /// dead poll does not flood subscribers.
    pub async fn load_counters(&self) -> bool {
        let result = async {
            let list = self.api().await?.list_counters().await?;
            self.inner
                .store
                .set_counters(list.into_iter().map(Counter::from).collect());
            Ok::<_, CoreError>(())
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "counters fetch failed");
                self.inner.store.set_counters_error(e.to_string());
                false
            }
        }
    }

    pub async fn health(&self) -> Result<Health, CoreError> {
        Ok(Health::from(self.api().await?.health().await?))
    }

    async fn fetch_rules(&self) -> Result<(), CoreError> {
        let result = async {
            let api = self.api().await?;
            let rules = &self.inner.store.rules;
            let (ticket, _loading) = rules.begin_load();
            let list = api.list_rules().await?;
            rules.apply_load_ordered(ticket, list.into_iter().map(Rule::from).collect());
            Ok(())
        }
        .await;
        self.report_load(result, "Failed to fetch rules")
    }

    async fn fetch_nat_rules(&self) -> Result<(), CoreError> {
        let result = async {
            let api = self.api().await?;
            let nat = &self.inner.store.nat_rules;
            let (ticket, _loading) = nat.begin_load();
            let list = api.list_nat_rules().await?;
            nat.apply_load_ordered(ticket, list.into_iter().map(NatRule::from).collect());
            Ok(())
        }
        .await;
        self.report_load(result, "Failed to fetch NAT rules")
    }

    async fn fetch_zones(&self) -> Result<(), CoreError> {
        let result = async {
            let api = self.api().await?;
            let zones = &self.inner.store.zones;
            let (ticket, _loading) = zones.begin_load();
            let list = api.list_zones().await?;
            zones.apply_load(ticket, list.into_iter().map(Zone::from).collect());
            Ok(())
        }
        .await;
        self.report_load(result, "Failed to fetch zones")
    }

    async fn fetch_interfaces(&self) -> Result<(), CoreError> {
        let result = async {
            let api = self.api().await?;
            let interfaces = &self.inner.store.interfaces;
            let (ticket, _loading) = interfaces.begin_load();
            let list = api.list_interfaces().await?;
            interfaces.apply_load(
                ticket,
                list.into_iter().map(NetworkInterface::from).collect(),
            );
            Ok(())
        }
        .await;
        self.report_load(result, "Failed to fetch interfaces")
    }

    async fn fetch_config(&self) -> Result<(), CoreError> {
        let result = async {
            let config = self.api().await?.get_config().await?;
            self.inner.store.set_config(FirewallConfig::from(config));
            Ok(())
        }
        .await;
        self.report_load(result, "Failed to load settings")
    }

    // ── Rules ────────────────────────────────────────────────────

    /// Create a rule at the end of the order.
    pub async fn create_rule(&self, req: CreateRuleRequest) -> Option<Arc<Rule>> {
        self.submit_create_rule(req).await.ok()
    }

    pub async fn update_rule(&self, id: &EntityId, update: UpdateRuleRequest) -> Option<Arc<Rule>> {
        self.submit_update_rule(id, update).await.ok()
    }

    pub async fn delete_rule(&self, id: &EntityId) -> bool {
        self.submit_delete_rule(id).await.is_ok()
    }

    /// Optimistic move by index. Returns whether the order changed.
    pub async fn reorder_rules(&self, from: usize, to: usize) -> bool {
        self.reorder::<Rule>(from, to).await.unwrap_or(false)
    }

    /// Drag `source` onto `target`'s slot.
    pub async fn move_rule(&self, source: &EntityId, target: &EntityId) -> bool {
        self.move_onto::<Rule>(source, target).await.unwrap_or(false)
    }

    /// Write back every rule whose local position is not yet confirmed.
    pub async fn persist_rule_order(&self) -> bool {
        self.persist_order::<Rule>().await.is_ok()
    }

    async fn submit_create_rule(&self, req: CreateRuleRequest) -> Result<Arc<Rule>, CoreError> {
        let result = async {
            let rules = &self.inner.store.rules;
            let body = convert::rule_create_body(req, rules.append_position());
            validation::check_rule(&body)?;

            let api = self.api().await?;
            let ticket = rules.issue();
            let created = Rule::from(api.create_rule(&body).await?);
            Ok(stored_or(rules, ticket, created, EntityCollection::apply_created_ordered))
        }
        .await;
        self.report_draft_change(result, "Rule created")
    }

    async fn submit_update_rule(
        &self,
        id: &EntityId,
        update: UpdateRuleRequest,
    ) -> Result<Arc<Rule>, CoreError> {
        let result = async {
            let rules = &self.inner.store.rules;
            let current = rules
                .get(id)
                .ok_or_else(|| CoreError::not_found(Rule::KIND, id))?;
            let body = convert::rule_update_body(&current, update);
            validation::check_rule(&body)?;

            let api = self.api().await?;
            let ticket = rules.issue();
            let updated = Rule::from(api.update_rule(id.as_str(), &body).await?);
            Ok(stored_or(rules, ticket, updated, EntityCollection::apply_updated_ordered))
        }
        .await;
        self.report_draft_change(result, "Rule updated")
    }

    async fn submit_delete_rule(&self, id: &EntityId) -> Result<(), CoreError> {
        let result = async {
            let rules = &self.inner.store.rules;
            let api = self.api().await?;
            let ticket = rules.issue();
            api.delete_rule(id.as_str()).await?;
            rules.apply_deleted_ordered(ticket, id);
            Ok(())
        }
        .await;
        self.report_draft_change(result, "Rule deleted")
    }

    // ── NAT rules ────────────────────────────────────────────────

    pub async fn create_nat_rule(&self, req: CreateNatRuleRequest) -> Option<Arc<NatRule>> {
        self.submit_create_nat_rule(req).await.ok()
    }

    pub async fn update_nat_rule(
        &self,
        id: &EntityId,
        update: UpdateNatRuleRequest,
    ) -> Option<Arc<NatRule>> {
        self.submit_update_nat_rule(id, update).await.ok()
    }

    pub async fn delete_nat_rule(&self, id: &EntityId) -> bool {
        self.submit_delete_nat_rule(id).await.is_ok()
    }

    pub async fn reorder_nat_rules(&self, from: usize, to: usize) -> bool {
        self.reorder::<NatRule>(from, to).await.unwrap_or(false)
    }

    pub async fn move_nat_rule(&self, source: &EntityId, target: &EntityId) -> bool {
        self.move_onto::<NatRule>(source, target)
            .await
            .unwrap_or(false)
    }

    pub async fn persist_nat_rule_order(&self) -> bool {
        self.persist_order::<NatRule>().await.is_ok()
    }

    async fn submit_create_nat_rule(
        &self,
        req: CreateNatRuleRequest,
    ) -> Result<Arc<NatRule>, CoreError> {
        let result = async {
            let nat = &self.inner.store.nat_rules;
            let body = convert::nat_create_body(req, nat.append_position());
            validation::check_nat_rule(&body)?;

            let api = self.api().await?;
            let ticket = nat.issue();
            let created = NatRule::from(api.create_nat_rule(&body).await?);
            Ok(stored_or(nat, ticket, created, EntityCollection::apply_created_ordered))
        }
        .await;
        self.report_draft_change(result, "NAT rule created")
    }

    async fn submit_update_nat_rule(
        &self,
        id: &EntityId,
        update: UpdateNatRuleRequest,
    ) -> Result<Arc<NatRule>, CoreError> {
        let result = async {
            let nat = &self.inner.store.nat_rules;
            let current = nat
                .get(id)
                .ok_or_else(|| CoreError::not_found(NatRule::KIND, id))?;
            let body = convert::nat_update_body(&current, update);
            validation::check_nat_rule(&body)?;

            let api = self.api().await?;
            let ticket = nat.issue();
            let updated = NatRule::from(api.update_nat_rule(id.as_str(), &body).await?);
            Ok(stored_or(nat, ticket, updated, EntityCollection::apply_updated_ordered))
        }
        .await;
        self.report_draft_change(result, "NAT rule updated")
    }

    async fn submit_delete_nat_rule(&self, id: &EntityId) -> Result<(), CoreError> {
        let result = async {
            let nat = &self.inner.store.nat_rules;
            let api = self.api().await?;
            let ticket = nat.issue();
            api.delete_nat_rule(id.as_str()).await?;
            nat.apply_deleted_ordered(ticket, id);
            Ok(())
        }
        .await;
        self.report_draft_change(result, "NAT rule deleted")
    }

    // ── Zones ────────────────────────────────────────────────────

    pub async fn create_zone(&self, req: CreateZoneRequest) -> Option<Arc<Zone>> {
        self.submit_create_zone(req).await.ok()
    }

    pub async fn update_zone(&self, id: &EntityId, update: UpdateZoneRequest) -> Option<Arc<Zone>> {
        self.submit_update_zone(id, update).await.ok()
    }

    /// Interfaces referencing the zone by name are left as they are.
    pub async fn delete_zone(&self, id: &EntityId) -> bool {
        self.submit_delete_zone(id).await.is_ok()
    }

    async fn submit_create_zone(&self, req: CreateZoneRequest) -> Result<Arc<Zone>, CoreError> {
        let result = async {
            let body = convert::zone_create_body(req);
            validation::check_zone(&body)?;

            let zones = &self.inner.store.zones;
            let api = self.api().await?;
            let ticket = zones.issue();
            let created = Zone::from(api.create_zone(&body).await?);
            Ok(stored_or(zones, ticket, created, EntityCollection::apply_created))
        }
        .await;
        self.report(result, "Zone created", "Save failed")
    }

    async fn submit_update_zone(
        &self,
        id: &EntityId,
        update: UpdateZoneRequest,
    ) -> Result<Arc<Zone>, CoreError> {
        let result = async {
            let zones = &self.inner.store.zones;
            let current = zones
                .get(id)
                .ok_or_else(|| CoreError::not_found(Zone::KIND, id))?;
            let body = convert::zone_update_body(&current, update);
            validation::check_zone(&body)?;

            let api = self.api().await?;
            let ticket = zones.issue();
            let updated = Zone::from(api.update_zone(id.as_str(), &body).await?);
            Ok(stored_or(zones, ticket, updated, EntityCollection::apply_updated))
        }
        .await;
        self.report(result, "Zone updated", "Save failed")
    }

    async fn submit_delete_zone(&self, id: &EntityId) -> Result<(), CoreError> {
        let result = async {
            let zones = &self.inner.store.zones;
            let api = self.api().await?;
            let ticket = zones.issue();
            api.delete_zone(id.as_str()).await?;
            zones.apply_deleted(ticket, id);
            Ok(())
        }
        .await;
        self.report(result, "Zone deleted", "Delete failed")
    }

    // ── Interfaces ───────────────────────────────────────────────

    pub async fn create_interface(
        &self,
        req: CreateInterfaceRequest,
    ) -> Option<Arc<NetworkInterface>> {
        self.submit_create_interface(req).await.ok()
    }

    pub async fn update_interface(
        &self,
        id: &EntityId,
        update: UpdateInterfaceRequest,
    ) -> Option<Arc<NetworkInterface>> {
        self.submit_update_interface(id, update).await.ok()
    }

    pub async fn delete_interface(&self, id: &EntityId) -> bool {
        self.submit_delete_interface(id).await.is_ok()
    }

    async fn submit_create_interface(
        &self,
        req: CreateInterfaceRequest,
    ) -> Result<Arc<NetworkInterface>, CoreError> {
        let result = async {
            let body = convert::interface_create_body(req);
            validation::check_interface(&body)?;

            let interfaces = &self.inner.store.interfaces;
            let api = self.api().await?;
            let ticket = interfaces.issue();
            let created = NetworkInterface::from(api.create_interface(&body).await?);
            Ok(stored_or(interfaces, ticket, created, EntityCollection::apply_created))
        }
        .await;
        self.report(result, "Interface created", "Save failed")
    }

    async fn submit_update_interface(
        &self,
        id: &EntityId,
        update: UpdateInterfaceRequest,
    ) -> Result<Arc<NetworkInterface>, CoreError> {
        let result = async {
            let interfaces = &self.inner.store.interfaces;
            let current = interfaces
                .get(id)
                .ok_or_else(|| CoreError::not_found(NetworkInterface::KIND, id))?;
            let body = convert::interface_update_body(&current, update);
            validation::check_interface(&body)?;

            let api = self.api().await?;
            let ticket = interfaces.issue();
            let updated = NetworkInterface::from(api.update_interface(id.as_str(), &body).await?);
            Ok(stored_or(interfaces, ticket, updated, EntityCollection::apply_updated))
        }
        .await;
        self.report(result, "Interface updated", "Save failed")
    }

    async fn submit_delete_interface(&self, id: &EntityId) -> Result<(), CoreError> {
        let result = async {
            let interfaces = &self.inner.store.interfaces;
            let api = self.api().await?;
            let ticket = interfaces.issue();
            api.delete_interface(id.as_str()).await?;
            interfaces.apply_deleted(ticket, id);
            Ok(())
        }
        .await;
        self.report(result, "Interface deleted", "Delete failed")
    }

    // ── Global config ────────────────────────────────────────────

    /// Save forwarding / NAT flags. Unset flags keep their stored value.
    pub async fn update_config(&self, req: UpdateConfigRequest) -> Option<Arc<FirewallConfig>> {
        self.submit_update_config(req).await.ok()
    }

    async fn submit_update_config(
        &self,
        req: UpdateConfigRequest,
    ) -> Result<Arc<FirewallConfig>, CoreError> {
        let result = async {
            let store = &self.inner.store;
            let body = convert::config_update_body(store.firewall_config().as_deref(), req);
            let saved = self.api().await?.update_config(&body).await?;
            store.set_config(FirewallConfig::from(saved));
            store
                .firewall_config()
                .ok_or_else(|| CoreError::Internal("config vanished after save".into()))
        }
        .await;
        self.report(result, "Configuration saved", "Save failed")
    }

    // ── Apply / rollback ─────────────────────────────────────────

    /// Ask the control plane to atomically apply the stored ruleset.
    ///
    /// On failure the draft is left alone, exactly one error notification
    /// is published, and the error is returned.
    pub async fn apply_rules(&self) -> Result<(), CoreError> {
        let workflow = &self.inner.workflow;
        let _busy = workflow.begin(WorkflowOp::Apply);

        let result = async {
            self.api().await?.apply().await?;
            Ok::<_, CoreError>(())
        }
        .await;

        match &result {
            Ok(()) => {
                workflow.mark_clean();
                self.inner.notifier.success("Ruleset applied to kernel");
            }
            Err(e) => self.inner.notifier.error(format!("Apply failed: {e}")),
        }
        result
    }

    /// Ask the control plane to restore its last-known-good snapshot, then
    /// re-fetch rules and NAT rules. A failed re-fetch is notified on its
    /// own and does not fail the rollback.
    pub async fn rollback(&self) -> Result<(), CoreError> {
        let workflow = &self.inner.workflow;
        let _busy = workflow.begin(WorkflowOp::Rollback);

        let result = async {
            self.api().await?.rollback().await?;
            Ok::<_, CoreError>(())
        }
        .await;

        match &result {
            Ok(()) => {
                workflow.mark_clean();
                self.inner.notifier.success("Rolled back to previous snapshot");
                let (rules, nat) = tokio::join!(self.fetch_rules(), self.fetch_nat_rules());
                if rules.and(nat).is_err() {
                    debug!("post-rollback refresh incomplete");
                }
            }
            Err(e) => self.inner.notifier.error(format!("Rollback failed: {e}")),
        }
        result
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command. Outcomes are notified exactly as the direct
    /// methods do; the error is also returned for callers that need it.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        match cmd {
            // ── Rules ────────────────────────────────────────────
            Command::CreateRule(req) => self.submit_create_rule(req).await.map(CommandResult::Rule),
            Command::UpdateRule { id, update } => self
                .submit_update_rule(&id, update)
                .await
                .map(CommandResult::Rule),
            Command::DeleteRule { id } => self
                .submit_delete_rule(&id)
                .await
                .map(|()| CommandResult::Ok),
            Command::ReorderRules { from, to } => {
                self.reorder::<Rule>(from, to).await.map(reorder_result)
            }
            Command::MoveRule { source, target } => self
                .move_onto::<Rule>(&source, &target)
                .await
                .map(reorder_result),
            Command::PersistRuleOrder => self
                .persist_order::<Rule>()
                .await
                .map(CommandResult::Persisted),

            // ── NAT rules ────────────────────────────────────────
            Command::CreateNatRule(req) => self
                .submit_create_nat_rule(req)
                .await
                .map(CommandResult::NatRule),
            Command::UpdateNatRule { id, update } => self
                .submit_update_nat_rule(&id, update)
                .await
                .map(CommandResult::NatRule),
            Command::DeleteNatRule { id } => self
                .submit_delete_nat_rule(&id)
                .await
                .map(|()| CommandResult::Ok),
            Command::ReorderNatRules { from, to } => {
                self.reorder::<NatRule>(from, to).await.map(reorder_result)
            }
            Command::MoveNatRule { source, target } => self
                .move_onto::<NatRule>(&source, &target)
                .await
                .map(reorder_result),
            Command::PersistNatRuleOrder => self
                .persist_order::<NatRule>()
                .await
                .map(CommandResult::Persisted),

            // ── Zones / interfaces ───────────────────────────────
            Command::CreateZone(req) => self.submit_create_zone(req).await.map(CommandResult::Zone),
            Command::UpdateZone { id, update } => self
                .submit_update_zone(&id, update)
                .await
                .map(CommandResult::Zone),
            Command::DeleteZone { id } => self
                .submit_delete_zone(&id)
                .await
                .map(|()| CommandResult::Ok),
            Command::CreateInterface(req) => self
                .submit_create_interface(req)
                .await
                .map(CommandResult::Interface),
            Command::UpdateInterface { id, update } => self
                .submit_update_interface(&id, update)
                .await
                .map(CommandResult::Interface),
            Command::DeleteInterface { id } => self
                .submit_delete_interface(&id)
                .await
                .map(|()| CommandResult::Ok),

            // ── Global ───────────────────────────────────────────
            Command::UpdateConfig(req) => self
                .submit_update_config(req)
                .await
                .map(CommandResult::Config),
            Command::Apply => self.apply_rules().await.map(|()| CommandResult::Ok),
            Command::Rollback => self.rollback().await.map(|()| CommandResult::Ok),
        }
    }

    // ── Ordering domains ─────────────────────────────────────────

    async fn reorder<T: OrderDomain>(&self, from: usize, to: usize) -> Result<bool, CoreError> {
        let moved = T::collection(&self.inner.store)
            .reorder(from, to)
            .inspect_err(|e| self.inner.notifier.error(e.to_string()))?;
        self.after_reorder::<T>(moved).await
    }

    async fn move_onto<T: OrderDomain>(
        &self,
        source: &EntityId,
        target: &EntityId,
    ) -> Result<bool, CoreError> {
        let moved = T::collection(&self.inner.store).reorder_by_id(source, target);
        self.after_reorder::<T>(moved).await
    }

    async fn after_reorder<T: OrderDomain>(&self, moved: bool) -> Result<bool, CoreError> {
        if !moved {
            return Ok(false);
        }
        self.inner.workflow.mark_dirty();
        if self.inner.config.reorder_persistence == ReorderPersistence::Immediate {
            self.persist_order::<T>().await?;
        }
        Ok(true)
    }

    /// Issue one update per entity whose local position differs from the
    /// server-confirmed one. Returns how many were written.
    async fn persist_order<T: OrderDomain>(&self) -> Result<usize, CoreError> {
        let collection = T::collection(&self.inner.store);
        let pending = collection.unconfirmed();
        if pending.is_empty() {
            return Ok(0);
        }

        let result = async {
            let api = self.api().await?;
            let writes = pending.into_iter().map(|item| {
                let ticket = collection.issue();
                let write = T::write_position(api.clone(), item);
                async move { (ticket, write.await) }
            });

            let mut written = 0;
            let mut first_error = None;
            for (ticket, outcome) in join_all(writes).await {
                match outcome {
                    Ok(saved) => {
                        collection.apply_updated_ordered(ticket, saved);
                        written += 1;
                    }
                    Err(e) => {
                        warn!(kind = T::KIND, error = %e, "position write-back failed");
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }
            first_error.map_or(Ok(written), Err)
        }
        .await;

        let label = format!("{} order saved", T::KIND);
        self.report(result, &label, "Save failed")
    }

    // ── Internals ────────────────────────────────────────────────

    async fn api(&self) -> Result<ApiClient, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::ControllerDisconnected)
    }

    /// Publish the outcome of a remote mutation. Validation failures are
    /// shown bare; everything else gets the `failure` prefix.
    fn report<T>(
        &self,
        result: Result<T, CoreError>,
        success: &str,
        failure: &str,
    ) -> Result<T, CoreError> {
        match &result {
            Ok(_) => self.inner.notifier.success(success),
            Err(CoreError::ValidationFailed { message }) => {
                self.inner.notifier.error(message.clone());
            }
            Err(e) => self.inner.notifier.error(format!("{failure}: {e}")),
        }
        result
    }

    /// Like [`report`](Self::report), and flags the draft as changed.
    fn report_draft_change<T>(
        &self,
        result: Result<T, CoreError>,
        success: &str,
    ) -> Result<T, CoreError> {
        let result = self.report(result, success, "Save failed");
        if result.is_ok() {
            self.inner.workflow.mark_dirty();
        }
        result
    }

    fn report_load(&self, result: Result<(), CoreError>, failure: &str) -> Result<(), CoreError> {
        if let Err(e) = &result {
            self.inner.notifier.error(format!("{failure}: {e}"));
        }
        result
    }
}

// ── Ordering domain plumbing ─────────────────────────────────────

/// An entity type with its own ordering domain and a way to write its
/// position back to the control plane.
trait OrderDomain: Entity + Ordered {
    fn collection(store: &DataStore) -> &EntityCollection<Self>;

    fn write_position(
        api: ApiClient,
        item: Arc<Self>,
    ) -> impl Future<Output = Result<Self, CoreError>> + Send;
}

impl OrderDomain for Rule {
    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.rules
    }

    fn write_position(
        api: ApiClient,
        item: Arc<Self>,
    ) -> impl Future<Output = Result<Self, CoreError>> + Send {
        async move {
            let body = convert::rule_body(&item);
            Ok(Rule::from(api.update_rule(item.id.as_str(), &body).await?))
        }
    }
}

impl OrderDomain for NatRule {
    fn collection(store: &DataStore) -> &EntityCollection<Self> {
        &store.nat_rules
    }

    fn write_position(
        api: ApiClient,
        item: Arc<Self>,
    ) -> impl Future<Output = Result<Self, CoreError>> + Send {
        async move {
            let body = convert::nat_body(&item);
            Ok(NatRule::from(
                api.update_nat_rule(item.id.as_str(), &body).await?,
            ))
        }
    }
}

fn reorder_result(moved: bool) -> CommandResult {
    if moved {
        CommandResult::Ok
    } else {
        CommandResult::Unchanged
    }
}

/// Apply a server response, then hand back what the collection now holds
/// for that id (positions may have been renumbered). Falls back to the
/// server's copy when the response was discarded as stale.
fn stored_or<T: Entity>(
    collection: &EntityCollection<T>,
    ticket: Ticket,
    entity: T,
    apply: fn(&EntityCollection<T>, Ticket, T) -> bool,
) -> Arc<T> {
    let id = entity.id().clone();
    let fallback = Arc::new(entity.clone());
    apply(collection, ticket, entity);
    collection.get(&id).unwrap_or(fallback)
}

// ── Background tasks ─────────────────────────────────────────────

async fn counters_poll_task(controller: Controller, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                controller.load_counters().await;
            }
        }
    }
}

async fn refresh_task(controller: Controller, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = controller.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

// ── Transport ────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the controller configuration.
fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
