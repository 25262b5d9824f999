// ── Central reactive data store ──
//
// The client's cached, possibly stale copy of every control-plane
// resource. Mutations are broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{Counter, EntityId, FirewallConfig, NatRule, NetworkInterface, Rule, Zone};
use crate::stream::EntityStream;

/// Central reactive store for all control-plane resources.
pub struct DataStore {
    pub(crate) rules: EntityCollection<Rule>,
    pub(crate) nat_rules: EntityCollection<NatRule>,
    pub(crate) zones: EntityCollection<Zone>,
    pub(crate) interfaces: EntityCollection<NetworkInterface>,
    pub(crate) counters: watch::Sender<Arc<Vec<Arc<Counter>>>>,
    /// Message of the last failed counters poll, cleared on success.
    pub(crate) counters_error: watch::Sender<Option<String>>,
    pub(crate) config: watch::Sender<Option<Arc<FirewallConfig>>>,
    pub(crate) last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (counters, _) = watch::channel(Arc::new(Vec::new()));
        let (counters_error, _) = watch::channel(None);
        let (config, _) = watch::channel(None);
        let (last_full_refresh, _) = watch::channel(None);

        Self {
            rules: EntityCollection::new(),
            nat_rules: EntityCollection::new(),
            zones: EntityCollection::new(),
            interfaces: EntityCollection::new(),
            counters,
            counters_error,
            config,
            last_full_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn rules_snapshot(&self) -> Arc<Vec<Arc<Rule>>> {
        self.rules.snapshot()
    }

    pub fn nat_rules_snapshot(&self) -> Arc<Vec<Arc<NatRule>>> {
        self.nat_rules.snapshot()
    }

    pub fn zones_snapshot(&self) -> Arc<Vec<Arc<Zone>>> {
        self.zones.snapshot()
    }

    pub fn interfaces_snapshot(&self) -> Arc<Vec<Arc<NetworkInterface>>> {
        self.interfaces.snapshot()
    }

    pub fn counters_snapshot(&self) -> Arc<Vec<Arc<Counter>>> {
        self.counters.borrow().clone()
    }

    pub fn counters_error(&self) -> Option<String> {
        self.counters_error.borrow().clone()
    }

    pub fn firewall_config(&self) -> Option<Arc<FirewallConfig>> {
        self.config.borrow().clone()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn rule_by_id(&self, id: &EntityId) -> Option<Arc<Rule>> {
        self.rules.get(id)
    }

    pub fn nat_rule_by_id(&self, id: &EntityId) -> Option<Arc<NatRule>> {
        self.nat_rules.get(id)
    }

    pub fn zone_by_id(&self, id: &EntityId) -> Option<Arc<Zone>> {
        self.zones.get(id)
    }

    pub fn interface_by_id(&self, id: &EntityId) -> Option<Arc<NetworkInterface>> {
        self.interfaces.get(id)
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn nat_rule_count(&self) -> usize {
        self.nat_rules.len()
    }

    // ── Loading flags ────────────────────────────────────────────────

    pub fn rules_loading(&self) -> bool {
        self.rules.is_loading()
    }

    pub fn nat_rules_loading(&self) -> bool {
        self.nat_rules.is_loading()
    }

    pub fn subscribe_rules_loading(&self) -> watch::Receiver<bool> {
        self.rules.subscribe_loading()
    }

    pub fn subscribe_nat_rules_loading(&self) -> watch::Receiver<bool> {
        self.nat_rules.subscribe_loading()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_rules(&self) -> EntityStream<Rule> {
        EntityStream::new(self.rules.subscribe())
    }

    pub fn subscribe_nat_rules(&self) -> EntityStream<NatRule> {
        EntityStream::new(self.nat_rules.subscribe())
    }

    pub fn subscribe_zones(&self) -> EntityStream<Zone> {
        EntityStream::new(self.zones.subscribe())
    }

    pub fn subscribe_interfaces(&self) -> EntityStream<NetworkInterface> {
        EntityStream::new(self.interfaces.subscribe())
    }

    pub fn subscribe_counters(&self) -> EntityStream<Counter> {
        EntityStream::new(self.counters.subscribe())
    }

    pub fn subscribe_config(&self) -> watch::Receiver<Option<Arc<FirewallConfig>>> {
        self.config.subscribe()
    }

    // ── Singleton updates ────────────────────────────────────────────

    pub(crate) fn set_counters(&self, counters: Vec<Counter>) {
        let values: Vec<Arc<Counter>> = counters.into_iter().map(Arc::new).collect();
        self.counters.send_modify(|snap| *snap = Arc::new(values));
        self.counters_error.send_replace(None);
    }

    pub(crate) fn set_counters_error(&self, message: String) {
        self.counters_error.send_replace(Some(message));
    }

    pub(crate) fn set_config(&self, config: FirewallConfig) {
        self.config.send_replace(Some(Arc::new(config)));
    }

    pub(crate) fn mark_refreshed(&self) {
        self.last_full_refresh.send_replace(Some(Utc::now()));
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    /// How long ago the last full refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_full_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
