use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use tariffgate_core::error::Result;
use tariffgate_core::{CountryCode, TariffRule};

/// Immutable snapshot of the tariff table.
pub type RuleTable = HashMap<CountryCode, TariffRule>;

/// Country code -> tariff rule.
///
/// Readers load the current snapshot without locking; writers publish a
/// modified copy with `rcu`, which retries on contention so concurrent writers
/// never lose each other's updates. A reader sees a table either entirely
/// before or entirely after any write.
pub struct PolicyStore {
    table: ArcSwap<RuleTable>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Build a store seeded with `rules` (validated first, later entries win).
    pub fn with_rules(rules: impl IntoIterator<Item = TariffRule>) -> Result<Self> {
        let store = Self::new();
        store.replace_all(rules)?;
        Ok(store)
    }

    /// Insert or overwrite the rule for `country_code`.
    pub fn set_rule(&self, country_code: &str, rate: f64, dropped: bool) -> Result<TariffRule> {
        let rule = TariffRule::new(country_code, rate, dropped)?;
        self.table.rcu(|cur| {
            let mut next = RuleTable::clone(cur);
            next.insert(rule.country_code, rule.clone());
            next
        });
        tracing::info!(country = %rule.country_code, rate = rule.rate, dropped = rule.dropped, "tariff rule set");
        Ok(rule)
    }

    /// Remove the rule for `country_code`. Absent or malformed codes are a no-op.
    pub fn remove_rule(&self, country_code: &str) -> bool {
        let Ok(code) = CountryCode::parse(country_code) else {
            return false;
        };
        if !self.table.load().contains_key(&code) {
            return false;
        }

        let mut removed = false;
        self.table.rcu(|cur| {
            let mut next = RuleTable::clone(cur);
            removed = next.remove(&code).is_some();
            next
        });
        if removed {
            tracing::info!(country = %code, "tariff rule removed");
        }
        removed
    }

    /// Lookup by raw (not yet canonical) code.
    pub fn get_rule(&self, country_code: &str) -> Option<TariffRule> {
        let code = CountryCode::parse(country_code).ok()?;
        self.get(&code)
    }

    pub fn get(&self, code: &CountryCode) -> Option<TariffRule> {
        self.table.load().get(code).cloned()
    }

    /// Point-in-time snapshot; later writes never show through it.
    pub fn list_rules(&self) -> Arc<RuleTable> {
        self.table.load_full()
    }

    /// Snapshot sorted by country code.
    pub fn sorted_rules(&self) -> Vec<TariffRule> {
        let mut rules: Vec<TariffRule> = self.table.load().values().cloned().collect();
        rules.sort_by(|a, b| a.country_code.cmp(&b.country_code));
        rules
    }

    /// Swap the whole table. Every rule is validated before anything changes.
    pub fn replace_all(&self, rules: impl IntoIterator<Item = TariffRule>) -> Result<usize> {
        let mut next = RuleTable::new();
        for rule in rules {
            rule.validate()?;
            next.insert(rule.country_code, rule);
        }
        let n = next.len();
        self.table.store(Arc::new(next));
        tracing::info!(rules = n, "tariff table replaced");
        Ok(n)
    }

    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }
}
