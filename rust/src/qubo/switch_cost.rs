//! Context-switch cost between category pairs.

use rustc_hash::FxHashMap;

use crate::catalog::TaskCatalog;
use crate::config::ProblemConfig;
use crate::interner::SymbolId;

/// Cost of running a task of one category directly after another.
///
/// Same-category transitions are always free. Overrides are symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCosts {
    default: f64,
    overrides: FxHashMap<(SymbolId, SymbolId), f64>,
}

fn check(cost: f64, what: &str) -> Result<f64, String> {
    if cost.is_finite() && cost >= 0.0 {
        Ok(cost)
    } else {
        Err(format!("{} must be finite and non-negative, got {}", what, cost))
    }
}

impl SwitchCosts {
    pub fn uniform(cost: f64) -> Self {
        Self {
            default: cost,
            overrides: FxHashMap::default(),
        }
    }

    /// Resolve the configured costs against the catalog's categories.
    ///
    /// Overrides naming categories absent from the catalog are dropped.
    pub fn from_config(config: &ProblemConfig, catalog: &TaskCatalog) -> Result<Self, String> {
        let mut costs = Self::uniform(check(config.switch_cost, "switch cost")?);
        let names = catalog.category_names();
        for (a, b, cost) in &config.switch_cost_overrides {
            let cost = check(*cost, &format!("switch cost {}->{}", a, b))?;
            if let (Some(a), Some(b)) = (names.get(a), names.get(b)) {
                costs.overrides.insert((a.min(b), a.max(b)), cost);
            }
        }
        Ok(costs)
    }

    #[inline]
    pub fn between(&self, from: SymbolId, to: SymbolId) -> f64 {
        if from == to {
            return 0.0;
        }
        self.overrides
            .get(&(from.min(to), from.max(to)))
            .copied()
            .unwrap_or(self.default)
    }
}
