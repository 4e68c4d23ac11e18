//! Symmetric QUBO coefficient storage.

use rustc_hash::FxHashMap;

/// Variable index within a model.
pub type VarId = u32;

/// Binary quadratic model `E(x) = offset + Σ Q[a,b]·x_a·x_b` over `x ∈ {0,1}^n`.
///
/// Coefficients are keyed by the unordered pair `(min, max)`; linear terms live on
/// the diagonal `(a, a)`. Looking up `(a, b)` and `(b, a)` always returns the same
/// value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuboModel {
    num_variables: usize,
    coefficients: FxHashMap<(VarId, VarId), f64>,
    offset: f64,
}

#[inline]
fn canonical(a: VarId, b: VarId) -> (VarId, VarId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl QuboModel {
    pub fn new(num_variables: usize) -> Self {
        Self {
            num_variables,
            coefficients: FxHashMap::default(),
            offset: 0.0,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// Stored off-diagonal entries.
    pub fn num_interactions(&self) -> usize {
        self.coefficients.keys().filter(|(a, b)| a != b).count()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn add_offset(&mut self, value: f64) {
        self.offset += value;
    }

    pub fn add_linear(&mut self, a: VarId, value: f64) {
        self.add(a, a, value);
    }

    /// Add to the pair `(a, b)`. `a == b` is a linear term since `x² = x` for binaries.
    pub fn add_quadratic(&mut self, a: VarId, b: VarId, value: f64) {
        self.add(a, b, value);
    }

    fn add(&mut self, a: VarId, b: VarId, value: f64) {
        debug_assert!((a as usize) < self.num_variables && (b as usize) < self.num_variables);
        if value == 0.0 {
            return;
        }
        *self.coefficients.entry(canonical(a, b)).or_insert(0.0) += value;
    }

    /// Coefficient of the pair, 0.0 when absent.
    pub fn coefficient(&self, a: VarId, b: VarId) -> f64 {
        self.coefficients
            .get(&canonical(a, b))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn linear(&self, a: VarId) -> f64 {
        self.coefficient(a, a)
    }

    /// Canonical entries `((a, b), value)` with `a <= b`, sorted by key.
    pub fn entries(&self) -> Vec<((VarId, VarId), f64)> {
        let mut entries: Vec<_> = self.coefficients.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries
    }

    /// Energy of a bit assignment. Bits beyond `num_variables` are ignored.
    pub fn energy(&self, bits: &[u8]) -> f64 {
        let on = |v: VarId| bits.get(v as usize).copied().unwrap_or(0) != 0;
        self.entries()
            .into_iter()
            .filter(|((a, b), _)| on(*a) && on(*b))
            .fold(self.offset, |acc, (_, value)| acc + value)
    }

    /// Dense linear terms plus per-variable neighbour lists for local search.
    pub fn adjacency(&self) -> Adjacency {
        let mut linear = vec![0.0; self.num_variables];
        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.num_variables];
        for ((a, b), value) in self.entries() {
            let (a, b) = (a as usize, b as usize);
            if a == b {
                linear[a] += value;
            } else {
                neighbors[a].push((b, value));
                neighbors[b].push((a, value));
            }
        }
        Adjacency { linear, neighbors }
    }
}

/// Flattened view of a [`QuboModel`] for samplers.
#[derive(Debug, Clone)]
pub struct Adjacency {
    pub linear: Vec<f64>,
    /// `neighbors[a]` lists `(b, Q[a,b])` for every nonzero off-diagonal entry.
    pub neighbors: Vec<Vec<(usize, f64)>>,
}

impl Adjacency {
    pub fn len(&self) -> usize {
        self.linear.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linear.is_empty()
    }

    /// `field[a] = Q[a,a] + Σ_b Q[a,b]·x_b`: the energy change of turning `a` on
    /// while it is off (negated when turning it off).
    pub fn local_fields(&self, bits: &[u8]) -> Vec<f64> {
        (0..self.len())
            .map(|a| {
                self.neighbors[a]
                    .iter()
                    .filter(|(b, _)| bits[*b] != 0)
                    .fold(self.linear[a], |acc, (_, value)| acc + value)
            })
            .collect()
    }

    /// Largest possible single-flip energy change per variable.
    pub fn max_flip_magnitude(&self) -> f64 {
        (0..self.len())
            .map(|a| {
                self.linear[a].abs()
                    + self.neighbors[a]
                        .iter()
                        .map(|(_, value)| value.abs())
                        .sum::<f64>()
            })
            .fold(0.0, f64::max)
    }

    /// Smallest nonzero coefficient magnitude, if any.
    pub fn min_coefficient_magnitude(&self) -> Option<f64> {
        self.linear
            .iter()
            .chain(self.neighbors.iter().flatten().map(|(_, value)| value))
            .map(|value| value.abs())
            .filter(|value| *value > 0.0)
            .reduce(f64::min)
    }
}
