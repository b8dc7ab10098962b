//! Multiset state representation for the Mastermind environment

use serde::{Deserialize, Serialize};

use hilq_core::Peg;

/// A multiset of pegs, stored as a canonical sorted vector.
///
/// Two states are equal iff they contain the same pegs with the same
/// multiplicities, whatever order the pegs were chosen in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<Peg>", into = "Vec<Peg>")]
pub struct State(Vec<Peg>);

impl State {
    /// The empty multiset, the unique initial state
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_pegs(pegs: impl IntoIterator<Item = Peg>) -> Self {
        let mut pegs: Vec<Peg> = pegs.into_iter().collect();
        pegs.sort_unstable();
        Self(pegs)
    }

    /// New state with one more peg
    pub fn with(&self, peg: Peg) -> Self {
        let mut pegs = self.0.clone();
        let at = pegs.partition_point(|&p| p <= peg);
        pegs.insert(at, peg);
        Self(pegs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pegs in ascending order
    pub fn pegs(&self) -> &[Peg] {
        &self.0
    }

    pub fn into_pegs(self) -> Vec<Peg> {
        self.0
    }

    /// Multiplicity of `peg`
    pub fn count(&self, peg: Peg) -> usize {
        self.0.iter().filter(|&&p| p == peg).count()
    }

    /// Canonical string key, e.g. `{0, 2, 2}`
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Size of the multiset intersection with `other`
    pub fn common_with(&self, other: &State) -> usize {
        let (mut i, mut j, mut common) = (0, 0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    common += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        common
    }

    /// Every sub-multiset, this state and the empty state included.
    ///
    /// Each sub-multiset appears once even when pegs repeat.
    pub fn sub_multisets(&self) -> Vec<State> {
        // (peg, multiplicity) runs of the sorted vector
        let mut runs: Vec<(Peg, usize)> = Vec::new();
        for &peg in &self.0 {
            match runs.last_mut() {
                Some((last, n)) if *last == peg => *n += 1,
                _ => runs.push((peg, 1)),
            }
        }

        let mut subsets = vec![Vec::new()];
        for (peg, n) in runs {
            let mut next = Vec::with_capacity(subsets.len() * (n + 1));
            for subset in &subsets {
                for k in 0..=n {
                    let mut grown: Vec<Peg> = subset.clone();
                    grown.extend(std::iter::repeat(peg).take(k));
                    next.push(grown);
                }
            }
            subsets = next;
        }

        subsets.into_iter().map(State).collect()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, peg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{peg}")?;
        }
        write!(f, "}}")
    }
}

impl From<Vec<Peg>> for State {
    fn from(pegs: Vec<Peg>) -> Self {
        State::from_pegs(pegs)
    }
}

impl From<State> for Vec<Peg> {
    fn from(state: State) -> Self {
        state.0
    }
}
