//! Typed configuration for an analysis run.

use core::time::Duration;

/// The weak isolation level the predicted history must still satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub enum IsolationLevel {
    Causal,
    ReadCommitted,
}

/// How boundary predicates are evaluated, and which unserializability shape
/// (§4.6) is emitted. `Relaxed` only loosens the boundary predicate; it
/// leaves the unserializability shape at `Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub enum Strategy {
    Full,
    Express,
    Relaxed,
}

impl Strategy {
    /// Whether `event_in_boundary`/`event_on_boundary` (§4.2) use the
    /// relaxed or the strict definition.
    #[must_use]
    pub const fn boundary(self) -> BoundaryStrategy {
        match self {
            Self::Relaxed => BoundaryStrategy::Relaxed,
            Self::Full | Self::Express => BoundaryStrategy::Strict,
        }
    }

    /// Which of the two equi-satisfiable unserializability shapes (§4.6)
    /// this strategy selects.
    #[must_use]
    pub const fn unserializability(self) -> UnserializabilityShape {
        match self {
            Self::Express => UnserializabilityShape::Express,
            Self::Full | Self::Relaxed => UnserializabilityShape::Full,
        }
    }
}

/// The boundary-predicate knob of C2, split out of [`Strategy`] because it
/// is what `event_in_boundary`/`event_on_boundary` actually branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryStrategy {
    Strict,
    Relaxed,
}

/// Which unserializability encoding C6 emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnserializabilityShape {
    Full,
    Express,
}

/// Default oracle timeout for a prediction run: 2 hours.
pub const DEFAULT_PREDICT_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Default oracle timeout for a verification run: 30 minutes.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Configuration for one analysis invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub level: IsolationLevel,
    pub strategy: Strategy,
    /// Informational only (§9 Open Questions (c)): influences no axiom.
    pub bound: Option<u32>,
    /// Emit the full constraint bag and model for inspection.
    pub debug: bool,
    /// Emit a DOT-rendered commit-order graph on `sat`.
    pub visualize: bool,
    pub oracle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: IsolationLevel::Causal,
            strategy: Strategy::Full,
            bound: None,
            debug: false,
            visualize: false,
            oracle_timeout: DEFAULT_PREDICT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxed_strategy_relaxes_boundary_but_keeps_full_shape() {
        assert_eq!(Strategy::Relaxed.boundary(), BoundaryStrategy::Relaxed);
        assert_eq!(
            Strategy::Relaxed.unserializability(),
            UnserializabilityShape::Full
        );
    }

    #[test]
    fn full_and_express_use_strict_boundary() {
        assert_eq!(Strategy::Full.boundary(), BoundaryStrategy::Strict);
        assert_eq!(Strategy::Express.boundary(), BoundaryStrategy::Strict);
        assert_eq!(
            Strategy::Express.unserializability(),
            UnserializabilityShape::Express
        );
    }
}
