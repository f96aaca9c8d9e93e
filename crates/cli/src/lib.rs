//! predicate CLI -- parse a transactional log, predict whether a weak
//! execution that respects a target isolation level could still be
//! unserializable, and print the verdict (and, on `sat`, the predicted
//! history).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use predicate_core::{Config, IsolationLevel, Strategy};

#[derive(Debug, Parser)]
#[command(
    name = "predicate",
    about = "Predictive serializability analysis for transactional histories"
)]
pub struct Args {
    /// Path to the log file to analyze.
    pub log: PathBuf,

    /// Target weak isolation level the predicted execution must still satisfy.
    #[arg(long, value_enum, default_value_t = Level::Causal)]
    pub level: Level,

    /// Encoding strategy: full negated-order form, express cycle form, or
    /// the relaxed boundary predicate.
    #[arg(long, value_enum, default_value_t = Shape::Full)]
    pub strategy: Shape,

    /// Informational prediction bound; constrains no axiom.
    #[arg(long)]
    pub bound: Option<u32>,

    /// Emit the full constraint bag and, on `sat`, the model.
    #[arg(long)]
    pub debug: bool,

    /// Emit a DOT-rendered relation graph on `sat`.
    #[arg(long)]
    pub visualize: bool,

    /// Write the predicted history / DOT graph here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl Args {
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            level: self.level.into(),
            strategy: self.strategy.into(),
            bound: self.bound,
            debug: self.debug,
            visualize: self.visualize,
            ..Config::default()
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Level {
    Causal,
    ReadCommitted,
}

impl From<Level> for IsolationLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Causal => Self::Causal,
            Level::ReadCommitted => Self::ReadCommitted,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Causal => write!(f, "causal"),
            Self::ReadCommitted => write!(f, "read-committed"),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shape {
    Full,
    Express,
    Relaxed,
}

impl From<Shape> for Strategy {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Full => Self::Full,
            Shape::Express => Self::Express,
            Shape::Relaxed => Self::Relaxed,
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Express => write!(f, "express"),
            Self::Relaxed => write!(f, "relaxed"),
        }
    }
}
