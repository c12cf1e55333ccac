//! Core library for the woodwind designer.
//!
//! The crate predicts the notes a wind instrument plays and scores them
//! against a target tuning. Each module owns one layer of that pipeline:
//! ambient air properties, instrument geometry, the acoustic calculator, the
//! tuners that locate resonances, and the evaluators that turn predictions
//! into error vectors for an optimiser. Documents and configuration are
//! loaded through serde and roxmltree.

pub mod calculator;
pub mod config;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod geometry;
pub mod note;
pub mod physics;
pub mod tuner;

#[cfg(test)]
mod fixtures;

pub use calculator::{
    InstrumentCalculator, PlayingCondition, StateVector, TransferMatrix,
    TransmissionLineCalculator,
};
pub use config::{AppConfig, EnvironmentConfig};
pub use document::DocumentFormat;
pub use error::{DesignerError, Result};
pub use evaluator::{weighted_error_norm, CentDeviationEvaluator, Evaluator, FminEvaluator};
pub use geometry::{
    BorePoint, Hole, Instrument, LengthType, Mouthpiece, MouthpieceKind, ReedType, Termination,
};
pub use note::{cents, Fingering, Note, Tuning};
pub use physics::{ParametersBuilder, PhysicalParameters, TemperatureUnit};
pub use tuner::{BisectionTuner, InstrumentTuner, LinearVTuner, TunerConfig};
