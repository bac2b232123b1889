//! The `DetectionOracle` external interface (§6): person detection is an
//! opaque collaborator behind a fixed trait boundary — the CNN model, image
//! cache, and URL-download machinery it would use in a full deployment are
//! out of scope here.

use sar_core::{DroneRng, Position};
use std::collections::BTreeSet;

use crate::message::Detection;

/// One detector response.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    pub person_detected: bool,
    pub confidence: f64,
    pub detections: Vec<Detection>,
    pub detection_method: &'static str,
}

impl DetectionResult {
    fn none(method: &'static str) -> Self {
        DetectionResult {
            person_detected: false,
            confidence: 0.0,
            detections: vec![],
            detection_method: method,
        }
    }
}

/// Raised when the oracle cannot produce a result. Drones treat any error as
/// "oracle unavailable" and fall back to a seeded Bernoulli draw.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// A pluggable person detector. Implementations may wrap a real CNN, a test
/// double, or — as here — the built-in simulated detector.
pub trait DetectionOracle: Send + Sync {
    fn detect(
        &self,
        position: Position,
        target_positions: &BTreeSet<Position>,
    ) -> Result<DetectionResult, OracleError>;
}

/// The default oracle: a person is "detected" with fixed high confidence
/// exactly when the scanned tile is a target tile. Mirrors the source's
/// `simulate=True` detection mode.
#[derive(Default)]
pub struct SimulatedOracle;

impl DetectionOracle for SimulatedOracle {
    fn detect(
        &self,
        position: Position,
        target_positions: &BTreeSet<Position>,
    ) -> Result<DetectionResult, OracleError> {
        if target_positions.contains(&position) {
            Ok(DetectionResult {
                person_detected: true,
                confidence: 0.92,
                detections: vec![Detection {
                    bbox: (0, 0, 1, 1),
                    confidence: 0.92,
                }],
                detection_method: "simulated",
            })
        } else {
            Ok(DetectionResult::none("simulated"))
        }
    }
}

/// Seeded Bernoulli fallback used when the oracle reports unavailable: a
/// target tile is positively detected with probability `detection_probability`.
pub fn bernoulli_fallback(
    position: Position,
    target_positions: &BTreeSet<Position>,
    detection_probability: f64,
    rng: &mut DroneRng,
) -> DetectionResult {
    if target_positions.contains(&position) && rng.gen_bool(detection_probability) {
        DetectionResult {
            person_detected: true,
            confidence: detection_probability,
            detections: vec![],
            detection_method: "probability_fallback",
        }
    } else {
        DetectionResult::none("probability_fallback")
    }
}
