//! Face descriptor port and matching.
//!
//! Extracting a descriptor from an image is delegated to an external encoder;
//! deciding whether descriptors match happens here.

pub mod command;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use command::CommandEncoder;

#[derive(Debug, thiserror::Error)]
pub enum BiometricError {
    #[error("face encoder unavailable: {0}")]
    Unavailable(String),
    #[error("face encoder returned malformed output: {0}")]
    Malformed(String),
}

/// A face embedding as produced by the encoder (128 floats for dlib models).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(pub Vec<f64>);

impl Descriptor {
    /// Euclidean distance. Descriptors of different length never match.
    pub fn distance(&self, other: &Descriptor) -> Option<f64> {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return None;
        }
        let sum: f64 = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Some(sum.sqrt())
    }
}

#[async_trait]
pub trait FaceEncoder: Send + Sync {
    /// Returns one descriptor per detected face; empty when no face was found.
    async fn extract(&self, image: &[u8]) -> Result<Vec<Descriptor>, BiometricError>;
}

/// Number of `stored` descriptors within `tolerance` of `query`.
pub fn compare_many(stored: &[Descriptor], query: &Descriptor, tolerance: f64) -> usize {
    stored
        .iter()
        .filter_map(|known| known.distance(query))
        .filter(|distance| *distance <= tolerance)
        .count()
}

/// Returns a fixed answer for every image.
#[cfg(test)]
pub struct ScriptedEncoder {
    pub faces: Vec<Descriptor>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedEncoder {
    pub fn returning(faces: Vec<Descriptor>) -> Self {
        Self {
            faces,
            calls: Default::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl FaceEncoder for ScriptedEncoder {
    async fn extract(&self, _image: &[u8]) -> Result<Vec<Descriptor>, BiometricError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.faces.clone())
    }
}

#[cfg(test)]
mod biometric_tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Descriptor(vec![0.0, 0.0]);
        let b = Descriptor(vec![3.0, 4.0]);
        assert_eq!(a.distance(&b), Some(5.0));
    }

    #[test]
    fn mismatched_lengths_never_match() {
        let a = Descriptor(vec![0.0, 0.0]);
        let b = Descriptor(vec![0.0, 0.0, 0.0]);
        assert_eq!(a.distance(&b), None);
        assert_eq!(compare_many(&[a], &b, 10.0), 0);
    }

    #[test]
    fn counts_descriptors_within_tolerance() {
        let stored = vec![
            Descriptor(vec![0.1, 0.1]),
            Descriptor(vec![0.3, 0.0]),
            Descriptor(vec![0.9, 0.9]),
        ];
        let query = Descriptor(vec![0.0, 0.0]);
        assert_eq!(compare_many(&stored, &query, 0.5), 2);
        assert_eq!(compare_many(&stored, &query, 0.2), 1);
        assert_eq!(compare_many(&[], &query, 0.5), 0);
    }

    #[test]
    fn descriptor_is_a_bare_json_array() {
        let parsed: Vec<Descriptor> = serde_json::from_str("[[0.5, 0.25], [1.0, 2.0]]").unwrap();
        assert_eq!(parsed[1], Descriptor(vec![1.0, 2.0]));
    }
}
