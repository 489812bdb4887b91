use super::encodings::EncodingStore;
use super::frame::{FaceRegion, Frame};
use super::matcher::FaceMatcher;
use crate::attendance::Label;
use crate::error::Result;

/// One face found in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub region: FaceRegion,
    pub label: Label,
}

/// A face and its feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFace {
    pub region: FaceRegion,
    pub encoding: Vec<f32>,
}

/// Turns a frame into labeled faces
///
/// Detection and matching are opaque to the attendance core.
pub trait Recognizer: Send {
    fn recognize(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Finds faces and computes one feature vector per face
pub trait FaceEncoder: Send {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedFace>>;
}

/// Recognizer built from an external encoder and the known-face store
pub struct EmbeddingRecognizer<E> {
    encoder: E,
    store: EncodingStore,
    matcher: FaceMatcher,
}

impl<E: FaceEncoder> EmbeddingRecognizer<E> {
    pub fn new(encoder: E, store: EncodingStore, matcher: FaceMatcher) -> Self {
        Self {
            encoder,
            store,
            matcher,
        }
    }
}

impl<E: FaceEncoder> Recognizer for EmbeddingRecognizer<E> {
    fn recognize(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let faces = self.encoder.encode(frame)?;

        Ok(faces
            .into_iter()
            .map(|face| Detection {
                region: face.region,
                label: self.matcher.identify(&self.store, &face.encoding).label,
            })
            .collect())
    }
}
