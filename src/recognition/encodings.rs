use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::frame::Frame;
use super::recognizer::FaceEncoder;
use crate::error::{AttendanceError, Result};

/// Reference face encodings for every known person
///
/// `names[i]` owns `encodings[i]`; one person may have many encodings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingStore {
    names: Vec<String>,
    encodings: Vec<Vec<f32>>,
}

/// What `build_from_dataset` did with the dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub people: usize,
    pub encoded_images: usize,
    pub unreadable_images: usize,
    /// Images with zero or several faces
    pub rejected_images: usize,
}

impl EncodingStore {
    pub fn from_parts(names: Vec<String>, encodings: Vec<Vec<f32>>) -> Result<Self> {
        let store = Self { names, encodings };
        store.validate()?;
        Ok(store)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading face encodings: {}", path.display());

        let bytes = fs::read(path).map_err(|e| {
            AttendanceError::EncodingStore(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let store: Self = serde_json::from_slice(&bytes).map_err(|e| {
            AttendanceError::EncodingStore(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        store.validate()?;

        info!(
            "Encodings loaded: {} encodings for {} people",
            store.len(),
            store.identities().len()
        );

        Ok(store)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let to_err = |e: String| {
            AttendanceError::EncodingStore(format!("Failed to write {}: {}", path.display(), e))
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| to_err(e.to_string()))?;
        }
        let json = serde_json::to_vec(self).map_err(|e| to_err(e.to_string()))?;
        fs::write(path, json).map_err(|e| to_err(e.to_string()))?;

        info!("Encodings saved to: {}", path.display());
        Ok(())
    }

    /// Encode a dataset laid out as `<dir>/<person>/<image>`
    ///
    /// Only images with exactly one face are used.
    pub fn build_from_dataset(
        dir: impl AsRef<Path>,
        encoder: &mut dyn FaceEncoder,
    ) -> Result<(Self, BuildReport)> {
        let dir = dir.as_ref();
        info!("Starting face encoding process: {}", dir.display());

        let mut store = Self::default();
        let mut report = BuildReport::default();

        for person_dir in sorted_entries(dir)? {
            if !person_dir.is_dir() {
                continue;
            }
            let Some(person) = person_dir.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };

            info!("Processing person: {}", person);
            report.people += 1;

            for (index, image_path) in sorted_entries(&person_dir)?.into_iter().enumerate() {
                let image = match image::open(&image_path) {
                    Ok(image) => image.to_rgb8(),
                    Err(e) => {
                        debug!("Skipping {}: {}", image_path.display(), e);
                        report.unreadable_images += 1;
                        continue;
                    }
                };

                let frame = Frame::from_image(index as u64, 0, image);
                let mut faces = encoder.encode(&frame)?;

                if faces.len() != 1 {
                    debug!(
                        "Skipping {}: {} faces found",
                        image_path.display(),
                        faces.len()
                    );
                    report.rejected_images += 1;
                    continue;
                }

                store.push(person.clone(), faces.remove(0).encoding)?;
                report.encoded_images += 1;
            }
        }

        info!("Encoding complete: {} encodings total", store.len());
        Ok((store, report))
    }

    pub fn push(&mut self, name: String, encoding: Vec<f32>) -> Result<()> {
        if let Some(dim) = self.dimension() {
            if encoding.len() != dim {
                return Err(AttendanceError::EncodingStore(format!(
                    "Encoding for {} has {} values, expected {}",
                    name,
                    encoding.len(),
                    dim
                )));
            }
        }
        self.names.push(name);
        self.encodings.push(encoding);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    /// Length of every encoding, or `None` for an empty store
    pub fn dimension(&self) -> Option<usize> {
        self.encodings.first().map(Vec::len)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.encodings.iter().map(Vec::as_slice))
    }

    /// Encoding count per person
    pub fn identities(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for name in &self.names {
            *counts.entry(name.as_str()).or_insert(0) += 1;
        }
        counts
    }

    fn validate(&self) -> Result<()> {
        if self.names.len() != self.encodings.len() {
            return Err(AttendanceError::EncodingStore(format!(
                "{} names but {} encodings",
                self.names.len(),
                self.encodings.len()
            )));
        }

        if let Some(dim) = self.dimension() {
            if let Some(i) = self.encodings.iter().position(|e| e.len() != dim) {
                return Err(AttendanceError::EncodingStore(format!(
                    "Encoding {} ({}) has {} values, expected {}",
                    i,
                    self.names[i],
                    self.encodings[i].len(),
                    dim
                )));
            }
        }

        if self.is_empty() {
            warn!("Encoding store is empty; every face will be unknown");
        }

        Ok(())
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AttendanceError::EncodingStore(format!("Failed to read {}: {}", dir.display(), e))
    })?;

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    Ok(paths)
}
