// Integration tests for the face encoding store
//
// The encoder is a stand-in that derives a vector from pixel colour, so
// "faces" can be staged with plain PNG files.

use anyhow::Result;
use face_attendance::attendance::{Identity, Label};
use face_attendance::recognition::{
    EmbeddingRecognizer, EncodedFace, EncodingStore, FaceEncoder, FaceMatcher, FaceRegion, Frame,
    MatchPolicy, Recognizer,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Red channel 0 means "no face", 255 means "two faces", anything else is
/// one face whose encoding is the first pixel scaled to 0..1
struct ColourEncoder;

impl FaceEncoder for ColourEncoder {
    fn encode(&mut self, frame: &Frame) -> face_attendance::error::Result<Vec<EncodedFace>> {
        let [r, g, b] = [frame.pixels[0], frame.pixels[1], frame.pixels[2]];
        let face = EncodedFace {
            region: FaceRegion {
                top: 0,
                right: frame.width,
                bottom: frame.height,
                left: 0,
            },
            encoding: vec![r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0],
        };

        Ok(match r {
            0 => vec![],
            255 => vec![face.clone(), face],
            _ => vec![face],
        })
    }
}

fn save_face(dir: &Path, name: &str, rgb: [u8; 3]) {
    fs::create_dir_all(dir).unwrap();
    image::RgbImage::from_pixel(8, 8, image::Rgb(rgb))
        .save(dir.join(name))
        .unwrap();
}

fn frame_of(rgb: [u8; 3]) -> Frame {
    Frame::from_image(0, 0, image::RgbImage::from_pixel(8, 8, image::Rgb(rgb)))
}

#[test]
fn test_build_from_dataset_applies_one_face_rule() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dataset = temp_dir.path().join("face_dataset");

    save_face(&dataset.join("alice"), "alice_1.png", [100, 20, 20]);
    save_face(&dataset.join("alice"), "alice_2.png", [102, 20, 20]);
    save_face(&dataset.join("alice"), "alice_3.png", [255, 20, 20]); // two faces
    save_face(&dataset.join("bob"), "bob_1.png", [20, 200, 20]);
    save_face(&dataset.join("bob"), "bob_2.png", [0, 200, 20]); // no face
    fs::write(dataset.join("bob").join("notes.txt"), "not an image")?;
    fs::write(dataset.join("README.md"), "top-level files are ignored")?;

    let (store, report) = EncodingStore::build_from_dataset(&dataset, &mut ColourEncoder)?;

    assert_eq!(report.people, 2);
    assert_eq!(report.encoded_images, 3);
    assert_eq!(report.rejected_images, 2);
    assert_eq!(report.unreadable_images, 1);

    let ids = store.identities();
    assert_eq!(ids.get("alice"), Some(&2));
    assert_eq!(ids.get("bob"), Some(&1));
    assert_eq!(store.dimension(), Some(3));

    Ok(())
}

#[test]
fn test_store_survives_save_and_load() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("encodings").join("face_encodings.json");

    let store = EncodingStore::from_parts(
        vec!["alice".into(), "bob".into()],
        vec![vec![0.1, 0.2], vec![0.3, 0.4]],
    )?;
    store.save(&path)?;

    assert_eq!(EncodingStore::load(&path)?, store);
    Ok(())
}

#[test]
fn test_load_rejects_malformed_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("bad.json");
    fs::write(&path, r#"{"names": ["alice", "bob"], "encodings": [[0.1, 0.2]]}"#)?;

    assert!(EncodingStore::load(&path).is_err());
    assert!(EncodingStore::load(temp_dir.path().join("missing.json")).is_err());
    Ok(())
}

#[test]
fn test_embedding_recognizer_labels_known_and_unknown_faces() -> Result<()> {
    let store = EncodingStore::from_parts(
        vec!["alice".into(), "bob".into()],
        vec![vec![0.4, 0.08, 0.08], vec![0.08, 0.8, 0.08]],
    )?;
    let matcher = FaceMatcher::new(0.1, MatchPolicy::ClosestMatch);
    let mut recognizer = EmbeddingRecognizer::new(ColourEncoder, store, matcher);

    let alice = recognizer.recognize(&frame_of([100, 20, 20]))?;
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].label, Label::Known(Identity::new("alice")?));

    let stranger = recognizer.recognize(&frame_of([20, 20, 200]))?;
    assert_eq!(stranger[0].label, Label::Unknown);

    assert!(recognizer.recognize(&frame_of([0, 0, 0]))?.is_empty());
    Ok(())
}
