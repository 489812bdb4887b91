use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::frame::Frame;

/// Camera capture trait
///
/// Implementations:
/// - Live cameras live outside this crate (the device API is an external capability)
/// - `ImageDirSource`: replays still images from a directory (testing/batch processing)
#[async_trait::async_trait]
pub trait FrameSource: Send {
    /// Open the device and start capturing
    ///
    /// Returns a channel receiver that will receive frames. The channel closing
    /// means the device has no more frames.
    async fn start(&mut self) -> Result<mpsc::Receiver<Frame>>;

    /// Stop capturing and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Replays image files from a directory, in file name order, as frames
pub struct ImageDirSource {
    dir: PathBuf,
    name: String,
    frame_interval: Duration,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl ImageDirSource {
    pub fn new(dir: impl AsRef<Path>, frame_interval: Duration) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            name: format!("image-dir:{}", dir.display()),
            dir,
            frame_interval,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn image_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read image directory: {:?}", self.dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[async_trait::async_trait]
impl FrameSource for ImageDirSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<Frame>> {
        let paths = self.image_paths()?;
        info!("Replaying {} images from {}", paths.len(), self.dir.display());

        let (tx, rx) = mpsc::channel(8);
        let capturing = Arc::clone(&self.capturing);
        let interval = self.frame_interval;
        capturing.store(true, Ordering::SeqCst);

        self.task = Some(tokio::spawn(async move {
            let mut sequence = 0u64;

            for path in paths {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                let image = match image::open(&path) {
                    Ok(image) => image.to_rgb8(),
                    Err(e) => {
                        warn!("Skipping unreadable image {}: {}", path.display(), e);
                        continue;
                    }
                };

                let timestamp_ms = sequence * interval.as_millis() as u64;
                let frame = Frame::from_image(sequence, timestamp_ms, image);
                if tx.send(frame).await.is_err() {
                    break;
                }

                sequence += 1;
                tokio::time::sleep(interval).await;
            }

            capturing.store(false, Ordering::SeqCst);
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(task) = self.task.take() {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Image replay task failed: {}", e);
                }
            }
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
