use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid region left={left} top={top} right={right} bottom={bottom}")]
    InvalidRegion {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },
    #[error("screen capture failed: {0}")]
    Backend(String),
    #[error("could not encode screenshot: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A screen rectangle in absolute desktop coordinates, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Region {
    /// The fixed box of `half` pixels on every side of `(x, y)`.
    pub fn around(x: i32, y: i32, half: i32) -> Self {
        Self {
            left: x.saturating_sub(half),
            top: y.saturating_sub(half),
            right: x.saturating_add(half),
            bottom: y.saturating_add(half),
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }

    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let clipped = Region {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        (!clipped.is_empty()).then_some(clipped)
    }

    pub(crate) fn invalid(&self) -> CaptureError {
        CaptureError::InvalidRegion {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
        }
    }
}

/// Grabs a region of the screen and saves it as an image file.
pub trait ScreenshotProvider: Send + Sync {
    fn capture_region(&self, region: Region, output: &Path) -> Result<(), CaptureError>;
}

/// One pending screenshot for a recorded step.
#[derive(Debug, Clone)]
pub struct CaptureJob {
    pub step: u32,
    pub region: Region,
    pub path: PathBuf,
}

/// Background thread that saves screenshots in the order steps were recorded.
///
/// Finishing the worker drains the queue and yields the steps whose screenshot
/// was saved.
pub struct CaptureWorker {
    tx: Sender<CaptureJob>,
    handle: JoinHandle<HashSet<u32>>,
}

impl CaptureWorker {
    pub fn spawn(provider: Arc<dyn ScreenshotProvider>) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<CaptureJob>();
        let handle = thread::Builder::new()
            .name("stepsnap-capture".to_string())
            .spawn(move || {
                let mut saved = HashSet::new();
                for job in rx {
                    match provider.capture_region(job.region, &job.path) {
                        Ok(()) => {
                            debug!(step = job.step, path = %job.path.display(), "screenshot saved");
                            saved.insert(job.step);
                        }
                        Err(err) => {
                            warn!(step = job.step, "screenshot capture failed: {err}");
                        }
                    }
                }
                saved
            })?;
        Ok(Self { tx, handle })
    }

    /// Queue a capture. Returns `false` if the worker is gone.
    pub fn submit(&self, job: CaptureJob) -> bool {
        self.tx.send(job).is_ok()
    }

    /// Close the queue, wait for outstanding captures and return the saved steps.
    pub fn finish(self) -> HashSet<u32> {
        drop(self.tx);
        match self.handle.join() {
            Ok(saved) => saved,
            Err(_) => {
                error!("capture worker panicked; treating all screenshots as missing");
                HashSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingProvider {
        fail_step_file: &'static str,
        seen: Mutex<Vec<Region>>,
    }

    impl ScreenshotProvider for RecordingProvider {
        fn capture_region(&self, region: Region, output: &Path) -> Result<(), CaptureError> {
            self.seen.lock().unwrap().push(region);
            if output.ends_with(self.fail_step_file) {
                return Err(CaptureError::Backend("no display".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn region_around_click_is_300_square() {
        let region = Region::around(100, 200, 150);
        assert_eq!(
            region,
            Region {
                left: -50,
                top: 50,
                right: 250,
                bottom: 350
            }
        );
        assert_eq!((region.width(), region.height()), (300, 300));
        assert_eq!(region.center(), (100, 200));
    }

    #[test]
    fn intersect_clips_to_bounds() {
        let screen = Region {
            left: 0,
            top: 0,
            right: 1920,
            bottom: 1080,
        };
        let clipped = Region::around(10, 1075, 150).intersect(&screen).unwrap();
        assert_eq!(
            clipped,
            Region {
                left: 0,
                top: 925,
                right: 160,
                bottom: 1080
            }
        );

        let off_screen = Region::around(-500, -500, 150);
        assert!(off_screen.intersect(&screen).is_none());
    }

    #[test]
    fn worker_reports_saved_steps_in_order() {
        let provider = Arc::new(RecordingProvider {
            fail_step_file: "step_2.png",
            seen: Mutex::new(Vec::new()),
        });
        let worker = CaptureWorker::spawn(provider.clone()).expect("spawn worker");
        for step in 1..=3 {
            assert!(worker.submit(CaptureJob {
                step,
                region: Region::around(step as i32, 0, 1),
                path: PathBuf::from(format!("screenshots/step_{step}.png")),
            }));
        }
        let saved = worker.finish();

        assert_eq!(saved, HashSet::from([1, 3]));
        let seen = provider.seen.lock().unwrap();
        let centers: Vec<i32> = seen.iter().map(|region| region.center().0).collect();
        assert_eq!(centers, vec![1, 2, 3]);
    }
}
