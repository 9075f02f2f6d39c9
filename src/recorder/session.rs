use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use uuid::Uuid;

use super::capture::{CaptureJob, Region};
use super::click_event::ClickEvent;
use super::types::Step;
use crate::error::RecorderError;

pub const SCREENSHOTS_DIR: &str = "screenshots";

/// One recording: its folder, clock and recorded steps.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub steps: Vec<Step>,
    pub output_dir: PathBuf,
    pub started_at: Instant,
}

impl Session {
    /// Create `recording_<timestamp>` (and its `screenshots` folder) under `base_dir`.
    ///
    /// A second session started within the same second gets a `_2`, `_3`, ...
    /// suffix instead of sharing the folder.
    pub fn create(base_dir: &Path, now: DateTime<Local>) -> Result<Self, RecorderError> {
        std::fs::create_dir_all(base_dir).map_err(|source| RecorderError::DirectoryCreation {
            path: base_dir.to_path_buf(),
            source,
        })?;

        let stem = format!("recording_{}", now.format("%Y-%m-%d_%H-%M-%S"));
        let mut output_dir = base_dir.join(&stem);
        let mut attempt = 1;
        loop {
            match std::fs::create_dir(&output_dir) {
                Ok(()) => break,
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    output_dir = base_dir.join(format!("{stem}_{attempt}"));
                }
                Err(source) => {
                    return Err(RecorderError::DirectoryCreation {
                        path: output_dir,
                        source,
                    })
                }
            }
        }

        let screenshots = output_dir.join(SCREENSHOTS_DIR);
        if let Err(source) = std::fs::create_dir(&screenshots) {
            let _ = std::fs::remove_dir(&output_dir);
            return Err(RecorderError::DirectoryCreation {
                path: screenshots,
                source,
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            steps: Vec::new(),
            output_dir,
            started_at: Instant::now(),
        })
    }

    /// Remove the session folder if nothing was written into it.
    pub fn discard_if_empty(&self) {
        let _ = std::fs::remove_dir(self.output_dir.join(SCREENSHOTS_DIR));
        let _ = std::fs::remove_dir(&self.output_dir);
    }

    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn screenshot_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(SCREENSHOTS_DIR).join(file_name)
    }

    /// Append a step for `click` and return it with the capture job for its screenshot.
    pub fn record(
        &mut self,
        click: &ClickEvent,
        now: DateTime<Local>,
        capture_half_size: i32,
    ) -> (Step, CaptureJob) {
        let step = Step::new(
            self.next_step_number(),
            now.format("%H:%M:%S").to_string(),
            self.elapsed(),
            click.button,
            click.x,
            click.y,
        );
        let job = CaptureJob {
            step: step.step,
            region: Region::around(click.x, click.y, capture_half_size),
            path: self.screenshot_path(&step.screenshot),
        };
        self.steps.push(step.clone());
        (step, job)
    }

    /// Replace the screenshot of every step not in `saved` with the sentinel.
    pub fn apply_capture_results(steps: &mut [Step], saved: &HashSet<u32>) {
        for step in steps.iter_mut() {
            if step.has_screenshot() && !saved.contains(&step.step) {
                step.mark_missing_screenshot();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::click_event::MouseButton;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn session_creates_named_dir_with_screenshots() {
        let base = tempfile::tempdir().expect("tempdir");
        let session = Session::create(base.path(), fixed_time()).expect("create session");
        assert_eq!(
            session.output_dir,
            base.path().join("recording_2024-03-09_14-05-07")
        );
        assert!(session.output_dir.join("screenshots").is_dir());
        assert!(session.steps.is_empty());
    }

    #[test]
    fn same_second_sessions_get_distinct_dirs() {
        let base = tempfile::tempdir().expect("tempdir");
        let first = Session::create(base.path(), fixed_time()).unwrap();
        let second = Session::create(base.path(), fixed_time()).unwrap();
        assert_ne!(first.output_dir, second.output_dir);
        assert!(second
            .output_dir
            .ends_with("recording_2024-03-09_14-05-07_2"));
    }

    #[test]
    fn create_fails_under_a_file() {
        let base = tempfile::tempdir().expect("tempdir");
        let blocker = base.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let result = Session::create(&blocker, fixed_time());
        assert!(matches!(
            result,
            Err(RecorderError::DirectoryCreation { .. })
        ));
    }

    #[test]
    fn record_assigns_sequence_and_capture_job() {
        let base = tempfile::tempdir().expect("tempdir");
        let mut session = Session::create(base.path(), fixed_time()).unwrap();
        assert_eq!(session.next_step_number(), 1);

        let click = ClickEvent::press(400, 50, MouseButton::Left);
        let (step, job) = session.record(&click, fixed_time(), 150);
        assert_eq!(step.step, 1);
        assert_eq!(step.time, "14:05:07");
        assert_eq!(job.step, 1);
        assert_eq!(job.region, Region::around(400, 50, 150));
        assert_eq!(
            job.path,
            session.output_dir.join("screenshots").join("step_1.png")
        );

        session.record(&click, fixed_time(), 150);
        assert_eq!(session.next_step_number(), 3);
    }

    #[test]
    fn capture_results_mark_unsaved_steps() {
        let mut steps: Vec<Step> = (1..=3).map(Step::sample).collect();
        Session::apply_capture_results(&mut steps, &HashSet::from([1, 3]));
        assert!(steps[0].has_screenshot());
        assert!(!steps[1].has_screenshot());
        assert_eq!(steps[2].screenshot, "step_3.png");
    }
}
