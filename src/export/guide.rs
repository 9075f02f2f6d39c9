use super::ArtifactError;
use crate::recorder::session::SCREENSHOTS_DIR;
use crate::recorder::types::Step;
use chrono::{DateTime, Local};
use std::path::Path;

/// Generate the plain-text training guide.
pub fn generate_content(steps: &[Step], generated_at: DateTime<Local>) -> String {
    let mut text = format!(
        "TRAINING DOCUMENT - Generated {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    text.push_str(&"=".repeat(40));
    text.push_str("\n\n");

    for step in steps {
        text.push_str(&format!("STEP {}: {}\n", step.step, step.wiki_entry));
        text.push_str(&format!(
            "Visual Reference: {SCREENSHOTS_DIR}/{}\n\n",
            step.screenshot
        ));
    }

    text
}

pub fn write(path: &Path, steps: &[Step], generated_at: DateTime<Local>) -> Result<(), ArtifactError> {
    std::fs::write(path, generate_content(steps, generated_at))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn guide_lists_steps_with_visual_references() {
        let generated_at = Local.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let mut second = Step::sample(2);
        second.mark_missing_screenshot();
        let content = generate_content(&[Step::sample(1), second], generated_at);

        let expected = "TRAINING DOCUMENT - Generated 2024-05-01 08:30:00\n\
            ========================================\n\
            \n\
            STEP 1: User performed a left click at screen coordinates 100, 200.\n\
            Visual Reference: screenshots/step_1.png\n\
            \n\
            STEP 2: User performed a left click at screen coordinates 100, 200.\n\
            Visual Reference: screenshots/MISSING_SCREENSHOT\n\
            \n";
        assert_eq!(content, expected);
    }
}
