use indicatif::{ProgressBar, ProgressStyle};

/// Standard progress bar style
pub fn create_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

/// Bar over `len` units labelled with `message`, or a hidden one when disabled
pub fn phase_bar(len: usize, message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(create_progress_style());
    bar.set_message(message.to_string());
    bar
}
