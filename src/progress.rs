use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle, style::TemplateError};

/// Creates a styled progress bar with elapsed time, a fixed-width message
/// label, and position/total counters.
///
/// # Errors
///
/// Returns a [`TemplateError`] if the progress bar style template is invalid.
pub(crate) fn bar(size: u64, msg: impl Into<String>) -> Result<ProgressBar, TemplateError> {
    let pb = ProgressBar::new(size);
    let style =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {msg:<30!} {wide_bar} {pos}/{len}")?;

    pb.set_style(style);
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_secs(1));

    Ok(pb)
}

/// A progress bar that is only drawn when `show` is set.
pub(crate) fn optional(
    show: bool,
    size: u64,
    msg: impl Into<String>,
) -> Result<ProgressBar, TemplateError> {
    if show {
        bar(size, msg)
    } else {
        Ok(ProgressBar::hidden())
    }
}
