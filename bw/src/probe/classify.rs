//! Classification of `git pull` output

use tracing::debug;

/// Substring git prints when the pull brought nothing new
pub const UP_TO_DATE_MARKER: &str = "Already up to date";

/// Decide from pull stdout whether new commits arrived
///
/// Case-sensitive substring match on [`UP_TO_DATE_MARKER`]. Anything else is
/// treated as an update, including conflict notices, messages from a fresh
/// checkout and translated git output.
pub fn classify_pull_output(stdout: &str) -> bool {
    let has_updates = !stdout.contains(UP_TO_DATE_MARKER);
    debug!(has_updates, stdout_len = stdout.len(), "classify_pull_output: classified");
    has_updates
}
