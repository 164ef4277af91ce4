//! Cleanup of raw job output before it is shown as failure diagnostics.

/// Prefix of the banner line the service writes at job start.
const JOB_BANNER: &str = "=== Job";
/// Prefix of the line listing the job's input files.
const INPUTS_SUMMARY: &str = "Inputs:";

/// Removes banner and inputs-summary lines, keeping every other line (and
/// its line ending) untouched.
pub fn clean_log(raw: &str) -> String {
    raw.split_inclusive('\n')
        .filter(|line| !(line.starts_with(JOB_BANNER) || line.starts_with(INPUTS_SUMMARY)))
        .collect()
}
