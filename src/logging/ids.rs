//! Correlation ids

use uuid::Uuid;

/// Generate a new batch run ID using UUID v4
///
/// Every question processed in one batch logs the same `run_id`.
///
/// # Examples
///
/// ```
/// use plotwise::logging::generate_run_id;
///
/// let run_id = generate_run_id();
/// assert_eq!(run_id.len(), 36);
/// ```
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}
