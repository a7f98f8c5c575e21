use qrschool_core::SyncError;
use qrschool_models::AttendanceMap;
use tracing::{debug, instrument};

use crate::client::StudentApi;

/// Fetch the full attendance snapshot and normalise it.
#[instrument(skip(api, token))]
pub async fn fetch_attendance<A: StudentApi>(api: &A, token: &str) -> Result<AttendanceMap, SyncError> {
    let raw = api.fetch_attendance(token).await?;
    let received = raw.len();
    let map = AttendanceMap::from_wire(raw);
    debug!(received, kept = map.len(), "Attendance snapshot normalised");
    Ok(map)
}
