//! Attendance synchronization.
//!
//! - [`controller`]: the staged pipeline and live channel loop
//! - [`snapshot`]: the immutable state consumers observe
//! - [`schedule`]: schedule assembly with whole-batch retry
//! - [`attendance`]: snapshot fetch and normalisation

pub mod attendance;
pub mod controller;
pub mod schedule;
pub mod snapshot;

pub use attendance::fetch_attendance;
pub use controller::SyncController;
pub use schedule::{RetryPolicy, assemble, fetch_schedule};
pub use snapshot::{ChannelState, SyncHandle, SyncSnapshot, SyncStage};

use qrschool_auth::{AuthApi, SessionProvider, TokenStore};
use qrschool_core::SyncError;
use qrschool_models::{AttendanceMap, ScheduleSlot, StudentProfile};

use crate::client::StudentApi;

/// Everything the week screen needs, fetched once without a live channel.
#[derive(Debug, Clone)]
pub struct StudentData {
    pub profile: StudentProfile,
    pub schedule: Vec<ScheduleSlot>,
    pub attendance: AttendanceMap,
}

/// Run the bootstrap and REST stages of the pipeline once.
pub async fn load_once<A, S>(
    api: &A,
    session: &SessionProvider<S, A>,
    policy: &RetryPolicy,
) -> Result<StudentData, SyncError>
where
    A: StudentApi + AuthApi,
    S: TokenStore,
{
    let token = session.get_valid_token().await?;
    let profile = api.fetch_profile(&token).await?;
    let (schedule, attendance) = tokio::try_join!(
        fetch_schedule(api, &token, policy),
        fetch_attendance(api, &token),
    )?;
    Ok(StudentData {
        profile,
        schedule,
        attendance,
    })
}
