use super::SteadyTimer;
use crate::error::Result;
use crate::ops::async_wait;
use crate::runtime::IoContext;

use std::time::Duration;

/// Suspends the calling routine for `duration`.
///
/// The routine resumes on `context`.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(&ctx, Duration::from_millis(10)).await?;
/// ```
pub async fn sleep(context: &IoContext, duration: Duration) -> Result<()> {
    let timer = SteadyTimer::after(context, duration);
    async_wait(&timer).await
}
