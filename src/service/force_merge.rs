use super::{IndexService, MergeStatus};
use crate::{Error, Result};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Force-merge `indices` and block until the merge has finished.
///
/// A merge on a large index usually outlives the HTTP timeout. When the
/// request times out, the node thread-pool stats are polled every
/// `poll_interval` until no force-merge thread is active.
pub fn force_merge_and_wait(
    service: &dyn IndexService,
    indices: &[String],
    max_segments: u32,
    poll_interval: Duration,
) -> Result<()> {
    if indices.is_empty() {
        return Err(Error::InvalidArgument(
            "force merge needs at least one index".to_string(),
        ));
    }

    info!("Start merging {}", indices.join(", "));
    if service.force_merge(indices, max_segments)? == MergeStatus::TimedOut {
        loop {
            let active = service.force_merge_active()?;
            if active == 0 {
                break;
            }
            info!("Still merging. Active thread count: {}", active);
            thread::sleep(poll_interval);
        }
    }
    info!("Finished merging.");
    Ok(())
}
