pub mod fetcher;
pub mod scheduler;
pub mod stager;
pub mod uploader;

pub use fetcher::{ContentFetcher, ContentSource};
pub use scheduler::{run_periodic, JobSlot};
pub use stager::{merge_new, Stager};
pub use uploader::{UploadStats, Uploader};

use modwatch_common::ModwatchError;

pub type Result<T> = std::result::Result<T, ModwatchError>;

/// One fetch cycle: pull everything, merge into the staged dataset.
/// Returns how many records were appended.
pub async fn fetch_and_stage<S: ContentSource>(
    fetcher: &ContentFetcher<S>,
    stager: &Stager,
) -> Result<usize> {
    let records = fetcher.fetch_all().await;
    stager.stage(records).await
}
