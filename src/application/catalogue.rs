use crate::domain::ports::TrainStore;
use crate::domain::train::NewTrain;
use crate::error::Result;

pub use crate::domain::train::default_trains;

/// Installs `trains` when the catalogue is empty and returns how many were
/// added. A populated catalogue is left alone.
pub async fn seed_if_empty(store: &dyn TrainStore, trains: Vec<NewTrain>) -> Result<usize> {
    let count = store.insert_all_if_empty(trains).await?;
    if count > 0 {
        tracing::info!(count, "train catalogue seeded");
    }
    Ok(count)
}
