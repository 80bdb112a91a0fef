//! Storage adapters implementing the domain ports.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;

use crate::domain::ports::{BookingStoreBox, TrainStoreBox, UserStoreBox};
use crate::error::Result;
use in_memory::{InMemoryBookingStore, InMemoryTrainStore, InMemoryUserStore};
use std::path::Path;

/// A storage backend that hands out one boxed handle per port.
///
/// Handles are cheap clones sharing the same underlying data, so every
/// service gets its own explicitly passed handle.
#[derive(Clone)]
pub enum Stores {
    InMemory {
        users: InMemoryUserStore,
        trains: InMemoryTrainStore,
        bookings: InMemoryBookingStore,
    },
    #[cfg(feature = "storage-rocksdb")]
    RocksDB(rocksdb::RocksDBStore),
}

impl Stores {
    pub fn in_memory() -> Self {
        Self::InMemory {
            users: InMemoryUserStore::new(),
            trains: InMemoryTrainStore::new(),
            bookings: InMemoryBookingStore::new(),
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    pub fn rocksdb(path: &Path) -> Result<Self> {
        Ok(Self::RocksDB(rocksdb::RocksDBStore::open(path)?))
    }

    pub fn users(&self) -> UserStoreBox {
        match self {
            Self::InMemory { users, .. } => Box::new(users.clone()),
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDB(store) => Box::new(store.clone()),
        }
    }

    pub fn trains(&self) -> TrainStoreBox {
        match self {
            Self::InMemory { trains, .. } => Box::new(trains.clone()),
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDB(store) => Box::new(store.clone()),
        }
    }

    pub fn bookings(&self) -> BookingStoreBox {
        match self {
            Self::InMemory { bookings, .. } => Box::new(bookings.clone()),
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDB(store) => Box::new(store.clone()),
        }
    }
}

/// Persistent storage when a path is given, otherwise in-memory.
///
/// Without the `storage-rocksdb` feature a path is ignored with a warning.
pub fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            tracing::debug!(path = %path.display(), "opening RocksDB storage");
            Stores::rocksdb(path)
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
            );
            Ok(Stores::in_memory())
        }
        None => Ok(Stores::in_memory()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::train::default_trains;

    #[tokio::test]
    async fn test_handles_share_data() {
        let stores = Stores::in_memory();
        let writer = stores.trains();
        let reader = stores.trains();

        for train in default_trains().unwrap() {
            writer.insert(train).await.unwrap();
        }
        assert_eq!(reader.list().await.unwrap().len(), 3);
    }
}
