//! Datastore collaborator.
//!
//! The core only needs equality lookups, counts and removal. Every call goes
//! through [`DatastoreClient`], which bounds it with a timeout so a slow
//! backend cannot hold a connection task forever.

pub mod client;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::rest::document::Document;
use crate::rest::query::SortSpec;

pub use client::DatastoreClient;
pub use memory::MemoryDatastore;

/// Field → value equality constraints, all of which must hold.
pub type Filter = Document;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: SortSpec,
    pub skip: u64,
    /// `None` returns every remaining document.
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DatastoreError {
    #[error("datastore did not answer within {0:?}")]
    Timeout(Duration),

    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Datastore: Send + Sync {
    async fn find(&self, source: &str, query: &FindQuery) -> Result<Vec<Document>, DatastoreError>;

    async fn count(&self, source: &str, filter: &Filter) -> Result<u64, DatastoreError>;

    /// Removes every matching document and returns how many went away.
    async fn remove(&self, source: &str, filter: &Filter) -> Result<u64, DatastoreError>;
}
