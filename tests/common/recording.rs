//! A directory double that records every call before delegating to an
//! in-memory directory.

use ldap_schema_harness::directory::{
    DirectoryClient, Entry, InMemoryDirectory, Modification, SearchRequest,
};
use ldap_schema_harness::error::DirectoryResult;
use ldap_schema_harness::value_objects::Dn;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One call received by the double.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search(SearchRequest),
    Add(Dn),
    Modify(Dn, Vec<Modification>),
    Delete(Dn),
}

impl Call {
    pub fn is_write(&self) -> bool {
        !matches!(self, Call::Search(_))
    }
}

/// Records calls; clones share the log and the underlying directory.
#[derive(Clone)]
pub struct RecordingDirectory {
    inner: InMemoryDirectory,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingDirectory {
    pub fn new(inner: InMemoryDirectory) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn inner(&self) -> &InMemoryDirectory {
        &self.inner
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn writes(&self) -> Vec<Call> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

impl DirectoryClient for RecordingDirectory {
    async fn search(&self, request: SearchRequest) -> DirectoryResult<Vec<Entry>> {
        self.record(Call::Search(request.clone())).await;
        self.inner.search(request).await
    }

    async fn add(&self, entry: Entry) -> DirectoryResult<()> {
        self.record(Call::Add(entry.dn().clone())).await;
        self.inner.add(entry).await
    }

    async fn modify(&self, dn: Dn, changes: Vec<Modification>) -> DirectoryResult<()> {
        self.record(Call::Modify(dn.clone(), changes.clone())).await;
        self.inner.modify(dn, changes).await
    }

    async fn delete(&self, dn: Dn) -> DirectoryResult<()> {
        self.record(Call::Delete(dn.clone())).await;
        self.inner.delete(dn).await
    }
}
