use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use atlas_common::{Dataset, DatasetKey, FetchFailure};
use atlas_data::DatasetSource;

#[derive(Clone)]
enum Scripted {
    Body(Vec<u8>),
    Status(u16),
    Network(String),
}

#[derive(Default)]
struct Script {
    responses: HashMap<DatasetKey, Scripted>,
    calls: HashMap<DatasetKey, usize>,
    gates: HashMap<DatasetKey, watch::Receiver<bool>>,
}

/// Dataset source driven entirely by the test.
///
/// Unscripted keys answer 404.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<Script>,
}

/// Holds back responses for one key until released. Dropping the gate
/// releases it too.
pub struct Gate {
    tx: watch::Sender<bool>,
}

impl Gate {
    pub fn release(&self) {
        self.tx.send_replace(true);
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_json(self, dataset: Dataset, body: Value) -> Self {
        self.set_json(dataset, body);
        self
    }

    pub fn with_raw(self, dataset: Dataset, body: &str) -> Self {
        self.script().responses.insert(dataset.key(), Scripted::Body(body.as_bytes().to_vec()));
        self
    }

    pub fn with_status(self, dataset: Dataset, status: u16) -> Self {
        self.script().responses.insert(dataset.key(), Scripted::Status(status));
        self
    }

    pub fn with_network_error(self, dataset: Dataset, message: &str) -> Self {
        self.script()
            .responses
            .insert(dataset.key(), Scripted::Network(message.to_string()));
        self
    }

    /// Replace the response for `dataset`.
    pub fn set_json(&self, dataset: Dataset, body: Value) {
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        self.script().responses.insert(dataset.key(), Scripted::Body(bytes));
    }

    /// Make fetches of `dataset` wait until the returned gate is released.
    pub fn hold(&self, dataset: Dataset) -> Gate {
        let (tx, rx) = watch::channel(false);
        self.script().gates.insert(dataset.key(), rx);
        Gate { tx }
    }

    /// Number of fetches issued for `dataset`.
    pub fn calls(&self, dataset: Dataset) -> usize {
        self.script().calls.get(&dataset.key()).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.script().calls.values().sum()
    }
}

#[async_trait]
impl DatasetSource for ScriptedSource {
    async fn fetch(&self, key: &DatasetKey) -> Result<Vec<u8>, FetchFailure> {
        let gate = {
            let mut script = self.script();
            *script.calls.entry(key.clone()).or_default() += 1;
            script.gates.get(key).cloned()
        };

        if let Some(mut gate) = gate {
            // A dropped gate counts as released
            let _ = gate.wait_for(|open| *open).await;
        }

        let response = self.script().responses.get(key).cloned();
        match response {
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Status(code)) => Err(FetchFailure::status(key.clone(), code)),
            Some(Scripted::Network(msg)) => Err(FetchFailure::network(key.clone(), msg)),
            None => Err(FetchFailure::status(key.clone(), 404)),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
