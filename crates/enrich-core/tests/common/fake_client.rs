//! In-process lookup service with per-key behaviour and call counters.

use std::collections::HashMap;
use std::sync::Mutex;

use enrich_core::lookup::{LookupClient, LookupError, Rating};

#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Value(Rating),
    NoMatch,
    AlwaysTimeout,
}

/// Keys not configured explicitly get `default`.
pub struct FakeClient {
    behaviours: HashMap<String, Behaviour>,
    default: Behaviour,
    calls: Mutex<HashMap<String, u32>>,
}

impl FakeClient {
    pub fn new(default: Behaviour) -> Self {
        Self {
            behaviours: HashMap::new(),
            default,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with(mut self, key: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(key.to_string(), behaviour);
        self
    }

    pub fn calls_for(&self, key: &str) -> u32 {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

impl LookupClient for FakeClient {
    fn lookup(&self, key: &str) -> Result<Option<Rating>, LookupError> {
        *self.calls.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
        match self.behaviours.get(key).copied().unwrap_or(self.default) {
            Behaviour::Value(v) => Ok(Some(v)),
            Behaviour::NoMatch => Ok(None),
            Behaviour::AlwaysTimeout => Err(LookupError::Timeout),
        }
    }
}

/// Key for row `i` in the generated datasets.
pub fn title(i: usize) -> String {
    format!("Title {i}")
}

/// Rating the default fake returns for row `i`'s key when configured per key.
pub fn rating(i: usize) -> Rating {
    5.0 + (i as Rating) / 10.0
}

/// A client that knows every generated title up to `n`.
pub fn client_for(n: usize) -> FakeClient {
    (0..n).fold(FakeClient::new(Behaviour::NoMatch), |c, i| {
        c.with(&title(i), Behaviour::Value(rating(i)))
    })
}
