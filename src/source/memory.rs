use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::client::{detail_path, page_path, Source};
use super::payload::{NamedResource, ResourcePage};
use crate::error::{ImportError, ImportResult};

/// In-memory [`Source`] for tests and offline fixtures.
///
/// Records are listed in insertion order. Individual list or detail
/// requests can be made to fail with a `Fetch` error.
#[derive(Default)]
pub struct MemorySource {
    listings: HashMap<String, Vec<NamedResource>>,
    details: HashMap<(String, i64), Value>,
    failing_listings: HashSet<String>,
    failing_details: HashSet<(String, i64)>,
    requests: RefCell<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; it is listed under its `name` field (or its id)
    pub fn with_record(mut self, resource: &str, id: i64, detail: Value) -> Self {
        let name = detail
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string());
        let url = format!("https://pokeapi.co/api/v2/{}/{}/", resource, id);
        self.listings
            .entry(resource.to_string())
            .or_default()
            .push(NamedResource { name, url });
        self.details.insert((resource.to_string(), id), detail);
        self
    }

    /// Add a list entry with an arbitrary url and no detail document
    pub fn with_listing(mut self, resource: &str, name: &str, url: &str) -> Self {
        self.listings
            .entry(resource.to_string())
            .or_default()
            .push(NamedResource {
                name: name.to_string(),
                url: url.to_string(),
            });
        self
    }

    /// Make every page request for `resource` fail
    pub fn fail_listing(mut self, resource: &str) -> Self {
        self.failing_listings.insert(resource.to_string());
        self
    }

    /// Make the detail request for one record fail
    pub fn fail_detail(mut self, resource: &str, id: i64) -> Self {
        self.failing_details.insert((resource.to_string(), id));
        self
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Source for MemorySource {
    fn fetch_page(&self, resource: &str, limit: u32, offset: u64) -> ImportResult<ResourcePage> {
        if limit == 0 {
            return Err(ImportError::InvalidConfig("page limit must be > 0".into()));
        }
        let path = page_path(resource, limit, offset);
        self.requests.borrow_mut().push(path.clone());

        if self.failing_listings.contains(resource) {
            return Err(ImportError::fetch(path, "HTTP 503 Service Unavailable"));
        }

        let all = self.listings.get(resource).map(Vec::as_slice).unwrap_or(&[]);
        let results = all
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(ResourcePage {
            count: all.len() as u64,
            results,
        })
    }

    fn fetch_detail(&self, resource: &str, id: i64) -> ImportResult<Value> {
        let path = detail_path(resource, id);
        self.requests.borrow_mut().push(path.clone());

        let key = (resource.to_string(), id);
        if self.failing_details.contains(&key) {
            return Err(ImportError::fetch(path, "connection reset"));
        }
        self.details
            .get(&key)
            .cloned()
            .ok_or_else(|| ImportError::fetch(path, "HTTP 404 Not Found"))
    }
}
