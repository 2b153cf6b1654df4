//! MongoDB-backed classification store.
//!
//! Collections: `Blacklist` and `Whitelist` hold `{"element": <name>}`
//! membership documents; `Results` receives `{"element", "timestamp"}` hit
//! records. Membership checks use a single `$in` query per list.

use std::collections::{HashMap, HashSet};

use mongodb::bson::{doc, Document};
use mongodb::sync::{Client, Database};
use tracing::debug;

use crate::{ClassificationStore, StoreError};

const DEFAULT_DATABASE: &str = "dga_detector";
const BLACKLIST_COLLECTION: &str = "Blacklist";
const WHITELIST_COLLECTION: &str = "Whitelist";
const RESULTS_COLLECTION: &str = "Results";

pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connects and pings the server, failing fast when it is unreachable.
    /// Uses the connection string's database when one is named.
    pub fn connect(uri: &str) -> Result<Self, StoreError> {
        let client =
            Client::with_uri_str(uri).map_err(|e| StoreError::Connect(e.to_string()))?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE));

        database
            .run_command(doc! { "ping": 1 })
            .run()
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        debug!("connected to classification store, database '{}'", database.name());
        Ok(Self { database })
    }

    fn check_in_list(
        &self,
        collection: &str,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, bool>, StoreError> {
        let mut verdicts: HashMap<String, bool> =
            names.iter().map(|name| (name.clone(), false)).collect();

        let queried: Vec<&str> = names.iter().map(String::as_str).collect();
        let cursor = self
            .database
            .collection::<Document>(collection)
            .find(doc! { "element": { "$in": queried } })
            .run()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        for document in cursor {
            let document = document.map_err(|e| StoreError::Query(e.to_string()))?;
            if let Ok(element) = document.get_str("element") {
                verdicts.insert(element.to_string(), true);
            }
        }

        Ok(verdicts)
    }
}

impl ClassificationStore for MongoStore {
    fn check_blacklist(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, bool>, StoreError> {
        self.check_in_list(BLACKLIST_COLLECTION, names)
    }

    fn check_whitelist(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, bool>, StoreError> {
        self.check_in_list(WHITELIST_COLLECTION, names)
    }

    fn record_blacklist_hit(&self, name: &str, unix_seconds: i64) -> Result<(), StoreError> {
        self.database
            .collection::<Document>(RESULTS_COLLECTION)
            .insert_one(doc! { "element": name, "timestamp": unix_seconds })
            .run()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }
}
