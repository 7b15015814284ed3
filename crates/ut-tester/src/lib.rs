//! URI Tester
//!
//! Facade over the filter engine: keeps the list of subscribed filter
//! lists, caches each list under the application data directory, compiles
//! them into a rule index and answers "should this load be blocked".
//!
//! Fetching is delegated to a [`FileProvider`]; the tester itself never
//! blocks on the network.

pub mod config;
pub mod error;
pub mod manager;
pub mod provider;
pub mod subscriptions;
pub mod tester;

pub use config::{UriTesterConfig, DEFAULT_FILTER_URL};
pub use error::UriTesterError;
pub use manager::{AdBlock, AdBlockManager};
pub use provider::{FetchCompletion, FetchRequest, FileProvider, HttpFileProvider};
pub use tester::{TesterState, UriTester};

pub use ut_compiler::{ElementHiding, LoadStats};
pub use ut_core::{IndexStats, MatchStats, ResourceType};
