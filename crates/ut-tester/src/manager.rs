//! Capability interface used by the browser's request hook.

use log::warn;

use ut_core::ResourceType;

use crate::provider::FileProvider;
use crate::tester::UriTester;

/// A content blocker the browser can consult.
pub trait AdBlock {
    /// True if the load may proceed.
    fn should_load(&mut self, request_url: &str, page_url: Option<&str>, resource_type: ResourceType) -> bool;

    /// Replace the rule sources and apply them.
    fn edit_rule(&mut self, filters: Vec<String>);
}

impl<P: FileProvider> AdBlock for UriTester<P> {
    fn should_load(&mut self, request_url: &str, page_url: Option<&str>, resource_type: ResourceType) -> bool {
        UriTester::should_load(self, request_url, page_url, resource_type)
    }

    fn edit_rule(&mut self, filters: Vec<String>) {
        if let Err(e) = self.set_filters(filters) {
            warn!("subscriptions changed but not saved: {}", e);
        }
        self.reload();
    }
}

/// Holds the installed blocker, if any. Without one every load is allowed.
#[derive(Default)]
pub struct AdBlockManager {
    blocker: Option<Box<dyn AdBlock>>,
}

impl AdBlockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, blocker: Box<dyn AdBlock>) {
        self.blocker = Some(blocker);
    }

    pub fn uninstall(&mut self) -> Option<Box<dyn AdBlock>> {
        self.blocker.take()
    }

    pub fn is_installed(&self) -> bool {
        self.blocker.is_some()
    }

    pub fn should_load(&mut self, request_url: &str, page_url: Option<&str>, resource_type: ResourceType) -> bool {
        match self.blocker.as_mut() {
            Some(blocker) => blocker.should_load(request_url, page_url, resource_type),
            None => true,
        }
    }

    /// No-op when nothing is installed.
    pub fn edit_rule(&mut self, filters: Vec<String>) {
        if let Some(blocker) = self.blocker.as_mut() {
            blocker.edit_rule(filters);
        }
    }
}
