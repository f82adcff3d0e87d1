//! Portal: the composition root
//!
//! One portal binds one execution context to one access policy, one
//! identity registry, and one constructor registry. It is created once per
//! context, immutable after construction, and cheap to clone (all state is
//! shared behind `Arc`). Two portals never share state, so independent
//! contexts stay fully isolated.

use std::sync::Arc;
use tracing::debug;

use causeway_engine::{GuestContext, ObjectTemplate};

use crate::access::{AccessPolicy, DeclinePolicy};
use crate::constructors::ConstructorRegistry;
use crate::identity::IdentityRegistry;

/// Hidden slot naming the host object behind a wrapper
pub(crate) const HIDDEN_HOST: &str = "causeway::host";
/// Hidden slot holding the original cause of a translated exception
pub(crate) const HIDDEN_CAUSE: &str = "causeway::cause";

/// The bridge between one host and one guest execution context
#[derive(Clone)]
pub struct Portal {
    context: Arc<GuestContext>,
    policy: Arc<dyn AccessPolicy>,
    identity: Arc<IdentityRegistry>,
    constructors: Arc<ConstructorRegistry>,
}

impl Portal {
    /// Start configuring a portal
    pub fn builder() -> PortalBuilder {
        PortalBuilder::new()
    }

    /// Create a portal with a policy and no pre-registered categories
    pub fn new(context: Arc<GuestContext>, policy: impl AccessPolicy + 'static) -> Self {
        Self::builder().with_policy(policy).build(context)
    }

    /// The bound execution context
    pub fn context(&self) -> &Arc<GuestContext> {
        &self.context
    }

    /// The bound access policy
    pub fn policy(&self) -> &Arc<dyn AccessPolicy> {
        &self.policy
    }

    /// The identity registry of this context
    pub fn identity(&self) -> &IdentityRegistry {
        &self.identity
    }

    /// The constructor registry of this context
    pub fn constructors(&self) -> &ConstructorRegistry {
        &self.constructors
    }

    /// Run a unit of work with the context entered.
    ///
    /// The context is deactivated on every exit path.
    pub fn open<R>(&self, work: impl FnOnce(&Portal) -> R) -> R {
        let _scope = self.context.enter();
        work(self)
    }

    /// Register a proxy constructor category, returning its template with
    /// this portal's handlers installed
    pub fn register_category(&self, category: &str) -> Arc<ObjectTemplate> {
        debug!(category, "registering constructor category");
        let template = self.object_template();
        self.constructors.register(category, template.clone());
        template
    }
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("entered", &self.context.is_entered())
            .finish()
    }
}

/// Builder configuring a portal before it is bound to a context
pub struct PortalBuilder {
    policy: Arc<dyn AccessPolicy>,
    categories: Vec<String>,
}

impl PortalBuilder {
    /// Start with the declining policy and no categories
    pub fn new() -> Self {
        Self {
            policy: Arc::new(DeclinePolicy),
            categories: Vec::new(),
        }
    }

    /// Set the access policy
    pub fn with_policy(mut self, policy: impl AccessPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Set an already-shared access policy
    pub fn with_shared_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Seed a proxy constructor category
    pub fn register_category(mut self, category: &str) -> Self {
        self.categories.push(category.to_string());
        self
    }

    /// Bind the configuration to an execution context
    pub fn build(self, context: Arc<GuestContext>) -> Portal {
        let fallback = Arc::new(ObjectTemplate::new());
        let portal = Portal {
            context,
            policy: self.policy,
            identity: Arc::new(IdentityRegistry::new()),
            constructors: Arc::new(ConstructorRegistry::new(fallback.clone())),
        };
        portal.install_handlers(&fallback);
        for category in &self.categories {
            portal.register_category(category);
        }
        portal
    }
}

impl Default for PortalBuilder {
    fn default() -> Self {
        Self::new()
    }
}
