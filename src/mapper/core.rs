use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

use crate::context::ContextFactory;
use crate::endpoint::{
    EndpointRegistration, ParameterLocation, ParameterRule, PathTemplate, SUPPORTED_METHODS,
};
use crate::error::RegistrationError;
use crate::router::{Route, Router};

/// What `put_handler` does when the method and path shape are already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with [`RegistrationError::Conflict`]
    #[default]
    Reject,
    /// Replace the earlier handler and log a warning
    Replace,
}

/// Registry of endpoint handlers, frozen into a [`Router`].
pub trait HandleMapper {
    /// Register one endpoint.
    fn put_handler(&mut self, registration: EndpointRegistration) -> Result<(), RegistrationError>;

    /// Freeze the registrations into a router that creates contexts with `factory`.
    fn new_router<F>(self, factory: F) -> Router
    where
        F: ContextFactory + 'static,
        Self: Sized;
}

/// Handle mapper keyed by method, then by path shape.
///
/// The shape erases variable names, so `/items/{id}` and `/items/{key}` are
/// the same key.
#[derive(Debug, Default)]
pub struct DefaultHandleMapper {
    policy: DuplicatePolicy,
    routes: HashMap<Method, BTreeMap<String, Route>>,
}

impl DefaultHandleMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            routes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Number of registered (method, path) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a handler is registered for `method` at a template of the same shape as `path`.
    #[must_use]
    pub fn contains(&self, method: &Method, path: &str) -> bool {
        PathTemplate::parse(path).is_ok_and(|t| {
            self.routes
                .get(method)
                .is_some_and(|by_shape| by_shape.contains_key(&t.shape()))
        })
    }

    /// Put every registration, stopping at the first error.
    pub fn put_handlers(
        &mut self,
        registrations: impl IntoIterator<Item = EndpointRegistration>,
    ) -> Result<(), RegistrationError> {
        registrations
            .into_iter()
            .try_for_each(|r| self.put_handler(r))
    }
}

impl HandleMapper for DefaultHandleMapper {
    fn put_handler(&mut self, registration: EndpointRegistration) -> Result<(), RegistrationError> {
        let EndpointRegistration {
            path,
            method,
            operation,
            parameters,
            handler,
        } = registration;

        if !SUPPORTED_METHODS.contains(&method) {
            return Err(RegistrationError::UnsupportedMethod { method, path });
        }
        let template = PathTemplate::parse(&path)?;

        if let Some(stray) = parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Path && !template.variables.contains(&p.name))
        {
            return Err(RegistrationError::InvalidPath {
                reason: format!("path parameter '{}' is not a variable of the template", stray.name),
                path,
            });
        }

        let rules = parameters
            .into_iter()
            .map(|meta| ParameterRule::compile(meta, &path))
            .collect::<Result<Vec<_>, _>>()?;

        let shape = template.shape();
        let by_shape = self.routes.entry(method.clone()).or_default();
        if let Some(existing) = by_shape.get(&shape) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(RegistrationError::Conflict {
                        method,
                        path,
                        existing: existing.operation.to_string(),
                    });
                }
                DuplicatePolicy::Replace => {
                    warn!(
                        method = %method,
                        path = %path,
                        replaced = %existing.operation,
                        operation = %operation,
                        "Replacing registered handler"
                    );
                }
            }
        }

        info!(
            method = %method,
            path = %path,
            operation = %operation,
            parameters = rules.len(),
            "Handler registered"
        );
        by_shape.insert(
            shape,
            Route {
                method,
                path,
                operation: Arc::from(operation),
                rules,
                handler,
            },
        );
        Ok(())
    }

    fn new_router<F>(self, factory: F) -> Router
    where
        F: ContextFactory + 'static,
    {
        let mut routes: Vec<Route> = self
            .routes
            .into_values()
            .flat_map(BTreeMap::into_values)
            .collect();
        routes.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        Router::from_routes(routes, Arc::new(factory))
    }
}
