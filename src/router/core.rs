use http::Method;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::radix::RadixRouter;
use crate::context::ContextFactory;
use crate::dispatcher::{dispatch, DispatchOutcome};
use crate::endpoint::{HandlerFunc, ParameterRule};
use crate::request::{ParamVec, RawRequest};
use crate::response::{HandlerResponse, Responder, ResponseWriter};

/// A frozen registration: handler plus its compiled parameter rules.
pub struct Route {
    pub method: Method,
    /// Path template as registered, e.g. `/items/{id}`
    pub path: String,
    pub operation: Arc<str>,
    /// Parameter rules in declaration order
    pub rules: Vec<ParameterRule>,
    pub handler: HandlerFunc,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("operation", &self.operation)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// Successful route match.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Path variables, percent-decoded
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of resolving `(method, path)`.
#[derive(Debug, Clone)]
pub enum RouteLookup {
    Found(RouteMatch),
    /// The path matches a template, but not for this method
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Immutable router produced by a handle mapper.
///
/// Cheap to clone and shareable across threads and coroutines: the route tree
/// and the context factory sit behind `Arc`s and are never mutated.
#[derive(Clone)]
pub struct Router {
    tree: Arc<RadixRouter<Route>>,
    routes: Arc<[Arc<Route>]>,
    factory: Arc<dyn ContextFactory>,
}

impl Router {
    pub(crate) fn from_routes(routes: Vec<Route>, factory: Arc<dyn ContextFactory>) -> Self {
        let mut tree = RadixRouter::new();
        let routes: Vec<Arc<Route>> = routes.into_iter().map(Arc::new).collect();
        for route in &routes {
            tree.insert(route.method.clone(), &route.path, Arc::clone(route));
        }
        info!(routes_count = routes.len(), "Router materialized");
        Self {
            tree: Arc::new(tree),
            routes: routes.into(),
            factory,
        }
    }

    /// Resolve a request to its route.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> RouteLookup {
        if let Some((route, path_params)) = self.tree.route(method, path) {
            debug!(
                method = %method,
                path = %path,
                operation = %route.operation,
                params = ?path_params,
                "Route matched"
            );
            return RouteLookup::Found(RouteMatch { route, path_params });
        }
        let allowed = self.tree.allowed_methods(path);
        if allowed.is_empty() {
            RouteLookup::NotFound
        } else {
            RouteLookup::MethodNotAllowed(allowed)
        }
    }

    /// Route and dispatch one request, writing the response to `writer`.
    ///
    /// Unknown paths get a 404 and unregistered methods a 405 with `Allow`;
    /// neither creates a request context.
    pub fn serve(&self, mut request: RawRequest, writer: &mut dyn ResponseWriter) -> DispatchOutcome {
        match self.route(&request.method, &request.path) {
            RouteLookup::Found(matched) => {
                request.path_params = matched.path_params;
                dispatch(&matched.route, self.factory.as_ref(), request, writer)
            }
            RouteLookup::MethodNotAllowed(allowed) => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                warn!(
                    request_id = %request.request_id,
                    method = %request.method,
                    path = %request.path,
                    allow = %allow,
                    "Method not allowed"
                );
                let mut response = HandlerResponse::error(405, "Method Not Allowed");
                response.set_header("allow", allow);
                response.boxed().write_response(writer);
                DispatchOutcome::MethodNotAllowed
            }
            RouteLookup::NotFound => {
                warn!(
                    request_id = %request.request_id,
                    method = %request.method,
                    path = %request.path,
                    "No route matched"
                );
                HandlerResponse::error(404, "Not Found")
                    .boxed()
                    .write_response(writer);
                DispatchOutcome::NotFound
            }
        }
    }

    /// Frozen routes, sorted by path then method.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|route| &**route)
    }

    /// Log the routing table at info level.
    pub fn dump_routes(&self) {
        for route in self.routes() {
            info!(
                method = %route.method,
                path = %route.path,
                operation = %route.operation,
                parameters = route.rules.len(),
                "Route registered"
            );
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
