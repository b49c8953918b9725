//! Radix tree for route matching.
//!
//! Paths are split into segments. Static segments (`items`) match exactly and
//! are tried first; parameter segments (`{id}`) match any single segment, with
//! backtracking when a static branch dead-ends. Terminal nodes hold one value
//! per method.
//!
//! Lookup is O(k) in the path length, independent of the number of routes.

use http::Method;
use std::borrow::Cow;
use std::sync::Arc;

use crate::request::ParamVec;

struct RadixNode<T> {
    segment: Box<str>,
    /// Some(name) for `{name}` nodes
    param_name: Option<Arc<str>>,
    routes: Vec<(Method, Arc<T>)>,
    children: Vec<RadixNode<T>>,
    /// Several names may share a position: `/a/{id}/x` and `/a/{key}/y`
    param_children: Vec<RadixNode<T>>,
}

impl<T> RadixNode<T> {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.into(),
            param_name: None,
            routes: Vec::new(),
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(name: &str) -> Self {
        Self {
            param_name: Some(Arc::from(name)),
            ..Self::new("")
        }
    }

    fn route_for(&self, method: &Method) -> Option<&Arc<T>> {
        self.routes
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, route)| route)
    }

    fn insert(&mut self, segments: &[&str], method: Method, route: Arc<T>) {
        let Some((&segment, remaining)) = segments.split_first() else {
            match self.routes.iter_mut().find(|(m, _)| *m == method) {
                Some(slot) => slot.1 = route,
                None => self.routes.push((method, route)),
            }
            return;
        };

        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if let Some(child) = self
                .param_children
                .iter_mut()
                .find(|c| c.param_name.as_deref() == Some(name))
            {
                child.insert(remaining, method, route);
                return;
            }
            let mut child = RadixNode::new_param(name);
            child.insert(remaining, method, route);
            self.param_children.push(child);
            return;
        }

        if let Some(child) = self.children.iter_mut().find(|c| &*c.segment == segment) {
            child.insert(remaining, method, route);
            return;
        }
        let mut child = RadixNode::new(segment);
        child.insert(remaining, method, route);
        self.children.push(child);
    }

    fn search(&self, segments: &[&str], method: &Method, params: &mut ParamVec) -> Option<Arc<T>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.route_for(method).map(Arc::clone);
        };

        for child in &self.children {
            if &*child.segment == segment {
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
            }
        }

        for child in &self.param_children {
            let Some(name) = &child.param_name else {
                continue;
            };
            let mark = params.len();
            params.push((Arc::clone(name), decode_segment(segment)));
            if let Some(route) = child.search(remaining, method, params) {
                return Some(route);
            }
            params.truncate(mark);
        }

        None
    }

    /// Methods registered on any node the path reaches.
    fn collect_methods(&self, segments: &[&str], out: &mut Vec<Method>) {
        let Some((&segment, remaining)) = segments.split_first() else {
            for (method, _) in &self.routes {
                if !out.contains(method) {
                    out.push(method.clone());
                }
            }
            return;
        };
        for child in &self.children {
            if &*child.segment == segment {
                child.collect_methods(remaining, out);
            }
        }
        for child in &self.param_children {
            child.collect_methods(remaining, out);
        }
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string())
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Route tree mapping `(method, path)` to a value of type `T`.
pub(crate) struct RadixRouter<T> {
    root: RadixNode<T>,
}

impl<T> RadixRouter<T> {
    pub(crate) fn new() -> Self {
        Self {
            root: RadixNode::new(""),
        }
    }

    /// Insert `route` at `template`; an existing value for the method is replaced.
    pub(crate) fn insert(&mut self, method: Method, template: &str, route: Arc<T>) {
        let segments = split_segments(template);
        self.root.insert(&segments, method, route);
    }

    /// Match `path`, returning the route and its percent-decoded path parameters.
    pub(crate) fn route(&self, method: &Method, path: &str) -> Option<(Arc<T>, ParamVec)> {
        let segments = split_segments(path);
        let mut params = ParamVec::new();
        let route = self.root.search(&segments, method, &mut params)?;
        Some((route, params))
    }

    /// Every method registered for a template matching `path`, in registration order.
    pub(crate) fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let segments = split_segments(path);
        let mut out = Vec::new();
        self.root.collect_methods(&segments, &mut out);
        out
    }
}
