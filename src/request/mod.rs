//! # Request Module
//!
//! The inbound request representation consumed by the dispatch core, and the
//! [`HandlerRequest`] a handler receives once its parameters are bound.
//!
//! Hosting adapters translate their native request into a [`RawRequest`]:
//! method, path, lowercased headers, cookies, query parameters and body bytes.
//! The router fills in path parameters after matching. Parameter and header
//! storage uses `SmallVec` so the common case stays off the heap.

mod core;
mod parse;

pub use self::core::{
    BoundParams, HandlerRequest, HeaderVec, ParamVec, RawRequest, MAX_INLINE_HEADERS,
    MAX_INLINE_PARAMS,
};
pub use parse::{media_type, parse_cookies, parse_query_params, split_path_and_query};
