//! # Consumer Module
//!
//! Content-type-keyed body decoders. The request binder never decodes a body
//! itself: it asks a [`ConsumerFactory`] for the [`Consumer`] matching the
//! request's media type and fails with an unsupported media type when there
//! is none.
//!
//! [`ConsumerRegistry`] is the default factory; any
//! `Fn(&str) -> Option<Arc<dyn Consumer>>` closure is one too.

mod core;

pub use self::core::{
    Consumer, ConsumerFactory, ConsumerRegistry, FormConsumer, JsonConsumer, TextConsumer,
    YamlConsumer,
};
