use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::ConsumeError;
use crate::request::media_type;

/// Decoder for one family of request body content types.
pub trait Consumer: Send + Sync {
    /// Decode `body`, declared as `content_type`, into a JSON value.
    fn decode(&self, content_type: &str, body: &[u8]) -> Result<Value, ConsumeError>;
}

/// Resolves the [`Consumer`] for a media type.
///
/// `media_type` has been lowercased and stripped of parameters.
pub trait ConsumerFactory: Send + Sync {
    fn consumer_for(&self, media_type: &str) -> Option<Arc<dyn Consumer>>;
}

impl<F> ConsumerFactory for F
where
    F: Fn(&str) -> Option<Arc<dyn Consumer>> + Send + Sync,
{
    fn consumer_for(&self, media_type: &str) -> Option<Arc<dyn Consumer>> {
        self(media_type)
    }
}

/// `application/json` and `+json` structured syntaxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConsumer;

impl Consumer for JsonConsumer {
    fn decode(&self, _content_type: &str, body: &[u8]) -> Result<Value, ConsumeError> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// `application/yaml` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlConsumer;

impl Consumer for YamlConsumer {
    fn decode(&self, _content_type: &str, body: &[u8]) -> Result<Value, ConsumeError> {
        Ok(serde_yaml::from_slice(body)?)
    }
}

/// `application/x-www-form-urlencoded` bodies, decoded to an object of strings.
///
/// Repeated fields become arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormConsumer;

impl Consumer for FormConsumer {
    fn decode(&self, _content_type: &str, body: &[u8]) -> Result<Value, ConsumeError> {
        let mut map = Map::new();
        for (k, v) in url::form_urlencoded::parse(body) {
            let v = Value::String(v.into_owned());
            match map.get_mut(k.as_ref()) {
                Some(Value::Array(items)) => items.push(v),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, v]);
                }
                None => {
                    map.insert(k.into_owned(), v);
                }
            }
        }
        Ok(Value::Object(map))
    }
}

/// `text/plain` bodies, decoded to a JSON string.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConsumer;

impl Consumer for TextConsumer {
    fn decode(&self, _content_type: &str, body: &[u8]) -> Result<Value, ConsumeError> {
        Ok(Value::String(std::str::from_utf8(body)?.to_string()))
    }
}

/// Consumers keyed by media type.
///
/// Resolution order: exact media type, structured syntax suffix (`+json`
/// resolves through `application/json`), `type/*`, then `*/*`.
#[derive(Clone, Default)]
pub struct ConsumerRegistry {
    consumers: HashMap<String, Arc<dyn Consumer>>,
}

impl ConsumerRegistry {
    /// Empty registry; every body fails with an unsupported media type.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the JSON, YAML, form and text consumers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("application/json", JsonConsumer);
        registry.register("application/yaml", YamlConsumer);
        registry.register("application/x-yaml", YamlConsumer);
        registry.register("application/x-www-form-urlencoded", FormConsumer);
        registry.register("text/plain", TextConsumer);
        registry
    }

    pub fn register<C: Consumer + 'static>(&mut self, media: &str, consumer: C) -> &mut Self {
        self.consumers
            .insert(media_type(media), Arc::new(consumer) as Arc<dyn Consumer>);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}

impl ConsumerFactory for ConsumerRegistry {
    fn consumer_for(&self, media: &str) -> Option<Arc<dyn Consumer>> {
        if let Some(c) = self.consumers.get(media) {
            return Some(Arc::clone(c));
        }

        let (top, sub) = media.split_once('/')?;
        if let Some((_, suffix)) = sub.rsplit_once('+') {
            let structured = format!("application/{suffix}");
            if let Some(c) = self.consumers.get(&structured) {
                debug!(media_type = %media, resolved = %structured, "Consumer resolved by suffix");
                return Some(Arc::clone(c));
            }
        }

        self.consumers
            .get(&format!("{top}/*"))
            .or_else(|| self.consumers.get("*/*"))
            .map(Arc::clone)
    }
}

impl fmt::Debug for ConsumerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut media: Vec<&String> = self.consumers.keys().collect();
        media.sort();
        f.debug_struct("ConsumerRegistry")
            .field("media_types", &media)
            .finish()
    }
}
