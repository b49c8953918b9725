use dashmap::DashMap;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use once_cell::sync::Lazy;
use std::io::{self, Read};
use tracing::{debug, warn};

use crate::dispatcher::DispatchOutcome;
use crate::request::RawRequest;
use crate::response::{status_reason, BufferedResponse, HandlerResponse, Responder};
use crate::router::Router;
use crate::runtime_config::DEFAULT_MAX_BODY_BYTES;

/// Upper bound on distinct interned header lines.
pub const MAX_INTERNED_HEADERS: usize = 4096;

/// Headers whose value changes on every response; never interned.
const PER_REQUEST_HEADERS: [&str; 1] = ["x-request-id"];

/// Header names with a small, stable value set. Only these are interned.
const INTERNED_HEADER_NAMES: [&str; 6] = [
    "allow",
    "cache-control",
    "content-encoding",
    "content-language",
    "content-type",
    "vary",
];

/// Header lines for `may_minihttp`, which only takes `&'static str`.
///
/// Lines for [`INTERNED_HEADER_NAMES`] are leaked once and reused, up to
/// `capacity` distinct lines. Any other line, or one arriving after the cache
/// is full, is leaked for its own response only.
pub(crate) struct HeaderLineCache {
    lines: DashMap<String, &'static str>,
    capacity: usize,
}

impl HeaderLineCache {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: DashMap::new(),
            capacity,
        }
    }

    pub(crate) fn line(&self, name: &str, value: &str) -> &'static str {
        let line = format!("{name}: {value}");
        if !INTERNED_HEADER_NAMES
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
        {
            return Box::leak(line.into_boxed_str());
        }
        if let Some(existing) = self.lines.get(&line) {
            return *existing;
        }
        if self.lines.len() >= self.capacity {
            debug!(header = %name, "Header line cache full, line not interned");
            return Box::leak(line.into_boxed_str());
        }
        let leaked: &'static str = Box::leak(line.clone().into_boxed_str());
        *self.lines.entry(line).or_insert(leaked)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lines.len()
    }
}

static HEADER_LINES: Lazy<HeaderLineCache> =
    Lazy::new(|| HeaderLineCache::with_capacity(MAX_INTERNED_HEADERS));

/// `HttpService` serving a [`Router`].
#[derive(Clone)]
pub struct DispatchService {
    router: Router,
    max_body_bytes: usize,
}

impl DispatchService {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }
}

enum Inbound {
    Request(RawRequest),
    Rejected(HandlerResponse),
}

fn read_request(req: Request, max_body_bytes: usize) -> io::Result<Inbound> {
    let Ok(method) = Method::from_bytes(req.method().as_bytes()) else {
        return Ok(Inbound::Rejected(HandlerResponse::error(400, "Invalid method")));
    };
    let mut raw = RawRequest::new(method, req.path());
    for h in req.headers().iter() {
        raw.push_header(h.name, String::from_utf8_lossy(h.value).into_owned());
    }

    let limit = u64::try_from(max_body_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut body = Vec::new();
    req.body().take(limit).read_to_end(&mut body)?;
    if body.len() > max_body_bytes {
        warn!(
            request_id = %raw.request_id,
            limit = max_body_bytes,
            "Request body too large"
        );
        return Ok(Inbound::Rejected(HandlerResponse::error(413, "Payload Too Large")));
    }
    raw.body = body;

    debug!(
        request_id = %raw.request_id,
        method = %raw.method,
        path = %raw.path,
        header_count = raw.headers.len(),
        body_bytes = raw.body.len(),
        "Request parsed"
    );
    Ok(Inbound::Request(raw))
}

/// Copy a buffered response into the may_minihttp response.
fn write_buffered(res: &mut Response, buffered: BufferedResponse) {
    let status = buffered.status_or_default();
    res.status_code(usize::from(status), status_reason(status));
    for (name, value) in &buffered.headers {
        if PER_REQUEST_HEADERS
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
        {
            continue;
        }
        res.header(HEADER_LINES.line(name, value));
    }
    res.body_vec(buffered.body);
}

impl HttpService for DispatchService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let mut buffered = BufferedResponse::new();
        match read_request(req, self.max_body_bytes)? {
            Inbound::Request(raw) => {
                let outcome: DispatchOutcome = self.router.serve(raw, &mut buffered);
                debug!(status = outcome.status(), "Response buffered");
            }
            Inbound::Rejected(response) => response.boxed().write_response(&mut buffered),
        }
        write_buffered(res, buffered);
        Ok(())
    }
}
