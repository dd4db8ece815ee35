//! Ordered pattern router.
//!
//! A [`Router`] holds routes in declaration order. Each route is a path
//! pattern plus the verbs registered for it. Patterns are literal text with
//! named segments:
//!
//! - `{name}` matches an identifier-safe segment (`[A-Za-z0-9_.-]+`).
//! - `{name*}` matches the rest of the path, `/` included, as object names do.
//!
//! Resolution stops at the first route whose pattern matches the whole
//! decoded path. If that route has no handler for the request method the
//! result is `notImplemented`, and later routes are not tried. Routes must
//! therefore be declared most specific first.

use std::collections::HashMap;
use std::fmt;

use gcstack_model::{GcsError, GcsOperation};
use http::Method;
use regex::Regex;
use tracing::{debug, error, warn};

use crate::request::RequestContext;
use crate::response::ResponseContext;

/// Regex for a `{name}` segment.
const NAME_SEGMENT: &str = r"[A-Za-z0-9_.\-]+";
/// Regex for a `{name*}` segment.
const PATH_SEGMENT: &str = r"[^\x00-\x1F\x7F]+";

/// A request handler over shared state `S`.
pub type Handler<S> =
    fn(&mut RequestContext, &mut ResponseContext, &S) -> Result<(), GcsError>;

/// A handler tagged with the operation it implements.
pub struct Endpoint<S> {
    /// Operation name, used in logs.
    pub operation: GcsOperation,
    /// The handler function.
    pub handler: Handler<S>,
}

impl<S> Clone for Endpoint<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Endpoint<S> {}

impl<S> fmt::Debug for Endpoint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

struct Route<S> {
    pattern: String,
    regex: Regex,
    methods: Vec<(Method, Endpoint<S>)>,
}

impl<S> fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field(
                "methods",
                &self.methods.iter().map(|(m, _)| m).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A resolved route: the endpoint and its bound path parameters.
#[derive(Debug)]
pub struct RouteMatch<S> {
    /// The endpoint registered for the method.
    pub endpoint: Endpoint<S>,
    /// Named segments bound from the path.
    pub params: HashMap<String, String>,
}

/// Ordered router over shared handler state `S`.
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .finish()
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Router<S> {
    /// An empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register `handler` for `method` on `pattern`.
    ///
    /// A pattern already registered keeps its position; the verb is added
    /// to it (replacing a previous handler for the same verb).
    ///
    /// # Errors
    ///
    /// Returns the regex error if the pattern does not compile, for example
    /// a segment name that is not a valid group name.
    pub fn add(
        &mut self,
        pattern: &str,
        method: Method,
        operation: GcsOperation,
        handler: Handler<S>,
    ) -> Result<(), regex::Error> {
        let endpoint = Endpoint { operation, handler };

        if let Some(route) = self.routes.iter_mut().find(|r| r.pattern == pattern) {
            match route.methods.iter_mut().find(|(m, _)| *m == method) {
                Some(slot) => slot.1 = endpoint,
                None => route.methods.push((method, endpoint)),
            }
            return Ok(());
        }

        self.routes.push(Route {
            pattern: pattern.to_owned(),
            regex: compile_pattern(pattern)?,
            methods: vec![(method, endpoint)],
        });
        Ok(())
    }

    /// Number of distinct patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the endpoint for `method` on the decoded `path`.
    ///
    /// # Errors
    ///
    /// `notFound` when no pattern matches, `notImplemented` when the first
    /// matching pattern has no handler for `method`.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch<S>, GcsError> {
        let Some((route, captures)) = self
            .routes
            .iter()
            .find_map(|route| route.regex.captures(path).map(|caps| (route, caps)))
        else {
            return Err(GcsError::not_found(format!("No route for {path}")));
        };

        let Some((_, endpoint)) = route.methods.iter().find(|(m, _)| m == method) else {
            return Err(GcsError::not_implemented(format!(
                "{method} is not implemented for {}",
                route.pattern
            )));
        };

        let params = route
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|m| (name.to_owned(), m.as_str().to_owned()))
            })
            .collect();

        Ok(RouteMatch {
            endpoint: *endpoint,
            params,
        })
    }

    /// Route the request and run its handler.
    ///
    /// Handler failures are logged with the full request URL and returned
    /// unchanged; the caller still owns producing a response.
    ///
    /// # Errors
    ///
    /// Routing errors from [`Router::resolve`] and any handler error.
    pub fn dispatch(
        &self,
        req: &mut RequestContext,
        resp: &mut ResponseContext,
        state: &S,
    ) -> Result<GcsOperation, GcsError> {
        let RouteMatch { endpoint, params } = match self.resolve(req.method(), req.path()) {
            Ok(m) => m,
            Err(err) => {
                warn!(method = %req.method(), url = %req.url(), error = %err, "failed to route request");
                return Err(err);
            }
        };
        req.set_params(params);
        debug!(
            operation = %endpoint.operation,
            mutating = endpoint.operation.is_mutating(),
            url = %req.url(),
            "dispatching request"
        );

        if let Err(err) = (endpoint.handler)(req, resp, state) {
            if err.status_code.is_server_error() {
                error!(
                    operation = %endpoint.operation,
                    method = %req.method(),
                    url = %req.url(),
                    error = %err,
                    "handler failed"
                );
            } else {
                warn!(
                    operation = %endpoint.operation,
                    method = %req.method(),
                    url = %req.url(),
                    error = %err,
                    "request rejected"
                );
            }
            return Err(err);
        }

        Ok(endpoint.operation)
    }
}

/// Compile a route pattern into an anchored regex.
fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::from("^");
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        re.push_str(&regex::escape(&rest[..open]));
        let name = &rest[open + 1..close];
        let group = match name.strip_suffix('*') {
            Some(name) => format!("(?P<{name}>{PATH_SEGMENT})"),
            None => format!("(?P<{name}>{NAME_SEGMENT})"),
        };
        re.push_str(&group);
        rest = &rest[close + 1..];
    }

    re.push_str(&regex::escape(rest));
    re.push('$');
    Regex::new(&re)
}
