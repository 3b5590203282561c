//! Path templates and first-match routing.
//!
//! # Templates
//!
//! A template is a `/`-separated list of literal segments and named parameters:
//!
//! - `todos` - a literal, compared ASCII case-insensitively
//! - `:id` - a parameter capturing exactly one non-empty segment
//! - `:id?` - an optional parameter; when absent its preceding slash may be absent too
//!
//! One trailing slash on the candidate path is tolerated, so `/todos`, `/todos/`
//! and `/todos/42` all match `/todos/:id?`.
//!
//! # Matching
//!
//! Routes are tried in registration order and the first full match wins. Parameter
//! values are returned in declaration order.

use std::{collections::HashSet, fmt, str::FromStr};

use crate::error::RouteError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
}

/// A compiled path template such as `/todos/:id?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidTemplate`] if the template does not start with `/`,
    /// has an empty parameter name or declares the same parameter twice.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let body = template
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        let mut seen = HashSet::new();

        for raw in body.split('/').filter(|raw| !raw.is_empty()) {
            let Some(param) = raw.strip_prefix(':') else {
                segments.push(Segment::Literal(raw.to_string()));
                continue;
            };

            let (name, optional) = match param.strip_suffix('?') {
                Some(name) => (name, true),
                None => (param, false),
            };

            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("parameter names must be non-empty and alphanumeric"));
            }

            if !seen.insert(name) {
                return Err(invalid("duplicate parameter name"));
            }

            segments.push(Segment::Param { name: name.to_string(), optional });
        }

        Ok(PathTemplate { source: template.to_string(), segments })
    }

    /// Returns the template as it was written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a full path against this template and extracts its parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let body = path.strip_prefix('/')?;
        let body = body.strip_suffix('/').unwrap_or(body);

        let parts: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('/').collect()
        };

        let mut captures = Vec::new();

        if !match_segments(&self.segments, &parts, &mut captures) {
            return None;
        }

        Some(Params(
            self.param_names()
                .zip(captures)
                .map(|(name, value)| (name.to_string(), value.map(str::to_string)))
                .collect(),
        ))
    }
}

impl FromStr for PathTemplate {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathTemplate::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn match_segments<'p>(
    segments: &[Segment],
    parts: &[&'p str],
    captures: &mut Vec<Option<&'p str>>,
) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return parts.is_empty();
    };

    match segment {
        Segment::Literal(literal) => match parts.split_first() {
            Some((part, tail)) if part.eq_ignore_ascii_case(literal) => {
                match_segments(rest, tail, captures)
            }
            _ => false,
        },
        Segment::Param { optional, .. } => {
            if let Some((part, tail)) = parts.split_first().filter(|(part, _)| !part.is_empty()) {
                captures.push(Some(*part));
                if match_segments(rest, tail, captures) {
                    return true;
                }
                captures.pop();
            }

            if *optional {
                captures.push(None);
                if match_segments(rest, parts, captures) {
                    return true;
                }
                captures.pop();
            }

            false
        }
    }
}

/// Parameter values extracted from a matched path, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, Option<String>)>);

impl Params {
    /// Returns the value of the named parameter, if it was captured.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Returns the value of the parameter at `index` in declaration order.
    pub fn nth(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|(_, value)| value.as_deref())
    }

    /// Returns all values in declaration order; absent optional parameters are `None`.
    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(|(_, value)| value.as_deref())
    }

    /// Returns the number of declared parameters, captured or not.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the template declares no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A template bound to a handler.
#[derive(Debug, Clone)]
pub struct Route<H> {
    template: PathTemplate,
    handler: H,
}

impl<H> Route<H> {
    /// Returns the template this route matches.
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Returns the handler bound to this route.
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// The outcome of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub route: &'a Route<H>,
    pub params: Params,
}

/// An ordered list of routes.
#[derive(Debug, Clone)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Router { routes: Vec::new() }
    }
}

impl<H> Router<H> {
    /// Creates an empty router.
    pub fn new() -> Self {
        Router::default()
    }

    /// Appends a route. Earlier routes take precedence.
    pub fn add(&mut self, template: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.routes.push(Route { template: PathTemplate::parse(template)?, handler });
        Ok(self)
    }

    /// Builder-style variant of [`add`](Router::add).
    pub fn route(mut self, template: &str, handler: H) -> Result<Self, RouteError> {
        self.add(template, handler)?;
        Ok(self)
    }

    /// Returns the first route whose template matches `path`, with its parameters.
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_, H>> {
        let found = self.routes.iter().find_map(|route| {
            route
                .template
                .matches(path)
                .map(|params| RouteMatch { route, params })
        });

        match &found {
            Some(found) => tracing::trace!(path = %path, template = %found.route.template, "Route matched"),
            None => tracing::trace!(path = %path, "No route matched"),
        }

        found
    }

    /// Returns the routes in registration order.
    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(template: &str, path: &str) -> Option<Vec<Option<String>>> {
        PathTemplate::parse(template)
            .unwrap()
            .matches(path)
            .map(|params| params.values().map(|v| v.map(str::to_string)).collect())
    }

    #[test]
    fn optional_parameter_may_be_absent() {
        assert_eq!(params("/todos/:id?", "/todos/"), Some(vec![None]));
        assert_eq!(params("/todos/:id?", "/todos"), Some(vec![None]));
        assert_eq!(params("/todos/:id?", "/todos/42"), Some(vec![Some("42".into())]));
        assert_eq!(params("/todos/:id?", "/todos/42/"), Some(vec![Some("42".into())]));
    }

    #[test]
    fn parameters_capture_exactly_one_segment() {
        assert_eq!(params("/todos/:id?", "/todos/42/labels"), None);
        assert_eq!(params("/todos/:id?", "/todos//"), None);
        assert_eq!(params("/todos/:id", "/todos"), None);
        assert_eq!(params("/todos/:id?", "/labels/42"), None);
        assert_eq!(params("/todos/:id?", "todos/42"), None);
    }

    #[test]
    fn literals_ignore_ascii_case() {
        assert_eq!(params("/todos/:id?", "/TODOS/abc"), Some(vec![Some("abc".into())]));
    }

    #[test]
    fn parameters_come_back_in_declaration_order() {
        let template = PathTemplate::parse("/todos/:todo/labels/:label?").unwrap();
        let params = template.matches("/todos/t1/labels/l1").unwrap();

        assert_eq!(params.nth(0), Some("t1"));
        assert_eq!(params.get("label"), Some("l1"));
        assert_eq!(params.len(), 2);

        let params = template.matches("/todos/t1/labels").unwrap();
        assert_eq!(params.values().collect::<Vec<_>>(), vec![Some("t1"), None]);
    }

    #[test]
    fn rejects_malformed_templates() {
        assert!(PathTemplate::parse("todos").is_err());
        assert!(PathTemplate::parse("/todos/:").is_err());
        assert!(PathTemplate::parse("/todos/:?").is_err());
        assert!(PathTemplate::parse("/:id/:id").is_err());
    }

    #[test]
    fn first_registered_route_wins() {
        let router = Router::new()
            .route("/labels/:id?", "labels")
            .unwrap()
            .route("/:kind/:id?", "any")
            .unwrap()
            .route("/todos/:id?", "todos")
            .unwrap();

        assert_eq!(*router.find("/labels/1").unwrap().route.handler(), "labels");
        assert_eq!(*router.find("/todos/1").unwrap().route.handler(), "any");
        assert!(router.find("/a/b/c").is_none());
    }
}
