//! Route policies and the authorization evaluator
//!
//! Each route declares one policy in an ordered `PolicyTable`; the first
//! matching rule wins. Role checks and ownership checks are separate
//! policies and never combined on the same route:
//! - `RequireRole(role)`: the caller's expanded role set must contain `role`
//! - `Owner`: the caller's id must equal the id captured from the path,
//!   whatever roles the caller holds
//!
//! Paths that match no rule fall back to least privilege: mutating methods
//! require `EDITOR`, everything else requires any authenticated caller.

use super::error::AuthError;
use super::identity::Identity;
use axum::http::Method;
use marquee_core::{Role, UserId};

/// What a route demands of its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// No authentication at all; responses may be framed by the same origin
    Bypass,
    /// No authentication required
    Public,
    /// Any authenticated caller
    Authenticated,
    /// Authenticated caller holding the role
    RequireRole(Role),
    /// Authenticated caller whose id is the path-addressed user id
    Owner,
}

impl RoutePolicy {
    /// Whether the pipeline must resolve an identity for this policy
    pub fn requires_identity(&self) -> bool {
        !matches!(self, RoutePolicy::Bypass | RoutePolicy::Public)
    }
}

impl std::fmt::Display for RoutePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutePolicy::Bypass => write!(f, "bypass"),
            RoutePolicy::Public => write!(f, "public"),
            RoutePolicy::Authenticated => write!(f, "authenticated"),
            RoutePolicy::RequireRole(role) => write!(f, "role:{role}"),
            RoutePolicy::Owner => write!(f, "owner"),
        }
    }
}

/// Decide whether an identity satisfies a route policy
///
/// `resource_owner_id` is the user id addressed by the path, if any; it is
/// only consulted by `RoutePolicy::Owner`.
pub fn authorize(
    identity: &Identity,
    policy: RoutePolicy,
    resource_owner_id: Option<UserId>,
) -> Result<(), AuthError> {
    let allowed = match policy {
        RoutePolicy::Bypass | RoutePolicy::Public | RoutePolicy::Authenticated => true,
        RoutePolicy::RequireRole(role) => identity.has_role(role),
        RoutePolicy::Owner => resource_owner_id == Some(identity.user_id),
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

// ============================================================================
// Matching
// ============================================================================

/// HTTP method class a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatcher {
    Any,
    /// GET, HEAD, OPTIONS
    Read,
    /// POST, PUT, PATCH, DELETE
    Mutating,
    Exact(Method),
}

impl MethodMatcher {
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodMatcher::Any => true,
            MethodMatcher::Read => !is_mutating(method),
            MethodMatcher::Mutating => is_mutating(method),
            MethodMatcher::Exact(expected) => expected == method,
        }
    }
}

fn is_mutating(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{name}`: any single segment, captured
    Capture,
    /// `**`: any remainder, including nothing
    Rest,
}

/// Segment-based path pattern such as `/api/v1/users/{id}`
///
/// Empty segments are ignored, so trailing slashes do not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|segment| {
                if segment == "**" {
                    Segment::Rest
                } else if segment.starts_with('{') && segment.ends_with('}') {
                    Segment::Capture
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path, returning the first captured segment if any
    pub fn matches<'p>(&self, path: &'p str) -> Option<Option<&'p str>> {
        let mut parts = split_path(path);
        let mut captured = None;

        for segment in &self.segments {
            match segment {
                Segment::Rest => return Some(captured),
                Segment::Literal(literal) => {
                    if parts.next()? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Capture => {
                    let part = parts.next()?;
                    captured.get_or_insert(part);
                }
            }
        }

        parts.next().is_none().then_some(captured)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// One row of the policy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub method: MethodMatcher,
    pub pattern: RoutePattern,
    pub policy: RoutePolicy,
}

impl PolicyRule {
    pub fn new(method: MethodMatcher, pattern: &str, policy: RoutePolicy) -> Self {
        Self {
            method,
            pattern: RoutePattern::parse(pattern),
            policy,
        }
    }
}

/// Policy resolved for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPolicy {
    pub policy: RoutePolicy,
    /// Numeric id captured from the path, if the rule captures one
    pub resource_owner_id: Option<UserId>,
}

/// Ordered list of policy rules; first match wins
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
}

impl PolicyTable {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Policies of the marquee HTTP surface
    ///
    /// The diagnostic console is only bypassed when it is enabled; otherwise
    /// its path falls through to the least-privilege default.
    pub fn standard(console_enabled: bool) -> Self {
        use MethodMatcher::{Exact, Mutating, Read};
        use RoutePolicy::{Authenticated, Owner, Public, RequireRole};

        let mut rules = vec![
            PolicyRule::new(Exact(Method::GET), "/health", Public),
            PolicyRule::new(Exact(Method::GET), "/ready", Public),
        ];

        if console_enabled {
            rules.push(PolicyRule::new(
                MethodMatcher::Any,
                "/db-console/**",
                RoutePolicy::Bypass,
            ));
        }

        rules.extend([
            // Users
            PolicyRule::new(Exact(Method::POST), "/api/v1/users", Public),
            PolicyRule::new(Read, "/api/v1/users/{id}", Owner),
            PolicyRule::new(Exact(Method::PUT), "/api/v1/users/{id}", Owner),
            // Sessions
            PolicyRule::new(Exact(Method::POST), "/api/v1/sessions", Public),
            // Movies
            PolicyRule::new(Read, "/api/v1/movies/**", Authenticated),
            PolicyRule::new(Mutating, "/api/v1/movies/**", RequireRole(Role::Editor)),
            // Actors
            PolicyRule::new(Read, "/api/v1/actors/**", Authenticated),
            PolicyRule::new(Mutating, "/api/v1/actors/**", RequireRole(Role::Editor)),
        ]);

        Self::new(rules)
    }

    /// Resolve the policy for a request
    pub fn resolve(&self, method: &Method, path: &str) -> ResolvedPolicy {
        for rule in &self.rules {
            if !rule.method.matches(method) {
                continue;
            }
            if let Some(captured) = rule.pattern.matches(path) {
                return ResolvedPolicy {
                    policy: rule.policy,
                    resource_owner_id: captured.and_then(|id| id.parse().ok()),
                };
            }
        }

        let policy = if is_mutating(method) {
            RoutePolicy::RequireRole(Role::Editor)
        } else {
            RoutePolicy::Authenticated
        };

        ResolvedPolicy {
            policy,
            resource_owner_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reader(id: UserId) -> Identity {
        Identity::new(id, "reader@example.com", Role::Reader)
    }

    fn editor(id: UserId) -> Identity {
        Identity::new(id, "editor@example.com", Role::Editor)
    }

    #[test]
    fn test_pattern_matching() {
        let pattern = RoutePattern::parse("/api/v1/users/{id}");
        assert_eq!(pattern.matches("/api/v1/users/2"), Some(Some("2")));
        assert_eq!(pattern.matches("/api/v1/users/2/"), Some(Some("2")));
        assert_eq!(pattern.matches("/api/v1/users"), None);
        assert_eq!(pattern.matches("/api/v1/users/2/extra"), None);
        assert_eq!(pattern.matches("/api/v1/movies/2"), None);

        let rest = RoutePattern::parse("/api/v1/movies/**");
        assert_eq!(rest.matches("/api/v1/movies"), Some(None));
        assert_eq!(rest.matches("/api/v1/movies/7"), Some(None));
        assert_eq!(rest.matches("/api/v1/moviesx"), None);
    }

    #[test]
    fn test_standard_table() {
        let table = PolicyTable::standard(false);

        let cases = [
            (Method::GET, "/health", RoutePolicy::Public),
            (Method::POST, "/api/v1/users", RoutePolicy::Public),
            (Method::POST, "/api/v1/sessions", RoutePolicy::Public),
            (Method::GET, "/api/v1/users/3", RoutePolicy::Owner),
            (Method::HEAD, "/api/v1/users/3", RoutePolicy::Owner),
            (Method::OPTIONS, "/api/v1/users/3", RoutePolicy::Owner),
            (Method::PUT, "/api/v1/users/3", RoutePolicy::Owner),
            (Method::GET, "/api/v1/movies", RoutePolicy::Authenticated),
            (Method::GET, "/api/v1/actors/1", RoutePolicy::Authenticated),
            (
                Method::DELETE,
                "/api/v1/actors/1",
                RoutePolicy::RequireRole(Role::Editor),
            ),
            (
                Method::POST,
                "/api/v1/movies",
                RoutePolicy::RequireRole(Role::Editor),
            ),
        ];

        for (method, path, expected) in cases {
            assert_eq!(
                table.resolve(&method, path).policy,
                expected,
                "{method} {path}"
            );
        }
    }

    #[test]
    fn test_owner_id_is_captured() {
        let table = PolicyTable::standard(false);

        let resolved = table.resolve(&Method::PUT, "/api/v1/users/2");
        assert_eq!(resolved.resource_owner_id, Some(2));

        let head = table.resolve(&Method::HEAD, "/api/v1/users/1");
        assert_eq!(head.policy, RoutePolicy::Owner);
        assert_eq!(head.resource_owner_id, Some(1));

        let unparseable = table.resolve(&Method::GET, "/api/v1/users/me");
        assert_eq!(unparseable.policy, RoutePolicy::Owner);
        assert_eq!(unparseable.resource_owner_id, None);
    }

    #[test]
    fn test_fallback_is_least_privilege() {
        let table = PolicyTable::standard(false);

        assert_eq!(
            table.resolve(&Method::GET, "/api/v1/unknown").policy,
            RoutePolicy::Authenticated
        );
        assert_eq!(
            table.resolve(&Method::PATCH, "/api/v1/unknown").policy,
            RoutePolicy::RequireRole(Role::Editor)
        );
        assert_eq!(
            table.resolve(&Method::DELETE, "/api/v1/users/1").policy,
            RoutePolicy::RequireRole(Role::Editor)
        );
    }

    #[test]
    fn test_console_bypass_only_when_enabled() {
        assert_eq!(
            PolicyTable::standard(true)
                .resolve(&Method::GET, "/db-console")
                .policy,
            RoutePolicy::Bypass
        );
        assert_eq!(
            PolicyTable::standard(false)
                .resolve(&Method::GET, "/db-console")
                .policy,
            RoutePolicy::Authenticated
        );
    }

    #[test]
    fn test_first_match_wins() {
        let table = PolicyTable::new(vec![
            PolicyRule::new(MethodMatcher::Any, "/a/**", RoutePolicy::Public),
            PolicyRule::new(MethodMatcher::Any, "/a/b", RoutePolicy::Owner),
        ]);
        assert_eq!(table.resolve(&Method::GET, "/a/b").policy, RoutePolicy::Public);
    }

    #[test]
    fn test_role_check() {
        let policy = RoutePolicy::RequireRole(Role::Editor);
        assert!(authorize(&editor(1), policy, None).is_ok());
        assert_eq!(authorize(&reader(1), policy, None), Err(AuthError::Forbidden));
        assert!(authorize(&reader(1), RoutePolicy::RequireRole(Role::Reader), None).is_ok());
    }

    #[test]
    fn test_ownership_check_ignores_role() {
        assert!(authorize(&reader(2), RoutePolicy::Owner, Some(2)).is_ok());
        assert_eq!(
            authorize(&editor(1), RoutePolicy::Owner, Some(2)),
            Err(AuthError::Forbidden)
        );
        assert_eq!(
            authorize(&editor(1), RoutePolicy::Owner, None),
            Err(AuthError::Forbidden)
        );
    }

    proptest! {
        #[test]
        fn prop_reader_never_mutates_catalog(
            user_id in 1i64..10_000,
            id in 1i64..10_000,
            resource in prop::sample::select(vec!["movies", "actors"]),
            method in prop::sample::select(vec![Method::POST, Method::PUT, Method::DELETE]),
        ) {
            let table = PolicyTable::standard(false);
            let resolved = table.resolve(&method, &format!("/api/v1/{resource}/{id}"));
            prop_assert_eq!(
                authorize(&reader(user_id), resolved.policy, resolved.resource_owner_id),
                Err(AuthError::Forbidden)
            );
        }

        #[test]
        fn prop_own_profile_always_allowed(user_id in 1i64..10_000, editor_role in any::<bool>()) {
            let role = if editor_role { Role::Editor } else { Role::Reader };
            let identity = Identity::new(user_id, "me@example.com", role);
            let table = PolicyTable::standard(false);

            for method in [Method::GET, Method::PUT] {
                let resolved = table.resolve(&method, &format!("/api/v1/users/{user_id}"));
                prop_assert!(authorize(&identity, resolved.policy, resolved.resource_owner_id).is_ok());
            }
        }
    }
}
