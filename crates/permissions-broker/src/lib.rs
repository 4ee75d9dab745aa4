pub mod config;

pub use crate::config::{ConfigError, PolicyFile, PolicyTemplate, SitePolicy};
pub use tabpilot_core_types::PermissionKind;

use std::collections::HashSet;
use std::time::{Duration, Instant, SystemTime};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tabpilot_core_types::ToolUseId;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

/// Once-grants outlive their tool call only briefly; stale ones are purged on insert.
const ONCE_GRANT_RETENTION: Duration = Duration::from_secs(300);

/// Answer to a permission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCheck {
    pub allowed: bool,
    pub needs_prompt: bool,
}

impl PermissionCheck {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            needs_prompt: false,
        }
    }

    pub fn prompt() -> Self {
        Self {
            allowed: false,
            needs_prompt: true,
        }
    }

    pub fn denied() -> Self {
        Self {
            allowed: false,
            needs_prompt: false,
        }
    }

    pub fn decision(&self) -> DecisionKind {
        if self.allowed {
            DecisionKind::Allow
        } else if self.needs_prompt {
            DecisionKind::Prompt
        } else {
            DecisionKind::Deny
        }
    }
}

/// How long an approval from the user stays valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantScope {
    /// Valid only for the given tool call (and its retry).
    Once(ToolUseId),
    /// Valid for the origin until the policy ttl expires.
    Always,
}

/// Decision outcome categories.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DecisionKind {
    Allow = 0,
    Deny = 1,
    Prompt = 2,
}

/// Event emitted whenever the broker issues a decision or records a grant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub origin: String,
    pub permission: PermissionKind,
    pub decision: DecisionKind,
    pub granted: Option<GrantScope>,
    pub timestamp: SystemTime,
}

/// Errors produced by the broker surface.
#[derive(Clone, Debug, Error)]
pub enum BrokerError {
    #[error("policy denied: {0}")]
    PolicyDenied(String),
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Source of allow / prompt / deny decisions consumed by the dispatch engine.
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    async fn check_permission(
        &self,
        url: &str,
        kind: PermissionKind,
        tool_use_id: Option<&ToolUseId>,
    ) -> Result<PermissionCheck, BrokerError>;

    async fn grant(
        &self,
        url: &str,
        kind: PermissionKind,
        scope: GrantScope,
    ) -> Result<(), BrokerError>;
}

#[derive(Default)]
struct PolicyStore {
    file: Option<PolicyFile>,
}

impl PolicyStore {
    fn update(&mut self, file: PolicyFile) {
        self.file = Some(file);
    }

    fn resolve(&self, origin: &str) -> ResolvedPolicy {
        let file = match self.file.as_ref() {
            Some(file) => file.clone(),
            None => config::default_policy_file(),
        };
        let mut template = file.defaults.clone();
        let mut ttl = parse_ttl(template.ttl.as_deref()).unwrap_or(None);
        let mut best_match_len = 0usize;

        for site in &file.sites {
            if pattern_matches(&site.match_pattern, origin) {
                let match_len = site.match_pattern.len();
                if match_len >= best_match_len {
                    best_match_len = match_len;
                    if let Some(allow) = &site.allow {
                        template.allow = allow.clone();
                    }
                    if let Some(deny) = &site.deny {
                        template.deny = deny.clone();
                    }
                    if let Some(prompt) = site.prompt {
                        template.prompt = prompt;
                    }
                    if let Some(site_ttl) = &site.ttl {
                        if let Ok(parsed) = parse_ttl(Some(site_ttl)) {
                            ttl = parsed;
                        }
                        template.ttl = Some(site_ttl.clone());
                    }
                }
            }
        }

        ResolvedPolicy { template, ttl }
    }
}

#[derive(Clone)]
struct ResolvedPolicy {
    template: PolicyTemplate,
    ttl: Option<Duration>,
}

impl ResolvedPolicy {
    fn lists(&self, kind: PermissionKind) -> (bool, bool) {
        let label = kind.label();
        let denied = self.template.deny.iter().any(|name| name == label);
        let allowed = self.template.allow.iter().any(|name| name == label);
        (allowed, denied)
    }
}

#[derive(Clone)]
struct StandingGrant {
    expires_at: Option<Instant>,
}

impl StandingGrant {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

#[derive(Clone)]
struct OnceGrant {
    origin: String,
    kind: PermissionKind,
    granted_at: Instant,
}

fn pattern_matches(pattern: &str, origin: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if pattern.contains('*') {
        let parts: Vec<&str> = pattern.split('*').collect();
        if parts.len() == 2 {
            let prefix = parts[0];
            let suffix = parts[1];
            return origin.starts_with(prefix) && origin.ends_with(suffix);
        }
    }
    origin == pattern
}

fn parse_ttl(raw: Option<&str>) -> Result<Option<Duration>, BrokerError> {
    let Some(ttl_str) = raw else {
        return Ok(None);
    };

    if ttl_str.eq_ignore_ascii_case("session") {
        return Ok(None);
    }

    let duration = humantime::parse_duration(ttl_str)
        .map_err(|_| BrokerError::InvalidPolicy(format!("invalid ttl format: {ttl_str}")))?;
    Ok(Some(duration))
}

/// Reduce a page URL to the origin policies are keyed on.
pub fn origin_of(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(parsed) => match parsed.origin() {
            origin @ url::Origin::Tuple(..) => origin.ascii_serialization(),
            url::Origin::Opaque(_) => format!("{}:", parsed.scheme()),
        },
        Err(_) => raw.to_string(),
    }
}

/// Broker state with an in-memory policy store and grant tables.
pub struct PermissionsBroker {
    store: RwLock<PolicyStore>,
    cache: DashMap<String, ResolvedPolicy>,
    standing: DashMap<(String, PermissionKind), StandingGrant>,
    once: DashMap<ToolUseId, OnceGrant>,
    events: broadcast::Sender<AuditEvent>,
}

impl Default for PermissionsBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionsBroker {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(128);
        Self {
            store: RwLock::new(PolicyStore::default()),
            cache: DashMap::new(),
            standing: DashMap::new(),
            once: DashMap::new(),
            events: tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.events.subscribe()
    }

    pub async fn load_policy(&self, policy: PolicyFile) -> Result<(), BrokerError> {
        validate_policy(&policy)?;
        {
            let mut guard = self.store.write().await;
            guard.update(policy);
        }
        self.cache.clear();
        Ok(())
    }

    /// Drop every standing grant for the origin of `url`.
    pub fn revoke(&self, url: &str) -> usize {
        let origin = origin_of(url);
        let before = self.standing.len();
        self.standing.retain(|(granted_origin, _), _| granted_origin != &origin);
        self.once.retain(|_, grant| grant.origin != origin);
        before - self.standing.len()
    }

    async fn resolve_cached(&self, origin: &str) -> ResolvedPolicy {
        if let Some(entry) = self.cache.get(origin) {
            return entry.value().clone();
        }

        let resolved = {
            let guard = self.store.read().await;
            guard.resolve(origin)
        };
        self.cache.insert(origin.to_string(), resolved.clone());
        resolved
    }

    fn has_once_grant(&self, origin: &str, kind: PermissionKind, tool_use_id: &ToolUseId) -> bool {
        self.once
            .get(tool_use_id)
            .map(|grant| grant.origin == origin && grant.kind == kind)
            .unwrap_or(false)
    }

    fn has_standing_grant(&self, origin: &str, kind: PermissionKind) -> bool {
        let key = (origin.to_string(), kind);
        let expired = match self.standing.get(&key) {
            Some(grant) => grant.is_expired(),
            None => return false,
        };
        if expired {
            self.standing.remove(&key);
            return false;
        }
        true
    }

    fn publish_event(
        &self,
        origin: &str,
        permission: PermissionKind,
        decision: DecisionKind,
        granted: Option<GrantScope>,
    ) {
        let event = AuditEvent {
            origin: origin.to_string(),
            permission,
            decision,
            granted,
            timestamp: SystemTime::now(),
        };

        // A send error only means nobody is subscribed.
        if self.events.send(event).is_err() {
            debug!(target = "permissions-broker", "no audit subscribers");
        }
    }
}

#[async_trait]
impl PermissionAuthority for PermissionsBroker {
    async fn check_permission(
        &self,
        url: &str,
        kind: PermissionKind,
        tool_use_id: Option<&ToolUseId>,
    ) -> Result<PermissionCheck, BrokerError> {
        let origin = origin_of(url);
        let policy = self.resolve_cached(&origin).await;
        let (allowed, denied) = policy.lists(kind);

        let check = if denied {
            PermissionCheck::denied()
        } else if allowed {
            PermissionCheck::allowed()
        } else if tool_use_id
            .map(|id| self.has_once_grant(&origin, kind, id))
            .unwrap_or(false)
            || self.has_standing_grant(&origin, kind)
        {
            PermissionCheck::allowed()
        } else if policy.template.prompt {
            PermissionCheck::prompt()
        } else {
            PermissionCheck::denied()
        };

        debug!(
            target = "permissions-broker",
            origin = %origin,
            permission = %kind,
            decision = ?check.decision(),
            "permission checked"
        );
        self.publish_event(&origin, kind, check.decision(), None);
        Ok(check)
    }

    async fn grant(
        &self,
        url: &str,
        kind: PermissionKind,
        scope: GrantScope,
    ) -> Result<(), BrokerError> {
        let origin = origin_of(url);
        let policy = self.resolve_cached(&origin).await;
        let (_, denied) = policy.lists(kind);
        if denied {
            warn!(
                target = "permissions-broker",
                origin = %origin,
                permission = %kind,
                "refusing grant for a denied category"
            );
            return Err(BrokerError::PolicyDenied(format!(
                "{kind} is denied for {origin}"
            )));
        }

        match &scope {
            GrantScope::Once(tool_use_id) => {
                self.once
                    .retain(|_, grant| grant.granted_at.elapsed() < ONCE_GRANT_RETENTION);
                self.once.insert(
                    tool_use_id.clone(),
                    OnceGrant {
                        origin: origin.clone(),
                        kind,
                        granted_at: Instant::now(),
                    },
                );
            }
            GrantScope::Always => {
                let expires_at = policy.ttl.map(|ttl| Instant::now() + ttl);
                self.standing
                    .insert((origin.clone(), kind), StandingGrant { expires_at });
            }
        }

        self.publish_event(&origin, kind, DecisionKind::Allow, Some(scope));
        Ok(())
    }
}

fn validate_policy(policy: &PolicyFile) -> Result<(), BrokerError> {
    let mut invalid = HashSet::new();
    let mut check = |names: &[String]| {
        for name in names {
            if name.parse::<PermissionKind>().is_err() {
                invalid.insert(name.clone());
            }
        }
    };

    check(&policy.defaults.allow);
    check(&policy.defaults.deny);
    for site in &policy.sites {
        if let Some(allow) = &site.allow {
            check(allow);
        }
        if let Some(deny) = &site.deny {
            check(deny);
        }
    }

    parse_ttl(policy.defaults.ttl.as_deref())?;
    for site in &policy.sites {
        parse_ttl(site.ttl.as_deref())?;
    }

    if invalid.is_empty() {
        Ok(())
    } else {
        let mut names = invalid.into_iter().collect::<Vec<_>>();
        names.sort();
        Err(BrokerError::InvalidPolicy(format!(
            "unknown permission categories: {}",
            names.join(", ")
        )))
    }
}
