//! Caller identity, permission gate, and the scope-bypass policy.

use crate::config::{AccessTokenConfig, EntityDescriptor};
use crate::error::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Credential presented by the current request. Request-scoped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Caller {
    pub token: Option<String>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Caller { token: None }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Caller {
            token: Some(token.into()),
        }
    }
}

/// Authorization seam. The guard is always passed in; implementations must not keep
/// an "active guard" between calls.
pub trait PermissionGate: Send + Sync {
    /// Whether the caller authenticates under at least one guard.
    fn authenticate(&self, caller: &Caller) -> bool;

    /// Whether the caller, authenticated under `guard`, is granted `permission`.
    fn allows(&self, caller: &Caller, guard: &str, permission: &str) -> bool;
}

pub type PermissionGateRef = Arc<dyn PermissionGate>;

/// Static bearer-token gate built from `access_tokens` in the registration file.
#[derive(Clone, Debug, Default)]
pub struct TokenGate {
    /// guard -> token -> permissions
    by_guard: HashMap<String, HashMap<String, HashSet<String>>>,
}

impl TokenGate {
    pub fn from_config(tokens: &[AccessTokenConfig]) -> Self {
        let mut by_guard: HashMap<String, HashMap<String, HashSet<String>>> = HashMap::new();
        for t in tokens {
            by_guard
                .entry(t.guard.clone())
                .or_default()
                .entry(t.token.clone())
                .or_default()
                .extend(t.permissions.iter().cloned());
        }
        TokenGate { by_guard }
    }

    pub fn deny_all() -> Self {
        TokenGate::default()
    }
}

impl PermissionGate for TokenGate {
    fn authenticate(&self, caller: &Caller) -> bool {
        let Some(token) = caller.token.as_deref() else { return false };
        self.by_guard.values().any(|tokens| tokens.contains_key(token))
    }

    fn allows(&self, caller: &Caller, guard: &str, permission: &str) -> bool {
        let Some(token) = caller.token.as_deref() else { return false };
        self.by_guard
            .get(guard)
            .and_then(|tokens| tokens.get(token))
            .map(|perms| perms.contains(permission))
            .unwrap_or(false)
    }
}

/// Decides authentication and default-scope bypass for one entity and caller.
#[derive(Clone)]
pub struct AccessPolicy {
    gate: PermissionGateRef,
}

impl AccessPolicy {
    pub fn new(gate: PermissionGateRef) -> Self {
        AccessPolicy { gate }
    }

    /// Entities registered with `authenticate` reject callers no guard recognises.
    pub fn ensure_authenticated(&self, entity: &EntityDescriptor, caller: &Caller) -> Result<(), AppError> {
        if !entity.authenticate || self.gate.authenticate(caller) {
            return Ok(());
        }
        Err(AppError::Unauthorized(format!(
            "authentication required for table: {}",
            entity.table_name
        )))
    }

    /// True iff the bypass signal is present and the caller holds one of the entity's
    /// global access permissions. Each permission is checked under the guard of the same name.
    /// Without the signal no permission is evaluated.
    pub fn should_bypass_scopes(&self, entity: &EntityDescriptor, caller: &Caller, bypass_signal: bool) -> bool {
        if !bypass_signal {
            return false;
        }
        let allowed = entity
            .global_access_permissions()
            .iter()
            .any(|permission| self.gate.allows(caller, permission, permission));
        tracing::debug!(table = %entity.table_name, allowed, "scope bypass evaluated");
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGate {
        calls: AtomicUsize,
        answer: bool,
    }

    impl PermissionGate for CountingGate {
        fn authenticate(&self, _caller: &Caller) -> bool {
            true
        }

        fn allows(&self, _caller: &Caller, _guard: &str, _permission: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    fn entity_with(perms: &[&str]) -> EntityDescriptor {
        let mut e = EntityDescriptor::new("some_table", &["id"]);
        e.global_access_permissions = perms.iter().map(|p| p.to_string()).collect();
        e
    }

    #[test]
    fn no_signal_skips_gate() {
        let gate = Arc::new(CountingGate { calls: AtomicUsize::new(0), answer: true });
        let policy = AccessPolicy::new(gate.clone());
        assert!(!policy.should_bypass_scopes(&entity_with(&["admin"]), &Caller::anonymous(), false));
        assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn signal_with_granted_permission() {
        let gate = Arc::new(CountingGate { calls: AtomicUsize::new(0), answer: true });
        let policy = AccessPolicy::new(gate.clone());
        assert!(policy.should_bypass_scopes(&entity_with(&["ignore-batching-scopes"]), &Caller::bearer("t"), true));
        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_permission_list_denies() {
        let gate = Arc::new(CountingGate { calls: AtomicUsize::new(0), answer: true });
        let policy = AccessPolicy::new(gate.clone());
        assert!(!policy.should_bypass_scopes(&entity_with(&[]), &Caller::bearer("t"), true));
        assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn token_gate_checks_guard_and_permission() {
        let gate = TokenGate::from_config(&[
            AccessTokenConfig { token: "abc".into(), guard: "admin".into(), permissions: vec!["admin".into()] },
            AccessTokenConfig { token: "xyz".into(), guard: "web".into(), permissions: vec!["admin".into()] },
        ]);
        assert!(gate.allows(&Caller::bearer("abc"), "admin", "admin"));
        assert!(!gate.allows(&Caller::bearer("xyz"), "admin", "admin"));
        assert!(!gate.allows(&Caller::anonymous(), "admin", "admin"));
        assert!(gate.authenticate(&Caller::bearer("xyz")));
        assert!(!gate.authenticate(&Caller::bearer("nope")));
    }

    #[test]
    fn any_permission_suffices() {
        let gate = Arc::new(TokenGate::from_config(&[AccessTokenConfig {
            token: "ed".into(),
            guard: "editor".into(),
            permissions: vec!["editor".into()],
        }]));
        let policy = AccessPolicy::new(gate);
        assert!(policy.should_bypass_scopes(&entity_with(&["user", "editor"]), &Caller::bearer("ed"), true));
    }

    #[test]
    fn unauthenticated_caller_rejected() {
        let policy = AccessPolicy::new(Arc::new(TokenGate::deny_all()));
        let mut e = entity_with(&[]);
        e.authenticate = true;
        assert!(matches!(policy.ensure_authenticated(&e, &Caller::anonymous()), Err(AppError::Unauthorized(_))));
        e.authenticate = false;
        assert!(policy.ensure_authenticated(&e, &Caller::anonymous()).is_ok());
    }
}
