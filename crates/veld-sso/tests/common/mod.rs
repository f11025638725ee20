//! Scripted broker double for lifecycle tests.
//!
//! Records every call in order and lets tests plan failures per operation,
//! per user, or per mapper key. Planned failures are consumed as they fire,
//! so retry behavior is observable through the call log.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use veld_broker::{
    BrokerError, BrokerResult, ClaimDescriptor, CreateProviderRequest, GroupMembership,
    IdentityBroker, ProviderHandle,
};
use veld_core::UserId;

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

/// One recorded broker call with the arguments the workflow passed.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerCall {
    CreateProvider {
        realm: String,
        name: String,
        discovery_endpoint: String,
    },
    CreateClaimMapper {
        realm: String,
        key: String,
        claim_value: String,
        group_path: String,
    },
    ListSsoUsers {
        realm: String,
    },
    ListUserGroups {
        user: UserId,
    },
    RemoveUserFromGroup {
        user: UserId,
        group_id: String,
    },
    LogoutUser {
        user: UserId,
    },
    DeleteProvider {
        realm: String,
    },
}

/// The error shape a planned failure produces.
#[derive(Debug, Clone, Copy)]
pub enum FailureKind {
    Unavailable,
    Auth,
    Rejected,
}

impl FailureKind {
    fn to_error(self) -> BrokerError {
        match self {
            FailureKind::Unavailable => BrokerError::unavailable("scripted outage"),
            FailureKind::Auth => BrokerError::Auth("scripted token expiry".into()),
            FailureKind::Rejected => BrokerError::Rejected {
                status: 400,
                message: "scripted rejection".into(),
            },
        }
    }
}

struct PlannedFailure {
    op: &'static str,
    user: Option<UserId>,
    mapper_key: Option<String>,
    remaining: u32,
    kind: FailureKind,
}

/// In-memory [`IdentityBroker`] with scripted users, groups, and failures.
#[derive(Default)]
pub struct ScriptedBroker {
    calls: Mutex<Vec<BrokerCall>>,
    users: Vec<UserId>,
    groups: HashMap<UserId, Vec<GroupMembership>>,
    failures: Mutex<Vec<PlannedFailure>>,
}

impl ScriptedBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the users `list_sso_users` returns.
    pub fn with_users(mut self, users: Vec<UserId>) -> Self {
        self.users = users;
        self
    }

    /// Set the `(group id, group path)` memberships of one user.
    pub fn with_groups(mut self, user: UserId, groups: Vec<(&str, &str)>) -> Self {
        self.groups.insert(
            user,
            groups
                .into_iter()
                .map(|(id, path)| GroupMembership {
                    id: id.to_string(),
                    path: path.to_string(),
                })
                .collect(),
        );
        self
    }

    /// Plan one failure for the next matching call of `op`.
    pub fn fail(&self, op: &'static str, kind: FailureKind) {
        self.fail_times(op, kind, 1);
    }

    /// Plan `times` consecutive failures for `op`.
    pub fn fail_times(&self, op: &'static str, kind: FailureKind, times: u32) {
        self.failures.lock().unwrap().push(PlannedFailure {
            op,
            user: None,
            mapper_key: None,
            remaining: times,
            kind,
        });
    }

    /// Plan one failure for `op` only when called for `user`.
    pub fn fail_for_user(&self, op: &'static str, user: UserId, kind: FailureKind) {
        self.failures.lock().unwrap().push(PlannedFailure {
            op,
            user: Some(user),
            mapper_key: None,
            remaining: 1,
            kind,
        });
    }

    /// Plan one failure for `create_claim_mapper` with the given mapper key.
    pub fn fail_for_mapper(&self, mapper_key: &str, kind: FailureKind) {
        self.failures.lock().unwrap().push(PlannedFailure {
            op: "create_claim_mapper",
            user: None,
            mapper_key: Some(mapper_key.to_string()),
            remaining: 1,
            kind,
        });
    }

    /// Snapshot of all calls recorded so far, in order.
    pub fn recorded(&self) -> Vec<BrokerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// How many recorded calls satisfy `pred`.
    pub fn count(&self, pred: impl Fn(&BrokerCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: BrokerCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(
        &self,
        op: &'static str,
        user: Option<UserId>,
        mapper_key: Option<&str>,
    ) -> Option<BrokerError> {
        let mut failures = self.failures.lock().unwrap();
        let index = failures.iter().position(|f| {
            f.op == op
                && f.user.map_or(true, |u| Some(u) == user)
                && f.mapper_key.as_deref().map_or(true, |k| Some(k) == mapper_key)
        })?;
        let kind = failures[index].kind;
        failures[index].remaining -= 1;
        if failures[index].remaining == 0 {
            failures.remove(index);
        }
        Some(kind.to_error())
    }
}

#[async_trait]
impl IdentityBroker for ScriptedBroker {
    async fn create_provider(
        &self,
        realm: &str,
        request: &CreateProviderRequest,
    ) -> BrokerResult<ProviderHandle> {
        self.record(BrokerCall::CreateProvider {
            realm: realm.to_string(),
            name: request.name.clone(),
            discovery_endpoint: request.discovery_endpoint.clone(),
        });
        if let Some(err) = self.take_failure("create_provider", None, None) {
            return Err(err);
        }
        Ok(ProviderHandle {
            alias: format!("{realm}-oidc"),
        })
    }

    async fn create_claim_mapper(
        &self,
        realm: &str,
        mapper_key: &str,
        claim: &ClaimDescriptor,
        group_path: &str,
    ) -> BrokerResult<()> {
        self.record(BrokerCall::CreateClaimMapper {
            realm: realm.to_string(),
            key: mapper_key.to_string(),
            claim_value: claim.value.clone(),
            group_path: group_path.to_string(),
        });
        if let Some(err) = self.take_failure("create_claim_mapper", None, Some(mapper_key)) {
            return Err(err);
        }
        Ok(())
    }

    async fn list_sso_users(&self, realm: &str) -> BrokerResult<Vec<UserId>> {
        self.record(BrokerCall::ListSsoUsers {
            realm: realm.to_string(),
        });
        if let Some(err) = self.take_failure("list_sso_users", None, None) {
            return Err(err);
        }
        Ok(self.users.clone())
    }

    async fn list_user_groups(
        &self,
        _realm: &str,
        user: UserId,
    ) -> BrokerResult<Vec<GroupMembership>> {
        self.record(BrokerCall::ListUserGroups { user });
        if let Some(err) = self.take_failure("list_user_groups", Some(user), None) {
            return Err(err);
        }
        Ok(self.groups.get(&user).cloned().unwrap_or_default())
    }

    async fn remove_user_from_group(
        &self,
        _realm: &str,
        user: UserId,
        group_id: &str,
    ) -> BrokerResult<()> {
        self.record(BrokerCall::RemoveUserFromGroup {
            user,
            group_id: group_id.to_string(),
        });
        if let Some(err) = self.take_failure("remove_user_from_group", Some(user), None) {
            return Err(err);
        }
        Ok(())
    }

    async fn logout_user(&self, _realm: &str, user: UserId) -> BrokerResult<()> {
        self.record(BrokerCall::LogoutUser { user });
        if let Some(err) = self.take_failure("logout_user", Some(user), None) {
            return Err(err);
        }
        Ok(())
    }

    async fn delete_provider(&self, realm: &str) -> BrokerResult<()> {
        self.record(BrokerCall::DeleteProvider {
            realm: realm.to_string(),
        });
        if let Some(err) = self.take_failure("delete_provider", None, None) {
            return Err(err);
        }
        Ok(())
    }
}
