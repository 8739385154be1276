// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account approvals and the LQ -> Manager reporting edges.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use leadflow_core::{
    Caller, LeadflowError, Role, Store, User, UserFilter, UserId, UserOrder, UserStatus,
};

/// An approved Manager together with the users reporting to them.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerTeam {
    #[serde(flatten)]
    pub manager: User,
    #[serde(rename = "assignedLQs")]
    pub assigned_lqs: Vec<User>,
}

#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn Store>,
}

fn approved(role: Role) -> UserFilter {
    UserFilter {
        role: Some(role),
        status: Some(UserStatus::Approved),
        reports_to: None,
    }
}

fn non_empty_ids(ids: &[UserId]) -> Result<Vec<UserId>, LeadflowError> {
    let ids: Vec<UserId> = ids
        .iter()
        .filter(|id| !id.0.trim().is_empty())
        .cloned()
        .collect();
    if ids.is_empty() {
        return Err(LeadflowError::invalid("lqIds", "lqIds array is required"));
    }
    Ok(ids)
}

impl UserDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Signup requests awaiting approval, newest first.
    pub async fn pending_requests(&self) -> Result<Vec<User>, LeadflowError> {
        self.store
            .list_users(
                &UserFilter {
                    status: Some(UserStatus::Pending),
                    ..UserFilter::default()
                },
                UserOrder::CreatedDesc,
            )
            .await
    }

    pub async fn approve(
        &self,
        caller: &Caller,
        id: &UserId,
        role: Role,
    ) -> Result<User, LeadflowError> {
        let user = self
            .store
            .approve_pending_user(id, role, &caller.id, Utc::now())
            .await?
            .ok_or_else(|| LeadflowError::NotFoundOrNotOwned("Pending request not found".into()))?;
        info!(user_id = %user.id, %role, caller = %caller.id, "user approved");
        Ok(user)
    }

    /// Deletes a pending signup request.
    pub async fn reject(&self, caller: &Caller, id: &UserId) -> Result<(), LeadflowError> {
        if !self.store.delete_pending_user(id).await? {
            return Err(LeadflowError::NotFoundOrNotOwned(
                "Pending request not found".into(),
            ));
        }
        info!(user_id = %id, caller = %caller.id, "signup request rejected");
        Ok(())
    }

    /// Points the approved Lead Qualifiers among `lq_ids` at `manager`.
    /// Returns how many were updated.
    pub async fn assign_lqs(
        &self,
        caller: &Caller,
        manager: &UserId,
        lq_ids: &[UserId],
    ) -> Result<usize, LeadflowError> {
        let ids = non_empty_ids(lq_ids)?;
        match self.store.get_user(manager).await? {
            Some(m) if m.is_approved_as(Role::Manager) => {}
            _ => return Err(LeadflowError::invalid("managerId", "Manager not found")),
        }
        let count = self.store.set_reports_to(&ids, Some(manager)).await?;
        info!(manager = %manager, count, caller = %caller.id, "lead qualifiers assigned");
        Ok(count)
    }

    pub async fn unassign_lqs(
        &self,
        caller: &Caller,
        lq_ids: &[UserId],
    ) -> Result<usize, LeadflowError> {
        let ids = non_empty_ids(lq_ids)?;
        let count = self.store.set_reports_to(&ids, None).await?;
        info!(count, caller = %caller.id, "lead qualifiers unassigned");
        Ok(count)
    }

    /// Approved Lead Qualifiers without a reporting Manager, by name.
    pub async fn unassigned_lqs(&self) -> Result<Vec<User>, LeadflowError> {
        let lqs = self
            .store
            .list_users(&approved(Role::LeadQualifier), UserOrder::Name)
            .await?;
        Ok(lqs.into_iter().filter(|u| u.reports_to.is_none()).collect())
    }

    /// Approved Managers with at least one reporting user, by name.
    pub async fn managers_with_lqs(&self) -> Result<Vec<ManagerTeam>, LeadflowError> {
        let teams = self.manager_teams().await?;
        Ok(teams
            .into_iter()
            .filter(|t| !t.assigned_lqs.is_empty())
            .collect())
    }

    /// Approved Managers nobody reports to, by name.
    pub async fn managers_without_lqs(&self) -> Result<Vec<User>, LeadflowError> {
        let teams = self.manager_teams().await?;
        Ok(teams
            .into_iter()
            .filter(|t| t.assigned_lqs.is_empty())
            .map(|t| t.manager)
            .collect())
    }

    async fn manager_teams(&self) -> Result<Vec<ManagerTeam>, LeadflowError> {
        let managers = self
            .store
            .list_users(&approved(Role::Manager), UserOrder::Name)
            .await?;
        let mut teams = Vec::with_capacity(managers.len());
        for manager in managers {
            let assigned_lqs = self
                .store
                .list_users(
                    &UserFilter {
                        reports_to: Some(manager.id.clone()),
                        ..UserFilter::default()
                    },
                    UserOrder::Name,
                )
                .await?;
            teams.push(ManagerTeam {
                manager,
                assigned_lqs,
            });
        }
        Ok(teams)
    }
}

#[cfg(test)]
mod tests {
    use leadflow_core::{ErrorKind, UserStore};

    use crate::workflow::fixtures::Fixture;

    use super::*;

    fn directory(fx: &Fixture) -> UserDirectory {
        UserDirectory::new(fx.store.clone())
    }

    #[tokio::test]
    async fn approve_and_reject_pending_requests() {
        let fx = Fixture::new().await;
        let admin = fx.user("root", Role::SuperAdmin).await;
        fx.user_with_status("new-1", Role::Verifier, UserStatus::Pending)
            .await;
        fx.user_with_status("new-2", Role::Verifier, UserStatus::Pending)
            .await;
        let dir = directory(&fx);
        assert_eq!(dir.pending_requests().await.unwrap().len(), 2);

        let user = dir
            .approve(&admin, &UserId("new-1".into()), Role::Manager)
            .await
            .unwrap();
        assert!(user.is_approved_as(Role::Manager));
        assert_eq!(user.approved_by, Some(admin.id.clone()));

        let again = dir
            .approve(&admin, &UserId("new-1".into()), Role::Manager)
            .await
            .unwrap_err();
        assert_eq!(again.kind(), ErrorKind::NotFoundOrNotOwned);

        dir.reject(&admin, &UserId("new-2".into())).await.unwrap();
        assert!(dir.pending_requests().await.unwrap().is_empty());
        assert!(
            fx.store
                .get_user(&UserId("new-2".into()))
                .await
                .unwrap()
                .is_none()
        );
        let err = dir.reject(&admin, &UserId("new-1".into())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFoundOrNotOwned);
    }

    #[tokio::test]
    async fn reporting_edges() {
        let fx = Fixture::new().await;
        let admin = fx.user("root", Role::SuperAdmin).await;
        let manager = fx.user("mgr-1", Role::Manager).await;
        let lq_a = fx.user("lq-a", Role::LeadQualifier).await;
        let lq_b = fx.user("lq-b", Role::LeadQualifier).await;
        let verifier = fx.user("v-1", Role::Verifier).await;
        let dir = directory(&fx);

        let ids = vec![lq_a.id.clone(), verifier.id.clone()];
        assert_eq!(dir.assign_lqs(&admin, &manager.id, &ids).await.unwrap(), 1);

        let unassigned = dir.unassigned_lqs().await.unwrap();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].id, lq_b.id);

        let err = dir.assign_lqs(&admin, &lq_b.id, &[lq_a.id.clone()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = dir.assign_lqs(&admin, &manager.id, &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert_eq!(dir.unassign_lqs(&admin, &[lq_a.id.clone()]).await.unwrap(), 1);
        assert_eq!(dir.unassigned_lqs().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn managers_split_by_team() {
        let fx = Fixture::new().await;
        let admin = fx.user("root", Role::SuperAdmin).await;
        let staffed = fx.user("mgr-b", Role::Manager).await;
        let idle = fx.user("mgr-a", Role::Manager).await;
        fx.user_with_status("mgr-c", Role::Manager, UserStatus::Pending)
            .await;
        let lq_1 = fx.user("lq-1", Role::LeadQualifier).await;
        let lq_2 = fx.user("lq-2", Role::LeadQualifier).await;
        let dir = directory(&fx);

        assert!(dir.managers_with_lqs().await.unwrap().is_empty());
        assert_eq!(dir.managers_without_lqs().await.unwrap().len(), 2);

        dir.assign_lqs(&admin, &staffed.id, &[lq_2.id.clone(), lq_1.id.clone()])
            .await
            .unwrap();

        let with = dir.managers_with_lqs().await.unwrap();
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].manager.id, staffed.id);
        let team: Vec<&UserId> = with[0].assigned_lqs.iter().map(|u| &u.id).collect();
        assert_eq!(team, vec![&lq_1.id, &lq_2.id]);

        let without = dir.managers_without_lqs().await.unwrap();
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].id, idle.id);

        let json = serde_json::to_value(&with[0]).unwrap();
        assert_eq!(json["name"], "MGR-B");
        assert_eq!(json["assignedLQs"].as_array().unwrap().len(), 2);
        assert!(json.get("passwordHash").is_none());
    }
}
