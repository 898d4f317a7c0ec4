//! Association lifecycle rules
//!
//! Deleting a team deletes its members; deleting a member deletes its
//! membership rows; deleting a project clears the project side of its
//! membership rows and leaves the members alone. Each routine runs inside
//! the caller's transaction, so a failure at any step leaves nothing applied
//! once the transaction is dropped.

use tracing::debug;

use super::member::{MemberId, MemberRepository};
use super::membership::MembershipRepository;
use super::project::{ProjectId, ProjectRepository};
use super::store::Transaction;
use super::team::{TeamId, TeamRepository};
use super::DomainError;

/// Delete a team, its members, and their membership rows
pub async fn destroy_team(tx: &mut dyn Transaction, id: TeamId) -> Result<(), DomainError> {
    if tx.find_team(id).await?.is_none() {
        return Err(DomainError::not_found(format!("Team '{}' not found", id)));
    }

    let members = tx.members_of_team(id).await?;
    debug!(team_id = %id, members = members.len(), "Cascading team delete to members");

    for member in members {
        destroy_member(tx, member.id()).await?;
    }

    if !tx.delete_team(id).await.map_err(|e| step_failed("delete team", e))? {
        return Err(DomainError::delete_failure(format!("Team '{}' vanished during delete", id)));
    }

    Ok(())
}

/// Delete a member and every membership row referencing it
pub async fn destroy_member(tx: &mut dyn Transaction, id: MemberId) -> Result<(), DomainError> {
    if tx.find_member(id).await?.is_none() {
        return Err(DomainError::not_found(format!("Member '{}' not found", id)));
    }

    let links = tx.memberships_of_member(id).await?;
    debug!(member_id = %id, links = links.len(), "Cascading member delete to memberships");

    for link in links {
        tx.delete_membership(link.id())
            .await
            .map_err(|e| step_failed("delete membership", e))?;
    }

    if !tx.delete_member(id).await.map_err(|e| step_failed("delete member", e))? {
        return Err(DomainError::delete_failure(format!(
            "Member '{}' vanished during delete",
            id
        )));
    }

    Ok(())
}

/// Delete a project, clearing the project side of its membership rows
pub async fn destroy_project(tx: &mut dyn Transaction, id: ProjectId) -> Result<(), DomainError> {
    if tx.find_project(id).await?.is_none() {
        return Err(DomainError::not_found(format!("Project '{}' not found", id)));
    }

    let links = tx.memberships_of_project(id).await?;
    debug!(project_id = %id, links = links.len(), "Nullifying project memberships");

    for mut link in links {
        link.clear_project();
        tx.update_membership(&link)
            .await
            .map_err(|e| step_failed("nullify membership", e))?;
    }

    if !tx.delete_project(id).await.map_err(|e| step_failed("delete project", e))? {
        return Err(DomainError::delete_failure(format!(
            "Project '{}' vanished during delete",
            id
        )));
    }

    Ok(())
}

/// Link a member to a project unless the link already exists
pub async fn link_member(
    tx: &mut dyn Transaction,
    project: ProjectId,
    member: MemberId,
) -> Result<bool, DomainError> {
    let links = tx.memberships_of_project(project).await?;

    if links.iter().any(|link| link.member_id() == Some(member)) {
        return Ok(false);
    }

    tx.insert_membership(project, member).await?;
    Ok(true)
}

/// Make the project's member set exactly `members`
///
/// Links to members outside the set are deleted; missing links are added
/// in the given order.
pub async fn replace_members(
    tx: &mut dyn Transaction,
    project: ProjectId,
    members: &[MemberId],
) -> Result<(), DomainError> {
    for link in tx.memberships_of_project(project).await? {
        let keep = link.member_id().is_some_and(|m| members.contains(&m));

        if !keep {
            tx.delete_membership(link.id()).await?;
        }
    }

    for member in members {
        link_member(tx, project, *member).await?;
    }

    Ok(())
}

fn step_failed(step: &str, err: DomainError) -> DomainError {
    match err {
        DomainError::NotFound { .. } | DomainError::DeleteFailure { .. } => err,
        other => DomainError::delete_failure(format!("{} failed: {}", step, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::NewMember;
    use crate::domain::project::NewProject;
    use crate::domain::store::Store;
    use crate::domain::team::NewTeam;
    use crate::infrastructure::storage::{FailurePoint, InMemoryStore};

    struct Fixture {
        team: TeamId,
        other_team: TeamId,
        ada: MemberId,
        grace: MemberId,
        linus: MemberId,
        apollo: ProjectId,
        gemini: ProjectId,
    }

    async fn seed(store: &InMemoryStore) -> Fixture {
        let mut tx = store.begin().await.unwrap();

        let team = tx.insert_team(NewTeam::new("Alpha")).await.unwrap().id();
        let other_team = tx.insert_team(NewTeam::new("Beta")).await.unwrap().id();
        let ada = tx
            .insert_member(NewMember::new(team, "Ada", "Lovelace"))
            .await
            .unwrap()
            .id();
        let grace = tx
            .insert_member(NewMember::new(team, "Grace", "Hopper"))
            .await
            .unwrap()
            .id();
        let linus = tx
            .insert_member(NewMember::new(other_team, "Linus", "Torvalds"))
            .await
            .unwrap()
            .id();
        let apollo = tx.insert_project(&NewProject::new("Apollo")).await.unwrap().id();
        let gemini = tx.insert_project(&NewProject::new("Gemini")).await.unwrap().id();

        tx.insert_membership(apollo, ada).await.unwrap();
        tx.insert_membership(apollo, grace).await.unwrap();
        tx.insert_membership(gemini, ada).await.unwrap();
        tx.insert_membership(gemini, linus).await.unwrap();
        tx.commit().await.unwrap();

        Fixture {
            team,
            other_team,
            ada,
            grace,
            linus,
            apollo,
            gemini,
        }
    }

    #[tokio::test]
    async fn test_destroy_team_cascades_to_members_and_links() {
        let store = InMemoryStore::new();
        let f = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        destroy_team(&mut *tx, f.team).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_team(f.team).await.unwrap().is_none());
        assert!(tx.members_of_team(f.team).await.unwrap().is_empty());
        assert!(tx.find_member(f.ada).await.unwrap().is_none());
        assert!(tx.find_member(f.grace).await.unwrap().is_none());

        let remaining = tx.all_memberships().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].member_id(), Some(f.linus));

        assert!(tx.find_team(f.other_team).await.unwrap().is_some());
        assert!(tx.find_project(f.apollo).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_destroy_member_removes_links_on_every_project() {
        let store = InMemoryStore::new();
        let f = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        destroy_member(&mut *tx, f.ada).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.memberships_of_member(f.ada).await.unwrap().is_empty());
        assert_eq!(tx.members_of_project(f.apollo).await.unwrap().len(), 1);
        assert_eq!(tx.members_of_project(f.gemini).await.unwrap().len(), 1);
        assert!(tx.find_member(f.grace).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_destroy_project_nullifies_links() {
        let store = InMemoryStore::new();
        let f = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        let grace_before = tx.find_member(f.grace).await.unwrap().unwrap();
        destroy_project(&mut *tx, f.apollo).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_project(f.apollo).await.unwrap().is_none());
        assert_eq!(tx.find_member(f.grace).await.unwrap(), Some(grace_before));

        let links = tx.all_memberships().await.unwrap();
        assert_eq!(links.len(), 4);
        assert!(links.iter().all(|l| l.project_id() != Some(f.apollo)));

        let orphaned: Vec<_> = links.iter().filter(|l| l.project_id().is_none()).collect();
        assert_eq!(orphaned.len(), 2);
        assert!(orphaned.iter().any(|l| l.member_id() == Some(f.grace)));
    }

    #[tokio::test]
    async fn test_orphaned_links_removed_when_member_destroyed() {
        let store = InMemoryStore::new();
        let f = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        destroy_project(&mut *tx, f.apollo).await.unwrap();
        destroy_member(&mut *tx, f.grace).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let links = tx.all_memberships().await.unwrap();
        assert!(links.iter().all(|l| l.member_id() != Some(f.grace)));
    }

    #[tokio::test]
    async fn test_destroy_missing_rows_is_not_found() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        assert!(destroy_team(&mut *tx, TeamId::new(99)).await.unwrap_err().is_not_found());
        assert!(destroy_member(&mut *tx, MemberId::new(99)).await.unwrap_err().is_not_found());
        assert!(
            destroy_project(&mut *tx, ProjectId::new(99))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_failed_cascade_leaves_every_row_in_place() {
        let store = InMemoryStore::new();
        let f = seed(&store).await;
        let failing = store.clone().with_failure(FailurePoint::DeleteMembership);

        let mut tx = failing.begin().await.unwrap();
        let err = destroy_team(&mut *tx, f.team).await.unwrap_err();
        assert!(matches!(err, DomainError::DeleteFailure { .. }));
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_team(f.team).await.unwrap().is_some());
        assert_eq!(tx.members_of_team(f.team).await.unwrap().len(), 2);
        assert_eq!(tx.all_memberships().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_nullify_leaves_project_in_place() {
        let store = InMemoryStore::new();
        let f = seed(&store).await;
        let failing = store.clone().with_failure(FailurePoint::UpdateMembership);

        let mut tx = failing.begin().await.unwrap();
        let err = destroy_project(&mut *tx, f.apollo).await.unwrap_err();
        assert!(matches!(err, DomainError::DeleteFailure { .. }));
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_project(f.apollo).await.unwrap().is_some());
        assert_eq!(tx.members_of_project(f.apollo).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_link_member_is_idempotent() {
        let store = InMemoryStore::new();
        let f = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        assert!(!link_member(&mut *tx, f.apollo, f.ada).await.unwrap());
        assert!(link_member(&mut *tx, f.apollo, f.linus).await.unwrap());
        assert_eq!(tx.members_of_project(f.apollo).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_replace_members() {
        let store = InMemoryStore::new();
        let f = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        replace_members(&mut *tx, f.apollo, &[f.grace, f.linus]).await.unwrap();

        let names: Vec<String> = tx
            .members_of_project(f.apollo)
            .await
            .unwrap()
            .iter()
            .map(|m| m.first_name().to_string())
            .collect();
        assert_eq!(names, vec!["Grace", "Linus"]);

        replace_members(&mut *tx, f.apollo, &[]).await.unwrap();
        assert!(tx.members_of_project(f.apollo).await.unwrap().is_empty());
    }
}
