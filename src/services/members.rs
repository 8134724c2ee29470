//! Member management service

use crate::{
    error::{AppError, AppResult},
    models::member::{CreateMember, Member, UpdateMember},
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all members
    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        self.repository.members.find_all().await
    }

    /// Get member by ID
    pub async fn get_member(&self, id: i32) -> AppResult<Member> {
        self.repository.members.get_by_id(id).await
    }

    /// Create a new member; the email must not be in use
    pub async fn create_member(&self, member: CreateMember) -> AppResult<Member> {
        if self.repository.members.get_by_email(&member.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        self.repository.members.create(&member).await
    }

    /// Update an existing member
    pub async fn update_member(&self, id: i32, member: UpdateMember) -> AppResult<Member> {
        // Check if member exists
        self.repository.members.get_by_id(id).await?;

        if let Some(ref email) = member.email {
            if self.repository.members.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict(
                    "Email already in use by another member".to_string(),
                ));
            }
        }

        self.repository.members.update(id, &member).await
    }

    /// Delete a member
    pub async fn delete_member(&self, id: i32, force: bool) -> AppResult<()> {
        self.repository.members.delete(id, force).await
    }
}
