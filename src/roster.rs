//! Membership store. Mirrors the catalog without any copy accounting.

use tracing::info;

use crate::error::{required, EntityKind, LibraryError, Result};
use crate::ledger::LoanIndex;
use crate::models::Member;

#[derive(Debug, Default, Clone)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_members(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn add(&mut self, id: &str, name: &str, email: &str, contact: &str) -> Result<&Member> {
        let id = required("Member ID", id)?;
        let name = required("Name", name)?;
        let email = required("Email", email)?;
        let contact = required("Contact", contact)?;
        if self.members.iter().any(|m| m.id.eq_ignore_ascii_case(&id)) {
            return Err(LibraryError::duplicate(EntityKind::Member, &id));
        }

        info!(member_id = %id, "member added");
        self.members.push(Member {
            id,
            name,
            email,
            contact,
        });
        Ok(&self.members[self.members.len() - 1])
    }

    pub fn update(&mut self, id: &str, name: &str, email: &str, contact: &str) -> Result<&Member> {
        let name = required("Name", name)?;
        let email = required("Email", email)?;
        let contact = required("Contact", contact)?;
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Member, id))?;

        member.name = name;
        member.email = email;
        member.contact = contact;
        info!(member_id = %member.id, "member updated");
        Ok(&*member)
    }

    pub fn remove(&mut self, id: &str, loans: &impl LoanIndex) -> Result<Member> {
        let idx = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| LibraryError::not_found(EntityKind::Member, id))?;
        if loans.has_active_loan_for_member(id) {
            return Err(LibraryError::active_loans(EntityKind::Member, id));
        }
        let member = self.members.remove(idx);
        info!(member_id = %member.id, "member removed");
        Ok(member)
    }

    pub fn get(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn list(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
