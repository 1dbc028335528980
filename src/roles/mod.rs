//! Roles: the catalog, the knowledge table, and dealing.

pub mod assignment;
pub mod catalog;
pub mod visibility;

pub use assignment::{assign_roles, deal, role_multiset, Deal};
pub use catalog::{team_for_key, RoleInfo, RoleKey, Team};
pub use visibility::{knowledge_for, knowledge_of, Knowledge, KnowledgeLabel, KnownParticipant};
