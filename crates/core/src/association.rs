//! Task people synchronization planning.
//!
//! A task is linked to people through `(person, home, role)` associations.
//! The identity of an association is the `(person_id, home_id)` pair; the
//! role is a mutable attribute. [`plan_sync`] diffs a desired association
//! set against the persisted one and produces the minimal set of deletes,
//! role updates, and inserts needed to converge.
//!
//! Planning is pure. Applying the plan atomically and publishing the change
//! notifications after commit is the caller's job.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Identity of an association within one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationKey {
    pub person_id: DbId,
    pub home_id: DbId,
}

/// One entry of the desired association set, as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DesiredAssociation {
    #[validate(range(min = 1, message = "person_id must be a positive id"))]
    pub person_id: DbId,
    #[validate(range(min = 1, message = "role_id must be a positive id"))]
    pub role_id: DbId,
    #[validate(range(min = 1, message = "home_id must be a positive id"))]
    pub home_id: DbId,
}

impl DesiredAssociation {
    pub fn key(&self) -> AssociationKey {
        AssociationKey {
            person_id: self.person_id,
            home_id: self.home_id,
        }
    }
}

/// A persisted association row, reduced to the fields planning needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrentAssociation {
    pub id: DbId,
    pub person_id: DbId,
    pub home_id: DbId,
    pub role_id: DbId,
}

impl CurrentAssociation {
    pub fn key(&self) -> AssociationKey {
        AssociationKey {
            person_id: self.person_id,
            home_id: self.home_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Insert of a new association for the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewAssociation {
    pub subject_id: DbId,
    pub person_id: DbId,
    pub home_id: DbId,
    pub role_id: DbId,
}

/// In-place role change of an existing association row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleUpdate {
    /// Id of the existing row.
    pub id: DbId,
    pub person_id: DbId,
    pub home_id: DbId,
    pub previous_role_id: DbId,
    pub role_id: DbId,
}

/// Removal of an existing association row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Removal {
    /// Id of the existing row.
    pub id: DbId,
    pub person_id: DbId,
    pub home_id: DbId,
    pub role_id: DbId,
}

/// The minimal set of writes that converges the current associations of a
/// subject to the desired set.
///
/// Writes must be applied in the order deletes, updates, adds so a pair
/// that is removed and re-added never collides with the unique constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssociationPlan {
    pub subject_id: DbId,
    pub to_add: Vec<NewAssociation>,
    pub to_update: Vec<RoleUpdate>,
    pub to_delete: Vec<Removal>,
}

/// What happened to a person's link with the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Assigned,
    RoleChanged,
    Removed,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Assigned => "assigned",
            ChangeKind::RoleChanged => "role_changed",
            ChangeKind::Removed => "removed",
        }
    }
}

/// A single person-facing change derived from a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssociationChange {
    pub kind: ChangeKind,
    pub person_id: DbId,
    pub home_id: DbId,
    pub role_id: DbId,
}

impl AssociationPlan {
    /// `true` when the current state already matches the desired set.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of physical writes the plan performs.
    pub fn write_count(&self) -> usize {
        self.to_add.len() + self.to_update.len() + self.to_delete.len()
    }

    /// Person-facing changes, in write order (removals, role changes, assignments).
    pub fn changes(&self) -> Vec<AssociationChange> {
        let removed = self.to_delete.iter().map(|r| AssociationChange {
            kind: ChangeKind::Removed,
            person_id: r.person_id,
            home_id: r.home_id,
            role_id: r.role_id,
        });
        let updated = self.to_update.iter().map(|u| AssociationChange {
            kind: ChangeKind::RoleChanged,
            person_id: u.person_id,
            home_id: u.home_id,
            role_id: u.role_id,
        });
        let added = self.to_add.iter().map(|a| AssociationChange {
            kind: ChangeKind::Assigned,
            person_id: a.person_id,
            home_id: a.home_id,
            role_id: a.role_id,
        });
        removed.chain(updated).chain(added).collect()
    }
}

/// Diff `desired` against `current` for one subject.
///
/// Duplicate desired keys collapse with last-write-wins on the role while
/// keeping the position of the first occurrence. Adds and updates follow
/// desired order, deletes follow current order. Should `current` ever hold
/// two rows for one key, the later rows are scheduled for deletion.
pub fn plan_sync(
    subject_id: DbId,
    desired: &[DesiredAssociation],
    current: &[CurrentAssociation],
) -> AssociationPlan {
    let mut wanted: HashMap<AssociationKey, DbId> = HashMap::with_capacity(desired.len());
    let mut wanted_order: Vec<AssociationKey> = Vec::with_capacity(desired.len());
    for entry in desired {
        if wanted.insert(entry.key(), entry.role_id).is_none() {
            wanted_order.push(entry.key());
        }
    }

    let mut existing: HashMap<AssociationKey, &CurrentAssociation> =
        HashMap::with_capacity(current.len());
    let mut plan = AssociationPlan {
        subject_id,
        ..Default::default()
    };

    for row in current {
        let key = row.key();
        if existing.contains_key(&key) || !wanted.contains_key(&key) {
            plan.to_delete.push(Removal {
                id: row.id,
                person_id: row.person_id,
                home_id: row.home_id,
                role_id: row.role_id,
            });
        } else {
            existing.insert(key, row);
        }
    }

    for key in wanted_order {
        let role_id = wanted[&key];
        match existing.get(&key) {
            None => plan.to_add.push(NewAssociation {
                subject_id,
                person_id: key.person_id,
                home_id: key.home_id,
                role_id,
            }),
            Some(row) if row.role_id != role_id => plan.to_update.push(RoleUpdate {
                id: row.id,
                person_id: key.person_id,
                home_id: key.home_id,
                previous_role_id: row.role_id,
                role_id,
            }),
            Some(_) => {}
        }
    }

    plan
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the shape of a desired set before any store access.
///
/// Only individual entries are checked; the set itself may be any size.
pub fn validate_desired(desired: &[DesiredAssociation]) -> Result<(), CoreError> {
    for (index, entry) in desired.iter().enumerate() {
        entry.validate().map_err(|e| {
            CoreError::Validation(format!("people[{index}]: {e}"))
        })?;
    }
    Ok(())
}

/// Distinct ids referenced by a desired set, each list sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedIds {
    pub person_ids: Vec<DbId>,
    pub role_ids: Vec<DbId>,
    pub home_ids: Vec<DbId>,
}

pub fn referenced_ids(desired: &[DesiredAssociation]) -> ReferencedIds {
    fn distinct(ids: impl Iterator<Item = DbId>) -> Vec<DbId> {
        let mut ids: Vec<DbId> = ids.collect::<HashSet<_>>().into_iter().collect();
        ids.sort_unstable();
        ids
    }
    ReferencedIds {
        person_ids: distinct(desired.iter().map(|d| d.person_id)),
        role_ids: distinct(desired.iter().map(|d| d.role_id)),
        home_ids: distinct(desired.iter().map(|d| d.home_id)),
    }
}

/// Referenced ids that do not exist in their stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingReferences {
    pub person_ids: Vec<DbId>,
    pub role_ids: Vec<DbId>,
    pub home_ids: Vec<DbId>,
}

impl MissingReferences {
    pub fn is_empty(&self) -> bool {
        self.person_ids.is_empty() && self.role_ids.is_empty() && self.home_ids.is_empty()
    }

    /// `Ok(())` when nothing is missing, otherwise a [`CoreError::MissingReference`].
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingReference(self))
        }
    }
}

impl fmt::Display for MissingReferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.person_ids.is_empty() {
            parts.push(format!("persons {:?}", self.person_ids));
        }
        if !self.role_ids.is_empty() {
            parts.push(format!("roles {:?}", self.role_ids));
        }
        if !self.home_ids.is_empty() {
            parts.push(format!("homes {:?}", self.home_ids));
        }
        write!(f, "{}", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
