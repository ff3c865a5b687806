//! Work items and their resource requirements.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Identifier of a calendar booking: either internally-generated maintenance
/// (non-billable, occupies the slot) or a positive work-item id.
///
/// The integer encoding (`0` for maintenance) exists only for persisted and
/// wire forms; in-memory code matches on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunId {
    Maintenance,
    Work(i64),
}

impl RunId {
    /// A work-item id; fails unless strictly positive (`0` is reserved for
    /// maintenance, negatives are never valid).
    pub fn work(id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(ScheduleError::validation(
                "run id",
                format!("must be positive, got {id}"),
            ));
        }

        Ok(Self::Work(id))
    }

    pub fn is_maintenance(&self) -> bool {
        matches!(self, Self::Maintenance)
    }

    /// Integer form used in persisted calendars.
    pub fn encode(&self) -> i64 {
        match self {
            Self::Maintenance => 0,
            Self::Work(id) => *id,
        }
    }

    /// Inverse of [`encode`](Self::encode); rejects negative raw values.
    pub fn decode(raw: i64) -> Result<Self> {
        match raw {
            0 => Ok(Self::Maintenance),
            id if id > 0 => Ok(Self::Work(id)),
            id => Err(ScheduleError::validation(
                "run id",
                format!("negative id {id} in encoded form"),
            )),
        }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maintenance => write!(f, "maintenance"),
            Self::Work(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for RunId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.encode())
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        RunId::decode(raw).map_err(serde::de::Error::custom)
    }
}

/// One typed requirement of a run: "this many units of this resource type".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDependency {
    pub resource_type: u8,
    pub quantity: u16,
    /// Carried through for callers that pin a resource; the planner does not
    /// act on it.
    pub preferred_resource_id: Option<i64>,
}

impl RunDependency {
    pub fn new(resource_type: u8, quantity: u16) -> Self {
        Self {
            resource_type,
            quantity,
            preferred_resource_id: None,
        }
    }
}

/// A unit of work to be scheduled. `load` and `load_unit` describe billable
/// consumption; cost per resource is `load * price[load_unit]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub id: i64,
    pub name: String,
    pub dependencies: Vec<RunDependency>,
    pub load: f32,
    pub load_unit: u8,
    pub estimated_duration: i64,
}

impl Run {
    /// Distinct resource types this run depends on, ascending.
    pub fn needed_resource_types(&self) -> Vec<u8> {
        let mut types: Vec<u8> = self
            .dependencies
            .iter()
            .map(|dependency| dependency.resource_type)
            .collect();

        types.sort_unstable();
        types.dedup();

        types
    }

    /// Total quantity needed per resource type, summed across dependencies.
    pub fn needed_per_type(&self) -> BTreeMap<u8, u16> {
        let mut needed = BTreeMap::new();

        for dependency in &self.dependencies {
            *needed.entry(dependency.resource_type).or_insert(0) += dependency.quantity;
        }

        needed
    }
}
