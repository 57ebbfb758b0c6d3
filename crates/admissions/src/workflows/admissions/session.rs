use serde::Serialize;

use super::domain::{StaffId, StaffMember};

/// The signed-in staff member acting on the review board.
///
/// Built by the caller and handed to the workflow; nothing here reads ambient browser or
/// process state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSession {
    pub staff_id: StaffId,
    pub display_name: Option<String>,
}

impl ReviewSession {
    pub fn new(staff_id: impl Into<String>) -> Self {
        Self {
            staff_id: StaffId(staff_id.into()),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Build a session from raw header values, rejecting a blank staff id.
    pub fn from_parts(staff_id: Option<&str>, display_name: Option<&str>) -> Option<Self> {
        let staff_id = staff_id.map(str::trim).filter(|id| !id.is_empty())?;
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Some(Self {
            staff_id: StaffId(staff_id.to_string()),
            display_name,
        })
    }
}

impl From<StaffMember> for ReviewSession {
    fn from(member: StaffMember) -> Self {
        Self {
            staff_id: member.id,
            display_name: Some(member.display_name),
        }
    }
}
