use serde::Serialize;

/// Operation kinds the desk tracks loading state and fallback messages for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LoadRegions,
    LinkRegion,
    LoadAssignments,
    Assign,
    AssignAll,
    LoadRecord,
    LoadLandlord,
    LoadTenantDocuments,
    Review,
}

impl Operation {
    pub const fn label(self) -> &'static str {
        match self {
            Operation::LoadRegions => "load_regions",
            Operation::LinkRegion => "link_region",
            Operation::LoadAssignments => "load_assignments",
            Operation::Assign => "assign",
            Operation::AssignAll => "assign_all",
            Operation::LoadRecord => "load_record",
            Operation::LoadLandlord => "load_landlord",
            Operation::LoadTenantDocuments => "load_tenant_documents",
            Operation::Review => "review",
        }
    }

    /// Shown when the server gave no message of its own.
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Operation::LoadRegions => "Failed to load regions",
            Operation::LinkRegion => "Failed to link region",
            Operation::LoadAssignments => "Failed to load assignments",
            Operation::Assign => "Failed to assign documents",
            Operation::AssignAll => "Failed to assign documents to all tenants",
            Operation::LoadRecord => "Failed to load verification details",
            Operation::LoadLandlord => "Failed to load landlord details",
            Operation::LoadTenantDocuments => "Failed to load tenant documents",
            Operation::Review => "Failed to submit review",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient, auto-dismissing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub operation: Operation,
    pub message: String,
}

impl Notice {
    pub fn info(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            operation,
            message: message.into(),
        }
    }

    pub fn error(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            operation,
            message: message.into(),
        }
    }
}

/// What the view has to react to after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeskEvent {
    Notice(Notice),
    /// Session missing or expired. Replaces the error notice.
    LoginRedirect { operation: Operation },
}
