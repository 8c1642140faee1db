//! Checks that run before anything is sent. A failure here never reaches the network.

use std::collections::HashSet;

use super::domain::{ReviewAction, TenantId, VerificationId, VerificationStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a remark is required to reject a verification")]
    MissingRemark,
    #[error("select at least one tenant to assign")]
    EmptyTenantSelection,
    #[error("{field} is required")]
    BlankIdentifier { field: &'static str },
    #[error("verification {id} is already {status}")]
    AlreadyResolved {
        id: VerificationId,
        status: VerificationStatus,
    },
}

/// Trimmed, non-empty identifier or a validation failure naming the field.
pub fn require_id(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankIdentifier { field });
    }
    Ok(trimmed.to_string())
}

/// Review payload that has passed the remark rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDecision {
    action: ReviewAction,
    remark: Option<String>,
}

impl ReviewDecision {
    /// Rejections carry the trimmed remark; approvals never carry one.
    pub fn new(action: ReviewAction, remark: Option<&str>) -> Result<Self, ValidationError> {
        match action {
            ReviewAction::Approve => Ok(Self {
                action,
                remark: None,
            }),
            ReviewAction::Reject => {
                let remark = remark
                    .map(str::trim)
                    .filter(|remark| !remark.is_empty())
                    .ok_or(ValidationError::MissingRemark)?;
                Ok(Self {
                    action,
                    remark: Some(remark.to_string()),
                })
            }
        }
    }

    pub fn approve() -> Self {
        Self {
            action: ReviewAction::Approve,
            remark: None,
        }
    }

    pub fn action(&self) -> ReviewAction {
        self.action
    }

    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }
}

/// Non-empty, duplicate-free tenant set in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSelection(Vec<TenantId>);

impl TenantSelection {
    pub fn new<I, S>(tenant_ids: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for raw in tenant_ids {
            let id = raw.as_ref().trim();
            if id.is_empty() {
                continue;
            }
            if seen.insert(id.to_string()) {
                selected.push(TenantId::new(id));
            }
        }

        if selected.is_empty() {
            return Err(ValidationError::EmptyTenantSelection);
        }
        Ok(Self(selected))
    }

    pub fn ids(&self) -> &[TenantId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
