//! Control library types: categories, admin roles and controls.

use serde::{Deserialize, Serialize};

// ============================================================================
// ControlCategory
// ============================================================================

/// Governance domain a control belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlCategory {
    /// Data access and permissions.
    DataAccess,
    /// Sensitivity labels, encryption and marking.
    InformationProtection,
    /// Data loss prevention and compliance.
    DlpCompliance,
    /// Identity and access management.
    IdentityAccess,
    /// Agent safety principles.
    AgentSafety,
    /// Monitoring and lifecycle management.
    MonitoringLifecycle,
}

impl ControlCategory {
    /// All categories in display order.
    pub const ALL: [Self; 6] = [
        Self::DataAccess,
        Self::InformationProtection,
        Self::DlpCompliance,
        Self::IdentityAccess,
        Self::AgentSafety,
        Self::MonitoringLifecycle,
    ];

    /// Human-readable label.
    ///
    /// # Examples
    ///
    /// ```
    /// use escape_room_engine::ControlCategory;
    ///
    /// assert_eq!(ControlCategory::DlpCompliance.label(), "DLP & Compliance");
    /// ```
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::DataAccess => "Data Access & Permissions",
            Self::InformationProtection => "Information Protection",
            Self::DlpCompliance => "DLP & Compliance",
            Self::IdentityAccess => "Identity & Access",
            Self::AgentSafety => "Agent Safety Principles",
            Self::MonitoringLifecycle => "Monitoring & Lifecycle",
        }
    }

    /// Wire identifier, e.g. `data-access`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DataAccess => "data-access",
            Self::InformationProtection => "information-protection",
            Self::DlpCompliance => "dlp-compliance",
            Self::IdentityAccess => "identity-access",
            Self::AgentSafety => "agent-safety",
            Self::MonitoringLifecycle => "monitoring-lifecycle",
        }
    }

    /// Parses a wire identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == id)
    }
}

impl std::fmt::Display for ControlCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// AdminRole
// ============================================================================

/// Administrative role needed to implement a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminRole {
    /// Global Administrator.
    GlobalAdmin,
    /// SharePoint Administrator.
    SharepointAdmin,
    /// Site Collection Administrator.
    SiteCollectionAdmin,
    /// Compliance Administrator.
    ComplianceAdmin,
    /// Information Protection Administrator.
    InformationProtectionAdmin,
    /// Security Administrator.
    SecurityAdmin,
    /// Teams Administrator.
    TeamsAdmin,
    /// Power Platform Administrator.
    PowerPlatformAdmin,
    /// Exchange Administrator.
    ExchangeAdmin,
    /// Conditional Access Administrator.
    ConditionalAccessAdmin,
    /// Copilot Studio maker or admin.
    CopilotStudioMaker,
}

impl AdminRole {
    /// Human-readable role name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::GlobalAdmin => "Global Administrator",
            Self::SharepointAdmin => "SharePoint Administrator",
            Self::SiteCollectionAdmin => "Site Collection Administrator",
            Self::ComplianceAdmin => "Compliance Administrator",
            Self::InformationProtectionAdmin => "Information Protection Administrator",
            Self::SecurityAdmin => "Security Administrator",
            Self::TeamsAdmin => "Teams Administrator",
            Self::PowerPlatformAdmin => "Power Platform Administrator",
            Self::ExchangeAdmin => "Exchange Administrator",
            Self::ConditionalAccessAdmin => "Conditional Access Administrator",
            Self::CopilotStudioMaker => "Copilot Studio Maker/Admin",
        }
    }
}

// ============================================================================
// Control
// ============================================================================

/// A governance control the player can select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    /// Stable identifier, e.g. `least-privilege-access`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the control does.
    pub description: String,
    /// Governance domain.
    pub category: ControlCategory,
    /// Roles needed to implement it.
    #[serde(default)]
    pub admin_roles: Vec<AdminRole>,
    /// Emoji shown next to the name.
    pub icon: String,
    /// Documentation link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learn_more_url: Option<String>,
}

impl Control {
    /// Labels of the roles needed to implement this control.
    #[must_use]
    pub fn admin_role_names(&self) -> Vec<String> {
        self.admin_roles
            .iter()
            .map(|role| role.label().to_string())
            .collect()
    }
}
