use serde::{Deserialize, Serialize};

/// Project delivery phase shown in the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Proposal,
    Active,
    Review,
    Complete,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposal => "proposal",
            Self::Active => "active",
            Self::Review => "review",
            Self::Complete => "complete",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposal" => Ok(Self::Proposal),
            "active" => Ok(Self::Active),
            "review" => Ok(Self::Review),
            "complete" => Ok(Self::Complete),
            _ => Err(()),
        }
    }
}

/// A client engagement. Peripheral to the sync pipeline - simple record
/// with status/progress fields for the portal dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: String,
    pub client_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    /// Completion percentage, 0-100.
    pub progress: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub client_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A deliverable or contract shared with a client.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub name: String,
    pub url: String,
    pub created_at: i64,
}
