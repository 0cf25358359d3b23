use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

// --- Identity Schemas ---

/// Role
///
/// The RBAC field resolved for every signed-in actor. The three roles map
/// one-to-one onto the three dashboard areas of the application and are
/// serialized lowercase on the wire (`"student"`, `"recruiter"`, `"admin"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Student,
    Recruiter,
    Admin,
}

impl Role {
    /// All roles, in display order. Used by the demo-mode entry points.
    pub const ALL: [Role; 3] = [Role::Student, Role::Recruiter, Role::Admin];

    /// The lowercase wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Recruiter => "recruiter",
            Role::Admin => "admin",
        }
    }

    /// The canonical landing route for this role, used after sign-in and
    /// after demo-mode activation (`/dashboard/{role}`).
    pub fn dashboard_path(&self) -> String {
        format!("/dashboard/{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "recruiter" => Ok(Role::Recruiter),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actor
///
/// The resolved current user, independent of which provider authenticated
/// them. Display fields are optional because the three providers return
/// different subsets; `id` is kept as an opaque string for the same reason
/// (UUIDs from the hosted provider, numeric ids from the REST backend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    // Social links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Actor {
    /// demo
    ///
    /// The synthetic actor materialized when a demo session is active.
    /// Fixed placeholder display fields keep header rendering working in
    /// every component without provider contact. The nil UUID marks the
    /// actor as not belonging to any real account.
    pub fn demo(role: Role) -> Self {
        Actor {
            id: Uuid::nil().to_string(),
            role,
            first_name: Some("Demo".to_string()),
            last_name: Some("User".to_string()),
            email: Some("demo@skillport.edu".to_string()),
            ..Actor::default()
        }
    }

    /// Human-readable name for headers and greetings, falling back to the
    /// email address when no name fields were provided.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone().unwrap_or_default(),
        }
    }
}

/// AuthSession
///
/// The persisted representation of an authenticated actor: the bearer
/// token plus enough actor fields to render a header without a round trip.
/// Written to the persistent storage scope on successful sign-in and read
/// back during cold-start resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthSession {
    pub token: String,
    pub actor: Actor,
}

// --- Auth Payloads ---

/// Credentials
///
/// Input payload for the sign-in endpoint (POST /auth/login). The email is
/// normalized (lowercased, trimmed) before transmission to match the
/// backend's lookup behavior.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Normalized email as sent on the wire.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// SignUpRequest
///
/// Input payload for the registration endpoint (POST /auth/signup).
/// The password is passed through to the active provider and never
/// persisted or logged by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// AuthResponse
///
/// The normalized shape every provider's credential exchange is mapped
/// onto: the issued bearer token plus the authenticated actor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub user: Actor,
}

// --- Resource Schemas ---

/// Skill
///
/// A student skill entry (`/skills`). `level` is free-form on the wire
/// ("Beginner", "Intermediate", "Advanced", "Expert").
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Skill {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Project
///
/// A portfolio project entry (`/projects`). Tags are stored as a
/// comma-separated string, mirroring the backend column.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Project {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Certification
///
/// A certification entry (`/certifications`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Certification {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub issue_date: Option<chrono::NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Job
///
/// A recruiter job posting (`/jobs`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Job {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// "Full-time", "Internship", etc. Named `job_type` because `type` is a
    /// reserved keyword in Rust.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recruiter_id: Option<i64>,
}

/// ApplicationStatus
///
/// Lifecycle of a job application. Serialized capitalized to match the
/// values the backend stores ("Pending", "Interviewing", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Interviewing,
    Accepted,
    Rejected,
}

/// Application
///
/// A student's application to a job posting (`/applications`), denormalized
/// with the job title and company name for list rendering.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Application {
    #[serde(default)]
    pub id: i64,
    pub student_id: i64,
    pub job_id: i64,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}
