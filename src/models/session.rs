use serde::{Deserialize, Serialize};

/// Claims embedded in the JWT access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // student id or manager id
    pub role: SessionRole,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Management,
    Student,
}

/// A student session; carries the voter identity.
#[derive(Debug, Clone)]
pub struct StudentSession {
    pub student_id: String,
}

/// A management session; moderation and menu authoring take this by type.
#[derive(Debug, Clone)]
pub struct ManagementSession {
    pub manager_id: String,
}

/// Role is decided once, when the token is decoded; everything downstream
/// matches on the variant instead of re-checking strings.
#[derive(Debug, Clone)]
pub enum Session {
    Management(ManagementSession),
    Student(StudentSession),
}

impl Session {
    pub fn from_claims(claims: Claims) -> Self {
        match claims.role {
            SessionRole::Management => Session::Management(ManagementSession {
                manager_id: claims.sub,
            }),
            SessionRole::Student => Session::Student(StudentSession {
                student_id: claims.sub,
            }),
        }
    }

    pub fn subject_id(&self) -> &str {
        match self {
            Session::Management(m) => &m.manager_id,
            Session::Student(s) => &s.student_id,
        }
    }

    pub fn is_management(&self) -> bool {
        matches!(self, Session::Management(_))
    }
}
