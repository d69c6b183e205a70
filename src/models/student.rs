use serde::{Deserialize, Deserializer, Serialize};

/// Name used for students the upstream system could not return.
pub const NOT_FOUND_NAME: &str = "not found";

/// A student as returned by the upstream search and fetch endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentSummary {
    #[serde(rename(deserialize = "codigo"))]
    pub code: i64,
    #[serde(
        rename(deserialize = "nome"),
        default,
        deserialize_with = "name_or_empty"
    )]
    pub name: String,
}

impl StudentSummary {
    /// The degraded placeholder for a student that could not be fetched.
    pub fn not_found(code: i64) -> Self {
        Self {
            code,
            name: NOT_FOUND_NAME.to_string(),
        }
    }
}

/// A guardian authorized to pick up a student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizedGuardian {
    #[serde(
        rename(deserialize = "codigo"),
        default,
        deserialize_with = "code_as_string"
    )]
    pub code: Option<String>,
    #[serde(
        rename(deserialize = "nome"),
        default,
        deserialize_with = "name_or_empty"
    )]
    pub name: String,
    /// Filled in by photo enrichment; never read from the listing payload.
    #[serde(skip_deserializing)]
    pub photo_uri: Option<String>,
}

/// Body of the pickup-authorization endpoint.
#[derive(Debug, Deserialize)]
pub struct PickupAuthorization {
    #[serde(rename = "responsaveisAutorizados", default)]
    pub guardians: Vec<AuthorizedGuardian>,
}

/// Body of the guardian photo endpoint.
#[derive(Debug, Deserialize)]
pub struct GuardianPhoto {
    #[serde(rename = "foto", default)]
    pub photo: Option<String>,
}

/// Upstream records sometimes carry `"nome": null`.
fn name_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Upstream guardian codes arrive either as numbers or as strings.
fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCode {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<RawCode>::deserialize(deserializer)? {
        Some(RawCode::Number(n)) => Some(n.to_string()),
        Some(RawCode::Text(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}
