use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitorPreference {
    Seasonal,
    Tech,
    Organic,
}

impl VisitorPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorPreference::Seasonal => "seasonal",
            VisitorPreference::Tech => "tech",
            VisitorPreference::Organic => "organic",
        }
    }
}

impl FromStr for VisitorPreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "seasonal" => Ok(VisitorPreference::Seasonal),
            "tech" => Ok(VisitorPreference::Tech),
            "organic" => Ok(VisitorPreference::Organic),
            _ => Err(anyhow::anyhow!("Invalid visitor preference: {}", s)),
        }
    }
}

impl Display for VisitorPreference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Preference captured from the storefront landing form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub preference: VisitorPreference,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub visited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVisitorRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "Mobile number must be between 7 and 20 characters"))]
    pub mobile: String,
    pub preference: VisitorPreference,
}

impl Visitor {
    pub fn new(
        request: CreateVisitorRequest,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            mobile: request.mobile.trim().to_string(),
            preference: request.preference,
            ip_address,
            user_agent,
            visited_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visitor_email_lowercased() {
        let visitor = Visitor::new(
            CreateVisitorRequest {
                name: "Ravi".to_string(),
                email: " Ravi@Example.com".to_string(),
                mobile: "9876543210".to_string(),
                preference: VisitorPreference::Organic,
            },
            Some("10.0.0.1".to_string()),
            None,
        );
        assert_eq!(visitor.email, "ravi@example.com");
        assert_eq!(visitor.preference.as_str(), "organic");
    }

    #[test]
    fn preference_rejects_unknown() {
        assert!("general".parse::<VisitorPreference>().is_err());
    }
}
