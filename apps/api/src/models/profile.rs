use serde::{Deserialize, Serialize};

/// Experience tier as offered by the profile form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "Entry Level (0-2 years)")]
    Entry,
    #[default]
    #[serde(rename = "Mid Level (3-5 years)")]
    Mid,
    #[serde(rename = "Senior Level (6-10 years)")]
    Senior,
    #[serde(rename = "Lead/Principal (10+ years)")]
    Lead,
}

impl ExperienceLevel {
    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry Level (0-2 years)",
            ExperienceLevel::Mid => "Mid Level (3-5 years)",
            ExperienceLevel::Senior => "Senior Level (6-10 years)",
            ExperienceLevel::Lead => "Lead/Principal (10+ years)",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkType {
    #[default]
    Remote,
    Hybrid,
    #[serde(rename = "On-site")]
    OnSite,
    Any,
}

impl WorkType {
    pub fn label(self) -> &'static str {
        match self {
            WorkType::Remote => "Remote",
            WorkType::Hybrid => "Hybrid",
            WorkType::OnSite => "On-site",
            WorkType::Any => "Any",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Any,
}

impl JobType {
    pub fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Any => "Any",
        }
    }
}

/// Profile data supplied with a generate request.
///
/// Every text field is optional on the wire. Required fields are enforced by
/// [`ProfileData::validate`] before any rendering resources are touched;
/// optional fields that stay empty are rendered as placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileData {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub current_position: Option<String>,
    /// Comma-delimited skill list, e.g. `"Rust, SQL, Kubernetes"`.
    pub skills: Option<String>,
    pub experience_level: ExperienceLevel,
    pub desired_salary: Option<String>,
    pub work_type: WorkType,
    pub job_type: JobType,
}

/// Trimmed, non-blank value of an optional text field.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ProfileData {
    pub fn first_name(&self) -> Option<&str> {
        present(&self.first_name)
    }

    pub fn last_name(&self) -> Option<&str> {
        present(&self.last_name)
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    pub fn phone(&self) -> Option<&str> {
        present(&self.phone)
    }

    pub fn location(&self) -> Option<&str> {
        present(&self.location)
    }

    pub fn current_position(&self) -> Option<&str> {
        present(&self.current_position)
    }

    pub fn desired_salary(&self) -> Option<&str> {
        present(&self.desired_salary)
    }

    /// Returns the names of all required fields that are missing or blank.
    /// `skills` is missing unless it yields at least one skill.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        [
            ("first_name", self.first_name().is_some()),
            ("last_name", self.last_name().is_some()),
            ("email", self.email().is_some()),
            ("phone", self.phone().is_some()),
            ("current_position", self.current_position().is_some()),
            ("skills", !self.skill_list().is_empty()),
        ]
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name)
        .collect()
    }

    /// Checks required fields. The error lists every missing field so the
    /// caller can surface them all at once.
    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let missing = self.missing_required_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Splits the skills string on commas, trimming each token and dropping
    /// empty ones.
    pub fn skill_list(&self) -> Vec<&str> {
        self.skills
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> ProfileData {
        ProfileData {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: Some("+44 20 0000 0000".to_string()),
            current_position: Some("Analyst".to_string()),
            skills: Some("C++, Math, Logic".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_profile_validates() {
        assert!(complete_profile().validate().is_ok());
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let mut profile = complete_profile();
        profile.email = Some("   ".to_string());
        profile.skills = None;
        assert_eq!(profile.validate().unwrap_err(), vec!["email", "skills"]);
    }

    #[test]
    fn test_skills_without_any_token_count_as_missing() {
        for skills in [",", " , ", ",,  ,"] {
            let mut profile = complete_profile();
            profile.skills = Some(skills.to_string());
            assert!(profile.skill_list().is_empty());
            assert_eq!(profile.validate().unwrap_err(), vec!["skills"], "{skills:?}");
        }
    }

    #[test]
    fn test_accessors_trim_and_drop_blank_values() {
        let mut profile = complete_profile();
        profile.first_name = Some("  Ada ".to_string());
        profile.location = Some("   ".to_string());
        assert_eq!(profile.first_name(), Some("Ada"));
        assert_eq!(profile.location(), None);
        assert_eq!(profile.desired_salary(), None);
    }

    #[test]
    fn test_optional_fields_are_not_required() {
        let mut profile = complete_profile();
        profile.location = None;
        profile.desired_salary = None;
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_skill_list_trims_and_drops_empty_tokens() {
        let mut profile = complete_profile();
        profile.skills = Some(" Rust ,, SQL,  ".to_string());
        assert_eq!(profile.skill_list(), vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_deserializes_form_labels() {
        let json = serde_json::json!({
            "first_name": "Ada",
            "experience_level": "Senior Level (6-10 years)",
            "work_type": "On-site",
            "job_type": "Part-time"
        });
        let profile: ProfileData = serde_json::from_value(json).unwrap();
        assert_eq!(profile.experience_level, ExperienceLevel::Senior);
        assert_eq!(profile.work_type, WorkType::OnSite);
        assert_eq!(profile.job_type, JobType::PartTime);
        assert_eq!(profile.last_name, None);
    }

    #[test]
    fn test_defaults_match_form_defaults() {
        let profile: ProfileData = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(profile.experience_level, ExperienceLevel::Mid);
        assert_eq!(profile.work_type, WorkType::Remote);
        assert_eq!(profile.job_type, JobType::FullTime);
    }

    #[test]
    fn test_unknown_experience_level_is_rejected() {
        let json = serde_json::json!({ "experience_level": "Wizard" });
        assert!(serde_json::from_value::<ProfileData>(json).is_err());
    }
}
