//! Template Compositor: turns `ProfileData` into a `MarkupTree`.
//!
//! Pure and total: no I/O, no failure path. Required fields are validated by the
//! caller before this stage; anything still empty here degrades to an explicit
//! placeholder so the document never has holes.

use crate::compose::markup::{Block, Field, Header, MarkupTree, Section, SafeText};
use crate::models::ProfileData;

const NAME_PLACEHOLDER: &str = "Name not provided";
const EMAIL_PLACEHOLDER: &str = "Email not provided";
const PHONE_PLACEHOLDER: &str = "Phone not provided";
const LOCATION_PLACEHOLDER: &str = "Location not specified";
const ROLE_PLACEHOLDER: &str = "Professional";
const SKILLS_PLACEHOLDER: &str = "No skills listed";
const SALARY_PLACEHOLDER: &str = "Negotiable";

/// How many skills the experience entry highlights.
const HIGHLIGHTED_SKILLS: usize = 3;

fn text_or(value: Option<&str>, placeholder: &'static str) -> SafeText {
    value
        .map(SafeText::escape)
        .unwrap_or_else(|| SafeText::literal(placeholder))
}

fn full_name(profile: &ProfileData) -> Option<String> {
    let parts: Vec<&str> = [profile.first_name(), profile.last_name()]
        .into_iter()
        .flatten()
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Renders profile data into the resume document structure.
pub fn compose(profile: &ProfileData) -> MarkupTree {
    let name = full_name(profile)
        .map(|n| SafeText::escape(&n))
        .unwrap_or_else(|| SafeText::literal(NAME_PLACEHOLDER));
    let role = text_or(profile.current_position(), ROLE_PLACEHOLDER);
    let skills: Vec<SafeText> = profile
        .skill_list()
        .into_iter()
        .map(SafeText::escape)
        .collect();

    let header = Header {
        name: name.clone(),
        contact: vec![
            text_or(profile.email(), EMAIL_PLACEHOLDER),
            text_or(profile.phone(), PHONE_PLACEHOLDER),
            text_or(profile.location(), LOCATION_PLACEHOLDER),
        ],
    };

    let experience_label = profile.experience_level.label().to_lowercase();
    let summary = SafeText::concat(&[
        &role,
        &SafeText::literal(" with "),
        &SafeText::escape(&experience_label),
        &SafeText::literal(
            " of experience. Passionate about delivering high-quality solutions \
             and driving innovation in technology.",
        ),
    ]);

    let skills_block = if skills.is_empty() {
        Block::Paragraph(SafeText::literal(SKILLS_PLACEHOLDER))
    } else {
        Block::Tags(skills.clone())
    };

    let highlighted = if skills.is_empty() {
        SafeText::literal(SKILLS_PLACEHOLDER)
    } else {
        let top = skills.len().min(HIGHLIGHTED_SKILLS);
        SafeText::join(&skills[..top], ", ")
    };
    let experience_body = SafeText::concat(&[
        &SafeText::literal("Experienced professional with expertise in "),
        &highlighted,
        &SafeText::literal("."),
    ]);

    let preferences = vec![
        Field {
            label: SafeText::literal("Desired Salary"),
            value: text_or(profile.desired_salary(), SALARY_PLACEHOLDER),
        },
        Field {
            label: SafeText::literal("Work Type"),
            value: SafeText::literal(profile.work_type.label()),
        },
        Field {
            label: SafeText::literal("Job Type"),
            value: SafeText::literal(profile.job_type.label()),
        },
        Field {
            label: SafeText::literal("Experience Level"),
            value: SafeText::literal(profile.experience_level.label()),
        },
    ];

    MarkupTree {
        title: SafeText::concat(&[&SafeText::literal("Resume - "), &name]),
        header,
        sections: vec![
            Section {
                title: SafeText::literal("Professional Summary"),
                blocks: vec![Block::Paragraph(summary)],
            },
            Section {
                title: SafeText::literal("Skills"),
                blocks: vec![skills_block],
            },
            Section {
                title: SafeText::literal("Experience"),
                blocks: vec![Block::Entry {
                    heading: role,
                    subheading: SafeText::literal("Current Position"),
                    body: experience_body,
                }],
            },
            Section {
                title: SafeText::literal("Job Preferences"),
                blocks: vec![Block::Fields(preferences)],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{ExperienceLevel, WorkType};

    fn ada() -> ProfileData {
        ProfileData {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: Some("555-0100".to_string()),
            current_position: Some("Analyst".to_string()),
            skills: Some("C++, Math, Logic".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_skills_block_has_one_tag_per_token() {
        let tree = compose(&ada());
        assert_eq!(tree.skill_tags(), vec!["C++", "Math", "Logic"]);
    }

    #[test]
    fn test_multi_word_skills_keep_their_spaces() {
        let mut profile = ada();
        profile.skills = Some("Machine Learning, CI/CD".to_string());
        let tree = compose(&profile);
        assert_eq!(tree.skill_tags(), vec!["Machine Learning", "CI/CD"]);
        assert!(tree.to_html().contains("Machine Learning"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        assert_eq!(compose(&ada()), compose(&ada()));
        assert_eq!(compose(&ada()).to_html(), compose(&ada()).to_html());
    }

    #[test]
    fn test_each_skill_token_is_escaped_independently() {
        let mut profile = ada();
        profile.skills = Some("Rust, <img src=x onerror=alert(1)>, SQL".to_string());
        let tree = compose(&profile);
        let tags = tree.skill_tags();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], "Rust");
        assert!(!tags[1].contains('<'));
        assert_eq!(tags[2], "SQL");

        let html = tree.to_html();
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_every_field_is_escaped() {
        let mut profile = ada();
        profile.first_name = Some("<b>Ada</b>".to_string());
        profile.location = Some("\"London\"".to_string());
        profile.desired_salary = Some("<i>lots</i>".to_string());
        let html = compose(&profile).to_html();
        assert!(!html.contains("<b>"));
        assert!(!html.contains("<i>"));
        assert!(!html.contains("\"London\""));
    }

    #[test]
    fn test_missing_optional_fields_become_placeholders() {
        let tree = compose(&ada());
        assert_eq!(tree.header.contact[2], LOCATION_PLACEHOLDER);

        let prefs = tree.section("Job Preferences").unwrap();
        match &prefs.blocks[0] {
            Block::Fields(fields) => assert_eq!(fields[0].value, SALARY_PLACEHOLDER),
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn test_empty_profile_still_yields_complete_document() {
        let tree = compose(&ProfileData::default());
        assert_eq!(tree.header.name, NAME_PLACEHOLDER);
        assert_eq!(tree.header.contact[0], EMAIL_PLACEHOLDER);
        assert_eq!(tree.header.contact[1], PHONE_PLACEHOLDER);
        assert_eq!(tree.sections.len(), 4);

        let skills = tree.section("Skills").unwrap();
        assert_eq!(
            skills.blocks,
            vec![Block::Paragraph(SafeText::literal(SKILLS_PLACEHOLDER))]
        );
    }

    #[test]
    fn test_summary_and_experience_follow_profile() {
        let mut profile = ada();
        profile.experience_level = ExperienceLevel::Lead;
        profile.work_type = WorkType::Hybrid;
        profile.skills = Some("A, B, C, D".to_string());
        let html = compose(&profile).to_html();
        assert!(html.contains("Analyst with lead/principal (10+ years) of experience."));
        assert!(html.contains("expertise in A, B, C."));
        assert!(html.contains("<strong>Work Type:</strong> Hybrid"));
    }
}
