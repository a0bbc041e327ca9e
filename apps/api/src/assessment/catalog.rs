//! Skill catalog offered during the skill-selection stage.
//!
//! A skill may be listed under more than one category; selecting it twice gives
//! two independent ratings (see `RatingKey`).

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SkillCategory {
    pub name: &'static str,
    pub skills: &'static [&'static str],
}

pub const CATALOG: &[SkillCategory] = &[
    SkillCategory {
        name: "Frontend Development",
        skills: &["HTML", "CSS", "JavaScript", "TypeScript", "React", "Vue", "Accessibility"],
    },
    SkillCategory {
        name: "Backend Development",
        skills: &["Python", "Java", "Go", "Rust", "Node.js", "SQL", "REST APIs"],
    },
    SkillCategory {
        name: "Data & Analytics",
        skills: &["Python", "SQL", "Statistics", "Excel", "Data Visualization", "Machine Learning"],
    },
    SkillCategory {
        name: "Cloud & DevOps",
        skills: &["AWS", "Docker", "Kubernetes", "Linux", "CI/CD", "Terraform"],
    },
    SkillCategory {
        name: "Design",
        skills: &["UI Design", "UX Research", "Figma", "Prototyping", "Accessibility"],
    },
    SkillCategory {
        name: "Security",
        skills: &["Network Security", "Linux", "Threat Modeling", "Cryptography"],
    },
    SkillCategory {
        name: "Professional Skills",
        skills: &["Communication", "Project Management", "Leadership", "Problem Solving"],
    },
];
