//! Career-track reference table used by the fallback synthesizer to map rated
//! skills onto career families. Never returned to callers as-is.

use crate::analysis::models::Demand;

#[derive(Debug, Clone, Copy)]
pub struct CareerTrack {
    pub title: &'static str,
    /// Skill names (lowercase) that count as evidence for this track.
    pub keywords: &'static [&'static str],
    /// Career-area words (lowercase) that make this track a preferred one.
    pub areas: &'static [&'static str],
    pub demand: Demand,
    pub salary_range: &'static str,
    /// Skills every candidate on this track is expected to have.
    pub core_skills: &'static [&'static str],
}

impl CareerTrack {
    pub fn has_keyword(&self, skill_name: &str) -> bool {
        let skill = skill_name.trim().to_lowercase();
        self.keywords.iter().any(|k| *k == skill)
    }

    /// True when a free-text career area ("Data Science", "cloud") names this track.
    /// Matches whole words only: "ai" is found in "AI research", not in "Retail".
    pub fn in_area(&self, area: &str) -> bool {
        let area_words = words(area);
        if area_words.is_empty() {
            return false;
        }
        self.areas.iter().any(|a| {
            let phrase = words(a);
            !phrase.is_empty() && area_words.windows(phrase.len()).any(|w| w == phrase.as_slice())
        })
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub const CAREER_TRACKS: &[CareerTrack] = &[
    CareerTrack {
        title: "Frontend Developer",
        keywords: &["html", "css", "javascript", "typescript", "react", "vue", "accessibility"],
        areas: &["frontend", "front-end", "web", "software"],
        demand: Demand::High,
        salary_range: "$70,000 - $120,000",
        core_skills: &["JavaScript", "HTML", "CSS"],
    },
    CareerTrack {
        title: "Backend Developer",
        keywords: &["python", "java", "go", "rust", "node.js", "sql", "rest apis"],
        areas: &["backend", "back-end", "software", "web"],
        demand: Demand::High,
        salary_range: "$80,000 - $135,000",
        core_skills: &["REST APIs", "SQL"],
    },
    CareerTrack {
        title: "Full-Stack Developer",
        keywords: &["javascript", "typescript", "react", "node.js", "sql", "rest apis", "html", "css"],
        areas: &["full-stack", "fullstack", "web", "software"],
        demand: Demand::VeryHigh,
        salary_range: "$80,000 - $130,000",
        core_skills: &["JavaScript", "SQL", "REST APIs"],
    },
    CareerTrack {
        title: "Data Analyst",
        keywords: &["sql", "excel", "statistics", "data visualization", "python"],
        areas: &["data", "analytics", "business intelligence"],
        demand: Demand::High,
        salary_range: "$60,000 - $95,000",
        core_skills: &["SQL", "Excel", "Data Visualization"],
    },
    CareerTrack {
        title: "Data Scientist",
        keywords: &["python", "statistics", "machine learning", "sql", "data visualization"],
        areas: &["data", "machine learning", "ai", "science"],
        demand: Demand::VeryHigh,
        salary_range: "$95,000 - $150,000",
        core_skills: &["Python", "Statistics", "Machine Learning"],
    },
    CareerTrack {
        title: "DevOps Engineer",
        keywords: &["aws", "docker", "kubernetes", "linux", "ci/cd", "terraform"],
        areas: &["devops", "cloud", "infrastructure", "operations"],
        demand: Demand::VeryHigh,
        salary_range: "$90,000 - $145,000",
        core_skills: &["Linux", "Docker", "CI/CD"],
    },
    CareerTrack {
        title: "Cloud Engineer",
        keywords: &["aws", "terraform", "kubernetes", "linux", "docker"],
        areas: &["cloud", "infrastructure"],
        demand: Demand::High,
        salary_range: "$90,000 - $140,000",
        core_skills: &["AWS", "Terraform"],
    },
    CareerTrack {
        title: "UX/UI Designer",
        keywords: &["ui design", "ux research", "figma", "prototyping", "accessibility"],
        areas: &["design", "ux", "ui", "product"],
        demand: Demand::Medium,
        salary_range: "$65,000 - $110,000",
        core_skills: &["Figma", "UX Research", "Prototyping"],
    },
    CareerTrack {
        title: "Security Analyst",
        keywords: &["network security", "linux", "threat modeling", "cryptography"],
        areas: &["security", "cyber"],
        demand: Demand::VeryHigh,
        salary_range: "$80,000 - $130,000",
        core_skills: &["Network Security", "Threat Modeling"],
    },
    CareerTrack {
        title: "Technical Project Manager",
        keywords: &["project management", "communication", "leadership", "problem solving"],
        areas: &["management", "project", "product", "leadership"],
        demand: Demand::Medium,
        salary_range: "$85,000 - $130,000",
        core_skills: &["Project Management", "Communication"],
    },
];
