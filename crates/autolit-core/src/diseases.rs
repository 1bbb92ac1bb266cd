//! Static autoimmune disease descriptors
//!
//! The search vocabulary each adapter queries with. Loaded once as `'static`
//! data; every accessor hands out borrowed slices.

use serde::Serialize;

/// One configured disease: key, formal name, and search vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct Disease {
    pub key: &'static str,
    pub name: &'static str,
    pub search_terms: &'static [&'static str],
    pub synonyms: &'static [&'static str],
    pub mesh_terms: &'static [&'static str],
    pub icd_codes: &'static [&'static str],
}

pub static DISEASES: &[Disease] = &[
    Disease {
        key: "crohns",
        name: "Crohn's Disease",
        search_terms: &[
            "crohn's disease",
            "crohns disease",
            "inflammatory bowel disease",
            "IBD",
            "regional ileitis",
            "terminal ileitis",
        ],
        synonyms: &[
            "regional enteritis",
            "granulomatous colitis",
            "granulomatous enteritis",
        ],
        mesh_terms: &["Crohn Disease", "Inflammatory Bowel Diseases", "Ileitis"],
        icd_codes: &["K50", "K50.0", "K50.1", "K50.8", "K50.9"],
    },
    Disease {
        key: "systemic_lupus",
        name: "Systemic Lupus Erythematosus",
        search_terms: &[
            "systemic lupus erythematosus",
            "SLE",
            "lupus erythematosus",
            "systemic lupus",
            "lupus nephritis",
        ],
        synonyms: &["disseminated lupus erythematosus", "libman-sacks disease"],
        mesh_terms: &[
            "Lupus Erythematosus, Systemic",
            "Lupus Nephritis",
            "Autoimmune Diseases",
        ],
        icd_codes: &["M32", "M32.0", "M32.1", "M32.8", "M32.9"],
    },
    Disease {
        key: "multiple_sclerosis",
        name: "Multiple Sclerosis",
        search_terms: &[
            "multiple sclerosis",
            "MS",
            "disseminated sclerosis",
            "relapsing-remitting multiple sclerosis",
            "RRMS",
            "progressive multiple sclerosis",
        ],
        synonyms: &["sclerosis multiplex", "insular sclerosis"],
        mesh_terms: &[
            "Multiple Sclerosis",
            "Multiple Sclerosis, Relapsing-Remitting",
            "Multiple Sclerosis, Chronic Progressive",
            "Demyelinating Diseases",
        ],
        icd_codes: &["G35"],
    },
    Disease {
        key: "type1_diabetes",
        name: "Type 1 Diabetes",
        search_terms: &[
            "type 1 diabetes",
            "type I diabetes",
            "T1D",
            "juvenile diabetes",
            "insulin-dependent diabetes",
            "IDDM",
            "autoimmune diabetes",
        ],
        synonyms: &["juvenile-onset diabetes", "brittle diabetes"],
        mesh_terms: &[
            "Diabetes Mellitus, Type 1",
            "Diabetes Mellitus, Insulin-Dependent",
            "Autoimmune Diseases",
        ],
        icd_codes: &[
            "E10", "E10.0", "E10.1", "E10.2", "E10.3", "E10.4", "E10.5", "E10.6", "E10.7",
            "E10.8", "E10.9",
        ],
    },
    Disease {
        key: "rheumatoid_arthritis",
        name: "Rheumatoid Arthritis",
        search_terms: &[
            "rheumatoid arthritis",
            "RA",
            "rheumatoid factor",
            "anti-CCP",
            "inflammatory arthritis",
            "polyarthritis",
        ],
        synonyms: &["chronic inflammatory arthritis", "proliferative arthritis"],
        mesh_terms: &[
            "Arthritis, Rheumatoid",
            "Rheumatoid Factor",
            "Autoimmune Diseases",
        ],
        icd_codes: &[
            "M05", "M06", "M05.0", "M05.1", "M05.2", "M05.3", "M05.8", "M05.9", "M06.0",
            "M06.8", "M06.9",
        ],
    },
];

/// Look up one descriptor by key.
pub fn get(key: &str) -> Option<&'static Disease> {
    DISEASES.iter().find(|d| d.key == key)
}

pub fn all_keys() -> Vec<&'static str> {
    DISEASES.iter().map(|d| d.key).collect()
}

pub fn is_valid_key(key: &str) -> bool {
    get(key).is_some()
}

/// Filter a key list down to the configured ones, order preserved.
pub fn validate_keys<S: AsRef<str>>(keys: &[S]) -> Vec<&'static str> {
    keys.iter()
        .filter_map(|k| get(k.as_ref()).map(|d| d.key))
        .collect()
}

impl Disease {
    /// Primary search terms plus synonyms, in configuration order.
    pub fn all_search_terms(&self) -> Vec<&'static str> {
        self.search_terms
            .iter()
            .chain(self.synonyms.iter())
            .copied()
            .collect()
    }

    /// Quote every term and join with the given boolean operator.
    pub fn format_query(&self, operator: &str) -> String {
        self.all_search_terms()
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(&format!(" {operator} "))
    }

    pub fn summary(&self) -> DiseaseSummary {
        DiseaseSummary {
            key: self.key,
            name: self.name,
            search_term_count: self.search_terms.len(),
            synonym_count: self.synonyms.len(),
            mesh_term_count: self.mesh_terms.len(),
            icd_code_count: self.icd_codes.len(),
            total_search_terms: self.search_terms.len() + self.synonyms.len(),
        }
    }
}

/// Term-count summary for one disease, embedded in run summaries.
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseSummary {
    pub key: &'static str,
    pub name: &'static str,
    pub search_term_count: usize,
    pub synonym_count: usize,
    pub mesh_term_count: usize,
    pub icd_code_count: usize,
    pub total_search_terms: usize,
}
