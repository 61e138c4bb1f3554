//! Keyword-based medicine categorization.
//!
//! Scores each category by counting its keywords that appear as
//! case-insensitive substrings of the medicine name plus description.
//! Highest score wins; ties go to the earliest category in the table, and
//! no match at all falls through to "General".

/// Category keyword table, in tie-break priority order.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Antibiotics",
        &["antibiotic", "amoxicillin", "penicillin", "cephalexin", "azithromycin", "ciprofloxacin"],
    ),
    (
        "Pain Relief",
        &["paracetamol", "acetaminophen", "ibuprofen", "aspirin", "diclofenac", "naproxen"],
    ),
    (
        "Cardiovascular",
        &["atenolol", "amlodipine", "lisinopril", "metoprolol", "ramipril", "blood pressure"],
    ),
    ("Diabetes", &["metformin", "insulin", "glipizide", "diabetes", "blood sugar"]),
    ("Respiratory", &["salbutamol", "inhaler", "asthma", "cough", "expectorant"]),
    ("Gastrointestinal", &["omeprazole", "ranitidine", "antacid", "laxative", "stomach"]),
    (
        "Vitamins & Supplements",
        &["vitamin", "calcium", "iron", "multivitamin", "supplement"],
    ),
    ("Dermatology", &["ointment", "cream", "skin", "dermatitis", "eczema"]),
    ("Eye Care", &["eye drops", "ophthalmic", "conjunctivitis"]),
    ("Ear Care", &["ear drops", "otic"]),
    ("Antiseptics", &["antiseptic", "disinfectant", "betadine", "dettol"]),
    ("First Aid", &["bandage", "gauze", "plaster", "first aid"]),
];

/// Fallback category when nothing matches.
pub const DEFAULT_CATEGORY: &str = "General";

/// Categorize a medicine from its name and optional description.
pub fn categorize(name: &str, description: Option<&str>) -> &'static str {
    if name.is_empty() {
        return DEFAULT_CATEGORY;
    }

    let mut text = name.to_lowercase();
    if let Some(desc) = description {
        text.push(' ');
        text.push_str(&desc.to_lowercase());
    }

    let mut best: Option<(&'static str, usize)> = None;
    for &(category, keywords) in CATEGORY_KEYWORDS {
        let score = keywords.iter().filter(|kw| text.contains(*kw)).count();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((category, score));
        }
    }

    best.map_or(DEFAULT_CATEGORY, |(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_keyword() {
        assert_eq!(categorize("Amoxicillin 500mg", None), "Antibiotics");
        assert_eq!(categorize("Paracetamol Tablets", None), "Pain Relief");
        assert_eq!(categorize("Insulin Glargine", None), "Diabetes");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(categorize("IBUPROFEN 400", None), "Pain Relief");
        assert_eq!(categorize("Blood Pressure Monitor Refill", None), "Cardiovascular");
    }

    #[test]
    fn test_description_contributes() {
        assert_eq!(
            categorize("Brufen", Some("ibuprofen-based pain reliever")),
            "Pain Relief"
        );
    }

    #[test]
    fn test_highest_score_wins() {
        // Two diabetes keywords against one pain-relief keyword
        assert_eq!(
            categorize("Metformin", Some("for diabetes, mild aspirin interaction")),
            "Diabetes"
        );
    }

    #[test]
    fn test_tie_goes_to_earlier_category() {
        // "aspirin" (Pain Relief) and "stomach" (Gastrointestinal) score 1 each
        assert_eq!(categorize("Aspirin", Some("gentle on the stomach")), "Pain Relief");
    }

    #[test]
    fn test_no_match_is_general() {
        assert_eq!(categorize("Mystery Elixir", None), "General");
        assert_eq!(categorize("", Some("ibuprofen")), "General");
    }
}
