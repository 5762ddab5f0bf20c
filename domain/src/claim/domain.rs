//! Claim domain inference
//!
//! A keyword classifier that maps claim text to the [`Capability`] most likely
//! to evaluate it well. The result only biases agent ranking, it never filters.

use super::request::Claim;
use crate::agent::Capability;

const KEYWORDS: &[(Capability, &[&str])] = &[
    (
        Capability::Science,
        &[
            "physics", "chemistry", "biology", "planet", "orbit", "climate", "species",
            "evolution", "atom", "molecule", "gravity", "temperature", "experiment",
            "scientist", "study", "research", "carbon", "ocean", "fossil",
        ],
    ),
    (
        Capability::Technology,
        &[
            "software", "computer", "internet", "ai", "algorithm", "smartphone", "chip",
            "processor", "app", "robot", "5g", "blockchain", "crypto", "data", "cyber",
        ],
    ),
    (
        Capability::Health,
        &[
            "vaccine", "virus", "disease", "cancer", "drug", "medicine", "doctor",
            "hospital", "diet", "covid", "pandemic", "symptom", "treatment", "health",
        ],
    ),
    (
        Capability::Politics,
        &[
            "election", "president", "senator", "parliament", "government", "vote",
            "minister", "policy", "law", "congress", "campaign", "party",
        ],
    ),
    (
        Capability::Finance,
        &[
            "stock", "market", "inflation", "gdp", "bank", "economy", "tax", "interest",
            "dollar", "bitcoin", "revenue", "profit", "debt", "budget",
        ],
    ),
    (
        Capability::News,
        &[
            "yesterday", "today", "announced", "reported", "breaking", "according",
            "spokesperson", "press", "headline", "statement", "attack", "protest",
        ],
    ),
];

/// Infer the knowledge domain of a claim.
///
/// Scores each domain by the number of keyword hits on word boundaries; ties go
/// to the domain listed first. Returns [`Capability::General`] when nothing
/// matches.
///
/// # Example
///
/// ```
/// use verity_domain::agent::Capability;
/// use verity_domain::claim::{Claim, infer_domain};
///
/// let claim = Claim::try_new("The new vaccine prevents the virus").unwrap();
/// assert_eq!(infer_domain(&claim), Capability::Health);
/// ```
pub fn infer_domain(claim: &Claim) -> Capability {
    let lowered = claim.text().to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut best = (Capability::General, 0usize);
    for (capability, keywords) in KEYWORDS {
        let hits = words.iter().filter(|w| keywords.contains(*w)).count();
        if hits > best.1 {
            best = (*capability, hits);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(text: &str) -> Capability {
        infer_domain(&Claim::try_new(text).unwrap())
    }

    #[test]
    fn test_infer_science() {
        assert_eq!(infer("The earth's orbit around the sun takes a year"), Capability::Science);
    }

    #[test]
    fn test_infer_finance() {
        assert_eq!(infer("Inflation hit 9% and the stock market fell"), Capability::Finance);
    }

    #[test]
    fn test_infer_politics() {
        assert_eq!(infer("The president won the election by a landslide"), Capability::Politics);
    }

    #[test]
    fn test_infer_general_fallback() {
        assert_eq!(infer("Cats like to sleep"), Capability::General);
    }

    #[test]
    fn test_word_boundaries() {
        // "ai" must not match inside "said" or "paid"
        assert_eq!(infer("She said she paid"), Capability::General);
    }
}
