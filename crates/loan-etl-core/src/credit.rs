use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CreditCategory {
    Excellent,
    Good,
    Fair,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl CreditCategory {
    pub const ALL: [CreditCategory; 5] = [
        CreditCategory::Excellent,
        CreditCategory::Good,
        CreditCategory::Fair,
        CreditCategory::Poor,
        CreditCategory::VeryPoor,
    ];

    /// First matching threshold wins. Missing or NaN scores land in `VeryPoor`.
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s >= 750.0 => CreditCategory::Excellent,
            Some(s) if (700.0..750.0).contains(&s) => CreditCategory::Good,
            Some(s) if (650.0..700.0).contains(&s) => CreditCategory::Fair,
            Some(s) if (600.0..650.0).contains(&s) => CreditCategory::Poor,
            _ => CreditCategory::VeryPoor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CreditCategory::Excellent => "Excellent",
            CreditCategory::Good => "Good",
            CreditCategory::Fair => "Fair",
            CreditCategory::Poor => "Poor",
            CreditCategory::VeryPoor => "Very Poor",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.label() == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_match_at_boundaries() {
        let cases = [
            (800.0, CreditCategory::Excellent),
            (750.0, CreditCategory::Excellent),
            (749.0, CreditCategory::Good),
            (749.99, CreditCategory::Good),
            (700.0, CreditCategory::Good),
            (699.0, CreditCategory::Fair),
            (650.0, CreditCategory::Fair),
            (649.5, CreditCategory::Poor),
            (600.0, CreditCategory::Poor),
            (599.0, CreditCategory::VeryPoor),
            (0.0, CreditCategory::VeryPoor),
        ];

        for (score, expected) in cases {
            assert_eq!(CreditCategory::from_score(Some(score)), expected, "score {score}");
        }
    }

    #[test]
    fn missing_and_nan_scores_are_very_poor() {
        assert_eq!(CreditCategory::from_score(None), CreditCategory::VeryPoor);
        assert_eq!(
            CreditCategory::from_score(Some(f64::NAN)),
            CreditCategory::VeryPoor
        );
    }

    #[test]
    fn labels_round_trip() {
        for category in CreditCategory::ALL {
            assert_eq!(CreditCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(CreditCategory::from_label("very poor"), None);
    }
}
