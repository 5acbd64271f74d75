use serde::Serialize;

/// 風險分數的粗分類（標題顯示用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskCategory {
    pub label: &'static str,
    pub color: &'static str,
    pub min: u8,
    pub max: u8,
}

pub const RISK_CATEGORIES: [RiskCategory; 5] = [
    RiskCategory { label: "Very Conservative", color: "#10b981", min: 1, max: 20 },
    RiskCategory { label: "Conservative", color: "#34d399", min: 21, max: 40 },
    RiskCategory { label: "Moderate", color: "#fbbf24", min: 41, max: 60 },
    RiskCategory { label: "Aggressive", color: "#f97316", min: 61, max: 80 },
    RiskCategory { label: "Very Aggressive", color: "#ef4444", min: 81, max: 100 },
];

const UNKNOWN_LABEL: &str = "Unknown";
const UNKNOWN_COLOR: &str = "#94a3b8";

fn find_category(score: u8) -> Option<&'static RiskCategory> {
    RISK_CATEGORIES
        .iter()
        .find(|c| score >= c.min && score <= c.max)
}

pub fn risk_category_label(score: u8) -> &'static str {
    find_category(score).map(|c| c.label).unwrap_or(UNKNOWN_LABEL)
}

pub fn risk_category_color(score: u8) -> &'static str {
    find_category(score).map(|c| c.color).unwrap_or(UNKNOWN_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_boundaries() {
        assert_eq!(risk_category_label(1), "Very Conservative");
        assert_eq!(risk_category_label(20), "Very Conservative");
        assert_eq!(risk_category_label(21), "Conservative");
        assert_eq!(risk_category_label(60), "Moderate");
        assert_eq!(risk_category_label(100), "Very Aggressive");
        assert_eq!(risk_category_label(0), "Unknown");
        assert_eq!(risk_category_color(0), "#94a3b8");
        assert_eq!(risk_category_color(75), "#f97316");
    }
}
