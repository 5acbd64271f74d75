//! 外部風險問卷供應商
//!
//! 各家風險容忍度分數的量尺不同，這裡統一換算成內部 1-99 量尺，
//! 並提供內部分數對應的七級風險輪廓。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 風險問卷供應商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProvider {
    Nitrogen,
    Stratifi,
    Orion,
    MorningstarMprs,
    Tolerisk,
    Finametrica,
    /// 使用者沒有外部分數
    #[serde(rename = "none")]
    NoProvider,
}

/// 供應商量尺定義
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProviderScale {
    pub provider: RiskProvider,
    pub id: &'static str,
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// 所有供應商量尺（含 `none`）
pub static RISK_PROVIDERS: [ProviderScale; 7] = [
    ProviderScale {
        provider: RiskProvider::Nitrogen,
        id: "nitrogen",
        name: "Nitrogen (Riskalyze)",
        min: 1.0,
        max: 99.0,
        unit: "Risk Number",
        step: None,
    },
    ProviderScale {
        provider: RiskProvider::Stratifi,
        id: "stratifi",
        name: "StratiFi",
        min: 1.0,
        max: 10.0,
        unit: "PRISM Rating",
        step: Some(0.1),
    },
    ProviderScale {
        provider: RiskProvider::Orion,
        id: "orion",
        name: "Orion Risk Intelligence",
        min: 0.0,
        max: 100.0,
        unit: "Risk Score",
        step: None,
    },
    ProviderScale {
        provider: RiskProvider::MorningstarMprs,
        id: "morningstar_mprs",
        name: "Morningstar Portfolio Risk",
        min: 100.0,
        max: 600.0,
        unit: "MPRS Score",
        step: None,
    },
    ProviderScale {
        provider: RiskProvider::Tolerisk,
        id: "tolerisk",
        name: "Tolerisk",
        min: 0.0,
        max: 100.0,
        unit: "Equity %",
        step: None,
    },
    ProviderScale {
        provider: RiskProvider::Finametrica,
        id: "finametrica",
        name: "FinaMetrica",
        min: 0.0,
        max: 100.0,
        unit: "Risk Score",
        step: None,
    },
    ProviderScale {
        provider: RiskProvider::NoProvider,
        id: "none",
        name: "I don't have one",
        min: 0.0,
        max: 0.0,
        unit: "",
        step: None,
    },
];

impl RiskProvider {
    /// 由識別字解析（不分大小寫）
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        RISK_PROVIDERS
            .iter()
            .find(|scale| scale.id.eq_ignore_ascii_case(id))
            .map(|scale| scale.provider)
    }

    pub fn scale(&self) -> &'static ProviderScale {
        // 表格涵蓋所有變體
        match RISK_PROVIDERS.iter().find(|s| s.provider == *self) {
            Some(scale) => scale,
            None => &RISK_PROVIDERS[RISK_PROVIDERS.len() - 1],
        }
    }

    pub fn id(&self) -> &'static str {
        self.scale().id
    }

    /// 換算為內部量尺（四捨五入遠離零）
    pub fn normalize(&self, score: f64) -> i32 {
        let internal = match self {
            RiskProvider::Nitrogen | RiskProvider::NoProvider => score.round(),
            RiskProvider::Stratifi => ((score - 1.0) * (98.0 / 9.0) + 1.0).round(),
            RiskProvider::Orion => (score * 0.99).round().clamp(1.0, 99.0),
            RiskProvider::MorningstarMprs => ((score - 100.0) / 500.0 * 98.0 + 1.0).round(),
            RiskProvider::Tolerisk | RiskProvider::Finametrica => (score * 0.99).round().max(1.0),
        };
        internal as i32
    }
}

impl fmt::Display for RiskProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scale().name)
    }
}

impl FromStr for RiskProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("未知的風險供應商: {}", s))
    }
}

/// 將供應商分數換算為內部量尺；未知供應商直接四捨五入
pub fn normalize_to_internal(score: f64, provider: &str) -> i32 {
    RiskProvider::from_id(provider)
        .unwrap_or(RiskProvider::NoProvider)
        .normalize(score)
}

/// 內部分數對應的風險輪廓
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub label: &'static str,
    /// 六個月可能下跌幅度
    #[serde(rename = "downside6m")]
    pub downside_6m: &'static str,
    pub color: &'static str,
}

const RISK_PROFILES: [(i32, RiskProfile); 7] = [
    (15, RiskProfile { label: "Very Conservative", downside_6m: "~2-4%", color: "#10b981" }),
    (30, RiskProfile { label: "Conservative", downside_6m: "~5-8%", color: "#34d399" }),
    (45, RiskProfile { label: "Moderately Conservative", downside_6m: "~9-13%", color: "#a3e635" }),
    (60, RiskProfile { label: "Moderate", downside_6m: "~14-19%", color: "#fbbf24" }),
    (75, RiskProfile { label: "Moderately Aggressive", downside_6m: "~20-25%", color: "#f97316" }),
    (90, RiskProfile { label: "Aggressive", downside_6m: "~26-35%", color: "#ef4444" }),
    (i32::MAX, RiskProfile { label: "Very Aggressive", downside_6m: "~36%+", color: "#dc2626" }),
];

/// 內部分數所屬的風險輪廓
pub fn risk_profile(internal_score: i32) -> RiskProfile {
    RISK_PROFILES
        .iter()
        .find(|(upper, _)| internal_score <= *upper)
        .map(|(_, profile)| *profile)
        .unwrap_or(RISK_PROFILES[RISK_PROFILES.len() - 1].1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("nitrogen", 1.0, 1)]
    #[case("nitrogen", 99.0, 99)]
    #[case("stratifi", 1.0, 1)]
    #[case("stratifi", 10.0, 99)]
    #[case("stratifi", 5.5, 50)]
    #[case("orion", 0.0, 1)]
    #[case("orion", 100.0, 99)]
    #[case("morningstar_mprs", 100.0, 1)]
    #[case("morningstar_mprs", 600.0, 99)]
    #[case("tolerisk", 0.0, 1)]
    #[case("tolerisk", 100.0, 99)]
    #[case("finametrica", 50.0, 50)]
    #[case("none", 42.4, 42)]
    #[case("unknown_vendor", 42.5, 43)]
    fn test_normalize_to_internal(#[case] provider: &str, #[case] score: f64, #[case] expected: i32) {
        assert_eq!(normalize_to_internal(score, provider), expected);
    }

    #[test]
    fn test_provider_ids_round_trip() {
        for scale in RISK_PROVIDERS.iter() {
            assert_eq!(RiskProvider::from_id(scale.id), Some(scale.provider));
            assert_eq!(scale.provider.id(), scale.id);
            let json = serde_json::to_value(scale.provider).unwrap();
            assert_eq!(json, scale.id);
        }
        assert_eq!(RiskProvider::from_id("STRATIFI"), Some(RiskProvider::Stratifi));
        assert!("bogus".parse::<RiskProvider>().is_err());
    }

    #[rstest]
    #[case(1, "Very Conservative")]
    #[case(15, "Very Conservative")]
    #[case(16, "Conservative")]
    #[case(45, "Moderately Conservative")]
    #[case(60, "Moderate")]
    #[case(75, "Moderately Aggressive")]
    #[case(90, "Aggressive")]
    #[case(91, "Very Aggressive")]
    #[case(100, "Very Aggressive")]
    fn test_risk_profile_bands(#[case] score: i32, #[case] label: &str) {
        assert_eq!(risk_profile(score).label, label);
    }

    #[test]
    fn test_risk_profile_serialization() {
        let json = serde_json::to_value(risk_profile(50)).unwrap();
        assert_eq!(json["downside6m"], "~14-19%");
        assert_eq!(json["color"], "#fbbf24");
    }
}
