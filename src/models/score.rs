//! 打分模型
//!
//! LLM 返回的打分是一段期望为 JSON 的文本，解析在排序阶段进行，永不报错

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

/// 打分维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKey {
    /// 原创性
    Originality,
    /// 技术影响
    Impact,
    /// 可复现性
    Reproducibility,
    /// 短期潜力
    Potential,
    /// 综合分
    Global,
}

impl ScoreKey {
    /// 全部维度，按简报中的展示顺序
    pub const ALL: [ScoreKey; 5] = [
        ScoreKey::Originality,
        ScoreKey::Impact,
        ScoreKey::Reproducibility,
        ScoreKey::Potential,
        ScoreKey::Global,
    ];

    /// 四个评审标准（不含综合分）
    pub const CRITERIA: [ScoreKey; 4] = [
        ScoreKey::Originality,
        ScoreKey::Impact,
        ScoreKey::Reproducibility,
        ScoreKey::Potential,
    ];

    /// JSON 中的标准键名
    pub fn key(self) -> &'static str {
        match self {
            ScoreKey::Originality => "originalite",
            ScoreKey::Impact => "impact",
            ScoreKey::Reproducibility => "repro",
            ScoreKey::Potential => "potentiel",
            ScoreKey::Global => "score_global",
        }
    }

    /// 可接受的英文别名
    pub fn alias(self) -> &'static str {
        match self {
            ScoreKey::Originality => "originality",
            ScoreKey::Impact => "technical_impact",
            ScoreKey::Reproducibility => "reproducibility",
            ScoreKey::Potential => "potential",
            ScoreKey::Global => "global_score",
        }
    }

    /// 简报中的短标签
    pub fn label(self) -> &'static str {
        match self {
            ScoreKey::Originality => "Orig",
            ScoreKey::Impact => "Tech",
            ScoreKey::Reproducibility => "Repro",
            ScoreKey::Potential => "Short",
            ScoreKey::Global => "Global",
        }
    }

    /// 提示词中的标准名称
    pub fn title(self) -> &'static str {
        match self {
            ScoreKey::Originality => "Originality",
            ScoreKey::Impact => "Technical impact",
            ScoreKey::Reproducibility => "Reproducibility",
            ScoreKey::Potential => "Short-term potential",
            ScoreKey::Global => "Global score",
        }
    }

    /// 评审指南文件名，综合分没有指南
    pub fn guideline_file(self) -> Option<&'static str> {
        match self {
            ScoreKey::Originality => Some("originality.md"),
            ScoreKey::Impact => Some("impact.md"),
            ScoreKey::Reproducibility => Some("repro.md"),
            ScoreKey::Potential => Some("potential.md"),
            ScoreKey::Global => None,
        }
    }

    /// 在映射中查找该维度的值（先标准键，后别名），null 视为缺失
    pub fn lookup(self, fields: &Map<String, JsonValue>) -> Option<&JsonValue> {
        non_null(fields, self.key()).or_else(|| non_null(fields, self.alias()))
    }
}

fn non_null<'a>(fields: &'a Map<String, JsonValue>, key: &str) -> Option<&'a JsonValue> {
    fields.get(key).filter(|v| !v.is_null())
}

/// 结构化打分卡：五个可选数值字段
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScoreCard {
    #[serde(rename = "originalite", alias = "originality", default)]
    pub originality: Option<f64>,
    #[serde(rename = "impact", alias = "technical_impact", default)]
    pub impact: Option<f64>,
    #[serde(rename = "repro", alias = "reproducibility", default)]
    pub reproducibility: Option<f64>,
    #[serde(rename = "potentiel", alias = "potential", default)]
    pub potential: Option<f64>,
    #[serde(rename = "score_global", alias = "global_score", default)]
    pub global: Option<f64>,
}

impl ScoreCard {
    fn is_valid(&self) -> bool {
        [
            self.originality,
            self.impact,
            self.reproducibility,
            self.potential,
            self.global,
        ]
        .iter()
        .flatten()
        .all(|v| v.is_finite())
    }
}

/// 打分解析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedScore {
    /// 通过校验的打分卡
    pub card: Option<ScoreCard>,
    /// 原始字段映射（字典形态时保留，否则为空）
    pub fields: Map<String, JsonValue>,
    /// 综合分
    pub value: f64,
}

fn code_fence() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").ok())
        .as_ref()
}

/// 解析 LLM 返回的打分文本
///
/// - 允许被 Markdown 代码块包裹
/// - 解析失败时返回空映射
/// - 类型校验失败时退回到原始映射（若为字典）
/// - 综合分存在且为数值时作为 `value`，否则为 0
pub fn parse_score(payload: &str) -> ParsedScore {
    let body = code_fence()
        .and_then(|re| re.captures(payload))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(payload);

    let fields = match serde_json::from_str::<JsonValue>(body) {
        Ok(JsonValue::Object(map)) => map,
        Ok(other) => {
            debug!("打分结果不是 JSON 对象: {}", other);
            return ParsedScore::default();
        }
        Err(e) => {
            debug!("打分结果无法解析为 JSON: {}", e);
            return ParsedScore::default();
        }
    };

    let card = serde_json::from_value::<ScoreCard>(JsonValue::Object(fields.clone()))
        .ok()
        .filter(ScoreCard::is_valid);

    let value = match &card {
        Some(card) => card.global.unwrap_or(0.0),
        None => ScoreKey::Global
            .lookup(&fields)
            .and_then(JsonValue::as_f64)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
    };

    ParsedScore {
        card,
        fields,
        value,
    }
}
