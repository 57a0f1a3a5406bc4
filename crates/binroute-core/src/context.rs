use crate::ast::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable fact mapping a condition is evaluated against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    facts: HashMap<String, Value>,
}

impl EvaluationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fact(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.facts.insert(name.into(), value.into());
        self
    }

    /// Look up a fact. An absent fact is unset, not an error.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.facts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Build the standard fact context from a part inspection
    pub fn from_inspection(classification: &PartClassification, defects: &DefectInspection) -> Self {
        Self::new()
            .with_fact("color", classification.color.as_str())
            .with_fact("color_hex", classification.color_hex.as_str())
            .with_fact("size_mm", classification.size_mm)
            .with_fact("size_category", classification.size_category.as_str())
            .with_fact("part_type", classification.part_type.as_str())
            .with_fact("shape", classification.shape.as_str())
            .with_fact("confidence", classification.confidence)
            .with_fact("defect_detected", defects.defect_detected)
            .with_fact("surface_quality", defects.surface_quality.as_str())
            .with_fact("defect_count", Value::Number(defects.defects.len() as f64))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for EvaluationContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Part classification produced by the vision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartClassification {
    pub color: String,
    pub color_hex: String,
    pub size_mm: f64,
    pub size_category: SizeCategory,
    pub part_type: String,
    pub shape: Shape,
    pub confidence: f64,
}

impl Default for PartClassification {
    fn default() -> Self {
        Self {
            color: "unknown".to_string(),
            color_hex: "#000000".to_string(),
            size_mm: 0.0,
            size_category: SizeCategory::Medium,
            part_type: "unknown".to_string(),
            shape: Shape::Irregular,
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    Small,
    #[default]
    Medium,
    Large,
}

impl SizeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeCategory::Small => "small",
            SizeCategory::Medium => "medium",
            SizeCategory::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Round,
    Square,
    #[default]
    Irregular,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Round => "round",
            Shape::Square => "square",
            Shape::Irregular => "irregular",
        }
    }
}

/// Defect inspection produced by the vision pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefectInspection {
    pub defect_detected: bool,
    pub defects: Vec<DefectDetail>,
    pub surface_quality: SurfaceQuality,
    pub overall_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceQuality {
    #[default]
    Perfect,
    Acceptable,
    Poor,
    Reject,
}

impl SurfaceQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceQuality::Perfect => "perfect",
            SurfaceQuality::Acceptable => "acceptable",
            SurfaceQuality::Poor => "poor",
            SurfaceQuality::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefectDetail {
    #[serde(rename = "type")]
    pub defect_type: DefectType,
    pub severity: DefectSeverity,
    pub location: String,
    pub confidence: f64,
}

impl Default for DefectDetail {
    fn default() -> Self {
        Self {
            defect_type: DefectType::Scratch,
            severity: DefectSeverity::Minor,
            location: "center".to_string(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectType {
    Crack,
    #[default]
    Scratch,
    Discoloration,
    Dent,
    Chip,
    Contamination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectSeverity {
    #[default]
    Minor,
    Major,
    Critical,
}
