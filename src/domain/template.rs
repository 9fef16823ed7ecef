//! Theme template documents: an ordered set of section instances.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type InstanceId = String;
pub type BlockId = String;
pub type Settings = Map<String, Value>;

/// A block nested inside a section instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockInstance {
    #[serde(rename = "type")]
    pub block_type: String,
    pub settings: Settings,
    pub disabled: bool,
}

/// One concrete section occurrence. `id` is the key the template author chose
/// (often carrying a random suffix); `section_type` is the stable matching key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionInstance {
    #[serde(skip)]
    pub id: InstanceId,
    #[serde(rename = "type")]
    pub section_type: String,
    pub settings: Settings,
    pub blocks: HashMap<BlockId, BlockInstance>,
    pub block_order: Vec<BlockId>,
    pub disabled: bool,
}

impl SectionInstance {
    pub fn new(id: impl Into<String>, section_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            section_type: section_type.into(),
            ..Self::default()
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTemplate {
    sections: HashMap<InstanceId, SectionInstance>,
    order: Vec<InstanceId>,
}

/// Template for one (theme, page type) pair. Immutable once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateDocument {
    sections: HashMap<InstanceId, SectionInstance>,
    order: Vec<InstanceId>,
}

impl TemplateDocument {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a document from instances given in template order.
    pub fn from_instances(instances: impl IntoIterator<Item = SectionInstance>) -> Self {
        let mut sections = HashMap::new();
        let mut order = Vec::new();
        for instance in instances {
            if sections.contains_key(&instance.id) {
                continue;
            }
            order.push(instance.id.clone());
            sections.insert(instance.id.clone(), instance);
        }
        Self { sections, order }
    }

    /// Parse the `{ sections, order }` JSON shape. Order entries without a
    /// matching section, and repeated entries, are dropped.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawTemplate = serde_json::from_value(value)?;
        let RawTemplate {
            mut sections,
            order,
        } = raw;

        for (id, section) in sections.iter_mut() {
            section.id = id.clone();
        }

        let mut seen = HashSet::new();
        let order = order
            .into_iter()
            .filter(|id| sections.contains_key(id) && seen.insert(id.clone()))
            .collect();

        Ok(Self { sections, order })
    }

    pub fn order(&self) -> &[InstanceId] {
        &self.order
    }

    pub fn section(&self, id: &str) -> Option<&SectionInstance> {
        self.sections.get(id)
    }

    /// Section instances in original template order.
    pub fn instances(&self) -> impl Iterator<Item = &SectionInstance> {
        self.order.iter().filter_map(|id| self.sections.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
