//! Content composition boundary.
//!
//! Writing AI values into section settings and blocks is owned by a
//! [`ContentCompositor`] implementation. This module feeds it one resolved
//! section at a time, then applies the cross-section fixups that need the
//! whole content store: the store name in header sections and the product
//! title in product sections.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    aliases::TypeAliasTable,
    content::ContentStore,
    matching::normalize,
    template::{BlockId, BlockInstance, InstanceId, Settings, TemplateDocument},
};

/// Image URLs grouped by the slot they were assigned to.
pub type DistributedImages = BTreeMap<String, Vec<String>>;

pub const GALLERY_SLOT: &str = "gallery";

/// Content substitution collaborator. Every method is total and side-effect free.
pub trait ContentCompositor: Send + Sync {
    /// Upgrade older content shapes to the current one.
    fn migrate(&self, content: ContentStore) -> ContentStore;

    fn distribute_images(&self, content: &ContentStore, images: &[String]) -> DistributedImages;

    fn apply_to_settings(
        &self,
        section_type: &str,
        settings: Settings,
        content: &ContentStore,
        images: &DistributedImages,
    ) -> Settings;

    fn apply_to_blocks(
        &self,
        section_type: &str,
        blocks: HashMap<BlockId, BlockInstance>,
        content: &ContentStore,
        images: &DistributedImages,
    ) -> HashMap<BlockId, BlockInstance>;
}

/// Leaves template settings untouched and puts every image in the gallery.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompositor;

impl ContentCompositor for PassthroughCompositor {
    fn migrate(&self, content: ContentStore) -> ContentStore {
        content
    }

    fn distribute_images(&self, content: &ContentStore, images: &[String]) -> DistributedImages {
        let gallery = if images.is_empty() {
            content.images()
        } else {
            images.to_vec()
        };
        let mut distributed = DistributedImages::new();
        if !gallery.is_empty() {
            distributed.insert(GALLERY_SLOT.to_string(), gallery);
        }
        distributed
    }

    fn apply_to_settings(
        &self,
        _section_type: &str,
        settings: Settings,
        _content: &ContentStore,
        _images: &DistributedImages,
    ) -> Settings {
        settings
    }

    fn apply_to_blocks(
        &self,
        _section_type: &str,
        blocks: HashMap<BlockId, BlockInstance>,
        _content: &ContentStore,
        _images: &DistributedImages,
    ) -> HashMap<BlockId, BlockInstance> {
        blocks
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub settings: Settings,
}

/// A section after content substitution, in the shape the renderer expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedSection {
    pub id: InstanceId,
    #[serde(rename = "type")]
    pub section_type: String,
    pub settings: Settings,
    pub blocks: BTreeMap<BlockId, ComposedBlock>,
    pub block_order: Vec<BlockId>,
}

const STORE_NAME_BLOCK_TYPES: &[&str] = &["logo", "heading", "store-name"];
const TITLE_BLOCK_TYPES: &[&str] = &["title", "product-title"];

/// Run the compositor over every section in `order` and apply the fixups.
pub fn compose_sections(
    template: &TemplateDocument,
    order: &[InstanceId],
    content: &ContentStore,
    images: &DistributedImages,
    compositor: &dyn ContentCompositor,
) -> Vec<ComposedSection> {
    let aliases = TypeAliasTable;
    let store_name = content.store_name();
    let product_title = content.product_title();

    order
        .iter()
        .filter_map(|id| template.section(id))
        .map(|section| {
            let settings = compositor.apply_to_settings(
                &section.section_type,
                section.settings.clone(),
                content,
                images,
            );
            let blocks = compositor.apply_to_blocks(
                &section.section_type,
                section.blocks.clone(),
                content,
                images,
            );
            let mut composed = assemble(
                section.id.clone(),
                &section.section_type,
                settings,
                blocks,
                &section.block_order,
            );

            if let Some(name) = store_name.filter(|_| aliases.is_header_type(&section.section_type)) {
                propagate_store_name(&mut composed, name);
            }
            if let Some(title) =
                product_title.filter(|_| aliases.is_product_type(&section.section_type))
            {
                propagate_product_title(&mut composed, title);
            }
            composed
        })
        .collect()
}

fn assemble(
    id: InstanceId,
    section_type: &str,
    settings: Settings,
    blocks: HashMap<BlockId, BlockInstance>,
    block_order: &[BlockId],
) -> ComposedSection {
    let block_order: Vec<BlockId> = block_order
        .iter()
        .filter(|block_id| blocks.get(*block_id).is_some_and(|block| !block.disabled))
        .cloned()
        .collect();
    let blocks = blocks
        .into_iter()
        .filter(|(block_id, _)| block_order.contains(block_id))
        .map(|(block_id, block)| {
            (
                block_id,
                ComposedBlock {
                    block_type: block.block_type,
                    settings: block.settings,
                },
            )
        })
        .collect();

    ComposedSection {
        id,
        section_type: section_type.to_string(),
        settings,
        blocks,
        block_order,
    }
}

fn propagate_store_name(section: &mut ComposedSection, name: &str) {
    section
        .settings
        .insert("store_name".to_string(), Value::from(name));
    for block in section.blocks.values_mut() {
        if !STORE_NAME_BLOCK_TYPES.contains(&normalize(&block.block_type).as_str()) {
            continue;
        }
        let has_text = block
            .settings
            .get("text")
            .and_then(Value::as_str)
            .is_some_and(|text| !text.trim().is_empty());
        if !has_text {
            block.settings.insert("text".to_string(), Value::from(name));
        }
    }
}

fn propagate_product_title(section: &mut ComposedSection, title: &str) {
    section
        .settings
        .insert("product_title".to_string(), Value::from(title));
    for block in section.blocks.values_mut() {
        if TITLE_BLOCK_TYPES.contains(&normalize(&block.block_type).as_str()) {
            block.settings.insert("title".to_string(), Value::from(title));
        }
    }
}
