//! Section resolution: editor visibility and ordering applied to a template.
//!
//! Editors name sections by logical name (`what-makes-us-different`) while
//! templates key them by instance id with a random suffix and a stable type
//! (`pdp_benefits_aB1`). Resolution runs in three passes:
//!
//! 1. requested order: each logical name claims the first unused instance
//!    whose type matches one of its candidates, strongest strategy first;
//!    unclaimed instances follow in template order;
//! 2. filtering: disabled and hidden instances are dropped;
//! 3. header priority: header-like types move to the front, stably.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{
    aliases::TypeAliasTable,
    matching::{ORDERING_STRATEGIES, SEGMENT_STRATEGIES, normalize, ranked_match},
    template::{InstanceId, SectionInstance, TemplateDocument},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SectionResolver {
    aliases: TypeAliasTable,
}

impl SectionResolver {
    pub fn new(aliases: TypeAliasTable) -> Self {
        Self { aliases }
    }

    /// Produce the effective order of instance ids to render.
    pub fn resolve(
        &self,
        template: &TemplateDocument,
        hidden_logical_names: &[String],
        ordered_logical_names: &[String],
    ) -> Vec<InstanceId> {
        let hidden = self.hidden_types(hidden_logical_names);
        let ordered = self.requested_order(template, ordered_logical_names);

        let mut visible: Vec<&SectionInstance> = ordered
            .into_iter()
            .filter(|instance| !instance.disabled)
            .filter(|instance| !hidden.hides(instance))
            .collect();

        // Vec::sort_by_key is stable, so each group keeps its relative order.
        visible.sort_by_key(|instance| !self.aliases.is_header_type(&instance.section_type));

        let resolved: Vec<InstanceId> = visible
            .into_iter()
            .map(|instance| instance.id.clone())
            .collect();

        debug!(
            target = "vitrine::resolver",
            template_sections = template.len(),
            hidden = hidden_logical_names.len(),
            requested = ordered_logical_names.len(),
            resolved = resolved.len(),
            "Resolved section order"
        );

        resolved
    }

    fn hidden_types(&self, hidden_logical_names: &[String]) -> HiddenTypes {
        let mut exact = HashSet::new();
        let mut normalized = Vec::new();
        for name in hidden_logical_names {
            exact.insert(name.clone());
            for alias in self.aliases.aliases(name) {
                exact.insert((*alias).to_string());
            }
            for candidate in self.aliases.candidates(name) {
                if !normalized.contains(&candidate) {
                    normalized.push(candidate);
                }
            }
        }
        HiddenTypes { exact, normalized }
    }

    fn requested_order<'t>(
        &self,
        template: &'t TemplateDocument,
        ordered_logical_names: &[String],
    ) -> Vec<&'t SectionInstance> {
        let instances: Vec<&SectionInstance> = template.instances().collect();
        if ordered_logical_names.is_empty() {
            return instances;
        }

        let normalized_types: Vec<String> = instances
            .iter()
            .map(|instance| normalize(&instance.section_type))
            .collect();
        let mut used = vec![false; instances.len()];
        let mut ordered = Vec::with_capacity(instances.len());

        for name in ordered_logical_names {
            let candidates = self.aliases.candidates(name);
            if let Some(index) = claim_instance(&normalized_types, &used, &candidates) {
                used[index] = true;
                ordered.push(instances[index]);
            }
        }

        ordered.extend(
            instances
                .iter()
                .zip(&used)
                .filter(|(_, used)| !**used)
                .map(|(instance, _)| *instance),
        );
        ordered
    }
}

/// First unused instance matching any candidate, trying strategies in rank
/// order so an exact match anywhere beats a prefix match earlier in the page.
fn claim_instance(
    normalized_types: &[String],
    used: &[bool],
    candidates: &[String],
) -> Option<usize> {
    ORDERING_STRATEGIES.iter().find_map(|strategy| {
        candidates.iter().find_map(|candidate| {
            normalized_types
                .iter()
                .enumerate()
                .find(|(index, subject)| !used[*index] && strategy.matches(subject, candidate))
                .map(|(index, _)| index)
        })
    })
}

struct HiddenTypes {
    exact: HashSet<String>,
    normalized: Vec<String>,
}

impl HiddenTypes {
    fn hides(&self, instance: &SectionInstance) -> bool {
        if self.exact.contains(&instance.id) || self.exact.contains(&instance.section_type) {
            return true;
        }
        let id = normalize(&instance.id);
        let section_type = normalize(&instance.section_type);
        self.normalized.iter().any(|hidden| {
            ranked_match(&id, hidden, SEGMENT_STRATEGIES).is_some()
                || ranked_match(&section_type, hidden, SEGMENT_STRATEGIES).is_some()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(sections: &[(&str, &str)]) -> TemplateDocument {
        TemplateDocument::from_instances(
            sections
                .iter()
                .map(|(id, section_type)| SectionInstance::new(*id, *section_type)),
        )
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn resolve(doc: &TemplateDocument, hidden: &[&str], order: &[&str]) -> Vec<String> {
        SectionResolver::default().resolve(doc, &names(hidden), &names(order))
    }

    #[test]
    fn empty_controls_keep_template_order_minus_disabled() {
        let doc = TemplateDocument::from_instances([
            SectionInstance::new("main", "main-product"),
            SectionInstance::new("rich", "rich-text").disabled(),
            SectionInstance::new("faq", "faq"),
        ]);
        assert_eq!(resolve(&doc, &[], &[]), ["main", "faq"]);
    }

    #[test]
    fn hiding_an_alias_removes_suffixed_instance() {
        let doc = template(&[("s1", "announcement-bar"), ("s2", "pdp_benefits_aB1")]);
        assert_eq!(resolve(&doc, &["what-makes-us-different"], &[]), ["s1"]);
    }

    #[test]
    fn doubled_separators_still_hide_the_instance() {
        let doc = template(&[("s1", "announcement-bar"), ("s2", "pdp__benefits_aB1")]);
        assert_eq!(resolve(&doc, &["what-makes-us-different"], &[]), ["s1"]);
    }

    #[test]
    fn requested_order_then_header_priority() {
        let doc = template(&[("s1", "announcement-bar"), ("s2", "pdp_benefits_aB1")]);
        let resolver = SectionResolver::default();

        let walked: Vec<_> = resolver
            .requested_order(&doc, &names(&["what-makes-us-different"]))
            .into_iter()
            .map(|instance| instance.id.as_str())
            .collect();
        assert_eq!(walked, ["s2", "s1"]);

        assert_eq!(resolve(&doc, &[], &["what-makes-us-different"]), ["s1", "s2"]);
    }

    #[test]
    fn hiding_marquee_keeps_header_with_marquee() {
        let doc = template(&[
            ("hdr", "header_with_marquee"),
            ("mq", "marquee_Zx1"),
            ("main", "main-product"),
        ]);
        assert_eq!(resolve(&doc, &["marquee"], &[]), ["hdr", "main"]);
    }

    #[test]
    fn hidden_name_matches_instance_id_prefix() {
        let doc = template(&[("faq_q81", "custom-liquid"), ("main", "main-product")]);
        assert_eq!(resolve(&doc, &["faq"], &[]), ["main"]);
    }

    #[test]
    fn unknown_logical_name_is_treated_as_literal_type() {
        let doc = template(&[("a", "rich-text"), ("b", "video"), ("c", "image-with-text")]);
        assert_eq!(resolve(&doc, &[], &["video"]), ["b", "a", "c"]);
        assert_eq!(resolve(&doc, &["video"], &[]), ["a", "c"]);
    }

    #[test]
    fn unreferenced_sections_are_appended_not_dropped() {
        let doc = template(&[("a", "faq"), ("b", "testimonials"), ("c", "footer")]);
        assert_eq!(resolve(&doc, &[], &["testimonials"]), ["b", "a", "c"]);
    }

    #[test]
    fn duplicate_types_fill_one_slot_each() {
        let doc = template(&[("t1", "testimonials"), ("x", "faq"), ("t2", "testimonials")]);
        assert_eq!(
            resolve(&doc, &[], &["testimonials", "testimonials", "faq"]),
            ["t1", "t2", "x"]
        );
        assert_eq!(resolve(&doc, &[], &["testimonials"]), ["t1", "x", "t2"]);
    }

    #[test]
    fn exact_match_beats_earlier_prefix_match() {
        let doc = template(&[("early", "faq-legacy"), ("late", "faq")]);
        assert_eq!(resolve(&doc, &[], &["faq"]), ["late", "early"]);
    }

    #[test]
    fn substring_is_last_resort_for_ordering() {
        let doc = template(&[("a", "rich-text"), ("b", "custom-faq-list")]);
        assert_eq!(resolve(&doc, &[], &["faq"]), ["b", "a"]);
    }

    #[test]
    fn output_is_subset_permutation_of_template_order() {
        let doc = template(&[
            ("h", "header"),
            ("m", "main-product"),
            ("f", "faq"),
            ("t", "testimonials"),
            ("z", "footer"),
        ]);
        let resolved = resolve(&doc, &["footer"], &["faq", "unknown", "main", "faq"]);
        let mut seen = std::collections::HashSet::new();
        for id in &resolved {
            assert!(doc.order().contains(id));
            assert!(seen.insert(id.clone()), "duplicate {id}");
        }
        assert_eq!(resolved.len(), doc.len() - 1);
        assert_eq!(resolved.first().map(String::as_str), Some("h"));
    }

    #[test]
    fn empty_template_resolves_to_nothing() {
        assert!(resolve(&TemplateDocument::empty(), &["faq"], &["hero"]).is_empty());
    }
}
