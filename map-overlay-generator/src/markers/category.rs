/// Semantic category resolution for location markers.
use crate::markers::entity::LocationCategory;
use map_constants::class::{EDITOR_ID_HINTS, NAME_KEYWORDS, get_marker_type};

/// Name keywords first, then editor-id hints, then the type code table.
pub fn semantic_category(
    name: &str,
    editor_id: Option<&str>,
    type_code: Option<u16>,
) -> LocationCategory {
    name_category(name)
        .or_else(|| editor_id.and_then(editor_id_category))
        .or_else(|| type_code.and_then(type_code_category))
        .unwrap_or(LocationCategory::Other)
}

pub fn name_category(name: &str) -> Option<LocationCategory> {
    let lower = name.to_lowercase();
    NAME_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .and_then(|(key, _)| LocationCategory::from_key(key))
}

pub fn editor_id_category(editor_id: &str) -> Option<LocationCategory> {
    let lower = editor_id.to_lowercase();
    EDITOR_ID_HINTS
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .and_then(|(_, key)| LocationCategory::from_key(key))
}

pub fn type_code_category(code: u16) -> Option<LocationCategory> {
    get_marker_type(code).and_then(|t| LocationCategory::from_key(t.category))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_keywords_follow_priority() {
        // "castle" is both a military keyword and part of "the castle" settlement
        // keyword; military is checked first.
        assert_eq!(name_category("The Castle"), Some(LocationCategory::Military));
        assert_eq!(name_category("Vault 111"), Some(LocationCategory::Vault));
        assert_eq!(name_category("Park Street Station"), Some(LocationCategory::Metro));
        assert_eq!(name_category("Sanctuary Hills"), Some(LocationCategory::Settlement));
        assert_eq!(name_category("Corvega Plant"), None);
    }

    #[test]
    fn falls_back_through_editor_id_and_type_code() {
        assert_eq!(
            semantic_category("Corvega Plant", Some("WorkshopMarker"), Some(16)),
            LocationCategory::Settlement
        );
        assert_eq!(
            semantic_category("Corvega Plant", Some("MapMarker"), Some(16)),
            LocationCategory::Vault
        );
        assert_eq!(
            semantic_category("Corvega Plant", None, Some(1)),
            LocationCategory::Poi
        );
        assert_eq!(
            semantic_category("Corvega Plant", None, Some(999)),
            LocationCategory::Other
        );
    }
}
