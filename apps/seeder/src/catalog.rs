//! The static vibe catalog: preset video-generation style templates.
//!
//! The records live in `data/vibes.json` and are compiled into the binary.
//! Nothing here touches the database.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SeedError;

const BUILTIN_CATALOG: &str = include_str!("../data/vibes.json");
const MAX_ID_BYTES: usize = 1500;

/// One reusable video-generation style preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VibeTemplate {
    /// Document key. Stable; never regenerated.
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub prompt: String,
    pub tags: Vec<String>,
    /// Downstream video models this preset is known to work with.
    pub model_support: Vec<String>,
    pub use_cases: Vec<String>,
    /// Relative local path or absolute URL; not validated.
    pub preview_image_url: String,
    /// Opaque generation parameters (aspect ratio, pacing, camera, palette, soundtrack).
    pub json_schema: Value,
    /// Ids of other presets. Soft references: never checked at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curated: Option<bool>,
}

impl VibeTemplate {
    pub fn aspect_ratio(&self) -> Option<&str> {
        self.json_schema.get("aspect_ratio").and_then(Value::as_str)
    }
}

/// A `related` entry pointing at an id that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReport {
    pub count: usize,
    pub dangling: Vec<DanglingReference>,
}

/// Parses the catalog compiled into the binary.
pub fn builtin() -> Result<Vec<VibeTemplate>, SeedError> {
    from_json(BUILTIN_CATALOG)
}

pub fn from_json(text: &str) -> Result<Vec<VibeTemplate>, SeedError> {
    serde_json::from_str(text).map_err(|e| SeedError::InvalidCatalog(e.to_string()))
}

/// Checks the invariants the writer relies on.
///
/// Duplicate or illegal ids and malformed aspect ratios are errors.
/// Dangling `related` ids are only reported.
pub fn validate(vibes: &[VibeTemplate]) -> Result<CatalogReport, SeedError> {
    let mut seen = HashSet::new();

    for vibe in vibes {
        if !is_document_id(&vibe.id) {
            return Err(SeedError::InvalidCatalog(format!(
                "'{}' is not a valid document id",
                vibe.id
            )));
        }
        if !seen.insert(vibe.id.as_str()) {
            return Err(SeedError::InvalidCatalog(format!(
                "duplicate id '{}'",
                vibe.id
            )));
        }
        match vibe.aspect_ratio() {
            Some(ratio) if is_aspect_ratio(ratio) => {}
            Some(ratio) => {
                return Err(SeedError::InvalidCatalog(format!(
                    "'{}' has malformed aspect_ratio '{ratio}'",
                    vibe.id
                )))
            }
            None => {
                return Err(SeedError::InvalidCatalog(format!(
                    "'{}' has no jsonSchema.aspect_ratio",
                    vibe.id
                )))
            }
        }
    }

    let mut dangling = Vec::new();
    for vibe in vibes {
        for target in vibe.related.iter().flatten() {
            if !seen.contains(target.as_str()) {
                dangling.push(DanglingReference {
                    from: vibe.id.clone(),
                    to: target.clone(),
                });
            }
        }
    }

    Ok(CatalogReport {
        count: vibes.len(),
        dangling,
    })
}

/// Firestore document id rules: non-empty, at most 1500 bytes, no `/`,
/// not `.` or `..`, and not of the reserved form `__name__`.
fn is_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_BYTES
        && !id.contains('/')
        && id != "."
        && id != ".."
        && !(id.len() >= 4 && id.starts_with("__") && id.ends_with("__"))
}

/// `W:H` with both sides positive integers.
fn is_aspect_ratio(s: &str) -> bool {
    let Some((w, h)) = s.split_once(':') else {
        return false;
    };
    [w, h].iter().all(|part| {
        !part.is_empty()
            && part.bytes().all(|b| b.is_ascii_digit())
            && part.bytes().any(|b| b != b'0')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vibe(id: &str, ratio: &str, related: Option<&[&str]>) -> VibeTemplate {
        VibeTemplate {
            id: id.to_string(),
            name: id.to_string(),
            tagline: String::new(),
            prompt: String::new(),
            tags: vec![],
            model_support: vec!["Sora".into()],
            use_cases: vec![],
            preview_image_url: format!("/sample-thumbnails/{id}.jpg"),
            json_schema: json!({ "aspect_ratio": ratio }),
            related: related.map(|r| r.iter().map(|s| s.to_string()).collect()),
            curated: None,
        }
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let vibes = builtin().unwrap();
        assert_eq!(vibes.len(), 12);
        assert_eq!(vibes[0].id, "urban-dawn");
        assert_eq!(vibes[0].model_support, vec!["Sora", "Veo", "Pika"]);
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let vibes = builtin().unwrap();
        let ids: HashSet<_> = vibes.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids.len(), vibes.len());
    }

    #[test]
    fn test_builtin_aspect_ratios_are_well_formed() {
        for v in builtin().unwrap() {
            let ratio = v.aspect_ratio().unwrap_or_default();
            assert!(is_aspect_ratio(ratio), "{} has '{ratio}'", v.id);
        }
    }

    #[test]
    fn test_builtin_validates_without_dangling_refs() {
        let vibes = builtin().unwrap();
        let report = validate(&vibes).unwrap();
        assert_eq!(report.count, 12);
        assert!(report.dangling.is_empty());
    }

    #[test]
    fn test_builtin_curated_flags() {
        let vibes = builtin().unwrap();
        let curated: Vec<_> = vibes
            .iter()
            .filter(|v| v.curated == Some(true))
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(curated.len(), 6);
        assert!(curated.contains(&"product-reel"));
        assert!(vibes.iter().all(|v| v.curated != Some(false)));
    }

    #[test]
    fn test_is_aspect_ratio() {
        for ok in ["16:9", "9:16", "21:9", "4:5", "1:1", "3:2"] {
            assert!(is_aspect_ratio(ok), "{ok}");
        }
        for bad in ["", "16x9", "16:", ":9", "16:9:1", "a:b", "0:9", " 16:9", "16.5:9"] {
            assert!(!is_aspect_ratio(bad), "{bad}");
        }
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let vibes = vec![vibe("a", "16:9", None), vibe("a", "1:1", None)];
        let err = validate(&vibes).unwrap_err();
        assert!(err.to_string().contains("duplicate id 'a'"));
    }

    #[test]
    fn test_validate_rejects_bad_aspect_ratio() {
        let err = validate(&[vibe("a", "wide", None)]).unwrap_err();
        assert!(matches!(err, SeedError::InvalidCatalog(_)));
    }

    #[test]
    fn test_validate_rejects_missing_aspect_ratio() {
        let mut v = vibe("a", "16:9", None);
        v.json_schema = json!({ "pacing": "slow" });
        assert!(validate(&[v]).is_err());
    }

    #[test]
    fn test_validate_rejects_slash_in_id() {
        assert!(validate(&[vibe("a/b", "16:9", None)]).is_err());
        assert!(validate(&[vibe("", "16:9", None)]).is_err());
    }

    #[test]
    fn test_validate_rejects_reserved_ids() {
        for bad in [".", "..", "__name__", "__x__"] {
            assert!(validate(&[vibe(bad, "16:9", None)]).is_err(), "{bad}");
        }
        assert!(validate(&[vibe(&"a".repeat(1501), "16:9", None)]).is_err());
    }

    #[test]
    fn test_is_document_id_accepts_near_misses() {
        for ok in ["a.b", "...", "__", "___", "__x", "x__", "urban-dawn"] {
            assert!(is_document_id(ok), "{ok}");
        }
        assert!(is_document_id(&"a".repeat(1500)));
    }

    #[test]
    fn test_validate_reports_dangling_related_without_failing() {
        let vibes = vec![
            vibe("a", "16:9", Some(&["b", "ghost"])),
            vibe("b", "9:16", Some(&["a"])),
        ];
        let report = validate(&vibes).unwrap();
        assert_eq!(
            report.dangling,
            vec![DanglingReference {
                from: "a".into(),
                to: "ghost".into()
            }]
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let err = from_json(r#"[{"id": "x", "nmae": "typo"}]"#).unwrap_err();
        assert!(matches!(err, SeedError::InvalidCatalog(_)));
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let value = serde_json::to_value(vibe("a", "16:9", None)).unwrap();
        assert!(value.get("related").is_none());
        assert!(value.get("curated").is_none());
        assert_eq!(value["previewImageUrl"], "/sample-thumbnails/a.jpg");
        assert_eq!(value["modelSupport"], json!(["Sora"]));
    }
}
