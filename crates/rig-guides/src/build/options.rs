//! Build configuration.

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Knobs for [`Project::build_proxy_with`](crate::model::Project::build_proxy_with).
///
/// Every field has a default, so a partial JSON object is a valid
/// configuration:
///
/// ```
/// use rig_guides::build::BuildOptions;
///
/// let options = BuildOptions::from_json_str(r#"{ "drawConnectors": false }"#).unwrap();
/// assert!(!options.draw_connectors);
/// assert_eq!(options.root_name, "guides");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildOptions {
    /// Name of the container every offset group is moved under.
    pub root_name: String,
    /// Name of the container collecting auxiliary helper objects.
    pub setup_name: String,
    pub draw_connectors: bool,
    /// Apply pinned colors during side-dressing.
    pub apply_colors: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            root_name: "guides".to_string(),
            setup_name: "guides_setup".to_string(),
            draw_connectors: true,
            apply_colors: true,
        }
    }
}

impl BuildOptions {
    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        assert_eq!(BuildOptions::from_json_str("{}").unwrap(), BuildOptions::default());
    }

    #[test]
    fn test_partial_override() {
        let options =
            BuildOptions::from_json_str(r#"{"rootName": "hero_guides", "applyColors": false}"#)
                .unwrap();
        assert_eq!(options.root_name, "hero_guides");
        assert_eq!(options.setup_name, "guides_setup");
        assert!(!options.apply_colors);
        assert!(options.draw_connectors);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            BuildOptions::from_json_str(r#"{"rootname": "x"}"#),
            Err(DocumentError::Json(_))
        ));
    }
}
