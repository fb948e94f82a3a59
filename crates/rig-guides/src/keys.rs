//! Record keys and reserved field names.
//!
//! Document keys follow the persisted shape:
//! ```text
//! Project  := { name?, prefix?, metadata?, modules: { <TypeName>: ModuleRec } }
//! ModuleRec:= { name?, prefix?, parent?, metadata?, proxies: { <Identifier>: ProxyRec } }
//! ProxyRec := { name?, parent?, locatorScale?, transform, offsetTransform?,
//!               attributes?, metadata?, uuid? }
//! ```

pub const NAME: &str = "name";
pub const PREFIX: &str = "prefix";
pub const PARENT: &str = "parent";
pub const METADATA: &str = "metadata";
pub const MODULES: &str = "modules";
pub const PROXIES: &str = "proxies";
pub const TYPE: &str = "type";
pub const LOCATOR_SCALE: &str = "locatorScale";
pub const TRANSFORM: &str = "transform";
pub const OFFSET_TRANSFORM: &str = "offsetTransform";
pub const ATTRIBUTES: &str = "attributes";
pub const UUID: &str = "uuid";

pub const POSITION: &str = "position";
pub const ROTATION: &str = "rotation";
pub const SCALE: &str = "scale";

/// Metadata key holding the non-structural (visual) parent.
pub const META_PARENT: &str = "meta-parent";

/// Metadata key holding the role tag a module uses to find its own proxies.
pub const ROLE: &str = "role";

/// Attribute disabling automatic coloring in the scene.
pub const AUTO_COLOR: &str = "auto-color";

/// Attribute holding an explicit `[r, g, b]` color.
pub const COLOR_DEFAULT: &str = "color-default";

/// Live fields that are never pulled back from the scene.
pub const RESERVED_LIVE_FIELDS: [&str; 2] = [UUID, LOCATOR_SCALE];

/// Separator between a module type name and its ordinal in project records.
pub const ORDINAL_SEPARATOR: char = '#';
