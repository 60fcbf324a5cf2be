//! Element schema - which prop keys are live properties on which elements.

bitflags::bitflags! {
    /// How a prop key behaves on an element.
    ///
    /// An empty set means "plain attribute".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropFlags: u8 {
        /// Set as a live property rather than an attribute.
        const PROPERTY = 1 << 0;
        /// The property is boolean-typed.
        const BOOLEAN = 1 << 1;
        /// The property exists but cannot be assigned; fall back to the attribute.
        const READONLY = 1 << 2;
    }
}

struct SchemaEntry {
    key: &'static str,
    flags: PropFlags,
    /// Elements the property exists on. Empty means every element.
    tags: &'static [&'static str],
}

const FORM_CONTROLS: &[&str] = &["input", "select", "textarea", "button"];

const SCHEMA: &[SchemaEntry] = &[
    SchemaEntry {
        key: "value",
        flags: PropFlags::PROPERTY,
        tags: &["input", "select", "textarea", "button", "option"],
    },
    SchemaEntry {
        key: "checked",
        flags: PropFlags::PROPERTY.union(PropFlags::BOOLEAN),
        tags: &["input"],
    },
    SchemaEntry {
        key: "disabled",
        flags: PropFlags::PROPERTY.union(PropFlags::BOOLEAN),
        tags: &["input", "select", "textarea", "button", "option", "fieldset"],
    },
    SchemaEntry {
        key: "selected",
        flags: PropFlags::PROPERTY.union(PropFlags::BOOLEAN),
        tags: &["option"],
    },
    SchemaEntry {
        key: "multiple",
        flags: PropFlags::PROPERTY.union(PropFlags::BOOLEAN),
        tags: &["input", "select"],
    },
    SchemaEntry {
        key: "hidden",
        flags: PropFlags::PROPERTY.union(PropFlags::BOOLEAN),
        tags: &[],
    },
    SchemaEntry {
        key: "form",
        flags: PropFlags::PROPERTY.union(PropFlags::READONLY),
        tags: FORM_CONTROLS,
    },
];

/// Schema flags for `key` on a `tag` element.
pub fn prop_flags(tag: &str, key: &str) -> PropFlags {
    SCHEMA
        .iter()
        .find(|entry| entry.key == key && (entry.tags.is_empty() || entry.tags.contains(&tag)))
        .map(|entry| entry.flags)
        .unwrap_or_default()
}

/// Whether `key` is assigned as a live property on a `tag` element.
pub fn should_set_as_property(tag: &str, key: &str) -> bool {
    let flags = prop_flags(tag, key);
    flags.contains(PropFlags::PROPERTY) && !flags.contains(PropFlags::READONLY)
}
