//! Name conventions tying schemas to their generated types, and accessor
//! names to property keys.

/// The generated grain type name for a schema.
pub fn grain_name(schema: &str) -> String {
    format!("{schema}Grain")
}

/// The generated builder type name for a schema.
pub fn builder_name(schema: &str) -> String {
    format!("{schema}Builder")
}

/// The generated factory type name for a schema.
pub fn factory_name(schema: &str) -> String {
    format!("{schema}Factory")
}

/// A recognized accessor name, split into its property key and form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorName {
    pub property: String,
    /// True when the accessor used the `isX` form.
    pub is_form: bool,
}

/// Splits `getX`/`isX` into a property key. The remainder must start with
/// an uppercase letter; anything else is not an accessor name.
pub fn accessor_name(method: &str) -> Option<AccessorName> {
    let (remainder, is_form) = if let Some(rest) = method.strip_prefix("get") {
        (rest, false)
    } else if let Some(rest) = method.strip_prefix("is") {
        (rest, true)
    } else {
        return None;
    };
    if !remainder.chars().next().is_some_and(|c| c.is_uppercase()) {
        return None;
    }
    Some(AccessorName {
        property: decapitalize(remainder),
        is_form,
    })
}

/// Lowercases a leading capital unless the name opens with an acronym run
/// (two or more capitals), which is preserved whole.
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if first.is_uppercase() && name.chars().nth(1).is_some_and(char::is_uppercase) {
        return name.to_owned();
    }
    first.to_lowercase().chain(chars).collect()
}
