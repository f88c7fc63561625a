use std::fmt;
use std::sync::Arc;

use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult};

/// One addressable entity in the session tree.
///
/// Nodes expose the four verbs; a kind implements the subset that makes
/// sense for it and inherits `BadCommand` for the rest. Resolution returns
/// `Arc<dyn Node>`, which is the caller's counted reference: the node stays
/// valid until that reference is dropped, even if a concurrent `delete`
/// removed it from its parent in the meantime.
pub trait Node: Send + Sync {
    /// Immutable name, unique among siblings.
    fn name(&self) -> String;

    /// Free-form description set at creation.
    fn description(&self) -> String {
        String::new()
    }

    /// Concrete kind tag, used in logs and error context.
    fn kind(&self) -> &'static str;

    /// Install a new child. Containers override.
    fn create(&self, _name: &str, _description: &str) -> ControlResult<Option<String>> {
        Err(ControlError::BadCommand(format!(
            "{} does not support create",
            self.kind()
        )))
    }

    /// Rendered JSON of this node's structured view.
    fn read(&self) -> ControlResult<String> {
        self.render()
    }

    /// Node-specific semantic side effect. Leaves override.
    fn update(&self, _value: &str) -> ControlResult<Option<String>> {
        Err(ControlError::BadCommand(format!(
            "{} does not support update",
            self.kind()
        )))
    }

    /// Remove a named child. Containers override.
    fn delete(&self, _name: &str) -> ControlResult<()> {
        Err(ControlError::BadCommand(format!(
            "{} does not support delete",
            self.kind()
        )))
    }

    /// Look up a direct child by name. Leaves return `None`.
    fn child(&self, _name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(None)
    }

    /// Record this node's structured view into a formatter.
    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()>;

    /// The factory used whenever this node renders itself.
    fn formatter_factory(&self) -> Arc<dyn FormatterFactory>;

    /// Render the structured view through a fresh formatter.
    fn render(&self) -> ControlResult<String> {
        let mut fmt = self.formatter_factory().create();
        self.describe(fmt.as_mut())?;
        Ok(fmt.generate()?)
    }
}

impl fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

/// Validate a would-be child name: non-empty and free of the path
/// separator.
pub fn validate_name(name: &str) -> ControlResult<()> {
    if name.is_empty() {
        return Err(ControlError::BadValue("name must not be empty".into()));
    }
    if name.contains('/') {
        return Err(ControlError::BadValue(format!(
            "name must not contain '/': {name:?}"
        )));
    }
    Ok(())
}

/// Record the standard container view:
/// `{"name": N, "children": [{"name", "description"}, …]}`.
pub fn describe_container(
    fmt: &mut dyn Formatter,
    name: &str,
    children: &[(String, String)],
) -> ControlResult<()> {
    fmt.begin_object()?;
    fmt.set_member_name("name")?;
    fmt.set_string(name)?;
    fmt.set_member_name("children")?;
    fmt.begin_array()?;
    for (child, description) in children {
        fmt.begin_object()?;
        fmt.set_member_name("name")?;
        fmt.set_string(child)?;
        fmt.set_member_name("description")?;
        fmt.set_string(description)?;
        fmt.end_object()?;
    }
    fmt.end_array()?;
    fmt.end_object()?;
    Ok(())
}

/// Record the standard leaf view: `{"name": N, "value": V}`.
pub fn describe_value(
    fmt: &mut dyn Formatter,
    name: &str,
    value: serde_json::Value,
) -> ControlResult<()> {
    fmt.begin_object()?;
    fmt.set_member_name("name")?;
    fmt.set_string(name)?;
    fmt.set_member_name("value")?;
    fmt.set_json(value)?;
    fmt.end_object()?;
    Ok(())
}
