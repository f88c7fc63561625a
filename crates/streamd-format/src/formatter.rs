use crate::error::FormatResult;

/// Builder interface for structured node views.
///
/// Calls record the document in order: containers open with `begin_*` and
/// close with `end_*`, object members are named with [`set_member_name`]
/// before their value is recorded, and [`generate`] emits the accumulated
/// document once it is complete.
///
/// [`set_member_name`]: Formatter::set_member_name
/// [`generate`]: Formatter::generate
pub trait Formatter: Send {
    fn begin_object(&mut self) -> FormatResult<()>;
    fn end_object(&mut self) -> FormatResult<()>;
    fn begin_array(&mut self) -> FormatResult<()>;
    fn end_array(&mut self) -> FormatResult<()>;

    /// Name the next member of the innermost open object.
    fn set_member_name(&mut self, name: &str) -> FormatResult<()>;

    fn set_string(&mut self, value: &str) -> FormatResult<()>;
    fn set_int(&mut self, value: i64) -> FormatResult<()>;
    fn set_uint(&mut self, value: u64) -> FormatResult<()>;
    fn set_bool(&mut self, value: bool) -> FormatResult<()>;
    fn set_double(&mut self, value: f64) -> FormatResult<()>;
    fn set_null(&mut self) -> FormatResult<()>;

    /// Record a prebuilt JSON value in place of a scalar.
    fn set_json(&mut self, value: serde_json::Value) -> FormatResult<()>;

    /// Emit the accumulated document as text owned by the caller.
    fn generate(&mut self) -> FormatResult<String>;
}

/// Factory handed to every node so rendering stays decoupled from the
/// concrete output syntax.
pub trait FormatterFactory: Send + Sync {
    fn create(&self) -> Box<dyn Formatter>;
}
