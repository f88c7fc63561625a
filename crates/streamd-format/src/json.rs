use serde_json::{Map, Number, Value};

use crate::error::{FormatError, FormatResult};
use crate::formatter::{Formatter, FormatterFactory};

enum Frame {
    Object {
        members: Map<String, Value>,
        pending: Option<String>,
    },
    Array(Vec<Value>),
}

/// JSON renderer for the [`Formatter`] interface.
///
/// Member order is preserved as recorded, strings are escaped per RFC 8259,
/// and integers and booleans are emitted unquoted.
#[derive(Default)]
pub struct JsonFormatter {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_value(&mut self, value: Value) -> FormatResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { members, pending }) => {
                let name = pending.take().ok_or(FormatError::MissingMemberName)?;
                members.insert(name, value);
                Ok(())
            }
            Some(Frame::Array(items)) => {
                items.push(value);
                Ok(())
            }
            None => {
                if self.root.is_some() {
                    return Err(FormatError::ValueOutsideDocument);
                }
                self.root = Some(value);
                Ok(())
            }
        }
    }
}

impl Formatter for JsonFormatter {
    fn begin_object(&mut self) -> FormatResult<()> {
        self.stack.push(Frame::Object {
            members: Map::new(),
            pending: None,
        });
        Ok(())
    }

    fn end_object(&mut self) -> FormatResult<()> {
        match self.stack.pop() {
            Some(Frame::Object { members, .. }) => self.push_value(Value::Object(members)),
            _ => Err(FormatError::UnbalancedEnd),
        }
    }

    fn begin_array(&mut self) -> FormatResult<()> {
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> FormatResult<()> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.push_value(Value::Array(items)),
            _ => Err(FormatError::UnbalancedEnd),
        }
    }

    fn set_member_name(&mut self, name: &str) -> FormatResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { pending, .. }) => {
                *pending = Some(name.to_string());
                Ok(())
            }
            _ => Err(FormatError::NameOutsideObject),
        }
    }

    fn set_string(&mut self, value: &str) -> FormatResult<()> {
        self.push_value(Value::String(value.to_string()))
    }

    fn set_int(&mut self, value: i64) -> FormatResult<()> {
        self.push_value(Value::Number(value.into()))
    }

    fn set_uint(&mut self, value: u64) -> FormatResult<()> {
        self.push_value(Value::Number(value.into()))
    }

    fn set_bool(&mut self, value: bool) -> FormatResult<()> {
        self.push_value(Value::Bool(value))
    }

    fn set_double(&mut self, value: f64) -> FormatResult<()> {
        // Non-finite doubles have no JSON form; render them as null.
        let number = Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null);
        self.push_value(number)
    }

    fn set_null(&mut self) -> FormatResult<()> {
        self.push_value(Value::Null)
    }

    fn set_json(&mut self, value: Value) -> FormatResult<()> {
        self.push_value(value)
    }

    fn generate(&mut self) -> FormatResult<String> {
        if !self.stack.is_empty() {
            return Err(FormatError::IncompleteDocument);
        }
        let root = self.root.take().ok_or(FormatError::IncompleteDocument)?;
        serde_json::to_string(&root).map_err(|e| FormatError::Serialization(e.to_string()))
    }
}

/// Factory producing [`JsonFormatter`] instances, one per response.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFactory;

impl FormatterFactory for JsonFactory {
    fn create(&self) -> Box<dyn Formatter> {
        Box::new(JsonFormatter::new())
    }
}
