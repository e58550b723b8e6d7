//! Output - Values a stack exports after apply

use crate::resource::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub name: String,
    pub description: Option<String>,
    pub value: Value,
    /// Cross-stack export name
    pub export_name: Option<Value>,
}

impl Output {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            value,
            export_name: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_export_name(mut self, name: Value) -> Self {
        self.export_name = Some(name);
        self
    }
}
