//! Raw form of a request filter

/// Parameter name and the comma-separated values it was given.
///
/// Values keep their request order. The name never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFilter {
    param: String,
    values: Vec<String>,
}

impl RawFilter {
    /// Split a raw query value on commas, trimming surrounding whitespace
    pub fn new(param: &str, raw: &str) -> Self {
        Self {
            param: param.to_string(),
            values: raw.split(',').map(|v| v.trim().to_string()).collect(),
        }
    }

    /// Keep the raw value whole (commas are part of the value)
    pub fn single(param: &str, raw: &str) -> Self {
        Self {
            param: param.to_string(),
            values: vec![raw.to_string()],
        }
    }

    /// Filter registered without any request value
    pub fn empty(param: &str) -> Self {
        Self {
            param: param.to_string(),
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.param
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Values joined back into query-string form
    pub fn value(&self) -> String {
        self.values.join(",")
    }

    pub(super) fn push_value(&mut self, value: String) {
        self.values.push(value);
    }
}
