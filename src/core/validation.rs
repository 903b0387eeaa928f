use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const MAX_FIELD_LEN: usize = 200;

/// Field-keyed validation messages, rendered next to the offending inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn messages(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| (*field, m.as_str())))
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .messages()
            .map(|(_, msg)| msg)
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&joined)
    }
}
