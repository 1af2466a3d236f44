//! Output-to-source position records
//!
//! The emitter records one [`Mapping`] for every identifier it writes and for
//! the start of every function. Hosts turn the records into whatever source
//! map format they need; [`to_json`] gives the plain structured form.

use serde::Serialize;

/// One generated position and the source position it came from.
///
/// Lines are 1-indexed, columns 1-indexed, matching
/// [`core_types::SourcePosition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    /// Line in the generated code
    pub generated_line: u32,
    /// Column in the generated code
    pub generated_column: u32,
    /// Source file name
    pub source: Option<String>,
    /// Line in the source file
    pub source_line: u32,
    /// Column in the source file
    pub source_column: u32,
    /// Original identifier, when it was renamed or is a binding
    pub name: Option<String>,
}

/// Collects mappings in generated order.
#[derive(Debug, Default, Clone)]
pub struct MappingBuilder {
    mappings: Vec<Mapping>,
}

impl MappingBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a mapping. A record at the same generated position as the
    /// previous one replaces nothing and is dropped.
    pub fn add(&mut self, mapping: Mapping) {
        if let Some(last) = self.mappings.last() {
            if last.generated_line == mapping.generated_line
                && last.generated_column == mapping.generated_column
            {
                return;
            }
        }
        self.mappings.push(mapping);
    }

    /// Number of recorded mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// The recorded mappings.
    pub fn finish(self) -> Vec<Mapping> {
        self.mappings
    }
}

/// Serializes mappings as a JSON array.
pub fn to_json(mappings: &[Mapping]) -> serde_json::Result<String> {
    serde_json::to_string(mappings)
}
