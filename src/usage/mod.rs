//! Usage analysis: matching a user source tree's call sites against an
//! extracted API model.
//!
//! Matching is layered. Strategy 1 infers the receiver's type (constructor
//! assignments, known property/field types, chained access through declared
//! return types). Strategy 2 falls back to a unique method name across all
//! client types, or a unique root through a base chain. Calls on receivers
//! known to be outside the SDK never match, and lookup is case-sensitive.

use serde::{Deserialize, Serialize};

pub mod csharp;
pub mod golang;
pub mod java;
pub mod python;
pub mod typescript;

pub(crate) mod surface;

/// One covered operation, anchored at its first observed call site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationUsage {
    /// Client type, or the module/package for top-level functions.
    pub client_type: String,
    pub operation: String,
    pub file: String,
    /// 1-based line number.
    pub line: usize,
}

/// An operation from the API surface that no call site exercised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncoveredOperation {
    pub client_type: String,
    pub operation: String,
    /// Signature kept for prompt rendering.
    pub signature: String,
}

/// Result of analyzing one source tree against one API index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageIndex {
    pub file_count: usize,
    pub covered_operations: Vec<OperationUsage>,
    pub uncovered_operations: Vec<UncoveredOperation>,
    /// Non-fatal scan problems (unreadable files and the like).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl UsageIndex {
    pub fn fully_covered(&self) -> bool {
        self.uncovered_operations.is_empty() && self.errors.is_empty()
    }
}

/// Deduplicating collector: the same `(client_type, operation)` pair at many
/// call sites yields one entry, anchored at the first observed site.
#[derive(Debug, Default)]
pub(crate) struct CoverageBuilder {
    covered: Vec<OperationUsage>,
}

impl CoverageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, client_type: &str, operation: &str, file: &str, line: usize) {
        let exists = self
            .covered
            .iter()
            .any(|c| c.client_type == client_type && c.operation == operation);
        if !exists {
            self.covered.push(OperationUsage {
                client_type: client_type.to_string(),
                operation: operation.to_string(),
                file: file.to_string(),
                line,
            });
        }
    }

    pub fn covers(&self, client_type: &str, operation: &str) -> bool {
        self.covered
            .iter()
            .any(|c| c.client_type == client_type && c.operation == operation)
    }

    pub fn finish(self) -> Vec<OperationUsage> {
        self.covered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_dedupes_on_client_and_operation() {
        let mut builder = CoverageBuilder::new();
        builder.record("ChatClient", "GetCompletionAsync", "sample1.cs", 10);
        builder.record("ChatClient", "GetCompletionAsync", "sample2.cs", 4);
        builder.record("ChatClient", "GetCompletionAsync", "sample2.cs", 9);
        builder.record("ChatClient", "Close", "sample2.cs", 12);

        let covered = builder.finish();
        assert_eq!(covered.len(), 2);
        assert_eq!(covered[0].file, "sample1.cs");
        assert_eq!(covered[0].line, 10);
    }

    #[test]
    fn case_matters_in_coverage_keys() {
        let mut builder = CoverageBuilder::new();
        builder.record("MyClient", "Send", "a.cs", 1);
        builder.record("MyClient", "send", "a.cs", 2);
        assert_eq!(builder.finish().len(), 2);
    }

    #[test]
    fn usage_index_serializes_camel_case() {
        let index = UsageIndex {
            file_count: 2,
            covered_operations: vec![OperationUsage {
                client_type: "ChatClient".to_string(),
                operation: "Send".to_string(),
                file: "sample.cs".to_string(),
                line: 3,
            }],
            uncovered_operations: vec![UncoveredOperation {
                client_type: "ChatClient".to_string(),
                operation: "Close".to_string(),
                signature: "void Close()".to_string(),
            }],
            errors: Vec::new(),
        };
        let json = serde_json::to_string(&index).unwrap();
        assert!(json.contains("\"fileCount\":2"));
        assert!(json.contains("\"clientType\":\"ChatClient\""));
        assert!(json.contains("\"coveredOperations\""));
    }
}
