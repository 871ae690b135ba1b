//! Neutral backend request model
//!
//! Query helpers build a [`BackendRequest`] and hand it to a gateway, which
//! owns the wire format. Filters follow PostgREST operator names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ConnectivityError, Result};
use crate::impl_domain_label_conversions;

/// Kind of backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendOperation {
    Select,
    Insert,
    Update,
    Delete,
    Rpc,
}

impl_domain_label_conversions!(BackendOperation {
    Select => "select",
    Insert => "insert",
    Update => "update",
    Delete => "delete",
    Rpc => "rpc",
});

/// Row filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    Is,
}

impl_domain_label_conversions!(FilterOp {
    Eq => "eq",
    Neq => "neq",
    Gt => "gt",
    Gte => "gte",
    Lt => "lt",
    Lte => "lte",
    Like => "like",
    Ilike => "ilike",
    In => "in",
    Is => "is",
});

/// `column <op> value` row filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

/// A single backend call, independent of transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    pub operation: BackendOperation,
    /// Table name, or function name for [`BackendOperation::Rpc`]
    pub target: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub body: Option<Value>,
    /// Column projection for selects, `*` when unset
    #[serde(default)]
    pub columns: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl BackendRequest {
    fn new(operation: BackendOperation, target: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            operation,
            target: target.into(),
            filters: Vec::new(),
            body,
            columns: None,
            limit: None,
        }
    }

    pub fn select(table: impl Into<String>) -> Self {
        Self::new(BackendOperation::Select, table, None)
    }

    pub fn insert(table: impl Into<String>, rows: Value) -> Self {
        Self::new(BackendOperation::Insert, table, Some(rows))
    }

    pub fn update(table: impl Into<String>, changes: Value) -> Self {
        Self::new(BackendOperation::Update, table, Some(changes))
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(BackendOperation::Delete, table, None)
    }

    pub fn rpc(function: impl Into<String>, args: Value) -> Self {
        Self::new(BackendOperation::Rpc, function, Some(args))
    }

    #[must_use]
    pub fn filter(
        mut self,
        column: impl Into<String>,
        op: FilterOp,
        value: impl Into<String>,
    ) -> Self {
        self.filters.push(Filter { column: column.into(), op, value: value.into() });
        self
    }

    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    #[must_use]
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `operation:target` label used in logs and timeout errors
    pub fn label(&self) -> String {
        format!("{}:{}", self.operation, self.target)
    }

    /// Reject requests no backend could serve
    ///
    /// # Errors
    /// Returns `ConnectivityError::InvalidInput` for an empty target or a
    /// write without a body.
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(ConnectivityError::InvalidInput(format!(
                "{} requires a target name",
                self.operation
            )));
        }

        let needs_body =
            matches!(self.operation, BackendOperation::Insert | BackendOperation::Update);
        if needs_body && self.body.as_ref().map_or(true, Value::is_null) {
            return Err(ConnectivityError::InvalidInput(format!(
                "{} requires a body",
                self.label()
            )));
        }

        Ok(())
    }
}
