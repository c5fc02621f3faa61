use std::fmt;

use serde::Serialize;

use crate::dynamo::attributes::Attributes;
use crate::dynamo::conditions::Conditions;

/// Which read operation a page request issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Scan,
}

impl Operation {
    /// Operation name used in the `X-Amz-Target` header.
    pub fn target(&self) -> &'static str {
        match self {
            Operation::Query => "Query",
            Operation::Scan => "Scan",
        }
    }
}

/// Which attributes a read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Select {
    AllAttributes,
    AllProjectedAttributes,
    SpecificAttributes,
    Count,
}

/// Immutable template of a query or scan, plus the continuation key.
///
/// The next page of a result is requested by the same template with
/// [`PageRequest::with_exclusive_start_key`] set to the previous page's
/// last evaluated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub operation: Operation,
    pub table: String,
    pub conditions: Conditions,
    pub limit: Option<usize>,
    pub forward: bool,
    pub attributes_to_get: Vec<String>,
    pub index: Option<String>,
    pub select: Option<Select>,
    pub consistent: bool,
    pub exclusive_start_key: Option<Attributes>,
}

impl PageRequest {
    /// Key-condition query of `table`.
    pub fn query(table: &str) -> Self {
        Self::new(Operation::Query, table)
    }

    /// Filtered scan of `table`.
    pub fn scan(table: &str) -> Self {
        Self::new(Operation::Scan, table)
    }

    fn new(operation: Operation, table: &str) -> Self {
        Self {
            operation,
            table: table.to_string(),
            conditions: Conditions::new(),
            limit: None,
            forward: true,
            attributes_to_get: Vec::new(),
            index: None,
            select: None,
            consistent: false,
            exclusive_start_key: None,
        }
    }

    /// Key conditions of a query, or the filter of a scan.
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Records evaluated per page.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Range key order of a query.
    pub fn with_forward(mut self, forward: bool) -> Self {
        self.forward = forward;
        self
    }

    /// Projection; empty means every attribute.
    pub fn with_attributes_to_get<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_get = names.into_iter().map(Into::into).collect();
        self
    }

    /// Secondary index to read, if any.
    pub fn with_index(mut self, index: Option<String>) -> Self {
        self.index = index;
        self
    }

    /// What each record carries, or only the count.
    pub fn with_select(mut self, select: Select) -> Self {
        self.select = Some(select);
        self
    }

    /// Strongly consistent (`true`) or eventually consistent reads.
    pub fn with_consistent_read(mut self, consistent: bool) -> Self {
        self.consistent = consistent;
        self
    }

    /// Same request, resuming after `key`.
    pub fn with_exclusive_start_key(mut self, key: Attributes) -> Self {
        self.exclusive_start_key = Some(key);
        self
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of \"{}\" by {}",
            self.operation.target(),
            self.table,
            self.conditions
        )?;
        if let Some(limit) = self.limit {
            write!(f, ", limit {limit}")?;
        }
        if let Some(index) = &self.index {
            write!(f, ", index \"{index}\"")?;
        }
        if let Some(key) = &self.exclusive_start_key {
            write!(f, ", after {key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_keeps_the_template() {
        let request = PageRequest::query("users")
            .with_conditions(Conditions::new().with_eq("id", "a"))
            .with_limit(2);
        let next = request
            .clone()
            .with_exclusive_start_key(Attributes::new().with("id", "a"));
        assert_eq!(next.limit, Some(2));
        assert_eq!(next.conditions, request.conditions);
        assert!(request.exclusive_start_key.is_none());
        assert!(next.exclusive_start_key.is_some());
    }

    #[test]
    fn describes_itself_for_logs() {
        let request = PageRequest::scan("users").with_limit(10);
        assert_eq!(
            request.to_string(),
            "Scan of \"users\" by no conditions, limit 10"
        );
    }
}
