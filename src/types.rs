/// Shared types used across the codebase

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Data operations a request can perform against tenant data.
/// The organization gate classifies each request to apply the deactivation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Select,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn from_method(method: &Method) -> Self {
        match *method {
            Method::POST => Operation::Create,
            Method::PUT | Method::PATCH => Operation::Update,
            Method::DELETE => Operation::Delete,
            _ => Operation::Select,
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Operation::Select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_http_methods() {
        assert_eq!(Operation::from_method(&Method::GET), Operation::Select);
        assert_eq!(Operation::from_method(&Method::HEAD), Operation::Select);
        assert_eq!(Operation::from_method(&Method::POST), Operation::Create);
        assert_eq!(Operation::from_method(&Method::PATCH), Operation::Update);
        assert_eq!(Operation::from_method(&Method::DELETE), Operation::Delete);
        assert!(!Operation::Select.is_write());
        assert!(Operation::Delete.is_write());
    }
}
