//
//  bugz-cli
//  bugs/search.rs
//

//! Building `Bug.search` payloads.
//!
//! Free-text terms match against the bug summary. Status filtering carries
//! a sentinel: the literal status `all` disables the filter entirely, so
//! "search everything" does not need a separate flag. Email criteria go
//! through the provider's two-slot interface - each of up to two distinct
//! addresses occupies a numbered `email<N>` slot with per-role boolean
//! qualifiers, and a query naming more than two distinct addresses across
//! the four roles is rejected client-side.

use crate::error::{BugzError, Result};
use crate::rpc::{Struct, Value};

/// Criteria for one `search` invocation.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Free-text terms, matched against the summary.
    pub terms: Vec<String>,
    /// Status filter; the entry `all` (any case) disables filtering.
    pub statuses: Option<Vec<String>>,
    pub assigned_to: Option<String>,
    pub reporter: Option<String>,
    pub cc: Option<String>,
    pub commenter: Option<String>,
    pub alias: Option<String>,
    pub product: Vec<String>,
    pub component: Vec<String>,
    pub severity: Vec<String>,
    pub priority: Vec<String>,
    pub op_sys: Option<String>,
    pub platform: Option<String>,
    pub resolution: Option<String>,
    pub version: Option<String>,
    pub whiteboard: Option<String>,
    pub keywords: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchQuery {
    /// Produces the `Bug.search` parameter struct.
    ///
    /// # Errors
    ///
    /// A query with no criteria at all fails with "Please give search terms
    /// or options."; more than two distinct email addresses is a validation
    /// error (two slots is all the protocol offers).
    pub fn build(&self) -> Result<Struct> {
        let mut params = Struct::new();

        if !self.terms.is_empty() {
            params.insert(
                "summary".to_string(),
                Value::string_array(self.terms.iter().map(String::as_str)),
            );
        }

        if let Some(statuses) = &self.statuses {
            if !statuses.iter().any(|s| s.eq_ignore_ascii_case("all")) {
                params.insert(
                    "status".to_string(),
                    Value::string_array(statuses.iter().map(String::as_str)),
                );
            }
        }

        set_str(&mut params, "alias", &self.alias);
        set_list(&mut params, "product", &self.product);
        set_list(&mut params, "component", &self.component);
        set_list(&mut params, "severity", &self.severity);
        set_list(&mut params, "priority", &self.priority);
        set_str(&mut params, "op_sys", &self.op_sys);
        set_str(&mut params, "platform", &self.platform);
        set_str(&mut params, "resolution", &self.resolution);
        set_str(&mut params, "version", &self.version);
        set_str(&mut params, "whiteboard", &self.whiteboard);
        set_str(&mut params, "keywords", &self.keywords);

        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), Value::Int(limit));
        }
        if let Some(offset) = self.offset {
            params.insert("offset".to_string(), Value::Int(offset));
        }

        self.apply_email_slots(&mut params)?;

        if params.is_empty() {
            return Err(BugzError::validation("Please give search terms or options."));
        }
        Ok(params)
    }

    /// Distributes the four email roles over the two numbered slots.
    ///
    /// One address may fill several roles at once (its slot gets multiple
    /// qualifier flags); distinct addresses each consume a slot.
    fn apply_email_slots(&self, params: &mut Struct) -> Result<()> {
        let roles = [
            &self.assigned_to,
            &self.reporter,
            &self.cc,
            &self.commenter,
        ];
        let mut unique: Vec<&str> = Vec::new();
        for role in roles.into_iter().flatten() {
            if !role.is_empty() && !unique.contains(&role.as_str()) {
                unique.push(role);
            }
        }
        if unique.len() > 2 {
            return Err(BugzError::validation(
                "cannot search on more than two distinct email addresses",
            ));
        }

        for (i, email) in unique.iter().enumerate() {
            let n = i + 1;
            let matches = |role: &Option<String>| {
                Value::Bool(role.as_deref() == Some(*email))
            };
            params.insert(format!("email{n}"), Value::from(*email));
            params.insert(format!("emailassigned_to{n}"), matches(&self.assigned_to));
            params.insert(format!("emailreporter{n}"), matches(&self.reporter));
            params.insert(format!("emailcc{n}"), matches(&self.cc));
            params.insert(format!("emaillongdesc{n}"), matches(&self.commenter));
            params.insert(format!("emailtype{n}"), Value::from("substring"));
        }
        Ok(())
    }
}

fn set_str(params: &mut Struct, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        params.insert(key.to_string(), Value::from(value.as_str()));
    }
}

fn set_list(params: &mut Struct, key: &str, values: &[String]) {
    if !values.is_empty() {
        params.insert(
            key.to_string(),
            Value::string_array(values.iter().map(String::as_str)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_is_rejected() {
        let err = SearchQuery::default().build().unwrap_err();
        assert_eq!(err.to_string(), "Please give search terms or options.");
    }

    #[test]
    fn test_terms_match_summary() {
        let query = SearchQuery {
            terms: vec!["kernel".to_string(), "panic".to_string()],
            ..Default::default()
        };
        let params = query.build().unwrap();
        assert_eq!(
            params.get("summary"),
            Some(&Value::string_array(["kernel", "panic"]))
        );
    }

    #[test]
    fn test_all_sentinel_disables_status_filter() {
        let query = SearchQuery {
            terms: vec!["kernel".to_string()],
            statuses: Some(vec!["ALL".to_string()]),
            ..Default::default()
        };
        let params = query.build().unwrap();
        assert!(!params.contains_key("status"));

        let query = SearchQuery {
            terms: vec!["kernel".to_string()],
            statuses: Some(vec!["NEW".to_string(), "CONFIRMED".to_string()]),
            ..Default::default()
        };
        let params = query.build().unwrap();
        assert_eq!(
            params.get("status"),
            Some(&Value::string_array(["NEW", "CONFIRMED"]))
        );
    }

    #[test]
    fn test_one_email_in_two_roles_shares_a_slot() {
        let query = SearchQuery {
            assigned_to: Some("dev@example.com".to_string()),
            cc: Some("dev@example.com".to_string()),
            ..Default::default()
        };
        let params = query.build().unwrap();
        assert_eq!(
            params.get("email1").and_then(Value::as_str),
            Some("dev@example.com")
        );
        assert_eq!(params.get("emailassigned_to1"), Some(&Value::Bool(true)));
        assert_eq!(params.get("emailcc1"), Some(&Value::Bool(true)));
        assert_eq!(params.get("emailreporter1"), Some(&Value::Bool(false)));
        assert!(!params.contains_key("email2"));
    }

    #[test]
    fn test_two_distinct_emails_fill_both_slots() {
        let query = SearchQuery {
            assigned_to: Some("dev@example.com".to_string()),
            reporter: Some("qa@example.com".to_string()),
            ..Default::default()
        };
        let params = query.build().unwrap();
        assert!(params.contains_key("email1"));
        assert!(params.contains_key("email2"));
        assert_eq!(params.get("emailreporter2"), Some(&Value::Bool(true)));
        assert_eq!(params.get("emailassigned_to2"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_three_distinct_emails_are_rejected() {
        let query = SearchQuery {
            assigned_to: Some("a@example.com".to_string()),
            reporter: Some("b@example.com".to_string()),
            cc: Some("c@example.com".to_string()),
            ..Default::default()
        };
        let err = query.build().unwrap_err();
        assert!(matches!(err, BugzError::Validation(_)));
    }

    #[test]
    fn test_email_only_query_is_enough() {
        let query = SearchQuery {
            commenter: Some("dev@example.com".to_string()),
            ..Default::default()
        };
        assert!(query.build().is_ok());
    }
}
