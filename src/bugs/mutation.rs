//
//  bugz-cli
//  bugs/mutation.rs
//

//! Building `Bug.update` payloads.
//!
//! A modification is collected as a sparse [`MutationRequest`] - every field
//! the user did not touch stays `None`/empty and never appears on the wire,
//! so the server treats it as "unchanged" rather than "cleared". The builder
//! applies the field interaction rules in a fixed order:
//!
//! 1. scalar fields are copied through when present;
//! 2. list-valued fields become composite `{add, remove}` sub-structures
//!    (keywords uses `{set}`, replacing the whole list);
//! 3. a duplicate resolution (`dupe_of`) suppresses any explicit status and
//!    resolution, the server derives both;
//! 4. the `fixed` / `invalid` shortcuts force `RESOLVED`/`FIXED` or
//!    `RESOLVED`/`INVALID` and are applied last, overriding everything;
//! 5. the comment, when non-empty, lands under `comment.body`;
//! 6. a payload that carries nothing but bug ids is rejected before any
//!    network traffic with "No changes were specified".

use crate::error::{BugzError, Result};
use crate::rpc::{Struct, Value};

/// Sparse description of one `modify` invocation.
#[derive(Debug, Clone, Default)]
pub struct MutationRequest {
    pub ids: Vec<i64>,
    pub alias: Option<String>,
    pub assigned_to: Option<String>,
    /// Reset the assignee to the component default.
    pub unassign: bool,
    pub blocks_add: Vec<i64>,
    pub blocks_remove: Vec<i64>,
    pub depends_on_add: Vec<i64>,
    pub depends_on_remove: Vec<i64>,
    pub cc_add: Vec<String>,
    pub cc_remove: Vec<String>,
    pub comment: Option<String>,
    pub component: Option<String>,
    pub dupe_of: Option<i64>,
    pub deadline: Option<String>,
    pub estimated_time: Option<f64>,
    pub remaining_time: Option<f64>,
    pub work_time: Option<f64>,
    pub groups_add: Vec<String>,
    pub groups_remove: Vec<String>,
    /// Full replacement of the keyword list; `Some(vec![])` clears it.
    pub keywords_set: Option<Vec<String>>,
    pub op_sys: Option<String>,
    pub platform: Option<String>,
    pub priority: Option<String>,
    pub product: Option<String>,
    pub resolution: Option<String>,
    pub see_also_add: Vec<String>,
    pub see_also_remove: Vec<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
    pub whiteboard: Option<String>,
    /// Shortcut for `status=RESOLVED resolution=FIXED`.
    pub fixed: bool,
    /// Shortcut for `status=RESOLVED resolution=INVALID`.
    pub invalid: bool,
}

impl MutationRequest {
    pub fn new(ids: Vec<i64>) -> Self {
        Self {
            ids,
            ..Default::default()
        }
    }

    /// Produces the `Bug.update` parameter struct.
    ///
    /// # Errors
    ///
    /// Conflicting fields (`assigned_to` with `unassign`, `fixed` with
    /// `invalid`) and an empty change set are validation errors; nothing is
    /// sent in either case.
    pub fn build(&self) -> Result<Struct> {
        if self.assigned_to.is_some() && self.unassign {
            return Err(BugzError::validation(
                "--assigned-to and --unassign cannot be used together",
            ));
        }
        if self.fixed && self.invalid {
            return Err(BugzError::validation(
                "--fixed and --invalid cannot be used together",
            ));
        }

        let mut params = Struct::new();
        params.insert("ids".to_string(), Value::int_array(self.ids.iter().copied()));

        set_str(&mut params, "alias", &self.alias);
        set_str(&mut params, "assigned_to", &self.assigned_to);
        if self.unassign {
            params.insert("reset_assigned_to".to_string(), Value::Bool(true));
        }

        set_composite_ints(&mut params, "blocks", &self.blocks_add, &self.blocks_remove);
        set_composite_ints(
            &mut params,
            "depends_on",
            &self.depends_on_add,
            &self.depends_on_remove,
        );
        set_composite_strs(&mut params, "cc", &self.cc_add, &self.cc_remove);
        set_composite_strs(&mut params, "groups", &self.groups_add, &self.groups_remove);
        set_composite_strs(
            &mut params,
            "see_also",
            &self.see_also_add,
            &self.see_also_remove,
        );

        if let Some(keywords) = &self.keywords_set {
            let mut sub = Struct::new();
            sub.insert(
                "set".to_string(),
                Value::string_array(keywords.iter().map(String::as_str)),
            );
            params.insert("keywords".to_string(), Value::Struct(sub));
        }

        set_str(&mut params, "component", &self.component);
        set_str(&mut params, "deadline", &self.deadline);
        set_f64(&mut params, "estimated_time", self.estimated_time);
        set_f64(&mut params, "remaining_time", self.remaining_time);
        set_f64(&mut params, "work_time", self.work_time);
        set_str(&mut params, "op_sys", &self.op_sys);
        set_str(&mut params, "platform", &self.platform);
        set_str(&mut params, "priority", &self.priority);
        set_str(&mut params, "product", &self.product);
        set_str(&mut params, "severity", &self.severity);
        set_str(&mut params, "summary", &self.summary);
        set_str(&mut params, "url", &self.url);
        set_str(&mut params, "version", &self.version);
        set_str(&mut params, "whiteboard", &self.whiteboard);

        // A duplicate marker owns the resolution; explicit status/resolution
        // are dropped rather than sent alongside it.
        if let Some(dupe_of) = self.dupe_of {
            params.insert("dupe_of".to_string(), Value::Int(dupe_of));
        } else {
            set_str(&mut params, "status", &self.status);
            set_str(&mut params, "resolution", &self.resolution);
        }

        // Shortcuts are applied last so they win over everything above.
        if self.fixed {
            params.insert("status".to_string(), Value::from("RESOLVED"));
            params.insert("resolution".to_string(), Value::from("FIXED"));
        }
        if self.invalid {
            params.insert("status".to_string(), Value::from("RESOLVED"));
            params.insert("resolution".to_string(), Value::from("INVALID"));
        }

        if let Some(comment) = &self.comment {
            if !comment.is_empty() {
                let mut sub = Struct::new();
                sub.insert("body".to_string(), Value::from(comment.as_str()));
                params.insert("comment".to_string(), Value::Struct(sub));
            }
        }

        if params.len() < 2 {
            return Err(BugzError::validation("No changes were specified"));
        }
        Ok(params)
    }
}

fn set_str(params: &mut Struct, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        params.insert(key.to_string(), Value::from(value.as_str()));
    }
}

fn set_f64(params: &mut Struct, key: &str, value: Option<f64>) {
    if let Some(value) = value {
        params.insert(key.to_string(), Value::Double(value));
    }
}

fn set_composite_ints(params: &mut Struct, key: &str, add: &[i64], remove: &[i64]) {
    if add.is_empty() && remove.is_empty() {
        return;
    }
    let mut sub = Struct::new();
    if !add.is_empty() {
        sub.insert("add".to_string(), Value::int_array(add.iter().copied()));
    }
    if !remove.is_empty() {
        sub.insert("remove".to_string(), Value::int_array(remove.iter().copied()));
    }
    params.insert(key.to_string(), Value::Struct(sub));
}

fn set_composite_strs(params: &mut Struct, key: &str, add: &[String], remove: &[String]) {
    if add.is_empty() && remove.is_empty() {
        return;
    }
    let mut sub = Struct::new();
    if !add.is_empty() {
        sub.insert(
            "add".to_string(),
            Value::string_array(add.iter().map(String::as_str)),
        );
    }
    if !remove.is_empty() {
        sub.insert(
            "remove".to_string(),
            Value::string_array(remove.iter().map(String::as_str)),
        );
    }
    params.insert(key.to_string(), Value::Struct(sub));
}
