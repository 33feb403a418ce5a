//! Failure taxonomy for a merge run.
//!
//! Every variant is terminal for the current run except [`MergeError::MalformedCell`],
//! which the pipeline records per row and keeps going.

use thiserror::Error;

use crate::mapping::Role;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error(
        "Cannot continue: no column found for {}. A UPC and Description column are required",
        join_roles(.roles)
    )]
    MissingRequiredColumn { roles: Vec<Role> },

    #[error("Column '{column}' selected for {role} does not exist in the source file")]
    UnknownColumn { role: Role, column: String },

    #[error("Row {row} column '{column}' holds '{value}', which cannot be converted to text")]
    MalformedCell {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Partner catalog is missing expected column(s): {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.label())
        .collect::<Vec<_>>()
        .join(" and ")
}
