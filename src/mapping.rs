//! Column resolution: mapping source headers onto the six semantic roles.
//!
//! A [`ColumnResolver`] runs one [`ResolutionStrategy`] (fixed names, alias search,
//! or an explicit user selection), applies any per-role overrides, and validates
//! that the UPC and description roles are mapped. The result is a [`FieldMapping`],
//! which only exists once that check has passed.

use std::{collections::BTreeMap, fmt};

use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// Token meaning "no column selected" for a role.
pub const NONE_SELECTED: &str = "(None)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Upc,
    Description,
    Brand,
    Department,
    Category,
    Segment,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Upc,
        Role::Description,
        Role::Brand,
        Role::Department,
        Role::Category,
        Role::Segment,
    ];

    pub fn is_required(self) -> bool {
        matches!(self, Role::Upc | Role::Description)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Upc => "upc",
            Role::Description => "description",
            Role::Brand => "brand",
            Role::Department => "department",
            Role::Category => "category",
            Role::Segment => "segment",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Upc => "UPC",
            Role::Description => "Description",
            Role::Brand => "Brand",
            Role::Department => "Department",
            Role::Category => "Category",
            Role::Segment => "Segment",
        }
    }

    /// Column name expected by the fixed-schema layout of the cleaned UPC list.
    pub fn fixed_column(self) -> &'static str {
        match self {
            Role::Upc => "BARCODE",
            Role::Description => "DESCRIPTION",
            Role::Brand => "BRAND",
            Role::Department => "CATEGORY_1",
            Role::Category => "CATEGORY_2",
            Role::Segment => "CATEGORY_3",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered alias lists per role. The first alias present in the source wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub upc: Vec<String>,
    pub description: Vec<String>,
    pub brand: Vec<String>,
    pub department: Vec<String>,
    pub category: Vec<String>,
    pub segment: Vec<String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        fn list(values: &[&str]) -> Vec<String> {
            values.iter().map(|value| value.to_string()).collect()
        }
        Self {
            upc: list(&["barcode", "Barcode", "UPC", "BARCODE"]),
            description: list(&[
                "description",
                "name",
                "Product / FIDO ID",
                "Product Name",
                "Product Description",
            ]),
            brand: list(&["brand", "Brand", "BRAND"]),
            department: list(&["department", "Department", "CATEGORY_1", "Category 1"]),
            category: list(&["category", "Category", "CATEGORY_2", "Category 2"]),
            segment: list(&["segment", "Segment", "CATEGORY_3", "Category 3"]),
        }
    }
}

impl AliasTable {
    pub fn aliases(&self, role: Role) -> &[String] {
        match role {
            Role::Upc => &self.upc,
            Role::Description => &self.description,
            Role::Brand => &self.brand,
            Role::Department => &self.department,
            Role::Category => &self.category,
            Role::Segment => &self.segment,
        }
    }
}

/// Returns the first alias, in alias order, that exactly matches a column.
pub fn detect_column<'a>(columns: &[String], aliases: &'a [String]) -> Option<&'a str> {
    aliases
        .iter()
        .find(|alias| columns.iter().any(|column| column == *alias))
        .map(String::as_str)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnChoice {
    Column(String),
    NoneSelected,
}

impl ColumnChoice {
    pub fn parse(raw: &str) -> Self {
        if raw == NONE_SELECTED {
            ColumnChoice::NoneSelected
        } else {
            ColumnChoice::Column(raw.to_string())
        }
    }
}

/// Explicit per-role column choices, as made in the mapping interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSelection {
    choices: BTreeMap<Role, ColumnChoice>,
}

impl UserSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose(&mut self, role: Role, choice: ColumnChoice) {
        self.choices.insert(role, choice);
    }

    pub fn with(mut self, role: Role, column: &str) -> Self {
        self.choose(role, ColumnChoice::parse(column));
        self
    }

    pub fn get(&self, role: Role) -> Option<&ColumnChoice> {
        self.choices.get(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Layers `other` on top of `self`; roles chosen in `other` win.
    pub fn merged_with(&self, other: &UserSelection) -> UserSelection {
        let mut choices = self.choices.clone();
        choices.extend(other.choices.clone());
        UserSelection { choices }
    }

    fn checked_column(
        &self,
        role: Role,
        columns: &[String],
    ) -> Result<Option<Option<String>>, MergeError> {
        match self.get(role) {
            None => Ok(None),
            Some(ColumnChoice::NoneSelected) => Ok(Some(None)),
            Some(ColumnChoice::Column(name)) => {
                if columns.iter().any(|column| column == name) {
                    Ok(Some(Some(name.clone())))
                } else {
                    Err(MergeError::UnknownColumn {
                        role,
                        column: name.clone(),
                    })
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    /// Detect columns from the alias tables
    Auto,
    /// Expect BARCODE, DESCRIPTION, BRAND, CATEGORY_1..3
    Fixed,
    /// Use the columns chosen per role
    Select,
}

impl MergeMode {
    pub fn default_output(self) -> &'static str {
        match self {
            MergeMode::Auto => "merged_auto_mapped_output.xlsx",
            MergeMode::Fixed => "merged_partner_file.xlsx",
            MergeMode::Select => "merged_flexible_output.xlsx",
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergeMode::Auto => "auto",
            MergeMode::Fixed => "fixed",
            MergeMode::Select => "select",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStrategy {
    FixedNames,
    AliasSearch(AliasTable),
    UserSelected(UserSelection),
}

impl ResolutionStrategy {
    pub fn mode(&self) -> MergeMode {
        match self {
            ResolutionStrategy::FixedNames => MergeMode::Fixed,
            ResolutionStrategy::AliasSearch(_) => MergeMode::Auto,
            ResolutionStrategy::UserSelected(_) => MergeMode::Select,
        }
    }

    fn assign(&self, columns: &[String]) -> Result<RoleAssignments, MergeError> {
        let mut assigned = RoleAssignments::default();
        for role in Role::ALL {
            let column = match self {
                ResolutionStrategy::FixedNames => {
                    let name = role.fixed_column();
                    columns
                        .iter()
                        .any(|column| column == name)
                        .then(|| name.to_string())
                }
                ResolutionStrategy::AliasSearch(table) => {
                    detect_column(columns, table.aliases(role)).map(str::to_string)
                }
                ResolutionStrategy::UserSelected(selection) => {
                    match selection.checked_column(role, columns)? {
                        Some(choice) => choice,
                        None => positional_default(role, columns),
                    }
                }
            };
            assigned.set(role, column);
        }
        Ok(assigned)
    }
}

/// Mirrors the selector defaults of the mapping interface: the first column for
/// UPC, the second for description, nothing for the optional roles.
fn positional_default(role: Role, columns: &[String]) -> Option<String> {
    let position = match role {
        Role::Upc => 0,
        Role::Description => 1,
        _ => return None,
    };
    let column = columns.get(position).cloned();
    if let Some(name) = &column {
        warn!("No column selected for {role}; defaulting to '{name}'");
    }
    column
}

/// Per-role outcome before the mandatory check. `None` means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAssignments {
    columns: BTreeMap<Role, Option<String>>,
}

impl RoleAssignments {
    pub fn set(&mut self, role: Role, column: Option<String>) {
        self.columns.insert(role, column);
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.columns.get(&role).and_then(|column| column.as_deref())
    }

    pub fn missing_required(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| role.is_required() && self.get(*role).is_none())
            .collect()
    }

    pub fn into_mapping(self) -> Result<FieldMapping, MergeError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(MergeError::MissingRequiredColumn { roles: missing });
        }
        let take = |role: Role| self.get(role).map(str::to_string);
        Ok(FieldMapping {
            upc: take(Role::Upc).unwrap_or_default(),
            description: take(Role::Description).unwrap_or_default(),
            brand: take(Role::Brand),
            department: take(Role::Department),
            category: take(Role::Category),
            segment: take(Role::Segment),
        })
    }
}

/// Validated role → source column mapping. UPC and description are always mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    upc: String,
    description: String,
    brand: Option<String>,
    department: Option<String>,
    category: Option<String>,
    segment: Option<String>,
}

impl FieldMapping {
    pub fn upc(&self) -> &str {
        &self.upc
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn column(&self, role: Role) -> Option<&str> {
        match role {
            Role::Upc => Some(&self.upc),
            Role::Description => Some(&self.description),
            Role::Brand => self.brand.as_deref(),
            Role::Department => self.department.as_deref(),
            Role::Category => self.category.as_deref(),
            Role::Segment => self.segment.as_deref(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (Role, Option<&str>)> + '_ {
        Role::ALL.into_iter().map(|role| (role, self.column(role)))
    }
}

#[derive(Debug, Clone)]
pub struct ColumnResolver {
    strategy: ResolutionStrategy,
    overrides: UserSelection,
}

impl ColumnResolver {
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self {
            strategy,
            overrides: UserSelection::default(),
        }
    }

    /// Explicit choices that replace the strategy's result for their roles.
    pub fn with_overrides(mut self, overrides: UserSelection) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn strategy(&self) -> &ResolutionStrategy {
        &self.strategy
    }

    pub fn mode(&self) -> MergeMode {
        self.strategy.mode()
    }

    /// Runs the strategy and overrides without the mandatory-role check.
    pub fn assign(&self, columns: &[String]) -> Result<RoleAssignments, MergeError> {
        let mut assigned = self.strategy.assign(columns)?;
        for role in Role::ALL {
            if let Some(choice) = self.overrides.checked_column(role, columns)? {
                debug!("Override for {role}: {choice:?}");
                assigned.set(role, choice);
            }
        }
        Ok(assigned)
    }

    pub fn resolve(&self, columns: &[String]) -> Result<FieldMapping, MergeError> {
        self.assign(columns)?.into_mapping()
    }
}
