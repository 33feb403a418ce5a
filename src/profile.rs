//! Merge profiles: YAML files carrying alias tables, column selections, and a
//! default output path.
//!
//! ```yaml
//! aliases:
//!   upc: [barcode, Barcode, UPC, BARCODE]
//! columns:
//!   upc: Item Code
//!   brand: (None)
//! output: merged.xlsx
//! ```

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    cli::ProfileArgs,
    mapping::{AliasTable, ColumnChoice, Role, UserSelection},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub aliases: AliasTable,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<Role, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening profile {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing profile {path:?}"))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing profile YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml()?).with_context(|| format!("Writing profile {path:?}"))
    }

    pub fn selection(&self) -> UserSelection {
        let mut selection = UserSelection::new();
        for (role, column) in &self.columns {
            selection.choose(*role, ColumnChoice::parse(column));
        }
        selection
    }
}

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let profile = Profile::default();
    match &args.output {
        Some(path) => {
            profile.save(path)?;
            info!("Default profile written to {path:?}");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(profile.to_yaml()?.as_bytes())
                .context("Writing profile to stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_uses_default_aliases() {
        let profile = Profile::from_yaml("").unwrap();
        assert_eq!(profile.aliases, AliasTable::default());
        assert!(profile.columns.is_empty());
    }

    #[test]
    fn columns_become_a_user_selection() {
        let profile = Profile::from_yaml(
            "columns:\n  upc: Item Code\n  brand: (None)\noutput: out.csv\n",
        )
        .unwrap();
        let selection = profile.selection();
        assert_eq!(
            selection.get(Role::Upc),
            Some(&ColumnChoice::Column("Item Code".to_string()))
        );
        assert_eq!(selection.get(Role::Brand), Some(&ColumnChoice::NoneSelected));
        assert_eq!(profile.output, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Profile::from_yaml("alias: {}\n").is_err());
    }

    #[test]
    fn default_profile_round_trips() {
        let yaml = Profile::default().to_yaml().unwrap();
        assert!(yaml.contains("Product / FIDO ID"));
        assert_eq!(Profile::from_yaml(&yaml).unwrap(), Profile::default());
    }
}
