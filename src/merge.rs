//! `merge` command: load both files, run the pipeline, write the results.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    cli::{ColumnSelectionArgs, MergeArgs, SourceArgs},
    dataset::{self, Dataset, ReadOptions},
    io_utils,
    mapping::{ColumnResolver, MergeMode, ResolutionStrategy, Role, UserSelection},
    pipeline,
    printable_delimiter,
    profile::Profile,
    report::{self, MergeReport},
};

pub fn execute(args: &MergeArgs) -> Result<()> {
    let profile = load_profile(args.source.profile.as_deref())?;
    let resolver = build_resolver(args.mode, &profile, &cli_selection(&args.columns));

    let source = load_source(&args.source)?;
    info!(
        "Loaded {} row(s) and {} column(s) from {:?}",
        source.row_count(),
        source.headers.len(),
        args.source.source
    );
    let partner = dataset::load(
        &args.partner,
        &ReadOptions {
            sheet: args.partner_sheet.as_deref(),
            delimiter: args.source.delimiter,
            encoding: args.source.input_encoding.as_deref(),
        },
    )
    .with_context(|| format!("Reading partner catalog {:?}", args.partner))?;
    info!(
        "Loaded {} catalog row(s) from {:?}",
        partner.row_count(),
        args.partner
    );

    let outcome = pipeline::merge_datasets(&source, &partner, &resolver)
        .with_context(|| format!("Merging {:?} into {:?}", args.source.source, args.partner))?;

    let output = output_path(args.output.as_deref(), &profile, args.mode);
    let to_stdout = io_utils::is_dash(&output);
    let preview = (args.preview_rows > 0).then_some(args.preview_rows);
    let mut summary = report::render_summary(&outcome, preview);
    if args.dry_run {
        summary.push_str("\nDry run: merged catalog not written.\n");
    } else if !to_stdout {
        summary.push_str(&format!("\nMerged catalog: {}\n", output.display()));
    }
    // Keep stdout clean for the CSV stream when writing to `-`.
    if to_stdout {
        eprint!("{summary}");
    } else {
        print!("{summary}");
    }

    if let Some(path) = &args.status_output {
        dataset::save(&outcome.annotated_source, path, args.source.delimiter)
            .with_context(|| format!("Writing annotated source to {path:?}"))?;
        info!("Annotated source written to {path:?}");
    }

    if !args.dry_run {
        if let Some(delimiter) = args.source.delimiter {
            debug!("Output delimiter override '{}'", printable_delimiter(delimiter));
        }
        dataset::save(&outcome.merged, &output, args.source.delimiter)
            .with_context(|| format!("Writing merged catalog to {output:?}"))?;
        info!(
            "Merged catalog with {} row(s) ({} appended) written to {:?}",
            outcome.merged.row_count(),
            outcome.appended_rows(),
            output
        );
    }

    if let Some(path) = &args.report {
        let written = (!args.dry_run).then_some(output.as_path());
        MergeReport::from_outcome(&outcome, written)
            .save(path)
            .with_context(|| format!("Writing report to {path:?}"))?;
        info!("Merge report written to {path:?}");
    }
    Ok(())
}

pub fn load_profile(path: Option<&Path>) -> Result<Profile> {
    match path {
        Some(path) => {
            let profile = Profile::load(path)?;
            info!("Using profile {path:?}");
            Ok(profile)
        }
        None => Ok(Profile::default()),
    }
}

pub fn load_source(args: &SourceArgs) -> Result<Dataset> {
    dataset::load(
        &args.source,
        &ReadOptions {
            sheet: args.source_sheet.as_deref(),
            delimiter: args.delimiter,
            encoding: args.input_encoding.as_deref(),
        },
    )
    .with_context(|| format!("Reading cleaned UPC list {:?}", args.source))
}

pub fn cli_selection(args: &ColumnSelectionArgs) -> UserSelection {
    let flags = [
        (Role::Upc, &args.upc),
        (Role::Description, &args.description),
        (Role::Brand, &args.brand),
        (Role::Department, &args.department),
        (Role::Category, &args.category),
        (Role::Segment, &args.segment),
    ];
    flags
        .into_iter()
        .fold(UserSelection::new(), |selection, (role, column)| match column {
            Some(column) => selection.with(role, column),
            None => selection,
        })
}

/// Builds the resolver for `mode`.
///
/// Profile column choices sit under the command-line ones. In select mode the
/// combined choices are the strategy itself; otherwise they override the
/// strategy role by role.
pub fn build_resolver(mode: MergeMode, profile: &Profile, cli: &UserSelection) -> ColumnResolver {
    let selection = profile.selection().merged_with(cli);
    match mode {
        MergeMode::Select => ColumnResolver::new(ResolutionStrategy::UserSelected(selection)),
        MergeMode::Auto => ColumnResolver::new(ResolutionStrategy::AliasSearch(
            profile.aliases.clone(),
        ))
        .with_overrides(selection),
        MergeMode::Fixed => {
            ColumnResolver::new(ResolutionStrategy::FixedNames).with_overrides(selection)
        }
    }
}

pub fn output_path(cli: Option<&Path>, profile: &Profile, mode: MergeMode) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| profile.output.clone())
        .unwrap_or_else(|| PathBuf::from(mode.default_output()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::NONE_SELECTED;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn output_path_prefers_cli_then_profile_then_mode_default() {
        let mut profile = Profile::default();
        assert_eq!(
            output_path(None, &profile, MergeMode::Fixed),
            PathBuf::from("merged_partner_file.xlsx")
        );
        profile.output = Some(PathBuf::from("profile.xlsx"));
        assert_eq!(
            output_path(None, &profile, MergeMode::Auto),
            PathBuf::from("profile.xlsx")
        );
        assert_eq!(
            output_path(Some(Path::new("cli.csv")), &profile, MergeMode::Auto),
            PathBuf::from("cli.csv")
        );
    }

    #[test]
    fn cli_columns_win_over_profile_columns() {
        let profile =
            Profile::from_yaml("columns:\n  upc: Code\n  description: Title\n  brand: Maker\n")
                .unwrap();
        let cli = UserSelection::new().with(Role::Brand, NONE_SELECTED);
        let resolver = build_resolver(MergeMode::Select, &profile, &cli);
        let mapping = resolver
            .resolve(&columns(&["Code", "Title", "Maker"]))
            .unwrap();
        assert_eq!(mapping.upc(), "Code");
        assert_eq!(mapping.column(Role::Brand), None);
    }

    #[test]
    fn auto_mode_uses_profile_aliases() {
        let profile = Profile::from_yaml("aliases:\n  upc: [Item Code]\n").unwrap();
        let resolver = build_resolver(MergeMode::Auto, &profile, &UserSelection::new());
        let mapping = resolver
            .resolve(&columns(&["Item Code", "name"]))
            .unwrap();
        assert_eq!(mapping.upc(), "Item Code");
        assert_eq!(mapping.description(), "name");
    }

    #[test]
    fn cli_selection_collects_only_given_flags() {
        let args = ColumnSelectionArgs {
            upc: Some("Code".to_string()),
            segment: Some(NONE_SELECTED.to_string()),
            ..ColumnSelectionArgs::default()
        };
        let selection = cli_selection(&args);
        assert!(selection.get(Role::Upc).is_some());
        assert!(selection.get(Role::Segment).is_some());
        assert!(selection.get(Role::Brand).is_none());
    }
}
