//! `columns` command: show what the mapping step will work with.
//!
//! Lists the source columns by position, previews the first rows, and shows the
//! column auto-detection picks for each role.

use anyhow::Result;
use log::info;

use crate::{
    cli::ColumnsArgs,
    mapping::{ColumnResolver, ResolutionStrategy},
    merge, report, table,
};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let profile = merge::load_profile(args.source.profile.as_deref())?;
    let source = merge::load_source(&args.source)?;

    if source.headers.is_empty() {
        info!("{:?} does not contain any columns", args.source.source);
        return Ok(());
    }

    println!("Columns:");
    let rows: Vec<Vec<String>> = source
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| vec![(idx + 1).to_string(), name.clone()])
        .collect();
    table::print_table(&["#".to_string(), "name".to_string()], &rows);

    if args.rows > 0 {
        let shown = args.rows.min(source.row_count());
        println!();
        println!("First {shown} of {} row(s):", source.row_count());
        table::print_table(&source.headers, &source.display_rows(Some(args.rows)));
    }

    let resolver = ColumnResolver::new(ResolutionStrategy::AliasSearch(profile.aliases.clone()))
        .with_overrides(profile.selection());
    let assigned = resolver.assign(&source.headers)?;
    println!();
    println!("Detected roles:");
    print!("{}", report::render_assignments(&assigned));

    let missing = assigned.missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|role| role.label()).collect();
        println!();
        println!(
            "No column found for {}; pass --mode select with --upc-column/--description-column to merge.",
            names.join(" and ")
        );
    }
    info!(
        "Listed {} column(s) from {:?}",
        source.headers.len(),
        args.source.source
    );
    Ok(())
}
