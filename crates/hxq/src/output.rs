//! Printing query results, as text or JSON.

use anyhow::Result;
use hx_semantic::{FileReport, Target, TargetView, TypeRef};
use serde::Serialize;

use crate::project::Project;

pub fn targets(project: &Project, targets: &[Target], json: bool) -> Result<()> {
    let catalog = project.analyzer.catalog();
    let views: Vec<TargetView> = targets.iter().map(|t| TargetView::new(catalog, t)).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }
    if views.is_empty() {
        println!("no declaration found");
    }
    for view in &views {
        match (&view.path, &view.location) {
            (Some(path), Some(at)) => println!(
                "{} {}  {}:{}:{}",
                view.kind,
                view.name,
                project.display_path(path),
                at.line,
                at.column
            ),
            _ => println!("{} {}", view.kind, view.name),
        }
    }
    Ok(())
}

pub fn type_ref(ty: &TypeRef, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "type": ty.to_string() }));
    } else {
        println!("{ty}");
    }
    Ok(())
}

#[derive(Serialize)]
struct CheckOutput<'r> {
    files: &'r [FileReport],
    unresolved: usize,
    unreachable: usize,
}

pub fn reports(project: &Project, reports: &[FileReport], json: bool) -> Result<()> {
    let unresolved: usize = reports.iter().map(|r| r.unresolved.len()).sum();
    let unreachable: usize = reports.iter().map(|r| r.unreachable.len()).sum();
    if json {
        let out = CheckOutput {
            files: reports,
            unresolved,
            unreachable,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for report in reports {
        println!("{}", project.display_path(&report.path));
        for error in &report.parse_errors {
            println!("  parse error: {error}");
        }
        for decl in &report.declarations {
            println!("  {}:{}  {} {} : {}", decl.at.line, decl.at.column, decl.kind, decl.name, decl.ty);
        }
        for missing in &report.unresolved {
            println!("  {}:{}  unresolved `{}`", missing.at.line, missing.at.column, missing.name);
        }
        for dead in &report.unreachable {
            println!("  {}:{}  unreachable code", dead.line, dead.column);
        }
    }
    eprintln!(
        "checked {} files: {} unresolved, {} unreachable",
        reports.len(),
        unresolved,
        unreachable
    );
    Ok(())
}
