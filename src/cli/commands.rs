//! Subcommand implementations
//!
//! Every command writes JSON (or plain lines) to `out` and batch errors to `err`, and returns
//! whether all requested packages resolved.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::{Value, json};
use tracing::debug;

use crate::batch::Batch;
use crate::cli::Command;
use crate::output::json::dumps;
use crate::output::normalize::{clean_dict, clean_file, normalize_info, release_listing};
use crate::version::error::QypiError;
use crate::version::resolver::PackageResolver;
use crate::version::types::{FileRecord, PackageSpec, SearchQuery};

/// Run one subcommand. `Ok(false)` means at least one package failed with a domain error.
pub async fn execute<O, E>(
    command: Command,
    resolver: &PackageResolver,
    out: &mut O,
    err: &mut E,
) -> Result<bool, QypiError>
where
    O: Write,
    E: Write,
{
    let command_path = format!("qypi {}", command.name());
    debug!("Running {}", command_path);

    match command {
        Command::Info {
            array,
            pre,
            packages,
        } => info(resolver, &packages, array, pre, &command_path, out, err).await,
        Command::Readme { pre, packages } => {
            readme(resolver, &packages, pre, &command_path, out, err).await
        }
        Command::Releases { packages } => {
            releases(resolver, &packages, &command_path, out, err).await
        }
        Command::Files { pre, packages } => {
            files(resolver, &packages, pre, &command_path, out, err).await
        }
        Command::List => {
            for name in resolver.registry().list_packages().await? {
                writeln!(out, "{name}")?;
            }
            Ok(true)
        }
        Command::Search { terms } => {
            let query = SearchQuery::from_terms(&terms)?;
            let hits: Vec<Value> = resolver
                .registry()
                .search(&query)
                .await?
                .iter()
                .map(|hit| Value::Object(clean_dict(hit, &[])))
                .collect();
            writeln!(out, "{}", dumps(&hits)?)?;
            Ok(true)
        }
        Command::Browse { file, classifiers } => {
            let mut classifiers = classifiers;
            if let Some(path) = file {
                classifiers.extend(read_classifiers(&path)?);
            }
            let releases: Vec<Value> = resolver
                .registry()
                .browse(&classifiers)
                .await?
                .into_iter()
                .map(|(name, version)| json!({"name": name, "version": version}))
                .collect();
            writeln!(out, "{}", dumps(&releases)?)?;
            Ok(true)
        }
    }
}

async fn info<O: Write, E: Write>(
    resolver: &PackageResolver,
    packages: &[String],
    array: bool,
    pre: bool,
    command_path: &str,
    out: &mut O,
    err: &mut E,
) -> Result<bool, QypiError> {
    let mut batch = Batch::new(
        packages,
        pre,
        move |spec: PackageSpec, pre: bool| async move { resolver.resolve(&spec, pre).await },
        command_path,
        &mut *err,
    );

    let mut collected = Vec::new();
    let result = async {
        while let Some(doc) = batch.next().await? {
            let info = normalize_info(&doc);
            if array {
                collected.push(Value::Object(info));
            } else {
                writeln!(out, "{}", dumps(&info)?)?;
            }
        }
        Ok::<(), QypiError>(())
    }
    .await;

    // Whatever resolved before a fatal error is still printed in array mode.
    if array {
        writeln!(out, "{}", dumps(&collected)?)?;
    }
    result?;

    Ok(!batch.failed())
}

async fn readme<O: Write, E: Write>(
    resolver: &PackageResolver,
    packages: &[String],
    pre: bool,
    command_path: &str,
    out: &mut O,
    err: &mut E,
) -> Result<bool, QypiError> {
    let mut batch = Batch::new(
        packages,
        pre,
        move |spec: PackageSpec, pre: bool| async move { resolver.resolve(&spec, pre).await },
        command_path,
        &mut *err,
    );

    while let Some(doc) = batch.next().await? {
        writeln!(out, "{}", doc.description().unwrap_or_default())?;
    }

    Ok(!batch.failed())
}

async fn releases<O: Write, E: Write>(
    resolver: &PackageResolver,
    packages: &[String],
    command_path: &str,
    out: &mut O,
    err: &mut E,
) -> Result<bool, QypiError> {
    // Releases lists every version, so pins are meaningless and pre-releases always count.
    let mut batch = Batch::new(
        packages,
        true,
        move |spec: PackageSpec, pre: bool| async move {
            resolver.resolve(&PackageSpec::latest(spec.name), pre).await
        },
        command_path,
        &mut *err,
    );

    while let Some(doc) = batch.next().await? {
        writeln!(out, "{}", dumps(&release_listing(&doc))?)?;
    }

    Ok(!batch.failed())
}

async fn files<O: Write, E: Write>(
    resolver: &PackageResolver,
    packages: &[String],
    pre: bool,
    command_path: &str,
    out: &mut O,
    err: &mut E,
) -> Result<bool, QypiError> {
    let mut batch = Batch::new(
        packages,
        pre,
        move |spec: PackageSpec, pre: bool| async move { resolver.resolve(&spec, pre).await },
        command_path,
        &mut *err,
    );

    while let Some(doc) = batch.next().await? {
        let files: Vec<FileRecord> = doc.urls.iter().map(clean_file).collect();
        writeln!(out, "{}", dumps(&files)?)?;
    }

    Ok(!batch.failed())
}

/// Read one classifier per line, skipping blank lines. `-` reads standard input.
fn read_classifiers(path: &Path) -> io::Result<Vec<String>> {
    let lines: Vec<String> = if path == Path::new("-") {
        io::stdin().lock().lines().collect::<io::Result<_>>()?
    } else {
        fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect()
    };

    Ok(lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
