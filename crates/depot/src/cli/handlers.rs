//! Command handlers.

use crate::cli::{Cli, Commands};
use chrono::{Duration, Utc};
use depot::{
    Access, CategoryFilter, DepotConfig, DepotResult, ExpiryUpdate, FileService, FileUpdate,
    ListQuery, SortKey, SortOrder, UploadOptions, UploadRequest, presets,
};
use depot_error::{JsonError, StorageError, StorageErrorKind, ValidationError};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::{debug, instrument};

/// Execute the parsed command line.
#[instrument(skip(cli))]
pub async fn run(cli: Cli) -> DepotResult<()> {
    if let Commands::Presets = cli.command {
        let table: Vec<_> = presets()
            .into_iter()
            .map(|(name, descriptor)| json!({ "name": name, "descriptor": descriptor }))
            .collect();
        return print_json(&table);
    }

    let config = match &cli.config {
        Some(path) => DepotConfig::from_file(path)?,
        None => DepotConfig::load()?,
    };
    let access = if cli.anonymous {
        Access::anonymous()
    } else {
        Access::admin()
    };

    let service = FileService::new(config).await?;
    debug!(?access, "Running command");

    match cli.command {
        Commands::Upload {
            file,
            name,
            mime,
            tags,
            private,
            expires_in,
            no_thumbnail,
            max_dimension,
            quality,
        } => {
            let bytes = read_file(&file).await?;
            let name = name.unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let options = UploadOptions {
                tags,
                is_public: !private,
                expires_in,
                expires_at: None,
                thumbnail: !no_thumbnail,
                max_dimension,
                quality,
            };
            let mut request = UploadRequest::new(bytes, name).with_options(options);
            if let Some(mime) = mime {
                request = request.with_declared_mime(mime);
            }
            print_json(&service.upload(request).await?)
        }

        Commands::Get { id, output } => match output {
            Some(output) => {
                let content = service.read_content(&id, access).await?;
                write_file(&output, &content.bytes).await?;
                print_json(&content.record)
            }
            None => print_json(&service.get(&id, access).await?),
        },

        Commands::List {
            category,
            search,
            sort,
            order,
            page,
            limit,
        } => {
            let mut query = ListQuery::default()
                .with_category(parse_arg::<CategoryFilter>("category", &category)?)
                .with_sort_by(parse_arg::<SortKey>("sort", &sort)?)
                .with_sort_order(parse_arg::<SortOrder>("order", &order)?)
                .with_page(page)
                .with_limit(service.config().query().clamp_limit(limit));
            query.search = search;
            print_json(&service.list(access, &query).await)
        }

        Commands::Update {
            id,
            public,
            tags,
            expires_in,
            no_expiry,
        } => {
            let expires = if no_expiry {
                Some(ExpiryUpdate::Clear)
            } else {
                match expires_in {
                    Some(seconds) => {
                        let lifetime = i64::try_from(seconds)
                            .ok()
                            .and_then(Duration::try_seconds)
                            .ok_or_else(|| {
                                ValidationError::invalid_parameter("expires_in", "too large")
                            })?;
                        Some(ExpiryUpdate::At(Utc::now() + lifetime))
                    }
                    None => None,
                }
            };
            let update = FileUpdate {
                is_public: public,
                tags,
                expires,
            };
            print_json(&service.update(&id, update).await?)
        }

        Commands::Delete { id } => print_json(&service.delete(&id).await?),

        Commands::Sweep => {
            let removed = service.sweep(access).await?;
            print_json(&json!({ "removed": removed }))
        }

        Commands::Transform {
            id,
            preset,
            params,
            output,
        } => {
            let pairs = params
                .iter()
                .map(|p| {
                    p.split_once('=').ok_or_else(|| {
                        ValidationError::invalid_parameter(p.as_str(), "expected key=value")
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let transformed = service
                .transform(&id, access, preset.as_deref(), &pairs)
                .await?;
            write_file(&output, &transformed.bytes).await?;
            print_json(&json!({
                "output": output,
                "contentType": transformed.content_type,
                "size": transformed.bytes.len(),
                "cacheHit": transformed.cache_hit,
                "passthrough": transformed.passthrough,
            }))
        }

        Commands::Stats => print_json(&service.stats().await),

        Commands::Verify => {
            let missing = service.verify().await;
            print_json(&json!({ "missing": missing }))
        }

        Commands::Presets => Ok(()),
    }
}

fn parse_arg<T>(name: &str, value: &str) -> DepotResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e: String| ValidationError::invalid_parameter(name, e).into())
}

fn print_json(value: &impl Serialize) -> DepotResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| JsonError::new(format!("Failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

async fn read_file(path: &Path) -> DepotResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e))).into()
    })
}

async fn write_file(path: &Path, data: &[u8]) -> DepotResult<()> {
    tokio::fs::write(path, data).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", path.display(), e))).into()
    })
}
