//! Moving files between the local filesystem and a bucket

use crate::{types::ObjectInfo, StorageClient};
use std::path::{Component, Path, PathBuf};
use steward_core::{LifecycleError, ObjectUri, Operation, RetryingExecutor};
use tracing::{info, instrument};

/// Map a local file to the object it is uploaded as
///
/// With `strip_prefix`, that leading directory is removed from `local`
/// first; the path must start with it. Remaining components are joined with
/// `/` under `dest`.
pub fn object_name_for(
    local: &Path,
    strip_prefix: Option<&Path>,
    dest: &ObjectUri,
) -> Result<ObjectUri, LifecycleError> {
    let relative = match strip_prefix {
        Some(prefix) => local.strip_prefix(prefix).map_err(|_| LifecycleError::Transfer {
            path: local.to_path_buf(),
            reason: format!("path does not start with {}", prefix.display()),
        })?,
        None => local,
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str().ok_or_else(|| {
                LifecycleError::Transfer {
                    path: local.to_path_buf(),
                    reason: "path is not valid UTF-8".to_string(),
                }
            })?),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                return Err(LifecycleError::Transfer {
                    path: local.to_path_buf(),
                    reason: "path cannot contain '..'".to_string(),
                })
            }
        }
    }

    if segments.is_empty() {
        return Err(LifecycleError::Transfer {
            path: local.to_path_buf(),
            reason: "no file name left after stripping prefix".to_string(),
        });
    }

    Ok(dest.join(&segments.join("/")))
}

/// Map an object to the local file it is downloaded to
///
/// With `strip_prefix`, that leading part of the object name is removed;
/// the name must start with it.
pub fn local_path_for(
    source: &ObjectUri,
    strip_prefix: Option<&str>,
    dest_dir: &Path,
) -> Result<PathBuf, LifecycleError> {
    let name = source.path();
    let relative = match strip_prefix {
        Some(prefix) => name.strip_prefix(prefix).ok_or_else(|| LifecycleError::Transfer {
            path: PathBuf::from(name),
            reason: format!("object name does not start with {:?}", prefix),
        })?,
        None => name,
    };

    let mut path = dest_dir.to_path_buf();
    let mut pushed = false;
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(LifecycleError::Transfer {
                path: PathBuf::from(name),
                reason: "object name cannot contain relative segments".to_string(),
            });
        }
        path.push(segment);
        pushed = true;
    }

    if !pushed {
        return Err(LifecycleError::Transfer {
            path: PathBuf::from(name),
            reason: "no file name left after stripping prefix".to_string(),
        });
    }

    Ok(path)
}

/// Upload one local file under `dest`
#[instrument(skip(client, executor), fields(dest = %dest))]
pub async fn upload_file(
    client: &StorageClient,
    executor: &RetryingExecutor,
    local: &Path,
    strip_prefix: Option<&Path>,
    dest: &ObjectUri,
    content_type: Option<&str>,
) -> Result<ObjectInfo, LifecycleError> {
    let target = object_name_for(local, strip_prefix, dest)?;
    let data = bytes::Bytes::from(tokio::fs::read(local).await?);
    let content_type = content_type
        .map(str::to_string)
        .unwrap_or_else(|| mime_guess::from_path(local).first_or_octet_stream().to_string());

    let bucket = target.bucket().name();
    let target_ref = &target;
    let content_type_ref = content_type.as_str();
    let info = executor
        .execute(Operation::Upload, bucket, move || {
            client.upload_object(target_ref, data.clone(), content_type_ref)
        })
        .await
        .map_err(|e| e.into_lifecycle(bucket, Operation::Upload))?;

    info!(object = %target, bytes = info.size_bytes().unwrap_or_default(), "uploaded");
    Ok(info)
}

/// Download one object into `dest_dir`, creating parent directories
#[instrument(skip(client, executor), fields(source = %source))]
pub async fn download_to(
    client: &StorageClient,
    executor: &RetryingExecutor,
    source: &ObjectUri,
    strip_prefix: Option<&str>,
    dest_dir: &Path,
) -> Result<PathBuf, LifecycleError> {
    let local = local_path_for(source, strip_prefix, dest_dir)?;
    let bucket = source.bucket().name();
    let data = executor
        .execute(Operation::Download, bucket, move || client.download_object(source))
        .await
        .map_err(|e| e.into_lifecycle(bucket, Operation::Download))?;

    if let Some(parent) = local.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&local, &data).await?;

    info!(path = %local.display(), bytes = data.len(), "downloaded");
    Ok(local)
}
