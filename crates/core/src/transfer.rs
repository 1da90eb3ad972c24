//! Two-phase uploads and downloads
//!
//! The API never carries file bytes itself. Phase one asks it for a
//! [`Link`] to a storage node; phase two moves the bytes against that link.
//! A failure in either phase ends the call, and an interrupted transfer has
//! to start again from phase one.

use crate::client::{ApiRequest, DiskClient, QueryParams};
use crate::error::{Error, Result};
use crate::models::{Link, UploadResult};
use futures::StreamExt;
use reqwest::{Response, StatusCode};
use std::io::{self, ErrorKind};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

impl DiskClient {
    /// Upload a local file to `remote_path`.
    ///
    /// Returns the storage node's status even when it is not `201 Created`;
    /// inspect [`UploadResult::success`].
    pub async fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
        overwrite: bool,
    ) -> Result<UploadResult> {
        let local_path = local_path.as_ref();

        // Read before asking for a link so a bad source does not burn an upload slot
        let content = read_source(local_path).await?;
        let size = content.len();

        let request = ApiRequest::get("/resources/upload").query(
            QueryParams::new()
                .set("path", remote_path)
                .set("overwrite", overwrite),
        );
        let link = self.transfer_link(request, remote_path).await?;

        debug!(remote = %remote_path, bytes = size, "Uploading file content");

        let response = self
            .authorize(self.http().put(&link.href))
            .body(content)
            .send()
            .await?;

        let result = UploadResult::from_status(response.status().as_u16());
        if result.success {
            info!(remote = %remote_path, bytes = size, "File uploaded");
        } else {
            warn!(remote = %remote_path, status = result.status, "Upload was not accepted");
        }

        Ok(result)
    }

    /// Download `remote_path` to `local_path`, creating parent directories.
    pub async fn download_file(
        &self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
    ) -> Result<()> {
        let request =
            ApiRequest::get("/resources/download").query(QueryParams::new().set("path", remote_path));
        let link = self.transfer_link(request, remote_path).await?;

        let response = self.authorize(self.http().get(&link.href)).send().await?;
        let written = save_response(response, local_path.as_ref()).await?;

        info!(remote = %remote_path, bytes = written, "File downloaded");
        Ok(())
    }

    /// Download a published resource by its public key.
    ///
    /// `path` selects a file inside a published folder. Neither request
    /// carries the owner's token; the returned link is pre-authorized.
    pub async fn download_public_resource(
        &self,
        public_key: &str,
        local_path: impl AsRef<Path>,
        path: Option<&str>,
    ) -> Result<()> {
        let request = ApiRequest::get("/public/resources/download")
            .query(
                QueryParams::new()
                    .set("public_key", public_key)
                    .set_opt("path", path),
            )
            .anonymous();
        let link = self.transfer_link(request, "public resource").await?;

        let response = self.http().get(&link.href).send().await?;
        let written = save_response(response, local_path.as_ref()).await?;

        info!(bytes = written, "Public resource downloaded");
        Ok(())
    }

    /// Phase one: obtain a non-empty transfer link
    async fn transfer_link(&self, request: ApiRequest, target: &str) -> Result<Link> {
        let link: Link = self.fetch(request).await?;
        if link.href.is_empty() {
            return Err(Error::MissingTransferUrl(target.to_string()));
        }
        if link.templated {
            debug!(href = %link.href, "Transfer link is templated, using as-is");
        }
        Ok(link)
    }
}

/// Load an upload source; it must be an existing, readable regular file
async fn read_source(path: &Path) -> Result<Vec<u8>> {
    let source_read = |source| Error::SourceRead {
        path: path.to_path_buf(),
        source,
    };

    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(source_read(io::Error::new(
                ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::SourceNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(source_read(e)),
    }

    fs::read(path).await.map_err(source_read)
}

/// Phase two of a download: check the status and stream the body to disk.
///
/// Only local file-system failures map to [`Error::DestinationWrite`]; a
/// broken body stream stays a transport error.
async fn save_response(response: Response, dest: &Path) -> Result<u64> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::TransferStatus {
            status: status.as_u16(),
        });
    }

    let write_err = |source| Error::DestinationWrite {
        path: dest.to_path_buf(),
        source,
    };

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut file = File::create(dest).await.map_err(write_err)?;
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(write_err)?;
    Ok(written)
}
