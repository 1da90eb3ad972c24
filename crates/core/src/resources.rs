//! Disk REST endpoints
//!
//! Each method fixes the verb and path and passes its arguments through as
//! query parameters or a JSON body.

use crate::client::{ApiRequest, DiskClient, QueryParams};
use crate::error::{Error, Result};
use crate::models::{DiskInfo, FilesList, JsonMap, Operation, Resource};
use serde_json::json;

/// Limit/offset query shared by the listing endpoints
fn page(limit: u32, offset: u32) -> QueryParams {
    QueryParams::new().set("limit", limit).set("offset", offset)
}

impl DiskClient {
    /// Disk capacity, usage and owner
    pub async fn capacity(&self) -> Result<DiskInfo> {
        self.fetch(ApiRequest::get("/")).await
    }

    /// Metadata of a file or folder.
    ///
    /// `params` are passed through verbatim (`limit`, `offset`, `sort`,
    /// `fields`, `preview_size`...).
    pub async fn meta<'a>(
        &self,
        path: &str,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Resource> {
        let query = QueryParams::new().set("path", path).extend(params);
        self.fetch(ApiRequest::get("/resources").query(query)).await
    }

    /// Add or replace custom properties on a resource
    pub async fn add_meta(&self, path: &str, custom_properties: &JsonMap) -> Result<Resource> {
        let body = json!({
            "path": path,
            "custom_properties": custom_properties,
        });
        self.fetch(ApiRequest::patch("/resources").json(&body)?).await
    }

    /// Flat list of every file on the disk
    pub async fn all_files(&self, limit: u32, offset: u32) -> Result<FilesList> {
        self.fetch(ApiRequest::get("/resources/files").query(page(limit, offset)))
            .await
    }

    /// Most recently uploaded files
    pub async fn recent_uploads(&self, limit: u32, offset: u32) -> Result<FilesList> {
        self.fetch(ApiRequest::get("/resources/last-uploaded").query(page(limit, offset)))
            .await
    }

    /// Published resources
    pub async fn recent_published(&self, limit: u32, offset: u32) -> Result<FilesList> {
        self.fetch(ApiRequest::get("/resources/public").query(page(limit, offset)))
            .await
    }

    /// Create a folder; fails if the parent does not exist
    pub async fn create_folder(&self, path: &str) -> Result<Resource> {
        let query = QueryParams::new().set("path", path);
        self.fetch(ApiRequest::put("/resources").query(query)).await
    }

    pub async fn copy(&self, from: &str, to: &str, overwrite: bool) -> Result<Resource> {
        let query = QueryParams::new()
            .set("from", from)
            .set("path", to)
            .set("overwrite", overwrite);
        self.fetch(ApiRequest::post("/resources/copy").query(query)).await
    }

    /// Move or rename a resource
    pub async fn move_resource(&self, from: &str, to: &str, overwrite: bool) -> Result<Resource> {
        let query = QueryParams::new()
            .set("from", from)
            .set("path", to)
            .set("overwrite", overwrite);
        self.fetch(ApiRequest::post("/resources/move").query(query)).await
    }

    /// Delete a resource, into the trash unless `permanently` is set
    pub async fn delete(&self, path: &str, permanently: bool) -> Result<()> {
        let query = QueryParams::new()
            .set("path", path)
            .set("permanently", permanently);
        self.dispatch(ApiRequest::delete("/resources").query(query)).await?;
        Ok(())
    }

    pub async fn publish(&self, path: &str) -> Result<Resource> {
        let query = QueryParams::new().set("path", path);
        self.fetch(ApiRequest::put("/resources/publish").query(query)).await
    }

    pub async fn unpublish(&self, path: &str) -> Result<Resource> {
        let query = QueryParams::new().set("path", path);
        self.fetch(ApiRequest::put("/resources/unpublish").query(query)).await
    }

    // === Public resources ===

    /// Metadata of a published resource.
    ///
    /// Carries the caller's token so resources restricted to signed-in or
    /// organization users resolve too.
    pub async fn public_meta<'a>(
        &self,
        public_key: &str,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Resource> {
        let query = QueryParams::new().set("public_key", public_key).extend(params);
        self.fetch(ApiRequest::get("/public/resources").query(query)).await
    }

    /// Copy a published resource into the caller's Downloads folder, or to `path`
    pub async fn save_public_resource(
        &self,
        public_key: &str,
        name: Option<&str>,
        path: Option<&str>,
    ) -> Result<Resource> {
        let query = QueryParams::new()
            .set("public_key", public_key)
            .set_opt("name", name)
            .set_opt("path", path);
        self.fetch(ApiRequest::post("/public/resources/save").query(query))
            .await
    }

    /// Settings the caller is allowed to change on published resources
    pub async fn available_public_settings(&self) -> Result<JsonMap> {
        self.fetch(ApiRequest::get("/public/resources/public-settings/available"))
            .await
    }

    pub async fn public_settings(&self, path: &str, allow_address_access: bool) -> Result<JsonMap> {
        let query = QueryParams::new()
            .set("path", path)
            .set_flag("allow_address_access", allow_address_access);
        self.fetch(ApiRequest::get("/public/resources/public-settings").query(query))
            .await
    }

    pub async fn change_public_settings(&self, path: &str, settings: &JsonMap) -> Result<JsonMap> {
        let query = QueryParams::new().set("path", path);
        self.fetch(ApiRequest::put("/resources/public").query(query).json(settings)?)
            .await
    }

    // === Asynchronous operations ===

    /// Ask the server to fetch `url` into `path`; poll the returned operation
    pub async fn upload_from_url(
        &self,
        url: &str,
        path: &str,
        disable_redirects: bool,
    ) -> Result<Operation> {
        let query = QueryParams::new()
            .set("url", url)
            .set("path", path)
            .set_flag("disable_redirects", disable_redirects);
        self.fetch(ApiRequest::post("/resources/upload").query(query)).await
    }

    /// Status of an asynchronous operation; `operation_id` is a single path segment
    pub async fn operation_status(&self, operation_id: &str) -> Result<Operation> {
        let reserved = |c: char| matches!(c, '/' | '?' | '#' | '%');
        if operation_id.is_empty() || operation_id.contains(reserved) {
            return Err(Error::InvalidInput(format!(
                "Invalid operation id '{}'",
                operation_id
            )));
        }
        self.fetch(ApiRequest::get(format!("/operations/{}", operation_id)))
            .await
    }

    // === Trash ===

    /// Trash contents; `path` is `trash:/` for the root
    pub async fn trash(&self, path: &str, limit: u32, offset: u32) -> Result<Resource> {
        let query = page(limit, offset).set("path", path);
        self.fetch(ApiRequest::get("/trash/resources").query(query)).await
    }

    pub async fn restore_from_trash(
        &self,
        path: &str,
        name: Option<&str>,
        overwrite: bool,
    ) -> Result<Resource> {
        let query = QueryParams::new()
            .set("path", path)
            .set_opt("name", name)
            .set_flag("overwrite", overwrite);
        self.fetch(ApiRequest::put("/trash/resources/restore").query(query))
            .await
    }

    /// Empty the trash, or remove a single entry from it
    pub async fn clear_trash(&self, path: Option<&str>) -> Result<()> {
        let query = QueryParams::new().set_opt("path", path);
        self.dispatch(ApiRequest::delete("/trash/resources").query(query))
            .await?;
        Ok(())
    }

    // === Organization administration ===

    pub async fn public_resources_owned_by(
        &self,
        user_id: &str,
        org_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<FilesList> {
        let query = page(limit, offset)
            .set("user_id", user_id)
            .set("org_id", org_id);
        self.fetch(ApiRequest::get("/public/resources/admin/public-resources").query(query))
            .await
    }

    /// Published resources a user can open; continue with `iteration_key`
    pub async fn public_resources_accessible_by(
        &self,
        user_id: &str,
        org_id: &str,
        include_group_access: bool,
        limit: u32,
        iteration_key: Option<&str>,
    ) -> Result<FilesList> {
        let query = QueryParams::new()
            .set("user_id", user_id)
            .set("org_id", org_id)
            .set("limit", limit)
            .set_flag("include_group_access", include_group_access)
            .set_opt("iteration_key", iteration_key);
        self.fetch(ApiRequest::get("/public/resources/admin/accessible-resources").query(query))
            .await
    }

    /// Force-unpublish a resource owned by a member of the organization
    pub async fn admin_unpublish(&self, public_key: &str, user_id: &str, org_id: &str) -> Result<()> {
        let query = QueryParams::new()
            .set("public_key", public_key)
            .set("user_id", user_id)
            .set("org_id", org_id);
        self.dispatch(ApiRequest::put("/public/resources/admin/unpublish").query(query))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query() {
        let query = page(20, 40);
        assert_eq!(query.get("limit"), Some("20"));
        assert_eq!(query.get("offset"), Some("40"));
    }
}
