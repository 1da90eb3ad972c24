//! Command handlers for yadisk CLI

use crate::{ConfigAction, MetaAction, PublicAction, TrashAction};
use anyhow::{Context as _, Result};
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tabled::{Table, Tabled};
use yadisk_core::{
    config_exists, get_config_path, load_config, save_config, validate_config, ConfigFile,
    DiskClient, JsonMap, Resource,
};

/// Settings shared by every handler
pub struct Context {
    pub token: Option<String>,
    pub config: ConfigFile,
    pub output: String,
}

impl Context {
    fn client(&self) -> Result<DiskClient> {
        let token = self.token.as_deref().filter(|t| !t.is_empty()).ok_or_else(|| {
            anyhow::anyhow!(
                "No OAuth token provided.\n\
                 Pass --token or set YANDEX_DISK_TOKEN.\n\
                 Get a token with: yadisk auth-url <client-id>"
            )
        })?;
        Ok(DiskClient::with_config(token, &self.config.client_config())?)
    }

    /// Client for calls that never send the token; works without one
    fn public_client(&self) -> Result<DiskClient> {
        let token = self.token.as_deref().unwrap_or_default();
        Ok(DiskClient::with_config(token, &self.config.client_config())?)
    }

    fn json_output(&self) -> bool {
        self.output == "json"
    }
}

/// Flat listings that share one output shape
#[derive(Debug, Clone, Copy)]
pub enum Listing {
    All,
    Recent,
    Published,
}

#[derive(Tabled)]
struct ResourceRow {
    name: String,
    #[tabled(rename = "type")]
    kind: String,
    size: String,
    modified: String,
    public: String,
}

impl From<&Resource> for ResourceRow {
    fn from(r: &Resource) -> Self {
        Self {
            name: if r.is_dir() { format!("{}/", r.name) } else { r.name.clone() },
            kind: r.resource_type.clone(),
            size: if r.is_dir() { "-".to_string() } else { format_bytes(r.size) },
            modified: format_date(&r.modified),
            public: if r.is_published() { "yes".to_string() } else { String::new() },
        }
    }
}

fn print_resources(ctx: &Context, items: &[Resource], total: i64) -> Result<()> {
    if ctx.json_output() {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("  No resources found");
    } else {
        let rows: Vec<ResourceRow> = items.iter().map(ResourceRow::from).collect();
        println!("{}", Table::new(rows));
        if total > items.len() as i64 {
            println!("  Showing {} of {}", items.len(), total);
        }
    }
    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Handle info command
pub async fn handle_info(ctx: &Context) -> Result<()> {
    let info = ctx.client()?.capacity().await?;

    if ctx.json_output() {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Disk information:");
    println!();
    println!("  User: {} ({})", info.user.display_name, info.user.login);
    println!("  Total: {}", format_bytes(info.total_space));
    println!("  Used: {} ({:.2}%)", format_bytes(info.used_space), info.usage_percentage());
    println!("  Free: {}", format_bytes(info.free_space()));
    println!("  Trash: {}", format_bytes(info.trash_size));
    println!("  Max file size: {}", format_bytes(info.max_file_size));
    println!("  Paid: {}", if info.is_paid { "yes" } else { "no" });

    Ok(())
}

/// Handle ls command
pub async fn handle_ls(ctx: &Context, path: &str, limit: u32, offset: u32) -> Result<()> {
    let limit = limit.to_string();
    let offset = offset.to_string();
    let resource = ctx
        .client()?
        .meta(path, [("limit", limit.as_str()), ("offset", offset.as_str())])
        .await?;

    if !resource.is_dir() {
        return print_resources(ctx, std::slice::from_ref(&resource), 1);
    }

    if !ctx.json_output() {
        println!("Contents of {}...", resource.path);
        println!();
    }
    print_resources(ctx, resource.items(), resource.total_items())
}

/// Handle files, recent and published commands
pub async fn handle_listing(ctx: &Context, listing: Listing, limit: u32, offset: u32) -> Result<()> {
    let client = ctx.client()?;
    let list = match listing {
        Listing::All => client.all_files(limit, offset).await?,
        Listing::Recent => client.recent_uploads(limit, offset).await?,
        Listing::Published => client.recent_published(limit, offset).await?,
    };

    print_resources(ctx, &list.items, list.total)
}

/// Handle mkdir command
pub async fn handle_mkdir(ctx: &Context, path: &str) -> Result<()> {
    ctx.client()?.create_folder(path).await?;
    println!("  {} Folder created: {}", style("✅").green(), path);
    Ok(())
}

/// Handle upload command
pub async fn handle_upload(ctx: &Context, file: &str, remote: &str, overwrite: bool) -> Result<()> {
    let client = ctx.client()?;
    let path = Path::new(file);

    if let Ok(meta) = path.metadata() {
        println!("Uploading {} -> {}...", file, remote);
        println!("  Size: {}", format_bytes(meta.len() as i64));
    }

    let pb = spinner(format!("Uploading {}", file));
    let result = client.upload_file(path, remote, overwrite).await;
    pb.finish_and_clear();

    let result = result?;
    if result.success {
        println!("  {} Upload complete", style("✅").green());
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Upload was not accepted by the storage node (HTTP {})",
            result.status
        ))
    }
}

/// Handle download command
pub async fn handle_download(ctx: &Context, remote: &str, dest: &str) -> Result<()> {
    let client = ctx.client()?;

    println!("Downloading {} -> {}...", remote, dest);
    let pb = spinner(format!("Downloading {}", remote));
    let result = client.download_file(remote, dest).await;
    pb.finish_and_clear();
    result?;

    println!("  {} Download complete", style("✅").green());
    Ok(())
}

/// Handle cp and mv commands
pub async fn handle_copy_move(
    ctx: &Context,
    is_move: bool,
    from: &str,
    to: &str,
    overwrite: bool,
) -> Result<()> {
    let client = ctx.client()?;
    if is_move {
        client.move_resource(from, to, overwrite).await?;
        println!("  {} Moved {} -> {}", style("✅").green(), from, to);
    } else {
        client.copy(from, to, overwrite).await?;
        println!("  {} Copied {} -> {}", style("✅").green(), from, to);
    }
    Ok(())
}

/// Handle rm command
pub async fn handle_rm(ctx: &Context, path: &str, permanently: bool) -> Result<()> {
    if permanently {
        println!("{}  Deleting {} permanently", style("⚠️").yellow(), path);
        println!("  This action is IRREVERSIBLE!");
    }

    ctx.client()?.delete(path, permanently).await?;

    let target = if permanently { "deleted" } else { "moved to trash" };
    println!("  {} {} {}", style("✅").green(), path, target);
    Ok(())
}

/// Handle publish and unpublish commands
pub async fn handle_publish(ctx: &Context, path: &str, publish: bool) -> Result<()> {
    let client = ctx.client()?;

    if !publish {
        client.unpublish(path).await?;
        println!("  {} {} is no longer public", style("✅").green(), path);
        return Ok(());
    }

    client.publish(path).await?;
    // The publish answer is only a link; fetch the resource for its URL
    let resource = client.meta(path, [("fields", "public_url,public_key")]).await?;

    println!("  {} {} published", style("✅").green(), path);
    if !resource.public_url.is_empty() {
        println!("  URL: {}", resource.public_url);
    }
    println!("  Key: {}", resource.public_key);
    Ok(())
}

/// Parse a CLI value as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Handle meta commands
pub async fn handle_meta(ctx: &Context, action: MetaAction) -> Result<()> {
    let client = ctx.client()?;

    match action {
        MetaAction::Show { path } => {
            let resource = client.meta(&path, [("limit", "0")]).await?;
            println!("{}", serde_json::to_string_pretty(&resource)?);
        }
        MetaAction::Set { path, key, value } => {
            let mut props = JsonMap::new();
            props.insert(key.clone(), parse_value(&value));

            let resource = client.add_meta(&path, &props).await?;
            println!("  {} {} updated", style("✅").green(), resource.path);
            println!(
                "{}",
                serde_json::to_string_pretty(&resource.custom_properties)?
            );
        }
    }

    Ok(())
}

/// Handle public commands
pub async fn handle_public(ctx: &Context, action: PublicAction) -> Result<()> {
    match action {
        PublicAction::Info { public_key } => {
            let resource = ctx.client()?.public_meta(&public_key, [("limit", "100")]).await?;
            if ctx.json_output() {
                println!("{}", serde_json::to_string_pretty(&resource)?);
                return Ok(());
            }

            println!("  Name: {}", resource.name);
            println!("  Type: {}", resource.resource_type);
            if resource.is_file() {
                println!("  Size: {}", format_bytes(resource.size));
            }
            println!("  Owner: {}", resource.owner.display_name);
            println!("  Modified: {}", format_date(&resource.modified));

            if resource.is_dir() {
                println!();
                print_resources(ctx, resource.items(), resource.total_items())?;
            }
        }
        PublicAction::Download { public_key, dest, path } => {
            println!("Downloading public resource -> {}...", dest);
            let pb = spinner("Downloading public resource".to_string());
            let result = ctx
                .public_client()?
                .download_public_resource(&public_key, &dest, path.as_deref())
                .await;
            pb.finish_and_clear();
            result?;
            println!("  {} Download complete", style("✅").green());
        }
        PublicAction::Save { public_key, name, path } => {
            ctx.client()?
                .save_public_resource(&public_key, name.as_deref(), path.as_deref())
                .await?;
            println!("  {} Saved to your disk", style("✅").green());
        }
        PublicAction::Settings { path, allow_address_access } => {
            let settings = ctx
                .client()?
                .public_settings(&path, allow_address_access)
                .await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

/// Handle trash commands
pub async fn handle_trash(ctx: &Context, action: TrashAction) -> Result<()> {
    let client = ctx.client()?;

    match action {
        TrashAction::Ls { path, limit, offset } => {
            let trash = client.trash(&path, limit, offset).await?;
            if trash.is_dir() {
                print_resources(ctx, trash.items(), trash.total_items())?;
            } else {
                print_resources(ctx, std::slice::from_ref(&trash), 1)?;
            }
        }
        TrashAction::Restore { path, name, overwrite } => {
            client
                .restore_from_trash(&path, name.as_deref(), overwrite)
                .await?;
            println!("  {} Restored {}", style("✅").green(), path);
        }
        TrashAction::Clear { path } => {
            match &path {
                Some(p) => println!("{}  Removing {} from the trash", style("⚠️").yellow(), p),
                None => println!("{}  Emptying the trash", style("⚠️").yellow()),
            }
            println!("  This action is IRREVERSIBLE!");

            client.clear_trash(path.as_deref()).await?;
            println!("  {} Done", style("✅").green());
        }
    }

    Ok(())
}

/// Handle import command
pub async fn handle_import(ctx: &Context, url: &str, remote: &str, disable_redirects: bool) -> Result<()> {
    let op = ctx
        .client()?
        .upload_from_url(url, remote, disable_redirects)
        .await?;

    println!("  {} Import started: {} -> {}", style("✅").green(), url, remote);
    match op.id() {
        Some(id) => println!("  Check progress with: yadisk operation {}", id),
        None => println!("  Operation: {}", op.href),
    }
    Ok(())
}

/// Handle operation command
pub async fn handle_operation(ctx: &Context, id: &str) -> Result<()> {
    let op = ctx.client()?.operation_status(id).await?;

    if ctx.json_output() {
        println!("{}", serde_json::to_string_pretty(&op)?);
    } else {
        println!("  Operation {}: {}", id, format_status(&op.status));
    }
    Ok(())
}

/// Format operation status with emoji
fn format_status(status: &str) -> String {
    match status {
        "success" => "✅ Success".to_string(),
        "failed" => "❌ Failed".to_string(),
        "in-progress" => "⏳ In progress".to_string(),
        _ => status.to_string(),
    }
}

/// Handle config commands
pub async fn handle_config(ctx: &Context, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = &ctx.config;
            println!("Current configuration:");
            println!();
            println!("API:");
            println!("  Base URL: {}", config.api.base_url);
            println!("  Timeout: {}s", config.api.timeout);
            println!("  Connect timeout: {}s", config.api.connect_timeout);
            println!(
                "  TLS verification: {}",
                if config.api.accept_invalid_certs { "DISABLED" } else { "enabled" }
            );
            println!();
            println!("Session:");
            println!(
                "  Token: {}",
                if ctx.token.is_some() { "provided" } else { "not set" }
            );
            println!("  Output: {}", ctx.output);
            Ok(())
        }
        ConfigAction::Init { force } => {
            if config_exists() && !force {
                return Err(anyhow::anyhow!(
                    "Configuration already exists at {}.\n\
                     Use --force to replace it.",
                    get_config_path()?.display()
                ));
            }

            let config = ConfigFile {
                logging: Some(Default::default()),
                output: Some(Default::default()),
                ..ConfigFile::default()
            };
            let path = save_config(&config)?;
            println!("  {} Configuration written to {}", style("✅").green(), path.display());
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", get_config_path()?.display());
            Ok(())
        }
        ConfigAction::Validate => {
            println!("Validating configuration...");
            let config = load_config().context("Cannot load configuration (run 'yadisk config init')")?;
            validate_config(&config)?;
            println!("  {} Configuration valid", style("✅").green());
            Ok(())
        }
    }
}

/// Format ISO date string to readable format
fn format_date(iso_date: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(iso_date) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => iso_date.to_string(),
    }
}

/// Format bytes to human-readable size
fn format_bytes(bytes: i64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size.abs() >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Handle shell completion generation
pub async fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    use std::io;

    let clap_shell = match shell {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" | "pwsh" => ClapShell::PowerShell,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported shell: {}\nSupported shells: bash, zsh, fish, elvish, powershell",
                shell
            ));
        }
    };

    generate(clap_shell, cmd, "yadisk", &mut io::stdout());
    Ok(())
}
