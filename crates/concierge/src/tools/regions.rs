use indoc::formatdoc;
use std::sync::Arc;

use crate::errors::{ToolError, ToolResult};
use crate::models::directory::Region;
use crate::models::tool::{bind, ParamType, ToolArgs, ToolDefinition, ToolParameter};
use crate::store::DirectoryStore;

/// Lookup and maintenance of regions
pub struct RegionTools {
    store: Arc<dyn DirectoryStore>,
}

impl RegionTools {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    pub fn definitions(self: &Arc<Self>) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "getRegions",
                "List every registered region.",
                bind(self, |tools, args| async move { tools.get_regions(args).await }),
            ),
            ToolDefinition::new(
                "getRegionById",
                "Show the details of the region with the given ID.",
                bind(self, |tools, args| async move { tools.get_region_by_id(args).await }),
            )
            .with_param(region_id("Unique ID of the region to look up")),
            ToolDefinition::new(
                "getRegionByName",
                "Find a region by its name.",
                bind(self, |tools, args| async move { tools.get_region_by_name(args).await }),
            )
            .with_param(region_name("Name of the region to look up")),
            ToolDefinition::new(
                "createRegion",
                "Create a new region.",
                bind(self, |tools, args| async move { tools.create_region(args).await }),
            )
            .with_param(region_name("Name of the region to create")),
            ToolDefinition::new(
                "updateRegion",
                "Rename an existing region.",
                bind(self, |tools, args| async move { tools.update_region(args).await }),
            )
            .with_param(region_id("Unique ID of the region to update"))
            .with_param(region_name("New name of the region")),
            ToolDefinition::new(
                "deleteRegion",
                "Delete a region. Regions that still have users cannot be deleted.",
                bind(self, |tools, args| async move { tools.delete_region(args).await }),
            )
            .with_param(region_id("Unique ID of the region to delete")),
        ]
    }

    pub async fn get_regions(&self, _args: ToolArgs) -> ToolResult<String> {
        let regions = self.store.find_regions().await?;
        if regions.is_empty() {
            return Ok("No regions are registered.".to_string());
        }

        let mut output = format!("Registered regions: {}\n\n", regions.len());
        for region in &regions {
            output.push_str(&format!("- ID: {}, Name: {}\n", region.id, region.name));
        }
        Ok(output)
    }

    pub async fn get_region_by_id(&self, args: ToolArgs) -> ToolResult<String> {
        let id = args.int("regionId")?;
        let region = self.require(id).await?;
        self.describe(&region).await
    }

    pub async fn get_region_by_name(&self, args: ToolArgs) -> ToolResult<String> {
        let name = args.str("regionName")?.trim();
        if name.is_empty() {
            return Err(ToolError::invalid_argument("Please provide a region name."));
        }

        let region = self
            .store
            .find_region_by_name(name)
            .await?
            .ok_or_else(|| ToolError::not_found(format!("Region '{}' was not found.", name)))?;
        self.describe(&region).await
    }

    pub async fn create_region(&self, args: ToolArgs) -> ToolResult<String> {
        let name = required_name(&args)?;
        let region = self
            .store
            .create_region(name)
            .await
            .map_err(|e| ToolError::from(e).with_context("Failed to create region"))?;
        Ok(format!("Region created: {} (ID: {})", region.name, region.id))
    }

    pub async fn update_region(&self, args: ToolArgs) -> ToolResult<String> {
        let id = args.int("regionId")?;
        let name = required_name(&args)?;
        let region = self
            .store
            .update_region(id, name)
            .await
            .map_err(|e| ToolError::from(e).with_context("Failed to update region"))?
            .ok_or_else(|| region_not_found(id))?;
        Ok(format!("Region updated: {} (ID: {})", region.name, region.id))
    }

    /// Refuses before touching the store when users still live in the region
    pub async fn delete_region(&self, args: ToolArgs) -> ToolResult<String> {
        let id = args.int("regionId")?;
        let region = self.require(id).await?;

        let users = self.store.find_users_by_region(id).await?;
        if !users.is_empty() {
            return Err(ToolError::conflict(format!(
                "Region {} (ID: {}) has {} registered user(s) and cannot be deleted.",
                region.name,
                region.id,
                users.len()
            )));
        }

        if !self.store.delete_region(id).await? {
            return Err(region_not_found(id));
        }
        Ok(format!("Region deleted: {}", region.name))
    }

    async fn require(&self, id: i64) -> ToolResult<Region> {
        self.store
            .find_region(id)
            .await?
            .ok_or_else(|| region_not_found(id))
    }

    async fn describe(&self, region: &Region) -> ToolResult<String> {
        let users = self.store.find_users_by_region(region.id).await?;
        Ok(formatdoc! {"
            Region details:
            - ID: {id}
            - Name: {name}
            - Registered users: {users}",
            id = region.id,
            name = region.name,
            users = users.len(),
        })
    }
}

pub(crate) fn region_not_found(id: i64) -> ToolError {
    ToolError::not_found(format!("Region with ID {} was not found.", id))
}

fn required_name(args: &ToolArgs) -> ToolResult<&str> {
    let name = args.str("regionName")?.trim();
    if name.is_empty() {
        return Err(ToolError::invalid_argument("Region name is required."));
    }
    Ok(name)
}

fn region_id(description: &str) -> ToolParameter {
    ToolParameter::required("regionId", ParamType::Integer, description)
}

fn region_name(description: &str) -> ToolParameter {
    ToolParameter::required("regionName", ParamType::String, description)
}
