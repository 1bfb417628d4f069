use indoc::formatdoc;
use std::sync::Arc;

use super::regions::region_not_found;
use crate::errors::{ToolError, ToolResult};
use crate::models::directory::{User, UserDraft};
use crate::models::tool::{bind, ParamType, ToolArgs, ToolDefinition, ToolParameter};
use crate::store::DirectoryStore;

/// Lookup and maintenance of users
pub struct UserTools {
    store: Arc<dyn DirectoryStore>,
}

impl UserTools {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    pub fn definitions(self: &Arc<Self>) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "getUsers",
                "List users, optionally filtered by name.",
                bind(self, |tools, args| async move { tools.get_users(args).await }),
            )
            .with_param(ToolParameter::optional(
                "name",
                ParamType::String,
                "Part of the user name to filter by; omit to list everyone",
            )),
            ToolDefinition::new(
                "getUserById",
                "Show the details of the user with the given ID.",
                bind(self, |tools, args| async move { tools.get_user_by_id(args).await }),
            )
            .with_param(user_id("Unique ID of the user to look up")),
            ToolDefinition::new(
                "getUsersByRegion",
                "List the users registered in a region.",
                bind(self, |tools, args| async move { tools.get_users_by_region(args).await }),
            )
            .with_param(ToolParameter::required(
                "regionId",
                ParamType::Integer,
                "Unique ID of the region",
            )),
            ToolDefinition::new(
                "createUser",
                "Register a new user.",
                bind(self, |tools, args| async move { tools.create_user(args).await }),
            )
            .with_param(ToolParameter::required("name", ParamType::String, "Name of the user"))
            .with_param(ToolParameter::required(
                "email",
                ParamType::String,
                "Email address of the user",
            ))
            .with_param(ToolParameter::required(
                "regionId",
                ParamType::Integer,
                "Unique ID of the region the user belongs to",
            )),
            ToolDefinition::new(
                "updateUser",
                "Update a user. Omitted fields keep their current value.",
                bind(self, |tools, args| async move { tools.update_user(args).await }),
            )
            .with_param(user_id("Unique ID of the user to update"))
            .with_param(ToolParameter::optional("name", ParamType::String, "New name"))
            .with_param(ToolParameter::optional("email", ParamType::String, "New email address"))
            .with_param(ToolParameter::optional("regionId", ParamType::Integer, "New region ID")),
            ToolDefinition::new(
                "deleteUser",
                "Delete a user.",
                bind(self, |tools, args| async move { tools.delete_user(args).await }),
            )
            .with_param(user_id("Unique ID of the user to delete")),
        ]
    }

    pub async fn get_users(&self, args: ToolArgs) -> ToolResult<String> {
        let filter = args
            .opt_str("name")?
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let users = self.store.find_users(filter).await?;

        if users.is_empty() {
            return Ok(match filter {
                Some(name) => format!("No users match '{}'.", name),
                None => "No users are registered.".to_string(),
            });
        }

        let mut output = format!("Users found: {}\n\n", users.len());
        for user in &users {
            output.push_str(&format!(
                "- ID: {}, Name: {}, Email: {}, Region: {}\n",
                user.id, user.name, user.email, user.region.name
            ));
        }
        Ok(output)
    }

    pub async fn get_user_by_id(&self, args: ToolArgs) -> ToolResult<String> {
        let user = self.require(args.int("userId")?).await?;
        Ok(format!("User details:\n{}", details(&user)))
    }

    pub async fn get_users_by_region(&self, args: ToolArgs) -> ToolResult<String> {
        let region_id = args.int("regionId")?;
        let region = self
            .store
            .find_region(region_id)
            .await?
            .ok_or_else(|| region_not_found(region_id))?;

        let users = self.store.find_users_by_region(region_id).await?;
        if users.is_empty() {
            return Ok(format!("No users are registered in {}.", region.name));
        }

        let mut output = format!("Users in {}: {}\n\n", region.name, users.len());
        for user in &users {
            output.push_str(&format!("- {} ({})\n", user.name, user.email));
        }
        Ok(output)
    }

    pub async fn create_user(&self, args: ToolArgs) -> ToolResult<String> {
        let name = args.str("name")?.trim();
        let email = args.str("email")?.trim();
        let region_id = args.int("regionId")?;
        if name.is_empty() {
            return Err(ToolError::invalid_argument("User name is required."));
        }
        if email.is_empty() {
            return Err(ToolError::invalid_argument("Email is required."));
        }

        let user = self
            .store
            .create_user(UserDraft::new(name, email, region_id))
            .await
            .map_err(|e| ToolError::from(e).with_context("Failed to create user"))?;
        Ok(format!("User created:\n{}", details(&user)))
    }

    pub async fn update_user(&self, args: ToolArgs) -> ToolResult<String> {
        let current = self.require(args.int("userId")?).await?;

        let mut draft = UserDraft::new(current.name, current.email, current.region.id);
        if let Some(name) = args.opt_str("name")?.map(str::trim) {
            if name.is_empty() {
                return Err(ToolError::invalid_argument("User name must not be blank."));
            }
            draft.name = name.to_string();
        }
        if let Some(email) = args.opt_str("email")?.map(str::trim) {
            if email.is_empty() {
                return Err(ToolError::invalid_argument("Email must not be blank."));
            }
            draft.email = email.to_string();
        }
        if let Some(region_id) = args.opt_int("regionId")? {
            if self.store.find_region(region_id).await?.is_none() {
                return Err(region_not_found(region_id));
            }
            draft.region_id = region_id;
        }

        let user = self
            .store
            .update_user(current.id, draft)
            .await
            .map_err(|e| ToolError::from(e).with_context("Failed to update user"))?
            .ok_or_else(|| user_not_found(current.id))?;
        Ok(format!("User updated:\n{}", details(&user)))
    }

    pub async fn delete_user(&self, args: ToolArgs) -> ToolResult<String> {
        let user = self.require(args.int("userId")?).await?;
        if !self.store.delete_user(user.id).await? {
            return Err(user_not_found(user.id));
        }
        Ok(format!("User deleted: {}", user.name))
    }

    async fn require(&self, id: i64) -> ToolResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }
}

fn details(user: &User) -> String {
    formatdoc! {"
        - ID: {id}
        - Name: {name}
        - Email: {email}
        - Region: {region} (ID: {region_id})",
        id = user.id,
        name = user.name,
        email = user.email,
        region = user.region.name,
        region_id = user.region.id,
    }
}

fn user_not_found(id: i64) -> ToolError {
    ToolError::not_found(format!("User with ID {} was not found.", id))
}

fn user_id(description: &str) -> ToolParameter {
    ToolParameter::required("userId", ParamType::Integer, description)
}
