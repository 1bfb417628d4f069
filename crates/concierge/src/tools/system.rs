use indoc::formatdoc;
use std::sync::Arc;

use super::datetime::now_timestamp;
use crate::errors::ToolResult;
use crate::models::tool::{bind, ToolArgs, ToolDefinition};
use crate::store::DirectoryStore;

pub struct SystemTools {
    store: Arc<dyn DirectoryStore>,
}

impl SystemTools {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    pub fn definitions(self: &Arc<Self>) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "getSystemStatus",
            "Report the number of registered users and regions and the server state.",
            bind(self, |tools, args| async move { tools.get_system_status(args).await }),
        )]
    }

    pub async fn get_system_status(&self, _args: ToolArgs) -> ToolResult<String> {
        let users = self.store.find_users(None).await?.len();
        let regions = self.store.find_regions().await?.len();

        Ok(formatdoc! {"
            System status:
            - Total users: {users}
            - Total regions: {regions}
            - Server state: OK
            - Current time: {time}",
            time = now_timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::directory::UserDraft;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_status_counts_directory() {
        let store = Arc::new(InMemoryStore::new());
        let region = store.create_region("Gwangju").await.unwrap();
        store
            .create_user(UserDraft::new("Jung", "jung@example.com", region.id))
            .await
            .unwrap();
        store.create_region("Suwon").await.unwrap();

        let output = SystemTools::new(store)
            .get_system_status(ToolArgs::new())
            .await
            .unwrap();
        assert!(output.starts_with(
            "System status:\n- Total users: 1\n- Total regions: 2\n- Server state: OK\n- Current time: "
        ));
    }
}
