//! Template service
//!
//! Catalog reads and admin-gated catalog writes. Template reads are
//! non-critical: a failing fetch degrades to an empty list with a warning
//! instead of taking the operator's session down.

use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::TemplateRepository;
use crate::models::{CreateTemplateInput, Period, ProductTemplate, User};

/// Error types for template operations
#[derive(Debug, thiserror::Error)]
pub enum TemplateServiceError {
    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Template does not exist
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Acting user lacks the required capability
    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Template service
pub struct TemplateService {
    repo: Arc<dyn TemplateRepository>,
}

impl TemplateService {
    /// Create a new template service
    pub fn new(repo: Arc<dyn TemplateRepository>) -> Self {
        Self { repo }
    }

    /// List all templates, degrading to empty on repository failure
    pub async fn list(&self) -> Vec<ProductTemplate> {
        match self.repo.list().await {
            Ok(templates) => templates,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch templates, returning empty catalog");
                Vec::new()
            }
        }
    }

    /// Templates applicable to the given check period
    pub async fn list_for_period(&self, period: Period) -> Vec<ProductTemplate> {
        self.list()
            .await
            .into_iter()
            .filter(|t| t.applies_to(period))
            .collect()
    }

    /// Create a catalog template (admin only)
    pub async fn create(
        &self,
        input: CreateTemplateInput,
        acting_user: &User,
    ) -> Result<ProductTemplate, TemplateServiceError> {
        if !acting_user.can_manage_templates() {
            return Err(TemplateServiceError::Forbidden(
                "only admins may manage the catalog".to_string(),
            ));
        }

        if input.name.trim().is_empty() {
            return Err(TemplateServiceError::Validation(
                "template name must not be empty".to_string(),
            ));
        }
        if input.shelf_life_days < 0 {
            return Err(TemplateServiceError::Validation(
                "shelf life must not be negative".to_string(),
            ));
        }
        if input.periods.is_empty() {
            return Err(TemplateServiceError::Validation(
                "at least one check period is required".to_string(),
            ));
        }

        let template = ProductTemplate {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            image_url: input.image_url,
            shelf_life_days: input.shelf_life_days,
            periods: input.periods,
            group: input.group,
        };

        self.repo.create(&template).await?;
        Ok(template)
    }

    /// Delete a catalog template (admin only).
    ///
    /// Records snapshot the template data they need, so deleting a
    /// template never touches existing records.
    pub async fn delete(
        &self,
        id: &str,
        acting_user: &User,
    ) -> Result<(), TemplateServiceError> {
        if !acting_user.can_manage_templates() {
            return Err(TemplateServiceError::Forbidden(
                "only admins may manage the catalog".to_string(),
            ));
        }

        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(TemplateServiceError::NotFound(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::MemoryTemplateRepository;
    use crate::models::{ProductGroup, UserRole};
    use anyhow::anyhow;
    use async_trait::async_trait;

    fn admin() -> User {
        User {
            id: "a1".to_string(),
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
            name: "Admin".to_string(),
            store: "Downtown".to_string(),
            approved: true,
        }
    }

    fn operator() -> User {
        User {
            role: UserRole::Operator,
            ..admin()
        }
    }

    fn input(name: &str, periods: Vec<Period>) -> CreateTemplateInput {
        CreateTemplateInput {
            name: name.to_string(),
            image_url: String::new(),
            shelf_life_days: 3,
            periods,
            group: ProductGroup::Fresh,
        }
    }

    struct FailingRepo;

    #[async_trait]
    impl TemplateRepository for FailingRepo {
        async fn list(&self) -> anyhow::Result<Vec<ProductTemplate>> {
            Err(anyhow!("connection refused"))
        }
        async fn get(&self, _id: &str) -> anyhow::Result<Option<ProductTemplate>> {
            Err(anyhow!("connection refused"))
        }
        async fn create(&self, _template: &ProductTemplate) -> anyhow::Result<()> {
            Err(anyhow!("connection refused"))
        }
        async fn delete(&self, _id: &str) -> anyhow::Result<bool> {
            Err(anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_create_and_filter_by_period() {
        let service = TemplateService::new(Arc::new(MemoryTemplateRepository::new()));
        service
            .create(input("Milk", vec![Period::Opening]), &admin())
            .await
            .unwrap();
        service
            .create(input("Bread", vec![Period::Closing]), &admin())
            .await
            .unwrap();

        let opening = service.list_for_period(Period::Opening).await;
        assert_eq!(opening.len(), 1);
        assert_eq!(opening[0].name, "Milk");
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let service = TemplateService::new(Arc::new(MemoryTemplateRepository::new()));
        let err = service
            .create(input("Milk", vec![Period::Opening]), &operator())
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let service = TemplateService::new(Arc::new(MemoryTemplateRepository::new()));

        let err = service
            .create(input("  ", vec![Period::Opening]), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateServiceError::Validation(_)));

        let err = service.create(input("Milk", vec![]), &admin()).await.unwrap_err();
        assert!(matches!(err, TemplateServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_distinguishes_forbidden_from_not_found() {
        let service = TemplateService::new(Arc::new(MemoryTemplateRepository::new()));
        let template = service
            .create(input("Milk", vec![Period::Opening]), &admin())
            .await
            .unwrap();

        let err = service.delete(&template.id, &operator()).await.unwrap_err();
        assert!(matches!(err, TemplateServiceError::Forbidden(_)));

        service.delete(&template.id, &admin()).await.unwrap();
        let err = service.delete(&template.id, &admin()).await.unwrap_err();
        assert!(matches!(err, TemplateServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_degrades_to_empty_on_failure() {
        let service = TemplateService::new(Arc::new(FailingRepo));
        assert!(service.list().await.is_empty());
        assert!(service.list_for_period(Period::Opening).await.is_empty());
    }
}
