use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::database::TargetStore;
use crate::database::models::{HeaderPair, Target, TargetMode};
use crate::schedule::Schedule;
use crate::validation::{
    ValidationResult, validate_curl_command, validate_http_endpoint, validate_target_name,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

fn check(result: ValidationResult) -> Result<(), ServiceError> {
    if result.is_valid {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            result.error.unwrap_or_else(|| "invalid input".to_string()),
        ))
    }
}

/// Creation request for a new target. `mode` is fixed by the variant and
/// cannot change later.
#[derive(Debug, Clone)]
pub enum TargetSpec {
    Url {
        name: String,
        url: String,
        headers: Vec<HeaderPair>,
        schedule: Schedule,
    },
    Curl {
        name: String,
        command: String,
        schedule: Schedule,
    },
}

/// Mutation entry points over the target collection.
///
/// Validation happens before any store write, so a rejected request leaves
/// no partial state. Updates against an id that was deleted concurrently are
/// no-ops, and repeating an update with an unchanged value never rewrites
/// the stored record.
pub struct TargetService {
    store: Arc<dyn TargetStore>,
}

impl TargetService {
    pub fn new(store: Arc<dyn TargetStore>) -> Self {
        Self { store }
    }

    pub async fn list_targets(&self) -> Result<Vec<Target>, ServiceError> {
        Ok(self.store.list().await?)
    }

    pub async fn add_target(&self, spec: TargetSpec) -> Result<Target, ServiceError> {
        let target = match spec {
            TargetSpec::Url { name, url, headers, schedule } => {
                check(validate_target_name(&name))?;
                check(validate_http_endpoint(&url))?;
                Target::new_url(name, url, headers, schedule)
            }
            TargetSpec::Curl { name, command, schedule } => {
                check(validate_target_name(&name))?;
                check(validate_curl_command(&command))?;
                Target::new_curl(name, command, schedule)
            }
        };

        self.store.append(&target).await?;
        info!(target = %target.name, id = %target.id, "target added");
        Ok(target)
    }

    pub async fn update_schedule(&self, id: Uuid, schedule: Schedule) -> Result<(), ServiceError> {
        let Some(mut target) = self.store.get_by_id(id).await? else {
            return Ok(());
        };
        if target.schedule == schedule {
            return Ok(());
        }

        target.schedule = schedule;
        self.store.replace_by_id(id, &target).await?;
        info!(id = %id, schedule = %schedule, "schedule updated");
        Ok(())
    }

    pub async fn update_headers(&self, id: Uuid, headers: Vec<HeaderPair>) -> Result<(), ServiceError> {
        let Some(mut target) = self.store.get_by_id(id).await? else {
            return Ok(());
        };
        if target.mode != TargetMode::Url {
            return Err(ServiceError::Validation(
                "headers can only be set on url-mode targets".to_string(),
            ));
        }
        if target.headers == headers {
            return Ok(());
        }

        target.headers = headers;
        self.store.replace_by_id(id, &target).await?;
        Ok(())
    }

    pub async fn update_curl_command(&self, id: Uuid, command: String) -> Result<(), ServiceError> {
        check(validate_curl_command(&command))?;

        let Some(mut target) = self.store.get_by_id(id).await? else {
            return Ok(());
        };
        if target.mode != TargetMode::Curl {
            return Err(ServiceError::Validation(
                "a curl command can only be set on curl-mode targets".to_string(),
            ));
        }
        if target.curl_command.as_deref() == Some(command.as_str()) {
            return Ok(());
        }

        target.curl_command = Some(command);
        self.store.replace_by_id(id, &target).await?;
        Ok(())
    }

    pub async fn delete_target(&self, id: Uuid) -> Result<(), ServiceError> {
        self.store.delete_by_id(id).await?;
        info!(id = %id, "target deleted");
        Ok(())
    }
}
