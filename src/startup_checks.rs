use crate::{Config, cms::CmsClient};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Template directory does not exist: {0}")]
    TemplateDirectoryMissing(String),

    #[error("Required template missing: {0}")]
    RequiredTemplateMissing(String),

    #[error("Static files directory does not exist")]
    StaticDirectoryMissing,

    #[error("Content API is unreachable: {0}")]
    ContentApiUnreachable(String),
}

pub async fn perform_startup_checks(
    config: &Config,
    client: &CmsClient,
) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let template_dir = &config.templates.directory;
    if !template_dir.exists() {
        errors.push(StartupCheckError::TemplateDirectoryMissing(
            template_dir.display().to_string(),
        ));
    } else {
        info!("Template directory exists: {:?}", template_dir);

        let required_templates = [
            config.posts.index_template.as_str(),
            config.posts.post_template.as_str(),
            config.posts.loading_template.as_str(),
        ];
        for template in required_templates {
            let path = template_dir.join(template);
            if path.exists() {
                info!("Required template found: {:?}", path);
            } else {
                errors.push(StartupCheckError::RequiredTemplateMissing(
                    template.to_string(),
                ));
            }
        }
    }

    if !config.static_files.directory.exists() {
        warn!(
            "Static files directory does not exist: {:?}",
            config.static_files.directory
        );
        errors.push(StartupCheckError::StaticDirectoryMissing);
    } else {
        info!(
            "Static files directory exists: {:?}",
            config.static_files.directory
        );
    }

    match client.ping().await {
        Ok(()) => info!("Content API answered at {}", client.api_url()),
        Err(e) => {
            // The server still starts; refresh tasks keep retrying.
            warn!("Content API check failed: {}", e);
            errors.push(StartupCheckError::ContentApiUnreachable(e.to_string()));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
