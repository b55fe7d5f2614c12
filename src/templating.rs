use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Liquid template engine over a directory with `pages/` and `partials/`
/// subdirectories. Template sources are cached and revalidated against
/// file modification times, so edits show up without a restart.
pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(path)
                && cached.modified >= modified
            {
                debug!("Using cached template for {}", path);
                return Ok(cached.content.clone());
            }
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        let mut cache = self.cache.write().await;
        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    /// Builds a parser with every partial from `partials/` compiled in so
    /// templates can `{% include %}` them by file name.
    async fn build_parser(&self) -> Result<liquid::Parser, String> {
        type Partials = liquid::partials::EagerCompiler<liquid::partials::InMemorySource>;

        let mut partials = Partials::empty();
        let partials_dir = self.template_dir.join("partials");

        if let Ok(mut entries) = tokio::fs::read_dir(&partials_dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != "liquid") {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let relative = format!("partials/{}", name);
                let content = self.load_template(&relative).await?;
                partials.add(name, content);
            }
        }

        liquid::ParserBuilder::with_stdlib()
            .partials(partials)
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))
    }

    pub async fn render_template(
        &self,
        name: &str,
        globals: liquid::Object,
    ) -> Result<String, String> {
        let content = self.load_template(name).await?;
        let parser = self.build_parser().await?;

        let template = parser
            .parse(&content)
            .map_err(|e| format!("Failed to parse template {}: {}", name, e))?;

        template
            .render(&globals)
            .map_err(|e| format!("Failed to render template {}: {}", name, e))
    }
}
