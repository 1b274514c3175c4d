//! Template rendering seam.
//!
//! Kaze does not ship a template language. An application plugs one in by
//! implementing [`RenderEngine`]; `Context::render` reads the template file
//! from the configured directory and hands its source to the engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::KazeResult;
use crate::handler::BoxFuture;

/// Where the template being rendered came from.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// Full path of the template file.
    pub file_path: &'a Path,
    /// The configured template directory.
    pub template_dir: &'a Path,
}

/// A template engine.
///
/// # Example
///
/// ```
/// use kaze_core::{BoxFuture, KazeResult, RenderContext, RenderEngine};
///
/// struct Upper;
///
/// impl RenderEngine for Upper {
///     fn render<'a>(
///         &'a self,
///         _rctx: RenderContext<'a>,
///         template: String,
///         _data: Option<serde_json::Value>,
///     ) -> BoxFuture<'a, KazeResult<String>> {
///         Box::pin(async move { Ok(template.to_uppercase()) })
///     }
/// }
/// ```
pub trait RenderEngine: Send + Sync + 'static {
    /// Produces HTML from template source and optional data.
    fn render<'a>(
        &'a self,
        rctx: RenderContext<'a>,
        template: String,
        data: Option<serde_json::Value>,
    ) -> BoxFuture<'a, KazeResult<String>>;
}

/// Returns the template source unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl RenderEngine for Passthrough {
    fn render<'a>(
        &'a self,
        _rctx: RenderContext<'a>,
        template: String,
        _data: Option<serde_json::Value>,
    ) -> BoxFuture<'a, KazeResult<String>> {
        Box::pin(async move { Ok(template) })
    }
}

/// A configured engine plus its template directory and file extension.
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn RenderEngine>,
    template_dir: PathBuf,
    extension: Option<String>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("template_dir", &self.template_dir)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            engine: Arc::new(Passthrough),
            template_dir: PathBuf::new(),
            extension: None,
        }
    }
}

impl Renderer {
    /// Creates a renderer.
    ///
    /// `extension` is appended to template names that are passed to
    /// `render` without one (e.g. `"hbs"` turns `index` into `index.hbs`).
    pub fn new(
        engine: impl RenderEngine,
        template_dir: impl Into<PathBuf>,
        extension: Option<String>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            template_dir: template_dir.into(),
            extension: extension.filter(|e| !e.is_empty()),
        }
    }

    /// Full path for a template name.
    #[must_use]
    pub fn template_path(&self, name: &str) -> PathBuf {
        match &self.extension {
            Some(ext) => self.template_dir.join(format!("{name}.{ext}")),
            None => self.template_dir.join(name),
        }
    }

    /// Reads the template file and renders it.
    pub async fn render(&self, name: &str, data: Option<serde_json::Value>) -> KazeResult<String> {
        let file_path = self.template_path(name);
        let template = tokio::fs::read_to_string(&file_path).await?;
        let rctx = RenderContext {
            file_path: &file_path,
            template_dir: &self.template_dir,
        };
        self.engine.render(rctx, template, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting;

    impl RenderEngine for Greeting {
        fn render<'a>(
            &'a self,
            _rctx: RenderContext<'a>,
            template: String,
            data: Option<serde_json::Value>,
        ) -> BoxFuture<'a, KazeResult<String>> {
            Box::pin(async move {
                let name = data
                    .as_ref()
                    .and_then(|d| d["name"].as_str())
                    .unwrap_or("stranger")
                    .to_string();
                Ok(template.replace("{{name}}", &name))
            })
        }
    }

    #[test]
    fn test_template_path() {
        let renderer = Renderer::new(Passthrough, "views", Some("html".into()));
        assert_eq!(renderer.template_path("index"), PathBuf::from("views/index.html"));

        let renderer = Renderer::new(Passthrough, "views", None);
        assert_eq!(renderer.template_path("index.tpl"), PathBuf::from("views/index.tpl"));
    }

    #[tokio::test]
    async fn test_render_reads_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.tpl"), "<p>Hi {{name}}</p>").unwrap();

        let renderer = Renderer::new(Greeting, dir.path(), Some("tpl".into()));
        let html = renderer
            .render("hello", Some(serde_json::json!({ "name": "Aiko" })))
            .await
            .unwrap();
        assert_eq!(html, "<p>Hi Aiko</p>");
    }

    #[tokio::test]
    async fn test_missing_template_is_io_error() {
        let renderer = Renderer::new(Passthrough, "/nonexistent-kaze-views", None);
        let err = renderer.render("index", None).await.unwrap_err();
        assert_eq!(err.kind(), "IoError");
    }
}
