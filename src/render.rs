use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::activity::Activity;
use crate::config::EngineConfig;
use crate::expression::ExpressionEvaluator;
use crate::memory::MemoryView;
use crate::{DialogError, DialogResult};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedMessage {
    Text(String),
    Activity(Activity),
}

impl From<String> for RenderedMessage {
    fn from(text: String) -> Self {
        RenderedMessage::Text(text)
    }
}

/// Turns a template reference into outbound content.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(
        &self,
        template: &str,
        memory: &MemoryView<'_>,
    ) -> DialogResult<RenderedMessage>;
}

/// Renders the template text itself, interpolating `{expression}` segments.
#[derive(Debug, Clone, Default)]
pub struct ExpressionTemplateRenderer {
    evaluator: ExpressionEvaluator,
}

impl ExpressionTemplateRenderer {
    pub fn new(evaluator: ExpressionEvaluator) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl TemplateRenderer for ExpressionTemplateRenderer {
    async fn render(
        &self,
        template: &str,
        memory: &MemoryView<'_>,
    ) -> DialogResult<RenderedMessage> {
        Ok(RenderedMessage::Text(
            self.evaluator.render_template(template, memory)?,
        ))
    }
}

pub type TemplateFunction =
    Arc<dyn Fn(&MemoryView<'_>) -> DialogResult<RenderedMessage> + Send + Sync>;

#[derive(Clone)]
enum DictionaryEntry {
    Text(String),
    Function(TemplateFunction),
}

/// Resolves `@templateId` references through a language -> id -> template table.
///
/// Lookup tries the configured language and then the language-neutral table (`""`).
/// Anything that is not a reference is rendered inline.
#[derive(Clone)]
pub struct DictionaryTemplateRenderer {
    language: String,
    templates: HashMap<String, HashMap<String, DictionaryEntry>>,
    inline: ExpressionTemplateRenderer,
}

impl fmt::Debug for DictionaryTemplateRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryTemplateRenderer")
            .field("language", &self.language)
            .field("languages", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DictionaryTemplateRenderer {
    pub fn new(language: impl Into<String>, evaluator: ExpressionEvaluator) -> Self {
        Self {
            language: language.into(),
            templates: HashMap::new(),
            inline: ExpressionTemplateRenderer::new(evaluator),
        }
    }

    /// Renderer for the configured locale, preloaded with the configured text templates.
    pub fn from_config(config: &EngineConfig, evaluator: ExpressionEvaluator) -> Self {
        config
            .templates
            .iter()
            .flat_map(|(language, templates)| {
                templates
                    .iter()
                    .map(move |(id, text)| (language.clone(), id.clone(), text.clone()))
            })
            .fold(
                Self::new(config.locale.clone(), evaluator),
                |renderer, (language, id, text)| renderer.with_text(language, id, text),
            )
    }

    /// Registers a template whose text is itself an interpolated template.
    pub fn with_text(
        mut self,
        language: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.templates
            .entry(language.into())
            .or_default()
            .insert(id.into(), DictionaryEntry::Text(text.into()));
        self
    }

    pub fn with_function<F>(
        mut self,
        language: impl Into<String>,
        id: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(&MemoryView<'_>) -> DialogResult<RenderedMessage> + Send + Sync + 'static,
    {
        self.templates
            .entry(language.into())
            .or_default()
            .insert(id.into(), DictionaryEntry::Function(Arc::new(f)));
        self
    }

    fn lookup(&self, id: &str) -> Option<&DictionaryEntry> {
        [self.language.as_str(), ""]
            .iter()
            .find_map(|language| self.templates.get(*language).and_then(|t| t.get(id)))
    }
}

#[async_trait]
impl TemplateRenderer for DictionaryTemplateRenderer {
    async fn render(
        &self,
        template: &str,
        memory: &MemoryView<'_>,
    ) -> DialogResult<RenderedMessage> {
        let Some(id) = template.strip_prefix('@') else {
            return self.inline.render(template, memory).await;
        };
        debug!("rendering template {} for {}", id, self.language);
        match self.lookup(id) {
            Some(DictionaryEntry::Text(text)) => self.inline.render(text, memory).await,
            Some(DictionaryEntry::Function(f)) => (**f)(memory),
            None => Err(DialogError::TemplateNotFound {
                language: self.language.clone(),
                template_id: id.to_string(),
            }),
        }
    }
}
