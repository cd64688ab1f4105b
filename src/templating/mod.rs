//! Tag template rendering
//!
//! Templates are handlebars strings rendered against a [`TemplateContext`]:
//! `{{Name}}`, `{{Tags.STAGE}}`, `{{lookup Tags "aws:cloudformation:logical-id"}}`,
//! `{{StageNames.[0]}}`. Rendering runs in strict mode, so a reference to a
//! tag the service does not carry is a render fault rather than an empty string.

use crate::error::{Result, SyncError};
use crate::service::ServiceIdentity;
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;

/// Fields exposed to tag templates
#[derive(Debug, Serialize)]
pub struct TemplateContext<'a> {
    #[serde(rename = "Name")]
    pub name: String,
    /// Raw provider tags, keyed by the original key
    #[serde(rename = "Tags")]
    pub tags: &'a HashMap<String, String>,
    #[serde(rename = "StageNames")]
    pub stage_names: &'a [String],
}

impl<'a> TemplateContext<'a> {
    pub fn new(identity: &'a ServiceIdentity) -> Self {
        Self {
            name: identity.canonical_name(),
            tags: identity.raw_tag_map(),
            stage_names: identity.stage_names(),
        }
    }
}

/// How rendered tags are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMode {
    /// One output per template; failed templates leave an empty string
    Strict,
    /// Empty outputs are dropped
    #[default]
    Compact,
}

/// Renders tag templates against service identities
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Tags are not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render a single template
    pub fn render_one(&self, template: &str, context: &TemplateContext<'_>) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| SyncError::Template(e.to_string()))
    }

    /// Render every template, keeping index alignment with the input
    ///
    /// A template that fails to parse or render is logged and yields `""`.
    pub fn render(&self, templates: &[String], identity: &ServiceIdentity) -> Vec<String> {
        let context = TemplateContext::new(identity);

        templates
            .iter()
            .enumerate()
            .map(|(index, template)| match self.render_one(template, &context) {
                Ok(rendered) => rendered,
                Err(e) => {
                    tracing::warn!(
                        service = %context.name,
                        template = index,
                        error = %e,
                        "Skipping tag template"
                    );
                    String::new()
                }
            })
            .collect()
    }

    /// Render every template and drop empty results
    pub fn render_compact(&self, templates: &[String], identity: &ServiceIdentity) -> Vec<String> {
        self.render(templates, identity)
            .into_iter()
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// Render using the given collection mode
    pub fn render_tags(
        &self,
        templates: &[String],
        identity: &ServiceIdentity,
        mode: TagMode,
    ) -> Vec<String> {
        match mode {
            TagMode::Strict => self.render(templates, identity),
            TagMode::Compact => self.render_compact(templates, identity),
        }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
