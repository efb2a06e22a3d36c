//! Company document templates and similarity search over their embeddings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::Result;
use crate::security::InputValidator;

/// A stored template with its content embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    pub id: String,
    pub company_id: String,
    pub template_name: String,
    /// proposal, report, memo, contract, ...
    pub template_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub embedding: Vec<f32>,
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DocumentTemplate {
    pub fn new(
        id: impl Into<String>,
        company_id: impl Into<String>,
        template_name: impl Into<String>,
        template_type: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            company_id: company_id.into(),
            template_name: template_name.into(),
            template_type: template_type.into(),
            description: None,
            embedding,
            is_active: true,
            tags: Vec::new(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Search options for [`TemplateLibrary::find_similar`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityOptions {
    pub limit: usize,
    /// Minimum cosine similarity, inclusive
    pub threshold: f64,
    pub template_type: Option<String>,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            threshold: 0.7,
            template_type: None,
        }
    }
}

impl SimilarityOptions {
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn template_type(mut self, template_type: impl Into<String>) -> Self {
        self.template_type = Some(template_type.into());
        self
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMatch {
    pub template_id: String,
    pub template_name: String,
    pub template_type: String,
    pub score: f64,
}

/// In-process template store.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: HashMap<String, DocumentTemplate>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a template by id.
    pub fn insert(&mut self, template: DocumentTemplate) -> Option<DocumentTemplate> {
        self.templates.insert(template.id.clone(), template)
    }

    pub fn remove(&mut self, id: &str) -> Option<DocumentTemplate> {
        self.templates.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&DocumentTemplate> {
        self.templates.get(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Ranks the company's active templates by similarity to `query`.
    ///
    /// Hits below the threshold are dropped; ties keep ascending id order.
    #[instrument(skip(self, query), fields(dimensions = query.len()))]
    pub fn find_similar(
        &self,
        query: &[f32],
        company_id: &str,
        options: &SimilarityOptions,
    ) -> Result<Vec<TemplateMatch>> {
        InputValidator::validate_fraction(options.threshold, "threshold")?;

        let mut matches: Vec<TemplateMatch> = self
            .templates
            .values()
            .filter(|t| t.is_active && t.company_id == company_id)
            .filter(|t| {
                options
                    .template_type
                    .as_deref()
                    .map_or(true, |wanted| t.template_type == wanted)
            })
            .map(|t| TemplateMatch {
                template_id: t.id.clone(),
                template_name: t.template_name.clone(),
                template_type: t.template_type.clone(),
                score: cosine_similarity(query, &t.embedding),
            })
            .filter(|m| m.score >= options.threshold)
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.template_id.cmp(&b.template_id))
        });
        matches.truncate(options.limit);

        debug!(company_id, matches = matches.len(), "Template search finished");
        Ok(matches)
    }

    /// Embeds `text` with `provider` and searches with the result.
    pub async fn find_similar_to_text(
        &self,
        provider: &dyn EmbeddingProvider,
        text: &str,
        company_id: &str,
        options: &SimilarityOptions,
    ) -> Result<Vec<TemplateMatch>> {
        let embedding = provider.embed(text).await?;
        self.find_similar(&embedding.vector, company_id, options)
    }
}
