//! Template management handlers.

use std::collections::HashMap;

use lorekeeper_core::clock::Clock;
use lorekeeper_core::error::DomainError;
use uuid::Uuid;

use crate::application::render::render_prompt;
use crate::domain::{ProposalTemplate, TemplateDraft};
use crate::store::TemplateStore;

/// Creates a template from a draft.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the draft lacks a name, an entity
/// kind, or a prompt body.
pub async fn create_template(
    draft: TemplateDraft,
    clock: &dyn Clock,
    store: &dyn TemplateStore,
) -> Result<ProposalTemplate, DomainError> {
    let name = draft
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| DomainError::Validation("template name is required".to_owned()))?;
    let entity_kind = draft
        .entity_kind
        .ok_or_else(|| DomainError::Validation("template entity type is required".to_owned()))?;
    let prompt_template = draft
        .prompt_template
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| DomainError::Validation("prompt template is required".to_owned()))?;

    let template = ProposalTemplate {
        id: Uuid::new_v4(),
        name,
        description: draft.description.unwrap_or_default(),
        entity_kind,
        prompt_template,
        system_prompt: draft.system_prompt,
        default_model: draft.default_model,
        required_context: draft.required_context.unwrap_or(false),
        created_at: clock.now(),
    };

    store.insert(&template).await?;
    Ok(template)
}

/// Edits an existing template; unset draft fields keep their current value.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown id and validation errors
/// for blanked-out required fields.
pub async fn update_template(
    id: Uuid,
    draft: TemplateDraft,
    store: &dyn TemplateStore,
) -> Result<ProposalTemplate, DomainError> {
    let mut template = get_template(id, store).await?;

    if let Some(name) = draft.name {
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "template name cannot be blank".to_owned(),
            ));
        }
        template.name = name;
    }
    if let Some(description) = draft.description {
        template.description = description;
    }
    if let Some(entity_kind) = draft.entity_kind {
        template.entity_kind = entity_kind;
    }
    if let Some(prompt_template) = draft.prompt_template {
        if prompt_template.trim().is_empty() {
            return Err(DomainError::Validation(
                "prompt template cannot be blank".to_owned(),
            ));
        }
        template.prompt_template = prompt_template;
    }
    if draft.system_prompt.is_some() {
        template.system_prompt = draft.system_prompt;
    }
    if draft.default_model.is_some() {
        template.default_model = draft.default_model;
    }
    if let Some(required_context) = draft.required_context {
        template.required_context = required_context;
    }

    store.update(&template).await?;
    Ok(template)
}

/// Fetches one template.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when no such template exists.
pub async fn get_template(
    id: Uuid,
    store: &dyn TemplateStore,
) -> Result<ProposalTemplate, DomainError> {
    store
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound("template", id.to_string()))
}

/// Deletes a template.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when no such template exists.
pub async fn delete_template(id: Uuid, store: &dyn TemplateStore) -> Result<(), DomainError> {
    if store.delete(id).await? {
        Ok(())
    } else {
        Err(DomainError::NotFound("template", id.to_string()))
    }
}

/// Renders a template's prompt with caller-supplied variables, for preview.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when no such template exists.
pub async fn render_preview(
    id: Uuid,
    variables: &HashMap<String, String>,
    store: &dyn TemplateStore,
) -> Result<String, DomainError> {
    let template = get_template(id, store).await?;
    Ok(render_prompt(&template.prompt_template, variables))
}
