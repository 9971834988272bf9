//! Proposal generation: context assembly, prompt rendering, model
//! invocation, and the fallback guarantee.
//!
//! Every generation attempt yields a reviewable artifact. Parse failures
//! become fallback proposals; only upstream model failures and store errors
//! propagate to the caller.

use std::collections::HashMap;

use lorekeeper_core::clock::Clock;
use lorekeeper_core::entity::{Entity, EntityKind};
use lorekeeper_core::error::DomainError;
use lorekeeper_core::repository::EntityRepositorySet;
use lorekeeper_llm::{ChatClient, ChatMessage, ChatOptions};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::lifecycle::create_proposal;
use crate::application::parser::{FALLBACK_TITLE, ParseOutcome, parse_model_output};
use crate::application::render::render_prompt;
use crate::domain::{ChangeProposal, ChangeType, ProposalDraft};
use crate::store::{ProposalStore, TemplateStore};

/// System prompt used when neither a template nor a custom call supplies one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a tabletop RPG campaign assistant. You draft \
structured change proposals for campaign entities. Respond with a single JSON object with the \
keys: type (create, update, delete, or relate), title, description, reason, changes (array of \
{field, oldValue, newValue, description}), and relationshipChanges (array of {sourceId, \
sourceType, targetId, targetType, relationshipType, properties}). Do not include any text \
outside the JSON object.";

/// Prompt body used when no template is registered for the entity kind.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Draft a change proposal for a {{entityType}} entity.\n\
Entity id: {{entityId}}\n\
Current entity data:\n{{entityData}}\n\
Campaign context:\n{{contextData}}\n\
Propose a concrete, playable change that fits the existing material.";

/// A request to generate one proposal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateProposalRequest {
    /// Entity kind to draft against.
    #[serde(rename = "entityType")]
    pub entity_kind: Option<EntityKind>,
    /// Live entity to load into the prompt, if any.
    #[serde(default, rename = "entityId")]
    pub entity_id: Option<String>,
    /// Campaign or session scoping the generation.
    #[serde(default, rename = "contextId")]
    pub context_id: Option<String>,
    /// Explicit template to use.
    #[serde(default, rename = "promptId")]
    pub prompt_id: Option<Uuid>,
    /// Caller-resolved custom prompt; wins over any template when set.
    #[serde(default, rename = "customPrompt")]
    pub custom_prompt: Option<String>,
    /// Explicit model override.
    #[serde(default)]
    pub model: Option<String>,
    /// Sampling temperature for this call.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Token budget for this call.
    #[serde(default, rename = "maxTokens")]
    pub max_tokens: Option<u32>,
}

fn entity_to_value(entity: &Entity) -> Value {
    json!({
        "id": entity.id,
        "kind": entity.kind,
        "attributes": entity.attributes,
    })
}

/// Best-effort fetch of the target entity. Repository failures degrade to
/// `None` rather than aborting generation.
async fn fetch_entity_data(
    kind: EntityKind,
    entity_id: Option<&str>,
    repositories: &EntityRepositorySet,
) -> Option<Value> {
    let id = entity_id?;
    match repositories.for_kind(kind).get_by_id(id).await {
        Ok(entity) => entity.as_ref().map(entity_to_value),
        Err(e) => {
            warn!(entity_id = id, error = %e, "entity fetch failed; generating without it");
            None
        }
    }
}

/// Best-effort fetch of the scoping context. A campaign id resolves to the
/// campaign; a session id resolves to the session plus its parent campaign
/// when the session names one. Failures degrade to `None`.
async fn fetch_context_data(
    context_id: Option<&str>,
    repositories: &EntityRepositorySet,
) -> Option<Value> {
    let id = context_id?;

    match repositories.campaigns.get_by_id(id).await {
        Ok(Some(campaign)) => return Some(entity_to_value(&campaign)),
        Ok(None) => {}
        Err(e) => {
            warn!(context_id = id, error = %e, "campaign fetch failed");
        }
    }

    match repositories.sessions.get_by_id(id).await {
        Ok(Some(session)) => {
            let parent_id = session
                .attributes
                .get("campaign_id")
                .and_then(Value::as_str)
                .map(str::to_owned);
            let mut context = json!({ "session": entity_to_value(&session) });
            if let Some(parent_id) = parent_id {
                if let Ok(Some(campaign)) = repositories.campaigns.get_by_id(&parent_id).await {
                    context["campaign"] = entity_to_value(&campaign);
                }
            }
            Some(context)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(context_id = id, error = %e, "session fetch failed");
            None
        }
    }
}

struct ResolvedPrompt {
    prompt: String,
    system_prompt: String,
    template_model: Option<String>,
    prompt_id: Option<Uuid>,
}

async fn resolve_prompt(
    request: &GenerateProposalRequest,
    entity_kind: EntityKind,
    templates: &dyn TemplateStore,
) -> Result<ResolvedPrompt, DomainError> {
    // The "use custom" flag is resolved by the caller; a set custom prompt
    // always wins here.
    if let Some(custom) = &request.custom_prompt {
        return Ok(ResolvedPrompt {
            prompt: custom.clone(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            template_model: None,
            prompt_id: None,
        });
    }

    let template = match request.prompt_id {
        Some(id) => Some(
            templates
                .get(id)
                .await?
                .ok_or_else(|| DomainError::NotFound("template", id.to_string()))?,
        ),
        None => templates
            .list(Some(entity_kind))
            .await?
            .into_iter()
            .next(),
    };

    match template {
        Some(template) => {
            if template.required_context && request.context_id.is_none() {
                return Err(DomainError::Validation(format!(
                    "template '{}' requires a context id",
                    template.name
                )));
            }
            Ok(ResolvedPrompt {
                prompt: template.prompt_template.clone(),
                system_prompt: template
                    .system_prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_owned()),
                template_model: template.default_model.clone(),
                prompt_id: Some(template.id),
            })
        }
        None => Ok(ResolvedPrompt {
            prompt: DEFAULT_PROMPT_TEMPLATE.to_owned(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            template_model: None,
            prompt_id: None,
        }),
    }
}

/// Generates one proposal and persists it as `Pending`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a missing entity kind,
/// `DomainError::NotFound` for an explicit template id that does not
/// resolve, `DomainError::Upstream` when the model call fails, and store
/// errors from persistence. Parse failures do NOT error: they produce a
/// fallback proposal carrying the raw model text for review.
pub async fn generate_proposal(
    request: GenerateProposalRequest,
    author: &str,
    clock: &dyn Clock,
    proposals: &dyn ProposalStore,
    templates: &dyn TemplateStore,
    repositories: &EntityRepositorySet,
    chat: &dyn ChatClient,
) -> Result<ChangeProposal, DomainError> {
    let entity_kind = request
        .entity_kind
        .ok_or_else(|| DomainError::Validation("entity type is required".to_owned()))?;

    let entity_data =
        fetch_entity_data(entity_kind, request.entity_id.as_deref(), repositories).await;
    let context_data = fetch_context_data(request.context_id.as_deref(), repositories).await;

    let resolved = resolve_prompt(&request, entity_kind, templates).await?;

    let variables = HashMap::from([
        ("entityType".to_owned(), entity_kind.to_string()),
        (
            "entityId".to_owned(),
            request.entity_id.clone().unwrap_or_default(),
        ),
        (
            "entityData".to_owned(),
            entity_data.as_ref().map_or_else(
                || "No entity data".to_owned(),
                |v| serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
            ),
        ),
        (
            "contextId".to_owned(),
            request.context_id.clone().unwrap_or_default(),
        ),
        (
            "contextData".to_owned(),
            context_data.as_ref().map_or_else(
                || "No context data".to_owned(),
                |v| serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
            ),
        ),
    ]);

    let messages = vec![
        ChatMessage::system(render_prompt(&resolved.system_prompt, &variables)),
        ChatMessage::user(render_prompt(&resolved.prompt, &variables)),
    ];

    // Model precedence: template default, then the request's explicit
    // model, then the provider's process-wide default.
    let model = resolved.template_model.or_else(|| request.model.clone());
    let options = ChatOptions {
        model: model.clone(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    };

    let response = chat.chat(&messages, &options).await?;
    let model_used = model.unwrap_or_else(|| chat.default_model().to_owned());

    info!(
        entity_kind = %entity_kind,
        model = %model_used,
        total_tokens = response.usage.total_tokens,
        "model completion received"
    );

    let mut draft = match parse_model_output(&response.message.content) {
        ParseOutcome::Parsed(parsed) => ProposalDraft {
            change_type: Some(parsed.change_type),
            entity_kind: Some(entity_kind),
            entity_id: request.entity_id.clone(),
            title: Some(parsed.title),
            description: Some(parsed.description),
            reason: Some(parsed.reason),
            changes: parsed.changes,
            relationship_changes: parsed.relationship_changes,
            ..Default::default()
        },
        ParseOutcome::Fallback { raw, error } => {
            warn!(error = %error, "model output unparsable; creating fallback proposal");
            let mut draft = ProposalDraft {
                change_type: Some(ChangeType::Update),
                entity_kind: Some(entity_kind),
                entity_id: request.entity_id.clone(),
                title: Some(FALLBACK_TITLE.to_owned()),
                description: Some(
                    "The model response could not be parsed into a structured proposal. \
                     The raw output is preserved in the comments for review."
                        .to_owned(),
                ),
                comments: vec![format!("Raw model output:\n{raw}\n\nParse error: {error}")],
                ..Default::default()
            };
            draft.metadata.insert("parse_error".to_owned(), json!(error));
            draft
        }
    };

    draft.context_id = request.context_id;
    draft.prompt_id = resolved.prompt_id;
    draft.llm_model = Some(model_used);
    draft.metadata.insert(
        "usage".to_owned(),
        serde_json::to_value(response.usage).unwrap_or(Value::Null),
    );
    draft
        .metadata
        .insert("finish_reason".to_owned(), json!(response.finish_reason));
    draft
        .metadata
        .insert("provider".to_owned(), json!(chat.provider_name()));

    create_proposal(draft, author, clock, proposals).await
}
