//! Placeholder substitution of a schema into artifact templates.
//!
//! Templates are opaque text. The renderer only knows these tokens:
//!
//! | token              | replaced with                                  |
//! |--------------------|------------------------------------------------|
//! | `[EntityName]`     | model name (`MarketItem`)                      |
//! | `[EntityVar]`      | decapitalized model name (`marketItem`)        |
//! | `[ControllerName]` | `MarketItemController`                         |
//! | `[ServiceName]`    | `MarketItemService`                            |
//! | `[CreateDto]`      | `CreateMarketItemRequest`                      |
//! | `[UpdateDto]`      | `UpdateMarketItemRequest`                      |
//! | `[Fields]`         | column-aligned field block (own line)          |
//!
//! A `[Fields]` line is replaced as a whole; its leading whitespace becomes
//! the indentation of every generated field line.

use crate::codegen::ArtifactKind;
use crate::error::RenderError;
use crate::schema::{Schema, naming};

pub const FIELDS_PLACEHOLDER: &str = "[Fields]";
pub const ENTITY_NAME_PLACEHOLDER: &str = "[EntityName]";
pub const ENTITY_VAR_PLACEHOLDER: &str = "[EntityVar]";
pub const CONTROLLER_NAME_PLACEHOLDER: &str = "[ControllerName]";
pub const SERVICE_NAME_PLACEHOLDER: &str = "[ServiceName]";
pub const CREATE_DTO_PLACEHOLDER: &str = "[CreateDto]";
pub const UPDATE_DTO_PLACEHOLDER: &str = "[UpdateDto]";

const COLUMN_GAP: &str = "   ";

/// Column widths of a field block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBlockLayout {
    pub name_width: usize,
    pub type_width: usize,
}

impl FieldBlockLayout {
    /// Widest field name and widest rendered type. `None` for an empty schema.
    pub fn measure(schema: &Schema) -> Option<Self> {
        let name_width = schema.fields().map(|f| f.name().chars().count()).max()?;
        let type_width = schema
            .fields()
            .map(|f| f.field_type().rendered().chars().count())
            .max()?;
        Some(Self {
            name_width,
            type_width,
        })
    }
}

/// Renders artifact templates for a schema. Stateless and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// One line per field in schema order: `indent name type tag`, with the
    /// name and type columns padded to the widest entry.
    pub fn field_block(&self, schema: &Schema, indent: &str) -> Option<String> {
        Some(self.field_lines(schema, indent)?.join("\n"))
    }

    fn field_lines(&self, schema: &Schema, indent: &str) -> Option<Vec<String>> {
        let layout = FieldBlockLayout::measure(schema)?;
        let lines = schema
            .fields()
            .map(|field| {
                format!(
                    "{indent}{name:<name_width$}{COLUMN_GAP}{ty:<type_width$}{COLUMN_GAP}{tag}",
                    name = field.name(),
                    ty = field.field_type().rendered(),
                    tag = field.serialization_tag(),
                    name_width = layout.name_width,
                    type_width = layout.type_width,
                )
            })
            .collect();
        Some(lines)
    }

    pub fn render(
        &self,
        kind: ArtifactKind,
        template: &str,
        schema: &Schema,
    ) -> Result<String, RenderError> {
        if schema.is_empty() {
            return Err(RenderError::EmptySchema { kind });
        }

        let mut rendered = String::with_capacity(template.len() + schema.len() * 64);
        let mut substituted_fields = false;
        for line in template.split_inclusive('\n') {
            let body = line.trim_end_matches(['\n', '\r']);
            if body.trim() != FIELDS_PLACEHOLDER {
                rendered.push_str(line);
                continue;
            }
            let indent = &body[..body.len() - body.trim_start().len()];
            // Generated lines take the placeholder line's terminator.
            let line_end = &line[body.len()..];
            let separator = if line_end.is_empty() { "\n" } else { line_end };
            if let Some(lines) = self.field_lines(schema, indent) {
                rendered.push_str(&lines.join(separator));
            }
            rendered.push_str(line_end);
            substituted_fields = true;
        }

        if kind.requires_field_block() && !substituted_fields {
            return Err(RenderError::MissingPlaceholder {
                kind,
                placeholder: FIELDS_PLACEHOLDER,
            });
        }

        let rendered = rendered
            .replace(ENTITY_NAME_PLACEHOLDER, schema.model_name())
            .replace(
                ENTITY_VAR_PLACEHOLDER,
                &naming::decapitalize(schema.model_name()),
            )
            .replace(CONTROLLER_NAME_PLACEHOLDER, &schema.controller_name())
            .replace(SERVICE_NAME_PLACEHOLDER, &schema.service_name())
            .replace(CREATE_DTO_PLACEHOLDER, &schema.create_dto_name())
            .replace(UPDATE_DTO_PLACEHOLDER, &schema.update_dto_name());

        tracing::trace!(%kind, model = schema.model_name(), bytes = rendered.len(), "rendered");
        Ok(rendered)
    }
}
