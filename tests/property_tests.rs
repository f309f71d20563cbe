//! Property-based tests for the schema and rendering invariants.

use proptest::prelude::*;

use model_scaffold::codegen::{
    MigrationRegistration, RegistrationEntry, RegistrationTarget, RouteRegistration,
    TemplateRenderer,
};
use model_scaffold::schema::naming;
use model_scaffold::{ArtifactKind, FieldError, SchemaBuilder, StaticRegistry};

const KNOWN_MODELS: &[&str] = &["User", "Customer", "Category"];
const TYPES: &[&str] = &[
    "int", "float32", "string", "uint", "bool", "User", "Customer", "Category", "Missing",
];

fn registry() -> StaticRegistry {
    StaticRegistry::new(KNOWN_MODELS.iter().copied())
}

#[allow(clippy::unwrap_used)]
fn arb_identifier() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[A-Za-z][A-Za-z0-9_]{0,12}").unwrap()
}

/// Case variants of the framework-managed column names.
fn arb_reserved_name() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["createdAt", "updatedAt", "deletedAt", "baseModel"]),
        prop::collection::vec(any::<bool>(), 9),
    )
        .prop_map(|(name, upper)| {
            name.chars()
                .zip(upper)
                .map(|(c, u)| {
                    if u {
                        c.to_ascii_uppercase()
                    } else {
                        c.to_ascii_lowercase()
                    }
                })
                .collect()
        })
}

fn arb_field() -> impl Strategy<Value = (String, String)> {
    (arb_identifier(), prop::sample::select(TYPES.to_vec()))
        .prop_map(|(name, ty)| (name, ty.to_string()))
}

proptest! {
    #[test]
    fn reserved_names_are_always_rejected(name in arb_reserved_name(), ty in prop::sample::select(TYPES.to_vec())) {
        let mut builder = SchemaBuilder::new("Thing", &registry()).unwrap();
        let result = builder.add_field(&name, ty).map(|_| ());
        if ty == "Missing" {
            prop_assert!(
                matches!(result, Err(FieldError::UnknownType { .. })),
                "unknown type is checked first"
            );
        } else {
            prop_assert!(
                matches!(result, Err(FieldError::ReservedName { .. })),
                "expected ReservedName"
            );
        }
        prop_assert!(naming::ensure_not_reserved(&name).is_err());
        prop_assert!(builder.schema().is_empty());
    }

    #[test]
    fn schema_grows_by_one_two_or_not_at_all(fields in prop::collection::vec(arb_field(), 1..16)) {
        let mut builder = SchemaBuilder::new("Thing", &registry()).unwrap();
        for (name, ty) in &fields {
            let before = builder.schema().len();
            let relation = KNOWN_MODELS.contains(&ty.as_str());
            let outcome = builder.add_field(name, ty).map(|_| ());
            match outcome {
                Ok(_) if relation => prop_assert_eq!(builder.schema().len(), before + 2),
                Ok(_) => prop_assert_eq!(builder.schema().len(), before + 1),
                Err(_) => prop_assert_eq!(builder.schema().len(), before),
            }
        }

        // Every relation field is immediately followed by its uint companion.
        let fields: Vec<_> = builder.schema().fields().collect();
        for (index, field) in fields.iter().enumerate() {
            if let model_scaffold::FieldType::Relation(model) = field.field_type() {
                let companion = fields.get(index + 1);
                prop_assert!(companion.is_some());
                prop_assert_eq!(companion.map(|c| c.name().to_string()), Some(naming::relation_id_name(model)));
            }
        }
    }

    #[test]
    fn accepted_fields_carry_decapitalized_tag_key((name, ty) in arb_field()) {
        let mut builder = SchemaBuilder::new("Thing", &registry()).unwrap();
        prop_assume!(builder.add_field(&name, &ty).is_ok());

        let field = builder.schema().field(&name);
        prop_assert!(field.is_some());
        let tag = field.unwrap().serialization_tag();
        let key = naming::decapitalize(&name);
        prop_assert_eq!(tag.key(), key.as_str());
        let prefix = format!("`json:\"{key}\"");
        prop_assert!(tag.to_string().starts_with(&prefix));
    }

    #[test]
    fn field_block_columns_are_aligned(fields in prop::collection::vec(arb_field(), 1..12)) {
        let mut builder = SchemaBuilder::new("Thing", &registry()).unwrap();
        for (name, ty) in &fields {
            let _ = builder.add_field(name, ty);
        }
        prop_assume!(!builder.schema().is_empty());

        let schema = builder.schema();
        let block = TemplateRenderer::new().field_block(schema, "\t").unwrap();
        let name_width = schema.fields().map(|f| f.name().len()).max().unwrap();
        let type_width = schema.fields().map(|f| f.field_type().rendered().len()).max().unwrap();

        let lines: Vec<&str> = block.lines().collect();
        prop_assert_eq!(lines.len(), schema.len());
        for (line, field) in lines.iter().zip(schema.fields()) {
            let type_column = 1 + name_width + 3;
            let tag_column = type_column + type_width + 3;
            prop_assert_eq!(&line[1..1 + field.name().len()], field.name());
            prop_assert!(line[type_column..].starts_with(field.field_type().rendered()));
            prop_assert!(line[tag_column..].starts_with("`json:\""));
        }
    }

    #[test]
    fn rendering_is_deterministic(fields in prop::collection::vec(arb_field(), 1..8)) {
        let mut builder = SchemaBuilder::new("Thing", &registry()).unwrap();
        for (name, ty) in &fields {
            let _ = builder.add_field(name, ty);
        }
        prop_assume!(!builder.schema().is_empty());

        let template = "type [EntityName] struct {\n    [Fields]\n}\n";
        let renderer = TemplateRenderer::new();
        let first = renderer.render(ArtifactKind::Model, template, builder.schema()).unwrap();
        let second = renderer.render(ArtifactKind::Model, template, builder.schema()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn registration_is_idempotent(model in r"[A-Z][A-Za-z0-9]{0,10}") {
        let entry = RegistrationEntry {
            model_name: model.clone(),
            controller_name: format!("{model}Controller"),
            fields: Vec::new(),
        };
        let migrations = "err := DB.AutoMigrate(\n\t\t&models.Base{})\n";
        let server = "list := []controllers.Controller{\n\t\t&controllers.BaseController{},\n\t}\n";

        let targets: [(&dyn RegistrationTarget, &str); 2] = [
            (&MigrationRegistration::new("m.go"), migrations),
            (&RouteRegistration::new("s.go"), server),
        ];
        for (target, source) in targets {
            let once = target.apply(source, &entry).unwrap().unwrap_or_else(|| source.to_string());
            prop_assert_eq!(target.apply(&once, &entry).unwrap(), None);
        }
    }
}
