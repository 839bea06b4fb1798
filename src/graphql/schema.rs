//! Schema assembly: SDL file + resolver map → executable schema.
//!
//! Runs once at startup and fails fast. Nothing here is retried; a schema
//! that does not assemble means the server never binds its port.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_graphql::dynamic::{
    Enum, EnumItem, Field, InputObject, InputValue, Interface, InterfaceField, Object, Scalar,
    Schema, Type as DynType, TypeRef, Union,
};
use async_graphql::parser::parse_schema;
use async_graphql::parser::types::{
    BaseType, FieldDefinition, InputValueDefinition, Type, TypeDefinition, TypeKind,
    TypeSystemDefinition,
};
use async_graphql::Value;

use super::resolver::{ResolverMap, guard};
use super::value::default_resolver;

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Why a schema failed to assemble.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("cannot read schema file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("schema syntax error: {0}")]
    Syntax(String),

    #[error("schema declares no `{0}` type")]
    MissingRoot(String),

    #[error("`{0}` is defined more than once")]
    Duplicate(String),

    #[error("`extend {0}` does not match a definition of the same kind")]
    BadExtension(String),

    #[error("resolver defined for `{type_name}.{field}`, which the schema does not declare")]
    UndeclaredField { type_name: String, field: String },

    #[error("root field `{type_name}.{field}` has no resolver")]
    MissingResolver { type_name: String, field: String },

    #[error("{0} are not supported")]
    Unsupported(&'static str),

    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// Reads `path` and every file it imports into one SDL string.
///
/// A comment line `# import <anything> from "other.graphql"` is replaced by
/// the contents of `other.graphql`, resolved against the importing file's
/// directory. Each file is included at most once, which also breaks cycles.
pub fn load_sdl(path: &Path) -> Result<String, SchemaError> {
    let mut seen = HashSet::new();
    let mut sdl = String::new();
    splice(path, &mut seen, &mut sdl)?;
    Ok(sdl)
}

fn splice(path: &Path, seen: &mut HashSet<PathBuf>, out: &mut String) -> Result<(), SchemaError> {
    let read_err = |source| SchemaError::Read { path: path.to_owned(), source };
    let canonical = path.canonicalize().map_err(read_err)?;
    if !seen.insert(canonical.clone()) {
        return Ok(());
    }

    let text = std::fs::read_to_string(&canonical).map_err(read_err)?;
    let dir = canonical.parent().unwrap_or(Path::new("."));

    for line in text.lines() {
        match import_target(line) {
            Some(target) => splice(&dir.join(target), seen, out)?,
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn import_target(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start().strip_prefix("import")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (_, quoted) = rest.rsplit_once(" from ")?;
    quoted.trim().strip_prefix('"')?.strip_suffix('"')
}

/// Loads the SDL at `path` and assembles it with `resolvers`.
pub fn load(path: &Path, resolvers: &ResolverMap) -> Result<Schema, SchemaError> {
    let sdl = load_sdl(path)?;
    assemble(&sdl, resolvers)
}

/// Merges `sdl` with `resolvers` into an executable schema.
///
/// Fails when the SDL does not parse, there is no query root, a resolver
/// targets a field the SDL does not declare, or a root operation field has
/// no resolver.
pub fn assemble(sdl: &str, resolvers: &ResolverMap) -> Result<Schema, SchemaError> {
    let doc = parse_schema(sdl).map_err(|e| SchemaError::Syntax(e.to_string()))?;

    let mut query = None;
    let mut mutation = None;
    let mut types: Vec<TypeDefinition> = Vec::new();
    let mut extensions: Vec<TypeDefinition> = Vec::new();

    for def in doc.definitions {
        match def {
            TypeSystemDefinition::Schema(schema) => {
                let schema = schema.node;
                if schema.subscription.is_some() {
                    return Err(SchemaError::Unsupported("subscriptions"));
                }
                if let Some(name) = schema.query {
                    query = Some(name.node.to_string());
                }
                if let Some(name) = schema.mutation {
                    mutation = Some(name.node.to_string());
                }
            }
            TypeSystemDefinition::Type(ty) if ty.node.extend => extensions.push(ty.node),
            TypeSystemDefinition::Type(ty) => {
                let name = ty.node.name.node.as_str();
                if types.iter().any(|t| t.name.node.as_str() == name) {
                    return Err(SchemaError::Duplicate(name.to_owned()));
                }
                types.push(ty.node);
            }
            TypeSystemDefinition::Directive(directive) => {
                tracing::debug!(name = %directive.node.name.node, "ignoring directive definition");
            }
        }
    }

    for ext in extensions {
        let name = ext.name.node.to_string();
        let base = types.iter_mut()
            .find(|t| t.name.node.as_str() == name)
            .ok_or_else(|| SchemaError::BadExtension(name.clone()))?;
        extend(&mut base.kind, ext.kind).map_err(|()| SchemaError::BadExtension(name))?;
    }

    let objects: HashMap<&str, &[async_graphql::Positioned<FieldDefinition>]> = types.iter()
        .filter_map(|t| match &t.kind {
            TypeKind::Object(obj) => Some((t.name.node.as_str(), obj.fields.as_slice())),
            _ => None,
        })
        .collect();

    let query = query.unwrap_or_else(|| "Query".to_owned());
    if !objects.contains_key(query.as_str()) {
        return Err(SchemaError::MissingRoot(query));
    }
    let mutation = mutation.or_else(|| objects.contains_key("Mutation").then(|| "Mutation".to_owned()));
    if let Some(name) = &mutation {
        if !objects.contains_key(name.as_str()) {
            return Err(SchemaError::MissingRoot(name.clone()));
        }
    }

    for (type_name, field) in resolvers.keys() {
        let declared = objects.get(type_name)
            .is_some_and(|fields| fields.iter().any(|f| f.node.name.node.as_str() == field));
        if !declared {
            return Err(SchemaError::UndeclaredField {
                type_name: type_name.to_owned(),
                field: field.to_owned(),
            });
        }
    }

    let roots: Vec<&str> = std::iter::once(query.as_str()).chain(mutation.as_deref()).collect();
    let mut builder = Schema::build(&query, mutation.as_deref(), None);
    for def in &types {
        if let Some(ty) = build_type(def, resolvers, &roots)? {
            builder = builder.register(ty);
        }
    }

    let schema = builder.finish().map_err(|e| SchemaError::Invalid(e.to_string()))?;
    tracing::debug!(types = types.len(), "schema assembled");
    Ok(schema)
}

fn extend(base: &mut TypeKind, ext: TypeKind) -> Result<(), ()> {
    match (base, ext) {
        (TypeKind::Object(base), TypeKind::Object(ext)) => {
            base.implements.extend(ext.implements);
            base.fields.extend(ext.fields);
        }
        (TypeKind::Interface(base), TypeKind::Interface(ext)) => base.fields.extend(ext.fields),
        (TypeKind::Union(base), TypeKind::Union(ext)) => base.members.extend(ext.members),
        (TypeKind::Enum(base), TypeKind::Enum(ext)) => base.values.extend(ext.values),
        (TypeKind::InputObject(base), TypeKind::InputObject(ext)) => base.fields.extend(ext.fields),
        (TypeKind::Scalar, TypeKind::Scalar) => {}
        _ => return Err(()),
    }
    Ok(())
}

fn build_type(
    def: &TypeDefinition,
    resolvers: &ResolverMap,
    roots: &[&str],
) -> Result<Option<DynType>, SchemaError> {
    let name = def.name.node.as_str();
    let description = def.description.as_ref().map(|d| d.node.clone());

    let ty: DynType = match &def.kind {
        TypeKind::Scalar if BUILTIN_SCALARS.contains(&name) => return Ok(None),
        TypeKind::Scalar => {
            let mut scalar = Scalar::new(name);
            if let Some(d) = description {
                scalar = scalar.description(d);
            }
            scalar.into()
        }
        TypeKind::Object(obj) => {
            let mut object = Object::new(name);
            if let Some(d) = description {
                object = object.description(d);
            }
            for interface in &obj.implements {
                object = object.implement(interface.node.as_str());
            }
            for field in &obj.fields {
                object = object.field(build_field(name, &field.node, resolvers, roots)?);
            }
            object.into()
        }
        TypeKind::Interface(iface) => {
            let mut interface = Interface::new(name);
            if let Some(d) = description {
                interface = interface.description(d);
            }
            for field in &iface.fields {
                let field = &field.node;
                let mut f = InterfaceField::new(field.name.node.as_str(), type_ref(&field.ty.node));
                for arg in &field.arguments {
                    f = f.argument(input_value(&arg.node));
                }
                interface = interface.field(f);
            }
            interface.into()
        }
        TypeKind::Union(members) => {
            let mut union = Union::new(name);
            if let Some(d) = description {
                union = union.description(d);
            }
            for member in &members.members {
                union = union.possible_type(member.node.as_str());
            }
            union.into()
        }
        TypeKind::Enum(values) => {
            let mut enumeration = Enum::new(name);
            if let Some(d) = description {
                enumeration = enumeration.description(d);
            }
            for value in &values.values {
                enumeration = enumeration.item(EnumItem::new(value.node.value.node.as_str()));
            }
            enumeration.into()
        }
        TypeKind::InputObject(input) => {
            let mut object = InputObject::new(name);
            if let Some(d) = description {
                object = object.description(d);
            }
            for field in &input.fields {
                object = object.field(input_value(&field.node));
            }
            object.into()
        }
    };
    Ok(Some(ty))
}

fn build_field(
    type_name: &str,
    def: &FieldDefinition,
    resolvers: &ResolverMap,
    roots: &[&str],
) -> Result<Field, SchemaError> {
    let field_name = def.name.node.as_str();
    let resolver = match resolvers.get(type_name, field_name) {
        Some(resolver) => resolver.clone(),
        None if roots.contains(&type_name) => {
            return Err(SchemaError::MissingResolver {
                type_name: type_name.to_owned(),
                field: field_name.to_owned(),
            });
        }
        None => default_resolver(field_name.to_owned()),
    };
    let resolver = guard(resolver, def.ty.node.nullable);

    let mut field = Field::new(field_name, type_ref(&def.ty.node), move |ctx| resolver(ctx));
    if let Some(d) = &def.description {
        field = field.description(d.node.clone());
    }
    for arg in &def.arguments {
        field = field.argument(input_value(&arg.node));
    }
    if let Some(reason) = deprecation(def) {
        field = field.deprecation(reason.as_deref());
    }
    Ok(field)
}

/// `Some(reason)` when the field carries `@deprecated`.
fn deprecation(def: &FieldDefinition) -> Option<Option<String>> {
    let directive = def.directives.iter().find(|d| d.node.name.node.as_str() == "deprecated")?;
    let reason = directive.node.get_argument("reason").and_then(|v| match &v.node {
        Value::String(s) => Some(s.clone()),
        _ => None,
    });
    Some(reason)
}

fn input_value(def: &InputValueDefinition) -> InputValue {
    let mut value = InputValue::new(def.name.node.as_str(), type_ref(&def.ty.node));
    if let Some(d) = &def.description {
        value = value.description(d.node.clone());
    }
    if let Some(default) = &def.default_value {
        value = value.default_value(default.node.clone());
    }
    value
}

fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::named(name.as_str()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };
    if ty.nullable { base } else { TypeRef::NonNull(Box::new(base)) }
}
