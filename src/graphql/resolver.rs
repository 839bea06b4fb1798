//! Resolver map: the code half of an executable schema.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::{Context, PathSegment, QueryPathSegment, ServerError};

/// A type-erased field resolver.
pub type Resolver = Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

/// Boxes `f`, pinning down the higher-ranked signature closures need.
pub(crate) fn erase<F>(f: F) -> Resolver
where
    F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Error extension marking a failure raised by a field resolver rather than
/// by parsing or validation. Clients never see extensions.
pub(crate) const RESOLVER_FAULT: &str = "resolverFault";

/// Whether `err` came out of a field resolver.
pub(crate) fn is_resolver_fault(err: &ServerError) -> bool {
    !err.path.is_empty()
        || err.extensions.as_ref().is_some_and(|ext| ext.get(RESOLVER_FAULT).is_some())
}

/// Wraps `resolver` with field-level error handling.
///
/// A failing nullable field resolves to `null` and reports its error under
/// the field's path, so sibling fields keep their data. A failing non-null
/// field fails the operation. Both errors carry [`RESOLVER_FAULT`].
pub(crate) fn guard(resolver: Resolver, nullable: bool) -> Resolver {
    erase(move |ctx| {
        let gql = ctx.ctx;
        let pending = resolver(ctx);
        FieldFuture::new(async move {
            let result = match pending {
                FieldFuture::Value(value) => Ok(value),
                FieldFuture::Future(future) => future.await,
            };
            match result {
                Ok(value) => Ok(value),
                Err(mut err) => {
                    err.extensions.get_or_insert_with(Default::default).set(RESOLVER_FAULT, true);
                    if !nullable {
                        return Err(err);
                    }
                    let mut err = err.into_server_error(gql.item.pos);
                    err.path = path_of(gql);
                    gql.add_error(err);
                    Ok(None)
                }
            }
        })
    })
}

fn path_of(ctx: &Context<'_>) -> Vec<PathSegment> {
    let Some(node) = ctx.path_node else {
        return Vec::new();
    };
    let mut path: Vec<PathSegment> = std::iter::once(&node)
        .chain(node.parents())
        .map(|n| match n.segment {
            QueryPathSegment::Name(name) => PathSegment::Field(name.to_owned()),
            QueryPathSegment::Index(idx) => PathSegment::Index(idx),
        })
        .collect();
    path.reverse();
    path
}

/// Resolvers keyed by `(type, field)`.
///
/// Root operation fields (`Query.*`, `Mutation.*`) must all have a resolver.
/// Fields of other object types fall back to reading the same-named key of
/// their parent value.
///
/// ```rust
/// use async_graphql::Value;
/// use async_graphql::dynamic::{FieldFuture, FieldValue};
/// use trellis::graphql::ResolverMap;
///
/// let resolvers = ResolverMap::new()
///     .resolve("Query", "version", |_ctx| {
///         FieldFuture::new(async move { Ok(Some(FieldValue::value(Value::from("1.0")))) })
///     });
/// assert!(resolvers.get("Query", "version").is_some());
/// ```
#[derive(Clone, Default)]
pub struct ResolverMap {
    resolvers: BTreeMap<(String, String), Resolver>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` for `type_name.field`. A later registration replaces an
    /// earlier one.
    pub fn resolve<F>(mut self, type_name: &str, field: &str, f: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        self.resolvers.insert((type_name.to_owned(), field.to_owned()), erase(f));
        self
    }

    /// Folds `other` into `self`, `other` winning on conflicts.
    pub fn merge(mut self, other: ResolverMap) -> Self {
        self.resolvers.extend(other.resolvers);
        self
    }

    pub fn get(&self, type_name: &str, field: &str) -> Option<&Resolver> {
        self.resolvers.get(&(type_name.to_owned(), field.to_owned()))
    }

    /// Every registered `(type, field)` key.
    pub(crate) fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolvers.keys().map(|(t, f)| (t.as_str(), f.as_str()))
    }
}

impl std::fmt::Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.keys().map(|(t, field)| format!("{t}.{field}")))
            .finish()
    }
}
