//! GraphQL resolvers over the user store.
//!
//! The store arrives per request as [`StoreContext`] data. `User` fields are
//! resolved by the default parent-key resolver.

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use trellis::graphql::{ResolverMap, to_field_value};
use trellis::{AppError, ResultExt};

use crate::users::{NewUser, StoreContext};

pub fn resolvers() -> ResolverMap {
    ResolverMap::new()
        .resolve("Query", "users", |ctx| {
            FieldFuture::new(async move {
                let store = &store(&ctx)?.store;
                to_field_value(&store.list().await)
            })
        })
        .resolve("Query", "user", |ctx| {
            FieldFuture::new(async move {
                let id = ctx.args.try_get("id")?.string()?;
                let store = &store(&ctx)?.store;
                to_field_value(&store.find(id).await)
            })
        })
        .resolve("Mutation", "createUser", |ctx| {
            FieldFuture::new(async move {
                let input = ctx.args.try_get("input")?.as_value().clone();
                let new: NewUser = serde_json::from_value(input.into_json().or_unexpected()?)
                    .client_fault("invalid user input")?;
                let store = &store(&ctx)?.store;
                let user = store.create(new).await?;
                to_field_value(&user)
            })
        })
}

fn store<'a>(ctx: &ResolverContext<'a>) -> Result<&'a StoreContext, AppError> {
    ctx.ctx.data::<StoreContext>()
        .map_err(|_| AppError::unexpected("store context missing from request"))
}
