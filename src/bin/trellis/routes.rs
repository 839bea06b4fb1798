//! REST routes.

use std::sync::Arc;

use trellis::{AppError, ApplicationError, Json, Request, Response, Router, Status, health};

use crate::users::{NewUser, User, UserStore};

pub fn router(store: Arc<UserStore>) -> Router {
    let list = Arc::clone(&store);
    let find = Arc::clone(&store);
    let create = store;

    Router::new()
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
        .get("/users", move |_req: Request| {
            let store = Arc::clone(&list);
            async move { Json(store.list().await) }
        })
        .get("/users/{id}", move |req: Request| {
            let store = Arc::clone(&find);
            async move { get_user(&store, &req).await }
        })
        .post("/users", move |req: Request| {
            let store = Arc::clone(&create);
            async move { create_user(&store, &req).await }
        })
}

async fn get_user(store: &UserStore, req: &Request) -> Result<Json<User>, AppError> {
    let id = req.param("id").unwrap_or_default();
    store.find(id).await.map(Json).ok_or_else(|| {
        ApplicationError::new(format!("no user with id {id}"))
            .with_code("not_found")
            .into()
    })
}

async fn create_user(store: &UserStore, req: &Request) -> Result<Response, AppError> {
    let new: NewUser = req.json()?;
    let user = store.create(new).await?;
    Ok(Response::builder()
        .status(Status::Created)
        .header("location", &format!("/users/{}", user.id))
        .json_value(&user))
}
