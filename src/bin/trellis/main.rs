mod resolvers;
mod routes;
mod users;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trellis::graphql::{GraphQlEndpoint, schema};
use trellis::{App, Config, LogFormat, Server};

use users::{StoreContext, UserStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    let store = Arc::new(UserStore::default());

    let schema = schema::load(&config.schema, &resolvers::resolvers())?;
    info!(path = %config.schema.display(), "schema assembled");

    let context_store = Arc::clone(&store);
    let router = GraphQlEndpoint::new(schema)
        .path(config.graphql_path.clone())
        .graphiql(!config.no_graphiql)
        .context(move |_req| StoreContext { store: Arc::clone(&context_store) })
        .mount(routes::router(store));

    let app = App::new(router).cors(config.cors());
    Server::bind(config.addr()).serve(app).await?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}
