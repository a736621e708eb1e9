use actix_web::{App, HttpServer, dev::Server, middleware, web};

use crate::config::ServerConfig;
use crate::config::{DEFAULT_BIND_ADDRESS, DEFAULT_BIND_PORT};
use crate::orchestrator::Orchestrator;
use crate::routes;

pub fn build_server(
    server_config: ServerConfig,
    orchestrator: Orchestrator,
) -> std::io::Result<Server> {
    let orchestrator = web::Data::new(orchestrator);
    let bind_address = server_config
        .bind_address
        .unwrap_or(DEFAULT_BIND_ADDRESS.to_string());
    let bind_port = server_config.bind_port.unwrap_or(DEFAULT_BIND_PORT);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(orchestrator.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((bind_address.as_str(), bind_port))?
    .run();

    log::info!("Listening on {bind_address}:{bind_port}");

    Ok(server)
}
