use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::{AccountService, TokenService};
use crate::logger::RequestLogger;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    delete_image, details, health_check, me, signin, signout, signup, tokens, upload_image,
};

pub fn run(
    listener: TcpListener,
    accounts: AccountService,
    token_service: TokenService,
) -> Result<Server, std::io::Error> {
    let accounts = web::Data::new(accounts);
    let token_service = web::Data::new(token_service);

    let server = HttpServer::new(move || {
        // Protected resources are wrapped one by one so unknown paths still 404
        let authenticated = || JwtMiddleware::new(token_service.clone());

        App::new()
            .wrap(RequestLogger)
            // Shared state
            .app_data(accounts.clone())
            .app_data(token_service.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/account")
                    // Public routes
                    .route("/signup", web::post().to(signup))
                    .route("/signin", web::post().to(signin))
                    .route("/tokens", web::post().to(tokens))
                    // Protected routes (require a valid access token)
                    .service(
                        web::resource("/me")
                            .wrap(authenticated())
                            .route(web::get().to(me)),
                    )
                    .service(
                        web::resource("/signout")
                            .wrap(authenticated())
                            .route(web::post().to(signout)),
                    )
                    .service(
                        web::resource("/details")
                            .wrap(authenticated())
                            .route(web::put().to(details)),
                    )
                    .service(
                        web::resource("/image")
                            .wrap(authenticated())
                            .route(web::post().to(upload_image))
                            .route(web::delete().to(delete_image)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
